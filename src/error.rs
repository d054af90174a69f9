//! Domain errors callers may want to match on.
//!
//! Plumbing code keeps returning `Box<dyn Error>`; the variants here are the
//! failures with a meaning of their own (a missing credential, a sample that
//! cannot be drawn, a tracking service refusing a run).

use thiserror::Error;

/// Failures with a meaning of their own.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// `collect` was started without a news API key.
    #[error("MEDIASTACK_API_KEY not found in environment variables")]
    MissingApiKey,

    /// A sample asked for more records than its population holds.
    #[error("cannot sample {requested} records from {population}: only {available} available")]
    PopulationExhausted {
        population: String,
        requested: usize,
        available: usize,
    },

    /// The news API answered without the expected shape.
    #[error("unexpected API response for {context}: {reason}")]
    UnexpectedResponse { context: String, reason: String },

    /// The tracking backend refused or failed to store an event.
    #[error("tracking service error: {0}")]
    Tracking(String),

    /// A key file exists but holds no key.
    #[error("credential file {0} is empty")]
    EmptyCredential(String),

    /// A collection range that ends before it starts.
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: String, end: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_exhausted_message() {
        let e = PipelineError::PopulationExhausted {
            population: "label 0".to_string(),
            requested: 60,
            available: 50,
        };
        assert_eq!(
            e.to_string(),
            "cannot sample 60 records from label 0: only 50 available"
        );
    }

    #[test]
    fn test_missing_api_key_message() {
        assert!(PipelineError::MissingApiKey
            .to_string()
            .contains("MEDIASTACK_API_KEY"));
    }
}
