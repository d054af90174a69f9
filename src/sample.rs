//! Draw review samples from a labeled dataset.
//!
//! Only labeled records take part. Both variants are reproducible for a given
//! seed and dataset order, and both refuse to under-sample: asking for more
//! records than a population holds is a [`PipelineError::PopulationExhausted`].

use crate::error::PipelineError;
use crate::models::{Dataset, Label, Record};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use tracing::{info, instrument};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// How many records to draw, and from which population.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `n` records drawn uniformly from all labeled records.
    Uniform(usize),
    /// `n` records from each label class, shuffled together.
    PerClass(usize),
}

fn labeled(dataset: &Dataset, class: Option<Label>) -> Vec<(&String, &Record)> {
    dataset
        .iter()
        .filter(|(_, r)| match (r.label(), class) {
            (Some(_), None) => true,
            (Some(label), Some(wanted)) => label == wanted,
            (None, _) => false,
        })
        .collect()
}

fn draw<'a>(
    population: &[(&'a String, &'a Record)],
    n: usize,
    name: &str,
    rng: &mut StdRng,
) -> Result<Vec<(&'a String, &'a Record)>, PipelineError> {
    if n > population.len() {
        return Err(PipelineError::PopulationExhausted {
            population: name.to_string(),
            requested: n,
            available: population.len(),
        });
    }
    Ok(index::sample(rng, population.len(), n)
        .into_iter()
        .map(|i| population[i])
        .collect())
}

/// Draw a review sample and add an empty `reviewed_label` to each record.
///
/// # Arguments
///
/// * `dataset` - Labeled dataset; unlabeled records never get drawn
/// * `strategy` - Uniform or per-class sample size
/// * `seed` - RNG seed; the same seed and dataset give the same sample
///
/// # Returns
///
/// The drawn records under their original ids, each with
/// `reviewed_label: null` for a human to fill in.
///
/// # Errors
///
/// [`PipelineError::PopulationExhausted`] when a population (all labeled
/// records, or one class) is smaller than requested.
#[instrument(level = "info", skip(dataset), fields(records = dataset.len()))]
pub fn sample_for_review(
    dataset: &Dataset,
    strategy: Strategy,
    seed: u64,
) -> Result<Dataset, PipelineError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let picked = match strategy {
        Strategy::Uniform(n) => draw(&labeled(dataset, None), n, "labeled records", &mut rng)?,
        Strategy::PerClass(n) => {
            let mut picked = Vec::with_capacity(n * Label::ALL.len());
            for class in Label::ALL {
                let population = labeled(dataset, Some(class));
                let mut class_rng = StdRng::seed_from_u64(seed);
                picked.extend(draw(
                    &population,
                    n,
                    &format!("label {class}"),
                    &mut class_rng,
                )?);
            }
            picked.shuffle(&mut rng);
            picked
        }
    };

    let sample: Dataset = picked
        .into_iter()
        .map(|(id, record)| {
            let mut record = record.clone();
            record.reviewed_label = Some(None);
            (id.clone(), record)
        })
        .collect();

    info!(sampled = sample.len(), ?strategy, seed, "Drew review sample");
    Ok(sample)
}
