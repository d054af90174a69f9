//! File outputs shared by the pipeline stages.
//!
//! # Submodules
//!
//! - [`json`]: article arrays and keyed datasets
//! - [`tables`]: validation report and confusion matrix as CSV
//!
//! # Output Structure
//!
//! ```text
//! data/
//! ├── articles.json              # collect
//! ├── dataset.json               # index
//! ├── labeled.json               # label
//! ├── review_sample.json         # sample (reviewed by hand afterwards)
//! ├── validation_metrics.csv     # validate
//! └── confusion_matrix.csv       # validate
//! ```

pub mod json;
pub mod tables;
