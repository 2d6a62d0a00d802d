//! # npchunk Trainer
//!
//! The classifier backend behind the decoder seam: loading labeled
//! examples from feature files, fitting a log-linear model from feature
//! counts, and persisting it as JSON.

pub mod data;
pub mod model;
pub mod trainer;

pub use data::{ensure_scheme_labels, load_training_examples, load_training_file};
pub use model::LogLinearModel;
pub use trainer::{FrequencyTrainer, TrainerConfig};
