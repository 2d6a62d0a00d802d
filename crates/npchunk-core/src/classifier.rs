//! # Classifier Seam
//!
//! The log-linear model is an external collaborator. The core only needs
//! `train(examples) -> model` and `predict(model, features) -> distribution`;
//! everything behind those two calls belongs to the backend.

use crate::error::{ChunkerError, Result};

/// A fully resolved feature vector paired with its gold label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledExample {
    pub features: Vec<String>,
    pub label: String,
}

impl LabeledExample {
    pub fn new(features: Vec<String>, label: impl Into<String>) -> Self {
        Self {
            features,
            label: label.into(),
        }
    }
}

/// Probabilities over labels, in the model's label order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDistribution {
    entries: Vec<(String, f64)>,
}

impl LabelDistribution {
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    /// Highest-probability label. Ties go to the earliest label, so the
    /// choice never depends on anything but the distribution itself.
    pub fn best(&self) -> Option<&str> {
        let mut best: Option<&(String, f64)> = None;
        for entry in &self.entries {
            if best.is_none_or(|b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(label, _)| label.as_str())
    }

    pub fn probability(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, p)| (l.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A trained model that scores resolved feature vectors.
pub trait Classifier: Send + Sync {
    /// Labels the model can emit.
    fn labels(&self) -> &[String];

    /// Full distribution over labels.
    ///
    /// # Errors
    ///
    /// `ChunkerError::Classifier` if the vector cannot be scored.
    fn predict(&self, features: &[String]) -> Result<LabelDistribution>;

    /// The single most probable label.
    fn predict_best(&self, features: &[String]) -> Result<String> {
        let distribution = self.predict(features)?;
        distribution
            .best()
            .map(str::to_string)
            .ok_or_else(|| ChunkerError::Classifier("model produced an empty distribution".into()))
    }
}

/// Produces a [`Classifier`] from labeled examples.
pub trait Trainer {
    type Model: Classifier;

    fn train(&self, examples: &[LabeledExample]) -> Result<Self::Model>;
}
