//! Count-based fitting of [`LogLinearModel`].
//!
//! Weights are smoothed log conditional frequencies, `ln P(f | y)`, and the
//! bias is the smoothed log prior `ln P(y)`. One pass over the examples, no
//! iterative optimization.

use npchunk_core::error::{ChunkerError, Result};
use npchunk_core::{LabeledExample, Trainer};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::LogLinearModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Features seen fewer times than this are dropped.
    pub cutoff: usize,
    /// Additive smoothing for both the prior and the feature counts.
    pub smoothing: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            cutoff: 1,
            smoothing: 0.1,
        }
    }
}

impl TrainerConfig {
    pub fn with_cutoff(mut self, cutoff: usize) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.smoothing.is_finite() && self.smoothing > 0.0) {
            return Err(ChunkerError::InvalidConfig(format!(
                "smoothing must be a positive number, got {}",
                self.smoothing
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrequencyTrainer {
    config: TrainerConfig,
}

impl FrequencyTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }
}

impl Trainer for FrequencyTrainer {
    type Model = LogLinearModel;

    fn train(&self, examples: &[LabeledExample]) -> Result<LogLinearModel> {
        self.config.validate()?;
        if examples.is_empty() {
            return Err(ChunkerError::Classifier(
                "cannot train on zero examples".into(),
            ));
        }

        let mut labels: Vec<String> = examples.iter().map(|e| e.label.clone()).collect();
        labels.sort();
        labels.dedup();
        let index: FxHashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let k = labels.len();

        let mut label_counts = vec![0usize; k];
        let mut feature_totals: FxHashMap<&str, usize> = FxHashMap::default();
        let mut joint: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
        for example in examples {
            let y = index[example.label.as_str()];
            label_counts[y] += 1;
            for feature in &example.features {
                *feature_totals.entry(feature.as_str()).or_insert(0) += 1;
                joint.entry(feature.as_str()).or_insert_with(|| vec![0; k])[y] += 1;
            }
        }

        joint.retain(|f, _| feature_totals[f] >= self.config.cutoff);
        let vocabulary = joint.len() as f64;
        let mut label_mass = vec![0usize; k];
        for row in joint.values() {
            for (mass, c) in label_mass.iter_mut().zip(row) {
                *mass += c;
            }
        }

        let alpha = self.config.smoothing;
        let n = examples.len() as f64;
        let bias: Vec<f64> = label_counts
            .iter()
            .map(|&c| ((c as f64 + alpha) / (n + alpha * k as f64)).ln())
            .collect();
        let weights: FxHashMap<String, Vec<f64>> = joint
            .into_iter()
            .map(|(feature, row)| {
                let weights = row
                    .iter()
                    .zip(&label_mass)
                    .map(|(&c, &mass)| {
                        ((c as f64 + alpha) / (mass as f64 + alpha * vocabulary)).ln()
                    })
                    .collect();
                (feature.to_string(), weights)
            })
            .collect();

        info!(
            examples = examples.len(),
            labels = k,
            features = weights.len(),
            cutoff = self.config.cutoff,
            "Trained model"
        );
        LogLinearModel::new(labels, bias, weights)
    }
}

#[cfg(test)]
mod tests {
    use npchunk_core::Classifier;

    use super::*;

    fn example(features: &[&str], label: &str) -> LabeledExample {
        LabeledExample::new(features.iter().map(|s| s.to_string()).collect(), label)
    }

    fn examples() -> Vec<LabeledExample> {
        vec![
            example(&["pos=DT", "PrevBIO=BOS"], "B-NP"),
            example(&["pos=NN", "PrevBIO=B-NP"], "I-NP"),
            example(&["pos=VBD", "PrevBIO=I-NP"], "O"),
            example(&["pos=DT", "PrevBIO=O"], "B-NP"),
            example(&["pos=NN", "PrevBIO=B-NP"], "I-NP"),
            example(&["pos=NN", "PrevBIO=BOS"], "B-NP"),
            example(&["pos=IN", "PrevBIO=I-NP"], "O"),
        ]
    }

    fn features(fs: &[&str]) -> Vec<String> {
        fs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_learns_training_patterns() {
        let model = FrequencyTrainer::default().train(&examples()).unwrap();
        assert_eq!(model.labels(), &["B-NP", "I-NP", "O"]);
        assert_eq!(
            model
                .predict_best(&features(&["pos=DT", "PrevBIO=O"]))
                .unwrap(),
            "B-NP"
        );
        assert_eq!(
            model
                .predict_best(&features(&["pos=NN", "PrevBIO=B-NP"]))
                .unwrap(),
            "I-NP"
        );
        assert_eq!(
            model
                .predict_best(&features(&["pos=VBD", "PrevBIO=I-NP"]))
                .unwrap(),
            "O"
        );
    }

    #[test]
    fn test_cutoff_drops_rare_features() {
        let trainer = FrequencyTrainer::new(TrainerConfig::default().with_cutoff(2));
        let model = trainer.train(&examples()).unwrap();
        assert!(model.weights("pos=DT").is_some());
        assert!(model.weights("pos=VBD").is_none());
        assert!(model.weights("PrevBIO=O").is_none());
    }

    #[test]
    fn test_rejects_bad_smoothing() {
        let trainer = FrequencyTrainer::new(TrainerConfig::default().with_smoothing(0.0));
        let err = trainer.train(&examples()).unwrap_err();
        assert!(matches!(err, ChunkerError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_empty_training_set() {
        let err = FrequencyTrainer::default().train(&[]).unwrap_err();
        assert!(matches!(err, ChunkerError::Classifier(_)));
    }
}
