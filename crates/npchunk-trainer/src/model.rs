//! Log-linear model over sparse binary features.
//!
//! Score of label `y` is `bias[y] + Σ weight[f][y]` over the features `f`
//! present in the input; probabilities are the softmax of the scores.
//! Features the model has never seen contribute nothing.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use npchunk_core::error::{ChunkerError, Result};
use npchunk_core::{Classifier, LabelDistribution};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// On-disk form. Weights are kept sorted so saved models diff cleanly.
#[derive(Serialize, Deserialize)]
struct ModelFile {
    labels: Vec<String>,
    bias: Vec<f64>,
    weights: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogLinearModel {
    labels: Vec<String>,
    bias: Vec<f64>,
    weights: FxHashMap<String, Vec<f64>>,
}

fn malformed(reason: impl std::fmt::Display) -> ChunkerError {
    ChunkerError::Classifier(format!("malformed model: {reason}"))
}

impl LogLinearModel {
    /// Build a model, checking that every weight row has one entry per label.
    pub fn new(
        labels: Vec<String>,
        bias: Vec<f64>,
        weights: FxHashMap<String, Vec<f64>>,
    ) -> Result<Self> {
        let model = Self {
            labels,
            bias,
            weights,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.labels.is_empty() {
            return Err(malformed("no labels"));
        }
        let unique: FxHashSet<&str> = self.labels.iter().map(String::as_str).collect();
        if unique.len() != self.labels.len() {
            return Err(malformed("duplicate labels"));
        }
        if self.bias.len() != self.labels.len() {
            return Err(malformed(format!(
                "{} bias terms for {} labels",
                self.bias.len(),
                self.labels.len()
            )));
        }
        if self.bias.iter().any(|b| !b.is_finite()) {
            return Err(malformed("non-finite bias"));
        }
        for (feature, row) in &self.weights {
            if row.len() != self.labels.len() {
                return Err(malformed(format!(
                    "feature {feature:?} has {} weights for {} labels",
                    row.len(),
                    self.labels.len()
                )));
            }
            if row.iter().any(|w| !w.is_finite()) {
                return Err(malformed(format!("feature {feature:?} has a non-finite weight")));
            }
        }
        Ok(())
    }

    pub fn feature_count(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self, feature: &str) -> Option<&[f64]> {
        self.weights.get(feature).map(Vec::as_slice)
    }

    /// Unnormalized per-label scores.
    pub fn scores(&self, features: &[String]) -> Vec<f64> {
        let mut scores = self.bias.clone();
        for feature in features {
            if let Some(row) = self.weights.get(feature) {
                for (score, w) in scores.iter_mut().zip(row) {
                    *score += w;
                }
            }
        }
        scores
    }

    pub fn read<R: Read>(reader: R) -> Result<Self> {
        let file: ModelFile = serde_json::from_reader(reader).map_err(malformed)?;
        let model = Self::new(file.labels, file.bias, file.weights.into_iter().collect())?;
        debug!(
            labels = model.labels.len(),
            features = model.feature_count(),
            "Read model"
        );
        Ok(model)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let model = Self::read(BufReader::new(file))?;
        info!(path = %path.as_ref().display(), "Loaded model");
        Ok(model)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let file = ModelFile {
            labels: self.labels.clone(),
            bias: self.bias.clone(),
            weights: self
                .weights
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        serde_json::to_writer(&mut writer, &file)?;
        writer.flush()?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_to(BufWriter::new(File::create(path.as_ref())?))?;
        info!(path = %path.as_ref().display(), features = self.feature_count(), "Saved model");
        Ok(())
    }
}

impl Classifier for LogLinearModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, features: &[String]) -> Result<LabelDistribution> {
        let scores = self.scores(features);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(ChunkerError::Classifier(
                "scores could not be normalized".into(),
            ));
        }
        Ok(LabelDistribution::new(
            self.labels
                .iter()
                .cloned()
                .zip(exp.into_iter().map(|e| e / total))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec!["B-NP".into(), "I-NP".into(), "O".into()]
    }

    fn model() -> LogLinearModel {
        let mut weights = FxHashMap::default();
        weights.insert("pos=DT".to_string(), vec![2.0, 0.0, 0.0]);
        weights.insert("PrevBIO=B-NP".to_string(), vec![0.0, 3.0, 0.0]);
        LogLinearModel::new(labels(), vec![0.0, 0.0, 0.5], weights).unwrap()
    }

    fn features(fs: &[&str]) -> Vec<String> {
        fs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_predict_sums_weights() {
        let m = model();
        assert_eq!(m.predict_best(&features(&["pos=DT"])).unwrap(), "B-NP");
        assert_eq!(
            m.predict_best(&features(&["pos=NN", "PrevBIO=B-NP"])).unwrap(),
            "I-NP"
        );
    }

    #[test]
    fn test_distribution_is_normalized() {
        let dist = model().predict(&features(&["pos=DT"])).unwrap();
        let total: f64 = dist.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(dist.len(), 3);
    }

    #[test]
    fn test_unknown_features_are_ignored() {
        let m = model();
        assert_eq!(
            m.scores(&features(&["never-seen", "w=zebra"])),
            vec![0.0, 0.0, 0.5]
        );
    }

    #[test]
    fn test_tie_goes_to_first_label() {
        let m = LogLinearModel::new(labels(), vec![0.0; 3], FxHashMap::default()).unwrap();
        assert_eq!(m.predict_best(&[]).unwrap(), "B-NP");
    }

    #[test]
    fn test_rejects_ragged_weights() {
        let mut weights = FxHashMap::default();
        weights.insert("pos=DT".to_string(), vec![1.0]);
        let err = LogLinearModel::new(labels(), vec![0.0; 3], weights).unwrap_err();
        assert!(matches!(err, ChunkerError::Classifier(_)));
    }

    #[test]
    fn test_rejects_duplicate_labels() {
        let labels = vec!["O".to_string(), "O".to_string()];
        assert!(LogLinearModel::new(labels, vec![0.0; 2], FxHashMap::default()).is_err());
    }

    #[test]
    fn test_malformed_json_is_classifier_error() {
        let err = LogLinearModel::read("{\"labels\": [".as_bytes()).unwrap_err();
        assert!(matches!(err, ChunkerError::Classifier(_)));
    }

    #[test]
    fn test_save_and_load() {
        let m = model();
        let mut buf = Vec::new();
        m.write_to(&mut buf).unwrap();
        let loaded = LogLinearModel::read(buf.as_slice()).unwrap();
        assert_eq!(loaded, m);
    }
}
