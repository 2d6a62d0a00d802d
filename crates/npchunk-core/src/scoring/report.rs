use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::aligned::{AlignedFiles, AlignedSentence};
use super::groups::{Group, extract_groups};
use crate::error::{ChunkerError, Result};
use crate::labels::{BioTag, LabelScheme};

/// Totals and ratios from one scoring run. Ratios are fractions in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreReport {
    tokens: usize,
    correct_tags: usize,
    gold_groups: usize,
    predicted_groups: usize,
    correct_groups: usize,
    accuracy: f64,
    precision: f64,
    recall: f64,
    f1: f64,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl ScoreReport {
    fn from_counts(
        tokens: usize,
        correct_tags: usize,
        gold_groups: usize,
        predicted_groups: usize,
        correct_groups: usize,
    ) -> Self {
        let precision = ratio(correct_groups, predicted_groups);
        let recall = ratio(correct_groups, gold_groups);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        Self {
            tokens,
            correct_tags,
            gold_groups,
            predicted_groups,
            correct_groups,
            accuracy: ratio(correct_tags, tokens),
            precision,
            recall,
            f1,
        }
    }

    pub fn tokens(&self) -> usize {
        self.tokens
    }

    pub fn correct_tags(&self) -> usize {
        self.correct_tags
    }

    pub fn gold_groups(&self) -> usize {
        self.gold_groups
    }

    pub fn predicted_groups(&self) -> usize {
        self.predicted_groups
    }

    pub fn correct_groups(&self) -> usize {
        self.correct_groups
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn recall(&self) -> f64 {
        self.recall
    }

    pub fn f1(&self) -> f64 {
        self.f1
    }
}

impl fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} out of {} tags correct", self.correct_tags, self.tokens)?;
        writeln!(f, "  accuracy: {:5.2}", self.accuracy * 100.0)?;
        writeln!(f, "{} groups in key", self.gold_groups)?;
        writeln!(f, "{} groups in response", self.predicted_groups)?;
        writeln!(f, "{} correct groups", self.correct_groups)?;
        writeln!(f, "  precision: {:5.2}", self.precision * 100.0)?;
        writeln!(f, "  recall:    {:5.2}", self.recall * 100.0)?;
        writeln!(f, "  F1:        {:5.2}", self.f1 * 100.0)
    }
}

/// Scores predicted label sequences against gold ones.
#[derive(Debug, Clone, Default)]
pub struct ChunkScorer {
    scheme: LabelScheme,
}

impl ChunkScorer {
    pub fn new(scheme: LabelScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &LabelScheme {
        &self.scheme
    }

    fn tags<S: AsRef<str>>(&self, labels: &[S], location: &str) -> Result<Vec<BioTag>> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let label: &str = label.as_ref();
                self.scheme
                    .classify(label)
                    .ok_or_else(|| ChunkerError::UnknownLabel {
                        label: label.to_string(),
                        location: format!("{location}, token {i}"),
                    })
            })
            .collect()
    }

    /// Score parallel gold and predicted label sequences, one pair per sentence.
    pub fn score_sequences<S, V>(&self, gold: &[V], predicted: &[V]) -> Result<ScoreReport>
    where
        S: AsRef<str>,
        V: AsRef<[S]>,
    {
        if gold.len() != predicted.len() {
            return Err(ChunkerError::Alignment {
                expected: format!("{} sentences", gold.len()),
                found: format!("{} sentences", predicted.len()),
                detail: "predicted sequences".into(),
            });
        }

        let mut tokens = 0;
        let mut correct_tags = 0;
        let mut gold_set: HashSet<Group> = HashSet::new();
        let mut predicted_set: HashSet<Group> = HashSet::new();

        for (s, (g, p)) in gold.iter().zip(predicted).enumerate() {
            let (g, p): (&[S], &[S]) = (g.as_ref(), p.as_ref());
            if g.len() != p.len() {
                return Err(ChunkerError::Alignment {
                    expected: format!("{} labels", g.len()),
                    found: format!("{} labels", p.len()),
                    detail: format!("sentence {s}"),
                });
            }
            let location = format!("sentence {s}");
            let g_tags = self.tags(g, &location)?;
            let p_tags = self.tags(p, &location)?;

            tokens += g.len();
            correct_tags += g_tags.iter().zip(&p_tags).filter(|(a, b)| a == b).count();
            gold_set.extend(extract_groups(&g_tags, s));
            predicted_set.extend(extract_groups(&p_tags, s));
        }

        let correct_groups = gold_set.intersection(&predicted_set).count();
        debug!(
            tokens,
            gold = gold_set.len(),
            predicted = predicted_set.len(),
            correct = correct_groups,
            "Scored sequences"
        );
        Ok(ScoreReport::from_counts(
            tokens,
            correct_tags,
            gold_set.len(),
            predicted_set.len(),
            correct_groups,
        ))
    }

    pub fn score_sentences(&self, sentences: &[AlignedSentence]) -> Result<ScoreReport> {
        let gold: Vec<&[String]> = sentences.iter().map(|s| s.gold.as_slice()).collect();
        let predicted: Vec<&[String]> = sentences.iter().map(|s| s.predicted.as_slice()).collect();
        self.score_sequences(&gold, &predicted)
    }

    pub fn score_files(&self, files: &AlignedFiles) -> Result<ScoreReport> {
        self.score_sentences(files.sentences())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(rows: &[&[&'static str]]) -> Vec<Vec<&'static str>> {
        rows.iter().map(|r| r.to_vec()).collect()
    }

    #[test]
    fn test_perfect_match() {
        let gold = seqs(&[&["B-NP", "I-NP", "O", "B-NP"]]);
        let report = ChunkScorer::default().score_sequences(&gold, &gold).unwrap();
        assert_eq!(report.gold_groups(), 2);
        assert_eq!(report.correct_groups(), 2);
        assert_eq!(report.precision(), 1.0);
        assert_eq!(report.recall(), 1.0);
        assert_eq!(report.f1(), 1.0);
        assert_eq!(report.accuracy(), 1.0);
    }

    #[test]
    fn test_truncated_group_is_wrong() {
        let gold = seqs(&[&["B-NP", "I-NP", "O"]]);
        let predicted = seqs(&[&["B-NP", "O", "O"]]);
        let report = ChunkScorer::default()
            .score_sequences(&gold, &predicted)
            .unwrap();
        assert_eq!(report.gold_groups(), 1);
        assert_eq!(report.predicted_groups(), 1);
        assert_eq!(report.correct_groups(), 0);
        assert_eq!(report.precision(), 0.0);
        assert_eq!(report.recall(), 0.0);
        assert_eq!(report.f1(), 0.0);
        assert_eq!(report.correct_tags(), 2);
    }

    #[test]
    fn test_no_groups_anywhere() {
        let gold = seqs(&[&["O", "O"], &["O"]]);
        let report = ChunkScorer::default().score_sequences(&gold, &gold).unwrap();
        assert_eq!(report.gold_groups(), 0);
        assert_eq!(report.precision(), 0.0);
        assert_eq!(report.recall(), 0.0);
        assert_eq!(report.f1(), 0.0);
        assert_eq!(report.accuracy(), 1.0);
    }

    #[test]
    fn test_span_must_match_exactly() {
        // gold [2,4], predicted [2,5]
        let gold = seqs(&[&["O", "O", "B-NP", "I-NP", "I-NP", "O"]]);
        let predicted = seqs(&[&["O", "O", "B-NP", "I-NP", "I-NP", "I-NP"]]);
        let report = ChunkScorer::default()
            .score_sequences(&gold, &predicted)
            .unwrap();
        assert_eq!(report.gold_groups(), 1);
        assert_eq!(report.predicted_groups(), 1);
        assert_eq!(report.correct_groups(), 0);
    }

    #[test]
    fn test_same_span_in_different_sentences() {
        let gold = seqs(&[&["B-NP", "O"], &["O", "O"]]);
        let predicted = seqs(&[&["O", "O"], &["B-NP", "O"]]);
        let report = ChunkScorer::default()
            .score_sequences(&gold, &predicted)
            .unwrap();
        assert_eq!(report.correct_groups(), 0);
    }

    #[test]
    fn test_unknown_label() {
        let gold = seqs(&[&["B-NP", "B-VP"]]);
        let err = ChunkScorer::default()
            .score_sequences(&gold, &gold)
            .unwrap_err();
        assert!(matches!(err, ChunkerError::UnknownLabel { ref label, .. } if label == "B-VP"));
    }

    #[test]
    fn test_length_mismatch() {
        let gold = seqs(&[&["B-NP", "O"]]);
        let predicted = seqs(&[&["B-NP"]]);
        assert!(ChunkScorer::default()
            .score_sequences(&gold, &predicted)
            .is_err());
    }

    #[test]
    fn test_custom_scheme() {
        let scorer = ChunkScorer::new(LabelScheme::new("B", "I", "O"));
        let gold = seqs(&[&["B", "I", "O"]]);
        let report = scorer.score_sequences(&gold, &gold).unwrap();
        assert_eq!(report.correct_groups(), 1);
    }

    #[test]
    fn test_report_text() {
        let gold = seqs(&[&["B-NP", "I-NP", "O", "B-NP"]]);
        let predicted = seqs(&[&["B-NP", "I-NP", "O", "O"]]);
        let report = ChunkScorer::default()
            .score_sequences(&gold, &predicted)
            .unwrap();
        let text = report.to_string();
        assert!(text.starts_with("3 out of 4 tags correct\n"));
        assert!(text.contains("  accuracy: 75.00\n"));
        assert!(text.contains("  precision: 100.00\n"));
        assert!(text.contains("  recall:    50.00\n"));
        assert!(text.contains("  F1:        66.67\n"));
    }

    #[test]
    fn test_score_files() {
        let key = "The\tDT\tB-NP\ndog\tNN\tI-NP\n\nran\tVBD\tO\n";
        let response = "The\tB-NP\ndog\tI-NP\n\nran\tO\n";
        let files = AlignedFiles::read(key.as_bytes(), response.as_bytes()).unwrap();
        let report = ChunkScorer::default().score_files(&files).unwrap();
        assert_eq!(report.tokens(), 3);
        assert_eq!(report.f1(), 1.0);
    }
}
