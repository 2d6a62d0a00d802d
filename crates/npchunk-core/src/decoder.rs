//! # Greedy Sequential Decoder
//!
//! MEMM-style left-to-right labeling. Each token's sequence features name
//! the label predicted for the token before it, so within a sentence every
//! classifier call waits on the previous one. Sentences are independent and
//! may be decoded in parallel; output keeps the original order.
//!
//! Decoding is strictly greedy: the top label is committed at every step,
//! with no beam and no backtracking.

use std::io::Write;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::error::{ChunkerError, Result};
use crate::featfile::{Block, FeatureFile, FeatureLine, Layout, LineKind};
use crate::placeholder::Placeholder;

/// Configuration for the decoder.
#[derive(Debug, Clone, Default)]
pub struct DecoderConfig {
    /// Must match the placeholder the feature file was rendered with.
    pub placeholder: Placeholder,
    /// Decode sentences concurrently.
    pub parallel: bool,
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// The decoder's only state: the previously resolved label, scoped to one sentence.
#[derive(Debug, Clone)]
pub struct DecodeState<'p> {
    placeholder: &'p Placeholder,
    previous: Option<String>,
}

impl<'p> DecodeState<'p> {
    /// A state with no sentence in progress.
    pub fn new(placeholder: &'p Placeholder) -> Self {
        Self {
            placeholder,
            previous: None,
        }
    }

    /// Start a sentence: the previous label becomes the boundary value.
    pub fn begin_sentence(&mut self) {
        self.previous = Some(self.placeholder.boundary.clone());
    }

    pub fn end_sentence(&mut self) {
        self.previous = None;
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    /// Fill the placeholder of one token's features with the current state.
    ///
    /// # Errors
    ///
    /// `ChunkerError::UnknownFeatureContext` when no sentence is in progress.
    pub fn resolve(&self, line: &FeatureLine) -> Result<Vec<String>> {
        let previous = self.previous.as_deref().ok_or_else(|| {
            ChunkerError::UnknownFeatureContext(format!(
                "token {:?} resolved before a sentence began",
                line.token
            ))
        })?;
        Ok(self.placeholder.resolve_fields(&line.features, previous))
    }

    /// Commit the label chosen for the current token.
    pub fn advance(&mut self, label: String) -> Result<()> {
        match self.previous.as_mut() {
            Some(slot) => {
                *slot = label;
                Ok(())
            }
            None => Err(ChunkerError::UnknownFeatureContext(format!(
                "label {label:?} committed outside a sentence"
            ))),
        }
    }
}

/// A token with its predicted label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub token: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggedBlock {
    Sentence(Vec<TaggedToken>),
    Break,
}

/// Decoder output, line-aligned with the feature file it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggedFile {
    blocks: Vec<TaggedBlock>,
}

impl TaggedFile {
    pub fn blocks(&self) -> &[TaggedBlock] {
        &self.blocks
    }

    /// Labels of every sentence in order.
    pub fn label_sequences(&self) -> Vec<Vec<&str>> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                TaggedBlock::Sentence(tokens) => {
                    Some(tokens.iter().map(|t| t.label.as_str()).collect())
                }
                TaggedBlock::Break => None,
            })
            .collect()
    }

    pub fn layout(&self) -> Layout {
        let mut lines = Vec::new();
        for block in &self.blocks {
            match block {
                TaggedBlock::Break => lines.push(LineKind::Blank),
                TaggedBlock::Sentence(tokens) => {
                    lines.extend(std::iter::repeat_n(LineKind::Token, tokens.len()))
                }
            }
        }
        Layout::new(lines)
    }

    /// Write `TOKEN\tLABEL` lines, returning the layout written.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<Layout> {
        let mut lines = Vec::new();
        for block in &self.blocks {
            match block {
                TaggedBlock::Break => {
                    writeln!(writer)?;
                    lines.push(LineKind::Blank);
                }
                TaggedBlock::Sentence(tokens) => {
                    for t in tokens {
                        writeln!(writer, "{}\t{}", t.token, t.label)?;
                        lines.push(LineKind::Token);
                    }
                }
            }
        }
        writer.flush()?;
        Ok(Layout::new(lines))
    }
}

/// Greedy left-to-right decoder over an external classifier.
pub struct GreedyDecoder<'c, C: Classifier + ?Sized> {
    classifier: &'c C,
    config: DecoderConfig,
}

impl<'c, C: Classifier + ?Sized> GreedyDecoder<'c, C> {
    /// # Errors
    ///
    /// `ChunkerError::InvalidConfig` if the placeholder settings are unusable.
    pub fn new(classifier: &'c C, config: DecoderConfig) -> Result<Self> {
        config.placeholder.validate()?;
        Ok(Self { classifier, config })
    }

    /// Label one sentence.
    ///
    /// # Errors
    ///
    /// Any classifier failure aborts the sentence; no partial labels are returned.
    pub fn decode_sentence(&self, lines: &[FeatureLine]) -> Result<Vec<String>> {
        let mut state = DecodeState::new(&self.config.placeholder);
        state.begin_sentence();
        let mut labels = Vec::with_capacity(lines.len());
        for line in lines {
            let features = state.resolve(line)?;
            let label = self.classifier.predict_best(&features)?;
            labels.push(label.clone());
            state.advance(label)?;
        }
        state.end_sentence();
        Ok(labels)
    }

    /// Label every sentence of a feature file, keeping blank lines in place.
    pub fn decode_file(&self, file: &FeatureFile) -> Result<TaggedFile> {
        let sentences: Vec<&[FeatureLine]> = file.sentences().collect();
        debug!(
            sentences = sentences.len(),
            parallel = self.config.parallel,
            "Decoding"
        );

        let decoded: Vec<Vec<String>> = if self.config.parallel {
            sentences
                .par_iter()
                .map(|lines| self.decode_sentence(lines))
                .collect::<Result<_>>()?
        } else {
            sentences
                .iter()
                .map(|lines| self.decode_sentence(lines))
                .collect::<Result<_>>()?
        };

        let mut decoded = decoded.into_iter();
        let mut blocks = Vec::with_capacity(file.blocks().len());
        let mut tokens = 0usize;
        for block in file.blocks() {
            match block {
                Block::Break => blocks.push(TaggedBlock::Break),
                Block::Sentence(lines) => {
                    let labels = decoded.next().ok_or_else(|| ChunkerError::Alignment {
                        expected: "a decoded sentence".into(),
                        found: "none".into(),
                        detail: "decoder output ran short".into(),
                    })?;
                    tokens += labels.len();
                    blocks.push(TaggedBlock::Sentence(
                        lines
                            .iter()
                            .zip(labels)
                            .map(|(line, label)| TaggedToken {
                                token: line.token.clone(),
                                label,
                            })
                            .collect(),
                    ));
                }
            }
        }

        let tagged = TaggedFile { blocks };
        file.layout()
            .ensure_matches(&tagged.layout(), "decoder output")?;

        info!(sentences = sentences.len(), tokens, "Decoding finished");
        Ok(tagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LabelDistribution;
    use crate::featfile::FeatureMode;
    use std::sync::Mutex;

    const LABELS: [&str; 3] = ["B-NP", "I-NP", "O"];

    /// Scores by a fixed rule and records every resolved vector it sees.
    struct Scripted {
        labels: Vec<String>,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl Scripted {
        fn new() -> Self {
            Self {
                labels: LABELS.iter().map(|s| s.to_string()).collect(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn prev_values(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .filter_map(|f| f.iter().find(|x| x.starts_with("PrevBIO=")).cloned())
                .collect()
        }
    }

    impl Classifier for Scripted {
        fn labels(&self) -> &[String] {
            &self.labels
        }

        // DT opens a chunk, NN continues one if the previous label was in a
        // chunk, everything else is outside.
        fn predict(&self, features: &[String]) -> Result<LabelDistribution> {
            self.seen.lock().unwrap().push(features.to_vec());
            let has = |f: &str| features.iter().any(|x| x == f);
            let pick = if has("pos=DT") {
                "B-NP"
            } else if has("pos=NN") && (has("PrevBIO=B-NP") || has("PrevBIO=I-NP")) {
                "I-NP"
            } else if has("pos=NN") {
                "B-NP"
            } else {
                "O"
            };
            Ok(LabelDistribution::new(
                self.labels
                    .iter()
                    .map(|l| (l.clone(), if l == pick { 0.9 } else { 0.05 }))
                    .collect(),
            ))
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn labels(&self) -> &[String] {
            &[]
        }

        fn predict(&self, _features: &[String]) -> Result<LabelDistribution> {
            Err(ChunkerError::Classifier("unknown model".into()))
        }
    }

    const FEATURES: &str = "\
The\tpos=DT\tPrevBIO=@@
dog\tpos=NN\tPrevBIO=@@
barked\tpos=VBD\tPrevBIO=@@

cats\tpos=NN\tPrevBIO=@@
sleep\tpos=VBP\tPrevBIO=@@
";

    fn file() -> FeatureFile {
        FeatureFile::read(FEATURES.as_bytes(), FeatureMode::Tag).unwrap()
    }

    #[test]
    fn test_greedy_decode_uses_previous_prediction() {
        let clf = Scripted::new();
        let decoder = GreedyDecoder::new(&clf, DecoderConfig::default()).unwrap();
        let tagged = decoder.decode_file(&file()).unwrap();
        assert_eq!(
            tagged.label_sequences(),
            vec![vec!["B-NP", "I-NP", "O"], vec!["B-NP", "O"]]
        );
    }

    #[test]
    fn test_state_resets_at_sentence_boundary() {
        let clf = Scripted::new();
        let decoder = GreedyDecoder::new(&clf, DecoderConfig::default()).unwrap();
        decoder.decode_file(&file()).unwrap();
        assert_eq!(
            clf.prev_values(),
            vec![
                "PrevBIO=BOS",
                "PrevBIO=B-NP",
                "PrevBIO=I-NP",
                "PrevBIO=BOS",
                "PrevBIO=B-NP",
            ]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let clf = Scripted::new();
        let seq = GreedyDecoder::new(&clf, DecoderConfig::default())
            .unwrap()
            .decode_file(&file())
            .unwrap();
        for _ in 0..5 {
            let par = GreedyDecoder::new(&clf, DecoderConfig::new().with_parallel(true))
                .unwrap()
                .decode_file(&file())
                .unwrap();
            assert_eq!(par, seq);
        }
    }

    #[test]
    fn test_output_keeps_blank_lines() {
        let clf = Scripted::new();
        let decoder = GreedyDecoder::new(&clf, DecoderConfig::default()).unwrap();
        let tagged = decoder.decode_file(&file()).unwrap();
        let mut out = Vec::new();
        let layout = tagged.write_to(&mut out).unwrap();
        assert_eq!(layout, file().layout());
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "The\tB-NP\ndog\tI-NP\nbarked\tO\n\ncats\tB-NP\nsleep\tO\n");
    }

    #[test]
    fn test_classifier_failure_is_fatal() {
        let decoder = GreedyDecoder::new(&Broken, DecoderConfig::default()).unwrap();
        let err = decoder.decode_file(&file()).unwrap_err();
        assert!(matches!(err, ChunkerError::Classifier(_)));
    }

    #[test]
    fn test_resolve_outside_sentence_is_rejected() {
        let placeholder = Placeholder::default();
        let mut state = DecodeState::new(&placeholder);
        let line = FeatureLine::new("dog", vec!["PrevBIO=@@".into()]);
        assert!(matches!(
            state.resolve(&line),
            Err(ChunkerError::UnknownFeatureContext(_))
        ));
        assert!(state.advance("O".into()).is_err());

        state.begin_sentence();
        assert_eq!(state.resolve(&line).unwrap(), vec!["PrevBIO=BOS"]);
        state.advance("B-NP".into()).unwrap();
        assert_eq!(state.resolve(&line).unwrap(), vec!["PrevBIO=B-NP"]);
        state.end_sentence();
        assert!(state.previous().is_none());
    }
}
