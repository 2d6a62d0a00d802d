//! # Feature Files
//!
//! The wire format between featurization and the classifier: one
//! tab-separated line per token (`TOKEN`, features, optional `LABEL`) and a
//! blank line wherever the source had one. [`Layout`] records the blank/token
//! shape of a file so that any divergence from the source is caught as an
//! alignment error instead of silently shifting rows.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info};

use crate::corpus::{Corpus, Segment};
use crate::error::{ChunkerError, Result};
use crate::features::Templater;

/// Whether feature lines carry a gold label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureMode {
    /// Labeled lines for classifier training.
    Train,
    /// Unlabeled lines for tagging.
    Tag,
}

impl FromStr for FeatureMode {
    type Err = ChunkerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "train" => Ok(Self::Train),
            "tag" | "dev" | "test" => Ok(Self::Tag),
            other => Err(ChunkerError::InvalidConfig(format!(
                "mode must be train/dev/test, got {other:?}"
            ))),
        }
    }
}

/// One token's row in a feature file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLine {
    pub token: String,
    pub features: Vec<String>,
    pub label: Option<String>,
}

impl FeatureLine {
    pub fn new(token: impl Into<String>, features: Vec<String>) -> Self {
        Self {
            token: token.into(),
            features,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Serialize without the trailing newline.
    pub fn to_line(&self) -> String {
        let mut fields = Vec::with_capacity(self.features.len() + 2);
        fields.push(self.token.as_str());
        fields.extend(self.features.iter().map(String::as_str));
        if let Some(label) = &self.label {
            fields.push(label);
        }
        fields.join("\t")
    }

    /// Parse a non-blank line. In labeled mode the last field is the label.
    pub fn parse(line: &str, mode: FeatureMode, line_no: usize) -> Result<Self> {
        let mut fields: Vec<&str> = line.split('\t').collect();
        if fields[0].is_empty() {
            return Err(ChunkerError::MalformedLine {
                line: line_no,
                reason: "feature line has an empty token field".into(),
            });
        }
        let label = match mode {
            FeatureMode::Tag => None,
            FeatureMode::Train => {
                if fields.len() < 2 {
                    return Err(ChunkerError::MalformedLine {
                        line: line_no,
                        reason: "labeled feature line needs TOKEN ... LABEL".into(),
                    });
                }
                fields.pop().map(str::to_string)
            }
        };
        Ok(Self {
            token: fields[0].to_string(),
            features: fields[1..].iter().map(|f| f.to_string()).collect(),
            label,
        })
    }
}

/// Sentences of feature lines interleaved with blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Sentence(Vec<FeatureLine>),
    Break,
}

/// A whole feature file in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFile {
    blocks: Vec<Block>,
}

impl FeatureFile {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Featurize a corpus, one line per token and one blank per break.
    ///
    /// # Errors
    ///
    /// In `Train` mode every token needs a gold label, otherwise
    /// `ChunkerError::MalformedLine` is returned.
    pub fn from_corpus(corpus: &Corpus, templater: &Templater, mode: FeatureMode) -> Result<Self> {
        let marker = templater.config().placeholder.marker.as_str();
        let mut blocks = Vec::with_capacity(corpus.segments().len());
        let mut line_no = 0usize;

        for segment in corpus.segments() {
            match segment {
                Segment::Break => {
                    line_no += 1;
                    blocks.push(Block::Break);
                }
                Segment::Sentence(sentence) => {
                    let sets = templater.sentence_features(sentence);
                    let mut lines = Vec::with_capacity(sets.len());
                    for (token, set) in sentence.tokens().iter().zip(sets) {
                        line_no += 1;
                        let mut line = FeatureLine::new(token.text.clone(), set.render(marker));
                        if mode == FeatureMode::Train {
                            let label = token.label.as_ref().ok_or_else(|| {
                                ChunkerError::MalformedLine {
                                    line: line_no,
                                    reason: "training input row has no gold label".into(),
                                }
                            })?;
                            line = line.with_label(label.clone());
                        }
                        lines.push(line);
                    }
                    blocks.push(Block::Sentence(lines));
                }
            }
        }

        let file = Self { blocks };
        Layout::of_corpus(corpus).ensure_matches(&file.layout(), "featurization")?;
        debug!(lines = file.line_count(), "Featurized corpus");
        Ok(file)
    }

    /// Read a feature file.
    pub fn read<R: BufRead>(reader: R, mode: FeatureMode) -> Result<Self> {
        let mut blocks = Vec::new();
        let mut current = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                if !current.is_empty() {
                    blocks.push(Block::Sentence(std::mem::take(&mut current)));
                }
                blocks.push(Block::Break);
                continue;
            }
            if line.trim().is_empty() {
                return Err(ChunkerError::MalformedLine {
                    line: idx + 1,
                    reason: "whitespace-only line is not a valid sentence break".into(),
                });
            }
            current.push(FeatureLine::parse(&line, mode, idx + 1)?);
        }
        if !current.is_empty() {
            blocks.push(Block::Sentence(current));
        }
        Ok(Self { blocks })
    }

    pub fn from_path<P: AsRef<Path>>(path: P, mode: FeatureMode) -> Result<Self> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file), mode)
    }

    /// Write every line, returning the layout actually written.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<Layout> {
        let mut written = Vec::with_capacity(self.line_count());
        for block in &self.blocks {
            match block {
                Block::Break => {
                    writeln!(writer)?;
                    written.push(LineKind::Blank);
                }
                Block::Sentence(lines) => {
                    for line in lines {
                        writeln!(writer, "{}", line.to_line())?;
                        written.push(LineKind::Token);
                    }
                }
            }
        }
        writer.flush()?;
        info!(lines = written.len(), "Wrote feature lines");
        Ok(Layout { lines: written })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Sentences only, skipping breaks.
    pub fn sentences(&self) -> impl Iterator<Item = &[FeatureLine]> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Sentence(lines) => Some(lines.as_slice()),
            Block::Break => None,
        })
    }

    pub fn line_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| match b {
                Block::Sentence(lines) => lines.len(),
                Block::Break => 1,
            })
            .sum()
    }

    pub fn layout(&self) -> Layout {
        let mut lines = Vec::with_capacity(self.line_count());
        for block in &self.blocks {
            match block {
                Block::Break => lines.push(LineKind::Blank),
                Block::Sentence(s) => lines.extend(std::iter::repeat_n(LineKind::Token, s.len())),
            }
        }
        Layout { lines }
    }
}

/// Kind of one line in a line-aligned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Token,
    Blank,
}

/// The blank/token shape of a line-aligned file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    lines: Vec<LineKind>,
}

impl Layout {
    pub fn new(lines: Vec<LineKind>) -> Self {
        Self { lines }
    }

    pub fn of_corpus(corpus: &Corpus) -> Self {
        let mut lines = Vec::with_capacity(corpus.line_count());
        for segment in corpus.segments() {
            match segment {
                Segment::Break => lines.push(LineKind::Blank),
                Segment::Sentence(s) => lines.extend(std::iter::repeat_n(LineKind::Token, s.len())),
            }
        }
        Self { lines }
    }

    /// Scan any line-oriented text.
    pub fn scan<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = Vec::new();
        for line in reader.lines() {
            lines.push(if line?.is_empty() {
                LineKind::Blank
            } else {
                LineKind::Token
            });
        }
        Ok(Self { lines })
    }

    pub fn scan_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::scan(BufReader::new(File::open(path)?))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn blank_count(&self) -> usize {
        self.lines.iter().filter(|k| **k == LineKind::Blank).count()
    }

    pub fn lines(&self) -> &[LineKind] {
        &self.lines
    }

    /// Require `other` to have exactly this shape.
    ///
    /// # Errors
    ///
    /// `ChunkerError::Alignment` naming the first divergent line.
    pub fn ensure_matches(&self, other: &Layout, what: &str) -> Result<()> {
        if self.lines.len() != other.lines.len() {
            return Err(ChunkerError::Alignment {
                expected: format!("{} lines", self.lines.len()),
                found: format!("{} lines", other.lines.len()),
                detail: what.to_string(),
            });
        }
        if let Some(idx) = self
            .lines
            .iter()
            .zip(&other.lines)
            .position(|(a, b)| a != b)
        {
            return Err(ChunkerError::Alignment {
                expected: format!("{:?} at line {}", self.lines[idx], idx + 1),
                found: format!("{:?}", other.lines[idx]),
                detail: what.to_string(),
            });
        }
        Ok(())
    }
}
