//! # Corpus Reader
//!
//! Parses `WORD\tPOS[\tLABEL]` corpora into sentences while remembering every
//! blank line, so writers can reproduce the input's line structure exactly.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::corpus::token::{Sentence, Token};
use crate::error::{ChunkerError, Result};

/// Column layout of a corpus file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// `WORD\tPOS`, used for development and test input.
    Pos,
    /// `WORD\tPOS\tLABEL`, used for training input.
    PosChunk,
}

impl InputFormat {
    fn min_fields(self) -> usize {
        match self {
            Self::Pos => 2,
            Self::PosChunk => 3,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Pos => "WORD\\tPOS",
            Self::PosChunk => "WORD\\tPOS\\tLABEL",
        }
    }
}

/// One unit of corpus structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Sentence(Sentence),
    /// A single blank input line.
    Break,
}

impl Segment {
    /// Number of input lines this segment occupied.
    pub fn line_count(&self) -> usize {
        match self {
            Segment::Sentence(s) => s.len(),
            Segment::Break => 1,
        }
    }
}

/// A parsed corpus: sentences interleaved with the blank lines that separated them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    segments: Vec<Segment>,
}

impl Corpus {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Read a corpus from any buffered source.
    ///
    /// # Errors
    ///
    /// Returns `ChunkerError::MalformedLine` for rows with too few fields and
    /// for whitespace-only lines, which would otherwise blur a sentence boundary.
    pub fn read<R: BufRead>(reader: R, format: InputFormat) -> Result<Self> {
        let mut segments = Vec::new();
        let mut current: Vec<Token> = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;

            if line.is_empty() {
                if !current.is_empty() {
                    segments.push(Segment::Sentence(Sentence::new(std::mem::take(
                        &mut current,
                    ))));
                }
                segments.push(Segment::Break);
                continue;
            }

            if line.trim().is_empty() {
                return Err(ChunkerError::MalformedLine {
                    line: line_no,
                    reason: "whitespace-only line is not a valid sentence break".into(),
                });
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < format.min_fields() {
                return Err(ChunkerError::MalformedLine {
                    line: line_no,
                    reason: format!("expected {}, got {:?}", format.describe(), line),
                });
            }

            if fields[0].is_empty() {
                return Err(ChunkerError::MalformedLine {
                    line: line_no,
                    reason: "empty token field".into(),
                });
            }

            let mut token = Token::new(fields[0], fields[1], current.len());
            if format == InputFormat::PosChunk {
                token = token.with_label(fields[2]);
            }
            current.push(token);
        }

        if !current.is_empty() {
            segments.push(Segment::Sentence(Sentence::new(current)));
        }

        let corpus = Self { segments };
        debug!(
            sentences = corpus.sentence_count(),
            lines = corpus.line_count(),
            "Read corpus"
        );
        Ok(corpus)
    }

    /// Read a corpus file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P, format: InputFormat) -> Result<Self> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file), format)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Iterate over sentences only, skipping breaks.
    pub fn sentences(&self) -> impl Iterator<Item = &Sentence> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Sentence(sentence) => Some(sentence),
            Segment::Break => None,
        })
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences().count()
    }

    /// Number of lines the corpus occupied on input.
    pub fn line_count(&self) -> usize {
        self.segments.iter().map(Segment::line_count).sum()
    }
}
