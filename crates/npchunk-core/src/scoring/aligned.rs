//! Line-aligned reading of key and response files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ChunkerError, Result};

/// One row of a labeled file: first field is the token, last field the label.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    token: String,
    label: String,
}

fn read_rows<R: BufRead>(reader: R, what: &str) -> Result<Vec<Option<Row>>> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            rows.push(None);
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 || fields[0].is_empty() {
            return Err(ChunkerError::MalformedLine {
                line: idx + 1,
                reason: format!("{what} rows need TOKEN ... LABEL, got {line:?}"),
            });
        }
        rows.push(Some(Row {
            token: fields[0].to_string(),
            label: fields[fields.len() - 1].to_string(),
        }));
    }
    Ok(rows)
}

/// One sentence with its gold and predicted labels side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedSentence {
    /// 1-based line number of the first token.
    pub first_line: usize,
    pub tokens: Vec<String>,
    /// POS tags, when a POS file was attached.
    pub pos: Option<Vec<String>>,
    pub gold: Vec<String>,
    pub predicted: Vec<String>,
}

impl AlignedSentence {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn pos_at(&self, i: usize) -> Option<&str> {
        self.pos.as_ref().and_then(|p| p.get(i)).map(String::as_str)
    }
}

/// Key and response read together, verified line for line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignedFiles {
    sentences: Vec<AlignedSentence>,
    line_count: usize,
}

impl AlignedFiles {
    /// Read and align a key and a response.
    ///
    /// # Errors
    ///
    /// `ChunkerError::Alignment` if line counts or sentence breaks differ and
    /// `ChunkerError::TokenMismatch` if a token differs. Nothing is skipped.
    pub fn read<K: BufRead, R: BufRead>(key: K, response: R) -> Result<Self> {
        let key = read_rows(key, "key")?;
        let response = read_rows(response, "response")?;
        if key.len() != response.len() {
            return Err(ChunkerError::Alignment {
                expected: format!("{} lines", key.len()),
                found: format!("{} lines", response.len()),
                detail: "length mismatch between key and response".into(),
            });
        }

        let mut sentences = Vec::new();
        let mut current: Option<AlignedSentence> = None;
        for (idx, (k, r)) in key.iter().zip(&response).enumerate() {
            let line = idx + 1;
            match (k, r) {
                (None, None) => {
                    if let Some(done) = current.take() {
                        sentences.push(done);
                    }
                }
                (Some(k), Some(r)) => {
                    if k.token != r.token {
                        return Err(ChunkerError::TokenMismatch {
                            line,
                            key: k.token.clone(),
                            response: r.token.clone(),
                        });
                    }
                    let sentence = current.get_or_insert_with(|| AlignedSentence {
                        first_line: line,
                        tokens: Vec::new(),
                        pos: None,
                        gold: Vec::new(),
                        predicted: Vec::new(),
                    });
                    sentence.tokens.push(k.token.clone());
                    sentence.gold.push(k.label.clone());
                    sentence.predicted.push(r.label.clone());
                }
                (None, Some(_)) => {
                    return Err(ChunkerError::Alignment {
                        expected: format!("sentence break at line {line}"),
                        found: "token".into(),
                        detail: "response".into(),
                    });
                }
                (Some(_), None) => {
                    return Err(ChunkerError::Alignment {
                        expected: format!("token at line {line}"),
                        found: "sentence break".into(),
                        detail: "response".into(),
                    });
                }
            }
        }
        if let Some(done) = current {
            sentences.push(done);
        }

        Ok(Self {
            sentences,
            line_count: key.len(),
        })
    }

    pub fn from_paths<P: AsRef<Path>, Q: AsRef<Path>>(key: P, response: Q) -> Result<Self> {
        Self::read(
            BufReader::new(File::open(key)?),
            BufReader::new(File::open(response)?),
        )
    }

    /// Attach POS tags from a `WORD\tPOS` file with the same line structure.
    pub fn with_pos<P: BufRead>(mut self, pos: P) -> Result<Self> {
        let mut rows: Vec<Option<(String, String)>> = Vec::new();
        for (idx, line) in pos.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                rows.push(None);
                continue;
            }
            let mut fields = line.split('\t');
            match (fields.next(), fields.next()) {
                (Some(w), Some(p)) if !w.is_empty() => {
                    rows.push(Some((w.to_string(), p.to_string())))
                }
                _ => {
                    return Err(ChunkerError::MalformedLine {
                        line: idx + 1,
                        reason: format!("expected WORD\\tPOS, got {line:?}"),
                    });
                }
            }
        }
        if rows.len() != self.line_count {
            return Err(ChunkerError::Alignment {
                expected: format!("{} lines", self.line_count),
                found: format!("{} lines", rows.len()),
                detail: "length mismatch between key and POS file".into(),
            });
        }

        for sentence in &mut self.sentences {
            let start = sentence.first_line - 1;
            let mut tags = Vec::with_capacity(sentence.len());
            for (offset, token) in sentence.tokens.iter().enumerate() {
                let line = start + offset + 1;
                match &rows[start + offset] {
                    Some((w, p)) if w == token => tags.push(p.clone()),
                    Some((w, _)) => {
                        return Err(ChunkerError::TokenMismatch {
                            line,
                            key: token.clone(),
                            response: w.clone(),
                        });
                    }
                    None => {
                        return Err(ChunkerError::Alignment {
                            expected: format!("token at line {line}"),
                            found: "sentence break".into(),
                            detail: "POS file".into(),
                        });
                    }
                }
            }
            sentence.pos = Some(tags);
        }
        Ok(self)
    }

    pub fn sentences(&self) -> &[AlignedSentence] {
        &self.sentences
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }
}
