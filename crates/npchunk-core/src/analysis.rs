//! # Error Analysis
//!
//! Breaks the errors of a response down by token, context and label
//! confusion. All comparisons use the collapsed B/I/O role of each label.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::{ChunkerError, Result};
use crate::features::template::{BOS, EOS};
use crate::labels::{BioTag, LabelScheme};
use crate::scoring::{AlignedFiles, AlignedSentence};

/// POS placeholder used when no POS file was supplied.
pub const NO_POS: &str = "NA";

const CONJ_PUNCT_WORDS: [&str; 2] = ["and", "or"];
const CONJ_PUNCT_SYMBOLS: [&str; 2] = [",", "&"];

/// Counter over string tuples with a fixed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountTable {
    headers: Vec<&'static str>,
    counts: HashMap<Vec<String>, usize>,
}

impl CountTable {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            counts: HashMap::new(),
        }
    }

    pub fn add(&mut self, key: Vec<String>) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    pub fn headers(&self) -> &[&'static str] {
        &self.headers
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn get(&self, key: &[&str]) -> usize {
        let key: Vec<String> = key.iter().map(|s| s.to_string()).collect();
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// Rows by descending count, ties broken by key.
    pub fn sorted(&self) -> Vec<(&[String], usize)> {
        let mut rows: Vec<(&[String], usize)> = self
            .counts
            .iter()
            .map(|(k, &c)| (k.as_slice(), c))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    /// Write as TSV with a header row and the count in the last column.
    pub fn write_tsv<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{}\tcount", self.headers.join("\t"))?;
        for (key, count) in self.sorted() {
            writeln!(writer, "{}\t{}", key.join("\t"), count)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// A predicted continuation label with no chunk to continue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BioViolation {
    pub sentence: usize,
    pub index: usize,
    pub token: String,
    pub pos: String,
    /// Predicted label of the previous token, `None` at sentence start.
    pub previous: Option<String>,
    pub gold: String,
    pub predicted: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceErrors {
    pub sentence: usize,
    pub first_line: usize,
    pub tokens: usize,
    pub errors: usize,
}

/// Aggregated error breakdown for one key/response pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorAnalysis {
    tokens: usize,
    correct: usize,
    confusion: CountTable,
    error_tokens: CountTable,
    error_contexts: CountTable,
    boundary_errors: CountTable,
    conj_punct_errors: CountTable,
    violations: Vec<BioViolation>,
    worst_sentences: Vec<SentenceErrors>,
}

struct Cursor<'a> {
    sentence: &'a AlignedSentence,
}

impl Cursor<'_> {
    fn pos(&self, i: isize) -> String {
        if i < 0 {
            return BOS.to_string();
        }
        let i = i as usize;
        if i >= self.sentence.len() {
            return EOS.to_string();
        }
        self.sentence.pos_at(i).unwrap_or(NO_POS).to_string()
    }
}

fn role(scheme: &LabelScheme, label: &str, sentence: usize, index: usize) -> Result<BioTag> {
    scheme
        .classify(label)
        .ok_or_else(|| ChunkerError::UnknownLabel {
            label: label.to_string(),
            location: format!("sentence {sentence}, token {index}"),
        })
}

impl ErrorAnalysis {
    pub fn analyze(files: &AlignedFiles, scheme: &LabelScheme) -> Result<Self> {
        let mut analysis = Self {
            tokens: 0,
            correct: 0,
            confusion: CountTable::new(&["gold", "pred"]),
            error_tokens: CountTable::new(&["token", "pos", "gold", "pred"]),
            error_contexts: CountTable::new(&[
                "prev_pos", "token", "pos", "next_pos", "gold", "pred",
            ]),
            boundary_errors: CountTable::new(&["token", "pos", "gold", "pred"]),
            conj_punct_errors: CountTable::new(&[
                "token", "pos", "prev_pos", "next_pos", "gold", "pred",
            ]),
            violations: Vec::new(),
            worst_sentences: Vec::new(),
        };

        for (s, sentence) in files.sentences().iter().enumerate() {
            analysis.add_sentence(s, sentence, scheme)?;
        }
        analysis
            .worst_sentences
            .sort_by(|a, b| b.errors.cmp(&a.errors).then(a.sentence.cmp(&b.sentence)));

        info!(
            tokens = analysis.tokens,
            errors = analysis.tokens - analysis.correct,
            violations = analysis.violations.len(),
            "Analyzed response"
        );
        Ok(analysis)
    }

    fn add_sentence(
        &mut self,
        s: usize,
        sentence: &AlignedSentence,
        scheme: &LabelScheme,
    ) -> Result<()> {
        let cursor = Cursor { sentence };
        let mut errors = 0;
        let mut previous: Option<BioTag> = None;

        for i in 0..sentence.len() {
            let token = &sentence.tokens[i];
            let gold = role(scheme, &sentence.gold[i], s, i)?;
            let pred = role(scheme, &sentence.predicted[i], s, i)?;
            let pos = cursor.pos(i as isize);

            if !BioTag::is_valid_transition(previous, pred) {
                self.violations.push(BioViolation {
                    sentence: s,
                    index: i,
                    token: token.clone(),
                    pos: pos.clone(),
                    previous: i.checked_sub(1).map(|p| sentence.predicted[p].clone()),
                    gold: sentence.gold[i].clone(),
                    predicted: sentence.predicted[i].clone(),
                });
            }
            previous = Some(pred);

            self.tokens += 1;
            if gold == pred {
                self.correct += 1;
                continue;
            }
            errors += 1;

            let (g, p) = (gold.to_string(), pred.to_string());
            let lower = token.to_lowercase();
            let prev_pos = cursor.pos(i as isize - 1);
            let next_pos = cursor.pos(i as isize + 1);

            self.confusion.add(vec![g.clone(), p.clone()]);
            self.error_tokens
                .add(vec![lower.clone(), pos.clone(), g.clone(), p.clone()]);
            self.error_contexts.add(vec![
                prev_pos.clone(),
                token.clone(),
                pos.clone(),
                next_pos.clone(),
                g.clone(),
                p.clone(),
            ]);
            if gold == BioTag::Outside || pred == BioTag::Outside {
                self.boundary_errors
                    .add(vec![lower.clone(), pos.clone(), g.clone(), p.clone()]);
            }
            if CONJ_PUNCT_WORDS.contains(&lower.as_str())
                || CONJ_PUNCT_SYMBOLS.contains(&token.as_str())
            {
                self.conj_punct_errors
                    .add(vec![token.clone(), pos, prev_pos, next_pos, g, p]);
            }
        }

        if errors > 0 {
            self.worst_sentences.push(SentenceErrors {
                sentence: s,
                first_line: sentence.first_line,
                tokens: sentence.len(),
                errors,
            });
        }
        Ok(())
    }

    pub fn tokens(&self) -> usize {
        self.tokens
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn accuracy(&self) -> f64 {
        if self.tokens == 0 {
            0.0
        } else {
            self.correct as f64 / self.tokens as f64
        }
    }

    pub fn confusion(&self) -> &CountTable {
        &self.confusion
    }

    pub fn error_tokens(&self) -> &CountTable {
        &self.error_tokens
    }

    pub fn error_contexts(&self) -> &CountTable {
        &self.error_contexts
    }

    pub fn boundary_errors(&self) -> &CountTable {
        &self.boundary_errors
    }

    pub fn conj_punct_errors(&self) -> &CountTable {
        &self.conj_punct_errors
    }

    pub fn violations(&self) -> &[BioViolation] {
        &self.violations
    }

    pub fn worst_sentences(&self) -> &[SentenceErrors] {
        &self.worst_sentences
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Tags correct: {} / {} (acc={:.2}%)",
            self.correct,
            self.tokens,
            self.accuracy() * 100.0
        );
        let _ = writeln!(out, "Confusions (gold->pred), sorted by count:");
        for (key, count) in self.confusion.sorted() {
            let _ = writeln!(out, "  {}: {}", key.join("->"), count);
        }
        let _ = writeln!(out, "BIO violations: {}", self.violations.len());
        let _ = writeln!(out, "Sentences with errors: {}", self.worst_sentences.len());
        out
    }

    /// Write `summary.txt` and one TSV per table into `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        let path = dir.join("summary.txt");
        fs::write(&path, self.summary())?;
        written.push(path);

        let tables = [
            ("top_error_tokens.tsv", &self.error_tokens),
            ("top_contexts.tsv", &self.error_contexts),
            ("boundary_errors.tsv", &self.boundary_errors),
            ("conj_punct_errors.tsv", &self.conj_punct_errors),
        ];
        for (name, table) in tables {
            let path = dir.join(name);
            table.write_tsv(BufWriter::new(File::create(&path)?))?;
            written.push(path);
        }

        let path = dir.join("bio_violations.tsv");
        let mut w = BufWriter::new(File::create(&path)?);
        writeln!(w, "sentence\tindex\ttoken\tpos\tprev_pred\tgold\tpred")?;
        for v in &self.violations {
            writeln!(
                w,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                v.sentence,
                v.index,
                v.token,
                v.pos,
                v.previous.as_deref().unwrap_or(BOS),
                v.gold,
                v.predicted
            )?;
        }
        w.flush()?;
        written.push(path);

        let path = dir.join("worst_sentences.tsv");
        let mut w = BufWriter::new(File::create(&path)?);
        writeln!(w, "sentence\tfirst_line\ttokens\terrors")?;
        for s in &self.worst_sentences {
            writeln!(w, "{}\t{}\t{}\t{}", s.sentence, s.first_line, s.tokens, s.errors)?;
        }
        w.flush()?;
        written.push(path);

        info!(dir = %dir.display(), files = written.len(), "Wrote analysis");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "\
The\tDT\tB-NP
cat\tNN\tI-NP
and\tCC\tI-NP
dog\tNN\tI-NP
ran\tVBD\tO

Big\tJJ\tB-NP
news\tNN\tI-NP
";
    const RESPONSE: &str = "\
The\tB-NP
cat\tI-NP
and\tO
dog\tI-NP
ran\tO

Big\tI-NP
news\tI-NP
";
    const POS: &str = "\
The\tDT
cat\tNN
and\tCC
dog\tNN
ran\tVBD

Big\tJJ
news\tNN
";

    fn analysis(with_pos: bool) -> ErrorAnalysis {
        let mut files = AlignedFiles::read(KEY.as_bytes(), RESPONSE.as_bytes()).unwrap();
        if with_pos {
            files = files.with_pos(POS.as_bytes()).unwrap();
        }
        ErrorAnalysis::analyze(&files, &LabelScheme::default()).unwrap()
    }

    #[test]
    fn test_counts() {
        let a = analysis(true);
        assert_eq!(a.tokens(), 7);
        assert_eq!(a.correct(), 5);
        assert_eq!(a.confusion().get(&["I", "O"]), 1);
        assert_eq!(a.confusion().get(&["B", "I"]), 1);
    }

    #[test]
    fn test_context_tables() {
        let a = analysis(true);
        assert_eq!(a.error_tokens().get(&["and", "CC", "I", "O"]), 1);
        assert_eq!(
            a.error_contexts().get(&["BOS", "Big", "JJ", "NN", "B", "I"]),
            1
        );
        assert_eq!(a.boundary_errors().total(), 1);
        assert_eq!(
            a.conj_punct_errors().get(&["and", "CC", "NN", "NN", "I", "O"]),
            1
        );
    }

    #[test]
    fn test_missing_pos_uses_placeholder() {
        let a = analysis(false);
        assert_eq!(a.error_tokens().get(&["and", "NA", "I", "O"]), 1);
    }

    #[test]
    fn test_violations() {
        let a = analysis(true);
        let violations = a.violations();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].token, "dog");
        assert_eq!(violations[0].previous.as_deref(), Some("O"));
        assert_eq!(violations[1].token, "Big");
        assert_eq!(violations[1].previous, None);
    }

    #[test]
    fn test_worst_sentences_order() {
        let a = analysis(true);
        let worst = a.worst_sentences();
        assert_eq!(worst.len(), 2);
        assert_eq!(worst[0].sentence, 0);
        assert_eq!(worst[1].sentence, 1);
        assert_eq!(worst[1].first_line, 7);
    }

    #[test]
    fn test_sorted_breaks_ties_by_key() {
        let mut table = CountTable::new(&["k"]);
        table.add(vec!["b".into()]);
        table.add(vec!["a".into()]);
        table.add(vec!["c".into()]);
        table.add(vec!["c".into()]);
        let keys: Vec<&str> = table.sorted().iter().map(|(k, _)| k[0].as_str()).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_summary_text() {
        let summary = analysis(true).summary();
        assert!(summary.starts_with("Tags correct: 5 / 7 (acc=71.43%)\n"));
        assert!(summary.contains("  B->I: 1\n"));
        assert!(summary.contains("BIO violations: 2\n"));
    }

    #[test]
    fn test_tsv_output() {
        let mut buf = Vec::new();
        analysis(true).error_tokens().write_tsv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("token\tpos\tgold\tpred\tcount"));
        assert_eq!(lines.count(), 2);
    }
}
