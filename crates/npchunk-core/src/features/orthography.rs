//! Orthographic tests over a single surface form.

use regex::Regex;

use crate::error::Result;

/// Orthographic analyzer with pre-compiled patterns.
#[derive(Debug, Clone)]
pub struct Orthography {
    re_number: Regex,
}

impl Orthography {
    /// Constructs a new analyzer.
    ///
    /// # Errors
    ///
    /// Returns `ChunkerError::RegexError` if a pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            // 12, 1,000, 3.5, .25, 1/2, 10-year, 7%, -4
            re_number: Regex::new(r"^[+-]?(?:\d+(?:[.,/:\-]\d+)*|\.\d+)%?$")?,
        })
    }

    /// Whether the form reads as a number.
    pub fn is_number(&self, word: &str) -> bool {
        self.re_number.is_match(word)
    }
}

/// Coarse word shape: `X` upper, `x` lower, `d` digit, other characters
/// kept verbatim, with runs of the same class collapsed.
///
/// `McDonald's` becomes `XxXx'x`, `1,000.50` becomes `d,d.d`.
pub fn word_shape(word: &str) -> String {
    let mut shape = String::with_capacity(word.len());
    let mut last = None;
    for c in word.chars() {
        let class = if c.is_uppercase() {
            'X'
        } else if c.is_lowercase() {
            'x'
        } else if c.is_ascii_digit() {
            'd'
        } else {
            c
        };
        if last != Some(class) {
            shape.push(class);
            last = Some(class);
        }
    }
    shape
}

/// The first `n` characters, or the whole form when shorter.
pub fn prefix(word: &str, n: usize) -> &str {
    match word.char_indices().nth(n) {
        Some((idx, _)) => &word[..idx],
        None => word,
    }
}

/// The last `n` characters, or the whole form when shorter.
pub fn suffix(word: &str, n: usize) -> &str {
    let count = word.chars().count();
    if count <= n {
        return word;
    }
    match word.char_indices().nth(count - n) {
        Some((idx, _)) => &word[idx..],
        None => word,
    }
}

/// Capitalized first letter followed by at least one lowercase letter.
pub fn is_title_case(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_uppercase()) && chars.any(char::is_lowercase)
}

/// Contains letters, all of them uppercase.
pub fn is_all_caps(word: &str) -> bool {
    word.chars().any(char::is_alphabetic)
        && word
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(char::is_uppercase)
}

/// A hyphen somewhere inside a longer form (a bare `-` does not count).
pub fn has_hyphen(word: &str) -> bool {
    word.len() > 1 && word.contains('-')
}

pub fn has_digit(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_digit())
}

/// Made only of punctuation characters.
pub fn is_punctuation(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_punctuation())
}
