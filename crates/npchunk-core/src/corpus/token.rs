//! # Tokens and Sentences
//!
//! The immutable units the feature extractor reads. A [`Sentence`] owns its
//! tokens and answers windowed lookups so that no caller ever indexes past
//! either end of the sentence.

/// A POS-tagged token with its position inside the sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Surface form exactly as read.
    pub text: String,
    /// Gold part-of-speech tag.
    pub pos: String,
    /// Gold chunk label, present only in training input.
    pub label: Option<String>,
    /// Token index in the sentence.
    pub index: usize,
}

impl Token {
    /// Create a token without a gold label.
    pub fn new(text: impl Into<String>, pos: impl Into<String>, index: usize) -> Self {
        Self {
            text: text.into(),
            pos: pos.into(),
            label: None,
            index,
        }
    }

    /// Attach a gold label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// An ordered, non-empty run of tokens between two sentence breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    tokens: Vec<Token>,
}

impl Sentence {
    /// Build a sentence, renumbering token indices from zero.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        for (i, token) in tokens.iter_mut().enumerate() {
            token.index = i;
        }
        Self { tokens }
    }

    /// Convenience constructor from `(word, pos)` pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self::new(
            pairs
                .into_iter()
                .enumerate()
                .map(|(i, (w, p))| Token::new(w, p, i))
                .collect(),
        )
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token at `index + offset`, or `None` when the offset leaves the sentence.
    pub fn at_offset(&self, index: usize, offset: isize) -> Option<&Token> {
        let target = index.checked_add_signed(offset)?;
        self.tokens.get(target)
    }

    /// Gold labels in order; `None` if any token lacks one.
    pub fn gold_labels(&self) -> Option<Vec<&str>> {
        self.tokens.iter().map(|t| t.label.as_deref()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Sentence {
        Sentence::from_pairs([("The", "DT"), ("dog", "NN"), ("barked", "VBD")])
    }

    #[test]
    fn test_indices_renumbered() {
        let s = Sentence::new(vec![Token::new("a", "DT", 9), Token::new("b", "NN", 4)]);
        assert_eq!(s.tokens()[0].index, 0);
        assert_eq!(s.tokens()[1].index, 1);
    }

    #[test]
    fn test_offsets_stay_in_bounds() {
        let s = sample();
        assert!(s.at_offset(0, -1).is_none());
        assert!(s.at_offset(0, -2).is_none());
        assert!(s.at_offset(2, 1).is_none());
        assert_eq!(s.at_offset(1, -1).map(|t| t.text.as_str()), Some("The"));
        assert_eq!(s.at_offset(0, 2).map(|t| t.text.as_str()), Some("barked"));
    }

    #[test]
    fn test_gold_labels() {
        assert!(sample().gold_labels().is_none());

        let labeled = Sentence::new(vec![
            Token::new("The", "DT", 0).with_label("B-NP"),
            Token::new("dog", "NN", 1).with_label("I-NP"),
        ]);
        assert_eq!(labeled.gold_labels(), Some(vec!["B-NP", "I-NP"]));
    }
}
