//! # BIO Labels
//!
//! The chunk label alphabet is configuration, not code: a [`LabelScheme`]
//! maps the three concrete label strings onto [`BioTag`] roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a label within the BIO scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BioTag {
    /// Opens a chunk.
    Begin,
    /// Continues the chunk opened before it.
    Inside,
    /// Outside any chunk.
    Outside,
}

impl BioTag {
    /// Get all tags in order.
    pub fn all_tags() -> &'static [BioTag] {
        &[BioTag::Begin, BioTag::Inside, BioTag::Outside]
    }

    /// Check if transitioning from `from` to `to` is well formed.
    ///
    /// `from` is `None` at the start of a sentence.
    pub fn is_valid_transition(from: Option<BioTag>, to: BioTag) -> bool {
        !matches!((from, to), (None | Some(BioTag::Outside), BioTag::Inside))
    }
}

impl fmt::Display for BioTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BioTag::Begin => write!(f, "B"),
            BioTag::Inside => write!(f, "I"),
            BioTag::Outside => write!(f, "O"),
        }
    }
}

/// Concrete label strings for the single chunk type being scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelScheme {
    pub begin: String,
    pub inside: String,
    pub outside: String,
}

impl Default for LabelScheme {
    fn default() -> Self {
        Self {
            begin: "B-NP".into(),
            inside: "I-NP".into(),
            outside: "O".into(),
        }
    }
}

impl LabelScheme {
    /// Create a scheme from explicit label strings.
    pub fn new(
        begin: impl Into<String>,
        inside: impl Into<String>,
        outside: impl Into<String>,
    ) -> Self {
        Self {
            begin: begin.into(),
            inside: inside.into(),
            outside: outside.into(),
        }
    }

    /// Map a label string to its role, or `None` if it is not in the scheme.
    pub fn classify(&self, label: &str) -> Option<BioTag> {
        if label == self.begin {
            Some(BioTag::Begin)
        } else if label == self.inside {
            Some(BioTag::Inside)
        } else if label == self.outside {
            Some(BioTag::Outside)
        } else {
            None
        }
    }

    /// The label string for a role.
    pub fn label(&self, tag: BioTag) -> &str {
        match tag {
            BioTag::Begin => &self.begin,
            BioTag::Inside => &self.inside,
            BioTag::Outside => &self.outside,
        }
    }

    /// Whether the three labels are distinct and non-empty.
    pub fn is_well_formed(&self) -> bool {
        let labels = [&self.begin, &self.inside, &self.outside];
        labels.iter().all(|l| !l.is_empty() && !l.contains('\t'))
            && self.begin != self.inside
            && self.begin != self.outside
            && self.inside != self.outside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_default_scheme() {
        let scheme = LabelScheme::default();
        assert_eq!(scheme.classify("B-NP"), Some(BioTag::Begin));
        assert_eq!(scheme.classify("I-NP"), Some(BioTag::Inside));
        assert_eq!(scheme.classify("O"), Some(BioTag::Outside));
        assert_eq!(scheme.classify("B-VP"), None);
    }

    #[test]
    fn test_custom_scheme_roundtrip() {
        let scheme = LabelScheme::new("B", "I", "O");
        for tag in BioTag::all_tags() {
            assert_eq!(scheme.classify(scheme.label(*tag)), Some(*tag));
        }
    }

    #[test]
    fn test_valid_transitions() {
        assert!(BioTag::is_valid_transition(None, BioTag::Begin));
        assert!(BioTag::is_valid_transition(Some(BioTag::Begin), BioTag::Inside));
        assert!(BioTag::is_valid_transition(Some(BioTag::Inside), BioTag::Inside));
        assert!(BioTag::is_valid_transition(Some(BioTag::Outside), BioTag::Begin));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!BioTag::is_valid_transition(None, BioTag::Inside));
        assert!(!BioTag::is_valid_transition(Some(BioTag::Outside), BioTag::Inside));
    }

    #[test]
    fn test_well_formed() {
        assert!(LabelScheme::default().is_well_formed());
        assert!(!LabelScheme::new("B", "B", "O").is_well_formed());
        assert!(!LabelScheme::new("", "I", "O").is_well_formed());
    }
}
