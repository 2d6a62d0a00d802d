//! # Previous-Label Placeholder
//!
//! Sequence features name the previous token's label, which is not known
//! until decode time. Feature files carry a reserved marker in its place;
//! [`Placeholder`] owns that marker and knows how to fill it in.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{ChunkerError, Result};

/// Marker, feature-name prefix and sentence-start value of the sequence features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    /// Stands for "label of the previous token" in rendered features.
    pub marker: String,
    /// Only features whose name starts with this prefix carry the marker.
    pub prefix: String,
    /// Previous-label value for the first token of every sentence.
    pub boundary: String,
}

impl Default for Placeholder {
    fn default() -> Self {
        Self {
            marker: "@@".into(),
            prefix: "PrevBIO".into(),
            boundary: "BOS".into(),
        }
    }
}

impl Placeholder {
    /// Check that the strings can be written to and recovered from a feature line.
    pub fn validate(&self) -> Result<()> {
        for (what, value) in [
            ("marker", &self.marker),
            ("prefix", &self.prefix),
            ("boundary", &self.boundary),
        ] {
            if value.is_empty() || value.contains(['\t', '\n', '=']) {
                return Err(ChunkerError::InvalidConfig(format!(
                    "placeholder {what} {value:?} must be non-empty and free of tabs, newlines and '='"
                )));
            }
        }
        if self.marker == self.boundary {
            return Err(ChunkerError::InvalidConfig(
                "placeholder marker and boundary label must differ".into(),
            ));
        }
        Ok(())
    }

    /// Whether a rendered feature belongs to the sequence family.
    pub fn is_sequence_feature(&self, field: &str) -> bool {
        field.starts_with(self.prefix.as_str())
    }

    /// Fill the marker in one rendered feature.
    ///
    /// Only the value of a sequence feature is rewritten, so a literal marker
    /// elsewhere (for instance a token spelled `@@`) is left alone.
    pub fn resolve_field<'a>(&self, field: &'a str, previous_label: &str) -> Cow<'a, str> {
        if !self.is_sequence_feature(field) {
            return Cow::Borrowed(field);
        }
        match field.split_once('=') {
            Some((name, value)) if value.contains(self.marker.as_str()) => Cow::Owned(format!(
                "{name}={}",
                value.replacen(self.marker.as_str(), previous_label, 1)
            )),
            _ => Cow::Borrowed(field),
        }
    }

    /// Fill the marker in every field of a feature line.
    pub fn resolve_fields(&self, fields: &[String], previous_label: &str) -> Vec<String> {
        fields
            .iter()
            .map(|f| self.resolve_field(f, previous_label).into_owned())
            .collect()
    }
}
