//! # Feature Extraction
//!
//! [`FeatureExtractor`] profiles single tokens; [`Templater`] lays those
//! profiles out over a ±2 window and appends the previous-label placeholder
//! features. A [`FeatureSet`] is immutable once built: the placeholder is
//! only ever filled in on a rendered copy.

pub mod extractor;
pub mod lexicon;
pub mod orthography;
pub mod template;

pub use extractor::{FeatureExtractor, TokenProfile};
pub use template::{FeatureFamily, TemplateConfig, Templater};

/// One named feature of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feature {
    /// A fully determined `name=value` string or bare flag name.
    Fixed(String),
    /// The previous token's label, unknown until decode time, optionally
    /// joined with a context value (`PrevBIO+pos=@@+NN`).
    PrevLabel {
        name: String,
        context: Option<String>,
    },
}

impl Feature {
    fn render(&self, value: &str) -> String {
        match self {
            Feature::Fixed(s) => s.clone(),
            Feature::PrevLabel {
                name,
                context: None,
            } => format!("{name}={value}"),
            Feature::PrevLabel {
                name,
                context: Some(ctx),
            } => format!("{name}={value}+{ctx}"),
        }
    }
}

/// Ordered features for one token. Order is significant and duplicates are legal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `name=value` feature.
    pub fn push_value(&mut self, name: &str, value: impl AsRef<str>) {
        self.features
            .push(Feature::Fixed(format!("{name}={}", value.as_ref())));
    }

    /// Append a bare flag when `on` holds.
    pub fn push_flag(&mut self, name: &str, on: bool) {
        if on {
            self.features.push(Feature::Fixed(name.to_string()));
        }
    }

    /// Append a previous-label placeholder feature.
    pub fn push_prev_label(&mut self, name: String, context: Option<String>) {
        self.features.push(Feature::PrevLabel { name, context });
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn has_placeholder(&self) -> bool {
        self.features
            .iter()
            .any(|f| matches!(f, Feature::PrevLabel { .. }))
    }

    /// Render for a feature file, leaving `marker` where the previous label goes.
    pub fn render(&self, marker: &str) -> Vec<String> {
        self.features.iter().map(|f| f.render(marker)).collect()
    }
}
