//! # npchunk Core
//!
//! Noun-phrase chunking as BIO sequence labeling. Provides the token
//! featurizer, the greedy previous-label decoder that drives an external
//! log-linear classifier, and exact-span chunk scoring.
//!
//! ## Quick Start
//!
//! ```rust
//! use npchunk_core::{Corpus, FeatureFile, FeatureMode, InputFormat, TemplateConfig, Templater};
//!
//! let input = "The\tDT\nold\tJJ\ndog\tNN\n\n";
//! let corpus = Corpus::read(input.as_bytes(), InputFormat::Pos).unwrap();
//! let templater = Templater::new(TemplateConfig::default()).unwrap();
//! let file = FeatureFile::from_corpus(&corpus, &templater, FeatureMode::Tag).unwrap();
//!
//! assert_eq!(file.line_count(), 4);
//! ```
pub mod analysis;
pub mod classifier;
pub mod corpus;
pub mod decoder;
pub mod error;
pub mod featfile;
pub mod features;
pub mod labels;
pub mod placeholder;
pub mod scoring;

// Re-export primary API
pub use analysis::ErrorAnalysis;
pub use classifier::{Classifier, LabelDistribution, LabeledExample, Trainer};
pub use corpus::{Corpus, InputFormat, Segment, Sentence, Token};
pub use decoder::{DecodeState, DecoderConfig, GreedyDecoder, TaggedFile};
pub use error::{ChunkerError, Result};
pub use featfile::{Block, FeatureFile, FeatureLine, FeatureMode, Layout, LineKind};
pub use features::{FeatureFamily, FeatureSet, TemplateConfig, Templater};
pub use labels::{BioTag, LabelScheme};
pub use placeholder::Placeholder;
pub use scoring::{AlignedFiles, ChunkScorer, Group, ScoreReport, extract_groups};
