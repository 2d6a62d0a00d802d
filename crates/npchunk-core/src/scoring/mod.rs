//! # Chunk Scoring
//!
//! Token accuracy and exact-span group precision, recall and F1.

pub mod aligned;
pub mod groups;
pub mod report;

pub use aligned::{AlignedFiles, AlignedSentence};
pub use groups::{Group, extract_groups};
pub use report::{ChunkScorer, ScoreReport};
