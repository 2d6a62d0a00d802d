//! # Group Extraction
//!
//! Turns a flat BIO sequence into chunk spans with a single left-to-right
//! scan. A continuation label with no open group (after an outside label or
//! at sentence start) opens nothing and is dropped from the group view.

use serde::{Deserialize, Serialize};

use crate::labels::BioTag;

/// A chunk span within one sentence, `end` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Group {
    pub sentence: usize,
    pub begin: usize,
    pub end: usize,
}

impl Group {
    pub fn new(sentence: usize, begin: usize, end: usize) -> Self {
        Self {
            sentence,
            begin,
            end,
        }
    }

    pub fn span(&self) -> (usize, usize) {
        (self.begin, self.end)
    }

    /// Number of tokens covered.
    pub fn width(&self) -> usize {
        self.end - self.begin + 1
    }
}

/// Extract the groups of one sentence.
pub fn extract_groups(tags: &[BioTag], sentence: usize) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut open: Option<usize> = None;

    for (i, tag) in tags.iter().enumerate() {
        match tag {
            BioTag::Begin => {
                if let Some(begin) = open.take() {
                    groups.push(Group::new(sentence, begin, i - 1));
                }
                open = Some(i);
            }
            BioTag::Inside => {}
            BioTag::Outside => {
                if let Some(begin) = open.take() {
                    groups.push(Group::new(sentence, begin, i - 1));
                }
            }
        }
    }

    if let Some(begin) = open {
        groups.push(Group::new(sentence, begin, tags.len() - 1));
    }
    groups
}
