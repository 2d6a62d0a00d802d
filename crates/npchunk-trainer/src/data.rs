//! Training-example loading from labeled feature files.

use std::path::Path;

use npchunk_core::error::{ChunkerError, Result};
use npchunk_core::{Block, FeatureFile, FeatureMode, LabelScheme, LabeledExample, Placeholder};
use tracing::info;

/// Resolve every line of a labeled feature file into a training example.
///
/// The placeholder is filled with the gold label of the previous token, or
/// the boundary label for the first token of a sentence.
pub fn load_training_examples(
    file: &FeatureFile,
    placeholder: &Placeholder,
) -> Result<Vec<LabeledExample>> {
    placeholder.validate()?;
    let mut examples = Vec::with_capacity(file.line_count());

    let mut line_no = 0usize;
    for block in file.blocks() {
        let sentence = match block {
            Block::Break => {
                line_no += 1;
                continue;
            }
            Block::Sentence(lines) => lines,
        };
        let mut previous = placeholder.boundary.as_str();
        for line in sentence {
            line_no += 1;
            let label = line.label.as_deref().ok_or_else(|| ChunkerError::MalformedLine {
                line: line_no,
                reason: format!("token {:?} has no gold label", line.token),
            })?;
            examples.push(LabeledExample::new(
                placeholder.resolve_fields(&line.features, previous),
                label,
            ));
            previous = label;
        }
    }

    info!(examples = examples.len(), "Loaded training examples");
    Ok(examples)
}

/// Reject any example whose label is not one of the scheme's labels.
pub fn ensure_scheme_labels(examples: &[LabeledExample], scheme: &LabelScheme) -> Result<()> {
    match examples
        .iter()
        .position(|e| scheme.classify(&e.label).is_none())
    {
        Some(i) => Err(ChunkerError::UnknownLabel {
            label: examples[i].label.clone(),
            location: format!("training example {}", i + 1),
        }),
        None => Ok(()),
    }
}

pub fn load_training_file<P: AsRef<Path>>(
    path: P,
    placeholder: &Placeholder,
) -> Result<Vec<LabeledExample>> {
    let file = FeatureFile::from_path(path, FeatureMode::Train)?;
    load_training_examples(&file, placeholder)
}
