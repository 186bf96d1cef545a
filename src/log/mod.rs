//! Log-side stages: normalization, tokenization and phase segmentation.

pub mod line;
pub mod normalize;
pub mod segment;
pub mod tokenize;

pub use line::{LogLine, Phase};
pub use normalize::Normalizer;
pub use segment::{SegmentState, Segmenter, segment};
pub use tokenize::{ParsedLine, tokenize};

use std::collections::BTreeSet;

/// Sorted distinct action words (first word of every line).
pub fn distinct_actions(lines: &[LogLine]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|l| l.raw.split_whitespace().next())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
