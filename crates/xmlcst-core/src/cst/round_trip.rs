//! Losslessness validation
//!
//! A tree is lossless when its leaves, in document order, tile the parsed
//! range exactly: no gap, no overlap, nothing outside the range. Their
//! concatenated text then reproduces the input byte for byte.
//!
//! # Example
//!
//! ```rust,ignore
//! use xmlcst_core::cst::round_trip::RoundTripValidator;
//!
//! let validator = RoundTripValidator::new();
//! let result = validator.validate_source("<a><b></a>")?;
//! assert!(result.is_valid());
//! ```

use rowan::TextSize;

use super::parser::parse_document;
use super::tree::XmlTree;
use crate::error::XmlCstError;
use crate::result::Result;

/// Result of round-trip validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the leaves tile the range exactly
    pub is_valid: bool,
    /// Slice of the source the tree was parsed from
    pub original: String,
    /// Concatenated leaf text
    pub reconstructed: String,
    /// Offset of the first byte where the two texts differ
    pub first_difference: Option<usize>,
    /// Tiling defects in document order
    pub differences: Vec<TilingDifference>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Human readable summary of every defect
    pub fn issues(&self) -> Vec<String> {
        let mut issues: Vec<String> = self
            .differences
            .iter()
            .map(|difference| format!("{:?} at {}: {}", difference.kind, difference.offset, difference.description))
            .collect();
        if let Some(offset) = self.first_difference {
            issues.push(format!("Reconstructed text differs from the source at byte {offset}"));
        }
        issues
    }
}

/// A place where the leaves fail to tile the range
#[derive(Debug, Clone, PartialEq)]
pub struct TilingDifference {
    pub kind: DifferenceKind,
    /// Absolute byte offset in the source buffer
    pub offset: usize,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceKind {
    /// Bytes covered by no leaf
    Gap,
    /// Bytes covered by more than one leaf
    Overlap,
    /// A leaf outside the parsed range
    OutOfRange,
}

/// Round-trip validator for parsed trees
#[derive(Debug, Default)]
pub struct RoundTripValidator;

impl RoundTripValidator {
    pub fn new() -> Self {
        Self
    }

    /// Parse `source` as a document and validate the result
    pub fn validate_source(&self, source: &str) -> Result<ValidationResult> {
        let tree = parse_document(source, 0..source.len())?;
        Ok(self.validate(&tree))
    }

    /// Check that the leaves of `tree` tile its range
    pub fn validate(&self, tree: &XmlTree) -> ValidationResult {
        let range = tree.range();
        let mut differences = Vec::new();
        let mut cursor = range.start();

        for leaf in tree.leaves(tree.root()) {
            let Some(leaf_range) = tree.leaf_range(leaf) else {
                continue;
            };
            if !range.contains_range(leaf_range) {
                differences.push(TilingDifference {
                    kind: DifferenceKind::OutOfRange,
                    offset: leaf_range.start().into(),
                    description: format!("{:?} leaf {:?} outside {:?}", tree.kind(leaf), leaf_range, range),
                });
            }
            if leaf_range.start() > cursor {
                differences.push(gap(cursor, leaf_range.start()));
            } else if leaf_range.start() < cursor {
                differences.push(TilingDifference {
                    kind: DifferenceKind::Overlap,
                    offset: leaf_range.start().into(),
                    description: format!(
                        "{:?} leaf {:?} starts before the previous leaf ends at {:?}",
                        tree.kind(leaf),
                        leaf_range,
                        cursor
                    ),
                });
            }
            cursor = cursor.max(leaf_range.end());
        }
        if cursor < range.end() {
            differences.push(gap(cursor, range.end()));
        }

        let original = tree.source()[range].to_string();
        let reconstructed = tree.text();
        let first_difference = first_difference(&original, &reconstructed)
            .map(|index| index + usize::from(range.start()));

        ValidationResult {
            is_valid: differences.is_empty() && first_difference.is_none(),
            original,
            reconstructed,
            first_difference,
            differences,
        }
    }
}

fn gap(from: TextSize, to: TextSize) -> TilingDifference {
    TilingDifference {
        kind: DifferenceKind::Gap,
        offset: from.into(),
        description: format!("bytes {from:?}..{to:?} are not covered by any leaf"),
    }
}

fn first_difference(a: &str, b: &str) -> Option<usize> {
    let common = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    (common < a.len() || common < b.len()).then_some(common)
}

/// Fail with an invariant violation unless `tree` is lossless
pub(crate) fn verify(tree: &XmlTree) -> Result<()> {
    let result = RoundTripValidator::new().validate(tree);
    if result.is_valid {
        return Ok(());
    }
    let issues = result.issues();
    tracing::error!(?issues, "Parsed tree is not lossless");
    Err(XmlCstError::invariant_violation(format!(
        "tree does not reproduce its input: {}",
        issues.join("; ")
    )))
}
