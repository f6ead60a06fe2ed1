//! Localized re-parse after an edit
//!
//! When an edit falls inside a single well-formed element, only that
//! element has to be parsed again. [`parse_tag_fragment`](super::parse_tag_fragment)
//! re-parses its new text with the names of its ancestors as open-name
//! context, so mismatched closing tags recover exactly as they would in a
//! full parse. Edits that do not fit a single element, or whose re-parse
//! changes the element's boundaries, fall back to a full document parse.
//!
//! # Example
//!
//! ```rust,ignore
//! use xmlcst_core::cst::incremental::{IncrementalUpdater, TextEdit};
//!
//! let source = "<doc><item>old</item></doc>";
//! let tree = parse_document(source, 0..source.len())?;
//!
//! let updater = IncrementalUpdater::new();
//! let result = updater.apply_edit(&tree, &TextEdit::replace_range(11..14, "new"))?;
//! assert!(!result.full_reparse);
//! assert_eq!(result.tree.text(), "<item>new</item>");
//! ```

use std::ops::Range;
use std::time::Instant;

use rowan::{TextRange, TextSize};
use tracing::debug;

use super::parser::{checked_range, parse_document_with, parse_tag_fragment_with};
use super::tree::{NodeId, XmlTree};
use super::XmlSyntaxKind;
use crate::config::ParserConfig;
use crate::error::XmlCstError;
use crate::result::Result;

/// Represents a text edit operation
#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    /// Range to replace
    pub range: TextRange,
    /// New text to insert
    pub new_text: String,
}

impl TextEdit {
    pub fn new(range: TextRange, new_text: String) -> Self {
        Self { range, new_text }
    }

    pub fn replace(range: impl Into<TextRange>, new_text: impl Into<String>) -> Self {
        Self {
            range: range.into(),
            new_text: new_text.into(),
        }
    }

    /// Create a replacement edit from usize range
    pub fn replace_range(range: Range<usize>, new_text: impl Into<String>) -> Self {
        Self {
            range: TextRange::new(
                TextSize::from(range.start as u32),
                TextSize::from(range.end as u32),
            ),
            new_text: new_text.into(),
        }
    }

    pub fn insert(position: TextSize, text: impl Into<String>) -> Self {
        Self {
            range: TextRange::empty(position),
            new_text: text.into(),
        }
    }

    pub fn delete(range: impl Into<TextRange>) -> Self {
        Self {
            range: range.into(),
            new_text: String::new(),
        }
    }

    pub fn is_insertion(&self) -> bool {
        self.range.is_empty() && !self.new_text.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        !self.range.is_empty() && self.new_text.is_empty()
    }

    /// Get the length change caused by this edit
    pub fn length_delta(&self) -> i64 {
        self.new_text.len() as i64 - usize::from(self.range.len()) as i64
    }

    /// Apply the edit to `source`
    pub fn apply(&self, source: &str) -> Result<String> {
        let range = usize::from(self.range.start())..usize::from(self.range.end());
        checked_range(source, &range)?;
        let mut edited = String::with_capacity(source.len() + self.new_text.len());
        edited.push_str(&source[..range.start]);
        edited.push_str(&self.new_text);
        edited.push_str(&source[range.end..]);
        Ok(edited)
    }
}

/// Result of an incremental update operation
#[derive(Debug, Clone)]
pub struct UpdateResult {
    /// Source text after the edit
    pub source: String,
    /// Re-parsed element as a fragment tree, or the whole document after a
    /// fallback
    pub tree: XmlTree,
    /// Range of `tree` within the new source
    pub range: TextRange,
    /// Whether the update fell back to a full document parse
    pub full_reparse: bool,
    pub metrics: UpdateMetrics,
}

/// Performance metrics for incremental updates
#[derive(Debug, Clone, Default)]
pub struct UpdateMetrics {
    /// Time taken for the update (in microseconds)
    pub update_time_us: u64,
    /// Number of nodes that were re-parsed
    pub nodes_reparsed: usize,
    /// Number of nodes of the previous tree outside the re-parsed element
    pub nodes_reused: usize,
    /// Range of the previous tree that was replaced
    pub affected_range: Option<TextRange>,
}

impl UpdateMetrics {
    /// Calculate the reuse ratio (0.0 to 1.0)
    pub fn reuse_ratio(&self) -> f64 {
        let total = self.nodes_reparsed + self.nodes_reused;
        if total == 0 {
            0.0
        } else {
            self.nodes_reused as f64 / total as f64
        }
    }
}

/// Re-parses the smallest element enclosing an edit
#[derive(Debug, Clone)]
pub struct IncrementalUpdater {
    /// Elements longer than this are re-parsed with the whole document
    max_incremental_size: usize,
    config: ParserConfig,
}

impl Default for IncrementalUpdater {
    fn default() -> Self {
        Self::new()
    }
}

impl IncrementalUpdater {
    pub fn new() -> Self {
        Self {
            max_incremental_size: 64 * 1024,
            config: ParserConfig::default(),
        }
    }

    /// Set maximum size for incremental updates
    pub fn max_incremental_size(mut self, size: usize) -> Self {
        self.max_incremental_size = size;
        self
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Parse `element` again, in the context of its ancestors in `tree`
    ///
    /// Returns the fragment tree covering the element's current range.
    pub fn reparse_element(&self, tree: &XmlTree, element: NodeId) -> Result<XmlTree> {
        if tree.kind(element) != XmlSyntaxKind::Tag {
            return Err(XmlCstError::internal_error(format!(
                "{:?} node is not an element",
                tree.kind(element)
            )));
        }
        let range = tree
            .text_range(element)
            .ok_or_else(|| XmlCstError::internal_error("element covers no text"))?;
        let ancestors = ancestor_names(tree, element);
        debug!(?range, depth = ancestors.len(), "Re-parsing element");
        parse_tag_fragment_with(
            tree.source(),
            usize::from(range.start())..usize::from(range.end()),
            &ancestors,
            &self.config,
        )
    }

    /// Apply `edit` to the source of `tree` and re-parse as little as possible
    pub fn apply_edit(&self, tree: &XmlTree, edit: &TextEdit) -> Result<UpdateResult> {
        let start_time = Instant::now();
        if !tree.range().contains_range(edit.range) {
            return Err(XmlCstError::invalid_range(
                edit.range.start().into(),
                edit.range.end().into(),
                tree.source().len(),
            ));
        }
        let source = edit.apply(tree.source())?;

        let candidate = enclosing_element(tree, edit.range).filter(|&(_, range)| {
            usize::from(range.len()) <= self.max_incremental_size
        });
        if let Some((element, old_range)) = candidate {
            let ancestors = ancestor_names(tree, element);
            let new_range = shift_end(old_range, edit.length_delta())?;
            let span = usize::from(new_range.start())..usize::from(new_range.end());
            let fragment = parse_tag_fragment_with(&source, span, &ancestors, &self.config)?;

            if is_single_closed_element(&fragment) {
                debug!(?old_range, ?new_range, depth = ancestors.len(), "Re-parsed element in place");
                let metrics = UpdateMetrics {
                    update_time_us: elapsed_us(start_time),
                    nodes_reparsed: fragment.node_count(),
                    nodes_reused: tree.node_count() - tree.descendants(element).len(),
                    affected_range: Some(old_range),
                };
                return Ok(UpdateResult {
                    source,
                    tree: fragment,
                    range: new_range,
                    full_reparse: false,
                    metrics,
                });
            }
            debug!(?old_range, "Element boundaries changed, re-parsing the document");
        }

        let range = shift_end(tree.range(), edit.length_delta())?;
        let span = usize::from(range.start())..usize::from(range.end());
        let document = if tree.kind(tree.root()) == XmlSyntaxKind::Document {
            parse_document_with(&source, span, &self.config)?
        } else {
            // Fragments other than documents have no prolog to re-parse
            parse_tag_fragment_with(&source, span, Vec::<String>::new(), &self.config)?
        };
        let metrics = UpdateMetrics {
            update_time_us: elapsed_us(start_time),
            nodes_reparsed: document.node_count(),
            nodes_reused: 0,
            affected_range: Some(tree.range()),
        };
        Ok(UpdateResult {
            source,
            tree: document,
            range,
            full_reparse: true,
            metrics,
        })
    }
}

/// Names of the elements enclosing `node`, outermost first
pub fn ancestor_names(tree: &XmlTree, node: NodeId) -> Vec<String> {
    let mut path = tree.path_from_root(node);
    path.pop();
    path.into_iter()
        .filter_map(|ancestor| tree.tag_name(ancestor))
        .map(str::to_string)
        .collect()
}

/// Innermost closed element whose delimiters are untouched by `edit`
fn enclosing_element(tree: &XmlTree, edit: TextRange) -> Option<(NodeId, TextRange)> {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|&node| {
            tree.kind(node) == XmlSyntaxKind::Tag
                && !tree.is_unclosed(node)
                && tree.find_child(node, XmlSyntaxKind::EndTagStart).is_some()
        })
        .filter_map(|node| Some((node, tree.text_range(node)?)))
        .filter(|&(_, range)| {
            range.start() < edit.start() && edit.end() < range.end()
        })
        .min_by_key(|&(_, range)| range.len())
}

/// A single element spanning the whole fragment and closed by its own end tag
fn is_single_closed_element(fragment: &XmlTree) -> bool {
    match fragment.children(fragment.root()) {
        [element] => {
            fragment.kind(*element) == XmlSyntaxKind::Tag
                && !fragment.is_unclosed(*element)
                && fragment.find_child(*element, XmlSyntaxKind::EndTagStart).is_some()
        }
        _ => false,
    }
}

fn shift_end(range: TextRange, delta: i64) -> Result<TextRange> {
    let end = i64::from(u32::from(range.end())) + delta;
    let end = u32::try_from(end)
        .ok()
        .filter(|&end| end >= u32::from(range.start()))
        .ok_or_else(|| XmlCstError::internal_error(format!("edit delta {delta} shrinks {range:?} below zero")))?;
    Ok(TextRange::new(range.start(), TextSize::new(end)))
}

fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}
