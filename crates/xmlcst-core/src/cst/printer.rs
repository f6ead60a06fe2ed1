//! Indented debug dump of a syntax tree
//!
//! One line per node: composites show their kind and covered range (and
//! `unclosed` when flagged), leaves add their text, error markers show their
//! code.
//!
//! ```text
//! Document@0..10
//!   Tag@0..10
//!     StartTagStart@0..1 "<"
//!     TagName@1..2 "a"
//!     TagEnd@2..3 ">"
//!     Tag@3..6 unclosed
//!       StartTagStart@3..4 "<"
//!       TagName@4..5 "b"
//!       TagEnd@5..6 ">"
//!       Error(element-not-closed)
//!     EndTagStart@6..8 "</"
//!     TagName@8..9 "a"
//!     TagEnd@9..10 ">"
//! ```

use std::fmt::Write;

use super::tree::{NodeId, XmlTree};

/// Render the whole tree
pub fn debug_tree(tree: &XmlTree) -> String {
    debug_subtree(tree, tree.root())
}

/// Render `node` and everything below it
pub fn debug_subtree(tree: &XmlTree, node: NodeId) -> String {
    let mut out = String::new();
    let mut stack = vec![(node, 0usize)];
    while let Some((id, depth)) = stack.pop() {
        // Writing into a String cannot fail
        let _ = write_node(&mut out, tree, id, depth);
        stack.extend(
            tree.children(id)
                .iter()
                .rev()
                .map(|&child| (child, depth + 1)),
        );
    }
    out
}

fn write_node(out: &mut String, tree: &XmlTree, id: NodeId, depth: usize) -> std::fmt::Result {
    write!(out, "{:indent$}", "", indent = depth * 2)?;
    let kind = tree.kind(id);

    if let Some(code) = tree.error_code(id) {
        return writeln!(out, "Error({})", code.as_str());
    }
    if let (Some(range), Some(text)) = (tree.leaf_range(id), tree.leaf_text(id)) {
        return writeln!(out, "{kind:?}@{range:?} {text:?}");
    }

    write!(out, "{kind:?}")?;
    if let Some(range) = tree.text_range(id) {
        write!(out, "@{range:?}")?;
    }
    if tree.is_unclosed(id) {
        write!(out, " unclosed")?;
    }
    writeln!(out)
}
