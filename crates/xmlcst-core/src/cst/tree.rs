//! Arena-backed concrete syntax tree
//!
//! The parser and the trivia reinsertion pass both need to move already
//! attached nodes around (tag recovery hoists children into an ancestor,
//! reinsertion splices trivia between siblings). Nodes therefore live in a
//! flat arena and refer to each other by [`NodeId`]; re-parenting is an edit
//! of two index lists. Once a parse entry point returns, the tree is only
//! exposed through shared references and is effectively immutable.
//!
//! [`XmlTree::to_syntax`] freezes the arena into a Rowan tree for consumers
//! that prefer the red/green API.

use std::sync::Arc;

use rowan::{GreenNode, GreenNodeBuilder, TextRange};

use super::{ErrorCode, SyntaxError, XmlSyntaxKind, XmlSyntaxNode};

/// Index of a node in an [`XmlTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeData {
    Leaf(TextRange),
    Composite { children: Vec<NodeId>, unclosed: bool },
    Error(ErrorCode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeEntry {
    kind: XmlSyntaxKind,
    parent: Option<NodeId>,
    data: NodeData,
}

/// Lossless XML syntax tree
#[derive(Debug, Clone)]
pub struct XmlTree {
    source: Arc<str>,
    range: TextRange,
    nodes: Vec<NodeEntry>,
    root: NodeId,
}

impl XmlTree {
    /// Create a tree holding only a root composite of `root_kind`
    pub(crate) fn new(source: Arc<str>, range: TextRange, root_kind: XmlSyntaxKind) -> Self {
        let mut tree = Self {
            source,
            range,
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.new_composite(root_kind);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The whole buffer the tree was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed range of [`source`](Self::source)
    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> XmlSyntaxKind {
        self.entry(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).parent
    }

    /// Children of a composite; empty for leaves and error markers
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.entry(id).data {
            NodeData::Composite { children, .. } => children,
            _ => &[],
        }
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.entry(id).data, NodeData::Leaf(_))
    }

    pub fn is_composite(&self, id: NodeId) -> bool {
        matches!(self.entry(id).data, NodeData::Composite { .. })
    }

    pub fn is_unclosed(&self, id: NodeId) -> bool {
        matches!(self.entry(id).data, NodeData::Composite { unclosed: true, .. })
    }

    pub fn error_code(&self, id: NodeId) -> Option<ErrorCode> {
        match self.entry(id).data {
            NodeData::Error(code) => Some(code),
            _ => None,
        }
    }

    pub fn leaf_range(&self, id: NodeId) -> Option<TextRange> {
        match self.entry(id).data {
            NodeData::Leaf(range) => Some(range),
            _ => None,
        }
    }

    pub fn leaf_text(&self, id: NodeId) -> Option<&str> {
        self.leaf_range(id).map(|range| self.slice(range))
    }

    /// Position of `id` among its parent's children
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Nodes from the root down to `id`, both included
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// `id` and everything below it, in document (pre)order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Leaf tokens below `id` in document order
    pub fn leaves(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.is_leaf(node))
            .collect()
    }

    pub fn first_leaf(&self, id: NodeId) -> Option<NodeId> {
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if self.is_leaf(node) {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        None
    }

    pub fn find_child(&self, id: NodeId, kind: XmlSyntaxKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.kind(child) == kind)
    }

    /// Name of a `Tag` node, taken from its first `TagName` token
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        if self.kind(id) != XmlSyntaxKind::Tag {
            return None;
        }
        self.find_child(id, XmlSyntaxKind::TagName)
            .and_then(|name| self.leaf_text(name))
    }

    /// Range covered by the leaves below `id`; `None` when there are none
    pub fn text_range(&self, id: NodeId) -> Option<TextRange> {
        let leaves = self.leaves(id);
        let first = self.leaf_range(*leaves.first()?)?;
        let last = self.leaf_range(*leaves.last()?)?;
        Some(TextRange::new(first.start(), last.end()))
    }

    /// Text of everything below `id`
    pub fn node_text(&self, id: NodeId) -> String {
        self.leaves(id)
            .into_iter()
            .filter_map(|leaf| self.leaf_text(leaf))
            .collect()
    }

    /// Concatenated leaf text of the whole tree
    pub fn text(&self) -> String {
        self.node_text(self.root)
    }

    /// Every error marker, positioned at the end of the preceding leaf
    pub fn errors(&self) -> Vec<SyntaxError> {
        let mut errors = Vec::new();
        let mut cursor = usize::from(self.range.start());
        for node in self.descendants(self.root) {
            match self.entry(node).data {
                NodeData::Leaf(range) => cursor = range.end().into(),
                NodeData::Error(code) => errors.push(SyntaxError {
                    code,
                    offset: cursor,
                }),
                NodeData::Composite { .. } => {}
            }
        }
        errors
    }

    pub fn has_errors(&self) -> bool {
        self.nodes
            .iter()
            .any(|entry| matches!(entry.data, NodeData::Error(_)))
    }

    /// Build an immutable Rowan green tree with the same shape
    ///
    /// Error markers become empty `Error` nodes. Rowan offsets start at zero,
    /// so for a sub-range parse they are relative to the range start.
    pub fn green(&self) -> GreenNode {
        enum Step {
            Enter(NodeId),
            Exit,
        }

        let mut builder = GreenNodeBuilder::new();
        let mut stack = vec![Step::Enter(self.root)];
        while let Some(step) = stack.pop() {
            let id = match step {
                Step::Exit => {
                    builder.finish_node();
                    continue;
                }
                Step::Enter(id) => id,
            };
            let entry = self.entry(id);
            match &entry.data {
                NodeData::Leaf(range) => builder.token(entry.kind.into(), self.slice(*range)),
                NodeData::Error(_) => {
                    builder.start_node(XmlSyntaxKind::Error.into());
                    builder.finish_node();
                }
                NodeData::Composite { children, .. } => {
                    builder.start_node(entry.kind.into());
                    stack.push(Step::Exit);
                    stack.extend(children.iter().rev().map(|&child| Step::Enter(child)));
                }
            }
        }
        builder.finish()
    }

    pub fn to_syntax(&self) -> XmlSyntaxNode {
        XmlSyntaxNode::new_root(self.green())
    }

    // Node factory and mutation, only reachable while parsing

    pub(crate) fn new_composite(&mut self, kind: XmlSyntaxKind) -> NodeId {
        self.push_entry(
            kind,
            NodeData::Composite {
                children: Vec::new(),
                unclosed: false,
            },
        )
    }

    pub(crate) fn new_leaf(&mut self, kind: XmlSyntaxKind, range: TextRange) -> NodeId {
        self.push_entry(kind, NodeData::Leaf(range))
    }

    pub(crate) fn new_error(&mut self, code: ErrorCode) -> NodeId {
        self.push_entry(XmlSyntaxKind::Error, NodeData::Error(code))
    }

    pub(crate) fn append(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert(parent, len, child);
    }

    pub(crate) fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let NodeData::Composite { children, .. } = &mut self.nodes[parent.index()].data {
            let index = index.min(children.len());
            children.insert(index, child);
            self.nodes[child.index()].parent = Some(parent);
        } else {
            debug_assert!(false, "attaching a child to non-composite {parent:?}");
        }
    }

    /// Interleave new children into the child list of `parent` in one pass
    ///
    /// `inserts` is sorted by index; each child lands right before the
    /// current child at its index, or at the end when the index is past it.
    pub(crate) fn merge_children(&mut self, parent: NodeId, inserts: &[(usize, NodeId)]) {
        let NodeData::Composite { children, .. } = &mut self.nodes[parent.index()].data else {
            debug_assert!(false, "attaching children to non-composite {parent:?}");
            return;
        };
        let current = std::mem::take(children);
        let mut merged = Vec::with_capacity(current.len() + inserts.len());
        let mut pending = inserts.iter().peekable();
        for (index, child) in current.into_iter().enumerate() {
            while let Some(&(_, node)) = pending.next_if(|&&(at, _)| at <= index) {
                merged.push(node);
            }
            merged.push(child);
        }
        merged.extend(pending.map(|&(_, node)| node));
        *children = merged;

        for &(_, node) in inserts {
            self.nodes[node.index()].parent = Some(parent);
        }
    }

    /// Detach the children of `parent` from `at` onwards
    pub(crate) fn split_off_children(&mut self, parent: NodeId, at: usize) -> Vec<NodeId> {
        let detached = match &mut self.nodes[parent.index()].data {
            NodeData::Composite { children, .. } if at < children.len() => children.split_off(at),
            _ => Vec::new(),
        };
        for &child in &detached {
            self.nodes[child.index()].parent = None;
        }
        detached
    }

    pub(crate) fn set_unclosed(&mut self, id: NodeId) {
        if let NodeData::Composite { unclosed, .. } = &mut self.nodes[id.index()].data {
            *unclosed = true;
        }
    }

    fn push_entry(&mut self, kind: XmlSyntaxKind, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeEntry {
            kind,
            parent: None,
            data,
        });
        id
    }

    fn entry(&self, id: NodeId) -> &NodeEntry {
        &self.nodes[id.index()]
    }

    fn slice(&self, range: TextRange) -> &str {
        &self.source[usize::from(range.start())..usize::from(range.end())]
    }
}
