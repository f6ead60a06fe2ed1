//! Trivia reinsertion
//!
//! The structural parser only sees the filtered token stream. This pass
//! walks the finished tree's leaves in lockstep with the unfiltered stream
//! and splices every skipped run (whitespace, comments, bad characters) back
//! in, so that the leaves tile the parsed range again.
//!
//! Placement of a run found between two leaves:
//!
//! 1. Find the lowest common ancestor of both leaves by walking parent
//!    links, deeper side first.
//! 2. If a composite on the previous leaf's branch below that ancestor is
//!    unclosed, the highest such composite absorbs the run as trailing
//!    children.
//! 3. Otherwise the run becomes new children of the common ancestor, right
//!    before the next leaf's branch.
//!
//! Placements are queued against the original child lists and merged in a
//! single pass per parent once the stream is consumed.
//!
//! Trivia after the last leaf goes to the deepest unclosed composite on the
//! rightmost spine, or to the root.

use tracing::{error, trace};

use super::XmlSyntaxKind;
use super::lexer::{Token, XmlLexer};
use super::tree::{NodeId, XmlTree};
use crate::error::XmlCstError;
use crate::result::Result;

/// Splice the trivia of `original` into `tree`
///
/// `original` must be the unfiltered stream over the same range the tree
/// was parsed from, positioned at its first token.
pub(crate) fn reinsert_trivia(tree: &mut XmlTree, mut original: XmlLexer<'_>) -> Result<()> {
    let root = tree.root();
    let leaves = tree.leaves(root);

    let Some(&first) = leaves.first() else {
        for node in collect_run(tree, &mut original) {
            tree.append(root, node);
        }
        return expect_end(&original);
    };

    let mut splices = Splices::new(tree);
    for node in collect_run(tree, &mut original) {
        splices.push(root, 0, node);
    }
    expect_leaf(tree, &mut original, first)?;

    for pair in leaves.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let run = collect_run(tree, &mut original);
        if !run.is_empty() {
            splices.place_between(tree, prev, next, run);
        }
        expect_leaf(tree, &mut original, next)?;
    }
    splices.apply(tree);

    let run = collect_run(tree, &mut original);
    if !run.is_empty() {
        let holder = trailing_holder(tree);
        trace!(?holder, count = run.len(), "Placing trailing trivia");
        for node in run {
            tree.append(holder, node);
        }
    }
    expect_end(&original)
}

/// Build nodes for the trivia run at the stream cursor
///
/// Comment pieces are grouped into `Comment` composites; everything else
/// becomes a plain leaf.
fn collect_run(tree: &mut XmlTree, original: &mut XmlLexer<'_>) -> Vec<NodeId> {
    let mut run = Vec::new();
    while let Some(token) = original.token().filter(|token| token.kind.is_trivia()) {
        if token.kind == XmlSyntaxKind::CommentStart {
            run.push(collect_comment(tree, original));
        } else {
            run.push(tree.new_leaf(token.kind, token.range));
            original.advance();
        }
    }
    run
}

/// `<!--` plus its body and `-->`, as far as present
fn collect_comment(tree: &mut XmlTree, original: &mut XmlLexer<'_>) -> NodeId {
    let comment = tree.new_composite(XmlSyntaxKind::Comment);
    let mut first = true;
    while let Some(token) = original.token() {
        let continues = match token.kind {
            XmlSyntaxKind::CommentStart => first,
            XmlSyntaxKind::CommentCharacters | XmlSyntaxKind::CommentEnd => true,
            _ => false,
        };
        if !continues {
            break;
        }
        first = false;
        let leaf = tree.new_leaf(token.kind, token.range);
        tree.append(comment, leaf);
        original.advance();
        if token.kind == XmlSyntaxKind::CommentEnd {
            break;
        }
    }
    comment
}

/// Trivia placements relative to the child lists as the parser left them
struct Splices {
    depth: Vec<usize>,
    slot: Vec<usize>,
    pending: Vec<(NodeId, usize, NodeId)>,
}

impl Splices {
    fn new(tree: &XmlTree) -> Self {
        let count = tree.node_count();
        let mut depth = vec![0; count];
        let mut slot = vec![0; count];
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            for (index, &child) in tree.children(node).iter().enumerate() {
                depth[child.index()] = depth[node.index()] + 1;
                slot[child.index()] = index;
                stack.push(child);
            }
        }
        Self {
            depth,
            slot,
            pending: Vec::new(),
        }
    }

    /// Queue `node` right before the child currently at `index`
    fn push(&mut self, parent: NodeId, index: usize, node: NodeId) {
        self.pending.push((parent, index, node));
    }

    fn place_between(&mut self, tree: &XmlTree, prev: NodeId, next: NodeId, run: Vec<NodeId>) {
        let mut left = prev;
        let mut right = next;
        let mut next_branch = next;
        let mut holder = None;
        while left != right {
            let step = if self.depth[left.index()] >= self.depth[right.index()] {
                if tree.is_unclosed(left) {
                    holder = Some(left);
                }
                tree.parent(left).map(|parent| (parent, right))
            } else {
                next_branch = right;
                tree.parent(right).map(|parent| (left, parent))
            };
            let Some((up_left, up_right)) = step else {
                trace!(?prev, ?next, "Leaves share no branch point, trivia goes to the root");
                let root = tree.root();
                let end = tree.children(root).len();
                for node in run {
                    self.push(root, end, node);
                }
                return;
            };
            left = up_left;
            right = up_right;
        }

        // The highest unclosed composite on the rising slope wins
        let (parent, index) = match holder {
            Some(holder) => {
                trace!(?holder, "Unclosed element on the rising slope absorbs trivia");
                (holder, tree.children(holder).len())
            }
            None => (left, self.slot[next_branch.index()]),
        };
        for node in run {
            self.push(parent, index, node);
        }
    }

    /// Merge every queued placement into its parent's child list
    fn apply(mut self, tree: &mut XmlTree) {
        // Stable, so runs keep their stream order within one slot
        self.pending.sort_by_key(|&(parent, index, _)| (parent, index));
        for group in self.pending.chunk_by(|a, b| a.0 == b.0) {
            let inserts: Vec<(usize, NodeId)> =
                group.iter().map(|&(_, index, node)| (index, node)).collect();
            tree.merge_children(group[0].0, &inserts);
        }
    }
}

/// Deepest unclosed composite reached by following last children from the
/// root, or the root itself
fn trailing_holder(tree: &XmlTree) -> NodeId {
    let mut holder = tree.root();
    let mut current = tree.root();
    loop {
        if tree.is_unclosed(current) {
            holder = current;
        }
        match tree.children(current).last() {
            Some(&last) if tree.is_composite(last) => current = last,
            _ => return holder,
        }
    }
}

/// Consume the stream token that must correspond to `leaf`
fn expect_leaf(tree: &XmlTree, original: &mut XmlLexer<'_>, leaf: NodeId) -> Result<()> {
    let token = original.token();
    let expected = tree.leaf_range(leaf);
    match token {
        Some(token) if Some(token.range) == expected => {
            original.advance();
            Ok(())
        }
        _ => Err(contract_breach(tree, token, leaf)),
    }
}

fn expect_end(original: &XmlLexer<'_>) -> Result<()> {
    match original.token() {
        None => Ok(()),
        Some(token) => {
            error!(?token, "Structural token left over after the last leaf");
            Err(XmlCstError::invariant_violation(format!(
                "token {:?} at {:?} is neither trivia nor part of the tree",
                token.kind, token.range
            )))
        }
    }
}

fn contract_breach(tree: &XmlTree, token: Option<Token>, leaf: NodeId) -> XmlCstError {
    let expected = (tree.kind(leaf), tree.leaf_range(leaf));
    error!(?token, ?expected, "Token stream and tree leaves diverged");
    XmlCstError::invariant_violation(format!(
        "expected leaf {expected:?}, found token {token:?} in the unfiltered stream"
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rowan::{TextRange, TextSize};

    use super::*;
    use crate::cst::lexer::LexerState;
    use crate::cst::parse_document;
    use crate::error::ErrorKind;
    use XmlSyntaxKind::*;

    fn parse(source: &str) -> XmlTree {
        parse_document(source, 0..source.len()).unwrap()
    }

    fn child_kinds(tree: &XmlTree, node: NodeId) -> Vec<XmlSyntaxKind> {
        tree.children(node).iter().map(|&c| tree.kind(c)).collect()
    }

    #[test]
    fn test_whitespace_only_document() {
        let tree = parse("   ");
        assert_eq!(child_kinds(&tree, tree.root()), vec![WhiteSpace]);
        assert!(tree.errors().is_empty());
        assert_eq!(tree.text(), "   ");
    }

    #[test]
    fn test_leading_trivia_goes_first() {
        let tree = parse(" <!--c-->\n<a/>");
        assert_eq!(
            child_kinds(&tree, tree.root()),
            vec![WhiteSpace, Comment, WhiteSpace, Tag]
        );
    }

    #[test]
    fn test_comment_inside_element() {
        let tree = parse("<a><!-- x --></a>");
        let a = tree.find_child(tree.root(), Tag).unwrap();
        assert_eq!(
            child_kinds(&tree, a),
            vec![StartTagStart, TagName, TagEnd, Comment, EndTagStart, TagName, TagEnd]
        );
        let comment = tree.find_child(a, Comment).unwrap();
        assert_eq!(tree.node_text(comment), "<!-- x -->");
        assert_eq!(
            child_kinds(&tree, comment),
            vec![CommentStart, CommentCharacters, CommentEnd]
        );
    }

    #[test]
    fn test_adjacent_comments_stay_separate() {
        let tree = parse("<a><!--1--><!--2--></a>");
        let a = tree.find_child(tree.root(), Tag).unwrap();
        let comments = tree
            .children(a)
            .iter()
            .filter(|&&c| tree.kind(c) == Comment)
            .count();
        assert_eq!(comments, 2);
    }

    #[test]
    fn test_whitespace_between_siblings() {
        let tree = parse("<a> <b/> </a>");
        let a = tree.find_child(tree.root(), Tag).unwrap();
        assert_eq!(
            child_kinds(&tree, a),
            vec![
                StartTagStart,
                TagName,
                TagEnd,
                WhiteSpace,
                Tag,
                WhiteSpace,
                EndTagStart,
                TagName,
                TagEnd
            ]
        );
    }

    #[test]
    fn test_whitespace_inside_start_tag() {
        let tree = parse("<a  x='1' />");
        let a = tree.find_child(tree.root(), Tag).unwrap();
        assert_eq!(
            child_kinds(&tree, a),
            vec![StartTagStart, TagName, WhiteSpace, Attribute, WhiteSpace, EmptyElementEnd]
        );
    }

    #[test]
    fn test_unclosed_element_absorbs_following_trivia() {
        let tree = parse("<a><b> </a>");
        let a = tree.find_child(tree.root(), Tag).unwrap();
        let b = tree.find_child(a, Tag).unwrap();
        assert_eq!(
            child_kinds(&tree, b),
            vec![StartTagStart, TagName, TagEnd, Error, WhiteSpace]
        );
        assert_eq!(tree.text(), "<a><b> </a>");
    }

    #[test]
    fn test_trailing_trivia_goes_to_deepest_unclosed() {
        let tree = parse("<a><b> \n");
        let a = tree.find_child(tree.root(), Tag).unwrap();
        let b = tree.find_child(a, Tag).unwrap();
        assert_eq!(tree.children(b).last().map(|&c| tree.kind(c)), Some(WhiteSpace));
        assert_eq!(tree.text(), "<a><b> \n");
    }

    #[test]
    fn test_trailing_trivia_without_unclosed_goes_to_root() {
        let tree = parse("<a/>\n<!-- end -->");
        assert_eq!(
            child_kinds(&tree, tree.root()),
            vec![Tag, WhiteSpace, Comment]
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let tree = parse("<a><!-- never closed");
        let a = tree.find_child(tree.root(), Tag).unwrap();
        let comment = tree.find_child(a, Comment).unwrap();
        assert_eq!(
            child_kinds(&tree, comment),
            vec![CommentStart, CommentCharacters]
        );
    }

    #[test]
    fn test_bad_characters_are_kept() {
        let source = "<a \u{1F600}/>";
        let tree = parse(source);
        assert_eq!(tree.text(), source);
        let a = tree.find_child(tree.root(), Tag).unwrap();
        assert!(child_kinds(&tree, a).contains(&BadCharacter));
    }

    #[test]
    fn test_many_spaced_siblings_scale_linearly() {
        let count = 100_000;
        let source = format!("<r>{}</r>", "<b/> ".repeat(count));

        let start = std::time::Instant::now();
        let tree = parse(&source);
        let duration = start.elapsed();

        assert!(duration.as_secs() < 5, "Reinsertion took too long: {duration:?}");
        let r = tree.find_child(tree.root(), Tag).unwrap();
        let kinds = child_kinds(&tree, r);
        assert_eq!(kinds.len(), 3 + 2 * count + 3);
        assert_eq!(kinds[3..7], [Tag, WhiteSpace, Tag, WhiteSpace]);
        assert_eq!(tree.text(), source);
    }

    #[test]
    fn test_deep_indented_nesting_scales_linearly() {
        let depth = 20_000;
        let source = format!("{}{}", "<a> ".repeat(depth), "</a>\n".repeat(depth));

        let start = std::time::Instant::now();
        let tree = parse(&source);
        let duration = start.elapsed();

        assert!(duration.as_secs() < 5, "Reinsertion took too long: {duration:?}");
        assert!(tree.errors().is_empty());
        let outer = tree.find_child(tree.root(), Tag).unwrap();
        assert_eq!(
            child_kinds(&tree, outer)[..5],
            [StartTagStart, TagName, TagEnd, WhiteSpace, Tag]
        );
        assert_eq!(tree.text(), source);
    }

    #[test]
    fn test_runs_in_different_slots_of_one_parent() {
        let tree = parse("<a> <b/> <!--c--> <d/>\n</a>");
        let a = tree.find_child(tree.root(), Tag).unwrap();
        assert_eq!(
            child_kinds(&tree, a),
            vec![
                StartTagStart,
                TagName,
                TagEnd,
                WhiteSpace,
                Tag,
                WhiteSpace,
                Comment,
                WhiteSpace,
                Tag,
                WhiteSpace,
                EndTagStart,
                TagName,
                TagEnd
            ]
        );
    }

    #[test]
    fn test_missing_structural_token_is_an_invariant_violation() {
        let source = "<a/>";
        let mut tree = XmlTree::new(
            Arc::from(source),
            TextRange::up_to(TextSize::of(source)),
            Document,
        );
        let root = tree.root();
        // Leave out the TagName leaf
        let open = tree.new_leaf(StartTagStart, TextRange::new(TextSize::new(0), TextSize::new(1)));
        let close = tree.new_leaf(EmptyElementEnd, TextRange::new(TextSize::new(2), TextSize::new(4)));
        tree.append(root, open);
        tree.append(root, close);

        let mut original = XmlLexer::new(source);
        original.start(0..source.len(), LexerState::Content);
        let err = reinsert_trivia(&mut tree, original).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }
}
