//! Structural parser for XML documents and fragments
//!
//! Parses the filtered (trivia-free) token stream into an [`XmlTree`]. The
//! grammar never fails: a missing or misplaced token becomes an error marker
//! and parsing continues with the next sibling. Element nesting is tracked
//! on an explicit work stack, so deeply nested input cannot overflow the
//! call stack.
//!
//! After the structural pass, [`reinsert_trivia`] splices whitespace,
//! comments and bad characters back in, making the tree lossless.
//!
//! # Example
//!
//! ```rust,ignore
//! use xmlcst_core::cst::parse_document;
//!
//! let source = "<a><b/></a>";
//! let tree = parse_document(source, 0..source.len())?;
//! assert_eq!(tree.text(), source);
//! assert!(tree.errors().is_empty());
//! ```

use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

use rowan::{TextRange, TextSize};
use tracing::{debug, trace, warn};

use super::filter::TriviaFilter;
use super::lexer::{LexerState, Token};
use super::reinsert::reinsert_trivia;
use super::round_trip;
use super::tree::{NodeId, XmlTree};
use super::{ErrorCode, XmlSyntaxKind};
use crate::config::ParserConfig;
use crate::error::XmlCstError;
use crate::result::Result;

/// Parse a whole document: prolog, DOCTYPE and root element
pub fn parse_document(source: &str, range: Range<usize>) -> Result<XmlTree> {
    parse_document_with(source, range, &ParserConfig::default())
}

pub fn parse_document_with(
    source: &str,
    range: Range<usize>,
    config: &ParserConfig,
) -> Result<XmlTree> {
    let text_range = checked_range(source, &range)?;
    debug!(start = range.start, end = range.end, "Parsing XML document");

    let mut parser = Parser::new(source, text_range, XmlSyntaxKind::Document, config);
    parser.filter.start(range, LexerState::Content);
    let root = parser.tree.root();
    parser.parse_prolog(root);
    parser.parse_generic_content(root);
    parser.finish()
}

/// Parse a standalone DTD subset (markup declarations only)
pub fn parse_dtd_fragment(source: &str, range: Range<usize>) -> Result<XmlTree> {
    parse_dtd_fragment_with(source, range, &ParserConfig::default())
}

pub fn parse_dtd_fragment_with(
    source: &str,
    range: Range<usize>,
    config: &ParserConfig,
) -> Result<XmlTree> {
    let text_range = checked_range(source, &range)?;
    debug!(start = range.start, end = range.end, "Parsing DTD fragment");

    let mut parser = Parser::new(source, text_range, XmlSyntaxKind::Fragment, config);
    parser.filter.start(range, LexerState::Dtd);
    let root = parser.tree.root();
    parser.parse_markup_items(root);
    // Leftovers stay in the tree as plain tokens
    while parser.bump(root).is_some() {
        parser.parse_markup_items(root);
    }
    parser.finish()
}

/// Re-parse a single element whose ancestors are named by `ancestors`
///
/// The ancestor names seed the open-name set, so a closing tag that belongs
/// to an element outside the range still leaves the re-parsed element
/// unclosed instead of being consumed by it.
pub fn parse_tag_fragment<I>(source: &str, range: Range<usize>, ancestors: I) -> Result<XmlTree>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    parse_tag_fragment_with(source, range, ancestors, &ParserConfig::default())
}

pub fn parse_tag_fragment_with<I>(
    source: &str,
    range: Range<usize>,
    ancestors: I,
    config: &ParserConfig,
) -> Result<XmlTree>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let text_range = checked_range(source, &range)?;

    let mut parser = Parser::new(source, text_range, XmlSyntaxKind::Fragment, config);
    parser.open_names = ancestors
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .collect();
    debug!(
        start = range.start,
        end = range.end,
        ancestors = parser.open_names.len(),
        "Parsing tag fragment"
    );
    parser.filter.start(range, LexerState::Content);
    let root = parser.tree.root();
    parser.parse_tag(root);
    while parser.bump(root).is_some() {}
    parser.finish()
}

/// Validate a caller supplied range and convert it to a [`TextRange`]
pub(crate) fn checked_range(source: &str, range: &Range<usize>) -> Result<TextRange> {
    let valid = range.start <= range.end
        && range.end <= source.len()
        && range.end <= u32::MAX as usize
        && source.is_char_boundary(range.start)
        && source.is_char_boundary(range.end);
    if !valid {
        return Err(XmlCstError::invalid_range(
            range.start,
            range.end,
            source.len(),
        ));
    }
    Ok(TextRange::new(
        TextSize::new(range.start as u32),
        TextSize::new(range.end as u32),
    ))
}

/// An element whose children are being parsed
#[derive(Debug)]
struct OpenTag {
    node: NodeId,
    /// Where the element itself is attached; recovery hoists children here
    parent: NodeId,
    name: String,
    /// The `>` ending the start tag
    tag_end: NodeId,
    /// Whether this element added its name to the open-name set
    pushed: bool,
    /// Text node collecting the current run of character data
    text: Option<NodeId>,
}

/// Token stream parser
pub(super) struct Parser<'a> {
    pub(super) filter: TriviaFilter<'a>,
    pub(super) tree: XmlTree,
    pub(super) config: &'a ParserConfig,
    /// Names of the elements open along the current ancestor chain
    open_names: HashSet<String>,
    /// End offset of the last token attached to the tree
    pub(super) last_token_end: Option<usize>,
}

impl<'a> Parser<'a> {
    fn new(
        source: &'a str,
        range: TextRange,
        root_kind: XmlSyntaxKind,
        config: &'a ParserConfig,
    ) -> Self {
        Self {
            filter: TriviaFilter::new(source),
            tree: XmlTree::new(Arc::from(source), range, root_kind),
            config,
            open_names: HashSet::new(),
            last_token_end: None,
        }
    }

    /// Splice trivia back in and hand out the finished tree
    fn finish(self) -> Result<XmlTree> {
        let Parser {
            filter,
            mut tree,
            config,
            ..
        } = self;
        reinsert_trivia(&mut tree, filter.original())?;
        if config.verify_lossless {
            round_trip::verify(&tree)?;
        }
        Ok(tree)
    }

    // Prolog

    /// `prolog := PI* decl? PI* doctype? PI*`; omitted from the tree when empty
    fn parse_prolog(&mut self, root: NodeId) {
        let prolog = self.tree.new_composite(XmlSyntaxKind::Prolog);
        while self.parse_processing_instruction(prolog) {}
        if self.at(XmlSyntaxKind::DeclStart) {
            self.parse_xml_decl(prolog);
        }
        while self.parse_processing_instruction(prolog) {}
        if self.at(XmlSyntaxKind::DoctypeStart) {
            self.parse_doctype(prolog);
        }
        while self.parse_processing_instruction(prolog) {}

        if !self.tree.children(prolog).is_empty() {
            self.tree.append(root, prolog);
        }
    }

    fn parse_xml_decl(&mut self, parent: NodeId) {
        let decl = self.start_node(parent, XmlSyntaxKind::Decl);
        self.bump(decl);
        self.parse_attribute_list(decl);
        if !self.bump_if(decl, XmlSyntaxKind::DeclEnd) {
            self.error(decl, ErrorCode::PrologEndExpected);
        }
    }

    fn parse_doctype(&mut self, parent: NodeId) {
        let doctype = self.start_node(parent, XmlSyntaxKind::Doctype);
        self.bump(doctype);

        if !self.bump_if(doctype, XmlSyntaxKind::Name) {
            self.error(doctype, ErrorCode::DoctypeNameExpected);
        }

        if self.bump_if(doctype, XmlSyntaxKind::DoctypeSystem) {
            self.bump_if(doctype, XmlSyntaxKind::AttributeValueToken);
        } else if self.bump_if(doctype, XmlSyntaxKind::DoctypePublic) {
            self.bump_if(doctype, XmlSyntaxKind::AttributeValueToken);
            self.bump_if(doctype, XmlSyntaxKind::AttributeValueToken);
        }

        if self.at(XmlSyntaxKind::MarkupStart) {
            let markup = self.start_node(doctype, XmlSyntaxKind::MarkupDecl);
            if !self.parse_markup_content(markup) {
                self.error(markup, ErrorCode::MarkupEndExpected);
            }
        }

        if !self.bump_if(doctype, XmlSyntaxKind::DoctypeEnd) {
            self.error(doctype, ErrorCode::DoctypeEndExpected);
        }
    }

    // Content

    /// Top-level loop shared by documents: anything that is not a known
    /// construct is attached as a plain token, one error marker per run
    fn parse_generic_content(&mut self, parent: NodeId) {
        let mut in_stray_run = false;
        while let Some(kind) = self.filter.token_kind() {
            let handled = match kind {
                XmlSyntaxKind::ElementDeclStart => {
                    self.parse_element_decl(parent);
                    true
                }
                XmlSyntaxKind::AttlistDeclStart => {
                    self.parse_attlist_decl(parent);
                    true
                }
                XmlSyntaxKind::EntityDeclStart => {
                    self.parse_entity_decl(parent);
                    true
                }
                XmlSyntaxKind::NotationDeclStart => {
                    self.parse_notation_decl(parent);
                    true
                }
                XmlSyntaxKind::EntityRefToken => {
                    self.parse_entity_ref(parent);
                    true
                }
                XmlSyntaxKind::PiStart => self.parse_processing_instruction(parent),
                XmlSyntaxKind::StartTagStart => self.parse_tag(parent),
                XmlSyntaxKind::ConditionalSectionStart => {
                    self.parse_conditional_section(parent);
                    true
                }
                _ => false,
            };
            if handled {
                in_stray_run = false;
                continue;
            }
            if !in_stray_run {
                self.error(parent, ErrorCode::UnexpectedToken);
                in_stray_run = true;
            }
            self.bump(parent);
        }
    }

    /// `tag := '<' NAME attribute* ('>' content* endTag | '/>')`
    ///
    /// Returns `false` without consuming anything when not at a start tag.
    pub(super) fn parse_tag(&mut self, parent: NodeId) -> bool {
        if !self.at(XmlSyntaxKind::StartTagStart) {
            return false;
        }
        let Some(first) = self.open_start_tag(parent) else {
            return true;
        };

        let mut stack = vec![first];
        while let Some(top) = stack.last_mut() {
            let host = top.node;
            match self.filter.token_kind() {
                Some(XmlSyntaxKind::DataCharacters) => {
                    let text = match top.text {
                        Some(text) => text,
                        None => {
                            let text = self.start_node(host, XmlSyntaxKind::Text);
                            top.text = Some(text);
                            text
                        }
                    };
                    self.bump(text);
                }
                Some(XmlSyntaxKind::StartTagStart) => {
                    top.text = None;
                    if let Some(child) = self.open_start_tag(host) {
                        stack.push(child);
                    }
                }
                Some(XmlSyntaxKind::PiStart) => {
                    top.text = None;
                    self.parse_processing_instruction(host);
                }
                Some(XmlSyntaxKind::CdataStart) => {
                    top.text = None;
                    self.parse_cdata(host);
                }
                Some(XmlSyntaxKind::CharEntityRef) => {
                    top.text = None;
                    self.bump(host);
                }
                Some(XmlSyntaxKind::EntityRefToken) => {
                    top.text = None;
                    self.parse_entity_ref(host);
                }
                _ => {
                    if let Some(open) = stack.pop() {
                        self.close_tag(open);
                    }
                }
            }
        }
        true
    }

    /// Parse a start tag; returns the element if its children follow
    fn open_start_tag(&mut self, parent: NodeId) -> Option<OpenTag> {
        if !self.at(XmlSyntaxKind::StartTagStart) {
            return None;
        }
        let tag = self.start_node(parent, XmlSyntaxKind::Tag);
        self.bump(tag);

        let Some(name) = self
            .at(XmlSyntaxKind::TagName)
            .then(|| self.filter.token_text())
            .flatten()
        else {
            self.error(tag, ErrorCode::TagNameExpected);
            self.tree.set_unclosed(tag);
            return None;
        };
        self.bump(tag);

        self.parse_attribute_list(tag);
        let mut in_debris = false;
        loop {
            match self.filter.token_kind() {
                Some(XmlSyntaxKind::Name) => {
                    in_debris = false;
                    self.bump(tag);
                }
                Some(kind) if is_attribute_debris(kind) => {
                    if !in_debris {
                        self.error(tag, ErrorCode::UnexpectedToken);
                        in_debris = true;
                    }
                    self.bump(tag);
                }
                _ => break,
            }
            self.parse_attribute_list(tag);
        }

        match self.filter.token_kind() {
            Some(XmlSyntaxKind::TagEnd) => {
                let tag_end = self.bump(tag)?;
                let pushed = self.open_names.insert(name.to_string());
                trace!(name, pushed, "Opened element");
                Some(OpenTag {
                    node: tag,
                    parent,
                    name: name.to_string(),
                    tag_end,
                    pushed,
                    text: None,
                })
            }
            Some(XmlSyntaxKind::EmptyElementEnd) => {
                self.bump(tag);
                None
            }
            _ => {
                self.error(tag, ErrorCode::ElementNotClosed);
                self.tree.set_unclosed(tag);
                None
            }
        }
    }

    /// Finish an element once its content loop has stopped
    fn close_tag(&mut self, open: OpenTag) {
        let OpenTag {
            node: tag,
            parent,
            name,
            tag_end,
            pushed,
            ..
        } = open;
        if pushed {
            self.open_names.remove(&name);
        }

        let position = self.filter.position();
        let Some(end_tag_start) = self
            .filter
            .token()
            .filter(|token| token.kind == XmlSyntaxKind::EndTagStart)
        else {
            self.mark_unclosed(tag, tag_end);
            return;
        };
        self.filter.advance();

        let Some(closing) = self
            .at(XmlSyntaxKind::TagName)
            .then(|| self.filter.token_text())
            .flatten()
        else {
            self.attach(tag, end_tag_start);
            self.error(tag, ErrorCode::TagNameExpected);
            self.bump_if(tag, XmlSyntaxKind::TagEnd);
            return;
        };

        if closing != name && self.open_names.contains(closing) {
            // The closing tag belongs to an ancestor: rewind so that frame
            // consumes it, and move our trailing children up with it
            warn!(
                element = %name,
                closing = %closing,
                "Closing tag belongs to an ancestor, element left unclosed"
            );
            self.filter.restore(position);
            let split_at = self.tree.child_index(tag_end).map_or(0, |index| index + 1);
            for child in self.tree.split_off_children(tag, split_at) {
                self.tree.append(parent, child);
            }
            self.mark_unclosed(tag, tag_end);
            return;
        }

        self.attach(tag, end_tag_start);
        self.bump(tag);
        if closing != name {
            trace!(element = %name, closing = %closing, "Closing tag matches no open element");
            self.error(tag, ErrorCode::MismatchedClosingTag);
        }
        if !self.bump_if(tag, XmlSyntaxKind::TagEnd) {
            self.error(tag, ErrorCode::ClosingTagEndExpected);
        }
    }

    /// Flag `tag` as unclosed, with the error marker right after its `>`
    fn mark_unclosed(&mut self, tag: NodeId, tag_end: NodeId) {
        let index = self.tree.child_index(tag_end).map_or(0, |index| index + 1);
        let error = self.tree.new_error(ErrorCode::ElementNotClosed);
        self.tree.insert(tag, index, error);
        self.tree.set_unclosed(tag);
    }

    /// Attributes of a start tag or XML declaration
    fn parse_attribute_list(&mut self, owner: NodeId) {
        let mut last_value_end = None;
        while let Some(token) = self.filter.token() {
            if token.kind != XmlSyntaxKind::Name {
                return;
            }
            if self.config.check_attribute_whitespace && last_value_end == Some(token.start()) {
                self.error(owner, ErrorCode::WhitespaceExpected);
            }
            last_value_end = None;

            let attribute = self.start_node(owner, XmlSyntaxKind::Attribute);
            self.bump(attribute);
            if !self.bump_if(attribute, XmlSyntaxKind::Eq) {
                self.error(attribute, ErrorCode::AttributeEqExpected);
                continue;
            }
            if !self.at(XmlSyntaxKind::AttributeValueStartDelimiter) {
                self.error(attribute, ErrorCode::AttributeValueExpected);
                return;
            }
            last_value_end = self.parse_attribute_value(attribute);
        }
    }

    /// Quoted value; returns the end offset of the closing quote if present
    pub(super) fn parse_attribute_value(&mut self, parent: NodeId) -> Option<usize> {
        let value = self.start_node(parent, XmlSyntaxKind::AttributeValue);
        self.bump(value);
        loop {
            match self.filter.token_kind() {
                Some(XmlSyntaxKind::AttributeValueToken | XmlSyntaxKind::CharEntityRef) => {
                    self.bump(value);
                }
                Some(XmlSyntaxKind::EntityRefToken) => self.parse_entity_ref(value),
                _ => break,
            }
        }
        match self.filter.token() {
            Some(token) if token.kind == XmlSyntaxKind::AttributeValueEndDelimiter => {
                self.bump(value);
                Some(token.end())
            }
            _ => {
                self.error(value, ErrorCode::AttributeValueEndExpected);
                None
            }
        }
    }

    pub(super) fn parse_processing_instruction(&mut self, parent: NodeId) -> bool {
        if !self.at(XmlSyntaxKind::PiStart) {
            return false;
        }
        let pi = self.start_node(parent, XmlSyntaxKind::ProcessingInstruction);
        self.bump(pi);
        if !self.bump_if(pi, XmlSyntaxKind::PiTarget) {
            self.error(pi, ErrorCode::PiTargetExpected);
        }
        while self.bump_if(pi, XmlSyntaxKind::PiCharacters) {}
        if !self.bump_if(pi, XmlSyntaxKind::PiEnd) {
            self.error(pi, ErrorCode::PiEndExpected);
        }
        true
    }

    fn parse_cdata(&mut self, parent: NodeId) {
        let cdata = self.start_node(parent, XmlSyntaxKind::Cdata);
        self.bump(cdata);
        self.bump_if(cdata, XmlSyntaxKind::CdataCharacters);
        if !self.bump_if(cdata, XmlSyntaxKind::CdataEnd) {
            self.error(cdata, ErrorCode::CdataEndExpected);
        }
    }

    pub(super) fn parse_entity_ref(&mut self, parent: NodeId) {
        let reference = self.start_node(parent, XmlSyntaxKind::EntityRef);
        self.bump(reference);
    }

    // Token plumbing

    pub(super) fn at(&self, kind: XmlSyntaxKind) -> bool {
        self.filter.at(kind)
    }

    /// Create a composite and attach it as the last child of `parent`
    pub(super) fn start_node(&mut self, parent: NodeId, kind: XmlSyntaxKind) -> NodeId {
        let node = self.tree.new_composite(kind);
        self.tree.append(parent, node);
        node
    }

    /// Attach the current token to `parent` and advance
    pub(super) fn bump(&mut self, parent: NodeId) -> Option<NodeId> {
        let token = self.filter.token()?;
        let leaf = self.attach(parent, token);
        self.filter.advance();
        Some(leaf)
    }

    pub(super) fn bump_if(&mut self, parent: NodeId, kind: XmlSyntaxKind) -> bool {
        self.at(kind) && self.bump(parent).is_some()
    }

    /// Attach an already consumed token
    fn attach(&mut self, parent: NodeId, token: Token) -> NodeId {
        let leaf = self.tree.new_leaf(token.kind, token.range);
        self.tree.append(parent, leaf);
        self.last_token_end = Some(token.end());
        leaf
    }

    pub(super) fn error(&mut self, parent: NodeId, code: ErrorCode) -> NodeId {
        trace!(?code, offset = ?self.filter.token().map(|t| t.start()), "Error marker");
        let error = self.tree.new_error(code);
        self.tree.append(parent, error);
        error
    }
}

/// Tokens that can only show up in a start tag as leftovers of a broken attribute
fn is_attribute_debris(kind: XmlSyntaxKind) -> bool {
    matches!(
        kind,
        XmlSyntaxKind::Eq
            | XmlSyntaxKind::AttributeValueStartDelimiter
            | XmlSyntaxKind::AttributeValueToken
            | XmlSyntaxKind::AttributeValueEndDelimiter
            | XmlSyntaxKind::CharEntityRef
            | XmlSyntaxKind::EntityRefToken
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use XmlSyntaxKind::*;

    fn parse(source: &str) -> XmlTree {
        parse_document(source, 0..source.len()).unwrap()
    }

    fn child_kinds(tree: &XmlTree, node: NodeId) -> Vec<XmlSyntaxKind> {
        tree.children(node).iter().map(|&c| tree.kind(c)).collect()
    }

    fn first_tag(tree: &XmlTree) -> NodeId {
        tree.find_child(tree.root(), Tag).unwrap()
    }

    #[test]
    fn test_well_formed_nesting() {
        let tree = parse("<a><b/></a>");
        assert!(tree.errors().is_empty());
        let a = first_tag(&tree);
        assert_eq!(
            child_kinds(&tree, a),
            vec![StartTagStart, TagName, TagEnd, Tag, EndTagStart, TagName, TagEnd]
        );
        let b = tree.find_child(a, Tag).unwrap();
        assert_eq!(
            child_kinds(&tree, b),
            vec![StartTagStart, TagName, EmptyElementEnd]
        );
        assert!(!tree.is_unclosed(a));
    }

    #[test]
    fn test_ancestor_mismatch_leaves_child_unclosed() {
        let tree = parse("<a><b></a>");
        let a = first_tag(&tree);
        assert_eq!(
            child_kinds(&tree, a),
            vec![StartTagStart, TagName, TagEnd, Tag, EndTagStart, TagName, TagEnd]
        );
        let b = tree.find_child(a, Tag).unwrap();
        assert_eq!(
            child_kinds(&tree, b),
            vec![StartTagStart, TagName, TagEnd, Error]
        );
        assert!(tree.is_unclosed(b));
        assert!(!tree.is_unclosed(a));
        assert_eq!(
            tree.errors().iter().map(|e| e.code).collect::<Vec<_>>(),
            vec![ErrorCode::ElementNotClosed]
        );
    }

    #[test]
    fn test_recovery_hoists_trailing_children() {
        let tree = parse("<a><b>text<c/></a>");
        let a = first_tag(&tree);
        assert_eq!(
            child_kinds(&tree, a),
            vec![StartTagStart, TagName, TagEnd, Tag, Text, Tag, EndTagStart, TagName, TagEnd]
        );
        assert_eq!(tree.text(), "<a><b>text<c/></a>");
    }

    #[test]
    fn test_unknown_closing_name_is_consumed() {
        let tree = parse("<a></b>");
        let a = first_tag(&tree);
        assert_eq!(
            child_kinds(&tree, a),
            vec![StartTagStart, TagName, TagEnd, EndTagStart, TagName, Error, TagEnd]
        );
        assert_eq!(tree.errors()[0].code, ErrorCode::MismatchedClosingTag);
    }

    #[test]
    fn test_missing_end_tag() {
        let tree = parse("<a>hello");
        let a = first_tag(&tree);
        assert!(tree.is_unclosed(a));
        assert_eq!(
            child_kinds(&tree, a),
            vec![StartTagStart, TagName, TagEnd, Error, Text]
        );
    }

    #[test]
    fn test_same_name_nesting_closes_innermost_first() {
        let tree = parse("<a><a></a>");
        let outer = first_tag(&tree);
        let inner = tree.find_child(outer, Tag).unwrap();
        assert!(!tree.is_unclosed(inner));
        assert!(tree.is_unclosed(outer));
    }

    #[test]
    fn test_attributes() {
        let tree = parse("<a x=\"1\" y='&amp;'/>");
        assert!(tree.errors().is_empty());
        let a = first_tag(&tree);
        let attributes: Vec<_> = tree
            .children(a)
            .iter()
            .copied()
            .filter(|&c| tree.kind(c) == Attribute)
            .collect();
        assert_eq!(attributes.len(), 2);
        let value = tree.find_child(attributes[1], AttributeValue).unwrap();
        assert_eq!(
            child_kinds(&tree, value),
            vec![AttributeValueStartDelimiter, EntityRef, AttributeValueEndDelimiter]
        );
    }

    #[test]
    fn test_attribute_errors() {
        let codes = |source: &str| -> Vec<ErrorCode> {
            parse(source).errors().into_iter().map(|e| e.code).collect()
        };
        assert_eq!(codes("<a x/>"), vec![ErrorCode::AttributeEqExpected]);
        assert_eq!(codes("<a x=/>"), vec![ErrorCode::AttributeValueExpected]);
        assert_eq!(codes("<a x='1'y='2'/>"), vec![ErrorCode::WhitespaceExpected]);
    }

    #[test]
    fn test_attribute_whitespace_check_is_configurable() {
        let source = "<a x='1'y='2'/>";
        let config = ParserConfig {
            check_attribute_whitespace: false,
            ..ParserConfig::default()
        };
        let tree = parse_document_with(source, 0..source.len(), &config).unwrap();
        assert!(tree.errors().is_empty());
    }

    #[test]
    fn test_prolog() {
        let tree = parse("<?xml version=\"1.0\"?><?pi x?><!DOCTYPE r><r/>");
        assert!(tree.errors().is_empty());
        let prolog = tree.find_child(tree.root(), Prolog).unwrap();
        assert_eq!(
            child_kinds(&tree, prolog),
            vec![Decl, ProcessingInstruction, Doctype]
        );
    }

    #[test]
    fn test_unterminated_doctype() {
        let tree = parse("<!DOCTYPE foo SYSTEM \"bar\"");
        let prolog = tree.find_child(tree.root(), Prolog).unwrap();
        let doctype = tree.find_child(prolog, Doctype).unwrap();
        assert!(tree.find_child(doctype, DoctypeEnd).is_none());
        assert_eq!(tree.text(), "<!DOCTYPE foo SYSTEM \"bar\"");
    }

    #[test]
    fn test_cdata_and_references_in_content() {
        let tree = parse("<a>x<![CDATA[<y>]]>&lt;&#65;</a>");
        assert!(tree.errors().is_empty());
        let a = first_tag(&tree);
        assert_eq!(
            child_kinds(&tree, a),
            vec![
                StartTagStart,
                TagName,
                TagEnd,
                Text,
                Cdata,
                EntityRef,
                CharEntityRef,
                EndTagStart,
                TagName,
                TagEnd
            ]
        );
    }

    #[test]
    fn test_stray_tokens_at_top_level() {
        let tree = parse("<a/></a>");
        assert_eq!(
            tree.errors().iter().map(|e| e.code).collect::<Vec<_>>(),
            vec![ErrorCode::UnexpectedToken]
        );
        assert_eq!(tree.text(), "<a/></a>");
    }

    #[test]
    fn test_tag_fragment_with_ancestors() {
        let source = "<b>x</a>";
        let tree = parse_tag_fragment(source, 0..source.len(), ["a"]).unwrap();
        assert_eq!(tree.kind(tree.root()), Fragment);
        let b = tree.find_child(tree.root(), Tag).unwrap();
        assert!(tree.is_unclosed(b));
        assert_eq!(
            child_kinds(&tree, tree.root()),
            vec![Tag, Text, EndTagStart, TagName, TagEnd]
        );
        assert_eq!(tree.text(), source);
    }

    #[test]
    fn test_tag_fragment_without_ancestors_consumes_mismatch() {
        let source = "<b>x</a>";
        let tree = parse_tag_fragment(source, 0..source.len(), Vec::<String>::new()).unwrap();
        let b = tree.find_child(tree.root(), Tag).unwrap();
        assert!(!tree.is_unclosed(b));
        assert_eq!(tree.errors()[0].code, ErrorCode::MismatchedClosingTag);
    }

    #[test]
    fn test_invalid_ranges() {
        let source = "<é/>";
        assert!(parse_document(source, 3..1).is_err());
        assert!(parse_document(source, 0..99).is_err());
        assert!(parse_document(source, 0..2).is_err());
        assert!(parse_document(source, 0..0).is_ok());
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let depth = 50_000;
        let source = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let tree = parse(&source);
        assert!(tree.errors().is_empty());
        assert_eq!(tree.text(), source);
    }
}
