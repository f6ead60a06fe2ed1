//! DTD declarations: markup blocks, element content specs, attribute lists,
//! entity and notation declarations, conditional sections
//!
//! Every routine here follows the same convention as the rest of the
//! parser: inspect the current token kind, consume it or leave an error
//! marker, and return as soon as something unexpected shows up so the
//! enclosing construct can resume.

use tracing::trace;

use super::parser::Parser;
use super::tree::NodeId;
use super::{ErrorCode, XmlSyntaxKind};

impl Parser<'_> {
    /// `'[' markupItem* ']'`; returns whether the closing `]` was found
    pub(super) fn parse_markup_content(&mut self, markup: NodeId) -> bool {
        self.parse_markup_body(markup);
        self.bump_if(markup, XmlSyntaxKind::MarkupEnd)
    }

    /// Opening `[` and the declarations after it, up to a `]` or `]]>`
    fn parse_markup_body(&mut self, parent: NodeId) {
        self.bump_if(parent, XmlSyntaxKind::MarkupStart);
        let mut in_stray_run = false;
        loop {
            self.parse_markup_items(parent);
            match self.filter.token_kind() {
                None
                | Some(XmlSyntaxKind::MarkupEnd | XmlSyntaxKind::ConditionalSectionEnd) => return,
                Some(_) => {
                    if !in_stray_run {
                        self.error(parent, ErrorCode::UnexpectedToken);
                        in_stray_run = true;
                    }
                    self.bump(parent);
                    if self.at_markup_item() {
                        in_stray_run = false;
                    }
                }
            }
        }
    }

    /// Consecutive markup declarations; stops at the first token that
    /// starts none of them
    pub(super) fn parse_markup_items(&mut self, parent: NodeId) {
        loop {
            match self.filter.token_kind() {
                Some(XmlSyntaxKind::ElementDeclStart) => self.parse_element_decl(parent),
                Some(XmlSyntaxKind::AttlistDeclStart) => self.parse_attlist_decl(parent),
                Some(XmlSyntaxKind::EntityDeclStart) => self.parse_entity_decl(parent),
                Some(XmlSyntaxKind::NotationDeclStart) => self.parse_notation_decl(parent),
                Some(XmlSyntaxKind::EntityRefToken) => self.parse_entity_ref(parent),
                Some(XmlSyntaxKind::ConditionalSectionStart) => {
                    self.parse_conditional_section(parent)
                }
                Some(XmlSyntaxKind::PiStart) => {
                    self.parse_processing_instruction(parent);
                }
                _ => return,
            }
        }
    }

    fn at_markup_item(&self) -> bool {
        self.filter.token_kind().is_some_and(|kind| {
            kind.is_decl_start()
                || matches!(
                    kind,
                    XmlSyntaxKind::EntityRefToken
                        | XmlSyntaxKind::ConditionalSectionStart
                        | XmlSyntaxKind::PiStart
                )
        })
    }

    /// `'<![' (INCLUDE | IGNORE | entityRef) '[' markupItem* ']]>'`
    pub(super) fn parse_conditional_section(&mut self, parent: NodeId) {
        let section = self.start_node(parent, XmlSyntaxKind::ConditionalSection);
        self.bump(section);

        match self.filter.token_kind() {
            Some(XmlSyntaxKind::ConditionalInclude | XmlSyntaxKind::ConditionalIgnore) => {
                self.bump(section);
            }
            Some(XmlSyntaxKind::EntityRefToken) => self.parse_entity_ref(section),
            _ => {
                self.error(section, ErrorCode::ConditionalKeywordExpected);
                return;
            }
        }

        if !self.at(XmlSyntaxKind::MarkupStart) {
            self.error(section, ErrorCode::MarkupStartExpected);
            return;
        }
        self.parse_markup_body(section);

        if !self.bump_if(section, XmlSyntaxKind::ConditionalSectionEnd) {
            self.error(section, ErrorCode::ConditionalSectionEndExpected);
        }
    }

    // <!ELEMENT

    pub(super) fn parse_element_decl(&mut self, parent: NodeId) {
        let decl = self.start_node(parent, XmlSyntaxKind::ElementDecl);
        self.bump(decl);

        if !self.parse_composite_name(decl) {
            return;
        }
        self.parse_content_spec(decl);
        self.bump_if(decl, XmlSyntaxKind::TagEnd);
    }

    /// Name, parameter entity reference or a parenthesized group of names
    fn parse_composite_name(&mut self, decl: NodeId) -> bool {
        if self.parse_name(decl) {
            return true;
        }
        if self.at(XmlSyntaxKind::LeftParen) {
            self.parse_particles(decl, true);
            return true;
        }
        self.error(decl, ErrorCode::NameExpected);
        false
    }

    fn parse_name(&mut self, parent: NodeId) -> bool {
        match self.filter.token_kind() {
            Some(XmlSyntaxKind::Name) => {
                self.bump(parent);
                true
            }
            Some(XmlSyntaxKind::EntityRefToken) => {
                self.parse_entity_ref(parent);
                true
            }
            _ => false,
        }
    }

    fn parse_content_spec(&mut self, decl: NodeId) {
        let token = self.filter.token();
        if token.is_some_and(|token| self.last_token_end == Some(token.start())) {
            self.error(decl, ErrorCode::WhitespaceExpected);
        } else if !self.at_content_spec_start() {
            self.error(decl, ErrorCode::ContentSpecStartExpected);
        }

        let spec = self.start_node(decl, XmlSyntaxKind::ElementContentSpec);
        self.parse_particles(spec, false);
    }

    fn at_content_spec_start(&self) -> bool {
        match self.filter.token_kind() {
            Some(
                XmlSyntaxKind::LeftParen
                | XmlSyntaxKind::EntityRefToken
                | XmlSyntaxKind::ContentAny
                | XmlSyntaxKind::ContentEmpty,
            ) => true,
            // SGML tag omission markers
            Some(XmlSyntaxKind::Name) => {
                self.config.sgml_content_spec
                    && matches!(self.filter.token_text(), Some("-" | "O"))
            }
            _ => false,
        }
    }

    /// Content particles separated by `,` or `|`, groups flattened into
    /// `target`
    ///
    /// Nested groups are tracked on a stack of "ended with a delimiter"
    /// flags, one per open parenthesis. With `group_only`, parsing stops
    /// after the first top-level group closes.
    fn parse_particles(&mut self, target: NodeId, group_only: bool) {
        let mut levels = vec![false];
        loop {
            let kind = self.filter.token_kind();
            if is_particle_stop(kind) {
                let ended_with_delimiter = levels.last().copied().unwrap_or(false);
                if ended_with_delimiter && kind == Some(XmlSyntaxKind::RightParen) {
                    self.error(target, ErrorCode::NameOrEntityRefExpected);
                }
                if levels.len() == 1 {
                    return;
                }
                if !self.bump_if(target, XmlSyntaxKind::RightParen) {
                    trace!(depth = levels.len() - 1, "Content spec group left open");
                    self.error(target, ErrorCode::RightParenExpected);
                    return;
                }
                levels.pop();
                if group_only && levels.len() == 1 {
                    return;
                }
            } else {
                match kind {
                    Some(XmlSyntaxKind::LeftParen) => {
                        self.bump(target);
                        levels.push(false);
                        continue;
                    }
                    Some(XmlSyntaxKind::EntityRefToken) => self.parse_entity_ref(target),
                    Some(
                        XmlSyntaxKind::Name
                        | XmlSyntaxKind::ContentEmpty
                        | XmlSyntaxKind::ContentAny
                        | XmlSyntaxKind::Pcdata,
                    ) => {
                        self.bump(target);
                    }
                    _ => {
                        self.error(target, ErrorCode::NameOrEntityRefExpected);
                        return;
                    }
                }
            }

            // Occurrence indicator, then an optional separator
            if matches!(
                self.filter.token_kind(),
                Some(XmlSyntaxKind::Star | XmlSyntaxKind::Plus | XmlSyntaxKind::Question)
            ) {
                self.bump(target);
                self.bump_if(target, XmlSyntaxKind::Plus);
            }
            let delimited = matches!(
                self.filter.token_kind(),
                Some(XmlSyntaxKind::Bar | XmlSyntaxKind::Comma)
            ) && self.bump(target).is_some();
            if let Some(level) = levels.last_mut() {
                *level = delimited;
            }
        }
    }

    // <!ATTLIST

    pub(super) fn parse_attlist_decl(&mut self, parent: NodeId) {
        let decl = self.start_node(parent, XmlSyntaxKind::AttlistDecl);
        self.bump(decl);

        if !self.parse_composite_name(decl) {
            return;
        }

        loop {
            match self.filter.token_kind() {
                Some(XmlSyntaxKind::EntityRefToken) => self.parse_entity_ref(decl),
                Some(XmlSyntaxKind::Name) => self.parse_attribute_decl(decl),
                _ => break,
            }
        }
        self.bump_if(decl, XmlSyntaxKind::TagEnd);
    }

    /// `NAME type default?`
    fn parse_attribute_decl(&mut self, parent: NodeId) {
        let decl = self.start_node(parent, XmlSyntaxKind::AttributeDecl);
        self.bump(decl);

        if self.parse_name(decl) {
            // NOTATION (a|b)
            if self.at(XmlSyntaxKind::LeftParen) {
                self.parse_enumerated_type(decl);
            }
        } else if self.at(XmlSyntaxKind::LeftParen) {
            self.parse_enumerated_type(decl);
        } else {
            return;
        }

        match self.filter.token_kind() {
            Some(XmlSyntaxKind::AttImplied | XmlSyntaxKind::AttRequired) => {
                self.bump(decl);
            }
            Some(XmlSyntaxKind::AttFixed) => {
                self.bump(decl);
                if self.at(XmlSyntaxKind::AttributeValueStartDelimiter) {
                    self.parse_attribute_value(decl);
                }
            }
            Some(XmlSyntaxKind::AttributeValueStartDelimiter) => {
                self.parse_attribute_value(decl);
            }
            _ => {}
        }
    }

    /// `'(' NAME ('|' NAME)* ')'`
    fn parse_enumerated_type(&mut self, parent: NodeId) {
        let enumeration = self.start_node(parent, XmlSyntaxKind::EnumeratedType);
        self.bump(enumeration);
        loop {
            match self.filter.token_kind() {
                Some(XmlSyntaxKind::EntityRefToken) => self.parse_entity_ref(enumeration),
                Some(XmlSyntaxKind::Name | XmlSyntaxKind::Bar) => {
                    self.bump(enumeration);
                }
                _ => break,
            }
        }
        if !self.bump_if(enumeration, XmlSyntaxKind::RightParen) {
            self.error(enumeration, ErrorCode::RightParenExpected);
        }
    }

    // <!ENTITY and <!NOTATION

    pub(super) fn parse_entity_decl(&mut self, parent: NodeId) {
        let decl = self.start_node(parent, XmlSyntaxKind::EntityDecl);
        self.bump(decl);
        self.bump_if(decl, XmlSyntaxKind::Percent);

        if !self.parse_composite_name(decl) {
            return;
        }
        self.parse_external_id_or_value(decl);
        self.bump_if(decl, XmlSyntaxKind::TagEnd);
    }

    pub(super) fn parse_notation_decl(&mut self, parent: NodeId) {
        let decl = self.start_node(parent, XmlSyntaxKind::NotationDecl);
        self.bump(decl);

        if !self.parse_name(decl) {
            self.error(decl, ErrorCode::NameExpected);
            return;
        }
        self.parse_external_id_or_value(decl);
        self.bump_if(decl, XmlSyntaxKind::TagEnd);
    }

    /// Literal value or `SYSTEM`/`PUBLIC` external id, plus anything else
    /// up to the end of the declaration (`NDATA name` and the like)
    fn parse_external_id_or_value(&mut self, decl: NodeId) {
        if !matches!(
            self.filter.token_kind(),
            Some(
                XmlSyntaxKind::AttributeValueStartDelimiter
                    | XmlSyntaxKind::DoctypeSystem
                    | XmlSyntaxKind::DoctypePublic
            )
        ) {
            self.error(decl, ErrorCode::LiteralPublicSystemExpected);
            return;
        }

        while let Some(kind) = self.filter.token_kind() {
            match kind {
                XmlSyntaxKind::AttributeValueStartDelimiter => {
                    self.parse_attribute_value(decl);
                }
                XmlSyntaxKind::EntityRefToken => self.parse_entity_ref(decl),
                _ if is_declaration_boundary(kind) => break,
                _ => {
                    self.bump(decl);
                }
            }
        }
    }
}

/// Tokens that end a content particle sequence
fn is_particle_stop(kind: Option<XmlSyntaxKind>) -> bool {
    match kind {
        None => true,
        Some(kind) => is_declaration_boundary(kind) || kind == XmlSyntaxKind::RightParen,
    }
}

/// Tokens that can never be part of the declaration being parsed
fn is_declaration_boundary(kind: XmlSyntaxKind) -> bool {
    kind.is_decl_start()
        || matches!(
            kind,
            XmlSyntaxKind::TagEnd
                | XmlSyntaxKind::StartTagStart
                | XmlSyntaxKind::MarkupEnd
                | XmlSyntaxKind::ConditionalSectionStart
                | XmlSyntaxKind::ConditionalSectionEnd
                | XmlSyntaxKind::PiStart
        )
}

#[cfg(test)]
mod tests {
    use crate::cst::tree::{NodeId, XmlTree};
    use crate::cst::{parse_document, parse_dtd_fragment, ErrorCode, XmlSyntaxKind};
    use XmlSyntaxKind::*;

    fn dtd(source: &str) -> XmlTree {
        parse_dtd_fragment(source, 0..source.len()).unwrap()
    }

    fn codes(tree: &XmlTree) -> Vec<ErrorCode> {
        tree.errors().into_iter().map(|e| e.code).collect()
    }

    fn child_kinds(tree: &XmlTree, node: NodeId) -> Vec<XmlSyntaxKind> {
        tree.children(node).iter().map(|&c| tree.kind(c)).collect()
    }

    #[test]
    fn test_element_decl_with_groups() {
        let tree = dtd("<!ELEMENT a ((b|c)*, d?)+>");
        assert!(codes(&tree).is_empty());
        let decl = tree.find_child(tree.root(), ElementDecl).unwrap();
        assert_eq!(
            child_kinds(&tree, decl),
            vec![ElementDeclStart, WhiteSpace, Name, WhiteSpace, ElementContentSpec, TagEnd]
        );
        let spec = tree.find_child(decl, ElementContentSpec).unwrap();
        assert_eq!(tree.node_text(spec), "((b|c)*, d?)+");
    }

    #[test]
    fn test_element_decl_keywords_and_pcdata() {
        let tree = dtd("<!ELEMENT a EMPTY><!ELEMENT b ANY><!ELEMENT c (#PCDATA|d)*>");
        assert!(codes(&tree).is_empty());
        assert_eq!(
            child_kinds(&tree, tree.root()),
            vec![ElementDecl, ElementDecl, ElementDecl]
        );
    }

    #[test]
    fn test_content_spec_errors() {
        assert_eq!(
            codes(&dtd("<!ELEMENT a (b,)>")),
            vec![ErrorCode::NameOrEntityRefExpected]
        );
        assert_eq!(
            codes(&dtd("<!ELEMENT a (b")),
            vec![ErrorCode::RightParenExpected]
        );
        assert_eq!(
            codes(&dtd("<!ELEMENT a foo>")),
            vec![ErrorCode::ContentSpecStartExpected]
        );
        assert_eq!(codes(&dtd("<!ELEMENT >")), vec![ErrorCode::NameExpected]);
    }

    #[test]
    fn test_sgml_omission_markers() {
        let tree = dtd("<!ELEMENT a - O (b)>");
        assert!(codes(&tree).is_empty());

        let config = crate::config::ParserConfig {
            sgml_content_spec: false,
            ..Default::default()
        };
        let source = "<!ELEMENT a - O (b)>";
        let strict =
            crate::cst::parse_dtd_fragment_with(source, 0..source.len(), &config).unwrap();
        assert_eq!(codes(&strict), vec![ErrorCode::ContentSpecStartExpected]);
    }

    #[test]
    fn test_element_name_group() {
        let tree = dtd("<!ELEMENT (a|b) EMPTY>");
        assert!(codes(&tree).is_empty());
    }

    #[test]
    fn test_attlist_decl() {
        let tree = dtd(
            "<!ATTLIST a id ID #REQUIRED kind (x|y) \"x\" n NOTATION (g) #IMPLIED v CDATA #FIXED 'v'>",
        );
        assert!(codes(&tree).is_empty());
        let decl = tree.find_child(tree.root(), AttlistDecl).unwrap();
        let attributes = tree
            .children(decl)
            .iter()
            .filter(|&&c| tree.kind(c) == AttributeDecl)
            .count();
        assert_eq!(attributes, 4);
    }

    #[test]
    fn test_unclosed_enumeration() {
        let tree = dtd("<!ATTLIST a k (x|y #IMPLIED>");
        assert_eq!(codes(&tree), vec![ErrorCode::RightParenExpected]);
    }

    #[test]
    fn test_entity_decls() {
        let tree = dtd(concat!(
            "<!ENTITY e \"v &amp; x\">",
            "<!ENTITY % p SYSTEM \"p.dtd\">",
            "<!ENTITY img PUBLIC \"-//x\" \"i.gif\" NDATA gif>",
            "<!NOTATION gif SYSTEM \"viewer\">",
            "%p;"
        ));
        assert!(codes(&tree).is_empty());
        assert_eq!(
            child_kinds(&tree, tree.root()),
            vec![EntityDecl, EntityDecl, EntityDecl, NotationDecl, EntityRef]
        );
    }

    #[test]
    fn test_entity_decl_without_value() {
        let tree = dtd("<!ENTITY e>");
        assert_eq!(codes(&tree), vec![ErrorCode::LiteralPublicSystemExpected]);
    }

    #[test]
    fn test_conditional_sections() {
        let tree = dtd("<![INCLUDE[<!ELEMENT a EMPTY>]]><![ %draft; [<!ENTITY d 'x'>]]>");
        assert!(codes(&tree).is_empty());
        let section = tree.find_child(tree.root(), ConditionalSection).unwrap();
        assert_eq!(
            child_kinds(&tree, section),
            vec![
                ConditionalSectionStart,
                ConditionalInclude,
                MarkupStart,
                ElementDecl,
                ConditionalSectionEnd
            ]
        );

        assert_eq!(
            codes(&dtd("<![ foo [ ]]>")),
            vec![ErrorCode::ConditionalKeywordExpected]
        );
        assert_eq!(
            codes(&dtd("<![INCLUDE[<!ELEMENT a EMPTY>")),
            vec![ErrorCode::ConditionalSectionEndExpected]
        );
    }

    #[test]
    fn test_internal_subset_in_doctype() {
        let source = "<!DOCTYPE r [<!ELEMENT r (#PCDATA)> %ext; ]><r/>";
        let tree = parse_document(source, 0..source.len()).unwrap();
        assert!(codes(&tree).is_empty());
        let prolog = tree.find_child(tree.root(), Prolog).unwrap();
        let doctype = tree.find_child(prolog, Doctype).unwrap();
        let markup = tree.find_child(doctype, MarkupDecl).unwrap();
        assert_eq!(
            child_kinds(&tree, markup),
            vec![MarkupStart, ElementDecl, WhiteSpace, EntityRef, WhiteSpace, MarkupEnd]
        );
        assert_eq!(tree.text(), source);
    }

    #[test]
    fn test_unclosed_internal_subset() {
        let source = "<!DOCTYPE r [<!ELEMENT r EMPTY>";
        let tree = parse_document(source, 0..source.len()).unwrap();
        assert_eq!(
            codes(&tree),
            vec![ErrorCode::MarkupEndExpected, ErrorCode::DoctypeEndExpected]
        );
    }
}
