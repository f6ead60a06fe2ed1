//! Message codes carried by error markers
//!
//! Document errors never interrupt parsing. They are recorded as zero-width
//! `Error` nodes in the tree, each holding one of these codes.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    // Tags
    ElementNotClosed,
    MismatchedClosingTag,
    TagNameExpected,
    ClosingTagEndExpected,

    // Attributes
    AttributeEqExpected,
    AttributeValueExpected,
    AttributeValueEndExpected,
    WhitespaceExpected,

    // Prolog and content
    PrologEndExpected,
    PiTargetExpected,
    PiEndExpected,
    CdataEndExpected,
    DoctypeNameExpected,
    DoctypeEndExpected,

    // DTD
    NameExpected,
    LiteralPublicSystemExpected,
    ContentSpecStartExpected,
    NameOrEntityRefExpected,
    RightParenExpected,
    ConditionalKeywordExpected,
    MarkupStartExpected,
    MarkupEndExpected,
    ConditionalSectionEndExpected,

    UnexpectedToken,
}

impl ErrorCode {
    /// Human readable message
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::ElementNotClosed => "Element is not closed",
            ErrorCode::MismatchedClosingTag => "Closing tag does not match the opening tag",
            ErrorCode::TagNameExpected => "Tag name expected",
            ErrorCode::ClosingTagEndExpected => "'>' expected",
            ErrorCode::AttributeEqExpected => "'=' expected",
            ErrorCode::AttributeValueExpected => "Attribute value expected",
            ErrorCode::AttributeValueEndExpected => "Closing quote expected",
            ErrorCode::WhitespaceExpected => "Whitespace expected",
            ErrorCode::PrologEndExpected => "'?>' expected",
            ErrorCode::PiTargetExpected => "Processing instruction target expected",
            ErrorCode::PiEndExpected => "'?>' expected",
            ErrorCode::CdataEndExpected => "']]>' expected",
            ErrorCode::DoctypeNameExpected => "Document type name expected",
            ErrorCode::DoctypeEndExpected => "'>' expected",
            ErrorCode::NameExpected => "Name expected",
            ErrorCode::LiteralPublicSystemExpected => "Literal, PUBLIC or SYSTEM expected",
            ErrorCode::ContentSpecStartExpected => "'(' or entity reference or EMPTY or ANY expected",
            ErrorCode::NameOrEntityRefExpected => "Name or entity reference expected",
            ErrorCode::RightParenExpected => "')' expected",
            ErrorCode::ConditionalKeywordExpected => "INCLUDE, IGNORE or entity reference expected",
            ErrorCode::MarkupStartExpected => "'[' expected",
            ErrorCode::MarkupEndExpected => "']' expected",
            ErrorCode::ConditionalSectionEndExpected => "']]>' expected",
            ErrorCode::UnexpectedToken => "Unexpected token",
        }
    }

    /// Stable identifier, matches the serde representation
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ElementNotClosed => "element-not-closed",
            ErrorCode::MismatchedClosingTag => "mismatched-closing-tag",
            ErrorCode::TagNameExpected => "tag-name-expected",
            ErrorCode::ClosingTagEndExpected => "closing-tag-end-expected",
            ErrorCode::AttributeEqExpected => "attribute-eq-expected",
            ErrorCode::AttributeValueExpected => "attribute-value-expected",
            ErrorCode::AttributeValueEndExpected => "attribute-value-end-expected",
            ErrorCode::WhitespaceExpected => "whitespace-expected",
            ErrorCode::PrologEndExpected => "prolog-end-expected",
            ErrorCode::PiTargetExpected => "pi-target-expected",
            ErrorCode::PiEndExpected => "pi-end-expected",
            ErrorCode::CdataEndExpected => "cdata-end-expected",
            ErrorCode::DoctypeNameExpected => "doctype-name-expected",
            ErrorCode::DoctypeEndExpected => "doctype-end-expected",
            ErrorCode::NameExpected => "name-expected",
            ErrorCode::LiteralPublicSystemExpected => "literal-public-system-expected",
            ErrorCode::ContentSpecStartExpected => "content-spec-start-expected",
            ErrorCode::NameOrEntityRefExpected => "name-or-entity-ref-expected",
            ErrorCode::RightParenExpected => "right-paren-expected",
            ErrorCode::ConditionalKeywordExpected => "conditional-keyword-expected",
            ErrorCode::MarkupStartExpected => "markup-start-expected",
            ErrorCode::MarkupEndExpected => "markup-end-expected",
            ErrorCode::ConditionalSectionEndExpected => "conditional-section-end-expected",
            ErrorCode::UnexpectedToken => "unexpected-token",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// An error marker found in a tree, positioned at the end of the leaf
/// that precedes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyntaxError {
    pub code: ErrorCode,
    pub offset: usize,
}
