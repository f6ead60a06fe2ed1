use std::ops::Range;

use serde::Serialize;

use crate::Result;
use crate::config::ParserConfig;
use crate::cst::{self, ErrorCode, SyntaxError, XmlSyntaxNode, XmlTree};

/// Outcome of parsing XML content.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed tree; owns the source it was parsed from.
    pub tree: XmlTree,
    /// Error markers found in the tree, with line/column positions.
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    fn from_tree(tree: XmlTree) -> Self {
        let errors = tree
            .errors()
            .into_iter()
            .map(|error| ParseError::from_syntax_error(tree.source(), error))
            .collect();
        Self { tree, errors }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn source(&self) -> &str {
        self.tree.source()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    /// Rowan view of the tree
    pub fn syntax(&self) -> XmlSyntaxNode {
        self.tree.to_syntax()
    }
}

pub trait Parser {
    fn parse(&mut self, content: &str) -> Result<ParseResult>;
}

/// XML parser facade over the CST entry points
///
/// Stateless apart from its configuration; every call parses from scratch.
#[derive(Debug, Clone, Default)]
pub struct XmlParser {
    config: ParserConfig,
}

impl XmlParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a whole document
    pub fn parse_document(&self, content: &str) -> Result<ParseResult> {
        self.parse_document_range(content, 0..content.len())
    }

    pub fn parse_document_range(&self, content: &str, range: Range<usize>) -> Result<ParseResult> {
        cst::parse_document_with(content, range, &self.config).map(ParseResult::from_tree)
    }

    /// Parse a standalone DTD subset
    pub fn parse_fragment(&self, content: &str) -> Result<ParseResult> {
        self.parse_fragment_range(content, 0..content.len())
    }

    pub fn parse_fragment_range(&self, content: &str, range: Range<usize>) -> Result<ParseResult> {
        cst::parse_dtd_fragment_with(content, range, &self.config).map(ParseResult::from_tree)
    }

    /// Re-parse a single element, given the names of its enclosing elements
    pub fn parse_from_tag<I>(&self, content: &str, range: Range<usize>, ancestors: I) -> Result<ParseResult>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        cst::parse_tag_fragment_with(content, range, ancestors, &self.config)
            .map(ParseResult::from_tree)
    }
}

impl Parser for XmlParser {
    fn parse(&mut self, content: &str) -> Result<ParseResult> {
        self.parse_document(content)
    }
}

/// An error marker with its position resolved against the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub message: String,
    pub code: ErrorCode,
    /// Zero-based line
    pub line: usize,
    /// Zero-based column, in characters
    pub column: usize,
    pub offset: usize,
}

impl ParseError {
    fn from_syntax_error(source: &str, error: SyntaxError) -> Self {
        let (line, column) = offset_to_line_col(source, error.offset);
        Self {
            message: error.code.message().to_string(),
            code: error.code,
            line,
            column,
            offset: error.offset,
        }
    }
}

fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 0usize;
    let mut column = 0usize;
    let mut current = 0usize;

    for ch in source.chars() {
        if current >= offset {
            break;
        }

        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }

        current += ch.len_utf8();
    }

    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_carry_positions() {
        let result = XmlParser::new().parse_document("<a>\n  <b>\n</a>").unwrap();
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        let error = &result.errors()[0];
        assert_eq!(error.code, ErrorCode::ElementNotClosed);
        // Right after `<b>`
        assert_eq!((error.line, error.column, error.offset), (1, 5, 9));
    }

    #[test]
    fn test_parser_trait() {
        let mut parser = XmlParser::new();
        let result = Parser::parse(&mut parser, "<a/>").unwrap();
        assert!(result.is_valid());
        assert_eq!(result.syntax().text().to_string(), "<a/>");
    }

    #[test]
    fn test_fragment_entry_points() {
        let parser = XmlParser::new();
        let dtd = parser.parse_fragment("<!ELEMENT a EMPTY>").unwrap();
        assert!(dtd.is_valid());

        let source = "<r><b>x</r>";
        let tag = parser.parse_from_tag(source, 3..source.len(), ["r"]).unwrap();
        assert_eq!(tag.tree().text(), "<b>x</r>");
        assert_eq!(tag.errors()[0].code, ErrorCode::ElementNotClosed);
    }

    #[test]
    fn test_offset_to_line_col() {
        assert_eq!(offset_to_line_col("ab\ncd", 0), (0, 0));
        assert_eq!(offset_to_line_col("ab\ncd", 4), (1, 1));
        assert_eq!(offset_to_line_col("é\nx", 3), (1, 0));
    }
}
