//! Concrete Syntax Tree (CST) for XML
//!
//! This module implements a lossless, error-tolerant syntax tree. Every byte
//! of the parsed range, whitespace and comments included, ends up in exactly
//! one leaf, and malformed markup never aborts parsing: it is recorded as
//! zero-width error markers inside the tree.
//!
//! ## Architecture
//!
//! Parsing runs in two passes over the same token stream:
//!
//! - **Structural pass**: the parser reads tokens through a [`TriviaFilter`]
//!   that hides whitespace, comments and bad characters, and builds elements,
//!   prolog and DTD declarations with local error recovery.
//! - **Trivia reinsertion**: the unfiltered stream is replayed against the
//!   tree's leaves and every hidden run is spliced back at its place.
//!
//! The result is an arena-backed [`XmlTree`]. [`XmlTree::to_syntax`] turns it
//! into a Rowan red/green tree typed by [`XmlLanguage`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use xmlcst_core::cst::{parse_document, XmlSyntaxKind};
//!
//! let source = "<a><!-- x --></a>";
//! let tree = parse_document(source, 0..source.len())?;
//!
//! // Lossless
//! assert_eq!(tree.text(), source);
//!
//! // Comments are real nodes
//! let syntax = tree.to_syntax();
//! assert!(syntax.descendants().any(|n| n.kind() == XmlSyntaxKind::Comment));
//! ```

mod dtd;
mod filter;
mod language;
mod lexer;
mod messages;
mod parser;
mod reinsert;
mod syntax_kind;
mod tree;

pub mod incremental;
pub mod printer;
pub mod round_trip;

pub use filter::TriviaFilter;
pub use incremental::{IncrementalUpdater, TextEdit, UpdateMetrics, UpdateResult, ancestor_names};
pub use language::{XmlLanguage, XmlSyntaxElement, XmlSyntaxNode, XmlSyntaxToken};
pub use lexer::{LexerPosition, LexerState, Token, XmlLexer, tokenize};
pub use messages::{ErrorCode, SyntaxError};
pub use parser::{
    parse_document, parse_document_with, parse_dtd_fragment, parse_dtd_fragment_with,
    parse_tag_fragment, parse_tag_fragment_with,
};
pub use printer::debug_tree;
pub use round_trip::{DifferenceKind, RoundTripValidator, TilingDifference, ValidationResult};
pub use syntax_kind::XmlSyntaxKind;
pub use tree::{NodeId, XmlTree};
