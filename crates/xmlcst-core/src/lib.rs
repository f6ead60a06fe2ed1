//! xmlcst Core
//!
//! Lossless, error-tolerant XML parsing.
//! This crate turns any text, well-formed or not, into a concrete syntax
//! tree that reproduces every input byte and records malformed markup as
//! error markers instead of failing.

pub mod config;
pub mod cst; // Concrete Syntax Tree (lossless, arena-backed, Rowan export)
pub mod error;
pub mod parser;
pub mod result;

// Re-export commonly used types
pub use config::{ConfigLoader, ParserConfig};
pub use cst::{
    ErrorCode, IncrementalUpdater, NodeId, RoundTripValidator, SyntaxError, TextEdit,
    XmlLanguage, XmlSyntaxKind, XmlSyntaxNode, XmlTree, debug_tree, parse_document,
    parse_dtd_fragment, parse_tag_fragment,
};
pub use error::{ErrorKind, XmlCstError};
pub use parser::{ParseError, ParseResult, Parser, XmlParser};
pub use result::Result;

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr so that stdout stays free for command output.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xmlcst=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
