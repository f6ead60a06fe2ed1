//! Configuration system for xmlcst
//!
//! Grammar leniency and optional self-checks of the parser are read from a
//! small TOML file.
//!
//! ## Configuration Discovery
//!
//! When no explicit config path is provided, the loader searches for
//! `xmlcst.toml` or `.xmlcstrc.toml` starting from the current directory and
//! moving up the directory tree until a config is found or the filesystem
//! root is reached. No file at all means default settings.
//!
//! ## Example Configuration
//!
//! ```toml
//! sgmlContentSpec = true
//! checkAttributeWhitespace = false
//! verifyLossless = true
//! ```

mod loader;
mod parser_config;

pub use loader::ConfigLoader;
pub use parser_config::ParserConfig;
