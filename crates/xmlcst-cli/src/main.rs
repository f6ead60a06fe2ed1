//! xmlcst CLI
//!
//! Command-line interface for the lossless XML parser

mod commands;
mod output;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::error;
use xmlcst_core::init_tracing;

#[derive(Parser)]
#[command(name = "xmlcst")]
#[command(about = "Lossless, error-tolerant XML parser")]
#[command(version = xmlcst_core::VERSION)]
#[command(
    long_about = "xmlcst parses XML and DTD text into a concrete syntax tree that keeps every byte,\n\
whitespace and comments included, and records malformed markup as error markers.\n\
\n\
Examples:\n  \
xmlcst parse doc.xml                 # Print the syntax tree\n  \
xmlcst parse --dtd schema.dtd        # Parse a standalone DTD subset\n  \
xmlcst parse --format json doc.xml   # Machine readable tree\n  \
xmlcst check *.xml                   # Report error markers, fail if any"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (xmlcst.toml/.xmlcstrc.toml)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and print its concrete syntax tree
    Parse {
        /// File to parse
        file: PathBuf,

        /// Treat the file as a DTD subset instead of a document
        #[arg(long, help = "Parse the file as a standalone DTD subset")]
        dtd: bool,

        /// Output format
        #[arg(short, long, default_value = "tree", help = "Output format for the tree")]
        format: TreeFormat,
    },

    /// Report the error markers found in one or more files
    Check {
        /// Files to check
        #[arg(required = true, help = "Files to check")]
        files: Vec<PathBuf>,

        /// Treat the files as DTD subsets
        #[arg(long, help = "Parse the files as standalone DTD subsets")]
        dtd: bool,

        /// Output format
        #[arg(short, long, default_value = "human", help = "Output format for the report")]
        format: ReportFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeFormat {
    /// Indented dump, one node per line
    Tree,
    /// Flat JSON list of nodes with their depth
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    /// One line per error marker
    Human,
    /// JSON report
    Json,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity; without -v, RUST_LOG applies
    let log_level = match cli.verbose {
        0 => None,
        1 => Some("xmlcst=debug"),
        _ => Some("xmlcst=trace"),
    };
    if let Some(level) = log_level {
        unsafe {
            std::env::set_var("RUST_LOG", level);
        }
    }
    init_tracing();

    match run_command(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("xmlcst failed: {e:#}");
            eprintln!("error: {e:#}");
            std::process::exit(2);
        }
    }
}

/// Run the selected command; `Ok(false)` means the input had errors
fn run_command(cli: Cli) -> Result<bool> {
    match cli.command {
        Some(Commands::Parse { file, dtd, format }) => {
            commands::parse_command(&file, dtd, format, cli.config.as_deref())?;
            Ok(true)
        }

        Some(Commands::Check { files, dtd, format }) => {
            commands::check_command(&files, dtd, format, cli.config.as_deref())
        }

        None => {
            // No subcommand provided, show help
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(true)
        }
    }
}
