//! Command implementations

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use xmlcst_core::{ConfigLoader, ParseResult, ParserConfig, XmlParser};

use crate::output::{CheckSummary, FileReport, print_check_report, print_tree};
use crate::{ReportFormat, TreeFormat};

/// Parse one file and print its tree
pub fn parse_command(
    file: &Path,
    dtd: bool,
    format: TreeFormat,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path, file)?;
    let result = parse_file(file, dtd, config)?;
    print_tree(file, &result, format)
}

/// Parse every file and report its error markers
///
/// Returns `false` when any file has at least one error.
pub fn check_command(
    files: &[PathBuf],
    dtd: bool,
    format: ReportFormat,
    config_path: Option<&Path>,
) -> Result<bool> {
    let mut summary = CheckSummary::default();
    let mut reports = Vec::with_capacity(files.len());

    for file in files {
        let config = load_config(config_path, file)?;
        let result = parse_file(file, dtd, config)?;
        summary.record(result.errors().len());
        reports.push(FileReport {
            path: file.display().to_string(),
            errors: result.errors,
        });
    }

    info!(
        files = summary.files_checked,
        errors = summary.errors,
        "Check finished"
    );
    print_check_report(&reports, &summary, format)?;
    Ok(!summary.has_errors())
}

fn parse_file(file: &Path, dtd: bool, config: ParserConfig) -> Result<ParseResult> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read '{}'", file.display()))?;
    debug!(path = %file.display(), bytes = content.len(), dtd, "Parsing file");

    let parser = XmlParser::with_config(config);
    let result = if dtd {
        parser.parse_fragment(&content)
    } else {
        parser.parse_document(&content)
    };
    result.with_context(|| format!("Failed to parse '{}'", file.display()))
}

/// Explicit config file, or the nearest one above the input file
fn load_config(config_path: Option<&Path>, file: &Path) -> Result<ParserConfig> {
    let start_dir = file.parent().filter(|dir| !dir.as_os_str().is_empty());
    ConfigLoader::load(config_path, start_dir).context("Failed to load configuration")
}
