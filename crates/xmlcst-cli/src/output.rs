//! Output formatting and reporting

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use xmlcst_core::cst::NodeId;
use xmlcst_core::{ErrorCode, ParseError, ParseResult, XmlTree, debug_tree};

use crate::{ReportFormat, TreeFormat};

/// Summary statistics for a check run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub files_checked: usize,
    pub files_with_errors: usize,
    pub errors: usize,
}

impl CheckSummary {
    pub fn record(&mut self, errors: usize) {
        self.files_checked += 1;
        self.errors += errors;
        if errors > 0 {
            self.files_with_errors += 1;
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Error markers of one checked file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub errors: Vec<ParseError>,
}

/// One node of the flat JSON tree
#[derive(Debug, Serialize)]
struct JsonNode<'a> {
    depth: usize,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<[usize; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorCode>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    unclosed: bool,
}

#[derive(Debug, Serialize)]
struct JsonTree<'a> {
    path: String,
    errors: &'a [ParseError],
    nodes: Vec<JsonNode<'a>>,
}

pub fn print_tree(path: &Path, result: &ParseResult, format: TreeFormat) -> Result<()> {
    match format {
        TreeFormat::Tree => print!("{}", debug_tree(result.tree())),
        TreeFormat::Json => {
            let document = JsonTree {
                path: path.display().to_string(),
                errors: result.errors(),
                nodes: flatten(result.tree()),
            };
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }
    Ok(())
}

/// Pre-order list of every node with its depth
fn flatten(tree: &XmlTree) -> Vec<JsonNode<'_>> {
    let mut nodes = Vec::with_capacity(tree.node_count());
    let mut stack: Vec<(NodeId, usize)> = vec![(tree.root(), 0)];
    while let Some((id, depth)) = stack.pop() {
        nodes.push(JsonNode {
            depth,
            kind: format!("{:?}", tree.kind(id)),
            range: tree
                .text_range(id)
                .map(|range| [usize::from(range.start()), usize::from(range.end())]),
            text: tree.leaf_text(id),
            error: tree.error_code(id),
            unclosed: tree.is_unclosed(id),
        });
        stack.extend(tree.children(id).iter().rev().map(|&child| (child, depth + 1)));
    }
    nodes
}

pub fn print_check_report(
    reports: &[FileReport],
    summary: &CheckSummary,
    format: ReportFormat,
) -> Result<()> {
    match format {
        ReportFormat::Human => {
            for report in reports {
                for error in &report.errors {
                    // Editors count lines and columns from one
                    println!(
                        "{}:{}:{}: error[{}]: {}",
                        report.path,
                        error.line + 1,
                        error.column + 1,
                        error.code.as_str(),
                        error.message
                    );
                }
            }
            print_summary_human(summary);
        }
        ReportFormat::Json => {
            let output = serde_json::json!({
                "files": reports,
                "summary": summary,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_summary_human(summary: &CheckSummary) {
    if summary.has_errors() {
        println!(
            "Checked {} file(s): {} error(s) in {} file(s)",
            summary.files_checked, summary.errors, summary.files_with_errors
        );
    } else {
        println!("Checked {} file(s): no errors", summary.files_checked);
    }
}
