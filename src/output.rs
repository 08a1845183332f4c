//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Tree
//!
//! ```text
//! 001 animals
//! 002 travel
//!     001 japan
//!         001 kyoto
//! ```
//!
//! ## Folder content
//!
//! ```text
//! travel
//!     Title: Trips
//!     Sizes: 400x300, 800x600
//! Images (2)
//!     001 dawn-1a2b3c4d.webp
//!     002 dusk-9f8e7d6c.webp
//! Subfolders
//!     001 japan
//! ```
//!
//! ## Upload report
//!
//! ```text
//! stored  Dawn.jpg → dawn-1a2b3c4d.webp
//! skipped empty.jpg (empty file)
//! failed  broken.jpg: Image processing failed: ...
//! Stored 1 of 3 files
//! ```
//!
//! Each `format_*` function returns `Vec<String>` for testability and has a
//! `print_*` wrapper that writes to stdout. Format functions do no I/O.

use crate::types::{FolderContent, FolderNode};
use crate::uploads::{UploadOutcome, UploadReport};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn walk_tree(nodes: &[FolderNode], depth: usize, lines: &mut Vec<String>) {
    for (i, node) in nodes.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(depth), format_index(i + 1), node.name));
        walk_tree(&node.children, depth + 1, lines);
    }
}

/// Folder tree, one indented line per folder.
pub fn format_tree(nodes: &[FolderNode]) -> Vec<String> {
    if nodes.is_empty() {
        return vec!["(no folders)".to_string()];
    }
    let mut lines = Vec::new();
    walk_tree(nodes, 0, &mut lines);
    lines
}

pub fn print_tree(nodes: &[FolderNode]) {
    for line in format_tree(nodes) {
        println!("{}", line);
    }
}

pub fn format_folder_content(content: &FolderContent) -> Vec<String> {
    let mut lines = Vec::new();
    let header = if content.path.is_empty() {
        "/"
    } else {
        content.path.as_str()
    };
    lines.push(header.to_string());
    if let Some(title) = &content.title {
        lines.push(format!("{}Title: {}", indent(1), title));
    }
    if !content.sizes.is_empty() {
        let sizes: Vec<String> = content.sizes.iter().map(ToString::to_string).collect();
        lines.push(format!("{}Sizes: {}", indent(1), sizes.join(", ")));
    }

    lines.push(format!("Images ({})", content.images.len()));
    for (i, image) in content.images.iter().enumerate() {
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), image));
    }

    if !content.subfolders.is_empty() {
        lines.push("Subfolders".to_string());
        for (i, name) in content.subfolders.iter().enumerate() {
            lines.push(format!("{}{} {}", indent(1), format_index(i + 1), name));
        }
    }
    lines
}

pub fn print_folder_content(content: &FolderContent) {
    for line in format_folder_content(content) {
        println!("{}", line);
    }
}

pub fn format_upload_report(report: &UploadReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .results
        .iter()
        .map(|(name, outcome)| match outcome {
            UploadOutcome::Stored(stored) => format!("stored  {} → {}", name, stored),
            UploadOutcome::Skipped => format!("skipped {} (empty file)", name),
            UploadOutcome::Failed(e) => format!("failed  {}: {}", name, e),
        })
        .collect();
    lines.push(format!(
        "Stored {} of {} files",
        report.stored().count(),
        report.results.len()
    ));
    lines
}

pub fn print_upload_report(report: &UploadReport) {
    for line in format_upload_report(report) {
        println!("{}", line);
    }
}
