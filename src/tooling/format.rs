//! Format listings, trees and operation results as text.

use crate::ops::{Outcome, UploadReport};
use crate::selection::{ClipboardMode, PasteReport};
use crate::tree::{Node, NodeKind};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Human readable size, 1024-based with at most two decimals. Zero is blank.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return String::new();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// File name without its final extension
pub fn base_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => &name[..idx],
        _ => name,
    }
}

/// One-level listing as a table. Files also show their title, the name
/// without its extension.
pub fn format_listing(title: &str, nodes: &[Node]) -> String {
    let mut out = format!("{}\n\n", format_section_heading(title));
    if nodes.is_empty() {
        out.push_str("(empty)\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "Title", "Kind", "Size", "Modified"]);
    for node in nodes {
        let (name, title, kind) = match &node.kind {
            NodeKind::Directory { children } => (
                format!("{}/", node.name.blue().bold()),
                String::new(),
                format!("{} item(s)", children.len()),
            ),
            NodeKind::File { content_kind, .. } => (
                node.name.clone(),
                base_name(&node.name).to_string(),
                content_kind.clone().unwrap_or_default(),
            ),
        };
        let modified = node
            .last_modified
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![name, title, kind, format_file_size(node.size()), modified]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// Indented rendering of a whole forest
pub fn format_tree(nodes: &[Node]) -> String {
    let mut out = String::new();
    render_level(nodes, "", &mut out);
    if out.is_empty() {
        out.push_str("(empty)\n");
    }
    out
}

fn render_level(nodes: &[Node], indent: &str, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let branch = if last { "└── " } else { "├── " };
        if node.is_dir() {
            out.push_str(&format!("{}{}{}/\n", indent, branch, node.name.blue().bold()));
            let next = format!("{}{}", indent, if last { "    " } else { "│   " });
            render_level(node.children(), &next, out);
        } else {
            let size = format_file_size(node.size());
            if size.is_empty() {
                out.push_str(&format!("{}{}{}\n", indent, branch, node.name));
            } else {
                out.push_str(&format!(
                    "{}{}{} {}\n",
                    indent,
                    branch,
                    node.name,
                    format!("({})", size).dimmed()
                ));
            }
        }
    }
}

/// Summary line plus one row per failed step
pub fn format_outcome(action: &str, outcome: &Outcome) -> String {
    if outcome.is_success() {
        return format!("{} {}", "✓".green(), action);
    }
    let mut out = format!(
        "{} {} finished with {} failed step(s)\n",
        "!".yellow(),
        action,
        outcome.failed_steps().len()
    );
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "Step", "Reason"]);
    for step in outcome.failed_steps() {
        table.add_row(vec![step.key.clone(), step.step.to_string(), step.reason.clone()]);
    }
    out.push_str(&table.to_string());
    let duplicated = outcome.duplicated_keys();
    if !duplicated.is_empty() {
        out.push_str(&format!(
            "\nNow present at both source and destination: {}",
            duplicated.join(", ")
        ));
    }
    out
}

pub fn format_paste_report(report: &PasteReport) -> String {
    let verb = match report.mode {
        ClipboardMode::Copy => "Copied",
        ClipboardMode::Cut => "Moved",
    };
    let mut out = String::new();
    for item in &report.items {
        let line = match &item.result {
            Ok(outcome) => format_outcome(
                &format!("{} {} -> {}", verb, item.source, item.destination),
                outcome,
            ),
            Err(e) => format!("{} {}: {}", "✗".red(), item.source, e),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub fn format_upload_report(report: &UploadReport) -> String {
    let mut out = format!(
        "Uploaded {} file(s), skipped {}, failed {}",
        report.uploaded.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for step in &report.failed {
        out.push_str(&format!("\n  {} {}: {}", "✗".red(), step.key, step.reason));
    }
    out
}
