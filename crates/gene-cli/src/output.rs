//! Shared output helpers for human and JSON modes.
//!
//! Human mode prints a rendered table or line to stdout and notices to
//! stderr. JSON mode wraps responses in `{ data, warnings? }`.

use std::io::Write;

use anyhow::Result;
use gene_records::Record;
use serde_json::{Value, json};

use crate::opts::LedgerOpts;

pub fn print_success(
    opts: &LedgerOpts,
    data: Value,
    human: String,
    warnings: Vec<String>,
) -> Result<()> {
    if opts.pretty || opts.json {
        print_json(opts, data, warnings)
    } else {
        print_human(human, warnings)
    }
}

fn print_json(opts: &LedgerOpts, data: Value, warnings: Vec<String>) -> Result<()> {
    let mut root = serde_json::Map::new();
    root.insert("data".into(), data);
    if !warnings.is_empty() {
        root.insert("warnings".into(), json!(warnings));
    }
    let root = Value::Object(root);
    if opts.pretty {
        println!("{}", serde_json::to_string_pretty(&root)?);
    } else {
        println!("{}", serde_json::to_string(&root)?);
    }
    Ok(())
}

fn print_human(human: String, warnings: Vec<String>) -> Result<()> {
    let mut stderr = std::io::stderr();
    for w in warnings {
        writeln!(stderr, "notice: {w}")?;
    }
    if !human.is_empty() {
        println!("{human}");
    }
    Ok(())
}

/// One line per record, aligned in columns.
pub fn record_table<'a>(records: impl IntoIterator<Item = &'a Record>) -> String {
    let mut lines = vec![format!(
        "{:<22} {:<14} {:>10} {:<9} {}",
        "ID", "GENE TYPE", "EFFICIENCY", "STATUS", "OWNER"
    )];
    for r in records {
        lines.push(format!(
            "{:<22} {:<14} {:>9.1}% {:<9} {}",
            r.id.as_str(),
            r.gene_type,
            r.efficiency,
            r.status.as_str(),
            r.owner
        ));
    }
    lines.join("\n")
}

pub fn record_line(record: &Record) -> String {
    format!(
        "{} {} ({}, {:.1}%) owned by {}",
        record.status, record.id, record.gene_type, record.efficiency, record.owner
    )
}
