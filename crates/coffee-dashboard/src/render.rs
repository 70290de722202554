//! Text and JSON output of a dashboard snapshot.

use std::fmt::Write;

use sales_core::formatting::{bar, format_count, format_currency};
use sales_core::models::FilterSelection;
use sales_runtime::dashboard::{ShareRow, Snapshot, ViewData};
use sales_runtime::data::aggregator::{AggregateResult, HierarchyNode, Reducer};

/// Width of the proportional bar column.
const BAR_WIDTH: usize = 30;

/// Shown in place of a chart when the selection matched nothing.
const EMPTY_NOTICE: &str = "  (no data for the current selection)";

/// Pretty-printed JSON of the whole snapshot.
pub fn to_json(snapshot: &Snapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(snapshot)
}

/// Plain-text rendering: a summary header, then one titled block per view.
pub fn to_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let s = &snapshot.summary;
    let _ = writeln!(
        out,
        "Transactions: {}   Revenue: {}   Average ticket: {}",
        format_count(s.transactions),
        format_currency(s.revenue),
        format_currency(s.average_ticket)
    );
    let _ = writeln!(out, "Filters: {}", describe_selection(&snapshot.selection));

    for view in &snapshot.views {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", view.title);
        let _ = writeln!(out, "{}", "─".repeat(view.title.chars().count()));
        if view.data.is_empty() {
            let _ = writeln!(out, "{}", EMPTY_NOTICE);
            continue;
        }
        match &view.data {
            ViewData::Grouped(result) => write_grouped(&mut out, result),
            ViewData::Shares(shares) => write_shares(&mut out, shares),
            ViewData::Hierarchy(nodes) => {
                for node in nodes {
                    write_node(&mut out, node, 0);
                }
            }
        }
    }
    out
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn describe_selection(selection: &FilterSelection) -> String {
    let parts: Vec<String> = selection
        .dimensions()
        .filter_map(|dim| {
            let values = selection.values(dim)?;
            let shown = if values.is_empty() {
                "(none)".to_string()
            } else {
                values.iter().cloned().collect::<Vec<_>>().join(", ")
            };
            Some(format!("{}=[{}]", dim, shown))
        })
        .collect();
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join("  ")
    }
}

fn format_value(reducer: Reducer, value: f64) -> String {
    match reducer {
        Reducer::Sum(_) => format_currency(value),
        Reducer::Count => format_count(value.round() as u64),
    }
}

fn write_grouped(out: &mut String, result: &AggregateResult) {
    let labels: Vec<String> = result.rows.iter().map(|r| r.key.label()).collect();
    let values: Vec<String> = result
        .rows
        .iter()
        .map(|r| format_value(result.reducer, r.value))
        .collect();
    let label_w = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let value_w = values.iter().map(|v| v.len()).max().unwrap_or(0);
    let max = result.max_value();

    for ((label, value), row) in labels.iter().zip(&values).zip(&result.rows) {
        let _ = writeln!(
            out,
            "  {:<label_w$}  {:>value_w$}  {}",
            label,
            value,
            bar(row.value, max, BAR_WIDTH),
        );
    }
}

fn write_shares(out: &mut String, shares: &[ShareRow]) {
    let label_w = shares.iter().map(|s| s.label.chars().count()).max().unwrap_or(0);
    let max = shares.iter().map(|s| s.value).fold(0.0, f64::max);
    for (rank, share) in shares.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {:<label_w$}  {:>12}  {:>5.1}%  {}",
            rank + 1,
            share.label,
            format_currency(share.value),
            share.percent,
            bar(share.value, max, BAR_WIDTH),
        );
    }
}

fn write_node(out: &mut String, node: &HierarchyNode, depth: usize) {
    let _ = writeln!(
        out,
        "  {}{}  {}",
        "  ".repeat(depth),
        node.label,
        format_currency(node.value)
    );
    for child in &node.children {
        write_node(out, child, depth + 1);
    }
}
