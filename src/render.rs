//! Plain-text presentation of a derived view

use std::fmt::Write;

use crate::pipeline::DerivedView;
use crate::types::{Lead, ViewMode};

const BAR_WIDTH: usize = 40;
const MISSING: &str = "-";

/// Render `view` in the given mode, with a status header
pub fn render(view: &DerivedView, mode: ViewMode, loading: bool) -> String {
    let mut out = String::new();
    let status = if loading { " (loading...)" } else { "" };
    let _ = writeln!(out, "Number of Leads: {}{}", view.len(), status);
    out.push('\n');
    match mode {
        ViewMode::Table => out.push_str(&render_table(view)),
        ViewMode::Chart => out.push_str(&render_chart(view)),
    }
    out
}

/// Date part of an ISO-8601 timestamp
fn date_part(created_at: &str) -> &str {
    created_at.split('T').next().unwrap_or(created_at)
}

fn cells(lead: &Lead) -> [String; 8] {
    [
        lead.name.clone(),
        lead.company.clone(),
        lead.industry.clone(),
        lead.size.to_string(),
        lead.source.clone(),
        date_part(&lead.created_at).to_string(),
        lead.quality.clone().unwrap_or_else(|| MISSING.to_string()),
        lead.summary.clone().unwrap_or_else(|| MISSING.to_string()),
    ]
}

pub fn render_table(view: &DerivedView) -> String {
    const HEADERS: [&str; 8] = [
        "Name", "Company", "Industry", "Size", "Source", "Created", "Quality", "Summary",
    ];

    if view.is_empty() {
        return "No leads\n".to_string();
    }

    let rows: Vec<[String; 8]> = view.leads.iter().map(cells).collect();
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let line = |out: &mut String, cols: &[&str]| {
        let padded: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  ").trim_end());
    };

    line(&mut out, &HEADERS);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let rule: Vec<&str> = rule.iter().map(String::as_str).collect();
    line(&mut out, &rule);
    for row in &rows {
        let cols: Vec<&str> = row.iter().map(String::as_str).collect();
        line(&mut out, &cols);
    }
    out
}

/// Horizontal bar per source, scaled to the largest count
pub fn render_chart(view: &DerivedView) -> String {
    if view.source_counts.is_empty() {
        return "No leads\n".to_string();
    }

    let max = view.source_counts.values().copied().max().unwrap_or(1).max(1);
    let label_width = view
        .source_counts
        .keys()
        .map(|k| k.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (source, count) in &view.source_counts {
        let bar = (count * BAR_WIDTH).div_ceil(max);
        let _ = writeln!(
            out,
            "{:<width$}  {} {}",
            source,
            "#".repeat(bar),
            count,
            width = label_width
        );
    }
    out
}
