//! Output formatting for command results.
//!
//! Supports multiple output formats: table (human-readable), JSON, and toon.

use clap::ValueEnum;
use serde::Serialize;

use crate::db::{QueryResult, Value};

/// Table cell shown for a store null, distinct from any text value.
pub const NULL_CELL: &str = "∅";

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// Token-efficient toon format
    Toon,
}

/// Trait for types that can be formatted for output
pub trait Outputable: Serialize {
    /// Format as a human-readable table
    fn to_table(&self) -> String;

    /// Format according to the specified output format
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => self.to_table(),
            OutputFormat::Json => serde_json::to_string_pretty(self).unwrap_or_default(),
            OutputFormat::Toon => {
                let json_value = serde_json::to_value(self).unwrap_or_default();
                toon::encode(&json_value, None)
            }
        }
    }
}

/// Render rows as a pipe-separated grid with a dashed rule under the header.
///
/// Every cell is left-aligned and padded to its column's widest entry; trailing
/// padding is trimmed from each line.
pub fn render_grid(headers: &[String], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(headers));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        lines.push(render_row(row));
    }
    lines
}

fn table_cell(value: &Value) -> String {
    match value {
        Value::Null => NULL_CELL.to_string(),
        other => other.to_string(),
    }
}

impl Outputable for QueryResult {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "No rows.".to_string();
        }

        let headers: Vec<String> = self.column_names().map(str::to_string).collect();
        let rows: Vec<Vec<String>> = (0..self.num_rows())
            .filter_map(|i| self.row(i))
            .map(|row| row.iter().map(table_cell).collect())
            .collect();

        let mut lines = render_grid(&headers, &rows);
        lines.push(String::new());
        lines.push(format!("{} row(s)", self.num_rows()));
        lines.join("\n")
    }
}
