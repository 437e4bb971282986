//! Tab-separated tables with fixed column widths.
//!
//! Widths are computed once, from the rows available when the layout is
//! built. Later batches are rendered against the same widths so rows already
//! written never need to move; a wider cell in a later batch just overflows
//! its column.

use super::escape::encode_escaped;
use serde_json::{Map, Value};

/// Placeholder for absent, null and empty cells. Also the minimum column width.
pub const EMPTY_CELL: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOptions {
    /// Explicit column order. Defaults to every key seen, in first-seen order.
    pub columns: Option<Vec<String>>,
    pub include_headers: bool,
    pub include_row_count: bool,
}

#[derive(Debug, Clone)]
pub struct TableLayout {
    columns: Vec<String>,
    widths: Vec<usize>,
    include_headers: bool,
    include_row_count: bool,
    header_written: bool,
    rows_written: usize,
}

impl TableLayout {
    pub fn new(rows: &[Map<String, Value>], options: &TableOptions) -> Self {
        let columns = match &options.columns {
            Some(columns) => columns.clone(),
            None => {
                let mut columns: Vec<String> = Vec::new();
                for key in rows.iter().flat_map(|row| row.keys()) {
                    if !columns.contains(key) {
                        columns.push(key.clone());
                    }
                }
                columns
            }
        };
        let widths = columns
            .iter()
            .map(|column| {
                rows.iter()
                    .map(|row| cell_text(row.get(column)).chars().count())
                    .chain([column.chars().count(), EMPTY_CELL.len()])
                    .max()
                    .unwrap_or(EMPTY_CELL.len())
            })
            .collect();
        Self {
            columns,
            widths,
            include_headers: options.include_headers,
            include_row_count: options.include_row_count,
            header_written: false,
            rows_written: 0,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    /// Render the next batch. The header, if any, precedes the first batch.
    pub fn render_batch(&mut self, rows: &[Map<String, Value>]) -> String {
        let mut out = String::new();
        if self.include_headers && !self.header_written {
            self.header_written = true;
            let cells: Vec<&str> = self.columns.iter().map(String::as_str).collect();
            let prefix = if self.include_row_count { "\t" } else { "" };
            out.push_str(prefix);
            out.push_str(&self.pad_row(cells));
            out.push('\n');
        }
        for row in rows {
            self.rows_written += 1;
            if self.include_row_count {
                out.push_str(&format!("{}\t", self.rows_written));
            }
            let texts: Vec<String> = self
                .columns
                .iter()
                .map(|column| cell_text(row.get(column)))
                .collect();
            out.push_str(&self.pad_row(texts.iter().map(String::as_str).collect()));
            out.push('\n');
        }
        out
    }

    fn pad_row(&self, cells: Vec<&str>) -> String {
        cells
            .iter()
            .zip(&self.widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("\t")
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => EMPTY_CELL.to_string(),
        Some(Value::String(s)) if s.is_empty() => EMPTY_CELL.to_string(),
        Some(Value::String(s)) => encode_escaped(s),
        Some(other) => encode_escaped(&other.to_string()),
    }
}

/// Render a whole table in one batch.
pub fn render_table(rows: &[Map<String, Value>], options: &TableOptions) -> String {
    TableLayout::new(rows, options).render_batch(rows)
}
