//! CLI output: shaping agent results into renderable values and writing
//! results and errors to the process streams.

use crate::error::CliError;
use crate::render::{render, OutputFormat, OutputValue, TableLayout, TableOptions};
use serde_json::{Map, Value};
use std::io::{self, Write};

/// Rows per batch when writing a table.
pub const TABLE_BATCH_ROWS: usize = 64;

/// Pick the output shape for a call result.
pub fn shape_result(value: Value, format: OutputFormat) -> OutputValue {
    if format == OutputFormat::Json {
        return OutputValue::Json(value);
    }
    match value {
        Value::Null => OutputValue::Raw(Vec::new()),
        Value::Object(map) => OutputValue::Dict(map),
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            let rows = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect();
            OutputValue::Table {
                rows,
                options: TableOptions {
                    include_headers: true,
                    ..Default::default()
                },
            }
        }
        Value::Array(items) => OutputValue::List(items.into_iter().map(list_item).collect()),
        scalar => OutputValue::List(vec![list_item(scalar)]),
    }
}

fn list_item(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Renderable form of a failure.
pub fn shape_error(err: &CliError, format: OutputFormat) -> OutputValue {
    let node = err.to_error_node();
    match format {
        OutputFormat::Human => OutputValue::ErrorChain(node),
        OutputFormat::Json => OutputValue::error_json(&node),
    }
}

/// Write `value`, streaming tables in fixed-width batches.
pub fn write_output<W: Write>(out: &mut W, value: &OutputValue) -> io::Result<()> {
    match value {
        OutputValue::Table { rows, options } if rows.len() > TABLE_BATCH_ROWS => {
            write_table_batches(out, rows, options)
        }
        other => out.write_all(&render(other)),
    }?;
    out.flush()
}

fn write_table_batches<W: Write>(
    out: &mut W,
    rows: &[Map<String, Value>],
    options: &TableOptions,
) -> io::Result<()> {
    let first = &rows[..TABLE_BATCH_ROWS.min(rows.len())];
    let mut layout = TableLayout::new(first, options);
    for batch in rows.chunks(TABLE_BATCH_ROWS) {
        out.write_all(layout.render_batch(batch).as_bytes())?;
    }
    Ok(())
}

/// Write the failure to `err_out` and return the process exit status.
pub fn report_error<W: Write>(err: &CliError, format: OutputFormat, err_out: &mut W) -> i32 {
    if let Err(write_err) = write_output(err_out, &shape_error(err, format)) {
        tracing::warn!(error = %write_err, "Failed to write error output");
    }
    err.exit_code()
}
