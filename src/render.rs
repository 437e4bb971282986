//! Output rendering.
//!
//! Every command result and every error leaves the process through
//! [`render`]. Rendering is total and deterministic; text destined for a
//! terminal has its control characters escaped.

use crate::error_chain::ErrorNode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mod chain;
mod dict;
mod escape;
mod table;

pub use chain::render_error_chain;
pub use dict::render_dict;
pub use escape::encode_escaped;
pub use table::{render_table, TableLayout, TableOptions, EMPTY_CELL};

/// How results and errors are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// A renderable result.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputValue {
    Raw(Vec<u8>),
    /// One line per item; `None` renders as an empty line.
    List(Vec<Option<String>>),
    Table {
        rows: Vec<Map<String, Value>>,
        options: TableOptions,
    },
    Dict(Map<String, Value>),
    /// Compact JSON. Errors are embedded through [`ErrorNode::to_json`] so
    /// foreign errors keep their name and message.
    Json(Value),
    ErrorChain(ErrorNode),
}

impl OutputValue {
    /// JSON form of an error chain.
    pub fn error_json(node: &ErrorNode) -> Self {
        OutputValue::Json(node.to_json())
    }
}

pub fn render(value: &OutputValue) -> Vec<u8> {
    match value {
        OutputValue::Raw(bytes) => bytes.clone(),
        OutputValue::List(items) => render_list(items).into_bytes(),
        OutputValue::Table { rows, options } => render_table(rows, options).into_bytes(),
        OutputValue::Dict(map) => render_dict(map).into_bytes(),
        OutputValue::Json(value) => format!("{}\n", value).into_bytes(),
        OutputValue::ErrorChain(node) => render_error_chain(node).into_bytes(),
    }
}

fn render_list(items: &[Option<String>]) -> String {
    let mut out = String::new();
    for item in items {
        if let Some(item) = item {
            out.push_str(&encode_escaped(item));
        }
        out.push('\n');
    }
    out
}
