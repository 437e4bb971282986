//! Rendering properties: list line recovery, dict key alignment and error
//! chain indentation.

use nodectl::error_chain::{DomainError, ErrorNode, ForeignError, RemoteError};
use nodectl::render::{encode_escaped, render, render_error_chain, OutputValue};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Splitting a rendered list on line breaks recovers the escaped items.
#[test]
fn test_list_lines_are_escaped_items() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(any::<String>(), 0..16), |items| {
            let value = OutputValue::List(items.iter().cloned().map(Some).collect());
            let text = String::from_utf8(render(&value)).unwrap();
            let mut lines: Vec<&str> = text.split('\n').collect();
            prop_assert_eq!(lines.pop(), Some(""));
            let expected: Vec<String> = items.iter().map(|item| encode_escaped(item)).collect();
            prop_assert_eq!(lines, expected);
            Ok(())
        })
        .unwrap();
}

/// Reordering keys moves lines but never changes them, and every key is
/// padded to the longest key.
#[test]
fn test_dict_lines_independent_of_key_order() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let entries = prop::collection::btree_map("[a-z_]{1,12}", "[ -~]{0,10}", 1..10);

    runner
        .run(&entries, |entries| {
            let forward: Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            let backward: Map<String, Value> = entries
                .iter()
                .rev()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();

            let forward_text = String::from_utf8(render(&OutputValue::Dict(forward))).unwrap();
            let backward_text = String::from_utf8(render(&OutputValue::Dict(backward))).unwrap();
            let mut forward_lines: Vec<&str> = forward_text.lines().collect();
            let mut backward_lines: Vec<&str> = backward_text.lines().collect();

            let width = entries.keys().map(String::len).max().unwrap_or(0);
            for line in &forward_lines {
                prop_assert_eq!(line.find('\t'), Some(width));
            }

            forward_lines.sort_unstable();
            backward_lines.sort_unstable();
            prop_assert_eq!(forward_lines, backward_lines);
            Ok(())
        })
        .unwrap();
}

/// The foreign error at the bottom of `depth` remote wrappers and one domain
/// error is indented `depth + 1` levels deeper than the root.
#[test]
fn test_error_chain_indentation_tracks_depth() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(0usize..8), |remotes| {
            let foreign = ErrorNode::Foreign(ForeignError::new("TypeError", "boom"));
            let mut node = ErrorNode::Domain(
                DomainError::new("ErrorVaults", "Vault failure", "", 65).with_cause(foreign),
            );
            for hop in 0..remotes {
                node = ErrorNode::Remote(RemoteError::wrap(
                    node,
                    "vnode",
                    "127.0.0.1",
                    1314 + hop as u16,
                    "vaultsList",
                ));
            }

            let text = render_error_chain(&node);
            let foreign_line = text
                .lines()
                .find(|line| line.ends_with("TypeError: boom"))
                .unwrap();
            let levels = remotes + 1;
            let expected = format!("{}cause: TypeError: boom", "  ".repeat(levels));
            prop_assert_eq!(foreign_line, expected.as_str());
            prop_assert!(text.lines().next().unwrap().starts_with(node.name()));
            Ok(())
        })
        .unwrap();
}
