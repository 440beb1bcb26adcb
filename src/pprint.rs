//! Terminal dump of `read` / `search_read` results.

use std::fmt::Write as _;

use serde_json::Value;
use thiserror::Error;

pub const NOTHING_TO_DISPLAY: &str = "Nothing to display";

/// A record was not a mapping, or lacked the requested field.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Nothing to display")]
pub struct NothingToDisplay;

fn rule(out: &mut String) {
    out.push('\n');
    out.push_str(&"-".repeat(100));
    out.push('\n');
}

/// Formats each record between rulers: only `field` when given, otherwise every
/// `key  ::  value` pair.
pub fn render_records(records: &[Value], field: Option<&str>) -> Result<String, NothingToDisplay> {
    let mut out = String::new();
    for record in records {
        rule(&mut out);
        let record = record.as_object().ok_or(NothingToDisplay)?;
        match field {
            Some(field) => {
                let value = record.get(field).ok_or(NothingToDisplay)?;
                let _ = writeln!(out, "{}", display(value));
            }
            None => {
                for (key, value) in record {
                    let _ = writeln!(out, "\n\t{key}  ::  {}", display(value));
                }
            }
        }
    }
    rule(&mut out);
    out.push('\n');

    Ok(out)
}

/// Prints to stdout. Returns `Err(NothingToDisplay)` instead of printing when the
/// records cannot be shown.
pub fn pprint_res(records: &[Value], field: Option<&str>) -> Result<(), NothingToDisplay> {
    let rendered = render_records(records, field)?;
    print!("{rendered}");
    Ok(())
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
