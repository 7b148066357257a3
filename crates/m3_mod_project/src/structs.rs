//! Parenthesised struct lists used by `altfiles` and `altdlc`.
//!
//! ```text
//! altfiles = ((ModFile=a.pcc, AltFile="Alt\a.pcc"), (ModFile=b.pcc, MultiListId=1, MultiListRootPath=Alt))
//! ```

use crate::error::{Error, Result};
use std::collections::HashMap;

/// Split `((a), (b))` or `(a),(b)` into the parenthesised items, brackets included.
pub(crate) fn split_structs(value: &str) -> Result<Vec<&str>> {
    let value = value.trim();
    let value = if value.len() >= 4 && value.starts_with("((") && value.ends_with("))") {
        &value[1..value.len() - 1]
    } else {
        value
    };

    let mut items = Vec::new();
    let mut open = Vec::new();
    let mut quoted = false;
    for (i, c) in value.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '(' if !quoted => open.push(i),
            ')' if !quoted => {
                let start = open
                    .pop()
                    .ok_or_else(|| invalid(value, "unmatched closing parenthesis"))?;
                if open.is_empty() {
                    items.push(&value[start..=i]);
                }
            }
            _ => {}
        }
    }
    if !open.is_empty() {
        return Err(invalid(value, "unclosed parenthesis"));
    }
    Ok(items)
}

/// Parse `(Key=Value, Other="quoted, value")` into lowercase keys and values.
pub(crate) fn parse_struct(item: &str) -> Result<HashMap<String, String>> {
    let body = item.trim().trim_start_matches('(').trim_end_matches(')');

    let mut values = HashMap::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            ',' if !quoted && depth == 0 => {
                insert_pair(&mut values, &body[start..i], item)?;
                start = i + 1;
            }
            _ => {}
        }
    }
    insert_pair(&mut values, &body[start..], item)?;
    Ok(values)
}

fn insert_pair(values: &mut HashMap<String, String>, pair: &str, item: &str) -> Result<()> {
    if pair.trim().is_empty() {
        return Ok(());
    }
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| invalid(item, "property without '='"))?;
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    values.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    Ok(())
}

fn invalid(value: &str, reason: &str) -> Error {
    Error::InvalidStruct {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
