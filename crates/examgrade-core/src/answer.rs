//! Student answer normalization.
//!
//! Student answers arrive as arbitrary JSON. These helpers reduce them to the
//! canonical shapes the evaluators compare against. Nothing here fails: an
//! answer of the wrong shape normalizes to "no answer".

use std::collections::BTreeMap;

use serde_json::Value;

/// Convert a zero-based option index into the positional option id scheme.
pub fn option_id_for_index(index: u64) -> String {
    format!("opt{}", index + 1)
}

/// Normalize a single-choice answer to an option id.
///
/// Non-negative integers are legacy index answers (`0 -> "opt1"`). Strings
/// are kept as-is. Anything else, including blank strings, is no answer.
pub fn normalize_choice(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(index) = n.as_u64() {
                return Some(option_id_for_index(index));
            }
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
                    Some(option_id_for_index(f as u64))
                }
                _ => Some(n.to_string()),
            }
        }
        _ => None,
    }
}

/// Normalize a multiple-choice answer to a list of option ids.
///
/// A scalar is wrapped in a single-element list.
pub fn normalize_selections(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(normalize_choice).collect(),
        other => normalize_choice(other).into_iter().collect(),
    }
}

/// Normalize a drag-and-drop answer to an `item id -> target id` map.
///
/// Accepts an object keyed by item id, or a list of
/// `{"itemId": .., "targetId": ..}` records.
pub fn normalize_placements(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Object(map) => map
            .iter()
            .filter_map(|(item, target)| id_string(target).map(|t| (item.clone(), t)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|entry| {
                let item = entry.get("itemId").and_then(id_string)?;
                let target = entry.get("targetId").and_then(id_string)?;
                Some((item, target))
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Extract the positional sub-answers of a case-study answer.
///
/// Each element is either the raw sub-answer or a record carrying it under
/// `answer`. An object wrapping the list under `answers` or `subAnswers` is
/// unwrapped first.
pub fn sub_answers(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(record) if record.contains_key("answer") => {
                    record.get("answer").cloned().unwrap_or(Value::Null)
                }
                other => other.clone(),
            })
            .collect(),
        Value::Object(record) => record
            .get("subAnswers")
            .or_else(|| record.get("answers"))
            .map(sub_answers)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Extract free text from a short-answer response.
pub fn answer_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalize free text for comparison: lowercase, trim.
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// An id taken verbatim: strings as-is, numbers in their decimal form.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
