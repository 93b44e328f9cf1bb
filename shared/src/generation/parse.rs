use crate::types::{Idea, PrioritizationMatrix};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Remove a surrounding markdown code fence, if any.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the language tag line
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Substring from the first `open` to the last `close`.
fn extract_between(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Best-effort parse of a JSON object out of raw model output.
pub fn parse_object<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let text = strip_fences(raw);
    let json = extract_between(text, '{', '}')?;
    match serde_json::from_str(json) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Could not parse model output as object: {}", e);
            None
        }
    }
}

fn item_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["text", "idea", "title"]
            .iter()
            .find_map(|k| map.get(*k).and_then(|v| v.as_str()))?
            .to_string(),
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Parse a list of strings. Accepts a bare JSON array (of strings or of
/// objects with a `text` field) or an object wrapping one under `key`.
pub fn parse_string_list(raw: &str, key: &str) -> Option<Vec<String>> {
    let text = strip_fences(raw);

    let value: Value = match extract_between(text, '[', ']')
        .and_then(|json| serde_json::from_str::<Value>(json).ok())
    {
        Some(v @ Value::Array(_)) => v,
        _ => {
            let obj: Value = parse_object(text)?;
            obj.get(key)?.clone()
        }
    };

    let items: Vec<String> = value.as_array()?.iter().filter_map(item_text).collect();
    (!items.is_empty()).then_some(items)
}

/// Align a model-produced matrix with the project's actual ideas: unknown
/// entries are dropped, each idea lands in at most one quadrant, and ideas the
/// model left out go to `fill_ins`.
pub fn sanitize_matrix(matrix: PrioritizationMatrix, ideas: &[Idea]) -> PrioritizationMatrix {
    let resolve = |name: &str| -> Option<String> {
        let needle = name.trim().to_lowercase();
        ideas
            .iter()
            .find(|i| i.text.trim().to_lowercase() == needle)
            .map(|i| i.text.clone())
    };

    let mut clean = PrioritizationMatrix::default();
    let mut source = matrix;
    for (from, to) in source.quadrants_mut().into_iter().zip(clean.quadrants_mut()) {
        for name in from.iter() {
            if let Some(text) = resolve(name) {
                if !to.contains(&text) {
                    to.push(text);
                }
            }
        }
    }

    // first quadrant wins when the model listed an idea twice
    let mut seen = Vec::new();
    for quadrant in clean.quadrants_mut() {
        quadrant.retain(|t| {
            if seen.contains(t) {
                false
            } else {
                seen.push(t.clone());
                true
            }
        });
    }

    for idea in ideas {
        if !clean.contains(&idea.text) {
            clean.fill_ins.push(idea.text.clone());
        }
    }

    clean
}
