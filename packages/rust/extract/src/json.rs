//! Text from JSON payloads.

use serde_json::Value;

use crate::normalize_whitespace;

/// Keys whose string values are treated as body text, in priority order.
pub const TEXT_KEYS: [&str; 3] = ["text", "content", "description"];

/// First non-empty string stored under one of [`TEXT_KEYS`], searched
/// depth-first (object keys and array elements in document order).
///
/// A document that is itself a JSON string is its own text. Returns `None`
/// for invalid JSON or when no candidate is found.
pub fn json_to_text(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;

    if let Value::String(s) = &value {
        let text = normalize_whitespace(s);
        return (!text.is_empty()).then_some(text);
    }

    let mut stack: Vec<&Value> = vec![&value];
    while let Some(current) = stack.pop() {
        match current {
            Value::Object(map) => {
                for key in TEXT_KEYS {
                    if let Some(Value::String(s)) = map.get(key) {
                        let text = normalize_whitespace(s);
                        if !text.is_empty() {
                            return Some(text);
                        }
                    }
                }
                stack.extend(map.values().rev());
            }
            Value::Array(items) => stack.extend(items.iter().rev()),
            _ => {}
        }
    }

    None
}
