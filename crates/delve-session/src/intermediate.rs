use serde::Serialize;
use serde_json::Value;

/// Keep at most this many extracted keywords.
const MAX_KEYWORDS: usize = 8;

/// Same recursion cap as source extraction.
const MAX_DEPTH: usize = 5;

/// Progress hints surfaced while a research run is still in flight:
/// document counts, extracted keywords, and an average relevance
/// percentage, scraped opportunistically from event payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntermediateResults {
    pub documents_found: Option<u64>,
    pub keywords: Vec<String>,
    pub relevance_pct: Option<u32>,
    pub current_step: Option<String>,
}

impl IntermediateResults {
    pub fn is_empty(&self) -> bool {
        self.documents_found.is_none()
            && self.keywords.is_empty()
            && self.relevance_pct.is_none()
            && self.current_step.is_none()
    }

    /// Scan a payload for hint fields, merging anything found into
    /// the current results. Returns true when something changed.
    pub fn scan(&mut self, data: &Value) -> bool {
        let before = self.clone();
        self.walk(data, 0);
        *self != before
    }

    fn walk(&mut self, value: &Value, depth: usize) {
        if depth > MAX_DEPTH {
            return;
        }

        match value {
            Value::Array(items) => {
                for item in items {
                    self.walk(item, depth + 1);
                }
            }
            Value::Object(obj) => {
                for key in ["documents", "results"] {
                    if let Some(field) = obj.get(key) {
                        if let Some(count) = count_from_field(field) {
                            self.documents_found = Some(count);
                        }
                    }
                }

                if let Some(field) = obj.get("keywords") {
                    if let Some(keywords) = keywords_from_field(field) {
                        self.keywords = keywords;
                    }
                }

                for key in ["relevance", "score"] {
                    if let Some(field) = obj.get(key) {
                        if let Some(pct) = relevance_from_field(field) {
                            self.relevance_pct = Some(pct);
                        }
                    }
                }

                for nested in obj.values() {
                    if nested.is_object() || nested.is_array() {
                        self.walk(nested, depth + 1);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Array length, or the numeric value itself.
fn count_from_field(field: &Value) -> Option<u64> {
    match field {
        Value::Array(items) => Some(items.len() as u64),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// String array, or a comma-separated string; capped at 8.
fn keywords_from_field(field: &Value) -> Option<Vec<String>> {
    let keywords: Vec<String> = match field {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => return None,
    };

    if keywords.is_empty() {
        None
    } else {
        Some(keywords.into_iter().take(MAX_KEYWORDS).collect())
    }
}

/// Fractions in 0..=1 scale to percent; larger numbers are taken as
/// already-integer percentages. Non-numeric values are discarded.
fn relevance_from_field(field: &Value) -> Option<u32> {
    let n = field.as_f64()?;
    if !n.is_finite() || n < 0.0 {
        return None;
    }
    if n <= 1.0 {
        Some((n * 100.0).round() as u32)
    } else {
        Some(n.round() as u32)
    }
}
