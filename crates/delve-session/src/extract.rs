use serde_json::Value;
use url::Url;

use delve_types::{Source, SourceSet};

/// Recursion cap: deeper nesting is silently ignored, never an error.
const MAX_DEPTH: usize = 5;

/// Walk an arbitrary payload collecting citation-like objects into the
/// per-request source set.
///
/// Any object with a string `url` becomes a source; `results` arrays,
/// `tool_calls[].args`, and `messages` lists are recursed explicitly,
/// everything else object-valued is walked generically. Duplicate URLs
/// overwrite earlier entries (last-write-wins) while keeping their
/// first-seen position.
pub fn extract_sources(data: &Value, sources: &mut SourceSet) {
    traverse(data, 0, sources);
}

fn traverse(value: &Value, depth: usize, sources: &mut SourceSet) {
    if depth > MAX_DEPTH {
        return;
    }

    match value {
        Value::Array(items) => {
            for item in items {
                traverse(item, depth + 1, sources);
            }
        }
        Value::Object(obj) => {
            if let Some(url) = obj.get("url").and_then(|v| v.as_str()) {
                sources.insert(source_from_object(url, value));
            }

            if let Some(results) = obj.get("results").and_then(|v| v.as_array()) {
                for result in results {
                    if let Some(url) = result.get("url").and_then(|v| v.as_str()) {
                        sources.insert(source_from_object(url, result));
                    }
                }
            }

            if let Some(calls) = obj.get("tool_calls").and_then(|v| v.as_array()) {
                for call in calls {
                    if let Some(args) = call.get("args") {
                        traverse(args, depth + 1, sources);
                    }
                }
            }

            if let Some(messages) = obj.get("messages").and_then(|v| v.as_array()) {
                for msg in messages {
                    traverse(msg, depth + 1, sources);
                }
            }

            for nested in obj.values() {
                if nested.is_object() || nested.is_array() {
                    traverse(nested, depth + 1, sources);
                }
            }
        }
        _ => {}
    }
}

fn source_from_object(url: &str, value: &Value) -> Source {
    let title = ["title", "name", "label"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| domain_from_url(url));

    let snippet = ["snippet", "description", "summary"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string);

    Source {
        title,
        url: url.to_string(),
        snippet,
    }
}

/// Fallback title: the hostname without a leading "www.", or the raw
/// string when it does not parse as a URL.
fn domain_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_with_title_fallbacks() {
        let mut sources = SourceSet::new();
        extract_sources(
            &json!({
                "a": {"url": "https://a.com", "title": "A"},
                "b": {"url": "https://b.com", "name": "B"},
                "c": {"url": "https://c.com", "label": "C"},
                "d": {"url": "https://www.d.com/page"},
            }),
            &mut sources,
        );

        let titles: Vec<String> = sources.to_vec().into_iter().map(|s| s.title).collect();
        assert!(titles.contains(&"A".to_string()));
        assert!(titles.contains(&"B".to_string()));
        assert!(titles.contains(&"C".to_string()));
        assert!(titles.contains(&"d.com".to_string()));
    }

    #[test]
    fn test_snippet_fallbacks() {
        let mut sources = SourceSet::new();
        extract_sources(
            &json!({"url": "https://a.com", "title": "A", "description": "desc"}),
            &mut sources,
        );
        assert_eq!(sources.to_vec()[0].snippet.as_deref(), Some("desc"));
    }

    #[test]
    fn test_results_array() {
        let mut sources = SourceSet::new();
        extract_sources(
            &json!({
                "results": [
                    {"url": "https://a.com", "title": "A", "snippet": "sa"},
                    {"url": "https://b.com", "title": "B"},
                    {"irrelevant": true},
                ]
            }),
            &mut sources,
        );
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn test_tool_call_args_recursed() {
        let mut sources = SourceSet::new();
        extract_sources(
            &json!({
                "tool_calls": [
                    {"name": "web_search", "args": {"source": {"url": "https://a.com", "title": "A"}}}
                ]
            }),
            &mut sources,
        );
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn test_depth_cap_is_silent() {
        // Nested 8 levels deep: beyond the cap, so nothing is found
        // and nothing errors.
        let deep = json!({
            "a": {"b": {"c": {"d": {"e": {"f": {"g": {"url": "https://deep.com"}}}}}}}
        });
        let mut sources = SourceSet::new();
        extract_sources(&deep, &mut sources);
        assert!(sources.is_empty());
    }

    #[test]
    fn test_same_url_last_write_wins() {
        let mut sources = SourceSet::new();
        extract_sources(&json!({"url": "https://a.com", "title": "First"}), &mut sources);
        extract_sources(&json!({"url": "https://a.com", "title": "Second"}), &mut sources);

        let collected = sources.to_vec();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].title, "Second");
    }

    #[test]
    fn test_non_url_fallback_title_is_raw_string() {
        assert_eq!(domain_from_url("not a url"), "not a url");
    }
}
