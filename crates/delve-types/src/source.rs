use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A citation attached to an assistant answer. The URL is the identity
/// key; title and snippet are presentation only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Source {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

/// Deduplicating source accumulator for a single in-flight response.
///
/// Keyed by URL: re-inserting an existing URL overwrites its content
/// (last-write-wins) but keeps the first-seen position, so the final
/// ordered list reflects discovery order.
#[derive(Debug, Default)]
pub struct SourceSet {
    order: Vec<String>,
    by_url: HashMap<String, Source>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: Source) {
        if !self.by_url.contains_key(&source.url) {
            self.order.push(source.url.clone());
        }
        self.by_url.insert(source.url.clone(), source);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.by_url.clear();
    }

    /// Frozen, ordered view for attaching to a finalized message.
    pub fn to_vec(&self) -> Vec<Source> {
        self.order
            .iter()
            .filter_map(|url| self.by_url.get(url).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_last_write_wins_first_seen_order() {
        let mut set = SourceSet::new();
        set.insert(Source::new("First", "https://a.com"));
        set.insert(Source::new("Other", "https://b.com"));
        set.insert(Source::new("Updated", "https://a.com"));

        let sources = set.to_vec();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].url, "https://a.com");
        assert_eq!(sources[0].title, "Updated");
        assert_eq!(sources[1].url, "https://b.com");
    }

    #[test]
    fn test_clear() {
        let mut set = SourceSet::new();
        set.insert(Source::new("t", "https://a.com"));
        set.clear();
        assert!(set.is_empty());
        assert!(set.to_vec().is_empty());
    }
}
