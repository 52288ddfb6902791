use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local bookkeeping for one server-side conversation thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMetadata {
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
    /// Which backend assistant serves this thread. Threads are scoped
    /// to one backend; the two agents have unrelated namespaces.
    pub assistant_id: String,
}

impl ThreadMetadata {
    pub fn new(first_user_message: &str, assistant_id: impl Into<String>) -> Self {
        Self {
            title: derive_title(first_user_message),
            created_at: Utc::now(),
            message_count: 0,
            assistant_id: assistant_id.into(),
        }
    }
}

/// Thread titles come from the first user message, truncated to 30
/// characters plus an ellipsis.
pub fn derive_title(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    if chars.len() > 30 {
        let truncated: String = chars[..30].iter().collect();
        format!("{}...", truncated)
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_title_untruncated() {
        assert_eq!(derive_title("hello"), "hello");
    }

    #[test]
    fn test_long_title_truncated() {
        let long = "a".repeat(40);
        let title = derive_title(&long);
        assert_eq!(title.chars().count(), 33);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_title_multibyte_safe() {
        let korean = "차량 데이터에 대해 아주 길게 물어보는 한국어 질문입니다 정말로요";
        let title = derive_title(korean);
        assert!(title.ends_with("..."));
    }
}
