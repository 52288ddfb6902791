use chrono::{DateTime, Utc};
use serde_json::Value;

use delve_types::{Message, Role};

/// Upper bound for back-filled answer durations. Anything longer is
/// assumed to span a session gap, not an actual run.
const MAX_BACKFILL_DURATION_MS: i64 = 600_000;

/// Normalize the raw thread-state payload into chat messages.
///
/// The agent servers label roles loosely ("human", "user", "ai",
/// "assistant"); anything else (system, tool) is dropped. Assistant
/// durations are back-filled from the preceding user timestamp when
/// the gap is positive and under ten minutes.
pub fn messages_from_state(state: &Value) -> Vec<Message> {
    let raw = if let Some(list) = state.as_array() {
        list.as_slice()
    } else {
        state
            .get("values")
            .and_then(|v| v.get("messages"))
            .and_then(|m| m.as_array())
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    };

    let mut messages: Vec<Message> = raw.iter().filter_map(convert_raw_message).collect();
    backfill_durations(&mut messages);
    messages
}

fn convert_raw_message(raw: &Value) -> Option<Message> {
    let obj = raw.as_object()?;

    let role = obj
        .get("type")
        .or_else(|| obj.get("role"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_lowercase();

    let content = obj
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let timestamp = obj
        .get("created_at")
        .or_else(|| obj.get("timestamp"))
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<DateTime<Utc>>().ok())
        .unwrap_or_else(Utc::now);

    let role = if role.contains("human") || role.contains("user") {
        Role::User
    } else if role.contains("ai") || role.contains("assistant") {
        Role::Assistant
    } else {
        return None;
    };

    Some(Message {
        role,
        content,
        timestamp,
        duration_ms: None,
        sources: None,
        feedback: None,
    })
}

fn backfill_durations(messages: &mut [Message]) {
    for i in 0..messages.len() {
        if messages[i].role != Role::Assistant || messages[i].duration_ms.is_some() {
            continue;
        }

        let assistant_time = messages[i].timestamp;
        let user_time = messages[..i]
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.timestamp);

        if let Some(user_time) = user_time {
            let duration = assistant_time
                .signed_duration_since(user_time)
                .num_milliseconds();
            if duration > 0 && duration < MAX_BACKFILL_DURATION_MS {
                messages[i].duration_ms = Some(duration as u64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalizes_roles_and_drops_unknown() {
        let state = json!({
            "values": {
                "messages": [
                    {"type": "human", "content": "q"},
                    {"type": "system", "content": "ignored"},
                    {"role": "AIMessage", "content": "a"},
                ]
            }
        });

        let messages = messages_from_state(&state);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_accepts_bare_array_state() {
        let state = json!([{"role": "user", "content": "q"}]);
        assert_eq!(messages_from_state(&state).len(), 1);
    }

    #[test]
    fn test_duration_backfill_within_bounds() {
        let state = json!([
            {"type": "human", "content": "q", "created_at": "2026-08-30T10:00:00Z"},
            {"type": "ai", "content": "a", "created_at": "2026-08-30T10:00:42Z"},
        ]);

        let messages = messages_from_state(&state);
        assert_eq!(messages[1].duration_ms, Some(42_000));
    }

    #[test]
    fn test_duration_not_backfilled_over_ten_minutes() {
        let state = json!([
            {"type": "human", "content": "q", "created_at": "2026-08-30T10:00:00Z"},
            {"type": "ai", "content": "a", "created_at": "2026-08-30T11:00:00Z"},
        ]);

        let messages = messages_from_state(&state);
        assert_eq!(messages[1].duration_ms, None);
    }
}
