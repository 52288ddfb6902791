use thiserror::Error;

/// Failures surfaced by session operations themselves, as opposed to
/// failures of the underlying agent run (those become [`ErrorNotice`]s).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a send is already in progress")]
    Busy,

    #[error("no message at index {0}")]
    NoSuchMessage(usize),

    #[error("message at index {0} is not an assistant message")]
    NotAssistant(usize),

    #[error("message at index {0} is not a user message")]
    NotUser(usize),

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

/// Broad classification of a failed agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Offline,
    Timeout,
    NotFound,
    ServerError,
    Unauthorized,
    Unknown,
}

/// User-facing rendering of a failed run: a headline, a longer
/// description, and the question that failed so the caller can offer
/// a retry without digging it back out of the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNotice {
    pub kind: ErrorKind,
    pub message: String,
    pub description: String,
    pub content: String,
}

/// Map an error's rendered text onto a notice. Matching is on
/// substrings of the full error chain, lowercased. `content` is the
/// question whose run failed.
pub fn classify_error(err: &anyhow::Error, content: &str) -> ErrorNotice {
    let text = format!("{:#}", err).to_lowercase();

    let (kind, message, description) = if text.contains("connect")
        || text.contains("offline")
        || text.contains("network")
        || text.contains("dns")
    {
        (
            ErrorKind::Offline,
            "Cannot reach the research server",
            "The server appears to be offline or unreachable. Check that it is running and try again.",
        )
    } else if text.contains("timed out") || text.contains("timeout") {
        (
            ErrorKind::Timeout,
            "The request timed out",
            "The server took too long to respond. It may be under heavy load; try again in a moment.",
        )
    } else if text.contains("404") {
        (
            ErrorKind::NotFound,
            "Endpoint not found",
            "The server did not recognize the request. The assistant may not be deployed at this address.",
        )
    } else if text.contains("500") || text.contains("503") {
        (
            ErrorKind::ServerError,
            "The server hit an internal error",
            "Something went wrong on the server side. Try again, and check the server logs if it persists.",
        )
    } else if text.contains("401") || text.contains("403") {
        (
            ErrorKind::Unauthorized,
            "Not authorized",
            "The server rejected the request. Check that the API key is set and valid.",
        )
    } else {
        (
            ErrorKind::Unknown,
            "Something went wrong",
            "An unexpected error occurred while processing the request.",
        )
    };

    ErrorNotice {
        kind,
        message: message.to_string(),
        description: description.to_string(),
        content: content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_classify_offline() {
        let notice = classify_error(&anyhow!("tcp connect error: connection refused"), "q");
        assert_eq!(notice.kind, ErrorKind::Offline);
    }

    #[test]
    fn test_classify_timeout() {
        let notice = classify_error(&anyhow!("operation timed out"), "q");
        assert_eq!(notice.kind, ErrorKind::Timeout);
    }

    #[test]
    fn test_classify_http_statuses() {
        assert_eq!(
            classify_error(&anyhow!("run request failed with 404: not found"), "q").kind,
            ErrorKind::NotFound
        );
        assert_eq!(
            classify_error(&anyhow!("run request failed with 503: unavailable"), "q").kind,
            ErrorKind::ServerError
        );
        assert_eq!(
            classify_error(&anyhow!("run request failed with 401: unauthorized"), "q").kind,
            ErrorKind::Unauthorized
        );
    }

    #[test]
    fn test_classify_chain_is_inspected() {
        let err = anyhow!("connection refused").context("failed to create thread");
        assert_eq!(classify_error(&err, "q").kind, ErrorKind::Offline);
    }

    #[test]
    fn test_notice_carries_failed_question() {
        let notice = classify_error(&anyhow!("something odd"), "what is rust");
        assert_eq!(notice.kind, ErrorKind::Unknown);
        assert_eq!(notice.content, "what is rust");
    }
}
