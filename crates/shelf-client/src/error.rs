use http::StatusCode;

pub const CONNECTIVITY_MESSAGE: &str =
    "Unable to reach the server. Check your connection and try again.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-2xx status, or a 2xx envelope whose `result` is not `"success"`.
    #[error("request failed ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: StatusCode,
        message: Option<String>,
    },

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn api(status: StatusCode, message: Option<String>) -> Self {
        FetchError::Api {
            status,
            message: message.filter(|m| !m.trim().is_empty()),
        }
    }

    /// The text a screen shows for this failure. Server messages win;
    /// `fallback` covers everything else.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            FetchError::Transport(_) => CONNECTIVITY_MESSAGE.to_string(),
            FetchError::Api {
                message: Some(m), ..
            } => m.clone(),
            FetchError::Api { message: None, .. } | FetchError::Decode(_) => fallback.to_string(),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}

impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_text() {
        let err = FetchError::api(StatusCode::BAD_REQUEST, Some("Invalid page".into()));
        assert_eq!(err.user_message("Failed to load books"), "Invalid page");
    }

    #[test]
    fn user_message_falls_back() {
        let err = FetchError::api(StatusCode::INTERNAL_SERVER_ERROR, Some("  ".into()));
        assert_eq!(err.user_message("Failed to load books"), "Failed to load books");

        let err = FetchError::Decode("missing field `data`".into());
        assert_eq!(err.user_message("Failed to load books"), "Failed to load books");

        let err = FetchError::Transport("connection refused".into());
        assert_eq!(err.user_message("Failed to load books"), CONNECTIVITY_MESSAGE);
    }
}
