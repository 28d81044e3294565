use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("backend url is not configured (set BETPOOL_BACKEND_URL)")]
    NotConfigured,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("http {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_unprocessable(&self) -> bool {
        self.status() == Some(StatusCode::UNPROCESSABLE_ENTITY)
    }

    /// Server-provided message when there is one, otherwise `fallback`.
    /// Client-side validation errors always carry their own text.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(msg), ..
            } if !msg.trim().is_empty() => msg.clone(),
            ApiError::Invalid(msg) => msg.clone(),
            ApiError::NotConfigured => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins_over_fallback() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("Email already taken".to_string()),
        };
        assert_eq!(err.user_message("Registration failed"), "Email already taken");
    }

    #[test]
    fn blank_server_message_uses_fallback() {
        let err = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: Some("  ".to_string()),
        };
        assert_eq!(err.user_message("Could not load teams"), "Could not load teams");
        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(err.user_message("Could not load teams"), "Could not load teams");
    }

    #[test]
    fn status_helpers() {
        let err = ApiError::Status {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: None,
        };
        assert!(err.is_unprocessable());
        assert!(!err.is_unauthorized());
        assert_eq!(ApiError::NotConfigured.status(), None);
    }
}
