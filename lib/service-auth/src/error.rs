use thiserror::Error;

/// Coarse error classes surfaced to callers with a stable numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidInput,
    Server,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Token is expired")]
    TokenExpired,

    #[error("Invalid private key format: expected a PEM block of type PRIVATE KEY")]
    InvalidFormat,

    #[error("Unable to parse private key as PKCS1 or PKCS8: {0}")]
    InvalidAlgorithm(String),

    #[error("Private key is not an RSA key")]
    InvalidKeySpec,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Token endpoint error ({status}): {message}")]
    Server {
        status: u16,
        message: String,
        request_id: Option<String>,
    },

    #[error("Token request error: {0}")]
    RequestError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl AuthError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AuthError::Server { .. } | AuthError::RequestError(_) | AuthError::UnknownError(_) => {
                ErrorCategory::Server
            }
            _ => ErrorCategory::InvalidInput,
        }
    }

    /// Stable numeric code: 400 for input problems, the server status (or 500) otherwise.
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Server { status, .. } => *status,
            other => match other.category() {
                ErrorCategory::InvalidInput => 400,
                ErrorCategory::Server => 500,
            },
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            AuthError::Server { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_errors_are_invalid_input() {
        assert_eq!(AuthError::InvalidFormat.category(), ErrorCategory::InvalidInput);
        assert_eq!(AuthError::InvalidKeySpec.code(), 400);
        assert_eq!(AuthError::TokenExpired.code(), 400);
    }

    #[test]
    fn test_server_error_keeps_status() {
        let err = AuthError::Server {
            status: 503,
            message: "unavailable".to_string(),
            request_id: Some("req-1".to_string()),
        };
        assert_eq!(err.category(), ErrorCategory::Server);
        assert_eq!(err.code(), 503);
        assert_eq!(err.request_id(), Some("req-1"));
    }

    #[test]
    fn test_malformed_response_is_server_category() {
        let err = AuthError::UnknownError("bad body".to_string());
        assert_eq!(err.code(), 500);
    }
}
