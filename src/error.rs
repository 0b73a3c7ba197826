use service_auth::{AuthError, ErrorCategory};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkyflowError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Vault API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        request_id: Option<String>,
        details: Option<serde_json::Value>,
    },

    #[error("Vault request error: {0}")]
    RequestError(String),

    #[error("Unexpected vault response: {0}")]
    InvalidResponse(String),

    #[error("Vault not configured: {0}")]
    VaultNotConfigured(String),

    #[error("Connection not configured: {0}")]
    ConnectionNotConfigured(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SkyflowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SkyflowError::Auth(e) => e.category(),
            SkyflowError::Api { .. }
            | SkyflowError::RequestError(_)
            | SkyflowError::InvalidResponse(_) => ErrorCategory::Server,
            _ => ErrorCategory::InvalidInput,
        }
    }

    /// Stable numeric code carried by every thrown error.
    pub fn code(&self) -> u16 {
        match self {
            SkyflowError::Auth(e) => e.code(),
            SkyflowError::Api { status, .. } => *status,
            other => match other.category() {
                ErrorCategory::InvalidInput => 400,
                ErrorCategory::Server => 500,
            },
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            SkyflowError::Api { request_id, .. } => request_id.as_deref(),
            SkyflowError::Auth(e) => e.request_id(),
            _ => None,
        }
    }

    /// Message without the variant prefix, as reported in row-level errors.
    pub fn description(&self) -> String {
        match self {
            SkyflowError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
