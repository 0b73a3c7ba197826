use crate::AuthError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

const REDACTED: &str = "<redacted>";

fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| REDACTED)
}

/// Caller-supplied credentials. Exactly one generation means is used per call,
/// chosen by precedence: API key, explicit token, then path / credentials string.
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub token: Option<String>,
    pub path: Option<PathBuf>,
    pub credentials_string: Option<String>,
    pub roles: Vec<String>,
    pub context: Option<String>,
}

impl Credentials {
    pub fn api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn credentials_string(credentials: impl Into<String>) -> Self {
        Self {
            credentials_string: Some(credentials.into()),
            ..Self::default()
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Reject credentials that carry no usable means at all, or an empty one.
    pub fn validate(&self) -> Result<(), AuthError> {
        if let Some(api_key) = &self.api_key {
            if api_key.trim().is_empty() {
                return Err(AuthError::InvalidCredentials("API key is empty".to_string()));
            }
            return Ok(());
        }
        if let Some(token) = &self.token {
            if token.trim().is_empty() {
                return Err(AuthError::InvalidCredentials("token is empty".to_string()));
            }
            return Ok(());
        }
        match (&self.path, &self.credentials_string) {
            (Some(_), Some(_)) => Err(AuthError::InvalidCredentials(
                "both path and credentials string are set, expected exactly one".to_string(),
            )),
            (Some(path), None) if path.as_os_str().is_empty() => Err(
                AuthError::InvalidCredentials("credentials path is empty".to_string()),
            ),
            (None, Some(s)) if s.trim().is_empty() => Err(AuthError::InvalidCredentials(
                "credentials string is empty".to_string(),
            )),
            (None, None) => Err(AuthError::InvalidCredentials(
                "one of api key, token, path or credentials string is required".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &redact(&self.api_key))
            .field("token", &redact(&self.token))
            .field("path", &self.path)
            .field("credentials_string", &redact(&self.credentials_string))
            .field("roles", &self.roles)
            .field("context", &self.context)
            .finish()
    }
}

/// Service account key as issued by the vault's management plane.
#[derive(Clone)]
pub struct ServiceAccountKey {
    pub client_id: String,
    pub key_id: String,
    pub token_uri: String,
    pub private_key: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_id", &self.client_id)
            .field("key_id", &self.key_id)
            .field("token_uri", &self.token_uri)
            .field("private_key", &REDACTED)
            .finish()
    }
}

#[derive(Deserialize)]
struct RawServiceAccountKey {
    #[serde(rename = "clientID")]
    client_id: Option<String>,
    #[serde(rename = "keyID")]
    key_id: Option<String>,
    #[serde(rename = "tokenURI")]
    token_uri: Option<String>,
    #[serde(rename = "privateKey")]
    private_key: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, AuthError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AuthError::InvalidCredentials(format!(
            "unable to read {} from credentials",
            field
        ))),
    }
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let raw: RawServiceAccountKey = serde_json::from_str(json).map_err(|e| {
            AuthError::InvalidCredentials(format!("credentials are not valid JSON: {}", e))
        })?;

        Ok(Self {
            client_id: required(raw.client_id, "clientID")?,
            key_id: required(raw.key_id, "keyID")?,
            token_uri: required(raw.token_uri, "tokenURI")?,
            private_key: required(raw.private_key, "privateKey")?,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AuthError::InvalidCredentials(format!(
                "failed to read credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }
}
