use crate::service_account::{BearerTokenOptions, bearer_token_for_account};
use crate::{
    AuthError, BearerTokenCache, Credentials, HttpTokenExchange, ServiceAccountKey, TokenExchange,
    expiry::is_expired,
};
use std::sync::Arc;

/// Credential chosen for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCredential {
    ApiKey(String),
    BearerToken(String),
}

impl ResolvedCredential {
    pub fn value(&self) -> &str {
        match self {
            ResolvedCredential::ApiKey(v) | ResolvedCredential::BearerToken(v) => v,
        }
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.value())
    }
}

/// Picks the authentication mode for a credentials set and drives token generation.
///
/// The generated token is cached per resolver, so one resolver must serve one
/// credentials set.
pub struct CredentialResolver {
    exchange: Arc<dyn TokenExchange>,
    cache: BearerTokenCache,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new(Arc::new(HttpTokenExchange::new()))
    }
}

impl CredentialResolver {
    pub fn new(exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            exchange,
            cache: BearerTokenCache::new(),
        }
    }

    pub fn cache(&self) -> &BearerTokenCache {
        &self.cache
    }

    /// Precedence: API key, explicit token (must be unexpired), cached token,
    /// then generation from a credentials path or string.
    pub async fn resolve(&self, credentials: &Credentials) -> Result<ResolvedCredential, AuthError> {
        credentials.validate()?;

        if let Some(api_key) = &credentials.api_key {
            return Ok(ResolvedCredential::ApiKey(api_key.clone()));
        }

        if let Some(token) = &credentials.token {
            if is_expired(token) {
                return Err(AuthError::TokenExpired);
            }
            return Ok(ResolvedCredential::BearerToken(token.clone()));
        }

        let token = self
            .cache
            .get_or_generate(|| self.generate(credentials))
            .await?;
        Ok(ResolvedCredential::BearerToken(token))
    }

    async fn generate(&self, credentials: &Credentials) -> Result<String, AuthError> {
        let account = match (&credentials.path, &credentials.credentials_string) {
            (Some(path), None) => ServiceAccountKey::from_file(path)?,
            (None, Some(json)) => ServiceAccountKey::from_json(json)?,
            _ => {
                return Err(AuthError::InvalidCredentials(
                    "exactly one of path or credentials string is required".to_string(),
                ));
            }
        };

        let options = BearerTokenOptions {
            context: credentials.context.clone(),
            role_ids: credentials.roles.clone(),
        };
        let response = bearer_token_for_account(&account, &options, self.exchange.as_ref()).await?;
        tracing::debug!(client_id = %account.client_id, "Generated bearer token");
        Ok(response.access_token)
    }
}
