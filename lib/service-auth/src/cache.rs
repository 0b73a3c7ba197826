use crate::AuthError;
use crate::expiry::is_expired;
use std::future::Future;
use tokio::sync::Mutex;

/// Reuse-if-valid cache for a single bearer token.
///
/// Only the token string is stored; validity is re-derived from its `exp` claim
/// on every use. Regeneration happens under the lock, so concurrent callers
/// sharing one cache never race on the token or generate it twice.
#[derive(Debug, Default)]
pub struct BearerTokenCache {
    token: Mutex<Option<String>>,
}

impl BearerTokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached token if it is still valid.
    pub async fn get(&self) -> Option<String> {
        let token = self.token.lock().await;
        token.as_ref().filter(|t| !is_expired(t)).cloned()
    }

    pub async fn set(&self, token: String) {
        *self.token.lock().await = Some(token);
    }

    pub async fn clear(&self) {
        *self.token.lock().await = None;
    }

    /// Return the cached token, or run `generate` and cache its result.
    pub async fn get_or_generate<F, Fut>(&self, generate: F) -> Result<String, AuthError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, AuthError>>,
    {
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref().filter(|t| !is_expired(t)) {
            tracing::debug!("Reusing cached bearer token");
            return Ok(current.clone());
        }

        let fresh = generate().await?;
        *token = Some(fresh.clone());
        tracing::debug!("Cached new bearer token");
        Ok(fresh)
    }
}
