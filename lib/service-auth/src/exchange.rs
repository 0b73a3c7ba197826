use crate::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Access token issued by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Trait for exchanging a signed assertion for an access token
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Single attempt, no retries.
    async fn exchange(
        &self,
        token_uri: &str,
        assertion: &str,
        scope: Option<&str>,
    ) -> Result<TokenResponse, AuthError>;
}

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    grant_type: &'a str,
    assertion: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
}

/// Token exchange over HTTPS
#[derive(Clone, Default)]
pub struct HttpTokenExchange {
    client: reqwest::Client,
}

impl HttpTokenExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    async fn exchange(
        &self,
        token_uri: &str,
        assertion: &str,
        scope: Option<&str>,
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .client
            .post(token_uri)
            .json(&ExchangeRequest {
                grant_type: JWT_BEARER_GRANT,
                assertion,
                scope,
            })
            .send()
            .await
            .map_err(|e| AuthError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let request_id = response
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Server {
                status,
                message: body,
                request_id,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::UnknownError(format!("Invalid token response: {}", e)))
    }
}
