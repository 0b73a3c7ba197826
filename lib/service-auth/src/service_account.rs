use crate::{AuthError, ServiceAccountKey, TokenExchange, TokenResponse, TokenSigner};
use chrono::{Duration, Utc};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct BearerTokenOptions {
    pub context: Option<String>,
    pub role_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SignedDataTokensOptions {
    pub data_tokens: Vec<String>,
    /// Defaults to 60 seconds.
    pub time_to_live: Option<Duration>,
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDataToken {
    pub token: String,
    pub signed_token: String,
}

/// Generate a bearer token from a credentials file.
pub async fn generate_bearer_token(
    path: &Path,
    options: &BearerTokenOptions,
    exchange: &dyn TokenExchange,
) -> Result<TokenResponse, AuthError> {
    let account = ServiceAccountKey::from_file(path)?;
    bearer_token_for_account(&account, options, exchange).await
}

/// Generate a bearer token from an inline credentials JSON string.
pub async fn generate_bearer_token_from_credentials(
    credentials: &str,
    options: &BearerTokenOptions,
    exchange: &dyn TokenExchange,
) -> Result<TokenResponse, AuthError> {
    let account = ServiceAccountKey::from_json(credentials)?;
    bearer_token_for_account(&account, options, exchange).await
}

pub(crate) async fn bearer_token_for_account(
    account: &ServiceAccountKey,
    options: &BearerTokenOptions,
    exchange: &dyn TokenExchange,
) -> Result<TokenResponse, AuthError> {
    let signer = TokenSigner::from_account(account)?;
    let signed =
        signer.sign_bearer_assertion(options.context.as_deref(), &options.role_ids, Utc::now())?;

    tracing::debug!(token_uri = %signer.token_uri(), "Exchanging signed assertion for bearer token");
    exchange
        .exchange(signer.token_uri(), &signed.assertion, signed.scope.as_deref())
        .await
}

pub fn generate_signed_data_tokens(
    path: &Path,
    options: &SignedDataTokensOptions,
) -> Result<Vec<SignedDataToken>, AuthError> {
    let account = ServiceAccountKey::from_file(path)?;
    signed_data_tokens_for_account(&account, options)
}

pub fn generate_signed_data_tokens_from_credentials(
    credentials: &str,
    options: &SignedDataTokensOptions,
) -> Result<Vec<SignedDataToken>, AuthError> {
    let account = ServiceAccountKey::from_json(credentials)?;
    signed_data_tokens_for_account(&account, options)
}

fn signed_data_tokens_for_account(
    account: &ServiceAccountKey,
    options: &SignedDataTokensOptions,
) -> Result<Vec<SignedDataToken>, AuthError> {
    if options.data_tokens.is_empty() {
        return Err(AuthError::InvalidInput("data tokens are required".to_string()));
    }
    if options.data_tokens.iter().any(|t| t.is_empty()) {
        return Err(AuthError::InvalidInput("data tokens must not be empty".to_string()));
    }
    if let Some(ttl) = options.time_to_live {
        if ttl <= Duration::zero() {
            return Err(AuthError::InvalidInput("time to live must be positive".to_string()));
        }
    }

    let signer = TokenSigner::from_account(account)?;
    let issued_at = Utc::now();
    options
        .data_tokens
        .iter()
        .map(|token| {
            Ok(SignedDataToken {
                token: token.clone(),
                signed_token: signer.sign_data_token(
                    token,
                    options.time_to_live,
                    options.context.as_deref(),
                    issued_at,
                )?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA_PKCS8: &str = include_str!("../tests/fixtures/rsa_pkcs8.pem");

    fn credentials_json() -> String {
        serde_json::json!({
            "clientID": "client-1",
            "keyID": "key-1",
            "tokenURI": "https://manage.example.com/oauth/token",
            "privateKey": RSA_PKCS8,
        })
        .to_string()
    }

    #[test]
    fn test_signed_data_tokens_keep_input_order() {
        let options = SignedDataTokensOptions {
            data_tokens: vec!["t1".to_string(), "t2".to_string()],
            ..Default::default()
        };
        let signed = generate_signed_data_tokens_from_credentials(&credentials_json(), &options).unwrap();

        assert_eq!(signed.len(), 2);
        assert_eq!(signed[0].token, "t1");
        assert_eq!(signed[1].token, "t2");
        assert!(signed.iter().all(|s| s.signed_token.starts_with("signed_token_")));
    }

    #[test]
    fn test_signed_data_tokens_require_tokens() {
        let result = generate_signed_data_tokens_from_credentials(
            &credentials_json(),
            &SignedDataTokensOptions::default(),
        );
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));
    }

    #[test]
    fn test_signed_data_tokens_reject_non_positive_ttl() {
        let options = SignedDataTokensOptions {
            data_tokens: vec!["t1".to_string()],
            time_to_live: Some(Duration::zero()),
            ..Default::default()
        };
        let result = generate_signed_data_tokens_from_credentials(&credentials_json(), &options);
        assert!(matches!(result, Err(AuthError::InvalidInput(_))));
    }
}
