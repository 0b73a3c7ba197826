use crate::{AuthError, PrivateKey, ServiceAccountKey};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

pub const DEFAULT_BEARER_TTL_SECS: i64 = 3600;
pub const DEFAULT_DATA_TOKEN_TTL_SECS: i64 = 60;

const DATA_TOKEN_ISSUER: &str = "sdk";
const SIGNED_TOKEN_PREFIX: &str = "signed_token_";

#[derive(Serialize)]
struct BearerClaims<'a> {
    iss: &'a str,
    key: &'a str,
    aud: &'a str,
    sub: &'a str,
    iat: i64,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    ctx: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
}

#[derive(Serialize)]
struct DataTokenClaims<'a> {
    iss: &'a str,
    key: &'a str,
    aud: &'a str,
    sub: &'a str,
    tok: &'a str,
    iat: i64,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    ctx: Option<&'a str>,
}

/// Signed assertion ready to be exchanged for a bearer token.
#[derive(Debug, Clone)]
pub struct SignedAssertion {
    pub assertion: String,
    pub scope: Option<String>,
}

/// Builds `" role:<r1> role:<r2>"`, keeping input order and empty roles as-is.
pub fn scope_from_roles(roles: &[String]) -> Option<String> {
    if roles.is_empty() {
        return None;
    }
    Some(roles.iter().map(|role| format!(" role:{}", role)).collect())
}

/// RS256 signer bound to one service account.
pub struct TokenSigner {
    client_id: String,
    key_id: String,
    token_uri: String,
    encoding_key: EncodingKey,
}

impl TokenSigner {
    pub fn new(account: &ServiceAccountKey, private_key: &PrivateKey) -> Result<Self, AuthError> {
        Ok(Self {
            client_id: account.client_id.clone(),
            key_id: account.key_id.clone(),
            token_uri: account.token_uri.clone(),
            encoding_key: private_key.encoding_key()?,
        })
    }

    /// Parse the account's PEM and build a signer for it.
    pub fn from_account(account: &ServiceAccountKey) -> Result<Self, AuthError> {
        let private_key = PrivateKey::from_pem(&account.private_key)?;
        Self::new(account, &private_key)
    }

    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    pub fn sign_bearer_assertion(
        &self,
        context: Option<&str>,
        roles: &[String],
        issued_at: DateTime<Utc>,
    ) -> Result<SignedAssertion, AuthError> {
        let scope = scope_from_roles(roles);
        let claims = BearerClaims {
            iss: &self.client_id,
            key: &self.key_id,
            aud: &self.token_uri,
            sub: &self.client_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::seconds(DEFAULT_BEARER_TTL_SECS)).timestamp(),
            ctx: context,
            scope: scope.as_deref(),
        };

        let assertion = self.sign(&claims)?;
        Ok(SignedAssertion { assertion, scope })
    }

    /// Sign a single data token; the result carries the `signed_token_` prefix.
    pub fn sign_data_token(
        &self,
        data_token: &str,
        ttl: Option<Duration>,
        context: Option<&str>,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let ttl = ttl.unwrap_or_else(|| Duration::seconds(DEFAULT_DATA_TOKEN_TTL_SECS));
        let claims = DataTokenClaims {
            iss: DATA_TOKEN_ISSUER,
            key: &self.key_id,
            aud: &self.token_uri,
            sub: &self.client_id,
            tok: data_token,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            ctx: context,
        };

        Ok(format!("{}{}", SIGNED_TOKEN_PREFIX, self.sign(&claims)?))
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidInput(format!("unable to sign token: {}", e)))
    }
}
