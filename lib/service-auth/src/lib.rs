//! service-auth - service account authentication for the vault SDK
//!
//! Resolves credentials in order of precedence:
//! 1. API key → used verbatim
//! 2. Explicit bearer token → used while unexpired
//! 3. Credentials file or JSON string → signed RS256 assertion exchanged for a
//!    bearer token, cached until its `exp` passes

mod cache;
mod credentials;
mod error;
mod exchange;
mod expiry;
mod key;
mod resolver;
mod service_account;
mod signer;

pub use cache::BearerTokenCache;
pub use credentials::{Credentials, ServiceAccountKey};
pub use error::{AuthError, ErrorCategory};
pub use exchange::{HttpTokenExchange, TokenExchange, TokenResponse};
pub use expiry::{is_expired, is_expired_at, token_expiry};
pub use key::PrivateKey;
pub use resolver::{CredentialResolver, ResolvedCredential};
pub use service_account::{
    BearerTokenOptions, SignedDataToken, SignedDataTokensOptions, generate_bearer_token,
    generate_bearer_token_from_credentials, generate_signed_data_tokens,
    generate_signed_data_tokens_from_credentials,
};
pub use signer::{
    DEFAULT_BEARER_TTL_SECS, DEFAULT_DATA_TOKEN_TTL_SECS, SignedAssertion, TokenSigner,
    scope_from_roles,
};
