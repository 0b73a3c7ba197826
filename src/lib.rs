//! skyflow - client for the Skyflow data privacy vault
//!
//! ```no_run
//! use skyflow::{Credentials, InsertRequest, Skyflow, VaultConfig};
//!
//! # async fn run() -> Result<(), skyflow::SkyflowError> {
//! let client = Skyflow::builder()
//!     .vault(VaultConfig::new("vault-id", "cluster-id"))
//!     .credentials(Credentials::path("credentials.json"))
//!     .build()?;
//!
//! let mut row = serde_json::Map::new();
//! row.insert("card_number".into(), "4111111111111111".into());
//!
//! let response = client
//!     .default_vault()?
//!     .insert(&InsertRequest::new("cards", vec![row]).return_tokens(true))
//!     .await?;
//! for error in &response.errors {
//!     eprintln!("row {} failed: {}", error.request_index, error.description);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Row-level failures never fail the call: they are returned in `errors`
//! next to the successful `records`.

mod client;
mod config;
mod connection;
mod error;
mod models;
mod reconcile;
mod transport;
mod validation;
mod vault;
mod wire;

pub use client::{Skyflow, SkyflowBuilder};
pub use config::{CREDENTIALS_ENV, ConnectionConfig, Env, VaultConfig};
pub use connection::{CONNECTION_AUTH_HEADER, ConnectionController};
pub use error::SkyflowError;
pub use models::{
    ColumnValue, DeleteRequest, DeleteResponse, DetokenizeRequest, DetokenizeResponse,
    DetokenizeToken, DetokenizedField, Fields, GetRequest, GetResponse, InsertRecord,
    InsertRequest, InsertResponse, InvokeConnectionRequest, InvokeConnectionResponse,
    RecordResult, RedactionType, RowError, TokenMode, TokenizeRequest, TokenizeResponse,
    UpdateRequest, UpdateResponse,
};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, REQUEST_ID_HEADER, Transport};
pub use vault::VaultController;

pub use reqwest::Method;
pub use service_auth::{
    AuthError, BearerTokenOptions, Credentials, ErrorCategory, HttpTokenExchange,
    SignedDataToken, SignedDataTokensOptions, TokenExchange, TokenResponse, generate_bearer_token,
    generate_bearer_token_from_credentials, generate_signed_data_tokens,
    generate_signed_data_tokens_from_credentials, is_expired,
};
