use crate::SkyflowError;
use crate::config::{ConnectionConfig, VaultConfig, effective_credentials};
use crate::connection::ConnectionController;
use crate::transport::{HttpTransport, Transport};
use crate::vault::VaultController;
use service_auth::{CredentialResolver, Credentials, HttpTokenExchange, TokenExchange};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Default)]
pub struct SkyflowBuilder {
    vaults: Vec<VaultConfig>,
    connections: Vec<ConnectionConfig>,
    credentials: Option<Credentials>,
    transport: Option<Arc<dyn Transport>>,
    token_exchange: Option<Arc<dyn TokenExchange>>,
}

impl SkyflowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vault(mut self, config: VaultConfig) -> Self {
        self.vaults.push(config);
        self
    }

    pub fn connection(mut self, config: ConnectionConfig) -> Self {
        self.connections.push(config);
        self
    }

    /// Used by every vault and connection without credentials of its own.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn token_exchange(mut self, exchange: Arc<dyn TokenExchange>) -> Self {
        self.token_exchange = Some(exchange);
        self
    }

    pub fn build(self) -> Result<Skyflow, SkyflowError> {
        let mut seen = HashSet::new();
        for config in &self.vaults {
            config.validate()?;
            if !seen.insert(config.vault_id.as_str()) {
                return Err(SkyflowError::Validation(format!(
                    "vault {} is configured more than once",
                    config.vault_id
                )));
            }
        }
        let mut seen = HashSet::new();
        for config in &self.connections {
            config.validate()?;
            if !seen.insert(config.connection_id.as_str()) {
                return Err(SkyflowError::Validation(format!(
                    "connection {} is configured more than once",
                    config.connection_id
                )));
            }
        }

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HttpTransport::new()));
        let exchange = self
            .token_exchange
            .unwrap_or_else(|| Arc::new(HttpTokenExchange::new()));
        let common = self.credentials;

        let vaults = self
            .vaults
            .into_iter()
            .map(|config| {
                let credentials = effective_credentials(config.credentials.as_ref(), common.as_ref());
                if credentials.is_none() {
                    tracing::warn!(vault_id = %config.vault_id, "Vault has no credentials configured");
                }
                VaultController::new(
                    config,
                    credentials,
                    CredentialResolver::new(exchange.clone()),
                    transport.clone(),
                )
            })
            .collect::<Vec<_>>();

        let connections = self
            .connections
            .into_iter()
            .map(|config| {
                let credentials = effective_credentials(config.credentials.as_ref(), common.as_ref());
                ConnectionController::new(
                    config,
                    credentials,
                    CredentialResolver::new(exchange.clone()),
                    transport.clone(),
                )
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            vaults = vaults.len(),
            connections = connections.len(),
            "Skyflow client configured"
        );

        Ok(Skyflow {
            vaults,
            connections,
        })
    }
}

/// Entry point: one controller per configured vault and connection.
pub struct Skyflow {
    vaults: Vec<VaultController>,
    connections: Vec<ConnectionController>,
}

impl Skyflow {
    pub fn builder() -> SkyflowBuilder {
        SkyflowBuilder::new()
    }

    pub fn vault(&self, vault_id: &str) -> Result<&VaultController, SkyflowError> {
        self.vaults
            .iter()
            .find(|v| v.vault_id() == vault_id)
            .ok_or_else(|| SkyflowError::VaultNotConfigured(vault_id.to_string()))
    }

    /// The first configured vault.
    pub fn default_vault(&self) -> Result<&VaultController, SkyflowError> {
        self.vaults
            .first()
            .ok_or_else(|| SkyflowError::VaultNotConfigured("no vaults configured".to_string()))
    }

    pub fn connection(&self, connection_id: &str) -> Result<&ConnectionController, SkyflowError> {
        self.connections
            .iter()
            .find(|c| c.connection_id() == connection_id)
            .ok_or_else(|| SkyflowError::ConnectionNotConfigured(connection_id.to_string()))
    }

    pub fn default_connection(&self) -> Result<&ConnectionController, SkyflowError> {
        self.connections.first().ok_or_else(|| {
            SkyflowError::ConnectionNotConfigured("no connections configured".to_string())
        })
    }
}
