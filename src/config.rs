use crate::SkyflowError;
use service_auth::Credentials;

pub const CREDENTIALS_ENV: &str = "SKYFLOW_CREDENTIALS";

/// Deployment environment of a vault cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Env {
    Dev,
    Stage,
    Sandbox,
    #[default]
    Prod,
}

impl Env {
    fn domain(self) -> &'static str {
        match self {
            Env::Dev => "skyflowapis.dev",
            Env::Stage => "skyflowapis.tech",
            Env::Sandbox => "skyflowapis-preview.com",
            Env::Prod => "skyflowapis.com",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VaultConfig {
    pub vault_id: String,
    pub cluster_id: String,
    pub env: Env,
    pub credentials: Option<Credentials>,
    /// Overrides the URL derived from cluster and environment.
    pub base_url: Option<String>,
}

impl VaultConfig {
    pub fn new(vault_id: impl Into<String>, cluster_id: impl Into<String>) -> Self {
        Self {
            vault_id: vault_id.into(),
            cluster_id: cluster_id.into(),
            env: Env::default(),
            credentials: None,
            base_url: None,
        }
    }

    pub fn env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn vault_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.vault.{}", self.cluster_id, self.env.domain()),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SkyflowError> {
        if self.vault_id.trim().is_empty() {
            return Err(SkyflowError::Validation("vault id is required".to_string()));
        }
        if self.base_url.is_none() && self.cluster_id.trim().is_empty() {
            return Err(SkyflowError::Validation("cluster id is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub connection_id: String,
    pub connection_url: String,
    pub credentials: Option<Credentials>,
}

impl ConnectionConfig {
    pub fn new(connection_id: impl Into<String>, connection_url: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            connection_url: connection_url.into(),
            credentials: None,
        }
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), SkyflowError> {
        if self.connection_id.trim().is_empty() {
            return Err(SkyflowError::Validation("connection id is required".to_string()));
        }
        if !(self.connection_url.starts_with("https://") || self.connection_url.starts_with("http://")) {
            return Err(SkyflowError::Validation(format!(
                "invalid connection url: {}",
                self.connection_url
            )));
        }
        Ok(())
    }
}

/// Own credentials first, then the common ones, then `SKYFLOW_CREDENTIALS`.
pub(crate) fn effective_credentials(
    own: Option<&Credentials>,
    common: Option<&Credentials>,
) -> Option<Credentials> {
    own.or(common).cloned().or_else(|| {
        std::env::var(CREDENTIALS_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(Credentials::credentials_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_url_per_env() {
        let config = VaultConfig::new("vault1", "abc123");
        assert_eq!(config.vault_url(), "https://abc123.vault.skyflowapis.com");
        assert_eq!(
            config.clone().env(Env::Sandbox).vault_url(),
            "https://abc123.vault.skyflowapis-preview.com"
        );
        assert_eq!(
            config.clone().env(Env::Dev).vault_url(),
            "https://abc123.vault.skyflowapis.dev"
        );
        assert_eq!(
            config.env(Env::Stage).vault_url(),
            "https://abc123.vault.skyflowapis.tech"
        );
    }

    #[test]
    fn test_base_url_override() {
        let config = VaultConfig::new("vault1", "").base_url("http://127.0.0.1:9000/");
        assert_eq!(config.vault_url(), "http://127.0.0.1:9000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_vault_config_requires_ids() {
        assert!(VaultConfig::new("", "abc").validate().is_err());
        assert!(VaultConfig::new("v", " ").validate().is_err());
    }

    #[test]
    fn test_connection_config_validation() {
        assert!(ConnectionConfig::new("c1", "https://example.com/x").validate().is_ok());
        assert!(ConnectionConfig::new("c1", "ftp://example.com").validate().is_err());
        assert!(ConnectionConfig::new("", "https://example.com").validate().is_err());
    }

    #[test]
    fn test_own_credentials_win() {
        let own = Credentials::api_key("sky-own");
        let common = Credentials::api_key("sky-common");
        let effective = effective_credentials(Some(&own), Some(&common)).unwrap();
        assert_eq!(effective.api_key.as_deref(), Some("sky-own"));

        let effective = effective_credentials(None, Some(&common)).unwrap();
        assert_eq!(effective.api_key.as_deref(), Some("sky-common"));
    }
}
