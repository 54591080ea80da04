//! Client configuration.
//!
//! All the values the backend operator may change under us (hosts, client
//! version, machine id) live here so the CLI can override them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{
    AuthRequestBuilder, ClientError, ClientFactory, ClientIdentity, ConnectTransport,
    DEFAULT_AI_BASE_URL, DEFAULT_REPOSITORY_BASE_URL,
};
use crate::credentials::{CredentialSource, FileCredentials};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Credential file; `None` means the default location
    pub auth_file: Option<PathBuf>,
    pub ai_base_url: String,
    pub repository_base_url: String,
    pub identity: ClientIdentity,
    /// Default bound for every call
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auth_file: None,
            ai_base_url: DEFAULT_AI_BASE_URL.to_string(),
            repository_base_url: DEFAULT_REPOSITORY_BASE_URL.to_string(),
            identity: ClientIdentity::default(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// The credential file this configuration points at.
    pub fn credentials(&self) -> Result<FileCredentials, ClientError> {
        match &self.auth_file {
            Some(path) => Ok(FileCredentials::new(path)),
            None => FileCredentials::at_default_location(),
        }
    }

    /// Factory using the configured credential file.
    pub fn factory(&self) -> Result<ClientFactory, ClientError> {
        let credentials: Arc<dyn CredentialSource> = Arc::new(self.credentials()?);
        self.factory_with(credentials)
    }

    /// Factory using an explicit credential source.
    pub fn factory_with(
        &self,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<ClientFactory, ClientError> {
        let transport = ConnectTransport::new(self.timeout)?;
        let requests = AuthRequestBuilder::new(credentials, self.identity.clone());
        Ok(ClientFactory::new(transport, requests))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ServiceKind, DEFAULT_CLIENT_VERSION};
    use crate::credentials::{AuthRecord, StaticCredentials};

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.ai_base_url, "https://api2.cursor.sh");
        assert_eq!(config.repository_base_url, "https://repo42.cursor.sh");
        assert_eq!(config.identity.client_version, DEFAULT_CLIENT_VERSION);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_explicit_auth_file() {
        let config = ClientConfig {
            auth_file: Some(PathBuf::from("/tmp/custom-auth.json")),
            ..ClientConfig::default()
        };
        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.path(), PathBuf::from("/tmp/custom-auth.json"));
    }

    #[test]
    fn test_factory_with_static_credentials() {
        let config = ClientConfig::default();
        let factory = config
            .factory_with(Arc::new(StaticCredentials::new(AuthRecord::with_access_token(
                "t",
            ))))
            .unwrap();
        let client = factory
            .new_client(ServiceKind::Ai, Some(&config.ai_base_url))
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://api2.cursor.sh/");
    }
}
