//! Credential loading.
//!
//! The Cursor editor persists its login in `cursor_client/auth.json` under the
//! user's config directory. This module reads that record; it never writes it.

use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::api::ClientError;

/// Directory under the config root holding the credential file
pub const AUTH_DIR_NAME: &str = "cursor_client";

/// Credential file name
pub const AUTH_FILE_NAME: &str = "auth.json";

/// Persisted authentication record.
///
/// The field names are owned by the editor that writes the file.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecord {
    pub access_token: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub refresh_token: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub challenge: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub auth_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub uuid: String,
}

/// Optional fields may be written as `null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl AuthRecord {
    /// Record holding only an access token.
    pub fn with_access_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: String::new(),
            challenge: String::new(),
            auth_id: String::new(),
            uuid: String::new(),
        }
    }
}

impl std::fmt::Debug for AuthRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRecord")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("auth_id", &self.auth_id)
            .field("uuid", &self.uuid)
            .finish()
    }
}

/// Source of the credential record used to authenticate each call.
pub trait CredentialSource: Send + Sync {
    /// Load the current record. Called once per outgoing request.
    fn load(&self) -> Result<AuthRecord, ClientError>;

    /// Human-readable location, used in error messages.
    fn describe(&self) -> String;
}

/// Credentials read from a JSON file on every load.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Credentials at the default location.
    pub fn at_default_location() -> Result<Self, ClientError> {
        default_auth_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, reason: impl Into<String>) -> ClientError {
        ClientError::CredentialsUnavailable {
            location: self.describe(),
            reason: reason.into(),
        }
    }
}

impl CredentialSource for FileCredentials {
    fn load(&self) -> Result<AuthRecord, ClientError> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| self.unavailable(format!("failed to read credential file: {}", e)))?;

        let record: AuthRecord = serde_json::from_str(&content)
            .map_err(|e| self.unavailable(format!("failed to parse credential file: {}", e)))?;

        debug!("Loaded credentials from {:?}", self.path);
        Ok(record)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fixed in-memory credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    record: AuthRecord,
}

impl StaticCredentials {
    pub fn new(record: AuthRecord) -> Self {
        Self { record }
    }
}

impl CredentialSource for StaticCredentials {
    fn load(&self) -> Result<AuthRecord, ClientError> {
        Ok(self.record.clone())
    }

    fn describe(&self) -> String {
        "in-memory credentials".to_string()
    }
}

/// Root of the user's configuration: `$XDG_CONFIG_HOME`, else `$HOME/.config`.
pub fn config_root() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    dirs::home_dir().map(|home| home.join(".config"))
}

/// `<config-root>/cursor_client/auth.json`
pub fn default_auth_path() -> Result<PathBuf, ClientError> {
    config_root()
        .map(|root| root.join(AUTH_DIR_NAME).join(AUTH_FILE_NAME))
        .ok_or_else(|| ClientError::CredentialsUnavailable {
            location: format!("<config-root>/{}/{}", AUTH_DIR_NAME, AUTH_FILE_NAME),
            reason: "could not determine home directory".to_string(),
        })
}
