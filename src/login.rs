//! Experimental pieces of the browser login flow.
//!
//! The editor's login hands the browser a URL whose `state` parameter holds a
//! JSON object; its `returnTo` URL carries the login uuid, which the backend
//! can be polled with. What the poll endpoint expects beyond the uuid (the
//! challenge/verifier exchange) is not understood, so nothing here produces
//! credentials.

use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::{form_urlencoded, Url};

use crate::api::{CallOptions, ClientError, ConnectTransport};

/// Poll endpoint on the primary API host
pub const POLL_PATH: &str = "auth/poll";

/// Polls made by default before giving up
pub const DEFAULT_POLL_ATTEMPTS: u32 = 10;

/// Pause between polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginUrlError {
    #[error("invalid login URL: {0}")]
    InvalidUrl(String),
    #[error("login URL has no `state` parameter")]
    MissingState,
    #[error("`state` parameter is not a JSON object: {0}")]
    InvalidState(String),
    #[error("`state` has no `returnTo` URL")]
    MissingReturnTo,
    #[error("`returnTo` URL has no `uuid` parameter")]
    MissingUuid,
}

/// Pull the login uuid out of a login URL.
pub fn extract_login_uuid(login_url: &str) -> Result<String, LoginUrlError> {
    let url = Url::parse(login_url).map_err(|e| LoginUrlError::InvalidUrl(e.to_string()))?;
    let state = query_param(&url, "state").ok_or(LoginUrlError::MissingState)?;

    // The state is sometimes encoded twice
    let state_map = parse_state(&state).or_else(|first_err| {
        let decoded = form_urlencoded::parse(state.as_bytes())
            .next()
            .map(|(key, _)| key.into_owned())
            .unwrap_or_default();
        parse_state(&decoded).map_err(|_| first_err)
    })?;

    let return_to = state_map
        .get("returnTo")
        .and_then(|v| v.as_str())
        .ok_or(LoginUrlError::MissingReturnTo)?;
    let return_url = Url::parse(return_to).map_err(|e| LoginUrlError::InvalidUrl(e.to_string()))?;

    query_param(&return_url, "uuid").ok_or(LoginUrlError::MissingUuid)
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn parse_state(raw: &str) -> Result<serde_json::Map<String, serde_json::Value>, LoginUrlError> {
    serde_json::from_str(raw).map_err(|e| LoginUrlError::InvalidState(e.to_string()))
}

/// Unauthenticated poller for a pending login.
#[derive(Debug, Clone)]
pub struct LoginPoller {
    transport: ConnectTransport,
    base_url: Url,
}

impl LoginPoller {
    pub fn new(transport: ConnectTransport, base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidInput(format!("invalid base URL {}: {}", base_url, e)))?;
        Ok(Self {
            transport,
            base_url,
        })
    }

    /// `<base>/auth/poll?uuid=<uuid>`
    pub fn poll_url(&self, uuid: &str) -> Result<Url, ClientError> {
        let mut url = self
            .base_url
            .join(POLL_PATH)
            .map_err(|e| ClientError::InvalidInput(format!("invalid poll URL: {}", e)))?;
        url.query_pairs_mut().append_pair("uuid", uuid);
        Ok(url)
    }

    /// One poll; returns the HTTP status the backend answered with.
    pub async fn poll_once(&self, uuid: &str, options: CallOptions) -> Result<u16, ClientError> {
        let url = self.poll_url(uuid)?;
        debug!("Polling {}", url);
        self.transport.get_status(url, options).await
    }
}
