//! Outgoing request construction.
//!
//! Every call to the backend carries three headers: a bearer token from the
//! credential record, the client version being emulated, and a fresh checksum.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use tracing::debug;

use super::error::ClientError;
use crate::checksum::generate_checksum;
use crate::credentials::CredentialSource;

/// Header carrying the bearer token
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Header carrying the emulated client version
pub const CLIENT_VERSION_HEADER: &str = "x-cursor-client-version";

/// Header carrying the checksum token
pub const CHECKSUM_HEADER: &str = "x-cursor-checksum";

/// Editor version the backend currently accepts
pub const DEFAULT_CLIENT_VERSION: &str = "0.40.4";

/// Placeholder machine identifier.
///
/// The editor derives this from something on the host, but what exactly is
/// unknown. The backend accepts any value here.
pub const DEFAULT_MACHINE_ID: &str = "hi";

/// Opaque values the backend expects from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub client_version: String,
    pub machine_id: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            client_version: DEFAULT_CLIENT_VERSION.to_string(),
            machine_id: DEFAULT_MACHINE_ID.to_string(),
        }
    }
}

/// A message plus the transport headers it will be sent with.
#[derive(Debug, Clone)]
pub struct OutgoingRequest<T> {
    message: T,
    headers: HeaderMap,
}

impl<T> OutgoingRequest<T> {
    /// Request with no headers attached yet.
    pub fn new(message: T) -> Self {
        Self {
            message,
            headers: HeaderMap::new(),
        }
    }

    pub fn message(&self) -> &T {
        &self.message
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Replace the checksum before sending a copy of this request again.
    pub fn refresh_checksum(&mut self, identity: &ClientIdentity) -> Result<(), ClientError> {
        let checksum = generate_checksum(&identity.machine_id);
        self.headers.insert(
            HeaderName::from_static(CHECKSUM_HEADER),
            header_value(&checksum, "checksum")?,
        );
        Ok(())
    }

    pub fn into_parts(self) -> (T, HeaderMap) {
        (self.message, self.headers)
    }
}

/// Wraps messages with the headers needed to address the backend.
pub trait RequestBuilder {
    fn build<T>(&self, message: T) -> Result<OutgoingRequest<T>, ClientError>;
}

/// Builder that authenticates with a credential source.
///
/// Credentials are loaded on every call, so edits to the credential file
/// take effect on the next request.
#[derive(Clone)]
pub struct AuthRequestBuilder {
    credentials: Arc<dyn CredentialSource>,
    identity: ClientIdentity,
}

impl AuthRequestBuilder {
    pub fn new(credentials: Arc<dyn CredentialSource>, identity: ClientIdentity) -> Self {
        Self {
            credentials,
            identity,
        }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }
}

impl RequestBuilder for AuthRequestBuilder {
    fn build<T>(&self, message: T) -> Result<OutgoingRequest<T>, ClientError> {
        let auth = self.credentials.load()?;

        let authorization = header_value(&format!("bearer {}", auth.access_token), "access token")
            .map_err(|_| ClientError::CredentialsUnavailable {
                location: self.credentials.describe(),
                reason: "access token contains characters not allowed in a header".to_string(),
            })?;

        let mut request = OutgoingRequest::new(message);
        let headers = request.headers_mut();
        headers.insert(HeaderName::from_static(AUTHORIZATION_HEADER), authorization);
        headers.insert(
            HeaderName::from_static(CLIENT_VERSION_HEADER),
            header_value(&self.identity.client_version, "client version")?,
        );
        request.refresh_checksum(&self.identity)?;

        debug!(
            "Built request with client version {}",
            self.identity.client_version
        );
        Ok(request)
    }
}

impl std::fmt::Debug for AuthRequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequestBuilder")
            .field("credentials", &self.credentials.describe())
            .field("identity", &self.identity)
            .finish()
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(value).map_err(|_| {
        ClientError::InvalidInput(format!("{} is not a valid header value: {:?}", what, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::TIMESTAMP_LEN;
    use crate::credentials::{AuthRecord, FileCredentials, StaticCredentials};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use tempfile::tempdir;

    fn builder(token: &str) -> AuthRequestBuilder {
        AuthRequestBuilder::new(
            Arc::new(StaticCredentials::new(AuthRecord::with_access_token(token))),
            ClientIdentity::default(),
        )
    }

    #[test]
    fn test_build_attaches_exactly_three_headers() {
        let request = builder("tok-abc").build(()).unwrap();
        let headers = request.headers();

        assert_eq!(headers.len(), 3);
        assert_eq!(headers[AUTHORIZATION_HEADER], "bearer tok-abc");
        assert_eq!(headers[CLIENT_VERSION_HEADER], DEFAULT_CLIENT_VERSION);
        assert!(headers.contains_key(CHECKSUM_HEADER));
    }

    #[test]
    fn test_authorization_keeps_token_verbatim() {
        let token = "eyJhbGciOi.Jpayload_with-chars.sig==";
        let request = builder(token).build("payload").unwrap();

        let value = request.headers()[AUTHORIZATION_HEADER].to_str().unwrap();
        assert_eq!(value.strip_prefix("bearer "), Some(token));
        assert_eq!(*request.message(), "payload");
    }

    #[test]
    fn test_checksum_header_shape() {
        let identity = ClientIdentity {
            client_version: "9.9.9".to_string(),
            machine_id: "machine-xyz".to_string(),
        };
        let builder = AuthRequestBuilder::new(
            Arc::new(StaticCredentials::new(AuthRecord::with_access_token("t"))),
            identity,
        );
        let request = builder.build(()).unwrap();
        let headers = request.headers();

        assert_eq!(headers[CLIENT_VERSION_HEADER], "9.9.9");
        let checksum = headers[CHECKSUM_HEADER].to_str().unwrap();
        let prefix = checksum.strip_suffix("machine-xyz").unwrap();
        assert_eq!(STANDARD.decode(prefix).unwrap().len(), TIMESTAMP_LEN);
    }

    #[test]
    fn test_build_reads_credentials_each_time() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("auth.json");
        let builder = AuthRequestBuilder::new(
            Arc::new(FileCredentials::new(&path)),
            ClientIdentity::default(),
        );

        std::fs::write(&path, r#"{"accessToken": "one"}"#).unwrap();
        let first = builder.build(()).unwrap();
        std::fs::write(&path, r#"{"accessToken": "two"}"#).unwrap();
        let second = builder.build(()).unwrap();

        assert_eq!(first.headers()[AUTHORIZATION_HEADER], "bearer one");
        assert_eq!(second.headers()[AUTHORIZATION_HEADER], "bearer two");
    }

    #[test]
    fn test_build_without_credentials_fails() {
        let tmp = tempdir().unwrap();
        let builder = AuthRequestBuilder::new(
            Arc::new(FileCredentials::new(tmp.path().join("auth.json"))),
            ClientIdentity::default(),
        );

        let err = builder.build(()).unwrap_err();
        assert!(matches!(err, ClientError::CredentialsUnavailable { .. }));
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        let err = builder("bad\ntoken").build(()).unwrap_err();
        assert!(matches!(err, ClientError::CredentialsUnavailable { .. }));
    }

    #[test]
    fn test_unencodable_client_version_is_invalid_input() {
        let builder = AuthRequestBuilder::new(
            Arc::new(StaticCredentials::new(AuthRecord::with_access_token("t"))),
            ClientIdentity {
                client_version: "0.40\n4".to_string(),
                ..ClientIdentity::default()
            },
        );
        let err = builder.build(()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[test]
    fn test_refresh_checksum_keeps_header_count() {
        let mut request = builder("t").build(()).unwrap();
        request.refresh_checksum(&ClientIdentity::default()).unwrap();
        assert_eq!(request.headers().len(), 3);
    }
}
