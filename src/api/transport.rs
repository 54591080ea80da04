use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use super::envelope;
use super::error::{ClientError, RpcStatus};
use super::request::OutgoingRequest;
use super::stream::ServerStream;

/// Connect protocol version header
const PROTOCOL_VERSION_HEADER: &str = "connect-protocol-version";

const UNARY_CONTENT_TYPE: &str = "application/json";
const STREAM_CONTENT_TYPE: &str = "application/connect+json";

/// Default User-Agent (from Cargo.toml)
const DEFAULT_USER_AGENT: &str = concat!("cursor-client/", env!("CARGO_PKG_VERSION"));

/// Per-call options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Upper bound for the whole call, including reading a streamed body
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// HTTP transport speaking the Connect protocol with the JSON codec.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Clone)]
pub struct ConnectTransport {
    client: Client,
    default_options: CallOptions,
}

impl ConnectTransport {
    /// Create a transport. `default_timeout` applies to calls that set no timeout.
    pub fn new(default_timeout: Option<Duration>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self::from_client(
            client,
            CallOptions {
                timeout: default_timeout,
            },
        ))
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client, default_options: CallOptions) -> Self {
        Self {
            client,
            default_options,
        }
    }

    /// `<base>/<service>/<method>`
    pub fn procedure_url(base_url: &Url, service: &str, method: &str) -> Result<Url, ClientError> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&format!("{}/{}", service, method))
            .map_err(|e| ClientError::InvalidInput(format!("invalid procedure URL: {}", e)))
    }

    fn post(
        &self,
        url: Url,
        headers: HeaderMap,
        content_type: &'static str,
        body: Vec<u8>,
        options: CallOptions,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .post(url)
            .headers(headers)
            .header(CONTENT_TYPE, HeaderValue::from_static(content_type))
            .header(PROTOCOL_VERSION_HEADER, HeaderValue::from_static("1"))
            .body(body);

        if let Some(timeout) = options.timeout.or(self.default_options.timeout) {
            request = request.timeout(timeout);
        }
        request
    }

    /// Issue a unary call and decode the response message.
    pub async fn unary<Req, Resp>(
        &self,
        url: Url,
        request: OutgoingRequest<Req>,
        options: CallOptions,
    ) -> Result<Resp, ClientError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let (message, headers) = request.into_parts();
        let body = serde_json::to_vec(&message).map_err(encode_error)?;

        debug!("=== Unary Request ===");
        debug!("URL: {}", url);

        let response = self
            .post(url.clone(), headers, UNARY_CONTENT_TYPE, body, options)
            .send()
            .await?;

        let status = response.status();
        debug!("=== Unary Response ===");
        debug!("Status: {}", status);

        if !status.is_success() {
            return Err(rejection(response).await);
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::MalformedResponse(format!("failed to parse response from {}: {}", url, e))
        })
    }

    /// Issue a server-streaming call. Messages are read lazily from the returned stream.
    pub async fn server_stream<Req, Resp>(
        &self,
        url: Url,
        request: OutgoingRequest<Req>,
        options: CallOptions,
    ) -> Result<ServerStream<Resp>, ClientError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let (message, headers) = request.into_parts();
        let payload = serde_json::to_vec(&message).map_err(encode_error)?;
        let body = envelope::encode(0, &payload);

        debug!("=== Stream Request ===");
        debug!("URL: {}", url);

        let response = self
            .post(url, headers, STREAM_CONTENT_TYPE, body, options)
            .send()
            .await?;

        let status = response.status();
        debug!("=== Stream Response ===");
        debug!("Status: {}", status);

        if !status.is_success() {
            return Err(rejection(response).await);
        }

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from));
        Ok(ServerStream::from_chunks(chunks))
    }

    /// Plain unauthenticated GET, returning only the HTTP status.
    pub async fn get_status(&self, url: Url, options: CallOptions) -> Result<u16, ClientError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = options.timeout.or(self.default_options.timeout) {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        debug!("GET status: {}", status);
        Ok(status)
    }
}

impl std::fmt::Debug for ConnectTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectTransport")
            .field("default_options", &self.default_options)
            .finish()
    }
}

fn encode_error(err: serde_json::Error) -> ClientError {
    ClientError::InvalidInput(format!("failed to encode request: {}", err))
}

/// Turn a non-2xx response into a rejection.
async fn rejection(response: reqwest::Response) -> ClientError {
    let http_status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let status = RpcStatus::from_http_response(http_status, &body);
    error!("Call rejected: {}", status);
    ClientError::Rejected(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procedure_url() {
        let base = Url::parse("https://api2.cursor.sh").unwrap();
        let url =
            ConnectTransport::procedure_url(&base, "aiserver.v1.AiService", "AvailableModels")
                .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api2.cursor.sh/aiserver.v1.AiService/AvailableModels"
        );
    }

    #[test]
    fn test_procedure_url_keeps_base_path() {
        let base = Url::parse("http://127.0.0.1:8080/proxy").unwrap();
        let url = ConnectTransport::procedure_url(&base, "svc.S", "M").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/proxy/svc.S/M");

        let base = Url::parse("http://127.0.0.1:8080/proxy/").unwrap();
        let url = ConnectTransport::procedure_url(&base, "svc.S", "M").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/proxy/svc.S/M");
    }

    #[test]
    fn test_user_agent() {
        assert!(DEFAULT_USER_AGENT.starts_with("cursor-client/"));
    }
}
