//! Service clients bound to backend base URLs.
//!
//! [`ClientFactory`] owns one [`ConnectTransport`] and hands out cheap clients
//! for each logical service. Every call goes through the factory's
//! [`AuthRequestBuilder`], so each request carries fresh credentials and a
//! fresh checksum.

use url::Url;

use super::error::ClientError;
use super::request::{AuthRequestBuilder, RequestBuilder};
use super::stream::ServerStream;
use super::transport::{CallOptions, ConnectTransport};
use super::types::{
    AvailableModelsRequest, AvailableModelsResponse, GetChatRequest, LoginRequest, LoginResponse,
    PollLoginRequest, PollLoginResponse, StreamChatResponse,
};

/// Primary API host (inference, models)
pub const DEFAULT_AI_BASE_URL: &str = "https://api2.cursor.sh";

/// Repository host, only used by the login flow
pub const DEFAULT_REPOSITORY_BASE_URL: &str = "https://repo42.cursor.sh";

/// Logical backend services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Ai,
    Repository,
}

impl ServiceKind {
    /// Fully-qualified protobuf service name
    pub fn service_name(&self) -> &'static str {
        match self {
            ServiceKind::Ai => "aiserver.v1.AiService",
            ServiceKind::Repository => "aiserver.v1.RepositoryService",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ServiceKind::Ai => DEFAULT_AI_BASE_URL,
            ServiceKind::Repository => DEFAULT_REPOSITORY_BASE_URL,
        }
    }
}

/// A stateless handle bound to one service at one base URL.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    kind: ServiceKind,
    base_url: Url,
    transport: ConnectTransport,
    requests: AuthRequestBuilder,
}

impl ServiceClient {
    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn procedure_url(&self, method: &str) -> Result<Url, ClientError> {
        ConnectTransport::procedure_url(&self.base_url, self.kind.service_name(), method)
    }

    /// Call a unary method with an authenticated request.
    pub async fn call_unary<Req, Resp>(
        &self,
        method: &str,
        message: Req,
        options: CallOptions,
    ) -> Result<Resp, ClientError>
    where
        Req: serde::Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let url = self.procedure_url(method)?;
        let request = self.requests.build(message)?;
        self.transport.unary(url, request, options).await
    }

    /// Open a server-streaming method with an authenticated request.
    pub async fn call_server_stream<Req, Resp>(
        &self,
        method: &str,
        message: Req,
        options: CallOptions,
    ) -> Result<ServerStream<Resp>, ClientError>
    where
        Req: serde::Serialize,
        Resp: serde::de::DeserializeOwned,
    {
        let url = self.procedure_url(method)?;
        let request = self.requests.build(message)?;
        self.transport.server_stream(url, request, options).await
    }
}

/// Builds service clients sharing one transport and one request builder.
#[derive(Debug, Clone)]
pub struct ClientFactory {
    transport: ConnectTransport,
    requests: AuthRequestBuilder,
}

impl ClientFactory {
    pub fn new(transport: ConnectTransport, requests: AuthRequestBuilder) -> Self {
        Self {
            transport,
            requests,
        }
    }

    /// Client for `kind` at `base_url`, or at the service's default host.
    pub fn new_client(
        &self,
        kind: ServiceKind,
        base_url: Option<&str>,
    ) -> Result<ServiceClient, ClientError> {
        let raw = base_url.unwrap_or_else(|| kind.default_base_url());
        let base_url = Url::parse(raw)
            .map_err(|e| ClientError::InvalidInput(format!("invalid base URL {}: {}", raw, e)))?;

        Ok(ServiceClient {
            kind,
            base_url,
            transport: self.transport.clone(),
            requests: self.requests.clone(),
        })
    }

    pub fn ai(&self, base_url: Option<&str>) -> Result<AiServiceClient, ClientError> {
        self.new_client(ServiceKind::Ai, base_url)
            .map(AiServiceClient)
    }

    pub fn repository(
        &self,
        base_url: Option<&str>,
    ) -> Result<RepositoryServiceClient, ClientError> {
        self.new_client(ServiceKind::Repository, base_url)
            .map(RepositoryServiceClient)
    }
}

/// Typed client for `aiserver.v1.AiService`.
#[derive(Debug, Clone)]
pub struct AiServiceClient(ServiceClient);

impl AiServiceClient {
    pub fn inner(&self) -> &ServiceClient {
        &self.0
    }

    /// Names of the models the account may use, in backend order.
    pub async fn available_models(&self, options: CallOptions) -> Result<Vec<String>, ClientError> {
        let response: AvailableModelsResponse = self
            .0
            .call_unary("AvailableModels", AvailableModelsRequest::default(), options)
            .await?;
        Ok(response.model_names)
    }

    /// Start a streamed chat completion.
    pub async fn stream_chat(
        &self,
        request: GetChatRequest,
        options: CallOptions,
    ) -> Result<ServerStream<StreamChatResponse>, ClientError> {
        self.0
            .call_server_stream("StreamChat", request, options)
            .await
    }
}

/// Typed client for `aiserver.v1.RepositoryService`.
///
/// Only used by the experimental login commands; the challenge/response
/// these calls belong to is not understood yet.
#[derive(Debug, Clone)]
pub struct RepositoryServiceClient(ServiceClient);

impl RepositoryServiceClient {
    pub fn inner(&self) -> &ServiceClient {
        &self.0
    }

    pub async fn login_user(&self, options: CallOptions) -> Result<LoginResponse, ClientError> {
        self.0
            .call_unary("LoginUser", LoginRequest::default(), options)
            .await
    }

    pub async fn poll_logged_in(
        &self,
        options: CallOptions,
    ) -> Result<PollLoginResponse, ClientError> {
        self.0
            .call_unary("PollLoggedIn", PollLoginRequest::default(), options)
            .await
    }
}
