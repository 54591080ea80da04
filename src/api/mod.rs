//! RPC client for the Cursor backend.
//!
//! Calls use the Connect protocol with the JSON codec. Every request carries
//! a bearer token, the emulated client version and a checksum header.

mod envelope;
mod error;
mod request;
mod service;
mod stream;
mod transport;
mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ClientError, Code, RpcStatus};
pub use request::{
    AuthRequestBuilder, ClientIdentity, OutgoingRequest, RequestBuilder, AUTHORIZATION_HEADER,
    CHECKSUM_HEADER, CLIENT_VERSION_HEADER, DEFAULT_CLIENT_VERSION, DEFAULT_MACHINE_ID,
};
pub use service::{
    AiServiceClient, ClientFactory, RepositoryServiceClient, ServiceClient, ServiceKind,
    DEFAULT_AI_BASE_URL, DEFAULT_REPOSITORY_BASE_URL,
};
pub use stream::{ByteStream, ServerStream, StreamState};
pub use transport::{CallOptions, ConnectTransport};
pub use types::{
    AvailableModelsResponse, ConversationMessage, GetChatRequest, LoginResponse, MessageType,
    ModelDetails, PollLoginResponse, StreamChatResponse,
};
