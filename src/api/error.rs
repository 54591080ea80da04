//! Error types for the RPC client core.

use serde::Deserialize;
use std::error::Error as _;
use thiserror::Error;

/// Connect protocol status codes.
///
/// The backend reports application-level failures with one of these codes,
/// either in a unary error body or in the end-of-stream frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Canceled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl Code {
    /// Parse the wire name of a code (`"unauthenticated"`, ...).
    pub fn from_name(name: &str) -> Self {
        match name {
            "canceled" => Code::Canceled,
            "invalid_argument" => Code::InvalidArgument,
            "deadline_exceeded" => Code::DeadlineExceeded,
            "not_found" => Code::NotFound,
            "already_exists" => Code::AlreadyExists,
            "permission_denied" => Code::PermissionDenied,
            "resource_exhausted" => Code::ResourceExhausted,
            "failed_precondition" => Code::FailedPrecondition,
            "aborted" => Code::Aborted,
            "out_of_range" => Code::OutOfRange,
            "unimplemented" => Code::Unimplemented,
            "internal" => Code::Internal,
            "unavailable" => Code::Unavailable,
            "data_loss" => Code::DataLoss,
            "unauthenticated" => Code::Unauthenticated,
            _ => Code::Unknown,
        }
    }

    /// Code implied by an HTTP status when the body carries no Connect error.
    pub fn from_http_status(http_status: u16) -> Self {
        match http_status {
            400 => Code::Internal,
            401 => Code::Unauthenticated,
            403 => Code::PermissionDenied,
            404 => Code::Unimplemented,
            429 | 502 | 503 | 504 => Code::Unavailable,
            _ => Code::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Code::Canceled => "canceled",
            Code::Unknown => "unknown",
            Code::InvalidArgument => "invalid_argument",
            Code::DeadlineExceeded => "deadline_exceeded",
            Code::NotFound => "not_found",
            Code::AlreadyExists => "already_exists",
            Code::PermissionDenied => "permission_denied",
            Code::ResourceExhausted => "resource_exhausted",
            Code::FailedPrecondition => "failed_precondition",
            Code::Aborted => "aborted",
            Code::OutOfRange => "out_of_range",
            Code::Unimplemented => "unimplemented",
            Code::Internal => "internal",
            Code::Unavailable => "unavailable",
            Code::DataLoss => "data_loss",
            Code::Unauthenticated => "unauthenticated",
        }
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of a Connect error: `{"code": "...", "message": "..."}`.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// An application-level rejection returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcStatus {
    pub code: Code,
    pub message: String,
    /// HTTP status of the response, absent for end-of-stream errors
    pub http_status: Option<u16>,
}

impl RpcStatus {
    /// Decode a non-2xx unary (or stream setup) response body.
    pub fn from_http_response(http_status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                code: Some(code),
                message,
            }) => Self {
                code: Code::from_name(&code),
                message: message.unwrap_or_default(),
                http_status: Some(http_status),
            },
            _ => Self {
                code: Code::from_http_status(http_status),
                message: body.trim().to_string(),
                http_status: Some(http_status),
            },
        }
    }

    pub(super) fn from_error_body(body: ErrorBody) -> Self {
        Self {
            code: body
                .code
                .as_deref()
                .map(Code::from_name)
                .unwrap_or(Code::Unknown),
            message: body.message.unwrap_or_default(),
            http_status: None,
        }
    }

    /// Hint printed by the CLI next to the error.
    pub fn user_hint(&self) -> Option<&'static str> {
        match self.code {
            Code::Unauthenticated => Some(
                "The access token was rejected. Log in with the Cursor editor to refresh \
                 cursor_client/auth.json.",
            ),
            Code::PermissionDenied => Some("This account is not allowed to use this endpoint."),
            Code::ResourceExhausted => Some("Rate limit exceeded. Please wait and try again."),
            Code::FailedPrecondition => {
                Some("The backend may require a newer client version (--client-version).")
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for RpcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.http_status, self.message.is_empty()) {
            (Some(status), true) => write!(f, "{} (HTTP {})", self.code, status),
            (Some(status), false) => {
                write!(f, "{} (HTTP {}): {}", self.code, status, self.message)
            }
            (None, true) => write!(f, "{}", self.code),
            (None, false) => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// Errors surfaced by the client core. None of them are retried.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Credential record missing, unreadable or malformed.
    #[error("credentials unavailable ({location}): {reason}")]
    CredentialsUnavailable { location: String, reason: String },

    /// Network-level failure issuing or reading a call.
    #[error("transport error: {0}")]
    Transport(String),

    /// A stream ended abnormally after `received` messages.
    #[error("stream failed after {received} message(s): {reason}")]
    Stream { received: usize, reason: String },

    /// The backend rejected the call.
    #[error("rejected by backend: {0}")]
    Rejected(RpcStatus),

    /// The backend answered with something that is not the expected message.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A configured value or outgoing message cannot be put on the wire.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ClientError {
    /// The backend status, if this is a rejection.
    pub fn rpc_status(&self) -> Option<&RpcStatus> {
        match self {
            ClientError::Rejected(status) => Some(status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        ClientError::Transport(message)
    }
}
