//! Client core for the Cursor AI backend.
//!
//! - [`api`]: Connect RPC transport, authenticated request building, service
//!   clients and the server-stream consumer
//! - [`checksum`]: the `x-cursor-checksum` header value
//! - [`credentials`]: loading the persisted auth record
//! - [`config`]: overridable hosts and client identity
//! - [`login`]: experimental login-flow helpers

pub mod api;
pub mod checksum;
pub mod config;
pub mod credentials;
pub mod login;
