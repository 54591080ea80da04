//! Server-streaming response consumer.
//!
//! A [`ServerStream`] pulls enveloped messages off a response body one at a
//! time. It moves through `Idle -> Streaming -> Completed | Failed` and never
//! goes back. The body is released as soon as the stream reaches a terminal
//! state, is closed, or is dropped.

use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::marker::PhantomData;
use tracing::debug;

use super::envelope::{Decoder, Frame};
use super::error::{ClientError, ErrorBody, RpcStatus};

/// Raw response body chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// Lifecycle of a [`ServerStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Nothing read yet
    Idle,
    /// At least one `advance` call made, end not reached
    Streaming,
    /// Clean end of stream
    Completed,
    /// Transport, protocol or backend error; see [`ServerStream::err`]
    Failed,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamState::Completed | StreamState::Failed)
    }
}

/// End-of-stream frame payload.
#[derive(Debug, Default, Deserialize)]
struct EndStreamMessage {
    #[serde(default)]
    error: Option<ErrorBody>,
}

/// Pull-based consumer of a server-streaming call.
pub struct ServerStream<M> {
    source: Option<ByteStream>,
    decoder: Decoder,
    state: StreamState,
    current: Option<M>,
    error: Option<ClientError>,
    error_reported: bool,
    received: usize,
    _message: PhantomData<fn() -> M>,
}

impl<M: DeserializeOwned> ServerStream<M> {
    /// Consume messages from a response body.
    pub fn new(source: ByteStream) -> Self {
        Self {
            source: Some(source),
            decoder: Decoder::new(),
            state: StreamState::Idle,
            current: None,
            error: None,
            error_reported: false,
            received: 0,
            _message: PhantomData,
        }
    }

    /// Convenience for anything that yields body chunks.
    pub fn from_chunks<S>(chunks: S) -> Self
    where
        S: Stream<Item = Result<Bytes, ClientError>> + Send + 'static,
    {
        Self::new(chunks.boxed())
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Number of messages decoded so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Move to the next message. Returns `false` once the stream has ended;
    /// [`err`](Self::err) then tells a clean end from a failure.
    pub async fn advance(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = StreamState::Streaming;
        self.current = None;

        loop {
            if let Some(frame) = self.decoder.next_frame() {
                return self.handle_frame(frame);
            }

            let Some(source) = self.source.as_mut() else {
                self.fail_stream("response body already released");
                return false;
            };

            match source.next().await {
                Some(Ok(chunk)) => self.decoder.push(&chunk),
                Some(Err(err)) => {
                    self.fail_stream(&err.to_string());
                    return false;
                }
                None => {
                    let reason = if self.decoder.buffered() > 0 {
                        "response body ended inside a frame"
                    } else {
                        "response body ended without an end-of-stream frame"
                    };
                    self.fail_stream(reason);
                    return false;
                }
            }
        }
    }

    /// The message produced by the last successful [`advance`](Self::advance).
    pub fn current(&self) -> Option<&M> {
        self.current.as_ref()
    }

    /// The error that ended the stream, if it failed.
    pub fn err(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    /// Stop consuming and release the response body.
    ///
    /// Has no effect once the stream has already ended.
    pub fn close(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        debug!("Stream closed by caller after {} message(s)", self.received);
        self.fail_stream("closed by caller");
    }

    /// Next message as an owned value, then the terminal error (once), then `None`.
    pub async fn next_message(&mut self) -> Option<Result<M, ClientError>> {
        if self.advance().await {
            return self.current.take().map(Ok);
        }
        match &self.error {
            Some(err) if !self.error_reported => {
                self.error_reported = true;
                Some(Err(err.clone()))
            }
            _ => None,
        }
    }

    /// Adapt into a [`Stream`] of messages ending with at most one error.
    pub fn into_stream(self) -> impl Stream<Item = Result<M, ClientError>> + Send
    where
        M: Send + 'static,
    {
        futures_util::stream::unfold(self, |mut stream| async move {
            stream.next_message().await.map(|item| (item, stream))
        })
    }

    /// Drain the stream, returning every message or the first error.
    pub async fn collect_messages(mut self) -> Result<Vec<M>, ClientError> {
        let mut messages = Vec::new();
        while let Some(item) = self.next_message().await {
            messages.push(item?);
        }
        Ok(messages)
    }

    fn handle_frame(&mut self, frame: Frame) -> bool {
        if frame.is_compressed() {
            self.fail(ClientError::MalformedResponse(
                "received a compressed frame but no compression was negotiated".to_string(),
            ));
            return false;
        }

        if frame.is_end_stream() {
            return self.handle_end_stream(&frame.payload);
        }

        match serde_json::from_slice::<M>(&frame.payload) {
            Ok(message) => {
                self.received += 1;
                self.current = Some(message);
                true
            }
            Err(e) => {
                self.fail(ClientError::MalformedResponse(format!(
                    "failed to decode stream message {}: {}",
                    self.received + 1,
                    e
                )));
                false
            }
        }
    }

    fn handle_end_stream(&mut self, payload: &[u8]) -> bool {
        let end: EndStreamMessage = if payload.is_empty() {
            EndStreamMessage::default()
        } else {
            match serde_json::from_slice(payload) {
                Ok(end) => end,
                Err(e) => {
                    self.fail(ClientError::MalformedResponse(format!(
                        "failed to decode end-of-stream frame: {}",
                        e
                    )));
                    return false;
                }
            }
        };

        match end.error {
            Some(error) => self.fail(ClientError::Rejected(RpcStatus::from_error_body(error))),
            None => {
                debug!("Stream completed after {} message(s)", self.received);
                self.state = StreamState::Completed;
                self.source = None;
            }
        }
        false
    }

    fn fail_stream(&mut self, reason: &str) {
        self.fail(ClientError::Stream {
            received: self.received,
            reason: reason.to_string(),
        });
    }

    fn fail(&mut self, error: ClientError) {
        debug!("Stream failed: {}", error);
        self.state = StreamState::Failed;
        self.current = None;
        self.error = Some(error);
        self.source = None;
    }
}

impl<M> std::fmt::Debug for ServerStream<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerStream")
            .field("state", &self.state)
            .field("received", &self.received)
            .field("error", &self.error)
            .finish()
    }
}
