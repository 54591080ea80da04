//! Connect streaming envelopes: `[flags: u8][length: u32 BE][payload]`.

use bytes::{Buf, Bytes, BytesMut};

/// Envelope header length
pub const HEADER_LEN: usize = 5;

/// Payload is compressed
pub const FLAG_COMPRESSED: u8 = 0b01;

/// Final frame of a response stream, carrying trailers and an optional error
pub const FLAG_END_STREAM: u8 = 0b10;

/// A single decoded envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub flags: u8,
    pub payload: Bytes,
}

impl Frame {
    pub fn is_end_stream(&self) -> bool {
        self.flags & FLAG_END_STREAM != 0
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Wrap a payload in an envelope.
pub fn encode(flags: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.push(flags);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Incremental decoder over chunks of a response body.
#[derive(Debug, Default)]
pub struct Decoder {
    buffer: BytesMut,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Bytes received but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Next complete frame, or `None` if more bytes are needed.
    pub fn next_frame(&mut self) -> Option<Frame> {
        if self.buffer.len() < HEADER_LEN {
            return None;
        }

        let flags = self.buffer[0];
        let len = u32::from_be_bytes([
            self.buffer[1],
            self.buffer[2],
            self.buffer[3],
            self.buffer[4],
        ]) as usize;

        if self.buffer.len() < HEADER_LEN + len {
            return None;
        }

        self.buffer.advance(HEADER_LEN);
        let payload = self.buffer.split_to(len).freeze();
        Some(Frame { flags, payload })
    }
}
