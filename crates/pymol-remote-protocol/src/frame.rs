//! Delimiter-free framing.
//!
//! Messages carry no length prefix, so completeness is detected by parsing:
//! the decoder accumulates bytes and yields the first JSON value that parses
//! in full. This is only sound while a single request is in flight and the
//! peer writes exactly one message per request.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Result of attempting to decode the buffered bytes.
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded<T> {
    /// A complete message was parsed.
    Complete {
        /// The decoded message.
        message: T,
        /// Count of buffered bytes after the message, excluding whitespace.
        trailing: usize,
    },
    /// The buffered bytes are a prefix of a message; more input is needed.
    Incomplete,
}

/// Errors raised when buffered bytes can never form a valid message.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The bytes are not valid JSON, or not a record of the expected shape.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Accumulates received bytes until they form one complete message.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Appends received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Returns the number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true when nothing has been buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discards buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Attempts to decode the first message in the buffer.
    ///
    /// Input that ends before a value is complete, including a multi-byte
    /// character split across reads, is reported as [`Decoded::Incomplete`].
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Malformed`] when the buffered bytes cannot be
    /// extended into a valid message.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Decoded<T>, FrameError> {
        let mut stream = serde_json::Deserializer::from_slice(&self.buffer).into_iter::<T>();
        match stream.next() {
            None => Ok(Decoded::Incomplete),
            Some(Err(error)) if error.is_eof() => Ok(Decoded::Incomplete),
            Some(Err(error)) => Err(FrameError::Malformed(error)),
            Some(Ok(message)) => {
                let consumed = stream.byte_offset();
                let trailing = self
                    .buffer
                    .get(consumed..)
                    .map_or(0, |rest| {
                        rest.iter().filter(|byte| !byte.is_ascii_whitespace()).count()
                    });
                Ok(Decoded::Complete { message, trailing })
            }
        }
    }
}
