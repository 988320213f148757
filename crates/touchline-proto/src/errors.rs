//! Protocol error types.

use thiserror::Error;

/// Convenience alias for protocol results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised by the wire layer.
///
/// Parsing a single frame never fails (see [`crate::Frame::decode`]); these
/// cover the strict entry points and stream reassembly limits.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffered bytes exceed the frame size limit without a terminator.
    #[error("frame too large: {size} bytes buffered without terminator (max {max})")]
    FrameTooLarge {
        /// Bytes buffered so far
        size: usize,
        /// Configured limit
        max: usize,
    },

    /// Command token outside the supported vocabulary.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
}
