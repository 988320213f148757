//! Incremental frame splitter for byte streams.
//!
//! The transport delivers arbitrary chunks; frames end at the first `\0`.
//! [`FrameDecoder`] buffers partial data between reads and hands back every
//! complete frame, already parsed.

use bytes::{Buf, BytesMut};

use crate::{
    Frame,
    errors::{ProtocolError, Result},
    frame::TERMINATOR,
};

/// Default upper bound on a single buffered frame (1 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Incremental decoder that handles partial reads.
///
/// Feed bytes via [`FrameDecoder::feed`] and collect complete frames.
///
/// End-of-line bytes between frames (brokers commonly send `\0\n`) are
/// skipped rather than treated as the start of the next frame.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    max_frame_size: usize,
}

impl FrameDecoder {
    /// Create a decoder with [`DEFAULT_MAX_FRAME_SIZE`].
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Create a decoder with a custom frame size limit.
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { buf: BytesMut::new(), max_frame_size }
    }

    /// Feed bytes and extract all complete frames.
    ///
    /// Incomplete data is buffered for the next call.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::FrameTooLarge` if the unterminated remainder grows
    ///   past the limit. The buffer is cleared, so the stream cannot be
    ///   resynchronised; callers treat this as a fatal transport error.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Frame>> {
        self.buf.extend_from_slice(bytes);
        let mut frames = Vec::new();

        loop {
            self.skip_eol();

            let Some(pos) = self.buf.iter().position(|&b| b == TERMINATOR) else {
                break;
            };

            let raw = self.buf.split_to(pos + 1);
            frames.push(Frame::decode(&raw));
        }

        if self.buf.len() > self.max_frame_size {
            let size = self.buf.len();
            self.buf.clear();
            return Err(ProtocolError::FrameTooLarge { size, max: self.max_frame_size });
        }

        Ok(frames)
    }

    /// Returns true if the decoder has buffered partial data.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty()
    }

    fn skip_eol(&mut self) {
        let eol = self.buf.iter().take_while(|&&b| b == b'\n' || b == b'\r').count();
        self.buf.advance(eol);
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Command;

    #[test]
    fn single_frame() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(b"CONNECTED\nversion:1.2\n\n\0").unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, Command::Connected);
        assert_eq!(frames[0].get("version"), Some("1.2"));
        assert!(!decoder.has_partial());
    }

    #[test]
    fn split_across_reads() {
        let mut decoder = FrameDecoder::new();

        assert!(decoder.feed(b"RECEIPT\nrece").unwrap().is_empty());
        assert!(decoder.has_partial());

        let frames = decoder.feed(b"ipt-id:3\n\n\0").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].get("receipt-id"), Some("3"));
        assert!(!decoder.has_partial());
    }

    #[test]
    fn several_frames_in_one_read_with_eol_padding() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder
            .feed(b"CONNECTED\n\n\0\nRECEIPT\nreceipt-id:0\n\n\0\r\nMESSAGE\ndestination:/a_b\n\nx\0")
            .unwrap();

        let commands: Vec<_> = frames.iter().map(|f| f.command.clone()).collect();
        assert_eq!(commands, vec![Command::Connected, Command::Receipt, Command::Message]);
        assert_eq!(frames[2].body, "x");
        assert!(!decoder.has_partial());
    }

    #[test]
    fn eol_only_is_not_partial() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"\n\n").unwrap().is_empty());
        assert!(!decoder.has_partial());
    }

    #[test]
    fn oversized_partial_is_rejected() {
        let mut decoder = FrameDecoder::with_max_frame_size(8);
        let result = decoder.feed(b"MESSAGE\ndestination:/a\n\n");

        assert!(matches!(result, Err(ProtocolError::FrameTooLarge { max: 8, .. })));
        assert!(!decoder.has_partial());
    }
}
