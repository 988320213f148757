//! Fuzz target for FrameDecoder chunk boundaries
//!
//! The transport may split the stream anywhere. Splitting must not change
//! which frames come out.
//!
//! # Invariants
//!
//! - Never panics
//! - Chunked feeding yields exactly the frames of a single feed
//! - Overflow is reported as `ProtocolError::FrameTooLarge`, never a panic

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use touchline_proto::{FrameDecoder, ProtocolError};

#[derive(Debug, Arbitrary)]
struct Input {
    stream: Vec<u8>,
    cuts: Vec<u8>,
    small_limit: bool,
}

fuzz_target!(|input: Input| {
    let limit = if input.small_limit { 64 } else { 1 << 20 };

    let mut whole = FrameDecoder::with_max_frame_size(limit);
    let expected = whole.feed(&input.stream);

    let mut chunked = FrameDecoder::with_max_frame_size(limit);
    let mut frames = Vec::new();
    let mut rest = input.stream.as_slice();
    let mut overflowed = false;

    for cut in input.cuts.iter().map(|&c| usize::from(c)) {
        if rest.is_empty() {
            break;
        }
        let (chunk, tail) = rest.split_at(cut.min(rest.len()));
        rest = tail;

        match chunked.feed(chunk) {
            Ok(batch) => frames.extend(batch),
            Err(ProtocolError::FrameTooLarge { size, max }) => {
                assert!(size > max);
                overflowed = true;
                break;
            },
            Err(other) => panic!("unexpected decoder error: {other}"),
        }
    }

    if !overflowed {
        match chunked.feed(rest) {
            Ok(batch) => frames.extend(batch),
            Err(_) => overflowed = true,
        }
    }

    // Small chunks can stay under the limit where one big feed did not
    if let (Ok(expected), false) = (expected, overflowed) {
        assert_eq!(frames, expected);
    }
});
