//! Fuzz target for Frame::decode and report body parsing
//!
//! Both parsers are lenient: any byte sequence must produce a value.
//!
//! # Invariants
//!
//! - Never panics
//! - A decoded frame re-encodes and decodes to the same command
//! - Any body text parses as an event report

#![no_main]

use libfuzzer_sys::fuzz_target;
use touchline_proto::{Frame, payloads::EventReport};

fuzz_target!(|data: &[u8]| {
    let frame = Frame::decode(data);

    let again = Frame::decode(&frame.to_bytes());
    assert_eq!(again.command, frame.command);

    let _ = EventReport::decode_body(&frame.body);
    let _ = EventReport::decode_body(&String::from_utf8_lossy(data));
});
