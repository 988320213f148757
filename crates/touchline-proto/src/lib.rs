//! Touchline wire protocol
//!
//! Text frames exchanged with the message broker, and the line-oriented event
//! report format carried in SEND/MESSAGE bodies. Everything here is pure: no
//! sockets, no clocks, no logging.
//!
//! # Wire Format
//!
//! ```text
//! COMMAND\n
//! name:value\n      (zero or more)
//! \n
//! body\0
//! ```
//!
//! # Components
//!
//! - [`Frame`]: command + ordered headers + body, with build and lenient parse
//! - [`FrameDecoder`]: splits a byte stream into `\0`-terminated frames
//! - [`payloads::report`]: the event report body carried in SEND/MESSAGE

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod decoder;
pub mod errors;
pub mod frame;
pub mod headers;
pub mod payloads;

pub use command::Command;
pub use decoder::{DEFAULT_MAX_FRAME_SIZE, FrameDecoder};
pub use errors::{ProtocolError, Result};
pub use frame::{Frame, channel_of, destination};
pub use headers::Headers;
