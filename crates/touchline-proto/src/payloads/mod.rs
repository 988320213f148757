//! Application payloads carried in frame bodies.
//!
//! Frames themselves are untyped text. The only structured body the client
//! exchanges is the game event report, published with SEND and delivered
//! back with MESSAGE.

pub mod report;

pub use report::{Event, EventReport, ReportFile, Updates};
