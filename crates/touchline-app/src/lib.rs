//! Touchline front end
//!
//! Everything between the terminal and the Sans-IO [`touchline_client::Client`]:
//!
//! - [`command`]: one input line → one [`InputCommand`]
//! - [`report`]: JSON game report files → [`ReportFile`](touchline_proto::payloads::ReportFile)
//! - [`summary`]: [`Summary`](touchline_client::Summary) → text file
//! - [`runtime`]: the two tasks (broker frames, user input) sharing one client
//!
//! The `touchline` binary wires these to stdin, stdout and TCP.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod config;
pub mod report;
pub mod runtime;
pub mod summary;

pub use command::{CommandError, InputCommand};
pub use config::RuntimeConfig;
pub use report::ReportError;
pub use runtime::{Runtime, RuntimeError};
pub use summary::SummaryError;
