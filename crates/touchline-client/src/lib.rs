//! Client
//!
//! Action-based client state machine for the touchline protocol. Manages the
//! login session, channel subscriptions and the event store.
//!
//! # Architecture
//!
//! The client follows the same Sans-IO and action-based patterns as
//! [`touchline_core`]. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`]) for
//! the caller to execute.
//!
//! # Components
//!
//! - [`Client`]: Top-level state machine
//! - [`ClientEvent`]: Events fed into the client
//! - [`ClientAction`]: Actions produced by the client
//! - [`Notice`]: User-facing status lines
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::Connector`]: Opens the byte stream to a broker
//! - [`transport::TcpConnector`]: Plain TCP connector

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;
mod event;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::{Client, ClientConfig, DEFAULT_ACCEPT_VERSION, DEFAULT_HOST};
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent, Notice};
pub use touchline_core::{SessionPhase, Summary};
