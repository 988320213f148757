//! Touchline protocol core
//!
//! The stateful half of the client, kept free of I/O:
//!
//! - [`Session`]: login/logout phase machine that gates channel operations
//! - [`SubscriptionRegistry`]: channel ↔ subscription id bindings, id and
//!   receipt counters, and the book of receipts still outstanding
//! - [`EventAggregator`]: per-(channel, user) event histories and their
//!   chronological summary
//!
//! Callers drive these from a single serialising owner; none of the types
//! synchronise internally.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aggregator;
pub mod error;
pub mod registry;
pub mod session;

pub use aggregator::{EventAggregator, Summary};
pub use error::{LookupError, SessionError};
pub use registry::{PendingReceipt, SubscriptionRegistry};
pub use session::{Session, SessionPhase};
