//! Error types for the protocol core.
//!
//! Two families: session errors (an operation issued in the wrong phase) and
//! lookup errors (a query about a channel or history that does not exist).
//! Neither is fatal; the caller reports them and carries on.

use thiserror::Error;
use touchline_proto::Command;

use crate::session::SessionPhase;

/// Operation rejected by the session state machine.
///
/// Nothing reaches the wire when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Login issued while a session is already established or in progress
    #[error("already logged in")]
    AlreadyLoggedIn,

    /// Channel operation issued before the session reached `Connected`
    #[error("must login first (attempted {operation})")]
    LoginRequired {
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Logout issued without an established session
    #[error("not logged in")]
    NotLoggedIn,

    /// Inbound frame that makes no sense in the current phase
    #[error("unexpected {command} frame in phase {phase:?}")]
    UnexpectedFrame {
        /// Phase when the frame arrived
        phase: SessionPhase,
        /// Command of the offending frame
        command: Command,
    },
}

/// Query about a channel or history that does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Channel has no active subscription
    #[error("not subscribed to {channel}")]
    NotSubscribed {
        /// Channel that was looked up
        channel: String,
    },

    /// No events were ever ingested for this channel and user
    #[error("no events for {user} in {channel}")]
    NoHistory {
        /// Channel that was looked up
        channel: String,
        /// User that was looked up
        user: String,
    },
}
