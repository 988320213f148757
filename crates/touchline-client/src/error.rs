//! Client error types.

use thiserror::Error;
use touchline_core::{LookupError, SessionError};
use touchline_proto::ProtocolError;

use crate::event::Notice;

/// Errors returned by [`Client::handle`](crate::Client::handle).
///
/// Most are rejections of a user command that never reached the wire. Only
/// [`ClientError::Protocol`] means the inbound stream itself is broken.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Operation not legal in the current session phase
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Unknown channel or empty history
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Inbound byte stream could not be reassembled into frames
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// Returns true if the session cannot continue after this error.
    ///
    /// A broken inbound stream cannot be resynchronised. Everything else is
    /// reported and the client carries on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Status line to show the user, if the error is user-facing.
    ///
    /// Unexpected inbound frames are only logged.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Session(SessionError::AlreadyLoggedIn) => Some(Notice::AlreadyLoggedIn),
            Self::Session(SessionError::LoginRequired { .. }) => Some(Notice::LoginRequired),
            Self::Session(SessionError::NotLoggedIn) => Some(Notice::NotLoggedIn),
            Self::Session(SessionError::UnexpectedFrame { .. }) => None,
            Self::Lookup(LookupError::NotSubscribed { channel }) => {
                Some(Notice::NotSubscribed { channel: channel.clone() })
            },
            Self::Lookup(LookupError::NoHistory { .. }) => Some(Notice::NoEvents),
            Self::Protocol(_) => Some(Notice::ConnectionLost),
        }
    }
}
