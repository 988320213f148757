//! Frame command vocabulary.

use std::{fmt, str::FromStr};

use crate::errors::ProtocolError;

/// Command token on the first line of every frame.
///
/// The protocol uses a fixed vocabulary. [`Command::Other`] exists only so
/// that lenient parsing can carry whatever text the peer sent (including the
/// empty string for a frame with no newline) without failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Client login request
    Connect,
    /// Broker accepted the login
    Connected,
    /// Join a channel
    Subscribe,
    /// Leave a channel
    Unsubscribe,
    /// Publish to a channel
    Send,
    /// Delivery of a message published on a subscribed channel
    Message,
    /// Acknowledgement of a frame that carried a `receipt` header
    Receipt,
    /// Broker-side failure, fatal for the session
    Error,
    /// Graceful logout
    Disconnect,
    /// Unrecognised command text, kept verbatim
    Other(String),
}

impl Command {
    /// Wire token for this command.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connect => "CONNECT",
            Self::Connected => "CONNECTED",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Send => "SEND",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
            Self::Disconnect => "DISCONNECT",
            Self::Other(text) => text,
        }
    }

    /// Map a wire token to a command, falling back to [`Command::Other`].
    pub fn from_token(token: &str) -> Self {
        token.parse().unwrap_or_else(|_| Self::Other(token.to_string()))
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" => Ok(Self::Connect),
            "CONNECTED" => Ok(Self::Connected),
            "SUBSCRIBE" => Ok(Self::Subscribe),
            "UNSUBSCRIBE" => Ok(Self::Unsubscribe),
            "SEND" => Ok(Self::Send),
            "MESSAGE" => Ok(Self::Message),
            "RECEIPT" => Ok(Self::Receipt),
            "ERROR" => Ok(Self::Error),
            "DISCONNECT" => Ok(Self::Disconnect),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
