//! Client events, actions and user notices.

use std::fmt;

use bytes::Bytes;
use touchline_proto::{Frame, payloads::ReportFile};

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Reading bytes (or whole frames) from the broker connection
/// - Forwarding user commands (login, join, report, ...)
/// - Reporting transport outcomes (connect refused, stream closed)
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// User wants to log in.
    Login {
        /// Broker address, `host:port`.
        addr: String,
        /// Username for the CONNECT `login` header.
        username: String,
        /// Password for the CONNECT `passcode` header.
        passcode: String,
    },

    /// User wants to subscribe to a channel.
    Join {
        /// Channel name.
        channel: String,
    },

    /// User wants to leave a channel.
    Exit {
        /// Channel name.
        channel: String,
    },

    /// User wants to publish every event of a loaded report file.
    Report(ReportFile),

    /// User wants to log out.
    Logout,

    /// Raw bytes read from the broker connection.
    ///
    /// Reassembled into frames by the client's decoder.
    BytesReceived(Bytes),

    /// A complete frame received from the broker.
    FrameReceived(Frame),

    /// The connection requested by [`ClientAction::Connect`] failed.
    ConnectFailed {
        /// Transport error text.
        reason: String,
    },

    /// The broker connection closed or failed mid-read.
    TransportClosed {
        /// Transport error text, or a description of the close.
        reason: String,
    },
}

/// Actions the client produces for the caller to execute.
///
/// Actions are ordered. If a [`ClientAction::Connect`] fails, the caller
/// skips the remaining actions of that batch and reports
/// [`ClientEvent::ConnectFailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Open the broker connection.
    Connect {
        /// Broker address, `host:port`.
        addr: String,
    },

    /// Write a frame to the broker.
    Send(Frame),

    /// Write an UNSUBSCRIBE to the broker, then call
    /// [`Client::commit_unsubscribe`](crate::Client::commit_unsubscribe) with
    /// `channel`. If the write fails the binding stays.
    SendUnsubscribe {
        /// Channel being left.
        channel: String,
        /// UNSUBSCRIBE frame.
        frame: Frame,
    },

    /// Show a status line to the user.
    Notify(Notice),

    /// End the session: stop reading input and frames, release the
    /// connection.
    Shutdown {
        /// Why the session ended.
        reason: String,
    },
}

/// User-facing status line.
///
/// `Display` renders the exact console text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// CONNECTED received
    LoginSuccessful,
    /// Login while a session exists
    AlreadyLoggedIn,
    /// Channel operation before login
    LoginRequired,
    /// Logout without a session
    NotLoggedIn,
    /// Broker connection could not be opened
    CouldNotConnect,
    /// Broker connection dropped
    ConnectionLost,
    /// SUBSCRIBE sent
    Joined {
        /// Channel joined
        channel: String,
    },
    /// Exit from a channel that was never joined
    NotSubscribed {
        /// Channel named
        channel: String,
    },
    /// UNSUBSCRIBE sent
    Exited {
        /// Channel left
        channel: String,
    },
    /// All events of a report file sent
    ReportSent,
    /// RECEIPT received
    ReceiptReceived {
        /// `receipt-id` header, verbatim
        receipt_id: String,
    },
    /// ERROR received
    BrokerError {
        /// `message` header
        message: String,
    },
    /// MESSAGE received and stored
    EventReceived {
        /// Reporting user
        user: String,
        /// Channel it arrived on
        channel: String,
    },
    /// Summary requested for an empty history
    NoEvents,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoginSuccessful => f.write_str("Login successful"),
            Self::AlreadyLoggedIn => {
                f.write_str("The client is already logged in, log out before trying again")
            },
            Self::LoginRequired => f.write_str("Must login first"),
            Self::NotLoggedIn => f.write_str("Not logged in"),
            Self::CouldNotConnect => f.write_str("Could not connect to server"),
            Self::ConnectionLost => f.write_str("Connection to server lost"),
            Self::Joined { channel } => write!(f, "Joined channel {channel}"),
            Self::NotSubscribed { channel } => write!(f, "Not subscribed to {channel}"),
            Self::Exited { channel } => write!(f, "Exited channel {channel}"),
            Self::ReportSent => f.write_str("Report sent successfully"),
            Self::ReceiptReceived { receipt_id } => write!(f, "Received RECEIPT for id: {receipt_id}"),
            Self::BrokerError { message } => write!(f, "Error: {message}"),
            Self::EventReceived { user, channel } => {
                write!(f, "Received event from {user} in {channel}")
            },
            Self::NoEvents => f.write_str("No events found for this game and user"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_text() {
        assert_eq!(Notice::LoginSuccessful.to_string(), "Login successful");
        assert_eq!(
            Notice::Joined { channel: "germany_japan".into() }.to_string(),
            "Joined channel germany_japan"
        );
        assert_eq!(
            Notice::ReceiptReceived { receipt_id: "3".into() }.to_string(),
            "Received RECEIPT for id: 3"
        );
        assert_eq!(
            Notice::EventReceived { user: "bob".into(), channel: "a_b".into() }.to_string(),
            "Received event from bob in a_b"
        );
        assert_eq!(Notice::BrokerError { message: "bad login".into() }.to_string(), "Error: bad login");
    }
}
