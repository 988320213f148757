//! Session phase state machine.
//!
//! Tracks where the client is in its login lifecycle and decides which
//! operations may be issued. Pure: the caller reports what was sent and what
//! arrived; the session answers with a transition or a rejection.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐  login   ┌────────────┐  CONNECTED  ┌───────────┐
//! │ Disconnected │─────────>│ Connecting │────────────>│ Connected │
//! └──────────────┘          └────────────┘             └───────────┘
//!     ↑     ↑   RECEIPT          │   ↑       logout          │
//!     │     └──(disconnect)──────┘   └───────────────────────┤
//!     │                                                      │
//!     └───────────────── ERROR / transport lost ─────────────┘
//! ```
//!
//! `Connecting` covers both legs that wait on the broker: the CONNECT
//! handshake and the DISCONNECT receipt. Which one is pending is recorded in
//! [`Session::pending_disconnect`].

use touchline_proto::Command;
use tracing::{debug, info};

use crate::error::SessionError;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No session; login is the only legal operation
    #[default]
    Disconnected,
    /// CONNECT sent and awaiting CONNECTED, or DISCONNECT sent and awaiting
    /// its receipt
    Connecting,
    /// CONNECTED received; channel operations are legal
    Connected,
}

/// Client session.
///
/// Owns the authenticated username and the phase. Created once per client
/// and reused across logins.
#[derive(Debug, Clone, Default)]
pub struct Session {
    phase: SessionPhase,
    username: Option<String>,
    pending_disconnect: Option<u64>,
}

impl Session {
    /// Create a session in [`SessionPhase::Disconnected`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Username given at login. `None` while disconnected.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Receipt id of the outstanding DISCONNECT, if a logout is in flight.
    pub fn pending_disconnect(&self) -> Option<u64> {
        self.pending_disconnect
    }

    /// Check if the session is established.
    pub fn is_connected(&self) -> bool {
        self.phase == SessionPhase::Connected
    }

    /// Record that CONNECT is about to be issued.
    ///
    /// # Errors
    ///
    /// - `SessionError::AlreadyLoggedIn` unless `Disconnected`
    pub fn begin_login(&mut self, username: &str) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Disconnected {
            return Err(SessionError::AlreadyLoggedIn);
        }

        self.phase = SessionPhase::Connecting;
        self.username = Some(username.to_string());
        debug!(username, "login started");
        Ok(())
    }

    /// Handle an inbound CONNECTED.
    ///
    /// # Errors
    ///
    /// - `SessionError::UnexpectedFrame` unless a CONNECT is awaiting its
    ///   reply. The phase is left unchanged.
    pub fn on_connected(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Connecting || self.pending_disconnect.is_some() {
            return Err(SessionError::UnexpectedFrame {
                phase: self.phase,
                command: Command::Connected,
            });
        }

        self.phase = SessionPhase::Connected;
        info!(username = self.username.as_deref().unwrap_or_default(), "session established");
        Ok(())
    }

    /// Gate a channel operation. Returns the username on success.
    ///
    /// # Errors
    ///
    /// - `SessionError::LoginRequired` unless `Connected`
    pub fn require_connected(&self, operation: &'static str) -> Result<&str, SessionError> {
        match (&self.phase, &self.username) {
            (SessionPhase::Connected, Some(username)) => Ok(username.as_str()),
            _ => Err(SessionError::LoginRequired { operation }),
        }
    }

    /// Record that DISCONNECT with receipt `receipt_id` is about to be issued.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotLoggedIn` unless `Connected`
    pub fn begin_logout(&mut self, receipt_id: u64) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Connected {
            return Err(SessionError::NotLoggedIn);
        }

        self.phase = SessionPhase::Connecting;
        self.pending_disconnect = Some(receipt_id);
        debug!(receipt_id, "logout started");
        Ok(())
    }

    /// Handle an inbound RECEIPT.
    ///
    /// Returns true if it acknowledged the pending DISCONNECT, in which case
    /// the session is now `Disconnected`. Other receipts leave the phase alone.
    pub fn on_receipt(&mut self, receipt_id: u64) -> bool {
        if self.pending_disconnect != Some(receipt_id) {
            return false;
        }

        info!(receipt_id, "logout acknowledged");
        self.reset();
        true
    }

    /// Handle an inbound ERROR. Always ends the session.
    pub fn on_error(&mut self) {
        info!(phase = ?self.phase, "session ended by broker error");
        self.reset();
    }

    /// End the session after a transport failure or refused connect.
    pub fn abort(&mut self) {
        if self.phase != SessionPhase::Disconnected {
            debug!(phase = ?self.phase, "session aborted");
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.phase = SessionPhase::Disconnected;
        self.username = None;
        self.pending_disconnect = None;
    }
}
