//! Client state machine.
//!
//! The `Client` owns the session, the subscription registry and the event
//! store, and turns user commands and broker frames into actions. It never
//! touches a socket: the caller executes the returned actions.

use touchline_core::{
    EventAggregator, PendingReceipt, Session, SessionError, SessionPhase, Summary,
    SubscriptionRegistry,
};
use touchline_proto::{
    Command, Frame, FrameDecoder, channel_of,
    decoder::DEFAULT_MAX_FRAME_SIZE,
    headers::names,
    payloads::{EventReport, ReportFile},
};
use tracing::{debug, info, warn};

use crate::{
    error::ClientError,
    event::{ClientAction, ClientEvent, Notice},
};

/// Protocol version offered in CONNECT.
pub const DEFAULT_ACCEPT_VERSION: &str = "1.2";

/// Virtual host named in CONNECT.
pub const DEFAULT_HOST: &str = "stomp.cs.bgu.ac.il";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `accept-version` header of CONNECT
    pub accept_version: String,
    /// `host` header of CONNECT
    pub host: String,
    /// Largest inbound frame the decoder buffers
    pub max_frame_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            accept_version: DEFAULT_ACCEPT_VERSION.to_string(),
            host: DEFAULT_HOST.to_string(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Client for interacting with a touchline broker.
#[derive(Debug)]
pub struct Client {
    config: ClientConfig,

    /// Login phase and username.
    session: Session,

    /// Channel bindings and outstanding receipts.
    registry: SubscriptionRegistry,

    /// Every event sent or received, by channel and reporting user.
    events: EventAggregator,

    /// Reassembles frames from [`ClientEvent::BytesReceived`].
    decoder: FrameDecoder,
}

impl Client {
    /// Create a disconnected client.
    pub fn new(config: ClientConfig) -> Self {
        let decoder = FrameDecoder::with_max_frame_size(config.max_frame_size);
        Self {
            config,
            session: Session::new(),
            registry: SubscriptionRegistry::new(),
            events: EventAggregator::new(),
            decoder,
        }
    }

    /// Current session phase.
    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// Username of the current session. `None` while disconnected.
    pub fn username(&self) -> Option<&str> {
        self.session.username()
    }

    /// Check if `channel` has an active subscription.
    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.registry.is_subscribed(channel)
    }

    /// Subscription id bound to `channel`.
    pub fn subscription_id(&self, channel: &str) -> Option<u64> {
        self.registry.id_for(channel)
    }

    /// Event store.
    pub fn events(&self) -> &EventAggregator {
        &self.events
    }

    /// Process an event and return resulting actions.
    pub fn handle(&mut self, event: ClientEvent) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Login { addr, username, passcode } => {
                self.handle_login(addr, &username, &passcode)
            },
            ClientEvent::Join { channel } => self.handle_join(channel),
            ClientEvent::Exit { channel } => self.handle_exit(channel),
            ClientEvent::Report(report) => self.handle_report(report),
            ClientEvent::Logout => self.handle_logout(),
            ClientEvent::BytesReceived(bytes) => self.handle_bytes(&bytes),
            ClientEvent::FrameReceived(frame) => self.handle_frame(frame),
            ClientEvent::ConnectFailed { reason } => Ok(self.handle_connect_failed(&reason)),
            ClientEvent::TransportClosed { reason } => Ok(self.handle_transport_closed(reason)),
        }
    }

    /// Drop the binding for `channel` once its UNSUBSCRIBE was written.
    ///
    /// Returns the notice to show, `None` if the channel was not bound.
    pub fn commit_unsubscribe(&mut self, channel: &str) -> Option<Notice> {
        let subscription_id = self.registry.commit_unsubscribe(channel)?;
        debug!(channel, subscription_id, "unsubscribe committed");
        Some(Notice::Exited { channel: channel.to_string() })
    }

    /// Chronological summary of `user`'s events on `channel`.
    ///
    /// Works in any phase: histories outlive the session.
    pub fn summarize(&self, channel: &str, user: &str) -> Result<Summary, ClientError> {
        Ok(self.events.summarize(channel, user)?)
    }

    fn handle_login(
        &mut self,
        addr: String,
        username: &str,
        passcode: &str,
    ) -> Result<Vec<ClientAction>, ClientError> {
        self.session.begin_login(username)?;

        // Fresh stream, fresh bindings
        self.decoder = FrameDecoder::with_max_frame_size(self.config.max_frame_size);
        self.registry.clear();

        info!(%addr, username, "connecting");
        let connect =
            Frame::connect(&self.config.accept_version, &self.config.host, username, passcode);

        Ok(vec![ClientAction::Connect { addr }, ClientAction::Send(connect)])
    }

    fn handle_join(&mut self, channel: String) -> Result<Vec<ClientAction>, ClientError> {
        self.session.require_connected("join")?;

        let frame = self.registry.subscribe(&channel);
        Ok(vec![ClientAction::Send(frame), ClientAction::Notify(Notice::Joined { channel })])
    }

    fn handle_exit(&mut self, channel: String) -> Result<Vec<ClientAction>, ClientError> {
        self.session.require_connected("exit")?;

        let frame = self.registry.unsubscribe(&channel)?;
        Ok(vec![ClientAction::SendUnsubscribe { channel, frame }])
    }

    fn handle_report(&mut self, report: ReportFile) -> Result<Vec<ClientAction>, ClientError> {
        let user = self.session.require_connected("report")?.to_string();
        let channel = report.channel();

        let mut actions = Vec::with_capacity(report.events.len() + 1);
        for mut event in report.events {
            // The file's team names are authoritative for every event
            event.team_a.clone_from(&report.team_a);
            event.team_b.clone_from(&report.team_b);

            let report = EventReport { user: user.clone(), event };
            actions.push(ClientAction::Send(Frame::send(&channel, report.encode_body())));

            // Own reports are summarised like anyone else's
            self.events.ingest(&channel, &user, report.event);
        }

        debug!(%channel, count = actions.len(), "report sent");
        actions.push(ClientAction::Notify(Notice::ReportSent));
        Ok(actions)
    }

    fn handle_logout(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        if !self.session.is_connected() {
            return Err(SessionError::NotLoggedIn.into());
        }

        let (receipt_id, frame) = self.registry.disconnect();
        self.session.begin_logout(receipt_id)?;

        Ok(vec![ClientAction::Send(frame)])
    }

    fn handle_bytes(&mut self, bytes: &[u8]) -> Result<Vec<ClientAction>, ClientError> {
        let frames = match self.decoder.feed(bytes) {
            Ok(frames) => frames,
            Err(e) => {
                warn!(error = %e, "inbound stream broken");
                self.end_session();
                return Err(e.into());
            },
        };

        let mut actions = Vec::new();
        for frame in frames {
            match self.handle_frame(frame) {
                Ok(more) => actions.extend(more),
                Err(e) => warn!(error = %e, "ignoring frame"),
            }

            // Frames after a fatal one are not processed
            if actions.iter().any(|a| matches!(a, ClientAction::Shutdown { .. })) {
                break;
            }
        }

        Ok(actions)
    }

    fn handle_frame(&mut self, frame: Frame) -> Result<Vec<ClientAction>, ClientError> {
        debug!(command = %frame.command, headers = frame.headers.len(), "frame received");

        match &frame.command {
            Command::Connected => {
                self.session.on_connected()?;
                Ok(vec![ClientAction::Notify(Notice::LoginSuccessful)])
            },
            Command::Receipt => Ok(self.handle_receipt(&frame)),
            Command::Error => Ok(self.handle_error(&frame)),
            Command::Message => Ok(self.handle_message(frame)),
            command => Err(SessionError::UnexpectedFrame {
                phase: self.session.phase(),
                command: command.clone(),
            }
            .into()),
        }
    }

    fn handle_receipt(&mut self, frame: &Frame) -> Vec<ClientAction> {
        let raw_id = frame.get(names::RECEIPT_ID).unwrap_or_default();
        let mut actions = vec![ClientAction::Notify(Notice::ReceiptReceived {
            receipt_id: raw_id.to_string(),
        })];

        let Ok(receipt_id) = raw_id.parse::<u64>() else {
            warn!(receipt_id = raw_id, "receipt with non-numeric id");
            return actions;
        };

        match self.registry.resolve_receipt(receipt_id) {
            Some(PendingReceipt::Subscribe { channel, subscription_id }) => {
                debug!(receipt_id, %channel, subscription_id, "subscribe acknowledged");
            },
            Some(PendingReceipt::Unsubscribe { channel, subscription_id }) => {
                debug!(receipt_id, %channel, subscription_id, "unsubscribe acknowledged");
            },
            Some(PendingReceipt::Disconnect) => debug!(receipt_id, "disconnect acknowledged"),
            None => warn!(receipt_id, "receipt for unknown request"),
        }

        if self.session.on_receipt(receipt_id) {
            self.registry.clear();
            actions.push(ClientAction::Shutdown { reason: "logged out".to_string() });
        }

        actions
    }

    fn handle_error(&mut self, frame: &Frame) -> Vec<ClientAction> {
        let message = frame.get(names::MESSAGE).unwrap_or_default().to_string();
        warn!(%message, body = %frame.body, "broker error");

        self.session.on_error();
        self.registry.clear();

        vec![
            ClientAction::Notify(Notice::BrokerError { message: message.clone() }),
            ClientAction::Shutdown { reason: format!("broker error: {message}") },
        ]
    }

    fn handle_message(&mut self, frame: Frame) -> Vec<ClientAction> {
        let channel = channel_of(frame.get(names::DESTINATION).unwrap_or_default()).to_string();
        let EventReport { user, event } = EventReport::decode_body(&frame.body);

        if !self.registry.is_subscribed(&channel) {
            debug!(%channel, "message for channel without subscription");
        }

        self.events.ingest(&channel, &user, event);
        vec![ClientAction::Notify(Notice::EventReceived { user, channel })]
    }

    fn handle_connect_failed(&mut self, reason: &str) -> Vec<ClientAction> {
        warn!(reason, "connect failed");
        self.end_session();
        vec![ClientAction::Notify(Notice::CouldNotConnect)]
    }

    fn handle_transport_closed(&mut self, reason: String) -> Vec<ClientAction> {
        if self.session.phase() == SessionPhase::Disconnected {
            debug!(%reason, "transport closed after session end");
            return Vec::new();
        }

        warn!(%reason, "transport closed");
        self.end_session();
        vec![ClientAction::Notify(Notice::ConnectionLost), ClientAction::Shutdown { reason }]
    }

    fn end_session(&mut self) {
        self.session.abort();
        self.registry.clear();
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use touchline_proto::payloads::Event;

    use super::*;

    fn connected_client() -> Client {
        let mut client = Client::new(ClientConfig::default());
        client
            .handle(ClientEvent::Login {
                addr: "127.0.0.1:7777".into(),
                username: "alice".into(),
                passcode: "secret".into(),
            })
            .unwrap();
        client.handle(ClientEvent::FrameReceived(Frame::new(Command::Connected))).unwrap();
        client
    }

    fn sent_frames(actions: &[ClientAction]) -> Vec<&Frame> {
        actions
            .iter()
            .filter_map(|a| match a {
                ClientAction::Send(frame) | ClientAction::SendUnsubscribe { frame, .. } => {
                    Some(frame)
                },
                _ => None,
            })
            .collect()
    }

    fn receipt(id: u64) -> Frame {
        Frame::new(Command::Receipt).header("receipt-id", id)
    }

    #[test]
    fn login_connects_then_sends_connect() {
        let mut client = Client::new(ClientConfig::default());
        let actions = client
            .handle(ClientEvent::Login {
                addr: "localhost:7777".into(),
                username: "alice".into(),
                passcode: "pw".into(),
            })
            .unwrap();

        assert_eq!(actions[0], ClientAction::Connect { addr: "localhost:7777".into() });
        assert_eq!(
            actions[1],
            ClientAction::Send(Frame::connect("1.2", "stomp.cs.bgu.ac.il", "alice", "pw"))
        );
        assert_eq!(client.phase(), SessionPhase::Connecting);
    }

    #[test]
    fn connected_frame_completes_login() {
        let client = connected_client();
        assert_eq!(client.phase(), SessionPhase::Connected);
        assert_eq!(client.username(), Some("alice"));
    }

    #[test]
    fn second_login_is_rejected() {
        let mut client = connected_client();
        let err = client
            .handle(ClientEvent::Login { addr: "x:1".into(), username: "bob".into(), passcode: "p".into() })
            .unwrap_err();

        assert_eq!(err.notice(), Some(Notice::AlreadyLoggedIn));
        assert!(!err.is_fatal());
    }

    #[test]
    fn join_before_login_never_reaches_wire() {
        let mut client = Client::new(ClientConfig::default());
        let err = client.handle(ClientEvent::Join { channel: "a_b".into() }).unwrap_err();

        assert_eq!(err.notice(), Some(Notice::LoginRequired));
        assert!(!client.is_subscribed("a_b"));
    }

    #[test]
    fn join_and_exit() {
        let mut client = connected_client();

        let actions = client.handle(ClientEvent::Join { channel: "a_b".into() }).unwrap();
        assert_eq!(sent_frames(&actions)[0].command, Command::Subscribe);
        assert_eq!(actions[1], ClientAction::Notify(Notice::Joined { channel: "a_b".into() }));
        assert_eq!(client.subscription_id("a_b"), Some(0));

        let actions = client.handle(ClientEvent::Exit { channel: "a_b".into() }).unwrap();
        let frame = sent_frames(&actions)[0];
        assert_eq!(frame.command, Command::Unsubscribe);
        assert_eq!(frame.get("id"), Some("0"));

        // Binding survives until the write is committed
        assert!(client.is_subscribed("a_b"));
        assert_eq!(client.commit_unsubscribe("a_b"), Some(Notice::Exited { channel: "a_b".into() }));
        assert!(!client.is_subscribed("a_b"));
    }

    #[test]
    fn exit_unknown_channel() {
        let mut client = connected_client();
        let err = client.handle(ClientEvent::Exit { channel: "x_y".into() }).unwrap_err();
        assert_eq!(err.notice(), Some(Notice::NotSubscribed { channel: "x_y".into() }));
    }

    #[test]
    fn report_sends_each_event_and_stores_it() {
        let mut client = connected_client();
        let report = ReportFile {
            team_a: "germany".into(),
            team_b: "japan".into(),
            events: vec![
                Event { name: "kickoff".into(), time: 0, ..Event::default() },
                Event { name: "goal".into(), time: 600, ..Event::default() },
            ],
        };

        let actions = client.handle(ClientEvent::Report(report)).unwrap();
        let frames = sent_frames(&actions);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].get("destination"), Some("/germany_japan"));
        assert!(frames[0].body.starts_with("user:alice\nteam a:germany\nteam b:japan\n"));
        assert_eq!(actions.last(), Some(&ClientAction::Notify(Notice::ReportSent)));

        let summary = client.summarize("germany_japan", "alice").unwrap();
        assert_eq!(summary.events.len(), 2);
        assert_eq!(summary.team_a(), "germany");
        assert_eq!(summary.team_b(), "japan");
    }

    #[test]
    fn message_is_ingested_under_reporting_user() {
        let mut client = connected_client();
        let body = EventReport {
            user: "bob".into(),
            event: Event { name: "goal".into(), team_a: "a".into(), team_b: "b".into(), time: 5, ..Event::default() },
        }
        .encode_body();
        let frame = Frame::new(Command::Message).header("destination", "/a_b").with_body(body);

        let actions = client.handle(ClientEvent::FrameReceived(frame)).unwrap();
        assert_eq!(
            actions,
            vec![ClientAction::Notify(Notice::EventReceived { user: "bob".into(), channel: "a_b".into() })]
        );
        assert_eq!(client.events().history("a_b", "bob").map(<[Event]>::len), Some(1));
    }

    #[test]
    fn error_frame_is_fatal() {
        let mut client = connected_client();
        client.handle(ClientEvent::Join { channel: "a_b".into() }).unwrap();

        let frame = Frame::new(Command::Error).header("message", "malformed frame");
        let actions = client.handle(ClientEvent::FrameReceived(frame)).unwrap();

        assert_eq!(actions[0], ClientAction::Notify(Notice::BrokerError { message: "malformed frame".into() }));
        assert!(matches!(actions[1], ClientAction::Shutdown { .. }));
        assert_eq!(client.phase(), SessionPhase::Disconnected);
        assert!(!client.is_subscribed("a_b"));
    }

    #[test]
    fn logout_completes_on_matching_receipt() {
        let mut client = connected_client();
        client.handle(ClientEvent::Join { channel: "a_b".into() }).unwrap();

        let actions = client.handle(ClientEvent::Logout).unwrap();
        let disconnect = sent_frames(&actions)[0].clone();
        assert_eq!(disconnect.command, Command::Disconnect);
        assert_eq!(disconnect.get("receipt"), Some("1"));

        // SUBSCRIBE receipt arrives first
        let actions = client.handle(ClientEvent::FrameReceived(receipt(0))).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(client.phase(), SessionPhase::Connecting);

        let actions = client.handle(ClientEvent::FrameReceived(receipt(1))).unwrap();
        assert_eq!(actions[0], ClientAction::Notify(Notice::ReceiptReceived { receipt_id: "1".into() }));
        assert!(matches!(actions[1], ClientAction::Shutdown { .. }));
        assert_eq!(client.phase(), SessionPhase::Disconnected);
    }

    #[test]
    fn logout_completes_on_crlf_receipt() {
        let mut client = connected_client();
        client.handle(ClientEvent::Logout).unwrap();

        let wire = Bytes::from_static(b"RECEIPT\r\nreceipt-id:0\r\n\r\n\0");
        let actions = client.handle(ClientEvent::BytesReceived(wire)).unwrap();

        assert_eq!(actions[0], ClientAction::Notify(Notice::ReceiptReceived { receipt_id: "0".into() }));
        assert!(matches!(actions[1], ClientAction::Shutdown { .. }));
        assert_eq!(client.phase(), SessionPhase::Disconnected);
    }

    #[test]
    fn logout_without_session() {
        let mut client = Client::new(ClientConfig::default());
        let err = client.handle(ClientEvent::Logout).unwrap_err();
        assert_eq!(err.notice(), Some(Notice::NotLoggedIn));
    }

    #[test]
    fn connect_failure_allows_retry() {
        let mut client = Client::new(ClientConfig::default());
        client
            .handle(ClientEvent::Login { addr: "nowhere".into(), username: "a".into(), passcode: "b".into() })
            .unwrap();

        let actions = client.handle(ClientEvent::ConnectFailed { reason: "refused".into() }).unwrap();
        assert_eq!(actions, vec![ClientAction::Notify(Notice::CouldNotConnect)]);
        assert_eq!(client.phase(), SessionPhase::Disconnected);
    }

    #[test]
    fn bytes_are_reassembled_across_reads() {
        let mut client = Client::new(ClientConfig::default());
        client
            .handle(ClientEvent::Login { addr: "x:1".into(), username: "a".into(), passcode: "b".into() })
            .unwrap();

        let first = client.handle(ClientEvent::BytesReceived(Bytes::from_static(b"CONNEC"))).unwrap();
        assert!(first.is_empty());

        let second =
            client.handle(ClientEvent::BytesReceived(Bytes::from_static(b"TED\nversion:1.2\n\n\0\n"))).unwrap();
        assert_eq!(second, vec![ClientAction::Notify(Notice::LoginSuccessful)]);
    }

    #[test]
    fn oversized_stream_is_fatal() {
        let config = ClientConfig { max_frame_size: 16, ..ClientConfig::default() };
        let mut client = Client::new(config);
        client
            .handle(ClientEvent::Login { addr: "x:1".into(), username: "a".into(), passcode: "b".into() })
            .unwrap();

        let err = client
            .handle(ClientEvent::BytesReceived(Bytes::from_static(b"MESSAGE\ndestination:/a_b\n\n")))
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(client.phase(), SessionPhase::Disconnected);
    }

    #[test]
    fn unexpected_frame_is_ignored_in_a_batch() {
        let mut client = Client::new(ClientConfig::default());
        client
            .handle(ClientEvent::Login { addr: "x:1".into(), username: "a".into(), passcode: "b".into() })
            .unwrap();

        let actions = client
            .handle(ClientEvent::BytesReceived(Bytes::from_static(b"SUBSCRIBE\n\n\0CONNECTED\n\n\0")))
            .unwrap();
        assert_eq!(actions, vec![ClientAction::Notify(Notice::LoginSuccessful)]);
    }

    #[test]
    fn transport_closed_mid_session_is_fatal() {
        let mut client = connected_client();
        let actions = client.handle(ClientEvent::TransportClosed { reason: "eof".into() }).unwrap();

        assert_eq!(actions[0], ClientAction::Notify(Notice::ConnectionLost));
        assert_eq!(actions[1], ClientAction::Shutdown { reason: "eof".into() });

        // Nothing left to report the second time
        let actions = client.handle(ClientEvent::TransportClosed { reason: "eof".into() }).unwrap();
        assert!(actions.is_empty());
    }
}
