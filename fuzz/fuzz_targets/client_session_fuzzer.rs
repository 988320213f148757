//! Fuzz target for the client state machine
//!
//! Drives a client with arbitrary user commands interleaved with arbitrary
//! broker bytes and transport outcomes.
//!
//! # Invariants
//!
//! - Never panics
//! - Only protocol errors are fatal, and only broker bytes produce them
//! - Only login asks for a connection
//! - A disconnected client holds no subscriptions
//! - Subscription ids handed out are never reused

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use touchline_client::{Client, ClientAction, ClientConfig, ClientEvent, SessionPhase};
use touchline_proto::payloads::{Event, ReportFile};

const CHANNELS: [&str; 3] = ["a_b", "c_d", "e_f"];

#[derive(Debug, Arbitrary)]
enum Step {
    Login { wrong: bool },
    Join(u8),
    Exit(u8),
    Report { channel: u8, time: i64 },
    Logout,
    Bytes(Vec<u8>),
    ConnectFailed,
    TransportClosed,
    CommitUnsubscribe(u8),
}

fn channel(index: u8) -> &'static str {
    CHANNELS[usize::from(index) % CHANNELS.len()]
}

fn report(index: u8, time: i64) -> ReportFile {
    let (team_a, team_b) = channel(index).split_once('_').unwrap_or(("a", "b"));
    ReportFile {
        team_a: team_a.into(),
        team_b: team_b.into(),
        events: vec![Event { team_a: team_a.into(), team_b: team_b.into(), time, ..Event::default() }],
    }
}

fuzz_target!(|steps: Vec<Step>| {
    let mut client = Client::new(ClientConfig { max_frame_size: 512, ..ClientConfig::default() });
    let mut seen_ids = HashSet::new();

    for step in steps {
        if let Step::CommitUnsubscribe(index) = step {
            let _ = client.commit_unsubscribe(channel(index));
            continue;
        }

        let from_broker = matches!(step, Step::Bytes(_));
        let is_login = matches!(step, Step::Login { .. });

        let event = match step {
            Step::Login { wrong } => ClientEvent::Login {
                addr: "broker:1".into(),
                username: "fuzz".into(),
                passcode: if wrong { "wrong".into() } else { "pw".into() },
            },
            Step::Join(index) => ClientEvent::Join { channel: channel(index).into() },
            Step::Exit(index) => ClientEvent::Exit { channel: channel(index).into() },
            Step::Report { channel, time } => ClientEvent::Report(report(channel, time)),
            Step::Logout => ClientEvent::Logout,
            Step::Bytes(bytes) => ClientEvent::BytesReceived(Bytes::from(bytes)),
            Step::ConnectFailed => ClientEvent::ConnectFailed { reason: "refused".into() },
            Step::TransportClosed => ClientEvent::TransportClosed { reason: "reset".into() },
            Step::CommitUnsubscribe(_) => continue,
        };

        match client.handle(event) {
            Ok(actions) => {
                for action in &actions {
                    if matches!(action, ClientAction::Connect { .. }) {
                        assert!(is_login, "connect requested outside login");
                    }
                }
            },
            Err(e) => {
                if e.is_fatal() {
                    assert!(from_broker, "fatal error from a local event: {e}");
                }
            },
        }

        for name in CHANNELS {
            if let Some(id) = client.subscription_id(name) {
                assert_ne!(client.phase(), SessionPhase::Disconnected);
                seen_ids.insert((name, id));
            }
        }

        let mut ids: Vec<u64> = seen_ids.iter().map(|&(_, id)| id).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total, "subscription id bound to two channels");
    }
});
