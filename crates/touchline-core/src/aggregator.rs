//! Per-channel, per-user event histories.
//!
//! Events arrive in network order, which need not match game-clock order.
//! Histories are kept exactly as received; [`EventAggregator::summarize`]
//! sorts a copy by time and only then folds the update mappings, so the value
//! a key ends up with is the one from the chronologically last event that set
//! it, whatever order the events were delivered in.

use std::collections::HashMap;

use touchline_proto::payloads::{Event, Updates};
use tracing::trace;

use crate::error::LookupError;

/// Merged view of one user's reports on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Channel summarised
    pub channel: String,
    /// Reporting user summarised
    pub user: String,
    /// History sorted by time ascending; equal times keep arrival order
    pub events: Vec<Event>,
    /// General updates merged in chronological order
    pub general_updates: Updates,
    /// Team A updates merged in chronological order
    pub team_a_updates: Updates,
    /// Team B updates merged in chronological order
    pub team_b_updates: Updates,
}

impl Summary {
    /// Team A name, taken from the earliest event.
    pub fn team_a(&self) -> &str {
        self.events.first().map_or("", |event| event.team_a.as_str())
    }

    /// Team B name, taken from the earliest event.
    pub fn team_b(&self) -> &str {
        self.events.first().map_or("", |event| event.team_b.as_str())
    }
}

/// Event store keyed by channel, then reporting user.
#[derive(Debug, Default)]
pub struct EventAggregator {
    histories: HashMap<String, HashMap<String, Vec<Event>>>,
}

impl EventAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` to the history of (`channel`, `user`).
    ///
    /// No deduplication, no reordering.
    pub fn ingest(&mut self, channel: &str, user: &str, event: Event) {
        trace!(channel, user, time = event.time, name = %event.name, "ingest event");

        self.histories
            .entry(channel.to_string())
            .or_default()
            .entry(user.to_string())
            .or_default()
            .push(event);
    }

    /// History of (`channel`, `user`) in arrival order. `None` if nothing was
    /// ever ingested for that key.
    pub fn history(&self, channel: &str, user: &str) -> Option<&[Event]> {
        self.histories.get(channel)?.get(user).map(Vec::as_slice)
    }

    /// Total number of ingested events.
    pub fn len(&self) -> usize {
        self.histories.values().flat_map(HashMap::values).map(Vec::len).sum()
    }

    /// Check if nothing has been ingested.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sort the history of (`channel`, `user`) by time and merge its updates.
    ///
    /// # Errors
    ///
    /// - `LookupError::NoHistory` if nothing was ingested for that key
    pub fn summarize(&self, channel: &str, user: &str) -> Result<Summary, LookupError> {
        let history = self.history(channel, user).ok_or_else(|| LookupError::NoHistory {
            channel: channel.to_string(),
            user: user.to_string(),
        })?;

        let mut events = history.to_vec();
        events.sort_by_key(|event| event.time);

        let mut general_updates = Updates::new();
        let mut team_a_updates = Updates::new();
        let mut team_b_updates = Updates::new();

        // Chronological fold: later events overwrite earlier ones
        for event in &events {
            merge(&mut general_updates, &event.general_updates);
            merge(&mut team_a_updates, &event.team_a_updates);
            merge(&mut team_b_updates, &event.team_b_updates);
        }

        Ok(Summary {
            channel: channel.to_string(),
            user: user.to_string(),
            events,
            general_updates,
            team_a_updates,
            team_b_updates,
        })
    }
}

fn merge(into: &mut Updates, from: &Updates) {
    into.extend(from.iter().map(|(key, value)| (key.clone(), value.clone())));
}
