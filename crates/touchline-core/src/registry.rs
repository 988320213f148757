//! Subscription registry and receipt book.
//!
//! Maps channel names to broker subscription ids and mints the ids used on
//! the wire. Two independent counters (subscription ids, receipt ids) start at
//! 0 and only grow; nothing resets them, so an id is never seen twice in one
//! client process.
//!
//! Every receipt id handed out is remembered with the request that asked for
//! it until the broker acknowledges it. Unacknowledged receipts are kept
//! forever: there is no timeout.
//!
//! Building an UNSUBSCRIBE and dropping the binding are separate steps. The
//! caller commits the removal with [`SubscriptionRegistry::commit_unsubscribe`]
//! once the frame is actually on the wire, so a failed write keeps the binding.

use std::collections::{BTreeMap, HashMap};

use touchline_proto::Frame;
use tracing::{debug, warn};

use crate::error::LookupError;

/// Request a receipt id was minted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingReceipt {
    /// SUBSCRIBE to `channel` as `subscription_id`
    Subscribe {
        /// Channel joined
        channel: String,
        /// Subscription id bound to it
        subscription_id: u64,
    },
    /// UNSUBSCRIBE from `channel`
    Unsubscribe {
        /// Channel left
        channel: String,
        /// Subscription id released
        subscription_id: u64,
    },
    /// DISCONNECT
    Disconnect,
}

/// Channel ↔ subscription id bindings plus id counters.
///
/// # Invariants
///
/// - At most one subscription id per channel.
/// - Subscription ids and receipt ids strictly increase across calls.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    /// Channel → active subscription id
    subscriptions: HashMap<String, u64>,
    /// Receipt id → request awaiting it
    pending: BTreeMap<u64, PendingReceipt>,
    next_subscription_id: u64,
    next_receipt_id: u64,
}

impl SubscriptionRegistry {
    /// Create an empty registry with both counters at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `channel` to a fresh subscription id and build its SUBSCRIBE.
    ///
    /// A channel that is already bound is rebound to the new id.
    pub fn subscribe(&mut self, channel: &str) -> Frame {
        let subscription_id = self.next_subscription_id;
        self.next_subscription_id += 1;

        let receipt_id = self.mint_receipt(PendingReceipt::Subscribe {
            channel: channel.to_string(),
            subscription_id,
        });

        if let Some(previous) = self.subscriptions.insert(channel.to_string(), subscription_id) {
            warn!(channel, previous, subscription_id, "channel already subscribed, rebinding");
        }

        debug!(channel, subscription_id, receipt_id, "subscribe");
        Frame::subscribe(channel, subscription_id, receipt_id)
    }

    /// Build the UNSUBSCRIBE for `channel` without removing its binding.
    ///
    /// # Errors
    ///
    /// - `LookupError::NotSubscribed` if `channel` has no binding. No receipt
    ///   id is consumed in that case.
    pub fn unsubscribe(&mut self, channel: &str) -> Result<Frame, LookupError> {
        let subscription_id = self
            .id_for(channel)
            .ok_or_else(|| LookupError::NotSubscribed { channel: channel.to_string() })?;

        let receipt_id = self.mint_receipt(PendingReceipt::Unsubscribe {
            channel: channel.to_string(),
            subscription_id,
        });

        debug!(channel, subscription_id, receipt_id, "unsubscribe");
        Ok(Frame::unsubscribe(subscription_id, receipt_id))
    }

    /// Drop the binding for `channel` after its UNSUBSCRIBE was issued.
    ///
    /// Returns the released subscription id, `None` if there was no binding.
    pub fn commit_unsubscribe(&mut self, channel: &str) -> Option<u64> {
        self.subscriptions.remove(channel)
    }

    /// Check if `channel` has an active binding.
    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.subscriptions.contains_key(channel)
    }

    /// Subscription id bound to `channel`. `None` if not subscribed.
    pub fn id_for(&self, channel: &str) -> Option<u64> {
        self.subscriptions.get(channel).copied()
    }

    /// Channels with an active binding, in no particular order.
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.subscriptions.keys().map(String::as_str)
    }

    /// Mint the DISCONNECT receipt and build the frame.
    pub fn disconnect(&mut self) -> (u64, Frame) {
        let receipt_id = self.mint_receipt(PendingReceipt::Disconnect);
        debug!(receipt_id, "disconnect");
        (receipt_id, Frame::disconnect(receipt_id))
    }

    /// Take the request that `receipt_id` acknowledges.
    ///
    /// `None` for ids this registry never minted or already resolved.
    pub fn resolve_receipt(&mut self, receipt_id: u64) -> Option<PendingReceipt> {
        self.pending.remove(&receipt_id)
    }

    /// Number of receipts still awaiting acknowledgement.
    pub fn pending_receipts(&self) -> usize {
        self.pending.len()
    }

    /// Drop every binding and outstanding receipt at session end.
    ///
    /// Counters keep their values.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
        self.pending.clear();
    }

    fn mint_receipt(&mut self, request: PendingReceipt) -> u64 {
        let receipt_id = self.next_receipt_id;
        self.next_receipt_id += 1;
        self.pending.insert(receipt_id, request);
        receipt_id
    }
}
