//! Cache invalidation signals for downstream display widgets.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use tokio::sync::broadcast;

use crate::TRACING_TARGET_INVALIDATION;

/// Default capacity of the broadcast channel.
const DEFAULT_CAPACITY: usize = 64;

/// Data domains whose cached views may go stale after an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum InvalidationTopic {
    /// Portfolio totals.
    Portfolio,
    /// Holdings list.
    Holdings,
    /// Dashboard statistics.
    Stats,
    /// Snapshot history.
    SnapshotHistory,
}

impl InvalidationTopic {
    /// Every topic, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Portfolio,
        Self::Holdings,
        Self::Stats,
        Self::SnapshotHistory,
    ];
}

/// Why a signal was fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum InvalidationReason {
    /// A bulk import stored at least one snapshot.
    BatchImported {
        /// Number of snapshots stored.
        successful: usize,
    },
    /// A single confirmed statement was stored.
    SnapshotSaved {
        /// Identifier of the stored snapshot.
        snapshot_id: String,
    },
}

/// A set of topics invalidated together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationSignal {
    /// Stale topics; fired together, in no particular order.
    pub topics: Vec<InvalidationTopic>,
    /// What caused the invalidation.
    pub reason: InvalidationReason,
}

impl InvalidationSignal {
    /// Creates a signal for the given topics.
    pub fn new(topics: impl IntoIterator<Item = InvalidationTopic>, reason: InvalidationReason) -> Self {
        let mut topics: Vec<_> = topics.into_iter().collect();
        topics.sort_unstable();
        topics.dedup();
        Self { topics, reason }
    }

    /// Returns whether this signal invalidates `topic`.
    pub fn contains(&self, topic: InvalidationTopic) -> bool {
        self.topics.contains(&topic)
    }
}

impl fmt::Display for InvalidationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics: Vec<&str> = self.topics.iter().map(AsRef::as_ref).collect();
        write!(f, "{}", topics.join(","))
    }
}

/// Publishes invalidation signals to subscribers.
pub trait InvalidationBus: Send + Sync {
    /// Publishes one signal.
    fn invalidate(&self, signal: InvalidationSignal);
}

/// In-process bus backed by a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    sender: broadcast::Sender<InvalidationSignal>,
}

impl BroadcastBus {
    /// Creates a bus buffering up to `capacity` signals per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationSignal> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl InvalidationBus for BroadcastBus {
    fn invalidate(&self, signal: InvalidationSignal) {
        tracing::debug!(
            target: TRACING_TARGET_INVALIDATION,
            topics = %signal,
            reason = ?signal.reason,
            "Publishing invalidation signal"
        );

        // Nobody listening is fine; the next fetch will be fresh anyway.
        if self.sender.send(signal).is_err() {
            tracing::trace!(
                target: TRACING_TARGET_INVALIDATION,
                "Invalidation signal dropped, no subscribers"
            );
        }
    }
}
