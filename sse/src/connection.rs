use dashmap::DashMap;
use events::Event;
use log::*;
use std::collections::HashSet;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration held for a subscriber: the channels it listens on and the sending
/// half of its delivery queue. The subscriber owns the receiving half.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub channels: HashSet<String>,
    pub sender: Sender<Event>,
}

/// Outcome of a fan-out to one channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Subscribers whose queue accepted the event
    pub delivered: usize,
    /// Subscribers whose queue was full; they miss this event
    pub dropped: usize,
    /// Subscribers found closed and unregistered during the fan-out
    pub pruned: usize,
}

/// Connection registry with dual indices for O(1) lookups
pub struct ConnectionRegistry {
    /// Primary storage: lookup by connection_id for registration/cleanup - O(1)
    connections: DashMap<ConnectionId, ConnectionInfo>,

    /// Secondary index: subscribers of each channel for message routing - O(1)
    channel_index: DashMap<String, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            channel_index: DashMap::new(),
        }
    }

    /// Register a new connection interested in `channels` - O(c)
    pub fn register<S: AsRef<str>>(&self, channels: &[S], sender: Sender<Event>) -> ConnectionId {
        let connection_id = ConnectionId::new();
        let channels: HashSet<String> = channels.iter().map(|c| c.as_ref().to_string()).collect();

        // Update secondary index
        for channel in &channels {
            self.channel_index
                .entry(channel.clone())
                .or_default()
                .insert(connection_id.clone());
        }

        // Insert into primary storage
        self.connections
            .insert(connection_id.clone(), ConnectionInfo { channels, sender });

        connection_id
    }

    /// Unregister a connection. Unknown ids are ignored.
    pub fn unregister(&self, connection_id: &ConnectionId) {
        // Remove from primary storage
        if let Some((_, info)) = self.connections.remove(connection_id) {
            for channel in &info.channels {
                if let Some(mut entry) = self.channel_index.get_mut(channel) {
                    entry.remove(connection_id);
                }
                // Clean up empty channel entries
                self.channel_index
                    .remove_if(channel, |_, subscribers| subscribers.is_empty());
            }
        }
    }

    /// Hand `event` to every subscriber of `channel` without waiting on any of them.
    pub fn send_to_channel(&self, channel: &str, event: &Event) -> Delivery {
        // Copy the ids out so no index guard is held while touching the primary map
        let targets: Vec<ConnectionId> = match self.channel_index.get(channel) {
            Some(ids) => ids.iter().cloned().collect(),
            None => return Delivery::default(),
        };

        let mut delivery = Delivery::default();
        let mut closed = Vec::new();

        for conn_id in targets {
            let Some(info) = self.connections.get(&conn_id) else {
                continue;
            };

            match info.sender.try_send(event.clone()) {
                Ok(()) => delivery.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "Subscriber {} is not keeping up, dropping {} event",
                        conn_id.as_str(),
                        channel
                    );
                    delivery.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(
                        "Subscriber {} closed without unregistering, removing it",
                        conn_id.as_str()
                    );
                    closed.push(conn_id.clone());
                }
            }
        }

        for conn_id in &closed {
            self.unregister(conn_id);
        }
        delivery.pruned = closed.len();

        delivery
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channel_index
            .get(channel)
            .map(|ids| ids.len())
            .unwrap_or(0)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
