use crate::connection::ConnectionRegistry;
use crate::subscription::Subscription;
use crate::{PubSub, Result, DEFAULT_SUBSCRIBER_BUFFER};
use async_trait::async_trait;
use events::Event;
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc;

/// In-process fan-out. Only connections held by this process see its events.
pub struct LocalPubSub {
    registry: Arc<ConnectionRegistry>,
    buffer: usize,
}

impl LocalPubSub {
    /// `buffer` is the capacity of each subscriber's queue; at least one slot is kept.
    pub fn new(buffer: usize) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            buffer: buffer.max(1),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }
}

impl Default for LocalPubSub {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

#[async_trait]
impl PubSub for LocalPubSub {
    async fn subscribe(&self, channels: &[&str]) -> Result<Subscription> {
        let (tx, rx) = mpsc::channel(self.buffer);
        let connection_id = self.registry.register(channels, tx);
        info!(
            "Registered SSE subscriber {} for {:?}",
            connection_id.as_str(),
            channels
        );

        // The subscription must not keep the registry alive on its own
        let registry = Arc::downgrade(&self.registry);
        let release_id = connection_id.clone();
        Ok(Subscription::new(connection_id, rx, move || {
            if let Some(registry) = registry.upgrade() {
                info!("Unregistering SSE subscriber {}", release_id.as_str());
                registry.unregister(&release_id);
            }
        }))
    }

    async fn publish(&self, channel: &str, data: Option<String>) -> Result<()> {
        let event = Event::new(channel, data);
        let delivery = self.registry.send_to_channel(channel, &event);
        info!(
            "Broadcasting {} event to {} subscriber(s)",
            channel, delivery.delivered
        );
        Ok(())
    }
}
