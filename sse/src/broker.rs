use crate::connection::ConnectionId;
use crate::subscription::Subscription;
use crate::{PubSub, Result};
use async_trait::async_trait;
use events::Event;
use futures::{future, Stream, StreamExt};
use log::*;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::mpsc::{self, error::TrySendError, Sender};
use tokio_util::sync::CancellationToken;

/// Fan-out through Redis channels, shared by every server process using the same
/// Redis server.
///
/// Publishing sends the JSON-encoded event to the Redis channel named after the event
/// channel. Each subscriber opens its own Redis subscription and a forwarding task
/// decodes inbound messages into its queue. The task stops as soon as the
/// [`Subscription`] is dropped.
pub struct RedisPubSub {
    client: redis::Client,
    connection: ConnectionManager,
    buffer: usize,
}

impl RedisPubSub {
    pub async fn connect(client: redis::Client, buffer: usize) -> Result<Self> {
        let connection = ConnectionManager::new(client.clone()).await?;
        Ok(Self {
            client,
            connection,
            buffer: buffer.max(1),
        })
    }
}

#[async_trait]
impl PubSub for RedisPubSub {
    async fn subscribe(&self, channels: &[&str]) -> Result<Subscription> {
        let mut subscriber = self.client.get_async_pubsub().await?;
        for channel in channels {
            subscriber.subscribe(*channel).await?;
        }

        let connection_id = ConnectionId::new();
        info!(
            "Opened Redis subscription {} for {:?}",
            connection_id.as_str(),
            channels
        );

        let (tx, rx) = mpsc::channel(self.buffer);
        let cancel = CancellationToken::new();
        let payloads = subscriber
            .into_on_message()
            .filter_map(|message| future::ready(payload(message)));
        tokio::spawn(forward(
            connection_id.clone(),
            Box::pin(payloads),
            tx,
            cancel.clone(),
        ));

        Ok(Subscription::new(connection_id, rx, move || cancel.cancel()))
    }

    async fn publish(&self, channel: &str, data: Option<String>) -> Result<()> {
        let payload = Event::new(channel, data).to_json()?;
        let mut connection = self.connection.clone();
        let receivers: usize = connection.publish(channel, payload).await?;
        info!("Broadcasting {channel} event to {receivers} Redis subscriber(s)");
        Ok(())
    }
}

/// Payload of one Redis message, or `None` (logged) when it isn't a string.
fn payload(message: redis::Msg) -> Option<String> {
    match message.get_payload::<String>() {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!("Unreadable Redis message on {}: {e}", message.get_channel_name());
            None
        }
    }
}

/// Relay broker payloads into a subscriber's queue until the subscription is
/// released, the queue is closed or the payload stream ends.
async fn forward<S>(
    connection_id: ConnectionId,
    mut payloads: S,
    tx: Sender<Event>,
    cancel: CancellationToken,
) where
    S: Stream<Item = String> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            payload = payloads.next() => {
                let Some(payload) = payload else {
                    warn!("Redis closed subscription {}", connection_id.as_str());
                    break;
                };

                let Some(event) = decode(&payload) else {
                    continue;
                };

                match tx.try_send(event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(event)) => warn!(
                        "Subscriber {} is not keeping up, dropping {} event",
                        connection_id.as_str(),
                        event.event
                    ),
                    Err(TrySendError::Closed(_)) => break,
                }
            }
        }
    }

    debug!("Closed Redis subscription {}", connection_id.as_str());
}

/// Decode a broker payload, logging and discarding anything malformed so one bad
/// message can't end the subscriber's stream.
pub(crate) fn decode(payload: &str) -> Option<Event> {
    match Event::from_json(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Unmarshal of event failure: {e}");
            None
        }
    }
}
