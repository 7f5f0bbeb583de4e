//! Publish/subscribe fan-out of change notifications to streaming connections.
//!
//! Request handlers call [`PubSub::publish`] after a successful mutation; every open
//! Server-Sent Events connection holds a [`Subscription`] obtained from
//! [`PubSub::subscribe`] and relays what arrives on it to the browser.
//!
//! # Architecture
//!
//! - **Two implementations, one contract**: [`LocalPubSub`] fans out within the
//!   process through a [`ConnectionRegistry`]; [`RedisPubSub`] forwards through Redis
//!   channels so several server processes share notifications.
//! - **Bounded, lossy delivery**: every subscriber owns a bounded queue. Publishing
//!   never waits on a subscriber; when a queue is full the event is dropped for that
//!   subscriber alone and a warning is logged.
//! - **Release on drop**: dropping a [`Subscription`] unregisters it (local) or stops
//!   its forwarding task (Redis), whichever way the owning connection ends.
//! - **Ephemeral**: nothing is persisted. A browser that is offline misses the event
//!   and sees fresh data on its next page load.
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry with a per-channel index and type-safe ConnectionId
//! - `local`: in-process fan-out
//! - `broker`: Redis-backed fan-out
//! - `subscription`: the per-connection receiving handle

use async_trait::async_trait;

pub mod broker;
pub mod connection;
pub mod error;
pub mod local;
pub mod subscription;

pub use broker::RedisPubSub;
pub use connection::{ConnectionId, ConnectionRegistry};
pub use error::{Error, SseErrorKind};
pub use local::LocalPubSub;
pub use subscription::Subscription;

/// Default capacity of each subscriber's delivery queue.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 16;

pub type Result<T> = core::result::Result<T, Error>;

/// The broadcaster contract shared by the local and Redis-backed fan-outs.
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Register interest in `channels`. Events arrive on the returned subscription
    /// until it is dropped.
    async fn subscribe(&self, channels: &[&str]) -> Result<Subscription>;

    /// Deliver an event on `channel` to every current subscriber of that channel.
    async fn publish(&self, channel: &str, data: Option<String>) -> Result<()>;
}
