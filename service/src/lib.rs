use cache::{Cache, MemoryStore, RedisStore};
use config::Config;
use domain::SessionManager;
use log::{info, warn};
use sse::{LocalPubSub, PubSub, RedisPubSub};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod config;
pub mod logging;
pub mod reporting;

/// Failure to bring up a storage or notification backend at startup.
#[derive(Debug)]
pub enum StartupError {
    Cache(cache::Error),
    Broker(sse::Error),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StartupError::Cache(e) => write!(f, "unable to connect to cache backend: {e}"),
            StartupError::Broker(e) => write!(f, "unable to connect to event broker: {e}"),
        }
    }
}

impl StdError for StartupError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StartupError::Cache(e) => Some(e),
            StartupError::Broker(e) => Some(e),
        }
    }
}

impl From<cache::Error> for StartupError {
    fn from(err: cache::Error) -> Self {
        StartupError::Cache(err)
    }
}

impl From<sse::Error> for StartupError {
    fn from(err: sse::Error) -> Self {
        StartupError::Broker(err)
    }
}

/// Select and connect the cache and broadcaster backends.
///
/// A configured Redis host selects Redis for both, and any connection failure is
/// returned so the process can refuse to start. Without one, both stay in this
/// process and notifications are not shared with other server processes.
pub async fn init_backends(
    config: &Config,
) -> Result<(Arc<dyn Cache>, Arc<dyn PubSub>), StartupError> {
    let Some(settings) = config.redis_settings() else {
        warn!("Redis persistence disabled, notifications will not be shared across processes");
        return Ok((
            Arc::new(MemoryStore::new()),
            Arc::new(LocalPubSub::new(config.sse_subscriber_buffer)),
        ));
    };

    let address = settings.address();
    let client = settings.client()?;
    let cache = RedisStore::connect(client.clone()).await?;
    let pubsub = RedisPubSub::connect(client, config.sse_subscriber_buffer).await?;
    info!("Redis persistence configured at {address} (tls: {})", settings.use_tls());

    Ok((Arc::new(cache), Arc::new(pubsub)))
}

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub cache: Arc<dyn Cache>,
    pub pubsub: Arc<dyn PubSub>,
    /// Cancelled once when the server starts shutting down
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(app_config: Config, cache: Arc<dyn Cache>, pubsub: Arc<dyn PubSub>) -> Self {
        Self {
            config: app_config,
            cache,
            pubsub,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn session_manager(&self) -> SessionManager {
        SessionManager::new(
            Arc::clone(&self.cache),
            self.config.session_expiration(),
            self.config.dev,
        )
    }
}
