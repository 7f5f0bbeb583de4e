//! Error reporting to Sentry, active only when a DSN is configured.
use crate::config::Config;
use log::*;
use sentry::types::Dsn;
use sentry::{ClientInitGuard, ClientOptions};
use std::error::Error as StdError;
use std::time::Duration;

/// Start the Sentry client.
///
/// Reporting lasts as long as the returned guard is held. Dropping it flushes queued
/// events, waiting up to two seconds. Returns `None` when no DSN is configured or the
/// DSN can't be parsed.
pub fn init_sentry(config: &Config) -> Option<ClientInitGuard> {
    let dsn = match config.sentry_dsn.as_deref()?.parse::<Dsn>() {
        Ok(dsn) => dsn,
        Err(e) => {
            warn!("Sentry reporting disabled, invalid DSN: {e}");
            return None;
        }
    };

    let guard = sentry::init(client_options(config, dsn));
    info!(
        "Sentry reporting enabled (environment: {})",
        config.sentry_environment.as_deref().unwrap_or("unset")
    );
    Some(guard)
}

/// Send `err` to Sentry. Does nothing when reporting isn't enabled.
pub fn report_error<E: StdError + ?Sized>(err: &E) {
    sentry::capture_error(err);
}

fn client_options(config: &Config, dsn: Dsn) -> ClientOptions {
    ClientOptions {
        dsn: Some(dsn),
        environment: config.sentry_environment.clone().map(Into::into),
        release: sentry::release_name!(),
        sample_rate: 1.0,
        traces_sample_rate: 1.0,
        shutdown_timeout: Duration::from_secs(2),
        ..Default::default()
    }
}
