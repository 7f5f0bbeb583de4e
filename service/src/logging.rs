//! Console logging, mirrored to Sentry when running in production.
use crate::config::Config;
use log::{Level, LevelFilter, Metadata, SetLoggerError};
use sentry_log::{LogFilter, SentryLogger};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Dependencies whose records only show at TRACE.
const NOISY_DEPENDENCIES: &[&str] = &["redis", "tower", "tracing", "hyper", "axum"];

pub struct Logger {}

impl Logger {
    /// Install the global logger at the configured level. Fails if a global logger
    /// was already installed.
    ///
    /// Records always go to the terminal. With Sentry log forwarding enabled, errors
    /// additionally become Sentry events and lower levels become breadcrumbs that
    /// accompany the next event.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let level = config.log_level_filter;
        let console = TermLogger::new(
            level,
            Self::build_log_config(level),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        );

        if config.forward_logs_to_sentry() {
            let logger = SentryLogger::with_dest(console).filter(Self::sentry_filter);
            log::set_boxed_logger(Box::new(logger))?;
        } else {
            log::set_boxed_logger(console)?;
        }
        log::set_max_level(level);

        Ok(())
    }

    /// Terminal output format: RFC3339 timestamps, the emitting module on every line,
    /// and noisy dependencies hidden unless `level` is TRACE.
    fn build_log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();
        builder.set_target_level(LevelFilter::Error);

        if level != LevelFilter::Trace {
            for module in NOISY_DEPENDENCIES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }

    fn sentry_filter(metadata: &Metadata) -> LogFilter {
        if Self::is_noisy(metadata.target()) {
            return LogFilter::Ignore;
        }

        match metadata.level() {
            Level::Error => LogFilter::Event,
            Level::Warn | Level::Info | Level::Debug => LogFilter::Breadcrumb,
            Level::Trace => LogFilter::Ignore,
        }
    }

    fn is_noisy(target: &str) -> bool {
        NOISY_DEPENDENCIES
            .iter()
            .any(|module| target.starts_with(module))
    }
}
