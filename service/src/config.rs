use cache::{RedisSettings, DEFAULT_REDIS_PORT};
use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

/// Upper bound for `--session-expiry-hours`: ten years.
const MAX_SESSION_EXPIRY_HOURS: u64 = 24 * 365 * 10;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 3000)]
    pub port: u16,

    /// Log level threshold for console output (`error`, `warn`, `info`, `debug`, `trace`)
    #[arg(
        short,
        long,
        env = "LOG_LEVEL",
        ignore_case = true,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,

    /// Development override: session cookies are issued without the Secure attribute
    /// so they work over plain HTTP.
    #[arg(long, env)]
    pub dev: bool,

    /// Redis host, optionally as HOST:PORT. When absent, sessions and notifications
    /// stay in this process.
    #[arg(long, env)]
    redis_host: Option<String>,

    /// Redis port, used when the host doesn't carry one
    #[arg(long, env, default_value_t = DEFAULT_REDIS_PORT)]
    redis_port: u16,

    /// Redis username. Setting a username or password enables TLS.
    #[arg(long, env)]
    redis_user: Option<String>,

    /// Redis password. Setting a username or password enables TLS.
    #[arg(long, env)]
    redis_password: Option<String>,

    /// Session lifetime in hours (default: 720 hours = 30 days)
    #[arg(
        long,
        env,
        default_value_t = 720,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SESSION_EXPIRY_HOURS)
    )]
    pub session_expiry_hours: u64,

    /// Seconds between keepalive pings on open event streams
    #[arg(long, env, default_value_t = 2)]
    pub sse_keepalive_secs: u64,

    /// Capacity of each event stream's delivery queue. Events published while a
    /// queue is full are dropped for that stream only.
    #[arg(long, env, default_value_t = 16)]
    pub sse_subscriber_buffer: usize,

    /// Sentry DSN. Error reporting stays off when it isn't set.
    #[arg(long, env)]
    pub sentry_dsn: Option<String>,

    /// Environment reported to Sentry. `prod` or `production` also forwards log
    /// records to Sentry.
    #[arg(long, env)]
    pub sentry_environment: Option<String>,

    /// Seconds to wait for open connections to finish during shutdown
    #[arg(long, env, default_value_t = 60)]
    pub shutdown_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn set_redis_host(mut self, redis_host: Option<String>) -> Self {
        self.redis_host = redis_host;
        self
    }

    /// Redis connection settings, present only when a Redis host is configured.
    pub fn redis_settings(&self) -> Option<RedisSettings> {
        self.redis_host.as_ref().map(|host| RedisSettings {
            host: host.clone(),
            port: Some(self.redis_port),
            username: self.redis_user.clone(),
            password: self.redis_password.clone(),
        })
    }

    pub fn session_expiration(&self) -> Duration {
        Duration::from_secs(self.session_expiry_hours.saturating_mul(60 * 60))
    }

    pub fn sse_keepalive(&self) -> Duration {
        Duration::from_secs(self.sse_keepalive_secs.max(1))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn sentry_enabled(&self) -> bool {
        self.sentry_dsn.is_some()
    }

    /// Whether log records go to Sentry as well as the console.
    pub fn forward_logs_to_sentry(&self) -> bool {
        self.sentry_enabled()
            && matches!(
                self.sentry_environment.as_deref(),
                Some("prod" | "production")
            )
    }
}
