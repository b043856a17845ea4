//! Command-line flags and layered settings.
//!
//! Precedence, lowest first: built-in defaults, an optional config file,
//! `ACCESSWATCH_*` environment variables, then command-line flags.
//!
//! ```text
//! ACCESSWATCH_BASE_URL=http://door-ctl:8000
//! ACCESSWATCH_TRANSACTIONS__LIMIT=250
//! ACCESSWATCH_STATS__HOURS=48
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use accesswatch_types::AccessStatus;
use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::duration::parse_duration;
use crate::source::{
    StatsQuery, TransactionQuery, DEFAULT_HOURS, DEFAULT_LIMIT, STATS_INTERVAL,
    TRANSACTIONS_INTERVAL,
};
use crate::transport::{HttpTransport, Transport};

/// Backend root used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Largest page the backend serves.
pub const MAX_LIMIT: u32 = 1000;

/// Longest statistics window the backend accepts (two weeks).
pub const MAX_HOURS: u32 = 336;

#[derive(Parser, Debug, Default)]
#[command(name = "accesswatch")]
#[command(about = "Live terminal view of NFC access-control events and statistics")]
pub struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Backend root URL (e.g., "http://localhost:8000")
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Number of recent events to show
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Statistics window in hours
    #[arg(long)]
    pub hours: Option<u32>,

    /// Only show events with this outcome (GRANTED or DENIED)
    #[arg(long)]
    pub status: Option<AccessStatus>,

    /// Only show events for this badge UID
    #[arg(long)]
    pub uid: Option<String>,

    /// Event log refresh interval (e.g., "5s", "500ms")
    #[arg(long, value_parser = parse_duration)]
    pub events_interval: Option<Duration>,

    /// Statistics refresh interval (e.g., "10s", "1m")
    #[arg(long, value_parser = parse_duration)]
    pub stats_interval: Option<Duration>,

    /// Cookie header sent with every request (e.g., "session=abc123")
    #[arg(long)]
    pub cookie: Option<String>,

    /// Show times in UTC instead of local time
    #[arg(long)]
    pub utc: bool,

    /// Write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Probe the backend, fetch both resources once and exit
    #[arg(long, conflicts_with = "export")]
    pub check: bool,

    /// Fetch both resources once, write them to a JSON file and exit
    #[arg(short, long, conflicts_with = "check")]
    pub export: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    #[serde(default)]
    pub session_cookie: Option<String>,
    pub include_credentials: bool,
    pub request_timeout_ms: u64,
    pub utc: bool,
    pub transactions: TransactionSettings,
    pub stats: StatsSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionSettings {
    pub limit: u32,
    pub interval_ms: u64,
    #[serde(default)]
    pub status: Option<AccessStatus>,
    #[serde(default)]
    pub uid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsSettings {
    pub hours: u32,
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings from every layer and validate them.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("include_credentials", true)?
            .set_default("request_timeout_ms", 10_000i64)?
            .set_default("utc", false)?
            .set_default("transactions.limit", i64::from(DEFAULT_LIMIT))?
            .set_default("transactions.interval_ms", millis(TRANSACTIONS_INTERVAL))?
            .set_default("stats.hours", i64::from(DEFAULT_HOURS))?
            .set_default("stats.interval_ms", millis(STATS_INTERVAL))?
            .set_default("log.level", "info")?;

        if let Some(ref path) = cli.config {
            builder = builder.add_source(File::from(path.as_path()));
        }

        builder = builder.add_source(
            Environment::with_prefix("ACCESSWATCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .set_override_option("base_url", cli.base_url.clone())?
            .set_override_option("session_cookie", cli.cookie.clone())?
            .set_override_option("utc", cli.utc.then_some(true))?
            .set_override_option("transactions.limit", cli.limit.map(i64::from))?
            .set_override_option("transactions.interval_ms", cli.events_interval.map(millis))?
            .set_override_option("transactions.status", cli.status.map(|s| s.as_str()))?
            .set_override_option("transactions.uid", cli.uid.clone())?
            .set_override_option("stats.hours", cli.hours.map(i64::from))?
            .set_override_option("stats.interval_ms", cli.stats_interval.map(millis))?
            .set_override_option("log.file", cli.log_file.as_deref().map(path_string))?
            .build()
            .context("failed to load configuration")?;

        let settings: Settings = config
            .try_deserialize()
            .context("invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the backend or the pollers cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if !(1..=MAX_LIMIT).contains(&self.transactions.limit) {
            bail!(
                "transactions.limit must be between 1 and {}, got {}",
                MAX_LIMIT,
                self.transactions.limit
            );
        }
        if !(1..=MAX_HOURS).contains(&self.stats.hours) {
            bail!(
                "stats.hours must be between 1 and {}, got {}",
                MAX_HOURS,
                self.stats.hours
            );
        }
        if self.transactions.interval_ms == 0 || self.stats.interval_ms == 0 {
            bail!("refresh intervals must be greater than zero");
        }
        if self.request_timeout_ms == 0 {
            bail!("request_timeout_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn transaction_query(&self) -> TransactionQuery {
        TransactionQuery {
            limit: self.transactions.limit,
            status: self.transactions.status,
            uid: self.transactions.uid.clone(),
        }
    }

    pub fn stats_query(&self) -> StatsQuery {
        StatsQuery {
            hours: self.stats.hours,
        }
    }

    pub fn transactions_interval(&self) -> Duration {
        Duration::from_millis(self.transactions.interval_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Build the HTTP transport both sources share.
    pub fn build_transport(&self) -> Result<Arc<dyn Transport>> {
        let mut builder = HttpTransport::builder()
            .base_url(&self.base_url)
            .include_credentials(self.include_credentials)
            .timeout(self.request_timeout());
        if let Some(ref cookie) = self.session_cookie {
            builder = builder.session_cookie(cookie);
        }
        let transport = builder
            .build()
            .context("failed to build HTTP client")?;
        Ok(Arc::new(transport))
    }
}

fn millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
