//! Command-line definitions
//!
//! Every flag falls back to an `IPWATCH_*` environment variable; a flag
//! given on the command line wins.

use clap::{Args, Parser, Subcommand, ValueEnum};
use ipwatch_core::config::{
    ErrorPolicy, NotifierConfig, ReconcilerConfig, StoreConfig, WatchConfig,
};
use ipwatch_core::traits::RecordType;
use tracing::Level;

/// ipwatch - keep DNS records in step with health-check reported addresses
#[derive(Parser, Debug)]
#[command(
    name = "ipwatch",
    version,
    about = "Keep DNS records in step with health-check reported addresses"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// The IP watcher
    #[command(long_about = "The IP watcher.\n\n\
                            Reads one health-check report from stdin and brings the A record \
                            of every managed domain in line with the addresses reported for \
                            its tag. Intended to run as a health-check watch handler.")]
    Watch(WatchArgs),
}

/// Record store backends selectable from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Cloudflare API v4
    Cloudflare,
    /// In-process store, starts empty every run
    Memory,
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Hosted zone to update
    #[arg(short = 'H', long, env = "IPWATCH_HOSTED_ZONE")]
    pub hosted_zone: String,

    /// Check ID whose instances carry the addresses
    #[arg(short = 'C', long, env = "IPWATCH_CHECK_ID")]
    pub check_id: Option<String>,

    /// Domain to keep in step, `fqdn` or `fqdn:tag` (repeatable, comma-separated)
    #[arg(
        short = 'D',
        long = "domain",
        env = "IPWATCH_DOMAIN",
        value_delimiter = ',',
        required = true
    )]
    pub domains: Vec<String>,

    /// Record store backend
    #[arg(long, env = "IPWATCH_STORE", value_enum, default_value = "cloudflare")]
    pub store: StoreKind,

    /// Cloudflare API token with Zone:DNS:Edit permission
    #[arg(long, env = "IPWATCH_CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    pub cloudflare_api_token: Option<String>,

    /// Cloudflare zone ID (looked up from the hosted zone name otherwise)
    #[arg(long, env = "IPWATCH_CLOUDFLARE_ZONE_ID")]
    pub cloudflare_zone_id: Option<String>,

    /// Perform reads but only log the writes
    #[arg(long, env = "IPWATCH_DRY_RUN")]
    pub dry_run: bool,

    /// Slack incoming-webhook URL; changes are only logged without it
    #[arg(long, env = "IPWATCH_SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub slack_webhook_url: Option<String>,

    /// Slack channel override
    #[arg(long, env = "IPWATCH_SLACK_CHANNEL")]
    pub slack_channel: Option<String>,

    /// Slack username override
    #[arg(long, env = "IPWATCH_SLACK_USERNAME")]
    pub slack_username: Option<String>,

    /// TTL written with every record, in seconds
    #[arg(long, env = "IPWATCH_TTL", default_value_t = 60)]
    pub ttl: u32,

    /// Keep going after a domain fails instead of stopping the run
    #[arg(long, env = "IPWATCH_CONTINUE_ON_ERROR")]
    pub continue_on_error: bool,

    /// Upper bound for one domain's read-diff-write, in seconds
    #[arg(long, env = "IPWATCH_DOMAIN_TIMEOUT_SECS")]
    pub domain_timeout_secs: Option<u64>,

    /// Log level
    #[arg(
        long,
        env = "IPWATCH_LOG_LEVEL",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,
}

impl WatchArgs {
    /// Build the watch configuration these arguments describe
    pub fn to_config(&self) -> WatchConfig {
        let store = match self.store {
            StoreKind::Cloudflare => StoreConfig::Cloudflare {
                api_token: self.cloudflare_api_token.clone().unwrap_or_default(),
                zone_id: self.cloudflare_zone_id.clone(),
                dry_run: self.dry_run,
            },
            StoreKind::Memory => StoreConfig::Memory,
        };

        let notifier = match self.slack_webhook_url.as_deref() {
            Some(url) if !url.is_empty() => NotifierConfig::Slack {
                webhook_url: url.to_string(),
                channel: self.slack_channel.clone(),
                username: self.slack_username.clone(),
            },
            _ => NotifierConfig::Log,
        };

        WatchConfig {
            hosted_zone: self.hosted_zone.clone(),
            check_id: self.check_id.clone().filter(|id| !id.is_empty()),
            domains: self.domains.clone(),
            store,
            notifier,
            engine: ReconcilerConfig {
                ttl: self.ttl,
                record_type: RecordType::A,
                on_error: if self.continue_on_error {
                    ErrorPolicy::ContinueOnError
                } else {
                    ErrorPolicy::FailFast
                },
                domain_timeout_secs: self.domain_timeout_secs,
            },
        }
    }

    pub fn log_level(&self) -> Level {
        match self.log_level.as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}
