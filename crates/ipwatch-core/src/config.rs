//! Configuration types for the ipwatch system
//!
//! The whole configuration is built once at startup and handed to the
//! reconciler; nothing in the core reads flags or the environment.

use crate::domain::{Domain, build_domains};
use crate::traits::RecordType;
use serde::{Deserialize, Serialize};

/// Main configuration for one watch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Hosted zone holding the managed records (e.g., "example.com")
    pub hosted_zone: String,

    /// Only use observations from this check
    #[serde(default)]
    pub check_id: Option<String>,

    /// Domain specs, `fqdn` or `fqdn:tag`, in reconcile order
    pub domains: Vec<String>,

    /// Record store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Notifier configuration
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Reconciler settings
    #[serde(default)]
    pub engine: ReconcilerConfig,
}

impl WatchConfig {
    /// Create a configuration with default store, notifier and engine settings
    pub fn new(hosted_zone: impl Into<String>, domains: Vec<String>) -> Self {
        Self {
            hosted_zone: hosted_zone.into(),
            check_id: None,
            domains,
            store: StoreConfig::default(),
            notifier: NotifierConfig::default(),
            engine: ReconcilerConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        let zone = self.zone_name();
        if zone.is_empty() {
            return Err(crate::Error::config("hosted zone is required"));
        }
        crate::domain::validate_domain_name(zone)
            .map_err(|e| crate::Error::config(format!("invalid hosted zone: {}", e)))?;

        if self.check_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(crate::Error::config("check id cannot be blank"));
        }

        self.store.validate()?;
        self.notifier.validate()?;
        self.engine.validate()?;

        Ok(())
    }

    /// Hosted zone name without trailing dot
    pub fn zone_name(&self) -> &str {
        let zone = self.hosted_zone.trim();
        zone.strip_suffix('.').unwrap_or(zone)
    }

    /// Parse the domain specs
    pub fn build_domains(&self) -> Result<Vec<Domain>, crate::Error> {
        build_domains(&self.domains)
    }
}

/// Record store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Cloudflare DNS
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// Zone ID (optional, looked up by name otherwise)
        zone_id: Option<String>,
        /// Perform reads but only log writes
        #[serde(default)]
        dry_run: bool,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// Custom store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Cloudflare { api_token, .. } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom store factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom store config cannot be null"));
                }
                Ok(())
            }
            StoreConfig::Memory => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Cloudflare { .. } => "cloudflare",
            StoreConfig::Memory => "memory",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Notifier configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Slack incoming webhook
    Slack {
        /// Webhook URL (secret)
        webhook_url: String,
        /// Channel override
        #[serde(default)]
        channel: Option<String>,
        /// Username override
        #[serde(default)]
        username: Option<String>,
    },

    /// Log changes only
    #[default]
    Log,

    /// Custom notifier
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl NotifierConfig {
    /// Validate the notifier configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            NotifierConfig::Slack { webhook_url, .. } => {
                if !webhook_url.starts_with("https://") && !webhook_url.starts_with("http://") {
                    return Err(crate::Error::config(
                        "Slack webhook URL must use HTTP or HTTPS scheme",
                    ));
                }
                Ok(())
            }
            NotifierConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom notifier factory cannot be empty",
                    ));
                }
                Ok(())
            }
            NotifierConfig::Log => Ok(()),
        }
    }

    /// Get the notifier type name
    pub fn type_name(&self) -> &str {
        match self {
            NotifierConfig::Slack { .. } => "slack",
            NotifierConfig::Log => "log",
            NotifierConfig::Custom { factory, .. } => factory,
        }
    }
}

/// What to do when a domain's store read or write fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Abort the run on the first failure
    #[default]
    FailFast,
    /// Record the failure and move on to the next domain
    ContinueOnError,
}

/// Reconciler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// TTL written with every record (seconds)
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Record type managed for every domain
    #[serde(default)]
    pub record_type: RecordType,

    /// Failure handling across domains
    #[serde(default)]
    pub on_error: ErrorPolicy,

    /// Upper bound for one domain's read-diff-write, in seconds
    #[serde(default)]
    pub domain_timeout_secs: Option<u64>,
}

impl ReconcilerConfig {
    /// Validate the reconciler settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.ttl == 0 {
            return Err(crate::Error::config("TTL must be > 0"));
        }
        if self.domain_timeout_secs == Some(0) {
            return Err(crate::Error::config("domain timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            record_type: RecordType::default(),
            on_error: ErrorPolicy::default(),
            domain_timeout_secs: None,
        }
    }
}

fn default_ttl() -> u32 {
    60
}
