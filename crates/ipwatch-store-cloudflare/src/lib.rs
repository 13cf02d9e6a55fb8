// # Cloudflare Record Store
//
// RecordStore implementation backed by the Cloudflare API v4.
//
// ## Behavior
//
// - Zones are resolved by exact name, or taken from a pre-configured zone ID
// - A lookup returns the content of every record with the name and type
// - An upsert replaces the record set completely: records already holding a
//   wanted value stay, spare records are overwritten, missing values are
//   created and surplus records deleted (see `plan`)
// - The operations of one upsert go out as a single batch request, which
//   Cloudflare applies all-or-nothing; a failed upsert leaves the old set
// - Dry-run mode performs every read but only logs the writes
// - HTTP timeout is 30 seconds; there are no retries, a failed call is
//   returned to the reconciler as-is
//
// ## Security
//
// - The API token never appears in logs or `Debug` output
// - Construction fails if the token is empty
//
// ## API Reference
//
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Batch DNS Records: POST `/zones/:zone_id/dns_records/batch`

mod api;
pub mod plan;

use async_trait::async_trait;
use chrono::Utc;
use ipwatch_core::config::StoreConfig;
use ipwatch_core::registry::PluginRegistry;
use ipwatch_core::traits::{
    ChangeInfo, RecordChange, RecordStore, RecordStoreFactory, RecordType, Zone,
};
use ipwatch_core::{Error, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{
    BatchBody, BatchPut, Envelope, PROVIDER, RecordBody, RecordRef, ZoneResult, status_error,
};
pub use crate::api::DnsRecord;
use crate::plan::{RecordOp, ReplacementPlan};

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records per page when listing; a record set never comes close
const PER_PAGE: &str = "100";

/// Cloudflare record store
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the store will:
/// - Perform all GET requests (zone lookup, record lookup)
/// - Log every operation the batch would carry
/// - **NOT** modify any record
pub struct CloudflareRecordStore {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Zone ID, skips the zone lookup when set
    zone_id: Option<String>,

    /// API root, overridable for tests
    base_url: String,

    client: reqwest::Client,

    /// Perform reads but only log writes
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareRecordStore")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareRecordStore {
    /// Create a new Cloudflare record store
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: Optional zone ID (looked up by name otherwise)
    /// - `dry_run`: If true, perform reads but skip writes
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token is empty or the HTTP
    /// client cannot be built.
    pub fn new(
        api_token: impl Into<String>,
        zone_id: Option<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id: zone_id.filter(|id| !id.is_empty()),
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Point the store at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, zone: &Zone) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone.id)
    }

    /// Send an authorized request and unwrap the response envelope
    async fn call<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let response = self.dispatch(request, context).await?;
        let response = checked(response, context).await?;
        decode(response, context).await
    }

    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<reqwest::Response> {
        request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| {
                Error::provider(PROVIDER, format!("{}: HTTP request failed: {}", context, e))
            })
    }

    /// List every record with this name and type
    async fn list_records(
        &self,
        zone: &Zone,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Vec<DnsRecord>> {
        let request = self.client.get(self.records_url(zone)).query(&[
            ("name", record_name),
            ("type", record_type.as_str()),
            ("per_page", PER_PAGE),
        ]);
        let records: Vec<DnsRecord> = self.call(request, "record lookup").await?;

        // The API matches names case-insensitively; keep only exact matches
        Ok(records
            .into_iter()
            .filter(|r| {
                r.name.eq_ignore_ascii_case(record_name) && r.record_type == record_type.as_str()
            })
            .collect())
    }

    /// Submit every operation of `plan` as one atomic batch
    async fn apply(&self, zone: &Zone, change: &RecordChange, plan: &ReplacementPlan) -> Result<()> {
        let url = format!("{}/batch", self.records_url(zone));
        let request = self.client.post(url).json(&batch_body(change, plan));
        let _: serde_json::Value = self.call(request, "record batch").await?;
        Ok(())
    }
}

/// Turn a non-success status into an error
async fn checked(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    Err(status_error(status, &body, context))
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, context: &str) -> Result<T> {
    let envelope: Envelope<T> = response.json().await.map_err(|e| {
        Error::provider(PROVIDER, format!("{}: failed to parse response: {}", context, e))
    })?;
    envelope.into_result(context)
}

fn record_body<'a>(change: &'a RecordChange, content: &'a str) -> RecordBody<'a> {
    RecordBody {
        record_type: change.record_type.as_str(),
        name: &change.name,
        content,
        ttl: change.ttl,
        proxied: false,
        comment: &change.comment,
    }
}

fn batch_body<'a>(change: &'a RecordChange, plan: &'a ReplacementPlan) -> BatchBody<'a> {
    let mut body = BatchBody::default();
    for op in &plan.ops {
        match op {
            RecordOp::Overwrite { id, content } => body.puts.push(BatchPut {
                id: id.as_str(),
                body: record_body(change, content),
            }),
            RecordOp::Create { content } => body.posts.push(record_body(change, content)),
            RecordOp::Delete { id } => body.deletes.push(RecordRef { id: id.as_str() }),
        }
    }
    body
}

fn describe(op: &RecordOp) -> String {
    match op {
        RecordOp::Overwrite { id, content } => format!("PUT record {} -> {}", id, content),
        RecordOp::Create { content } => format!("POST record {}", content),
        RecordOp::Delete { id } => format!("DELETE record {}", id),
    }
}

#[async_trait]
impl RecordStore for CloudflareRecordStore {
    async fn resolve_zone(&self, zone_name: &str) -> Result<Zone> {
        if let Some(ref zone_id) = self.zone_id {
            debug!("Using pre-configured zone ID for {}", zone_name);
            return Ok(Zone::new(zone_id.clone(), zone_name));
        }

        debug!("Looking up zone ID for: {}", zone_name);

        let request = self
            .client
            .get(format!("{}/zones", self.base_url))
            .query(&[("name", zone_name)]);
        let response = self.dispatch(request, "zone lookup").await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::zone_not_found(zone_name));
        }
        let response = checked(response, "zone lookup").await?;
        let zones: Vec<ZoneResult> = decode(response, "zone lookup").await?;

        let wanted = zone_name.trim_end_matches('.');
        let zone = zones
            .into_iter()
            .find(|z| z.name.trim_end_matches('.').eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::zone_not_found(zone_name))?;

        debug!("Found zone ID: {}", zone.id);
        Ok(Zone::new(zone.id, zone.name))
    }

    async fn lookup(
        &self,
        zone: &Zone,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>> {
        debug!("Looking up records: {} (type: {})", record_name, record_type);
        let records = self.list_records(zone, record_name, record_type).await?;
        Ok(records.into_iter().map(|r| r.content).collect())
    }

    async fn upsert(&self, zone: &Zone, change: &RecordChange) -> Result<ChangeInfo> {
        info!(
            "Replacing Cloudflare records: {} ({}) -> {:?} [mode: {}]",
            change.name,
            change.record_type,
            change.addresses,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        let existing = self.list_records(zone, &change.name, change.record_type).await?;
        let plan = ReplacementPlan::build(&existing, change);
        let (overwritten, created, deleted) = plan.counts();

        if plan.is_empty() {
            debug!("Records of {} already match", change.name);
        } else if self.dry_run {
            for op in &plan.ops {
                info!("[DRY-RUN] Would {}", describe(op));
            }
        } else {
            for op in &plan.ops {
                debug!("Batching {}", describe(op));
            }
            self.apply(zone, change, &plan).await?;
        }

        Ok(ChangeInfo {
            id: None,
            submitted_at: Utc::now(),
            detail: format!(
                "{}{} overwritten, {} created, {} deleted",
                if self.dry_run { "dry-run: " } else { "" },
                overwritten,
                created,
                deleted
            ),
            applied: !self.dry_run,
        })
    }

    fn store_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Cloudflare record stores
pub struct CloudflareFactory;

impl RecordStoreFactory for CloudflareFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
        match config {
            StoreConfig::Cloudflare {
                api_token,
                zone_id,
                dry_run,
            } => {
                if *dry_run {
                    warn!("Cloudflare store running in DRY-RUN mode - no changes will be made");
                }
                Ok(Box::new(CloudflareRecordStore::new(
                    api_token.clone(),
                    zone_id.clone(),
                    *dry_run,
                )?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare store")),
        }
    }
}

/// Register the Cloudflare store with a registry
///
/// # Example
///
/// ```rust
/// use ipwatch_core::PluginRegistry;
///
/// let registry = PluginRegistry::with_builtins();
/// ipwatch_store_cloudflare::register(&registry);
/// assert!(registry.has_store("cloudflare"));
/// ```
pub fn register(registry: &PluginRegistry) {
    registry.register_store(PROVIDER, Box::new(CloudflareFactory));
}
