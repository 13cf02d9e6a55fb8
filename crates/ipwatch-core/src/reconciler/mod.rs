//! Reconciler
//!
//! The Reconciler is responsible for:
//! - Selecting each domain's observed addresses from the report
//! - Reading the currently published record set
//! - Replacing the record set when the two differ
//! - Announcing applied changes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ CheckReport │─── observations ───┐
//! └─────────────┘                    │
//!                                    ▼
//!                           ┌──────────────┐
//!                           │  Reconciler  │
//!                           └──────────────┘
//!                                    │
//!         ┌──────────────────────────┼──────────────────────────┐
//!         │                          │                          │
//!         ▼                          ▼                          ▼
//! ┌─────────────┐           ┌──────────────┐           ┌─────────────┐
//! │ RecordStore │           │ RecordStore  │           │  Notifier   │
//! │  (lookup)   │           │  (upsert)    │           │ (announce)  │
//! └─────────────┘           └──────────────┘           └─────────────┘
//! ```
//!
//! ## Flow per domain
//!
//! 1. Collect addresses of observations tagged with the domain's tag
//! 2. No addresses: skip the domain, never publish an empty set
//! 3. Look up the published record set
//! 4. Diff published against observed
//! 5. If changed, upsert the full observed set
//! 6. If the store applied the write, notify
//!
//! The per-domain timeout bounds steps 3 to 5. The notifier gets its own
//! bound of the same length, and running out of it is only a warning.
//!
//! Domains are handled strictly in configured order. Nothing is retried.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::{ErrorPolicy, ReconcilerConfig, WatchConfig};
use crate::diff::{AddressSet, DiffResult, diff};
use crate::domain::Domain;
use crate::error::{Error, ErrorKind, Result};
use crate::report::CheckReport;
use crate::traits::{ChangeInfo, Notifier, RecordChange, RecordStore, Zone};

/// What happened to one domain during a run
#[derive(Debug, Clone)]
pub enum Outcome {
    /// No observation matched the domain's tag; nothing was touched
    Skipped,

    /// Published record already matches
    Unchanged {
        /// The observed (and published) addresses
        addresses: AddressSet,
    },

    /// Record set was replaced
    Updated {
        /// Difference that triggered the write
        diff: DiffResult,
        /// Change submitted to the store
        change: RecordChange,
        /// Store confirmation
        info: ChangeInfo,
        /// Whether the notifier accepted the announcement
        notified: bool,
    },

    /// Store accepted the change without writing it (dry-run); not announced
    DryRun {
        diff: DiffResult,
        change: RecordChange,
        info: ChangeInfo,
    },

    /// Store read/write failed (only recorded under continue-on-error)
    Failed {
        /// Error message
        error: String,
    },
}

/// Per-domain entry of a [`RunResult`]
#[derive(Debug, Clone)]
pub struct DomainReport {
    pub domain: Domain,
    pub outcome: Outcome,
}

/// Result of one reconciliation run
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Zone the run wrote to
    pub zone: Zone,
    /// Per-domain outcomes, in processing order
    pub domains: Vec<DomainReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.domains.iter().filter(|d| pred(&d.outcome)).count()
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Updated { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Unchanged { .. }))
    }

    pub fn dry_run(&self) -> usize {
        self.count(|o| matches!(o, Outcome::DryRun { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    /// True when no domain failed
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// One-line summary for the end-of-run log
    pub fn summary(&self) -> String {
        format!(
            "zone {}: {} updated, {} dry-run, {} unchanged, {} skipped, {} failed in {}ms",
            self.zone,
            self.updated(),
            self.dry_run(),
            self.unchanged(),
            self.skipped(),
            self.failed(),
            (self.finished_at - self.started_at).num_milliseconds()
        )
    }
}

/// Reconciles configured domains against a record store
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`] or [`Reconciler::from_config()`]
/// 2. Call [`Reconciler::run()`] once per report
///
/// ## Failure handling
///
/// Under [`ErrorPolicy::FailFast`] the first store error ends the run and is
/// returned; writes already applied to earlier domains stay in place. Under
/// [`ErrorPolicy::ContinueOnError`] the error is recorded as
/// [`Outcome::Failed`] and the next domain is attempted. Notifier errors
/// never end the run.
pub struct Reconciler {
    /// Record store for reading and writing records
    store: Box<dyn RecordStore>,

    /// Notifier for applied changes
    notifier: Box<dyn Notifier>,

    /// Hosted zone name
    hosted_zone: String,

    /// Reconciler settings
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `store`: Record store implementation
    /// - `notifier`: Notifier implementation
    /// - `hosted_zone`: Zone holding the managed records
    /// - `config`: Reconciler settings
    pub fn new(
        store: Box<dyn RecordStore>,
        notifier: Box<dyn Notifier>,
        hosted_zone: impl Into<String>,
        config: ReconcilerConfig,
    ) -> Result<Self> {
        config.validate()?;

        let hosted_zone = hosted_zone.into();
        if hosted_zone.is_empty() {
            return Err(Error::config("hosted zone is required"));
        }

        Ok(Self {
            store,
            notifier,
            hosted_zone,
            config,
        })
    }

    /// Create a reconciler from a full watch configuration
    pub fn from_config(
        store: Box<dyn RecordStore>,
        notifier: Box<dyn Notifier>,
        config: &WatchConfig,
    ) -> Result<Self> {
        Self::new(store, notifier, config.zone_name(), config.engine.clone())
    }

    /// Resolve the hosted zone, then reconcile every domain
    ///
    /// # Returns
    ///
    /// - `Ok(RunResult)`: All domains were handled
    /// - `Err(Error::ZoneNotFound)`: Nothing was processed
    /// - `Err(Error)`: A store error aborted the run (fail-fast)
    pub async fn run(&self, domains: &[Domain], report: &CheckReport) -> Result<RunResult> {
        let zone = match self.store.resolve_zone(&self.hosted_zone).await {
            Ok(zone) => zone,
            Err(e) => {
                error!("Failed to resolve hosted zone {}: {}", self.hosted_zone, e);
                return Err(e);
            }
        };
        info!("Using hosted zone {} via {}", zone, self.store.store_name());

        self.reconcile(&zone, domains, report).await
    }

    /// Reconcile every domain against an already resolved zone
    pub async fn reconcile(
        &self,
        zone: &Zone,
        domains: &[Domain],
        report: &CheckReport,
    ) -> Result<RunResult> {
        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(domains.len());

        for domain in domains {
            info!("Handling domain: {} (tag: {})", domain.fqdn, domain.tag);

            let outcome = match self.reconcile_bounded(zone, domain, report).await {
                Ok(outcome) => self.announce(domain, outcome).await,
                Err(e) => {
                    error!(
                        "Failed to reconcile {} in zone {}: {}",
                        domain.fqdn, zone.name, e
                    );
                    match self.config.on_error {
                        ErrorPolicy::FailFast => return Err(e),
                        ErrorPolicy::ContinueOnError => Outcome::Failed {
                            error: e.to_string(),
                        },
                    }
                }
            };

            reports.push(DomainReport {
                domain: domain.clone(),
                outcome,
            });
        }

        let result = RunResult {
            zone: zone.clone(),
            domains: reports,
            started_at,
            finished_at: Utc::now(),
        };
        info!("Run finished: {}", result.summary());

        Ok(result)
    }

    async fn reconcile_bounded(
        &self,
        zone: &Zone,
        domain: &Domain,
        report: &CheckReport,
    ) -> Result<Outcome> {
        match self.config.domain_timeout_secs {
            Some(secs) => tokio::time::timeout(
                Duration::from_secs(secs),
                self.reconcile_domain(zone, domain, report),
            )
            .await
            .map_err(|_| Error::Timeout {
                domain: domain.fqdn.clone(),
                secs,
            })?,
            None => self.reconcile_domain(zone, domain, report).await,
        }
    }

    /// Read, diff and (if needed) write one domain
    ///
    /// An applied write comes back as `Updated` with `notified: false`;
    /// [`Reconciler::announce`] fills that in.
    async fn reconcile_domain(
        &self,
        zone: &Zone,
        domain: &Domain,
        report: &CheckReport,
    ) -> Result<Outcome> {
        let observed = self.observed_addresses(domain, report);
        if observed.is_empty() {
            warn!(
                "No addresses observed for {} (tag: {}), skipping for fail-safe",
                domain.fqdn, domain.tag
            );
            return Ok(Outcome::Skipped);
        }
        info!("Observed addresses for {}: {}", domain.fqdn, observed);

        let record_type = self.config.record_type;
        let existing = self
            .store
            .lookup(zone, &domain.fqdn, record_type)
            .await
            .map_err(|e| Error::store_read(&domain.fqdn, e.to_string()))?;
        debug!("Existing addresses for {}: {:?}", domain.fqdn, existing);

        let result = diff(existing, observed.iter());
        if !result.is_changed() {
            info!("No change for {}, skipping", domain.fqdn);
            return Ok(Outcome::Unchanged {
                addresses: observed,
            });
        }

        info!(
            "Change for {}: added {}, removed {}",
            domain.fqdn, result.added, result.removed
        );

        let change = RecordChange::upsert(
            domain.fqdn.clone(),
            record_type,
            observed.to_vec(),
            self.config.ttl,
        );
        let info = self
            .store
            .upsert(zone, &change)
            .await
            .map_err(|e| Error::store_write(&domain.fqdn, e.to_string()))?;

        if !info.applied {
            info!("[DRY-RUN] Would update {}: {}", domain.fqdn, info.detail);
            return Ok(Outcome::DryRun {
                diff: result,
                change,
                info,
            });
        }
        info!("Updated {}: {}", domain.fqdn, info.detail);

        Ok(Outcome::Updated {
            diff: result,
            change,
            info,
            notified: false,
        })
    }

    /// Announce an applied change; every other outcome passes through
    ///
    /// The write is already committed here, so a failed or slow notifier
    /// only costs a warning.
    async fn announce(&self, domain: &Domain, outcome: Outcome) -> Outcome {
        let Outcome::Updated {
            diff, change, info, ..
        } = outcome
        else {
            return outcome;
        };

        let delivery = match self.config.domain_timeout_secs {
            Some(secs) => tokio::time::timeout(
                Duration::from_secs(secs),
                self.notifier.notify(domain, &diff),
            )
            .await
            .unwrap_or_else(|_| {
                Err(Error::notify(
                    &domain.fqdn,
                    format!("notifier timed out after {}s", secs),
                ))
            }),
            None => self.notifier.notify(domain, &diff).await,
        };

        let notified = match delivery {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "{} (via {})",
                    notify_failure(domain, e),
                    self.notifier.notifier_name()
                );
                false
            }
        };

        Outcome::Updated {
            diff,
            change,
            info,
            notified,
        }
    }

    /// Addresses observed for `domain` that fit the managed record type
    fn observed_addresses(&self, domain: &Domain, report: &CheckReport) -> AddressSet {
        let record_type = self.config.record_type;
        let mut observed = AddressSet::new();

        for address in report.addresses_for_tag(&domain.tag) {
            if record_type.accepts(address) {
                observed.insert(address);
            } else {
                warn!(
                    "Ignoring {} for {}: not usable in a {} record",
                    address, domain.fqdn, record_type
                );
            }
        }

        observed
    }
}

/// Attach the domain to a notifier error unless the notifier already did
fn notify_failure(domain: &Domain, e: Error) -> Error {
    match e.kind() {
        ErrorKind::Notify => e,
        _ => Error::notify(&domain.fqdn, e.to_string()),
    }
}
