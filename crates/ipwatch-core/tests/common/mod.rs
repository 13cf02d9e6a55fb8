//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles count calls and can be told to fail, so tests can assert
//! exactly which collaborator calls a run made.

#![allow(dead_code)]

use ipwatch_core::diff::DiffResult;
use ipwatch_core::domain::Domain;
use ipwatch_core::error::{Error, Result};
use ipwatch_core::report::{CheckReport, Observation};
use ipwatch_core::traits::{ChangeInfo, Notifier, RecordChange, RecordStore, RecordType, Zone};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ZONE_NAME: &str = "example.com";
pub const ZONE_ID: &str = "Z-TEST";

#[derive(Default)]
struct StoreState {
    records: Mutex<HashMap<String, Vec<String>>>,
    upserts: Mutex<Vec<RecordChange>>,
    lookups: Mutex<Vec<String>>,
    resolve_call_count: AtomicUsize,
    fail_read: Mutex<HashSet<String>>,
    fail_write: Mutex<HashSet<String>>,
    lookup_delay: Mutex<Option<Duration>>,
    zone_missing: Mutex<bool>,
    dry_run: Mutex<bool>,
}

/// A mock RecordStore that tracks calls
///
/// Clones share state, so a test can keep one handle after boxing another
/// into the reconciler.
#[derive(Clone, Default)]
pub struct MockRecordStore {
    state: Arc<StoreState>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the published values of a record
    pub fn with_record(self, name: &str, addresses: &[&str]) -> Self {
        self.state.records.lock().unwrap().insert(
            name.to_string(),
            addresses.iter().map(|a| a.to_string()).collect(),
        );
        self
    }

    /// Make lookups of `name` fail
    pub fn failing_read(self, name: &str) -> Self {
        self.state.fail_read.lock().unwrap().insert(name.to_string());
        self
    }

    /// Make upserts of `name` fail
    pub fn failing_write(self, name: &str) -> Self {
        self.state.fail_write.lock().unwrap().insert(name.to_string());
        self
    }

    /// Delay every lookup
    pub fn slow_lookups(self, delay: Duration) -> Self {
        *self.state.lookup_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Report the hosted zone as absent
    pub fn without_zone(self) -> Self {
        *self.state.zone_missing.lock().unwrap() = true;
        self
    }

    /// Accept upserts without writing them, like a store in dry-run mode
    pub fn dry_run(self) -> Self {
        *self.state.dry_run.lock().unwrap() = true;
        self
    }

    pub fn resolve_call_count(&self) -> usize {
        self.state.resolve_call_count.load(Ordering::SeqCst)
    }

    /// Record names looked up, in call order
    pub fn lookups(&self) -> Vec<String> {
        self.state.lookups.lock().unwrap().clone()
    }

    /// Changes submitted, in call order
    pub fn upserts(&self) -> Vec<RecordChange> {
        self.state.upserts.lock().unwrap().clone()
    }

    pub fn upsert_call_count(&self) -> usize {
        self.state.upserts.lock().unwrap().len()
    }

    pub fn published(&self, name: &str) -> Option<Vec<String>> {
        self.state.records.lock().unwrap().get(name).cloned()
    }
}

#[async_trait::async_trait]
impl RecordStore for MockRecordStore {
    async fn resolve_zone(&self, zone_name: &str) -> Result<Zone> {
        self.state.resolve_call_count.fetch_add(1, Ordering::SeqCst);
        if *self.state.zone_missing.lock().unwrap() || zone_name != ZONE_NAME {
            return Err(Error::zone_not_found(zone_name));
        }
        Ok(Zone::new(ZONE_ID, ZONE_NAME))
    }

    async fn lookup(
        &self,
        _zone: &Zone,
        record_name: &str,
        _record_type: RecordType,
    ) -> Result<Vec<String>> {
        self.state.lookups.lock().unwrap().push(record_name.to_string());

        let delay = *self.state.lookup_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.state.fail_read.lock().unwrap().contains(record_name) {
            return Err(Error::provider("mock", "injected read failure"));
        }
        Ok(self
            .state
            .records
            .lock()
            .unwrap()
            .get(record_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert(&self, _zone: &Zone, change: &RecordChange) -> Result<ChangeInfo> {
        self.state.upserts.lock().unwrap().push(change.clone());

        if self.state.fail_write.lock().unwrap().contains(&change.name) {
            return Err(Error::provider("mock", "injected write failure"));
        }
        if *self.state.dry_run.lock().unwrap() {
            return Ok(ChangeInfo {
                id: None,
                submitted_at: chrono::Utc::now(),
                detail: format!("dry-run: {} {}", change.action.as_str(), change.name),
                applied: false,
            });
        }
        self.state
            .records
            .lock()
            .unwrap()
            .insert(change.name.clone(), change.addresses.clone());

        Ok(ChangeInfo {
            id: Some("mock-change".to_string()),
            submitted_at: chrono::Utc::now(),
            detail: format!("{} {}", change.action.as_str(), change.name),
            applied: true,
        })
    }

    fn store_name(&self) -> &'static str {
        "mock"
    }
}

/// A mock Notifier that records every announcement
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    calls: Arc<Mutex<Vec<(String, DiffResult)>>>,
    failing: bool,
    delay: Option<Duration>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every call fails (after being recorded)
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// A notifier that takes `delay` to answer each call
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Notified domain names with their diffs, in call order
    pub fn calls(&self) -> Vec<(String, DiffResult)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, domain: &Domain, diff: &DiffResult) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((domain.fqdn.clone(), diff.clone()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(Error::http("webhook returned 500"));
        }
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "recording"
    }
}

/// Build a report from `(tag, address)` pairs
pub fn report(pairs: &[(&str, &str)]) -> CheckReport {
    CheckReport::new(
        None,
        pairs
            .iter()
            .map(|(tag, addr)| Observation::new(*tag, *addr))
            .collect(),
    )
}

/// Parse domain specs, panicking on invalid input
pub fn domains(specs: &[&str]) -> Vec<Domain> {
    ipwatch_core::build_domains(specs).expect("valid domain specs")
}
