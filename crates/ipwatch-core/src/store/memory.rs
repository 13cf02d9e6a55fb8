// # Memory Record Store
//
// In-memory implementation of RecordStore.
//
// ## Purpose
//
// Holds zones and record sets in a HashMap. Nothing survives the process,
// which makes it useful for tests and for trial runs without provider
// credentials: the reconciler's decisions are logged as usual, but the
// "published" state starts empty every run.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::StoreConfig;
use crate::Error;
use crate::traits::record_store::{
    ChangeInfo, RecordChange, RecordStore, RecordStoreFactory, RecordType, Zone,
};

type RecordKey = (String, String, RecordType);

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<RecordKey, Vec<String>>,
    changes: Vec<(Zone, RecordChange)>,
}

/// In-memory record store implementation
///
/// # Example
///
/// ```rust,no_run
/// use ipwatch_core::store::MemoryRecordStore;
/// use ipwatch_core::traits::{RecordStore, RecordType};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryRecordStore::new().with_zone("Z1", "example.com");
///     let zone = store.resolve_zone("example.com").await?;
///
///     let ips = store.lookup(&zone, "a.example.com", RecordType::A).await?;
///     assert!(ips.is_empty());
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<Inner>>,
    zones: HashMap<String, Zone>,
    /// Resolve any zone name
    permissive: bool,
}

impl MemoryRecordStore {
    /// Create an empty store that only knows zones added with [`with_zone`](Self::with_zone)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that resolves every zone name
    pub fn permissive() -> Self {
        Self {
            permissive: true,
            ..Self::default()
        }
    }

    /// Register a zone
    pub fn with_zone(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        let zone = Zone::new(id, name);
        self.zones.insert(zone.name.clone(), zone);
        self
    }

    /// Seed a record set
    pub async fn set_record(
        &self,
        zone: &Zone,
        record_name: &str,
        record_type: RecordType,
        addresses: Vec<String>,
    ) {
        let mut guard = self.inner.write().await;
        guard.records.insert(
            (zone.id.clone(), record_name.to_string(), record_type),
            addresses,
        );
    }

    /// Current values of a record set
    pub async fn record(
        &self,
        zone: &Zone,
        record_name: &str,
        record_type: RecordType,
    ) -> Option<Vec<String>> {
        let guard = self.inner.read().await;
        guard
            .records
            .get(&(zone.id.clone(), record_name.to_string(), record_type))
            .cloned()
    }

    /// Every change applied so far, oldest first
    pub async fn changes(&self) -> Vec<(Zone, RecordChange)> {
        self.inner.read().await.changes.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn resolve_zone(&self, zone_name: &str) -> Result<Zone, Error> {
        match self.zones.get(zone_name) {
            Some(zone) => Ok(zone.clone()),
            None if self.permissive => {
                Ok(Zone::new(format!("memory-{}", zone_name), zone_name))
            }
            None => Err(Error::zone_not_found(zone_name)),
        }
    }

    async fn lookup(
        &self,
        zone: &Zone,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, Error> {
        Ok(self
            .record(zone, record_name, record_type)
            .await
            .unwrap_or_default())
    }

    async fn upsert(&self, zone: &Zone, change: &RecordChange) -> Result<ChangeInfo, Error> {
        let mut guard = self.inner.write().await;
        guard.records.insert(
            (zone.id.clone(), change.name.clone(), change.record_type),
            change.addresses.clone(),
        );
        guard.changes.push((zone.clone(), change.clone()));

        Ok(ChangeInfo {
            id: Some(format!("memory-change-{}", guard.changes.len())),
            submitted_at: chrono::Utc::now(),
            detail: format!(
                "{} {} {} -> {:?}",
                change.action.as_str(),
                change.name,
                change.record_type,
                change.addresses
            ),
            applied: true,
        })
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory record stores
pub struct MemoryRecordStoreFactory;

impl RecordStoreFactory for MemoryRecordStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>, Error> {
        match config {
            StoreConfig::Memory => Ok(Box::new(MemoryRecordStore::permissive())),
            _ => Err(Error::config("Invalid config for memory store")),
        }
    }
}
