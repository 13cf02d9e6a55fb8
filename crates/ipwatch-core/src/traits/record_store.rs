// # Record Store Trait
//
// Defines the interface for reading and writing published DNS records.
//
// ## Implementations
//
// - Cloudflare: `ipwatch-store-cloudflare` crate
// - In-memory: `ipwatch_core::store::MemoryRecordStore`
//
// ## Usage
//
// ```rust,ignore
// use ipwatch_core::traits::{RecordStore, RecordChange, RecordType};
//
// let zone = store.resolve_zone("example.com").await?;
// let existing = store.lookup(&zone, "a.example.com", RecordType::A).await?;
// let change = RecordChange::upsert("a.example.com", RecordType::A, vec!["1.2.3.4".into()], 60);
// store.upsert(&zone, &change).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Comment attached to every change submitted by ipwatch
pub const CHANGE_COMMENT: &str = "Update via ipwatch";

/// A provider zone: human name plus opaque provider identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Provider-specific zone identifier
    pub id: String,
    /// Zone name without trailing dot (e.g., "example.com")
    pub name: String,
}

impl Zone {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.id)
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// A record (IPv4)
    #[default]
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Provider wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Whether an address belongs in a record of this type
    ///
    /// Unparseable input is never accepted.
    pub fn accepts(&self, address: &str) -> bool {
        match address.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => *self == RecordType::A,
            Ok(IpAddr::V6(_)) => *self == RecordType::Aaaa,
            Err(_) => false,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of change submitted to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    /// Create the record set or replace its values entirely
    Upsert,
}

impl ChangeAction {
    /// Provider wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Upsert => "UPSERT",
        }
    }
}

/// A complete-replacement change for one record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChange {
    /// What to do with the record set
    pub action: ChangeAction,
    /// Record name without trailing dot
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// New value list, in presentation order
    pub addresses: Vec<String>,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Free-form change comment
    pub comment: String,
}

impl RecordChange {
    /// Create an upsert change carrying [`CHANGE_COMMENT`]
    pub fn upsert(
        name: impl Into<String>,
        record_type: RecordType,
        addresses: Vec<String>,
        ttl: u32,
    ) -> Self {
        Self {
            action: ChangeAction::Upsert,
            name: name.into(),
            record_type,
            addresses,
            ttl,
            comment: CHANGE_COMMENT.to_string(),
        }
    }
}

/// Confirmation returned by a successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeInfo {
    /// Provider change identifier, if the provider issues one
    pub id: Option<String>,
    /// When the change was accepted
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    /// Human-readable summary of what the provider did
    pub detail: String,
    /// False when the store only planned the change (dry-run)
    #[serde(default = "applied_default")]
    pub applied: bool,
}

fn applied_default() -> bool {
    true
}

/// Trait for record store implementations
///
/// A record store wraps one DNS provider API. It resolves zones, reads the
/// value list of one record set and replaces it.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Responsibilities
///
/// Stores are single-shot: one logical operation per call, errors returned
/// as-is. They never retry, never decide whether a write is needed, and
/// never remember anything between calls. Those decisions belong to the
/// [`Reconciler`](crate::Reconciler).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Resolve a hosted zone by exact name
    ///
    /// # Returns
    ///
    /// - `Ok(Zone)`: The zone
    /// - `Err(Error::ZoneNotFound)`: No zone with that name exists
    /// - `Err(Error)`: The lookup itself failed
    async fn resolve_zone(&self, zone_name: &str) -> Result<Zone, crate::Error>;

    /// Read the published values of one record set
    ///
    /// Only the first matching record set is consulted. A missing record set
    /// is `Ok(vec![])`, not an error.
    ///
    /// # Parameters
    ///
    /// - `zone`: Resolved zone
    /// - `record_name`: Record name without trailing dot
    /// - `record_type`: Record type to read
    async fn lookup(
        &self,
        zone: &Zone,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, crate::Error>;

    /// Replace the values of one record set
    ///
    /// The record set ends up holding exactly `change.addresses`.
    async fn upsert(&self, zone: &Zone, change: &RecordChange)
    -> Result<ChangeInfo, crate::Error>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}

/// Helper trait for constructing record stores from configuration
pub trait RecordStoreFactory: Send + Sync {
    /// Create a RecordStore instance from configuration
    fn create(
        &self,
        config: &crate::config::StoreConfig,
    ) -> Result<Box<dyn RecordStore>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(RecordType::A.as_str(), "A");
        assert_eq!(RecordType::Aaaa.to_string(), "AAAA");
        assert_eq!(ChangeAction::Upsert.as_str(), "UPSERT");
    }

    #[test]
    fn test_record_type_accepts_family() {
        assert!(RecordType::A.accepts("1.2.3.4"));
        assert!(!RecordType::A.accepts("2001:db8::1"));
        assert!(RecordType::Aaaa.accepts("2001:db8::1"));
        assert!(!RecordType::A.accepts("example.com"));
    }

    #[test]
    fn test_upsert_change_defaults() {
        let change = RecordChange::upsert("a.example.com", RecordType::A, vec!["1.2.3.4".into()], 60);
        assert_eq!(change.action, ChangeAction::Upsert);
        assert_eq!(change.comment, CHANGE_COMMENT);
    }
}
