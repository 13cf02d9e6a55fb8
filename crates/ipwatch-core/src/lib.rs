// # ipwatch-core
//
// Core library reconciling health-check reported addresses against DNS
// records.
//
// ## Architecture Overview
//
// - **report**: Parses the watch process's health-check report into
//   `(tag, address)` observations
// - **domain**: Managed domain names and the tag selecting their addresses
// - **diff**: Order- and duplicate-insensitive comparison of address sets
// - **Reconciler**: Per domain, reads the published record, diffs, writes
//   and notifies
// - **RecordStore / Notifier**: Traits for the DNS provider and the
//   announcement sink
// - **PluginRegistry**: Builds stores and notifiers from configuration
//
// ## Design Principles
//
// 1. **Fail-safe**: An empty observation set never reaches the record store
// 2. **Idempotency**: Identical sets never cause a write
// 3. **Determinism**: Domains run in configured order, payloads are sorted
// 4. **Library-First**: The binary is a thin layer over this crate

pub mod config;
pub mod diff;
pub mod domain;
pub mod error;
pub mod notify;
pub mod reconciler;
pub mod registry;
pub mod report;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{ErrorPolicy, NotifierConfig, ReconcilerConfig, StoreConfig, WatchConfig};
pub use diff::{AddressSet, DiffResult, diff};
pub use domain::{Domain, build_domains};
pub use error::{Error, ErrorKind, Result};
pub use notify::LogNotifier;
pub use reconciler::{DomainReport, Outcome, Reconciler, RunResult};
pub use registry::PluginRegistry;
pub use report::{CheckReport, Observation, parse_report, read_report};
pub use store::MemoryRecordStore;
pub use traits::{Notifier, RecordStore};
