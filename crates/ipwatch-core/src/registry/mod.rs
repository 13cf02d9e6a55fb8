//! Plugin-based registry
//!
//! The registry maps record store and notifier type names to factories, so
//! the binary can build collaborators from configuration without hardcoded
//! if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ipwatch_core::registry::PluginRegistry;
//!
//! let registry = PluginRegistry::with_builtins();
//! ipwatch_store_cloudflare::register(&registry);
//!
//! let store = registry.create_store(&config.store)?;
//! let notifier = registry.create_notifier(&config.notifier)?;
//! ```
//!
//! ## Registration
//!
//! Implementation crates expose a `register` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &PluginRegistry) {
//!     registry.register_store("cloudflare", Box::new(CloudflareFactory));
//! }
//! ```

use crate::config::{NotifierConfig, StoreConfig};
use crate::error::{Error, Result};
use crate::notify::LogNotifierFactory;
use crate::store::MemoryRecordStoreFactory;
use crate::traits::{Notifier, NotifierFactory, RecordStore, RecordStoreFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of record store and notifier factories
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct PluginRegistry {
    /// Registered record store factories
    stores: RwLock<HashMap<String, Box<dyn RecordStoreFactory>>>,

    /// Registered notifier factories
    notifiers: RwLock<HashMap<String, Box<dyn NotifierFactory>>>,
}

impl PluginRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the core's own `memory` store and `log` notifier
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryRecordStoreFactory));
        registry.register_notifier("log", Box::new(LogNotifierFactory));
        registry
    }

    /// Register a record store factory
    ///
    /// # Parameters
    ///
    /// - `name`: Store type name (e.g., "cloudflare", "memory")
    /// - `factory`: Factory object for creating store instances
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn RecordStoreFactory>) {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.insert(name.into(), factory);
    }

    /// Register a notifier factory
    ///
    /// # Parameters
    ///
    /// - `name`: Notifier type name (e.g., "slack", "log")
    /// - `factory`: Factory object for creating notifier instances
    pub fn register_notifier(&self, name: impl Into<String>, factory: Box<dyn NotifierFactory>) {
        let mut notifiers = self.notifiers.write().unwrap_or_else(PoisonError::into_inner);
        notifiers.insert(name.into(), factory);
    }

    /// Create a record store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn RecordStore>)`: Created store instance
    /// - `Err(Error)`: If the store type is not registered or creation fails
    pub fn create_store(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
        let store_type = config.type_name();
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);

        let factory = stores
            .get(store_type)
            .ok_or_else(|| Error::config(format!("Unknown record store type: {}", store_type)))?;

        factory.create(config)
    }

    /// Create a notifier from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Notifier>)`: Created notifier instance
    /// - `Err(Error)`: If the notifier type is not registered or creation fails
    pub fn create_notifier(&self, config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
        let notifier_type = config.type_name();
        let notifiers = self.notifiers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = notifiers
            .get(notifier_type)
            .ok_or_else(|| Error::config(format!("Unknown notifier type: {}", notifier_type)))?;

        factory.create(config)
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = stores.keys().cloned().collect();
        names.sort();
        names
    }

    /// List all registered notifier types
    pub fn list_notifiers(&self) -> Vec<String> {
        let notifiers = self.notifiers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = notifiers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.contains_key(name)
    }

    /// Check if a notifier type is registered
    pub fn has_notifier(&self, name: &str) -> bool {
        let notifiers = self.notifiers.read().unwrap_or_else(PoisonError::into_inner);
        notifiers.contains_key(name)
    }
}
