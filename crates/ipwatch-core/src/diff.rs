//! Address set comparison
//!
//! Both sides are collapsed to sets before comparing, so duplicates and
//! ordering never count as a change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Deduplicated, sorted collection of addresses
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressSet(BTreeSet<String>);

impl AddressSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: impl Into<String>) -> bool {
        self.0.insert(address.into())
    }

    pub fn contains(&self, address: &str) -> bool {
        self.0.contains(address)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Addresses in presentation order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Addresses in presentation order, owned
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Addresses present in `self` but not in `other`
    pub fn difference(&self, other: &AddressSet) -> AddressSet {
        AddressSet(self.0.difference(&other.0).cloned().collect())
    }
}

impl<S: Into<String>> FromIterator<S> for AddressSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        AddressSet(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.to_vec().join(", "))
    }
}

/// Outcome of comparing published and observed addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Observed but not yet published
    pub added: AddressSet,
    /// Published but no longer observed
    pub removed: AddressSet,
    /// True iff `added` or `removed` is non-empty
    pub changed: bool,
}

impl DiffResult {
    pub fn is_changed(&self) -> bool {
        self.changed
    }
}

/// Compare the published addresses against the observed ones
pub fn diff<E, O>(existing: E, observed: O) -> DiffResult
where
    E: IntoIterator,
    E::Item: Into<String>,
    O: IntoIterator,
    O::Item: Into<String>,
{
    let existing: AddressSet = existing.into_iter().collect();
    let observed: AddressSet = observed.into_iter().collect();

    let added = observed.difference(&existing);
    let removed = existing.difference(&observed);
    let changed = !added.is_empty() || !removed.is_empty();

    DiffResult {
        added,
        removed,
        changed,
    }
}
