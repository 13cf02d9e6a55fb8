// # Notifier Trait
//
// Best-effort announcement of applied record changes.
//
// ## Implementations
//
// - Slack incoming webhook: `ipwatch-notify-slack` crate
// - Log only: `ipwatch_core::notify::LogNotifier`

use async_trait::async_trait;

use crate::diff::DiffResult;
use crate::domain::Domain;

/// Trait for notifier implementations
///
/// Called once per domain whose record was just replaced. A failed
/// notification is logged by the reconciler and never aborts the run, so
/// implementations should simply return the error.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce a change applied to `domain`
    async fn notify(&self, domain: &Domain, diff: &DiffResult) -> Result<(), crate::Error>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}

/// Helper trait for constructing notifiers from configuration
pub trait NotifierFactory: Send + Sync {
    /// Create a Notifier instance from configuration
    fn create(
        &self,
        config: &crate::config::NotifierConfig,
    ) -> Result<Box<dyn Notifier>, crate::Error>;
}

/// Render the one-line summary notifiers use for a change
pub fn change_summary(domain: &Domain, diff: &DiffResult) -> String {
    format!(
        "{} updated: added {}, removed {}",
        domain.fqdn, diff.added, diff.removed
    )
}
