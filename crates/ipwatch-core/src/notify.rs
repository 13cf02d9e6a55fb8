//! Built-in notifiers

use async_trait::async_trait;
use tracing::info;

use crate::Error;
use crate::config::NotifierConfig;
use crate::diff::DiffResult;
use crate::domain::Domain;
use crate::traits::notifier::{Notifier, NotifierFactory, change_summary};

/// Notifier that only writes the change to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, domain: &Domain, diff: &DiffResult) -> Result<(), Error> {
        info!("{}", change_summary(domain, diff));
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "log"
    }
}

/// Factory for creating log notifiers
pub struct LogNotifierFactory;

impl NotifierFactory for LogNotifierFactory {
    fn create(&self, config: &NotifierConfig) -> Result<Box<dyn Notifier>, Error> {
        match config {
            NotifierConfig::Log => Ok(Box::new(LogNotifier)),
            _ => Err(Error::config("Invalid config for log notifier")),
        }
    }
}
