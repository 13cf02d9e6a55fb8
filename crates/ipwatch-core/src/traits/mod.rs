//! Collaborator traits for the ipwatch system
//!
//! - [`RecordStore`]: Read and replace published DNS records
//! - [`Notifier`]: Announce applied changes

pub mod notifier;
pub mod record_store;

pub use notifier::{Notifier, NotifierFactory, change_summary};
pub use record_store::{
    CHANGE_COMMENT, ChangeAction, ChangeInfo, RecordChange, RecordStore, RecordStoreFactory,
    RecordType, Zone,
};
