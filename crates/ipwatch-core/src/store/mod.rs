// # Record Store Implementations
//
// Record stores that ship with the core crate. Provider-backed stores live
// in their own crates.

pub mod memory;

pub use memory::{MemoryRecordStore, MemoryRecordStoreFactory};
