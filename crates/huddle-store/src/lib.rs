//! # huddle-store
//!
//! Whole-state snapshot persistence for the Huddle workspace.
//!
//! The store exposes exactly three entry points ([`SnapshotStore::load`],
//! [`SnapshotStore::save`] and [`SnapshotStore::clear`]) and is injected
//! into every component that needs state; no component holds ad hoc global
//! state. Each operation treats a load as "the latest snapshot" and a save
//! as "replace the snapshot"; with single-threaded request processing both
//! are effectively atomic.

mod error;
mod snapshot;

pub use error::{Result, StoreError};
pub use snapshot::SnapshotStore;
