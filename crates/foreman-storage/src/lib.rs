// SPDX-License-Identifier: MIT

//! Durable per-project state for the build harness (§4.1): write-ahead log,
//! periodic snapshots, the materialized-state projection folded from them,
//! and the typed [`Store`] surface everything else talks to.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod checkpoint;
mod error;
mod migration;
mod snapshot;
mod state;
mod store;
mod wal;

pub use checkpoint::{load_snapshot, Checkpointer};
pub use error::StoreError;
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::{EventRing, MaterializedState};
pub use store::{FeatureContentUpdate, FeatureFilter, FeatureGroups, NewFeature, SpecUpdateApply, Store};
pub use wal::{Wal, WalEntry, WalError};
