// SPDX-License-Identifier: MIT

//! Ties [`crate::wal::Wal`] and [`crate::snapshot::Snapshot`] together: take
//! a full-state snapshot, then truncate the WAL entries it now covers
//! (§4.1 "Snapshot/checkpoint").

use crate::migration::MigrationRegistry;
use crate::snapshot::{rotate_bak_path, Snapshot, SnapshotError};
use crate::state::MaterializedState;
use crate::wal::Wal;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub struct Checkpointer {
    snapshot_path: PathBuf,
    migrations: MigrationRegistry,
}

impl Checkpointer {
    pub fn new(snapshot_path: PathBuf) -> Self {
        Self { snapshot_path, migrations: MigrationRegistry::new() }
    }

    /// Snapshot `state` at the WAL's current write position, then drop the
    /// WAL entries the snapshot now makes redundant.
    pub fn checkpoint(&self, wal: &mut Wal, state: &MaterializedState, now: DateTime<Utc>) -> Result<(), SnapshotError> {
        let seq = wal.write_seq();
        let snapshot = Snapshot::new(seq, state.clone(), now);

        if self.snapshot_path.exists() {
            let bak = rotate_bak_path(&self.snapshot_path);
            fs::rename(&self.snapshot_path, &bak)?;
        }
        snapshot.write_to(&self.snapshot_path)?;

        wal.mark_processed(seq);
        wal.truncate_before(seq + 1)?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<Snapshot>, SnapshotError> {
        Snapshot::read_from(&self.snapshot_path, &self.migrations)
    }
}

/// Load the snapshot at `path`, migrating it to the current schema version
/// if needed. Returns `None` if no snapshot exists yet (fresh project).
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    let migrations = MigrationRegistry::new();
    Snapshot::read_from(path, &migrations)
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
