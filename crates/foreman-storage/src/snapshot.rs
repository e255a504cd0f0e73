// SPDX-License-Identifier: MIT

//! Snapshot persistence for crash recovery.
//!
//! A snapshot stores the complete materialized state for one project at a
//! point in time, identified by the WAL sequence number it was taken at.
//! Recovery loads the snapshot, then replays WAL entries after that
//! sequence (§4.1 "Recovery").

use crate::migration::MigrationError;
use crate::state::MaterializedState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("wal error during checkpoint: {0}")]
    Wal(#[from] crate::wal::WalError),
}

/// A point-in-time snapshot of one project's materialized state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    pub seq: u64,
    pub state: MaterializedState,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(seq: u64, state: MaterializedState, created_at: DateTime<Utc>) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, seq, state, created_at }
    }

    /// Compress to zstd and write atomically (write to a temp file, then
    /// rename over the destination) so a crash mid-write never corrupts the
    /// previous snapshot.
    pub fn write_to(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec(self)?;
        let compressed = zstd::encode_all(json.as_slice(), 0)?;
        let tmp_path = path.with_extension("tmp");
        {
            let mut tmp = fs::File::create(&tmp_path)?;
            tmp.write_all(&compressed)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Read and decompress a snapshot, migrating it to
    /// [`CURRENT_SNAPSHOT_VERSION`] if it was written by an older build.
    pub fn read_from(path: &Path, migrations: &crate::migration::MigrationRegistry) -> Result<Option<Self>, SnapshotError> {
        if !path.exists() {
            return Ok(None);
        }
        let compressed = fs::read(path)?;
        let json = zstd::decode_all(compressed.as_slice())?;
        let mut value: serde_json::Value = serde_json::from_slice(&json)?;

        let stored_version = value.get("v").and_then(serde_json::Value::as_u64).unwrap_or(0) as u32;
        if stored_version < CURRENT_SNAPSHOT_VERSION {
            value = migrations.migrate_to(value, CURRENT_SNAPSHOT_VERSION)?;
        }

        Ok(Some(serde_json::from_value(value)?))
    }
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| if n == 1 { path.with_extension("bak") } else { path.with_extension(format!("bak.{n}")) };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
