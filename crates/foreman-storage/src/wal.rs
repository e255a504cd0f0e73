// SPDX-License-Identifier: MIT

//! Append-only write-ahead log: one file per project, one line of JSON per
//! [`foreman_core::Event`]. The WAL is the durable record; `MaterializedState`
//! is a derived, rebuildable projection over it (§4.1).

use foreman_core::Event;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

const FLUSH_ENTRY_THRESHOLD: usize = 100;
const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum WalError {
    #[error("wal io error: {0}")]
    Io(#[from] io::Error),
    #[error("wal serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One record read back from the WAL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

/// A project's append-only event log.
pub struct Wal {
    path: PathBuf,
    file: File,
    write_seq: u64,
    processed_seq: u64,
    read_cursor: u64,
    pending_since_flush: usize,
    last_flush: Instant,
}

impl Wal {
    /// Open (creating if absent) the WAL at `path`. `processed_seq` is the
    /// last sequence number folded into a snapshot; [`Wal::next_unprocessed`]
    /// starts scanning just after it.
    ///
    /// If the file ends in a line that isn't valid JSON (a crash mid-append,
    /// or any other corruption), the original file is rotated to a `.bak`
    /// generation (keeping at most 3) and a clean file containing only the
    /// valid prefix replaces it.
    pub fn open(path: &Path, processed_seq: u64) -> Result<Self, WalError> {
        if !path.exists() {
            File::create(path)?;
        }
        let (valid_prefix, entries, had_corruption) = Self::scan(path)?;
        if had_corruption {
            Self::rotate_backups(path)?;
            fs::write(path, &valid_prefix)?;
        }
        let write_seq = entries.last().map(|(e, _)| e.seq).unwrap_or(0);
        let read_cursor = Self::cursor_after(&entries, processed_seq);
        let file = OpenOptions::new().read(true).append(true).create(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            write_seq,
            processed_seq,
            read_cursor,
            pending_since_flush: 0,
            last_flush: Instant::now(),
        })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Append `event`, returning its assigned sequence number. Buffered;
    /// call [`Wal::flush`] (or check [`Wal::needs_flush`]) to durably commit.
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        self.write_seq += 1;
        let entry = WalEntry { seq: self.write_seq, event: event.clone() };
        let line = serde_json::to_string(&entry)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.pending_since_flush += 1;
        Ok(entry.seq)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_data()?;
        self.pending_since_flush = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Whether enough unflushed entries (or enough wall-clock time) have
    /// accumulated that the caller should flush.
    pub fn needs_flush(&self) -> bool {
        self.pending_since_flush >= FLUSH_ENTRY_THRESHOLD || self.last_flush.elapsed() >= FLUSH_INTERVAL
    }

    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = seq;
    }

    /// All valid entries with `seq > from_seq`. Stops at the first
    /// unparseable line encountered (a concurrent partial write); whatever
    /// was parsed before it is still returned.
    pub fn entries_after(&self, from_seq: u64) -> Result<Vec<WalEntry>, WalError> {
        let (_, entries, _) = Self::scan(&self.path)?;
        Ok(entries.into_iter().map(|(e, _)| e).filter(|e| e.seq > from_seq).collect())
    }

    /// The next entry past the internal read cursor, or `None` if there is
    /// none yet. Unlike [`Wal::entries_after`], an unparseable line is
    /// skipped (not treated as a hard stop) so a reader can make progress
    /// past a line that was corrupted by something other than this handle.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        let content = fs::read(&self.path)?;
        let mut pos = (self.read_cursor as usize).min(content.len());
        loop {
            if pos >= content.len() {
                self.read_cursor = pos as u64;
                return Ok(None);
            }
            let newline = content[pos..].iter().position(|&b| b == b'\n');
            let (line, next_pos, complete) = match newline {
                Some(i) => (&content[pos..pos + i], pos + i + 1, true),
                None => (&content[pos..], content.len(), false),
            };
            if !complete {
                self.read_cursor = pos as u64;
                return Ok(None);
            }
            if line.is_empty() {
                pos = next_pos;
                continue;
            }
            match Self::parse_line(line) {
                Some(entry) => {
                    self.read_cursor = next_pos as u64;
                    return Ok(Some(entry));
                }
                None => {
                    pos = next_pos;
                    continue;
                }
            }
        }
    }

    /// Drop all entries with `seq < from_seq`, shrinking the file. Used
    /// after a snapshot makes the earlier entries redundant.
    pub fn truncate_before(&mut self, from_seq: u64) -> Result<(), WalError> {
        let (_, entries, _) = Self::scan(&self.path)?;
        let kept: Vec<WalEntry> = entries.into_iter().map(|(e, _)| e).filter(|e| e.seq >= from_seq).collect();
        let mut buf = Vec::new();
        for entry in &kept {
            buf.extend_from_slice(serde_json::to_string(entry)?.as_bytes());
            buf.push(b'\n');
        }
        fs::write(&self.path, &buf)?;
        self.file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        let (_, entries, _) = Self::scan(&self.path)?;
        self.read_cursor = Self::cursor_after(&entries, self.processed_seq);
        Ok(())
    }

    fn parse_line(line: &[u8]) -> Option<WalEntry> {
        std::str::from_utf8(line).ok().and_then(|s| serde_json::from_str(s).ok())
    }

    /// Scan `path` from the start, parsing one JSON line per entry. Returns
    /// the raw bytes of the valid prefix, the parsed entries (each paired
    /// with the byte offset immediately after it), and whether scanning
    /// stopped early due to an unparseable or incomplete line.
    #[allow(clippy::type_complexity)]
    fn scan(path: &Path) -> io::Result<(Vec<u8>, Vec<(WalEntry, usize)>, bool)> {
        let content = fs::read(path)?;
        let mut entries = Vec::new();
        let mut consumed = 0usize;
        let mut pos = 0usize;
        let mut had_corruption = false;
        while pos < content.len() {
            let newline = content[pos..].iter().position(|&b| b == b'\n');
            let (line, next_pos, complete) = match newline {
                Some(i) => (&content[pos..pos + i], pos + i + 1, true),
                None => (&content[pos..], content.len(), false),
            };
            if line.is_empty() {
                pos = next_pos;
                if complete {
                    consumed = pos;
                }
                continue;
            }
            if !complete {
                had_corruption = true;
                break;
            }
            match Self::parse_line(line) {
                Some(entry) => {
                    pos = next_pos;
                    consumed = pos;
                    entries.push((entry, consumed));
                }
                None => {
                    had_corruption = true;
                    break;
                }
            }
        }
        Ok((content[..consumed].to_vec(), entries, had_corruption))
    }

    fn cursor_after(entries: &[(WalEntry, usize)], processed_seq: u64) -> u64 {
        entries.iter().filter(|(e, _)| e.seq <= processed_seq).map(|(_, off)| *off as u64).max().unwrap_or(0)
    }

    fn rotate_backups(path: &Path) -> io::Result<()> {
        let bak1 = path.with_extension("bak");
        let bak2 = path.with_extension("bak.2");
        let bak3 = path.with_extension("bak.3");
        if bak3.exists() {
            fs::remove_file(&bak3)?;
        }
        if bak2.exists() {
            fs::rename(&bak2, &bak3)?;
        }
        if bak1.exists() {
            fs::rename(&bak1, &bak2)?;
        }
        fs::rename(path, &bak1)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
