// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routing-table IO.
//!
//! The CLI is the single writer: it takes an exclusive `fs2` lock on a
//! sibling lock file, writes the table to a tempfile, and renames it into
//! place. The Router only reads, through [`RoutingReader`], which caches
//! the parsed table for a short TTL and re-reads when the file mtime moves.

use crate::error::WorkspaceError;
use crate::paths::WorkspacePaths;
use crate::store;
use berth_core::routing::RoutingTable;
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

/// Write the routing table atomically under the writer lock.
pub fn write_routing_table(
    paths: &WorkspacePaths,
    table: &RoutingTable,
) -> Result<(), WorkspaceError> {
    let lock_path = paths.routing_lock_file();
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| WorkspaceError::io(parent, e))?;
    }
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|e| WorkspaceError::io(&lock_path, e))?;
    lock_file.lock_exclusive().map_err(|_| WorkspaceError::RoutingLocked)?;

    let result = store::write_json(&paths.routing_file(), table);
    let _ = fs2::FileExt::unlock(&lock_file);
    result
}

/// Read the routing table directly (no cache).
pub fn read_routing_table(paths: &WorkspacePaths) -> Result<Option<RoutingTable>, WorkspaceError> {
    store::read_json(&paths.routing_file())
}

struct CacheState {
    table: RoutingTable,
    mtime: Option<SystemTime>,
    read_at: Instant,
}

/// Cached reader used by the Router's hot path.
pub struct RoutingReader {
    path: PathBuf,
    ttl: Duration,
    cache: Mutex<Option<CacheState>>,
}

impl RoutingReader {
    /// Default cache TTL between mtime checks.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(2);

    pub fn new(paths: &WorkspacePaths) -> Self {
        Self::with_ttl(paths, Self::DEFAULT_TTL)
    }

    pub fn with_ttl(paths: &WorkspacePaths, ttl: Duration) -> Self {
        Self { path: paths.routing_file(), ttl, cache: Mutex::new(None) }
    }

    /// Current table; a missing file reads as the empty table.
    pub fn current(&self) -> RoutingTable {
        let mut cache = self.cache.lock();

        let reload = match cache.as_ref() {
            None => true,
            Some(state) if state.read_at.elapsed() < self.ttl => false,
            // TTL expired: only re-parse when the mtime moved.
            Some(state) => self.mtime() != state.mtime,
        };

        if reload {
            let table: RoutingTable =
                store::read_json(&self.path).ok().flatten().unwrap_or_default();
            *cache = Some(CacheState {
                table: table.clone(),
                mtime: self.mtime(),
                read_at: Instant::now(),
            });
            return table;
        }

        match cache.as_mut() {
            Some(state) => {
                state.read_at = Instant::now();
                state.table.clone()
            }
            None => RoutingTable::default(),
        }
    }

    fn mtime(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }
}

#[cfg(test)]
#[path = "routing_io_tests.rs"]
mod tests;
