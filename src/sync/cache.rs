//! Persisted set of already-ingested item ids
//!
//! The backing file is a plain list, one id per line. The in-memory set is
//! authoritative; every flush rewrites the whole file from it.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::youtube::ItemId;

/// Ids that must never be ingested again
#[derive(Debug)]
pub struct DedupCache {
    path: PathBuf,
    ids: HashSet<ItemId>,
    /// Insertions not yet written to disk
    dirty: bool,
}

impl DedupCache {
    /// Load the cache, creating an empty file when none exists
    ///
    /// Fails if the parent directory is missing or the file is unreadable.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            fs::write(path, "").with_context(|| {
                format!("Failed to create download cache {}", path.display())
            })?;
            debug!("Created empty download cache at {}", path.display());
            return Ok(Self::empty(path));
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read download cache {}", path.display()))?;

        let ids: HashSet<ItemId> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        debug!("Loaded {} cached ids from {}", ids.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            ids,
            dirty: false,
        })
    }

    fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ids: HashSet::new(),
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Add an id in memory only; call [`flush`](Self::flush) to persist
    pub fn insert(&mut self, id: impl Into<ItemId>) {
        if self.ids.insert(id.into()) {
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether there are insertions the file does not reflect yet
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rewrite the backing file with the full membership
    pub fn flush(&mut self) -> Result<()> {
        let mut ids: Vec<&str> = self.ids.iter().map(String::as_str).collect();
        ids.sort_unstable();

        let mut content = ids.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write download cache {}", self.path.display()))?;

        self.dirty = false;
        debug!("Flushed {} ids to {}", self.ids.len(), self.path.display());
        Ok(())
    }

    /// Flush only if something changed since the last flush
    pub fn flush_if_dirty(&mut self) -> Result<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }
}
