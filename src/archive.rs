//! In-memory ZIP archive writer
//!
//! Entries are buffered in insertion order and serialized once on
//! [`ArchiveWriter::finish`], which lets the overwrite policy replace an
//! entry in place instead of emitting a duplicate central-directory record.
//!
//! A name can be [reserved](ArchiveWriter::reserve) ahead of time for an
//! entry written last. Regular entries never take a reserved name: under
//! the rename policy they get a counter suffix, under the other policies
//! they are dropped.

use crate::config::FileCollisionAction;
use crate::error::Result;
use crate::utils::unique_entry_name;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Append-only filename → bytes sink producing one ZIP per request
#[derive(Debug)]
pub struct ArchiveWriter {
    collision: FileCollisionAction,
    entries: Vec<(String, Vec<u8>)>,
    positions: HashMap<String, usize>,
    reserved: HashSet<String>,
}

impl ArchiveWriter {
    /// Create an empty archive with the given collision policy
    pub fn new(collision: FileCollisionAction) -> Self {
        Self {
            collision,
            entries: Vec::new(),
            positions: HashMap::new(),
            reserved: HashSet::new(),
        }
    }

    /// Hold `name` for a later [`add_reserved`](Self::add_reserved)
    pub fn reserve(&mut self, name: &str) {
        self.reserved.insert(name.to_string());
    }

    /// Add an entry, resolving name collisions per the configured policy
    ///
    /// Returns the name the entry was stored under, or `None` if it was
    /// dropped (skip policy, or no free name could be found).
    pub fn add(&mut self, name: &str, bytes: Vec<u8>) -> Option<String> {
        if self.reserved.contains(name) && self.collision != FileCollisionAction::Rename {
            warn!(entry = name, "archive entry name is reserved, dropping entry");
            return None;
        }

        if let Some(&position) = self.positions.get(name) {
            match self.collision {
                FileCollisionAction::Overwrite => {
                    debug!(entry = name, "overwriting existing archive entry");
                    self.entries[position].1 = bytes;
                    return Some(name.to_string());
                }
                FileCollisionAction::Skip => {
                    warn!(entry = name, "archive entry already exists, dropping duplicate");
                    return None;
                }
                FileCollisionAction::Rename => {}
            }
        }

        let Some(stored) = unique_entry_name(name, |candidate| {
            self.positions.contains_key(candidate) || self.reserved.contains(candidate)
        }) else {
            warn!(entry = name, "no free archive entry name, dropping entry");
            return None;
        };

        if stored != name {
            debug!(entry = name, renamed = %stored, "renamed colliding archive entry");
        }

        self.push(stored.clone(), bytes);
        Some(stored)
    }

    /// Store an entry under a name previously passed to [`reserve`](Self::reserve)
    ///
    /// The name is used verbatim. Returns `false` if it was not reserved,
    /// in which case nothing is written.
    pub fn add_reserved(&mut self, name: &str, bytes: Vec<u8>) -> bool {
        if !self.reserved.remove(name) {
            return false;
        }
        self.push(name.to_string(), bytes);
        true
    }

    fn push(&mut self, name: String, bytes: Vec<u8>) {
        self.positions.insert(name.clone(), self.entries.len());
        self.entries.push((name, bytes));
    }

    /// Number of entries currently buffered
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries have been added
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in archive order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Serialize all entries into a deflate-compressed ZIP
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, bytes) in self.entries {
            writer.start_file(name, options)?;
            writer.write_all(&bytes)?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}
