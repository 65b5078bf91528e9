//! Parsed-frontmatter cache keyed by note path
//!
//! The domain layer reads header fields through this cache instead of
//! re-parsing note text itself; entries are invalidated by mtime or
//! explicitly by the watcher.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Result;

use crate::core::frontmatter::FieldSet;
use crate::core::vault::Vault;

#[derive(Debug, Clone)]
struct CacheEntry {
    modified: Option<SystemTime>,
    fields: FieldSet,
}

/// Per-note frontmatter cache with mtime-based invalidation
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl MetadataCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Header fields for a note, re-parsed only when the file changed
    pub fn fields_for(&mut self, vault: &Vault, path: &Path) -> Result<FieldSet> {
        let modified = fs::metadata(path).ok().and_then(|m| m.modified().ok());
        if let Some(entry) = self.entries.get(path) {
            if modified.is_some() && entry.modified == modified {
                return Ok(entry.fields.clone());
            }
        }

        let content = vault.read(path)?;
        let fields = FieldSet::from_document(&content);
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                modified,
                fields: fields.clone(),
            },
        );
        Ok(fields)
    }

    /// Drop the cached entry for one note
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.remove(path);
    }

    /// Drop every cached entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frontmatter::FieldValue;

    #[test]
    fn test_fields_round_trip_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path(), "People").unwrap();
        let path = vault
            .create("Bob", "---\nmother: [[Alice]]\n---\n\n# Bob\n")
            .unwrap();

        let mut cache = MetadataCache::new();
        let fields = cache.fields_for(&vault, &path).unwrap();
        assert_eq!(
            fields.get("mother").and_then(FieldValue::as_reference),
            Some("Alice")
        );

        // Unchanged file is served from the cache
        let again = cache.fields_for(&vault, &path).unwrap();
        assert_eq!(fields, again);

        vault
            .write(&path, "---\nmother: [[Carol]]\n---\n\n# Bob\n")
            .unwrap();
        cache.invalidate(&path);
        let updated = cache.fields_for(&vault, &path).unwrap();
        assert_eq!(
            updated.get("mother").and_then(FieldValue::as_reference),
            Some("Carol")
        );
    }

    #[test]
    fn test_headerless_note_yields_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path(), "People").unwrap();
        let path = vault.create("Bob", "# Bob\n").unwrap();

        let mut cache = MetadataCache::new();
        assert!(cache.fields_for(&vault, &path).unwrap().is_empty());
    }
}
