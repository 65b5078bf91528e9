//! Parent-to-children inference over the vault
//!
//! A note is a child of a person when its header references that person as
//! `mother` or `father`. The index is built in one pass over the vault and
//! rebuilt on change events instead of re-scanning per lookup.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::core::frontmatter::FieldValue;
use crate::core::metadata::MetadataCache;
use crate::core::vault::Vault;

/// Index of parent name to sorted child note names
#[derive(Debug, Clone, Default)]
pub struct FamilyIndex {
    children: BTreeMap<String, Vec<String>>,
}

impl FamilyIndex {
    /// Build the index from every markdown file in the vault
    pub fn build(vault: &Vault, cache: &mut MetadataCache) -> Result<Self> {
        let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for path in vault.markdown_files() {
            let fields = match cache.fields_for(vault, &path) {
                Ok(fields) => fields,
                Err(e) => {
                    tracing::warn!("Skipping unreadable note {}: {e}", path.display());
                    continue;
                }
            };
            let child = Vault::note_stem(&path);
            for key in ["mother", "father"] {
                if let Some(parent) = fields.get(key).and_then(FieldValue::as_reference) {
                    children
                        .entry(parent.to_string())
                        .or_default()
                        .push(child.clone());
                }
            }
        }
        for list in children.values_mut() {
            list.sort();
            list.dedup();
        }
        Ok(Self { children })
    }

    /// Children of the named person
    pub fn children_of(&self, name: &str) -> &[String] {
        self.children
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of people with at least one child
    pub fn parent_count(&self) -> usize {
        self.children.len()
    }
}
