//! User-defined snippets for the custom category

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::achievements::StatsTracker;
use crate::error::{ExportError, SnippetError};
use crate::persistence::SecureStore;

/// Shortest accepted snippet
pub const MIN_LEN: usize = 3;

/// Deduplicated list of custom snippets, insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomSnippets {
    items: Vec<String>,
}

impl CustomSnippets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a loaded list, dropping invalid and duplicate entries
    pub fn normalize(items: Vec<String>) -> Self {
        let mut snippets = Self::new();
        for item in items {
            let _ = snippets.add(&item);
        }
        snippets
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add(&mut self, text: &str) -> Result<(), SnippetError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SnippetError::Empty);
        }
        if text.chars().count() < MIN_LEN {
            return Err(SnippetError::TooShort { min: MIN_LEN });
        }
        if self.items.iter().any(|s| s == text) {
            return Err(SnippetError::Duplicate);
        }
        self.items.push(text.to_string());
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Merge a JSON array, skipping non-strings, short and duplicate entries.
    /// Returns how many were added.
    pub fn import_json(&mut self, text: &str) -> Result<usize, SnippetError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|_| SnippetError::InvalidFormat)?;
        let array = value.as_array().ok_or(SnippetError::InvalidFormat)?;
        let added = array
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|s| self.add(s).is_ok())
            .count();
        log::info!("Imported {added} custom snippets");
        Ok(added)
    }

    pub fn export_json(&self) -> Result<String, ExportError> {
        if self.is_empty() {
            return Err(ExportError::Empty { what: "snippets" });
        }
        serde_json::to_string_pretty(&self.items).map_err(|_| ExportError::Empty { what: "snippets" })
    }
}

/// Custom snippet file behind the secure store
#[derive(Debug, Clone)]
pub struct SnippetStore {
    store: SecureStore,
}

impl SnippetStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: SecureStore::new(path),
        }
    }

    pub fn load(&self) -> CustomSnippets {
        let raw: Vec<String> = self.store.load_or_default();
        CustomSnippets::normalize(raw)
    }

    pub fn save(&self, snippets: &CustomSnippets) -> bool {
        self.store.save_or_log(snippets)
    }

    /// Validate, append and persist one snippet. Counts as a settings save
    /// for the stats tracker. Returns whether the file was written.
    pub fn add_and_save(
        &self,
        snippets: &mut CustomSnippets,
        text: &str,
        tracker: &mut StatsTracker,
    ) -> Result<bool, SnippetError> {
        snippets.add(text)?;
        tracker.mark_settings_saved();
        Ok(self.save(snippets))
    }
}
