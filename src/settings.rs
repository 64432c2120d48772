//! Per-dive overrides for site and entry type.
//!
//! Every dive in the loaded source gets an entry when the source loads,
//! seeded with the defaults: the first site of the active region and the
//! configured entry type. Entries change only through [`DiveSettingsStore::set`]
//! and [`DiveSettingsStore::apply_to_many`], and are discarded on reload.
//!
//! Entries are keyed by [`DiveId`], not by list position.

use crate::sites::SiteTable;
use crate::types::{DiveId, DiveRecord, DiveSettings};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("No dives selected")]
    NoSelection,
    #[error("Unknown dive: {0}")]
    UnknownDive(DiveId),
}

/// Settings for a freshly loaded dive. `default_entry` is the configured label.
pub fn defaults_for(default_entry: &str, first_site: &str) -> DiveSettings {
    DiveSettings::with_entry_label(first_site, default_entry)
}

#[derive(Debug, Clone)]
pub struct DiveSettingsStore {
    entries: HashMap<DiveId, DiveSettings>,
    defaults: DiveSettings,
}

impl DiveSettingsStore {
    /// Seed one entry per dive with the defaults derived from `sites`.
    pub fn load(dives: &[DiveRecord], default_entry: &str, sites: &SiteTable) -> Self {
        let defaults = defaults_for(default_entry, sites.first());
        let entries = dives
            .iter()
            .map(|d| (d.id.clone(), defaults.clone()))
            .collect();
        Self { entries, defaults }
    }

    /// Settings for a dive; dives the store has never seen get the defaults.
    pub fn get(&self, id: &DiveId) -> DiveSettings {
        self.entries
            .get(id)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone())
    }

    pub fn defaults(&self) -> &DiveSettings {
        &self.defaults
    }

    pub fn set(&mut self, id: DiveId, settings: DiveSettings) {
        self.entries.insert(id, settings);
    }

    /// Overwrite the settings of every listed dive.
    ///
    /// All-or-nothing: an empty selection or any id not loaded in this store
    /// leaves every entry untouched. Returns the number of dives updated.
    pub fn apply_to_many(
        &mut self,
        ids: &[DiveId],
        settings: &DiveSettings,
    ) -> Result<usize, SettingsError> {
        if ids.is_empty() {
            return Err(SettingsError::NoSelection);
        }
        if let Some(missing) = ids.iter().find(|id| !self.entries.contains_key(id)) {
            return Err(SettingsError::UnknownDive(missing.clone()));
        }
        for id in ids {
            self.entries.insert(id.clone(), settings.clone());
        }
        Ok(ids.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
