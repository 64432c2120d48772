//! The single core instance.
//!
//! A [`Session`] owns everything a run of the tool mutates: the loaded
//! configuration, the active region's site table, the dives of the open
//! database, their per-dive settings, and the three QR catalogs. Every
//! operation runs to completion on the calling thread.
//!
//! ```text
//! open ─► select region ─► open source ─► apply settings ─► generate
//!                                                              │
//!                         switch mode / navigate / cleanup ◄───┘
//! ```

use crate::catalog::{
    CatalogError, CatalogKind, CleanupReport, GenerateReport, GenerateRequest, QrCatalogManager,
};
use crate::config::{AppConfig, ConfigError, load_config, save_config};
use crate::imaging::QrBackend;
use crate::settings::{DiveSettingsStore, SettingsError};
use crate::sites::{SiteRegionIndex, SiteTable};
use crate::source::{SourceError, latest_database, read_dives, source_dir};
use crate::types::{DiveId, DiveRecord, DiveSettings, Identity};
use log::{info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("{0}")]
    Settings(#[from] SettingsError),
    #[error("{0}")]
    Catalog(#[from] CatalogError),
}

/// Where a session finds its inputs.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub config_path: PathBuf,
    pub sites_dir: PathBuf,
    pub db_dir: PathBuf,
    /// Open this database instead of the newest one in `db_dir`.
    pub db: Option<PathBuf>,
    /// Activate this region instead of the first one.
    pub region: Option<String>,
}

/// Buddy fields to change. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct BuddyUpdate {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub master_id: Option<String>,
}

impl BuddyUpdate {
    pub fn is_empty(&self) -> bool {
        self.firstname.is_none() && self.lastname.is_none() && self.master_id.is_none()
    }
}

pub struct Session<B: QrBackend> {
    config: AppConfig,
    config_path: PathBuf,
    regions: SiteRegionIndex,
    region: Option<String>,
    sites: SiteTable,
    db_dir: PathBuf,
    db_path: Option<PathBuf>,
    dives: Vec<DiveRecord>,
    settings: DiveSettingsStore,
    catalogs: QrCatalogManager,
    backend: B,
}

impl<B: QrBackend> Session<B> {
    /// Load config and regions, then open the requested or newest database.
    ///
    /// No database at all is not an error: the session just has no dives. A
    /// config file that fails to load falls back to the defaults, and a newest
    /// database that cannot be read leaves the session without dives. Only a
    /// database named in `options.db` fails the open.
    pub fn open(options: SessionOptions, backend: B) -> Result<Self, SessionError> {
        let config = load_config(&options.config_path).unwrap_or_else(|e| {
            warn!(
                "Could not load {}: {e}; using defaults",
                options.config_path.display()
            );
            AppConfig::default()
        });
        let regions = SiteRegionIndex::discover(&options.sites_dir);
        let settings =
            DiveSettingsStore::load(&[], config.default_entry_label(), &SiteTable::sentinel());

        let mut session = Self {
            config,
            config_path: options.config_path,
            regions,
            region: None,
            sites: SiteTable::sentinel(),
            db_dir: options.db_dir,
            db_path: None,
            dives: Vec::new(),
            settings,
            catalogs: QrCatalogManager::new(Path::new(".")),
            backend,
        };

        let region = options
            .region
            .or_else(|| session.regions.first_region().map(str::to_string));
        if let Some(name) = region {
            session.select_region(&name);
        }

        match options.db {
            Some(db) => {
                session.open_source(&db)?;
            }
            None if session.config.defaults.auto_load_latest_db => session.auto_load(),
            None => info!("No database loaded"),
        }
        Ok(session)
    }

    /// Open the newest database in `db_dir`, warning instead of failing.
    fn auto_load(&mut self) {
        let db = match latest_database(&self.db_dir) {
            Ok(Some(db)) => db,
            Ok(None) => {
                info!("No database loaded");
                return;
            }
            Err(e) => {
                warn!("Could not list databases in {}: {e}", self.db_dir.display());
                return;
            }
        };
        if let Err(e) = self.open_source(&db) {
            warn!("Could not load dives from {}: {e}", db.display());
        }
    }

    /// Load dives from `db` and reset everything derived from the old source.
    ///
    /// Every dive gets fresh default settings. The existing-on-disk and
    /// validation catalogs are rescanned from the new source directory.
    pub fn open_source(&mut self, db: &Path) -> Result<usize, SessionError> {
        let dives = read_dives(db)?;
        self.settings =
            DiveSettingsStore::load(&dives, self.config.default_entry_label(), &self.sites);
        self.dives = dives;
        self.db_path = Some(db.to_path_buf());

        self.catalogs.set_source_dir(&source_dir(db));
        self.catalogs.scan_validations();
        self.catalogs.scan_existing(&self.backend);
        Ok(self.dives.len())
    }

    /// Make `name` the active region and return its site table.
    ///
    /// Existing per-dive settings are kept; a site label the new table does
    /// not contain encodes as site `0`.
    pub fn select_region(&mut self, name: &str) -> &SiteTable {
        self.sites = self.regions.load_region(name);
        self.region = Some(name.to_string());
        &self.sites
    }

    /// Overwrite the settings of the given dives.
    pub fn apply_settings(
        &mut self,
        ids: &[DiveId],
        settings: &DiveSettings,
    ) -> Result<usize, SessionError> {
        if !self.sites.contains(&settings.site) {
            warn!("Site {:?} is not in the active region; it will encode as 0", settings.site);
        }
        Ok(self.settings.apply_to_many(ids, settings)?)
    }

    /// Generate codes for the given dives, in loaded (newest first) order.
    pub fn generate(
        &mut self,
        ids: &[DiveId],
        overwrite: bool,
    ) -> Result<GenerateReport, SessionError> {
        let selected = resolve(&self.dives, ids)?;
        let request = GenerateRequest {
            dives: &selected,
            settings: &self.settings,
            sites: &self.sites,
            buddy: &self.config.buddy,
            overwrite,
        };
        Ok(self.catalogs.generate(&request, &self.backend)?)
    }

    pub fn switch_mode(&mut self, target: CatalogKind) {
        self.catalogs.switch_mode(target, &self.backend);
    }

    /// Load one validation file and put the cursor on it.
    pub fn select_validation(&mut self, filename: &str) -> Option<usize> {
        self.catalogs.select_validation(filename, &self.backend)
    }

    pub fn cleanup(&mut self) -> CleanupReport {
        self.catalogs.cleanup()
    }

    /// Change buddy fields and persist the config file.
    pub fn update_buddy(&mut self, update: BuddyUpdate) -> Result<&Identity, SessionError> {
        let buddy = &mut self.config.buddy;
        if let Some(first) = update.firstname {
            buddy.firstname = first;
        }
        if let Some(last) = update.lastname {
            buddy.lastname = last;
        }
        if let Some(id) = update.master_id {
            buddy.master_id = id;
        }
        save_config(&self.config_path, &self.config)?;
        info!("Saved buddy to {}", self.config_path.display());
        Ok(&self.config.buddy)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn regions(&self) -> &SiteRegionIndex {
        &self.regions
    }

    pub fn active_region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn sites(&self) -> &SiteTable {
        &self.sites
    }

    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn dives(&self) -> &[DiveRecord] {
        &self.dives
    }

    pub fn dive_ids(&self) -> Vec<DiveId> {
        self.dives.iter().map(|d| d.id.clone()).collect()
    }

    pub fn settings(&self) -> &DiveSettingsStore {
        &self.settings
    }

    pub fn catalogs(&self) -> &QrCatalogManager {
        &self.catalogs
    }

    pub fn catalogs_mut(&mut self) -> &mut QrCatalogManager {
        &mut self.catalogs
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// Pick the dives named by `ids`, keeping the loaded order.
fn resolve<'a>(dives: &'a [DiveRecord], ids: &[DiveId]) -> Result<Vec<&'a DiveRecord>, SessionError> {
    let loaded: HashSet<&DiveId> = dives.iter().map(|d| &d.id).collect();
    if let Some(missing) = ids.iter().find(|id| !loaded.contains(id)) {
        return Err(SettingsError::UnknownDive(missing.clone()).into());
    }
    let wanted: HashSet<&DiveId> = ids.iter().collect();
    Ok(dives.iter().filter(|d| wanted.contains(&d.id)).collect())
}
