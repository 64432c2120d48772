//! QR code catalogs: generated, existing on disk, and validation.
//!
//! Three independent [`Catalog`]s each hold a list of [`CatalogEntry`] and a
//! cursor. [`QrCatalogManager`] owns all three plus the active display mode
//! and the directories they are built from.
//!
//! ## Catalogs
//!
//! | Catalog | Built by | Source |
//! |---|---|---|
//! | Generated | [`QrCatalogManager::generate`] | dives rendered this session |
//! | Existing on disk | [`QrCatalogManager::scan_existing`] | every `.png` in the output directory |
//! | Validation | [`QrCatalogManager::scan_validations`] + hydration | `.png` files supplied by someone else |
//!
//! Disk listings are newest first by modification time. A file that cannot be
//! read is logged and skipped; it never aborts a scan.
//!
//! ## Mode State Machine
//!
//! ```text
//!              switch_mode(any)
//!   ┌──────────────────────────────────┐
//!   ▼                                  │
//! Generated ◄──► ExistingOnDisk ◄──► Validation
//!      ▲              │ cleanup()
//!      └──────────────┘
//! ```
//!
//! The initial mode is `Generated`. Entering `ExistingOnDisk` always rescans
//! the output directory. Entering `Validation` hydrates every listed file if
//! none is loaded yet, otherwise reloads the current selection.
//!
//! ## Generation
//!
//! Generation is not isolated per dive: the first render or write failure
//! aborts the remaining batch and leaves earlier files on disk. Overwrite mode
//! removes every `.png` in the output directory before the batch starts.

use crate::imaging::{BackendError, QrBackend};
use crate::naming::{is_png, output_dir, qr_filename, validation_dir};
use crate::payload::{self, duration_minutes, one_decimal, parse_timestamp};
use crate::settings::DiveSettingsStore;
use crate::sites::SiteTable;
use crate::types::{DiveRecord, Identity};
use image::DynamicImage;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("QR imaging failed: {0}")]
    Backend(#[from] BackendError),
    #[error("No dives selected")]
    NothingSelected,
}

/// Which catalog an entry belongs to, and which one is on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogKind {
    #[default]
    Generated,
    ExistingOnDisk,
    Validation,
}

/// Human-readable description of the dive behind a generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiveDetails {
    /// `YYYY-MM-DD HH:MM`, or `Dive N` when the timestamp is unusable.
    pub date: String,
    pub site: String,
    pub entry: String,
    /// e.g. `18.0m`
    pub depth: String,
    /// e.g. `40.0min`
    pub duration: String,
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub image: DynamicImage,
    pub filename: String,
    pub path: PathBuf,
    pub kind: CatalogKind,
    /// Present only for codes generated from a known dive.
    pub details: Option<DiveDetails>,
}

/// Whether the previous/next controls should be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavState {
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

/// A list of entries plus a cursor clamped to `[0, len - 1]`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    cursor: usize,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries, cursor: 0 }
    }

    pub fn current(&self) -> Option<&CatalogEntry> {
        self.entries.get(self.cursor)
    }

    /// Move forward one entry. No-op on the last entry.
    pub fn next(&mut self) -> Option<&CatalogEntry> {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
        self.current()
    }

    /// Move back one entry. No-op on the first entry.
    pub fn previous(&mut self) -> Option<&CatalogEntry> {
        self.cursor = self.cursor.saturating_sub(1);
        self.current()
    }

    /// Jump to `index`, clamped into range.
    pub fn seek(&mut self, index: usize) -> Option<&CatalogEntry> {
        self.cursor = index.min(self.entries.len().saturating_sub(1));
        self.current()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    pub fn nav(&self) -> NavState {
        NavState {
            prev_enabled: !self.entries.is_empty() && self.cursor > 0,
            next_enabled: self.cursor + 1 < self.entries.len(),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    fn position(&self, filename: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.filename == filename)
    }
}

/// A `.png` file found in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngFile {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// List `.png` files in `dir`, newest modification time first.
///
/// A missing directory is an empty listing.
pub fn list_png_files(dir: &Path) -> std::io::Result<Vec<PngFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PngFile> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_png(p))
        .map(|path| {
            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            PngFile {
                name,
                path,
                modified,
            }
        })
        .collect();
    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(files)
}

/// Load every file as a catalog entry, skipping unreadable ones.
fn load_entries(files: &[PngFile], kind: CatalogKind, backend: &dyn QrBackend) -> Vec<CatalogEntry> {
    files
        .iter()
        .filter_map(|f| match backend.load(&f.path) {
            Ok(image) => Some(CatalogEntry {
                image,
                filename: f.name.clone(),
                path: f.path.clone(),
                kind,
                details: None,
            }),
            Err(e) => {
                warn!("Could not load {}: {e}", f.name);
                None
            }
        })
        .collect()
}

/// Build the existing-on-disk catalog from an output directory.
pub fn scan_existing_dir(dir: &Path, backend: &dyn QrBackend) -> Catalog {
    match list_png_files(dir) {
        Ok(files) => Catalog::from_entries(load_entries(&files, CatalogKind::ExistingOnDisk, backend)),
        Err(e) => {
            warn!("Could not scan {}: {e}", dir.display());
            Catalog::new()
        }
    }
}

fn describe_dive(record: &DiveRecord, site: &str, entry: &str, ordinal: usize) -> DiveDetails {
    let date = record
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| format!("Dive {}", ordinal + 1));
    DiveDetails {
        date,
        site: site.to_string(),
        entry: entry.to_string(),
        depth: format!("{}m", one_decimal(record.depth)),
        duration: format!("{}min", one_decimal(duration_minutes(record.duration))),
    }
}

/// Remove every `.png` in `dir`. Returns how many were removed.
fn remove_png_files(dir: &Path) -> std::io::Result<usize> {
    let mut removed = 0;
    for file in list_png_files(dir)? {
        match fs::remove_file(&file.path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not remove {}: {e}", file.name),
        }
    }
    Ok(removed)
}

/// Outcome of a generation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    pub generated: usize,
    /// Files removed up front in overwrite mode.
    pub removed: usize,
    pub output_dir: PathBuf,
}

/// Outcome of [`QrCatalogManager::cleanup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub deleted: usize,
    pub failed: usize,
}

/// Inputs shared by every dive in a generation batch.
pub struct GenerateRequest<'a> {
    pub dives: &'a [&'a DiveRecord],
    pub settings: &'a DiveSettingsStore,
    pub sites: &'a SiteTable,
    pub buddy: &'a Identity,
    pub overwrite: bool,
}

#[derive(Debug)]
pub struct QrCatalogManager {
    generated: Catalog,
    existing: Catalog,
    validation: Catalog,
    validation_files: Vec<String>,
    selected_validation: Option<String>,
    output_dir: PathBuf,
    validation_dir: PathBuf,
    mode: CatalogKind,
}

impl QrCatalogManager {
    /// Manager for codes belonging to the data source in `source_dir`.
    pub fn new(source_dir: &Path) -> Self {
        Self {
            generated: Catalog::new(),
            existing: Catalog::new(),
            validation: Catalog::new(),
            validation_files: Vec::new(),
            selected_validation: None,
            output_dir: output_dir(source_dir),
            validation_dir: validation_dir(source_dir),
            mode: CatalogKind::Generated,
        }
    }

    /// Point at a different data source. Disk-backed catalogs are dropped;
    /// generated entries stay.
    pub fn set_source_dir(&mut self, source_dir: &Path) {
        self.output_dir = output_dir(source_dir);
        self.validation_dir = validation_dir(source_dir);
        self.existing.clear();
        self.validation.clear();
        self.validation_files.clear();
        self.selected_validation = None;
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn validation_dir(&self) -> &Path {
        &self.validation_dir
    }

    pub fn mode(&self) -> CatalogKind {
        self.mode
    }

    pub fn catalog(&self, kind: CatalogKind) -> &Catalog {
        match kind {
            CatalogKind::Generated => &self.generated,
            CatalogKind::ExistingOnDisk => &self.existing,
            CatalogKind::Validation => &self.validation,
        }
    }

    fn catalog_mut(&mut self, kind: CatalogKind) -> &mut Catalog {
        match kind {
            CatalogKind::Generated => &mut self.generated,
            CatalogKind::ExistingOnDisk => &mut self.existing,
            CatalogKind::Validation => &mut self.validation,
        }
    }

    /// The catalog currently on display.
    pub fn active(&self) -> &Catalog {
        self.catalog(self.mode)
    }

    pub fn current(&self) -> Option<&CatalogEntry> {
        self.active().current()
    }

    pub fn next(&mut self) -> Option<&CatalogEntry> {
        self.catalog_mut(self.mode).next()
    }

    pub fn previous(&mut self) -> Option<&CatalogEntry> {
        self.catalog_mut(self.mode).previous()
    }

    pub fn seek(&mut self, index: usize) -> Option<&CatalogEntry> {
        self.catalog_mut(self.mode).seek(index)
    }

    pub fn nav(&self) -> NavState {
        self.active().nav()
    }

    pub fn validation_files(&self) -> &[String] {
        &self.validation_files
    }

    pub fn selected_validation(&self) -> Option<&str> {
        self.selected_validation.as_deref()
    }

    /// Encode, render, and write one code per dive.
    ///
    /// Dives are processed in the given order; the 0-based position names
    /// files whose timestamp is unusable. The existing-on-disk catalog is
    /// rescanned afterwards.
    pub fn generate(
        &mut self,
        request: &GenerateRequest<'_>,
        backend: &dyn QrBackend,
    ) -> Result<GenerateReport, CatalogError> {
        if request.dives.is_empty() {
            return Err(CatalogError::NothingSelected);
        }
        fs::create_dir_all(&self.output_dir)?;

        let mut removed = 0;
        if request.overwrite {
            removed = remove_png_files(&self.output_dir)?;
            info!("Cleaned {removed} existing QR codes");
            self.generated.clear();
        }

        let mut generated = 0;
        for (ordinal, record) in request.dives.iter().enumerate() {
            let settings = request.settings.get(&record.id);
            let payload = payload::encode(record, &settings, request.buddy, request.sites);
            debug!("Payload for dive {}: {payload}", record.id);

            let image = backend.render(&payload)?;
            let filename = qr_filename(record.timestamp.as_deref(), ordinal);
            let path = self.output_dir.join(&filename);
            backend.save(&image, &path)?;

            let details = describe_dive(record, &settings.site, settings.entry_label.as_str(), ordinal);
            self.generated.push(CatalogEntry {
                image,
                filename: filename.clone(),
                path,
                kind: CatalogKind::Generated,
                details: Some(details),
            });
            info!("Generated QR code: {filename}");
            generated += 1;
        }

        self.generated.reset_cursor();
        self.scan_existing(backend);

        Ok(GenerateReport {
            generated,
            removed,
            output_dir: self.output_dir.clone(),
        })
    }

    /// Rebuild the existing-on-disk catalog from the output directory.
    pub fn scan_existing(&mut self, backend: &dyn QrBackend) -> usize {
        self.existing = scan_existing_dir(&self.output_dir, backend);
        self.existing.len()
    }

    /// List validation files without loading them.
    ///
    /// The newest file becomes the current selection. Loaded entries whose
    /// file is no longer listed are dropped.
    pub fn scan_validations(&mut self) -> usize {
        let files = match list_png_files(&self.validation_dir) {
            Ok(files) => files,
            Err(e) => {
                warn!("Could not scan {}: {e}", self.validation_dir.display());
                Vec::new()
            }
        };
        self.validation_files = files.into_iter().map(|f| f.name).collect();
        self.selected_validation = self.validation_files.first().cloned();

        let listed = &self.validation_files;
        let kept: Vec<CatalogEntry> = self
            .validation
            .entries()
            .iter()
            .filter(|e| listed.contains(&e.filename))
            .cloned()
            .collect();
        self.validation = Catalog::from_entries(kept);
        self.validation_files.len()
    }

    /// Load every listed validation file, replacing what was loaded.
    pub fn load_all_validations(&mut self, backend: &dyn QrBackend) -> usize {
        let files: Vec<PngFile> = self
            .validation_files
            .iter()
            .map(|name| PngFile {
                name: name.clone(),
                path: self.validation_dir.join(name),
                modified: SystemTime::UNIX_EPOCH,
            })
            .collect();
        self.validation =
            Catalog::from_entries(load_entries(&files, CatalogKind::Validation, backend));
        self.validation.len()
    }

    /// Load a single validation file and put the cursor on it.
    ///
    /// A file that is already loaded is refreshed in place; otherwise it
    /// replaces the loaded set. Returns the cursor, or `None` when the file
    /// cannot be read.
    pub fn select_validation(&mut self, filename: &str, backend: &dyn QrBackend) -> Option<usize> {
        self.selected_validation = Some(filename.to_string());
        let path = self.validation_dir.join(filename);
        let image = match backend.load(&path) {
            Ok(image) => image,
            Err(e) => {
                warn!("Could not load {filename}: {e}");
                return None;
            }
        };

        let index = match self.validation.position(filename) {
            Some(i) => {
                self.validation.entries[i].image = image;
                i
            }
            None => {
                self.validation = Catalog::from_entries(vec![CatalogEntry {
                    image,
                    filename: filename.to_string(),
                    path,
                    kind: CatalogKind::Validation,
                    details: None,
                }]);
                0
            }
        };
        self.validation.seek(index);
        Some(index)
    }

    /// Change the catalog on display. The target's cursor restarts at 0.
    pub fn switch_mode(&mut self, target: CatalogKind, backend: &dyn QrBackend) {
        self.mode = target;
        self.catalog_mut(target).reset_cursor();
        match target {
            CatalogKind::Generated => {}
            CatalogKind::ExistingOnDisk => {
                self.scan_existing(backend);
            }
            CatalogKind::Validation => {
                if !self.validation_files.is_empty() && self.validation.is_empty() {
                    self.load_all_validations(backend);
                } else if let Some(selected) = self.selected_validation.clone() {
                    self.select_validation(&selected, backend);
                }
            }
        }
    }

    /// Delete every file in the existing-on-disk catalog.
    ///
    /// A failed deletion is logged and counted; the rest still go. The
    /// catalog is emptied either way, and if it was on display the mode falls
    /// back to `Generated`.
    pub fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        for entry in self.existing.entries() {
            match fs::remove_file(&entry.path) {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    warn!("Could not delete {}: {e}", entry.filename);
                    report.failed += 1;
                }
            }
        }
        self.existing.clear();
        if self.mode == CatalogKind::ExistingOnDisk {
            self.mode = CatalogKind::Generated;
            self.generated.reset_cursor();
        }
        info!("Cleaned up {} existing QR codes", report.deleted);
        report
    }
}
