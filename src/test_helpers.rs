//! Shared test utilities for the dive-qr test suite.
//!
//! Record builders, region-document writers, a SQLite logbook builder, and a
//! [`Workspace`] that lays out config, sites, and databases in a temp dir.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let ws = Workspace::standard();
//! let session = Session::open(ws.options(), MockBackend::new()).unwrap();
//! assert_eq!(session.active_region(), Some("Malta"));
//! ```

use crate::session::SessionOptions;
use crate::sites::SiteTable;
use crate::types::{DiveId, DiveRecord};
use rusqlite::{Connection, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

// =========================================================================
// Records and sites
// =========================================================================

/// A dive with only an id and a raw timestamp.
pub fn record_at(id: &str, timestamp: &str) -> DiveRecord {
    DiveRecord {
        id: DiveId::new(id),
        timestamp: Some(timestamp.to_string()),
        ..Default::default()
    }
}

/// `Arch (3)`, `Reef (42)`, `Wreck (7)`.
pub fn sample_sites() -> SiteTable {
    SiteTable::from_entries([("Reef (42)", "42"), ("Wreck (7)", "7"), ("Arch (3)", "3")])
}

/// A region document with one element per `(id, name)`.
pub fn region_json(sites: &[(&str, &str)]) -> String {
    let elements: Vec<serde_json::Value> = sites
        .iter()
        .map(|(id, name)| {
            serde_json::json!({"data": {"properties": {"id": id, "name": name}}})
        })
        .collect();
    serde_json::json!({"result": {"elements": elements}}).to_string()
}

/// Write `{stem}.json` into `dir` and return its path.
pub fn write_region(dir: &Path, stem: &str, sites: &[(&str, &str)]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(format!("{stem}.json"));
    fs::write(&path, region_json(sites)).unwrap();
    path
}

// =========================================================================
// Filesystem
// =========================================================================

/// Names of the `.png` files in `dir`, sorted. Empty if `dir` is missing.
pub fn png_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|x| x == "png"))
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

pub fn set_mtime(path: &Path, time: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

// =========================================================================
// SQLite logbook
// =========================================================================

/// Create a logbook with an empty, untyped `dive_details` table.
pub fn create_dive_db(path: &Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE dive_details (
            DiveId, DiveDate, Depth, DiveLengthTime, Site, Location,
            AverageDepth, AverageTemp, Weather, Visibility
        );",
    )
    .unwrap();
    conn
}

// =========================================================================
// Workspace
// =========================================================================

/// Config, sites, and databases laid out under one temp dir.
pub struct Workspace {
    tmp: TempDir,
}

impl Workspace {
    /// Nothing on disk yet.
    pub fn empty() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
        }
    }

    /// Two regions (Malta, Red Sea) and one logbook with three dives:
    ///
    /// | Id | Date | Depth | Seconds |
    /// |---|---|---|---|
    /// | 1 | 2025-03-01 08:15:00 | 18.0 | 2400 |
    /// | 2 | 2025-03-02 09:00:00 | 12.5 | 1800 |
    /// | 3 | 2025-03-03 10:00:00 | 20.0 | 3000 |
    ///
    /// Dive 1 also has avg temp 22.3 and visibility 15.0.
    pub fn standard() -> Self {
        let ws = Self::empty();
        write_region(&ws.sites_dir(), "red_sea", &[("42", "Reef"), ("7", "Wreck")]);
        write_region(&ws.sites_dir(), "malta", &[("9", "Blue Hole"), ("11", "Cirkewwa")]);

        fs::create_dir_all(ws.db_dir()).unwrap();
        let conn = create_dive_db(&ws.db_path());
        conn.execute(
            "INSERT INTO dive_details (DiveId, DiveDate, Depth, DiveLengthTime, AverageTemp, Visibility)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![1, "2025-03-01 08:15:00", 18.0, 2400, 22.3, 15.0],
        )
        .unwrap();
        for (id, date, depth, secs) in [
            (2, "2025-03-02 09:00:00", 12.5, 1800),
            (3, "2025-03-03 10:00:00", 20.0, 3000),
        ] {
            conn.execute(
                "INSERT INTO dive_details (DiveId, DiveDate, Depth, DiveLengthTime)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, date, depth, secs],
            )
            .unwrap();
        }
        ws
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.toml")
    }

    pub fn sites_dir(&self) -> PathBuf {
        self.root().join("ssi_dive_sites")
    }

    pub fn db_dir(&self) -> PathBuf {
        self.root().join("shearwater_databases")
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_dir().join("logbook.db")
    }

    pub fn options(&self) -> SessionOptions {
        SessionOptions {
            config_path: self.config_path(),
            sites_dir: self.sites_dir(),
            db_dir: self.db_dir(),
            db: None,
            region: None,
        }
    }
}
