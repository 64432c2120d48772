//! Dive data source: database discovery and the `dive_details` reader.
//!
//! Dive computers export a SQLite logbook. Only the `dive_details` table is
//! read, and only ever read-only; nothing here writes to a logbook.
//!
//! Columns are read as dynamic values. A logbook may store a depth as REAL,
//! INTEGER, or TEXT depending on the exporter version, so every numeric
//! column goes through [`numeric`] and every text column through [`text`].

use crate::naming::has_extension;
use crate::types::{DiveId, DiveRecord};
use log::{debug, info};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Default databases directory, relative to the working directory.
pub const DEFAULT_DB_DIR: &str = "shearwater_databases";

const DIVE_QUERY: &str = "SELECT DiveId, DiveDate, Depth, DiveLengthTime, Site, Location, \
     AverageDepth, AverageTemp, Weather, Visibility \
     FROM dive_details ORDER BY DiveDate DESC";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database not found: {0}")]
    NotFound(PathBuf),
}

/// List `*.db` files in `dir`, newest first. Creates `dir` if missing.
pub fn discover_databases(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    fs::create_dir_all(dir)?;
    let mut found: Vec<(SystemTime, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_extension(p, "db"))
        .map(|p| {
            let modified = fs::metadata(&p)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, p)
        })
        .collect();
    found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    debug!("Found {} databases in {}", found.len(), dir.display());
    Ok(found.into_iter().map(|(_, p)| p).collect())
}

/// The newest database in `dir`, if any.
pub fn latest_database(dir: &Path) -> Result<Option<PathBuf>, SourceError> {
    Ok(discover_databases(dir)?.into_iter().next())
}

/// Directory that output and validation folders hang off.
pub fn source_dir(db_path: &Path) -> PathBuf {
    match db_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Read every dive, newest first by the raw `DiveDate` text.
pub fn read_dives(db_path: &Path) -> Result<Vec<DiveRecord>, SourceError> {
    if !db_path.is_file() {
        return Err(SourceError::NotFound(db_path.to_path_buf()));
    }
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    let mut stmt = conn.prepare(DIVE_QUERY)?;
    let dives = stmt
        .query_map([], dive_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    info!("Loaded {} dives from {}", dives.len(), db_path.display());
    Ok(dives)
}

fn dive_from_row(row: &Row<'_>) -> rusqlite::Result<DiveRecord> {
    Ok(DiveRecord {
        id: DiveId::new(text(row.get_ref(0)?).unwrap_or_default()),
        timestamp: text(row.get_ref(1)?),
        depth: numeric(row.get_ref(2)?),
        duration: numeric(row.get_ref(3)?),
        site: text(row.get_ref(4)?),
        location: text(row.get_ref(5)?),
        avg_depth: numeric(row.get_ref(6)?),
        avg_temp: numeric(row.get_ref(7)?),
        weather: text(row.get_ref(8)?),
        visibility: numeric(row.get_ref(9)?),
    })
}

/// A column as a number. NULL, blobs, and text that does not parse are `None`.
fn numeric(value: ValueRef<'_>) -> Option<f64> {
    match value {
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(f),
        ValueRef::Text(t) => std::str::from_utf8(t).ok()?.trim().parse().ok(),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

/// A column as text. Numbers are stringified; NULL and blobs are `None`.
fn text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}
