//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Dives
//!
//! ```text
//! Id        Date        Time   Depth (m)  Duration (min)  Site                  Entry Type
//! 3         2025-03-03  10:00  20.0       50.0            Blue Hole (9)         Boat (22)
//! 1         2025-03-01  08:15  18.0       40.0            Reef (42)             Shore (21)
//! ```
//!
//! ## Catalog entry
//!
//! ```text
//! Dive QR 1/2: 2025-03-03 10:00
//! Site: Blue Hole (9)
//! Entry: Boat (22), Depth: 20.0m, Duration: 50.0min
//!     Path: shearwater_databases/ssi_dives_qr_codes/dive_20250303_100000.png
//! [ ] prev  [x] next
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::catalog::{CatalogEntry, CatalogKind, CleanupReport, GenerateReport, NavState};
use crate::payload::{duration_minutes, one_decimal, parse_timestamp};
use crate::settings::DiveSettingsStore;
use crate::sites::{SiteRegionIndex, SiteTable};
use crate::types::DiveRecord;
use std::path::{Path, PathBuf};

const NOT_AVAILABLE: &str = "N/A";

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Regions, sites, databases
// ============================================================================

pub fn format_regions(regions: &SiteRegionIndex, active: Option<&str>) -> Vec<String> {
    if regions.is_empty() {
        return vec!["No regions found".to_string()];
    }
    let mut lines = vec!["Regions".to_string()];
    for (i, name) in regions.list_regions().into_iter().enumerate() {
        let marker = if Some(name) == active { " (active)" } else { "" };
        lines.push(format!("{} {}{}", format_index(i + 1), name, marker));
    }
    lines
}

pub fn format_sites(sites: &SiteTable, region: Option<&str>) -> Vec<String> {
    let header = match region {
        Some(r) => format!("Sites in {} ({})", r, sites.len()),
        None => format!("Sites ({})", sites.len()),
    };
    let mut lines = vec![header];
    lines.extend(sites.labels().map(|label| format!("{}{}", indent(1), label)));
    lines
}

pub fn format_databases(databases: &[PathBuf], loaded: Option<&Path>) -> Vec<String> {
    if databases.is_empty() {
        return vec!["No .db files found".to_string()];
    }
    let mut lines = vec![format!("Found {} database(s)", databases.len())];
    for (i, db) in databases.iter().enumerate() {
        let name = db
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| db.display().to_string());
        let marker = if Some(db.as_path()) == loaded { " (loaded)" } else { "" };
        lines.push(format!("{} {}{}", format_index(i + 1), name, marker));
    }
    lines
}

// ============================================================================
// Dive table
// ============================================================================

/// Split a raw timestamp into display date and time.
///
/// Unparseable text falls back to character slices: the first 10 characters
/// for the date and characters 11..16 for the time.
pub fn dive_date_time(timestamp: Option<&str>) -> (String, String) {
    let Some(raw) = timestamp.filter(|t| !t.is_empty()) else {
        return (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string());
    };
    if let Some(dt) = parse_timestamp(raw) {
        return (dt.format("%Y-%m-%d").to_string(), dt.format("%H:%M").to_string());
    }
    let chars: Vec<char> = raw.chars().collect();
    let date = if chars.len() >= 10 {
        chars[..10].iter().collect()
    } else {
        NOT_AVAILABLE.to_string()
    };
    let time = if chars.len() >= 16 {
        chars[11..16].iter().collect()
    } else {
        NOT_AVAILABLE.to_string()
    };
    (date, time)
}

fn dive_row(cells: [&str; 7]) -> String {
    format!(
        "{:<8}  {:<10}  {:<5}  {:<9}  {:<14}  {:<20}  {}",
        cells[0], cells[1], cells[2], cells[3], cells[4], cells[5], cells[6]
    )
    .trim_end()
    .to_string()
}

/// One row per dive with its current settings.
pub fn format_dive_table(dives: &[DiveRecord], settings: &DiveSettingsStore) -> Vec<String> {
    if dives.is_empty() {
        return vec!["No dives loaded".to_string()];
    }
    let mut lines = vec![dive_row([
        "Id",
        "Date",
        "Time",
        "Depth (m)",
        "Duration (min)",
        "Site",
        "Entry Type",
    ])];
    for dive in dives {
        let (date, time) = dive_date_time(dive.timestamp.as_deref());
        let depth = one_decimal(dive.depth);
        let duration = one_decimal(duration_minutes(dive.duration));
        let s = settings.get(&dive.id);
        lines.push(dive_row([
            dive.id.as_str(),
            date.as_str(),
            time.as_str(),
            depth.as_str(),
            duration.as_str(),
            s.site.as_str(),
            s.entry_label.as_str(),
        ]));
    }
    lines
}

pub fn print_dive_table(dives: &[DiveRecord], settings: &DiveSettingsStore) {
    print_lines(&format_dive_table(dives, settings));
}

// ============================================================================
// Catalogs
// ============================================================================

fn empty_catalog_message(kind: CatalogKind) -> &'static str {
    match kind {
        CatalogKind::Generated => "No generated QR codes available",
        CatalogKind::ExistingOnDisk => "No existing dive QR codes found",
        CatalogKind::Validation => "No validation QR codes available",
    }
}

/// Info text for the entry at 0-based `index` of a catalog of `len`.
pub fn format_catalog_entry(
    kind: CatalogKind,
    index: usize,
    len: usize,
    entry: Option<&CatalogEntry>,
) -> Vec<String> {
    let Some(entry) = entry else {
        return vec![empty_catalog_message(kind).to_string()];
    };
    let position = format!("{}/{}", index + 1, len);
    let mut lines = match (kind, &entry.details) {
        (CatalogKind::Generated, Some(d)) => vec![
            format!("Dive QR {}: {}", position, d.date),
            format!("Site: {}", d.site),
            format!(
                "Entry: {}, Depth: {}, Duration: {}",
                d.entry, d.depth, d.duration
            ),
        ],
        (CatalogKind::Generated, None) => vec![format!("Dive QR {}: {}", position, entry.filename)],
        (CatalogKind::ExistingOnDisk, _) => {
            vec![format!("Existing Dive QR {}: {}", position, entry.filename)]
        }
        (CatalogKind::Validation, _) => {
            vec![format!("Validation QR {}: {}", position, entry.filename)]
        }
    };
    lines.push(format!("{}Path: {}", indent(1), entry.path.display()));
    lines
}

pub fn format_nav(nav: NavState) -> String {
    let mark = |enabled: bool| if enabled { "x" } else { " " };
    format!(
        "[{}] prev  [{}] next",
        mark(nav.prev_enabled),
        mark(nav.next_enabled)
    )
}

pub fn print_catalog_entry(
    kind: CatalogKind,
    index: usize,
    len: usize,
    entry: Option<&CatalogEntry>,
    nav: NavState,
) {
    let mut lines = format_catalog_entry(kind, index, len, entry);
    if entry.is_some() {
        lines.push(format_nav(nav));
    }
    print_lines(&lines);
}

pub fn format_validation_files(files: &[String], selected: Option<&str>) -> Vec<String> {
    if files.is_empty() {
        return vec!["No validation QR codes found".to_string()];
    }
    let mut lines = vec![format!("Found {} validation QR code(s)", files.len())];
    for (i, name) in files.iter().enumerate() {
        let marker = if Some(name.as_str()) == selected {
            " (selected)"
        } else {
            ""
        };
        lines.push(format!("{} {}{}", format_index(i + 1), name, marker));
    }
    lines
}

// ============================================================================
// Generate and cleanup
// ============================================================================

pub fn format_generate_report(report: &GenerateReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.removed > 0 {
        lines.push(format!("Cleaned {} existing QR codes", report.removed));
    }
    lines.push(format!(
        "Generated {} QR codes in {}",
        report.generated,
        report.output_dir.display()
    ));
    lines
}

pub fn print_generate_report(report: &GenerateReport) {
    print_lines(&format_generate_report(report));
}

/// What `cleanup` would delete, shown when it runs without confirmation.
pub fn format_cleanup_preview(entries: &[CatalogEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No existing dive QR codes to clean up".to_string()];
    }
    let mut lines = vec![format!(
        "Would delete {} existing QR code(s); pass --yes to confirm",
        entries.len()
    )];
    lines.extend(
        entries
            .iter()
            .map(|e| format!("{}{}", indent(1), e.filename)),
    );
    lines
}

pub fn format_cleanup_report(report: &CleanupReport) -> Vec<String> {
    let mut lines = vec![format!("Cleaned up {} existing QR codes", report.deleted)];
    if report.failed > 0 {
        lines.push(format!("{}{} could not be deleted", indent(1), report.failed));
    }
    lines
}

pub fn print_cleanup_report(report: &CleanupReport) {
    print_lines(&format_cleanup_report(report));
}
