//! Filename conventions for everything written to or read from disk.
//!
//! ## Output Layout
//!
//! Codes are written next to the database they were generated from:
//!
//! ```text
//! shearwater_databases/
//! ├── logbook.db
//! ├── ssi_dives_qr_codes/           # generated codes
//! │   ├── dive_20250301_081500.png  # named by dive timestamp
//! │   └── dive_000.png              # fallback when the timestamp is unusable
//! └── ssi_validations_qr_codes/     # externally supplied codes, read-only
//!     └── buddy-card.png
//! ```
//!
//! ## Region Names
//!
//! Region documents are named with underscores (`red_sea.json`); the display
//! name capitalizes each word: `"Red Sea"`.

use crate::payload::parse_timestamp;
use std::path::{Path, PathBuf};

/// Directory (under the source directory) that receives generated codes.
pub const OUTPUT_DIR_NAME: &str = "ssi_dives_qr_codes";

/// Directory (under the source directory) holding validation codes.
pub const VALIDATION_DIR_NAME: &str = "ssi_validations_qr_codes";

pub fn output_dir(source_dir: &Path) -> PathBuf {
    source_dir.join(OUTPUT_DIR_NAME)
}

pub fn validation_dir(source_dir: &Path) -> PathBuf {
    source_dir.join(VALIDATION_DIR_NAME)
}

/// Filename for a generated code.
///
/// - `"2025-03-01 08:15:00"` → `dive_20250301_081500.png`
/// - missing or unparseable timestamp → `dive_{ordinal:03}.png`
///
/// `ordinal` is the 0-based position of the dive within the current batch.
pub fn qr_filename(timestamp: Option<&str>, ordinal: usize) -> String {
    match timestamp.and_then(parse_timestamp) {
        Some(dt) => format!("dive_{}.png", dt.format("%Y%m%d_%H%M%S")),
        None => format!("dive_{ordinal:03}.png"),
    }
}

/// True for regular files ending in `.png` (any case).
pub fn is_png(path: &Path) -> bool {
    path.is_file() && has_extension(path, "png")
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Turn a region document stem into its display name.
///
/// Underscores become spaces; every run of letters starts upper-case and
/// continues lower-case.
/// - `"red_sea"` → `"Red Sea"`
/// - `"NORTH_bali"` → `"North Bali"`
pub fn region_display_name(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut prev_alpha = false;
    for c in stem.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
