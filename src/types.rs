//! Shared types used across the encoder, settings store, and catalogs.
//!
//! A [`DiveRecord`] is what the data source hands us; [`DiveSettings`] is what
//! the user chose for it; [`Identity`] is who the code is minted for. The
//! payload encoder combines all three.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Durable identifier of a dive as stored in the source database.
///
/// Settings are keyed by this rather than by the row's position in the
/// loaded list, so re-sorting the list never moves settings between dives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiveId(pub String);

impl DiveId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of `dive_details`, immutable for the session.
///
/// Every measurement is optional: the source database leaves columns NULL
/// freely, and downstream formatting substitutes `0.0` for anything missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiveRecord {
    pub id: DiveId,
    /// Raw timestamp text, expected as `%Y-%m-%d %H:%M:%S`.
    pub timestamp: Option<String>,
    /// Maximum depth in meters.
    pub depth: Option<f64>,
    /// Dive length in seconds.
    pub duration: Option<f64>,
    pub site: Option<String>,
    pub location: Option<String>,
    pub avg_depth: Option<f64>,
    pub avg_temp: Option<f64>,
    pub weather: Option<String>,
    pub visibility: Option<f64>,
}

/// How the diver got into the water.
///
/// Labels carry the downstream numeric code in parentheses, matching the
/// site label convention: `"Boat (22)"`, `"Shore (21)"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryType {
    #[default]
    Boat,
    Shore,
}

impl EntryType {
    pub fn label(self) -> &'static str {
        match self {
            EntryType::Boat => "Boat (22)",
            EntryType::Shore => "Shore (21)",
        }
    }

    /// Interpret a free-form label. Anything containing `Shore`
    /// (case-sensitive) is shore; everything else is boat.
    pub fn from_label(label: &str) -> Self {
        if label.contains("Shore") {
            EntryType::Shore
        } else {
            EntryType::Boat
        }
    }

    /// Code emitted as `var_entry_id`.
    pub fn code(self) -> &'static str {
        match self {
            EntryType::Boat => "22",
            EntryType::Shore => "21",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A person as recorded in the configuration file.
///
/// Fields are kept verbatim; defaulting empty values happens at encode time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Identity {
    pub firstname: String,
    pub lastname: String,
    pub master_id: String,
}

impl Identity {
    pub fn new(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        master_id: impl Into<String>,
    ) -> Self {
        Self {
            firstname: firstname.into(),
            lastname: lastname.into(),
            master_id: master_id.into(),
        }
    }
}

/// Per-dive choices the user can override before generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiveSettings {
    /// Site label, a key into the active region's site table.
    pub site: String,
    pub entry_type: EntryType,
    /// Entry label as the user wrote it; shown in listings, never encoded.
    pub entry_label: String,
}

impl DiveSettings {
    pub fn new(site: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            site: site.into(),
            entry_type,
            entry_label: entry_type.label().to_string(),
        }
    }

    /// Settings from a free-form entry label such as `"Shore Dive"`.
    pub fn with_entry_label(site: impl Into<String>, label: impl Into<String>) -> Self {
        let entry_label = label.into();
        Self {
            site: site.into(),
            entry_type: EntryType::from_label(&entry_label),
            entry_label,
        }
    }
}
