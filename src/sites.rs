//! Dive site reference data, partitioned by region.
//!
//! Each region is one JSON document in the sites directory. Only a small part
//! of the document matters:
//!
//! ```json
//! {"result": {"elements": [
//!     {"data": {"properties": {"id": 42, "name": "Reef"}}}
//! ]}}
//! ```
//!
//! Every element with a non-empty `id` and `name` becomes the label
//! `"Reef (42)"` mapping to the code `"42"`. Elements missing either are
//! skipped.
//!
//! ## Fallback
//!
//! A region that cannot be read, does not parse, or yields no usable element
//! collapses to the sentinel table `{"No Site (0)": "0"}`. This is logged and
//! never fatal: the user can still generate codes, they just carry site `0`.

use crate::naming::{has_extension, region_display_name};
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default region documents directory, relative to the working directory.
pub const DEFAULT_SITES_DIR: &str = "ssi_dive_sites";

pub const SENTINEL_LABEL: &str = "No Site (0)";
pub const SENTINEL_CODE: &str = "0";

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No usable dive sites in {0}")]
    NoSites(PathBuf),
    #[error("Unknown region: {0}")]
    UnknownRegion(String),
}

/// Site label → site code, sorted ascending by label.
///
/// Never empty: a table with no real sites holds the sentinel entry, so
/// [`first`](Self::first) always has an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTable {
    entries: BTreeMap<String, String>,
}

impl SiteTable {
    pub fn sentinel() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(SENTINEL_LABEL.to_string(), SENTINEL_CODE.to_string());
        Self { entries }
    }

    /// Build from `(label, code)` pairs. Later duplicates win.
    pub fn from_entries<I, L, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, C)>,
        L: Into<String>,
        C: Into<String>,
    {
        let entries: BTreeMap<String, String> = pairs
            .into_iter()
            .map(|(l, c)| (l.into(), c.into()))
            .collect();
        if entries.is_empty() {
            Self::sentinel()
        } else {
            Self { entries }
        }
    }

    /// Alphabetically lowest label; the default site for freshly loaded dives.
    pub fn first(&self) -> &str {
        self.entries
            .keys()
            .next()
            .map(String::as_str)
            .unwrap_or(SENTINEL_LABEL)
    }

    /// Code for a label, `"0"` when the label is not in this table.
    pub fn code_for(&self, label: &str) -> &str {
        self.entries
            .get(label)
            .map(String::as_str)
            .unwrap_or(SENTINEL_CODE)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_sentinel(&self) -> bool {
        self.entries.len() == 1 && self.entries.contains_key(SENTINEL_LABEL)
    }
}

impl Default for SiteTable {
    fn default() -> Self {
        Self::sentinel()
    }
}

#[derive(Deserialize)]
struct RegionDocument {
    #[serde(default)]
    result: Option<RegionResult>,
}

#[derive(Deserialize)]
struct RegionResult {
    #[serde(default)]
    elements: Vec<Value>,
}

/// Text of an `id`/`name` property. Empty strings, zero, null, and
/// non-scalar values count as absent.
fn property_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn site_pair(element: &Value) -> Option<(String, String)> {
    let props = element.get("data")?.get("properties")?;
    let id = property_text(props.get("id"))?;
    let name = property_text(props.get("name"))?;
    Some((format!("{name} ({id})"), id))
}

/// Parse one region document. Errors when nothing usable is found.
pub fn load_site_document(path: &Path) -> Result<SiteTable, SiteError> {
    let content = fs::read_to_string(path)?;
    let doc: RegionDocument = serde_json::from_str(&content)?;
    let pairs: Vec<(String, String)> = doc
        .result
        .map(|r| r.elements)
        .unwrap_or_default()
        .iter()
        .filter_map(site_pair)
        .collect();
    if pairs.is_empty() {
        return Err(SiteError::NoSites(path.to_path_buf()));
    }
    Ok(SiteTable::from_entries(pairs))
}

/// The set of regions found in a sites directory.
#[derive(Debug, Clone, Default)]
pub struct SiteRegionIndex {
    regions: BTreeMap<String, PathBuf>,
}

impl SiteRegionIndex {
    /// Find every `*.json` document in `sites_dir`.
    ///
    /// A missing or unreadable directory yields an empty index.
    pub fn discover(sites_dir: &Path) -> Self {
        let mut regions = BTreeMap::new();
        let entries = match fs::read_dir(sites_dir) {
            Ok(entries) => entries,
            Err(e) => {
                if sites_dir.exists() {
                    warn!("Could not read sites directory {}: {e}", sites_dir.display());
                }
                return Self { regions };
            }
        };
        for path in entries.filter_map(|e| e.ok()).map(|e| e.path()) {
            if !path.is_file() || !has_extension(&path, "json") {
                continue;
            }
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            regions.insert(region_display_name(&stem), path);
        }
        Self { regions }
    }

    /// Region display names, ascending.
    pub fn list_regions(&self) -> Vec<&str> {
        self.regions.keys().map(String::as_str).collect()
    }

    pub fn first_region(&self) -> Option<&str> {
        self.regions.keys().next().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn try_load_region(&self, name: &str) -> Result<SiteTable, SiteError> {
        let path = self
            .regions
            .get(name)
            .ok_or_else(|| SiteError::UnknownRegion(name.to_string()))?;
        load_site_document(path)
    }

    /// Site table for a region, falling back to the sentinel table.
    pub fn load_region(&self, name: &str) -> SiteTable {
        match self.try_load_region(name) {
            Ok(table) => {
                info!("Loaded {} dive sites from {name}", table.len());
                table
            }
            Err(e) => {
                warn!("Could not load dive sites from {name}: {e}");
                SiteTable::sentinel()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{region_json, write_region};
    use tempfile::TempDir;

    #[test]
    fn sentinel_table_shape() {
        let t = SiteTable::sentinel();
        assert_eq!(t.len(), 1);
        assert_eq!(t.first(), "No Site (0)");
        assert_eq!(t.code_for("No Site (0)"), "0");
        assert!(t.is_sentinel());
    }

    #[test]
    fn table_sorted_by_label() {
        let t = SiteTable::from_entries([("Wreck (7)", "7"), ("Arch (3)", "3"), ("Reef (42)", "42")]);
        let labels: Vec<&str> = t.labels().collect();
        assert_eq!(labels, vec!["Arch (3)", "Reef (42)", "Wreck (7)"]);
        assert_eq!(t.first(), "Arch (3)");
    }

    #[test]
    fn empty_pairs_become_sentinel() {
        let t = SiteTable::from_entries(Vec::<(String, String)>::new());
        assert!(t.is_sentinel());
    }

    #[test]
    fn lookup_miss_is_zero() {
        let t = SiteTable::from_entries([("Reef (42)", "42")]);
        assert_eq!(t.code_for("Reef (42)"), "42");
        assert_eq!(t.code_for("Reef"), "0");
        assert_eq!(t.code_for(""), "0");
    }

    #[test]
    fn document_elements_become_labels() {
        let tmp = TempDir::new().unwrap();
        let path = write_region(tmp.path(), "red_sea", &[("42", "Reef"), ("7", "Wreck")]);
        let t = load_site_document(&path).unwrap();
        assert_eq!(t.code_for("Reef (42)"), "42");
        assert_eq!(t.code_for("Wreck (7)"), "7");
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("numbers.json");
        fs::write(
            &path,
            r#"{"result":{"elements":[{"data":{"properties":{"id":1234,"name":"Blue Hole"}}}]}}"#,
        )
        .unwrap();
        let t = load_site_document(&path).unwrap();
        assert_eq!(t.code_for("Blue Hole (1234)"), "1234");
    }

    #[test]
    fn elements_missing_id_or_name_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("partial.json");
        fs::write(
            &path,
            r#"{"result":{"elements":[
                {"data":{"properties":{"id":"1","name":""}}},
                {"data":{"properties":{"name":"Nameless"}}},
                {"data":{}},
                {"other":true},
                {"data":{"properties":{"id":"5","name":"Canyon"}}}
            ]}}"#,
        )
        .unwrap();
        let t = load_site_document(&path).unwrap();
        let labels: Vec<&str> = t.labels().collect();
        assert_eq!(labels, vec!["Canyon (5)"]);
    }

    #[test]
    fn zero_valid_elements_is_sentinel() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("empty.json"),
            r#"{"result":{"elements":[{"data":{"properties":{"id":"","name":"X"}}}]}}"#,
        )
        .unwrap();
        let index = SiteRegionIndex::discover(tmp.path());
        let t = index.load_region("Empty");
        assert_eq!(t, SiteTable::sentinel());
        let labels: Vec<&str> = t.labels().collect();
        assert_eq!(labels, vec!["No Site (0)"]);
        assert_eq!(t.code_for("No Site (0)"), "0");
    }

    #[test]
    fn malformed_document_is_sentinel() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.json"), "{ not json").unwrap();
        let index = SiteRegionIndex::discover(tmp.path());
        assert!(matches!(
            index.try_load_region("Broken"),
            Err(SiteError::Json(_))
        ));
        assert!(index.load_region("Broken").is_sentinel());
    }

    #[test]
    fn unknown_region_is_sentinel() {
        let tmp = TempDir::new().unwrap();
        let index = SiteRegionIndex::discover(tmp.path());
        assert!(matches!(
            index.try_load_region("Atlantis"),
            Err(SiteError::UnknownRegion(_))
        ));
        assert!(index.load_region("Atlantis").is_sentinel());
    }

    #[test]
    fn regions_discovered_and_sorted() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("red_sea.json"), region_json(&[("1", "A")])).unwrap();
        fs::write(tmp.path().join("MALTA.json"), region_json(&[("2", "B")])).unwrap();
        fs::write(tmp.path().join("bali.JSON"), region_json(&[("3", "C")])).unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();
        let index = SiteRegionIndex::discover(tmp.path());
        assert_eq!(index.list_regions(), vec!["Bali", "Malta", "Red Sea"]);
        assert_eq!(index.first_region(), Some("Bali"));
    }

    #[test]
    fn missing_sites_dir_is_empty_index() {
        let tmp = TempDir::new().unwrap();
        let index = SiteRegionIndex::discover(&tmp.path().join("nope"));
        assert!(index.is_empty());
        assert!(index.list_regions().is_empty());
    }

    #[test]
    fn switching_regions_replaces_table() {
        let tmp = TempDir::new().unwrap();
        write_region(tmp.path(), "red_sea", &[("42", "Reef")]);
        write_region(tmp.path(), "malta", &[("9", "Blue Hole")]);
        let index = SiteRegionIndex::discover(tmp.path());

        let red = index.load_region("Red Sea");
        let malta = index.load_region("Malta");
        assert!(red.contains("Reef (42)"));
        assert!(!malta.contains("Reef (42)"));
        assert_eq!(malta.code_for("Reef (42)"), "0");
        // Loading again gives the same table
        assert_eq!(index.load_region("Red Sea"), red);
    }
}
