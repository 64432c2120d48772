//! Dive payload encoding.
//!
//! Turns one dive plus its settings and the buddy identity into the
//! `;`-separated `key:value` string the downstream importer scans. The key
//! spellings and their order are a wire contract; nothing here may reorder
//! or rename a field.
//!
//! ## Wire Format
//!
//! ```text
//! dive;noid;dive_type:0;divetime:40.0;datetime:202503010815;depth_m:18.0;site:42;
//! var_weather_id:1;var_entry_id:21;var_water_body_id:13;var_watertype_id:5;
//! var_current_id:6;var_surface_id:10;var_divetype_id:24;var_divetype_id:24;
//! user_master_id:99;user_firstname:Jane;user_lastname:Doe;user_leader_id:;
//! airtemp_c:22.3;vis_m:15.0
//! ```
//!
//! (Shown wrapped; the real payload is a single line.)
//!
//! ## Defaulting
//!
//! Missing data never fails encoding:
//! - numeric fields → `0.0`
//! - timestamp missing or not `%Y-%m-%d %H:%M:%S` → `202501010000`
//! - site label not in the active table → `0`
//! - empty buddy names → `Unknown`, empty buddy id → `0`
//!
//! `var_divetype_id` is emitted twice. Whether the importer accepts a single
//! copy is unconfirmed, so both stay.

use crate::sites::SiteTable;
use crate::types::{DiveRecord, DiveSettings, Identity};
use chrono::NaiveDateTime;

/// Format of `DiveDate` in the source database.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `datetime` value used when the dive has no usable timestamp.
pub const SENTINEL_DATETIME: &str = "202501010000";

const WEATHER_ID: &str = "1";
const WATER_BODY_ID: &str = "13";
const WATERTYPE_ID: &str = "5";
const CURRENT_ID: &str = "6";
const SURFACE_ID: &str = "10";
const DIVETYPE_ID: &str = "24";

/// Parse a source timestamp. `None` for anything not in [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}

/// Render an optional measurement with exactly one fractional digit.
pub fn one_decimal(value: Option<f64>) -> String {
    format!("{:.1}", value.unwrap_or(0.0))
}

/// Dive length in minutes, from the source's seconds.
pub fn duration_minutes(seconds: Option<f64>) -> Option<f64> {
    seconds.map(|s| s / 60.0)
}

fn datetime_field(timestamp: Option<&str>) -> String {
    timestamp
        .and_then(parse_timestamp)
        .map(|dt| dt.format("%Y%m%d%H%M").to_string())
        .unwrap_or_else(|| SENTINEL_DATETIME.to_string())
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

/// Encode one dive.
///
/// Pure: the same inputs always produce the same string.
pub fn encode(
    record: &DiveRecord,
    settings: &DiveSettings,
    buddy: &Identity,
    sites: &SiteTable,
) -> String {
    let fields: [(&str, String); 19] = [
        ("dive_type", "0".to_string()),
        ("divetime", one_decimal(duration_minutes(record.duration))),
        ("datetime", datetime_field(record.timestamp.as_deref())),
        ("depth_m", one_decimal(record.depth)),
        ("site", sites.code_for(&settings.site).to_string()),
        ("var_weather_id", WEATHER_ID.to_string()),
        ("var_entry_id", settings.entry_type.code().to_string()),
        ("var_water_body_id", WATER_BODY_ID.to_string()),
        ("var_watertype_id", WATERTYPE_ID.to_string()),
        ("var_current_id", CURRENT_ID.to_string()),
        ("var_surface_id", SURFACE_ID.to_string()),
        ("var_divetype_id", DIVETYPE_ID.to_string()),
        ("var_divetype_id", DIVETYPE_ID.to_string()),
        ("user_master_id", or_default(&buddy.master_id, "0").to_string()),
        ("user_firstname", or_default(&buddy.firstname, "Unknown").to_string()),
        ("user_lastname", or_default(&buddy.lastname, "Unknown").to_string()),
        ("user_leader_id", String::new()),
        ("airtemp_c", one_decimal(record.avg_temp)),
        ("vis_m", one_decimal(record.visibility)),
    ];

    let mut payload = String::from("dive;noid");
    for (key, value) in fields {
        payload.push(';');
        payload.push_str(key);
        payload.push(':');
        payload.push_str(&value);
    }
    payload
}
