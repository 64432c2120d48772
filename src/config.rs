//! Persisted configuration.
//!
//! Handles loading, validating, merging and saving `config.toml`. The file
//! lives in the working directory by default (`--config` overrides it) and is
//! created with stock contents on first run.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [user]
//! firstname = ""
//! lastname = ""
//! master_id = ""
//!
//! [buddy]
//! firstname = ""            # Encoded into every payload
//! lastname = ""
//! master_id = ""
//!
//! [defaults]
//! entry_type = "Boat (22)"  # Entry type seeded for freshly loaded dives
//! auto_load_latest_db = true
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want. Missing keys
//! keep their stock value. Unknown keys are rejected to catch typos early.

use crate::types::{EntryType, Identity};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, resolved against the working directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// The person running the tool. Stored, not encoded.
    pub user: Identity,
    /// Buddy identity written into every payload.
    pub buddy: Identity,
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Entry type label seeded into every freshly loaded dive.
    pub entry_type: String,
    /// Open the newest database when none is named explicitly.
    pub auto_load_latest_db: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            entry_type: EntryType::Boat.label().to_string(),
            auto_load_latest_db: true,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.defaults.entry_type.trim().is_empty() {
            return Err(ConfigError::Validation(
                "defaults.entry_type must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The configured entry label, seeded into every freshly loaded dive.
    pub fn default_entry_label(&self) -> &str {
        &self.defaults.entry_type
    }
}

/// Stock defaults as a TOML value, the base every file is merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Deep-merge `overlay` onto `base`. Tables merge key by key; anything else
/// is replaced wholesale.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`.
///
/// A missing file yields the defaults and writes the stock file in its place.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    if !path.exists() {
        write_stock_config(path)?;
        info!("Created default config at {}", path.display());
        return resolve_config(base, None);
    }
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(base, Some(overlay))
}

/// Rewrite the config file at `path` with every key present.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    config.validate()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}

fn write_stock_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, stock_config_toml())?;
    Ok(())
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command and on first run.
pub fn stock_config_toml() -> &'static str {
    r##"# Dive QR Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# You
# ---------------------------------------------------------------------------
[user]
firstname = ""
lastname = ""
master_id = ""

# ---------------------------------------------------------------------------
# Buddy written into every generated code
# ---------------------------------------------------------------------------
[buddy]
# Empty names are encoded as "Unknown", an empty id as "0".
firstname = ""
lastname = ""
master_id = ""

# ---------------------------------------------------------------------------
# Defaults for freshly loaded dives
# ---------------------------------------------------------------------------
[defaults]
# "Boat (22)" or "Shore (21)". Any label containing "Shore" means shore.
entry_type = "Boat (22)"

# Open the newest database in the databases directory when --db is not given.
auto_load_latest_db = true
"##
}
