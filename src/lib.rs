//! # Dive QR
//!
//! Turns dive log records into QR codes a dive-logging app can scan, and
//! manages the image files that result.
//!
//! A dive computer exports a SQLite logbook. Each dive in it, together with a
//! site and entry type chosen by the user and a buddy identity from the config
//! file, becomes one `;`-separated payload string. The payload is rendered as
//! a QR code and written as a PNG next to the logbook.
//!
//! # Pipeline
//!
//! ```text
//! logbook.db ─► DiveRecord ─┐
//! region.json ─► SiteTable ─┼─► payload ─► QR image ─► ssi_dives_qr_codes/*.png
//! config.toml ─► Identity ──┘
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Shared types: `DiveId`, `DiveRecord`, `EntryType`, `Identity`, `DiveSettings` |
//! | [`naming`] | Output filenames, directory names, PNG detection, region display names |
//! | [`sites`] | Region discovery and the sorted site label → code table |
//! | [`settings`] | Per-dive site and entry type overrides, keyed by dive id |
//! | [`payload`] | The payload encoder and its formatting rules |
//! | [`imaging`] | QR render/save/load behind the `QrBackend` trait |
//! | [`catalog`] | Generated, existing-on-disk, and validation catalogs with cursors |
//! | [`source`] | Logbook discovery and the `dive_details` reader |
//! | [`config`] | `config.toml` loading, validation, merging, and saving |
//! | [`session`] | The single core instance wiring everything together |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Settings Follow the Dive
//!
//! Per-dive overrides are keyed by the logbook's `DiveId`, not by a row's
//! position in a list. Sorting or filtering the dive list can never move a
//! site choice onto the wrong dive.
//!
//! ## Explicit Catalog Mode
//!
//! The three catalogs are independent values with their own cursors. The
//! active one is a plain [`catalog::CatalogKind`] field on the manager, so any
//! catalog can be built and navigated in a test without the others.
//!
//! ## Missing Data Never Fails Encoding
//!
//! Logbooks leave columns NULL freely. Every missing measurement encodes as
//! `0.0`, a missing timestamp as a fixed sentinel date, and an unknown site as
//! code `0`. Only rendering and writing files can fail a batch.

pub mod catalog;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod payload;
pub mod session;
pub mod settings;
pub mod sites;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
