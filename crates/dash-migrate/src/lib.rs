//! Dashboard Schema Migrator
//!
//! Rewrites persisted dashboard documents from any historical schema version
//! into the current one.
//!
//! # Core Concepts
//!
//! - [`MigrationStep`]: one version-gated change, with an optional document
//!   rule and an optional panel rule
//! - [`Migrator`]: runs the ordered step table against a raw document
//! - [`MigrationContext`]: state shared by panel rules in one pass (the panel
//!   id counter)
//! - [`first_unused_letter`]: query reference letter assignment, shared with
//!   the live model
//!
//! # Example
//!
//! ```
//! use dash_migrate::{migrate, CURRENT_SCHEMA_VERSION};
//! use serde_json::json;
//!
//! let mut doc = json!({
//!     "services": {"filter": {"time": {"from": "now-1d", "to": "now"}, "list": [{}]}},
//!     "rows": [{"panels": [{"type": "graphite", "legend": true}]}]
//! });
//! let report = migrate(&mut doc);
//!
//! assert_eq!(report.to, CURRENT_SCHEMA_VERSION);
//! assert_eq!(doc["time"]["from"], "now-1d");
//! assert_eq!(doc["rows"][0]["panels"][0]["type"], "graph");
//! assert_eq!(doc["rows"][0]["panels"][0]["id"], 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod document;
mod migrator;
mod panel;
mod ref_id;
mod step;

pub use migrator::{
    parse_version, promote_legacy_version, schema_version, MigrationReport, Migrator,
};
pub use panel::{panel_id_of, MAX_PANEL_ID};
pub use ref_id::{first_unused_letter, REF_ID_CAPACITY};
pub use step::{all_steps, DocumentRule, MigrationContext, MigrationStep, PanelRule};

use serde_json::Value;

/// Latest schema version; every migrated document records this value
pub const CURRENT_SCHEMA_VERSION: u32 = 8;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Migrate `document` in place to [`CURRENT_SCHEMA_VERSION`]
///
/// Idempotent: a document already at the current version is left as is.
pub fn migrate(document: &mut Value) -> MigrationReport {
    Migrator::new().run(document)
}
