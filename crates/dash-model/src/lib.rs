//! Dashboard Model
//!
//! Loads persisted dashboard documents of any schema version and keeps them
//! consistent under editing.
//!
//! # Core Concepts
//!
//! - [`Dashboard`]: migrated document plus derived [`DashboardMeta`]; owns
//!   all rows, panels and queries
//! - [`Panel`]: one visualization unit; its queries are managed through
//!   [`Panel::add_data_query`] and friends so reference letters stay unique
//! - [`PanelKind`]: closed set of panel types and what each can display
//! - [`DashboardDocument`]: the persisted shape returned by
//!   [`Dashboard::save_model_clone`], with no room for metadata
//!
//! # Example
//!
//! ```
//! use dash_model::{Dashboard, MetaOverrides, Panel, PanelKind, PanelId, Span};
//! use serde_json::json;
//!
//! let raw = json!({"rows": [{"panels": [{"id": 5, "type": "graph", "span": 12}]}]});
//! let mut dashboard = Dashboard::new(raw, MetaOverrides::new())?;
//!
//! let panel = Panel::new(PanelKind::Graph).with_span(Span::THIRD);
//! let id = dashboard.add_panel(0, panel)?;
//! assert_eq!(id, PanelId(6));
//!
//! let refid = dashboard.panel_mut(id).unwrap().add_data_query(Some("graphite"))?;
//! assert_eq!(refid.as_str(), "A");
//!
//! let saved = dashboard.to_save_value()?;
//! assert!(saved.get("meta").is_none());
//! # Ok::<(), dash_model::ModelError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod check;
mod config;
mod dashboard;
mod document;
mod error;
mod kind;
mod lenient;
mod meta;
mod panel;
mod query;
mod row;
mod types;

// Re-exports
pub use check::{violations, Violation};
pub use config::{ConfigError, DashboardConfig};
pub use dashboard::{Dashboard, PanelInfo};
pub use document::DashboardDocument;
pub use error::ModelError;
pub use kind::{PanelKind, SeriesArity};
pub use meta::{DashboardMeta, MetaOverrides};
pub use panel::Panel;
pub use query::Query;
pub use row::Row;
pub use types::{ItemList, PanelId, RefId, Span, TimeRange};

pub use dash_migrate::{MigrationReport, CURRENT_SCHEMA_VERSION};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with dashboards
    pub use crate::{
        Dashboard, DashboardConfig, MetaOverrides, ModelError, Panel, PanelId, PanelKind, RefId,
        Row, Span,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
