//! Persisted dashboard document
//!
//! The shape written to storage. It has no place for metadata, so a save
//! model can never carry any.

use std::collections::HashSet;

use dash_migrate::CURRENT_SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::DashboardConfig;
use crate::lenient;
use crate::panel::Panel;
use crate::row::Row;
use crate::types::{ItemList, PanelId, TimeRange};

/// Key under which editors attach metadata; never persisted
pub(crate) const METADATA_KEY: &str = "meta";

/// Dashboard document at the current schema version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardDocument {
    /// Storage id; `None` until first saved
    #[serde(deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub style: String,
    #[serde(deserialize_with = "lenient::string")]
    pub timezone: String,
    #[serde(deserialize_with = "lenient::bool_or_true")]
    pub editable: bool,
    #[serde(deserialize_with = "lenient::bool_or_false")]
    pub hide_controls: bool,
    #[serde(deserialize_with = "lenient::bool_or_false")]
    pub shared_crosshair: bool,
    #[serde(deserialize_with = "lenient::list")]
    pub(crate) rows: Vec<Row>,
    pub time: TimeRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timepicker: Option<Value>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub templating: ItemList,
    #[serde(deserialize_with = "lenient::or_default")]
    pub annotations: ItemList,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Value>,
    #[serde(deserialize_with = "lenient::schema_version")]
    pub schema_version: u32,
    /// Save counter, bumped by storage
    #[serde(deserialize_with = "lenient::counter")]
    pub version: u64,
    #[serde(deserialize_with = "lenient::list")]
    pub links: Vec<Value>,

    /// Attributes the model does not manage
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DashboardDocument {
    /// Empty document built from configured defaults
    #[must_use]
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self {
            id: None,
            title: config.default_title.clone(),
            tags: Vec::new(),
            style: config.default_style.clone(),
            timezone: config.default_timezone.clone(),
            editable: true,
            hide_controls: false,
            shared_crosshair: false,
            rows: Vec::new(),
            time: config.default_time.clone(),
            timepicker: None,
            templating: ItemList::default(),
            annotations: ItemList::default(),
            refresh: None,
            snapshot: None,
            schema_version: CURRENT_SCHEMA_VERSION,
            version: 0,
            links: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Rows in display order
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// All panels, row-major
    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.rows.iter().flat_map(|row| row.panels.iter())
    }

    /// `max(id) + 1` over all panels, or 1 when there are none
    #[must_use]
    pub fn next_panel_id(&self) -> PanelId {
        self.panels()
            .map(Panel::id)
            .max()
            .map_or(PanelId::FIRST, PanelId::next)
    }

    /// Give panels with a missing or already-seen id a fresh one
    ///
    /// The first panel holding an id keeps it. Returns how many panels were
    /// renumbered.
    pub(crate) fn repair_panel_ids(&mut self) -> usize {
        let mut next = self.next_panel_id();
        let mut seen = HashSet::new();
        let mut repaired = 0;

        for panel in self.rows.iter_mut().flat_map(|row| row.panels.iter_mut()) {
            if panel.id.is_assigned() && seen.insert(panel.id) {
                continue;
            }
            tracing::warn!(old = %panel.id, new = %next, "renumbering panel with missing or duplicate id");
            panel.id = next;
            seen.insert(next);
            next = next.next();
            repaired += 1;
        }
        repaired
    }

    /// Independent copy for storage, field by field
    ///
    /// Metadata attached under `meta` is left out.
    #[must_use]
    pub fn persistable_copy(&self) -> Self {
        let mut extra = self.extra.clone();
        extra.remove(METADATA_KEY);
        Self {
            id: self.id,
            title: self.title.clone(),
            tags: self.tags.clone(),
            style: self.style.clone(),
            timezone: self.timezone.clone(),
            editable: self.editable,
            hide_controls: self.hide_controls,
            shared_crosshair: self.shared_crosshair,
            rows: self.rows.iter().map(Row::persistable_copy).collect(),
            time: self.time.clone(),
            timepicker: self.timepicker.clone(),
            templating: self.templating.clone(),
            annotations: self.annotations.clone(),
            refresh: self.refresh.clone(),
            snapshot: self.snapshot.clone(),
            schema_version: self.schema_version,
            version: self.version,
            links: self.links.clone(),
            extra,
        }
    }
}

impl Default for DashboardDocument {
    fn default() -> Self {
        Self::from_config(&DashboardConfig::default())
    }
}
