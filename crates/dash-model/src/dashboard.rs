//! Dashboard model
//!
//! Wraps a migrated [`DashboardDocument`] with its derived metadata and
//! exposes the mutation operations that keep panel ids unique and rows
//! within the grid.
//!
//! There is no process-wide "current dashboard": callers hold the
//! [`Dashboard`] they are editing and pass it where it is needed.

use dash_migrate::{migrate, promote_legacy_version, MigrationReport};
use serde_json::{Map, Value};

use crate::check::{violations, Violation};
use crate::config::DashboardConfig;
use crate::document::{DashboardDocument, METADATA_KEY};
use crate::error::ModelError;
use crate::meta::{DashboardMeta, MetaOverrides};
use crate::panel::Panel;
use crate::row::Row;
use crate::types::{PanelId, Span};

/// Where a panel sits in the layout
#[derive(Debug, Clone, Copy)]
pub struct PanelInfo<'a> {
    /// Index of the owning row
    pub row: usize,
    /// Index within the row
    pub index: usize,
    /// The panel itself
    pub panel: &'a Panel,
}

/// A loaded, migrated dashboard and its metadata
#[derive(Debug, Clone)]
pub struct Dashboard {
    document: DashboardDocument,
    meta: DashboardMeta,
    migration: Option<MigrationReport>,
}

impl Dashboard {
    /// Load a raw document with default configuration
    ///
    /// # Errors
    /// [`ModelError::InvalidDocument`] when a present field has the wrong
    /// shape after migration.
    pub fn new(raw: Value, overrides: MetaOverrides) -> Result<Self, ModelError> {
        Self::with_config(raw, overrides, &DashboardConfig::default())
    }

    /// Load a raw document
    ///
    /// Promotes a legacy `version`, fills defaults, migrates to the current
    /// schema, repairs panel ids and derives metadata.
    ///
    /// # Errors
    /// [`ModelError::InvalidDocument`] when a present field has the wrong
    /// shape after migration.
    pub fn with_config(
        mut raw: Value,
        overrides: MetaOverrides,
        config: &DashboardConfig,
    ) -> Result<Self, ModelError> {
        if !raw.is_object() {
            tracing::warn!("dashboard document is not an object, starting from an empty one");
            raw = Value::Object(Map::new());
        }
        promote_legacy_version(&mut raw);
        if let Some(doc) = raw.as_object_mut() {
            if doc.remove(METADATA_KEY).is_some() {
                tracing::debug!("dropping metadata stored inside the document");
            }
            config.apply_defaults(doc);
        }

        let report = migrate(&mut raw);
        let mut document: DashboardDocument = serde_json::from_value(raw)?;

        if config.repair_panel_ids {
            let repaired = document.repair_panel_ids();
            if repaired > 0 {
                tracing::warn!(repaired, "repaired panel ids");
            }
        }

        let mut dashboard = Self::from_document(document, overrides);
        dashboard.migration = Some(report);
        Ok(dashboard)
    }

    /// Parse and load a JSON document
    ///
    /// # Errors
    /// [`ModelError::InvalidDocument`] when the text is not JSON or a field
    /// has the wrong shape.
    pub fn from_json(text: &str, overrides: MetaOverrides) -> Result<Self, ModelError> {
        let raw: Value = serde_json::from_str(text)?;
        Self::new(raw, overrides)
    }

    /// New empty dashboard
    #[must_use]
    pub fn empty(overrides: MetaOverrides) -> Self {
        Self::from_document(DashboardDocument::default(), overrides)
    }

    /// Wrap an already-current document, deriving metadata
    #[must_use]
    pub fn from_document(mut document: DashboardDocument, overrides: MetaOverrides) -> Self {
        if !document.editable {
            document.hide_controls = true;
        }
        let meta = DashboardMeta::derive(overrides, document.editable);
        tracing::debug!(
            title = %document.title,
            panels = document.panels().count(),
            can_edit = meta.can_edit,
            "dashboard loaded"
        );
        Self {
            document,
            meta,
            migration: None,
        }
    }

    /// Underlying document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &DashboardDocument {
        &self.document
    }

    /// Mutable document settings (title, time, templating, ...)
    ///
    /// Rows and panels are only reachable through the model operations.
    #[inline]
    pub fn settings_mut(&mut self) -> &mut DashboardDocument {
        &mut self.document
    }

    /// Derived metadata
    #[inline]
    #[must_use]
    pub fn meta(&self) -> &DashboardMeta {
        &self.meta
    }

    /// Report of the migration run at load, if the dashboard was loaded
    #[inline]
    #[must_use]
    pub fn migration(&self) -> Option<&MigrationReport> {
        self.migration.as_ref()
    }

    /// Title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.document.title
    }

    /// Recorded schema version
    #[inline]
    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.document.schema_version
    }

    /// Rows in display order
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        self.document.rows()
    }

    /// Row by index
    #[inline]
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.document.rows.get(index)
    }

    /// Append an empty row, returning its index
    ///
    /// Any panels the row carried are discarded; panels enter a dashboard
    /// only through [`add_panel`](Self::add_panel).
    pub fn add_row(&mut self, mut row: Row) -> usize {
        row.panels.clear();
        self.document.rows.push(row);
        self.document.rows.len() - 1
    }

    /// All panels, row-major
    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.document.panels()
    }

    /// Visit every panel with its row index and position in the row
    pub fn for_each_panel<F>(&self, mut f: F)
    where
        F: FnMut(&Panel, usize, usize),
    {
        for (row_index, row) in self.document.rows.iter().enumerate() {
            for (index, panel) in row.panels.iter().enumerate() {
                f(panel, row_index, index);
            }
        }
    }

    /// `max(id) + 1` over all panels, or 1 when there are none
    #[inline]
    #[must_use]
    pub fn next_panel_id(&self) -> PanelId {
        self.document.next_panel_id()
    }

    /// Sum of panel spans in a row
    ///
    /// # Errors
    /// [`ModelError::RowOutOfRange`] for a bad row index.
    pub fn row_span(&self, row: usize) -> Result<u32, ModelError> {
        self.row_ref(row).map(Row::span)
    }

    /// Place `panel` at the end of `row` under a fresh id
    ///
    /// When the row has no room left, a row holding one panel is split 6/6
    /// and a row holding two is split 4/4/4. Rows with three or more panels
    /// are not rebalanced and may exceed the grid width.
    ///
    /// # Errors
    /// [`ModelError::RowOutOfRange`] for a bad row index.
    pub fn add_panel(&mut self, row: usize, mut panel: Panel) -> Result<PanelId, ModelError> {
        let id = self.next_panel_id();
        let target = self.row_mut(row)?;

        let used = i64::from(target.span());
        let space = i64::from(Span::GRID_WIDTH) - used - i64::from(panel.span.get());
        panel.id = id;

        if space <= 0 {
            match target.panels.as_mut_slice() {
                [only] => {
                    only.span = Span::HALF;
                    panel.span = Span::HALF;
                }
                [first, second] => {
                    first.span = Span::THIRD;
                    second.span = Span::THIRD;
                    panel.span = Span::THIRD;
                }
                [] => {}
                crowded => {
                    tracing::debug!(
                        row,
                        panels = crowded.len(),
                        span = used + i64::from(panel.span.get()),
                        "row over grid width, not rebalanced"
                    );
                }
            }
        }

        target.panels.push(panel);
        tracing::debug!(%id, row, "added panel");
        Ok(id)
    }

    /// Copy panel `id` to the end of its row under a fresh id
    ///
    /// The copy keeps queries and options but drops repeat binding. The
    /// row is not rebalanced.
    ///
    /// # Errors
    /// [`ModelError::PanelNotFound`] when no panel has this id.
    pub fn duplicate_panel(&mut self, id: PanelId) -> Result<PanelId, ModelError> {
        let (row, index) = self.locate(id).ok_or(ModelError::PanelNotFound(id))?;
        let new_id = self.next_panel_id();
        let panels = &mut self.document.rows[row].panels;
        let copy = panels[index].duplicate(new_id);
        panels.push(copy);
        tracing::debug!(source = %id, copy = %new_id, row, "duplicated panel");
        Ok(new_id)
    }

    /// Remove panel `id` from its row
    ///
    /// # Errors
    /// [`ModelError::PanelNotFound`] when no panel has this id.
    pub fn remove_panel(&mut self, id: PanelId) -> Result<Panel, ModelError> {
        let (row, index) = self.locate(id).ok_or(ModelError::PanelNotFound(id))?;
        let removed = self.document.rows[row].panels.remove(index);
        tracing::debug!(%id, row, "removed panel");
        Ok(removed)
    }

    /// Panel by id
    #[must_use]
    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.panels().find(|p| p.id == id)
    }

    /// Mutable panel by id
    pub fn panel_mut(&mut self, id: PanelId) -> Option<&mut Panel> {
        let (row, index) = self.locate(id)?;
        self.document.rows[row].panels.get_mut(index)
    }

    /// Panel by id together with its row and position
    #[must_use]
    pub fn panel_info(&self, id: PanelId) -> Option<PanelInfo<'_>> {
        let (row, index) = self.locate(id)?;
        Some(PanelInfo {
            row,
            index,
            panel: &self.document.rows[row].panels[index],
        })
    }

    /// Whether the template, annotation and link bar has anything to show
    #[must_use]
    pub fn is_submenu_features_enabled(&self) -> bool {
        let visible_variables = self.document.templating.list.iter().any(|variable| {
            !variable
                .get("hideVariable")
                .and_then(Value::as_bool)
                .unwrap_or(false)
        });
        visible_variables || !self.document.annotations.is_empty() || !self.document.links.is_empty()
    }

    /// Broken identity or layout invariants, if any
    #[must_use]
    pub fn violations(&self) -> Vec<Violation> {
        violations(&self.document)
    }

    /// Independent copy of the document for storage, without metadata
    #[must_use]
    pub fn save_model_clone(&self) -> DashboardDocument {
        self.document.persistable_copy()
    }

    /// Save model as a JSON value
    ///
    /// # Errors
    /// Propagates serialization failures.
    pub fn to_save_value(&self) -> Result<Value, ModelError> {
        Ok(serde_json::to_value(self.save_model_clone())?)
    }

    /// Save model as pretty-printed JSON
    ///
    /// # Errors
    /// Propagates serialization failures.
    pub fn to_save_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(&self.save_model_clone())?)
    }

    fn locate(&self, id: PanelId) -> Option<(usize, usize)> {
        self.document
            .rows
            .iter()
            .enumerate()
            .find_map(|(row, r)| r.panels.iter().position(|p| p.id == id).map(|index| (row, index)))
    }

    fn row_ref(&self, index: usize) -> Result<&Row, ModelError> {
        let rows = self.document.rows.len();
        self.document
            .rows
            .get(index)
            .ok_or(ModelError::RowOutOfRange { index, rows })
    }

    fn row_mut(&mut self, index: usize) -> Result<&mut Row, ModelError> {
        let rows = self.document.rows.len();
        self.document
            .rows
            .get_mut(index)
            .ok_or(ModelError::RowOutOfRange { index, rows })
    }
}
