//! Panels and their query list
//!
//! A panel's id is handed out by the owning dashboard; its queries are
//! managed through the operations here so reference letters stay unique.

use dash_migrate::first_unused_letter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ModelError;
use crate::kind::PanelKind;
use crate::lenient;
use crate::query::Query;
use crate::types::{PanelId, RefId, Span};

/// One visualization unit within a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    #[serde(default)]
    pub(crate) id: PanelId,

    /// Width in grid units
    #[serde(default)]
    pub span: Span,

    /// Type tag
    #[serde(rename = "type", default, skip_serializing_if = "PanelKind::is_untagged")]
    pub kind: PanelKind,

    /// Title shown in the panel header
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,

    /// Datasource name; `None` means the default datasource
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub datasource: Option<String>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub(crate) targets: Vec<Query>,

    /// Template variable this panel repeats over
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub repeat: Option<String>,

    #[serde(rename = "repeatIteration", default, skip_serializing_if = "Option::is_none")]
    pub(crate) repeat_iteration: Option<Value>,

    #[serde(rename = "repeatPanelId", default, skip_serializing_if = "Option::is_none")]
    pub(crate) repeat_panel_id: Option<PanelId>,

    #[serde(
        rename = "scopedVars",
        default,
        deserialize_with = "lenient::opt_map",
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) scoped_vars: Option<Map<String, Value>>,

    /// Kind-specific options (legend, grid, y_formats, ...)
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl Panel {
    /// New, unplaced panel of `kind` spanning a full row
    #[must_use]
    pub fn new(kind: PanelKind) -> Self {
        Self {
            id: PanelId::UNASSIGNED,
            span: Span::FULL,
            kind,
            title: String::new(),
            datasource: None,
            targets: Vec::new(),
            repeat: None,
            repeat_iteration: None,
            repeat_panel_id: None,
            scoped_vars: None,
            options: Map::new(),
        }
    }

    /// With span
    #[inline]
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// With datasource
    #[inline]
    #[must_use]
    pub fn with_datasource(mut self, datasource: impl Into<String>) -> Self {
        self.datasource = Some(datasource.into());
        self
    }

    /// With a kind-specific option
    #[inline]
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Repeat this panel for each value of a template variable
    #[inline]
    #[must_use]
    pub fn with_repeat(mut self, variable: impl Into<String>) -> Self {
        self.repeat = Some(variable.into());
        self
    }

    /// Bind repeat state as set by the repeat expansion of `source`
    #[must_use]
    pub fn with_repeat_binding(
        mut self,
        source: PanelId,
        iteration: Value,
        scoped_vars: Map<String, Value>,
    ) -> Self {
        self.repeat_panel_id = Some(source);
        self.repeat_iteration = Some(iteration);
        self.scoped_vars = Some(scoped_vars);
        self
    }

    /// Panel id; [`PanelId::UNASSIGNED`] until added to a dashboard
    #[inline]
    #[must_use]
    pub fn id(&self) -> PanelId {
        self.id
    }

    /// Panel this one was repeated from
    #[inline]
    #[must_use]
    pub fn repeat_panel_id(&self) -> Option<PanelId> {
        self.repeat_panel_id
    }

    /// Template variable values scoped to this panel
    #[inline]
    #[must_use]
    pub fn scoped_vars(&self) -> Option<&Map<String, Value>> {
        self.scoped_vars.as_ref()
    }

    /// Last computed repeat iteration
    #[inline]
    #[must_use]
    pub fn repeat_iteration(&self) -> Option<&Value> {
        self.repeat_iteration.as_ref()
    }

    /// Queries in display order
    #[inline]
    #[must_use]
    pub fn queries(&self) -> &[Query] {
        &self.targets
    }

    /// Query by reference letter
    #[must_use]
    pub fn query(&self, ref_id: &RefId) -> Option<&Query> {
        self.targets.iter().find(|q| q.ref_id.as_ref() == Some(ref_id))
    }

    /// Mutable query by reference letter
    pub fn query_mut(&mut self, ref_id: &RefId) -> Option<&mut Query> {
        self.targets
            .iter_mut()
            .find(|q| q.ref_id.as_ref() == Some(ref_id))
    }

    /// First letter in `A..=Z` no query on this panel uses
    ///
    /// # Errors
    /// [`ModelError::QueryLettersExhausted`] once all 26 letters are taken.
    pub fn next_query_letter(&self) -> Result<RefId, ModelError> {
        let held = self
            .targets
            .iter()
            .filter_map(|q| q.ref_id.as_ref().map(RefId::as_str));
        first_unused_letter(held)
            .map(RefId::from_letter)
            .ok_or(ModelError::QueryLettersExhausted { panel: self.id })
    }

    /// Append an empty query under the next free letter
    ///
    /// # Errors
    /// Fails when the panel kind takes no queries or letters are exhausted.
    pub fn add_data_query(&mut self, datasource: Option<&str>) -> Result<RefId, ModelError> {
        if !self.kind.accepts_queries() {
            return Err(ModelError::QueriesNotSupported {
                kind: self.kind.clone(),
            });
        }
        let ref_id = self.next_query_letter()?;
        let mut query = Query::new(ref_id.clone());
        query.datasource = datasource.map(str::to_string);
        self.targets.push(query);
        Ok(ref_id)
    }

    /// Append a copy of the query `ref_id` under the next free letter
    ///
    /// # Errors
    /// Fails when no such query exists or letters are exhausted.
    pub fn duplicate_data_query(&mut self, ref_id: &RefId) -> Result<RefId, ModelError> {
        let source = self.query(ref_id).ok_or_else(|| ModelError::QueryNotFound {
            panel: self.id,
            ref_id: ref_id.clone(),
        })?;
        let next = self.next_query_letter()?;
        let copy = source.duplicate(next.clone());
        self.targets.push(copy);
        Ok(next)
    }

    /// Remove the query `ref_id`
    ///
    /// # Errors
    /// [`ModelError::QueryNotFound`] if the panel holds no such query.
    pub fn remove_data_query(&mut self, ref_id: &RefId) -> Result<Query, ModelError> {
        let index = self
            .targets
            .iter()
            .position(|q| q.ref_id.as_ref() == Some(ref_id))
            .ok_or_else(|| ModelError::QueryNotFound {
                panel: self.id,
                ref_id: ref_id.clone(),
            })?;
        Ok(self.targets.remove(index))
    }

    /// Move the query at `from` to position `to`, keeping the others in order
    ///
    /// # Errors
    /// [`ModelError::QueryIndexOutOfRange`] if either index is outside the list.
    pub fn move_data_query(&mut self, from: usize, to: usize) -> Result<(), ModelError> {
        let len = self.targets.len();
        for index in [from, to] {
            if index >= len {
                return Err(ModelError::QueryIndexOutOfRange { index, len });
            }
        }
        let query = self.targets.remove(from);
        self.targets.insert(to, query);
        Ok(())
    }

    /// Check query results against this panel's series contract
    ///
    /// # Errors
    /// See [`PanelKind::check_series`].
    pub fn check_series(&self, series: &[Value]) -> Result<(), ModelError> {
        self.kind.check_series(series).map_err(|err| {
            tracing::debug!(panel = %self.id, error = %err, "series contract violated");
            err
        })
    }

    /// Copy for a new placement: fresh id, no repeat binding
    pub(crate) fn duplicate(&self, id: PanelId) -> Self {
        Self {
            id,
            span: self.span,
            kind: self.kind.clone(),
            title: self.title.clone(),
            datasource: self.datasource.clone(),
            targets: self.targets.clone(),
            repeat: None,
            repeat_iteration: None,
            repeat_panel_id: None,
            scoped_vars: None,
            options: self.options.clone(),
        }
    }

    /// Copy for persistence; every field is kept
    pub(crate) fn persistable_copy(&self) -> Self {
        Self {
            id: self.id,
            span: self.span,
            kind: self.kind.clone(),
            title: self.title.clone(),
            datasource: self.datasource.clone(),
            targets: self.targets.clone(),
            repeat: self.repeat.clone(),
            repeat_iteration: self.repeat_iteration.clone(),
            repeat_panel_id: self.repeat_panel_id,
            scoped_vars: self.scoped_vars.clone(),
            options: self.options.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph() -> Panel {
        Panel::new(PanelKind::Graph)
    }

    fn letters(panel: &Panel) -> Vec<&str> {
        panel
            .queries()
            .iter()
            .filter_map(|q| q.ref_id().map(RefId::as_str))
            .collect()
    }

    #[test]
    fn first_query_is_a_then_b() {
        let mut panel = graph();
        assert_eq!(panel.add_data_query(None).unwrap().as_str(), "A");
        assert_eq!(panel.add_data_query(Some("influx")).unwrap().as_str(), "B");
        assert_eq!(panel.queries()[1].datasource.as_deref(), Some("influx"));
        assert_eq!(panel.queries()[0].datasource, None);
    }

    #[test]
    fn seeded_a_yields_b() {
        let mut panel: Panel =
            serde_json::from_value(json!({"type": "graph", "targets": [{"refId": "A"}]})).unwrap();
        assert_eq!(panel.next_query_letter().unwrap().as_str(), "B");
        panel.add_data_query(None).unwrap();
        assert_eq!(letters(&panel), vec!["A", "B"]);
    }

    #[test]
    fn duplicate_query_is_independent() {
        let mut panel = graph();
        let a = panel.add_data_query(None).unwrap();
        panel.query_mut(&a).unwrap().params.insert("target".into(), json!("cpu"));

        let b = panel.duplicate_data_query(&a).unwrap();
        assert_eq!(b.as_str(), "B");
        assert_eq!(panel.query(&b).unwrap().params["target"], json!("cpu"));

        panel.query_mut(&b).unwrap().params.insert("target".into(), json!("mem"));
        assert_eq!(panel.query(&a).unwrap().params["target"], json!("cpu"));
    }

    #[test]
    fn removed_letter_is_reused() {
        let mut panel = graph();
        for _ in 0..3 {
            panel.add_data_query(None).unwrap();
        }
        let removed = panel.remove_data_query(&RefId::from("B")).unwrap();
        assert_eq!(removed.ref_id().map(RefId::as_str), Some("B"));
        assert_eq!(panel.add_data_query(None).unwrap().as_str(), "B");
        assert_eq!(letters(&panel), vec!["A", "C", "B"]);
    }

    #[test]
    fn remove_unknown_query_fails() {
        let mut panel = graph();
        let err = panel.remove_data_query(&RefId::from("Q")).unwrap_err();
        assert!(err.is_lookup_failure());
    }

    #[test]
    fn move_keeps_relative_order() {
        let mut panel = graph();
        for _ in 0..4 {
            panel.add_data_query(None).unwrap();
        }
        panel.move_data_query(0, 2).unwrap();
        assert_eq!(letters(&panel), vec!["B", "C", "A", "D"]);
        panel.move_data_query(3, 0).unwrap();
        assert_eq!(letters(&panel), vec!["D", "B", "C", "A"]);
        assert!(matches!(
            panel.move_data_query(0, 4),
            Err(ModelError::QueryIndexOutOfRange { index: 4, len: 4 })
        ));
    }

    #[test]
    fn letters_exhaust_after_26() {
        let mut panel = graph();
        for _ in 0..26 {
            panel.add_data_query(None).unwrap();
        }
        assert!(matches!(
            panel.add_data_query(None),
            Err(ModelError::QueryLettersExhausted { .. })
        ));
        assert_eq!(panel.queries().len(), 26);
    }

    #[test]
    fn text_panel_rejects_queries() {
        let mut panel = Panel::new(PanelKind::Text);
        assert!(matches!(
            panel.add_data_query(None),
            Err(ModelError::QueriesNotSupported { kind: PanelKind::Text })
        ));
    }

    #[test]
    fn duplicate_drops_repeat_binding() {
        let mut vars = Map::new();
        vars.insert("host".into(), json!({"value": "web-1"}));
        let panel = graph()
            .with_repeat("host")
            .with_repeat_binding(PanelId(3), json!(1_700_000_000), vars)
            .with_option("legend", json!({"show": true}));

        let copy = panel.duplicate(PanelId(11));
        assert_eq!(copy.id(), PanelId(11));
        assert!(copy.repeat.is_none());
        assert!(copy.repeat_panel_id().is_none());
        assert!(copy.repeat_iteration().is_none());
        assert!(copy.scoped_vars().is_none());
        assert_eq!(copy.options["legend"], json!({"show": true}));

        let value = serde_json::to_value(&copy).unwrap();
        for key in ["repeat", "repeatIteration", "repeatPanelId", "scopedVars"] {
            assert!(value.get(key).is_none(), "{key} leaked into duplicate");
        }
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let raw = json!({
            "id": 2, "span": 6, "type": "graph", "title": "CPU",
            "legend": {"show": true}, "lines": true,
            "targets": [{"refId": "A", "target": "cpu.*"}]
        });
        let panel: Panel = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(panel.id(), PanelId(2));
        assert_eq!(panel.span.get(), 6);
        assert_eq!(serde_json::to_value(&panel).unwrap(), raw);
    }
}
