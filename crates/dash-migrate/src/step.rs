//! Ordered migration steps
//!
//! Every schema change is one [`MigrationStep`] gated on the version that
//! introduced it. Steps run in table order; a step applies when the
//! document's recorded version is below the step's version.

use serde_json::{Map, Value};

use crate::document;
use crate::panel;

/// Rule applied once to the document root
pub type DocumentRule = fn(&mut Map<String, Value>);

/// Rule applied to every panel of every row
pub type PanelRule = fn(&mut Map<String, Value>, &mut MigrationContext);

/// One version-gated schema change
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    /// Schema version that introduced this change
    pub version: u32,
    /// Stable identifier, used in logs and reports
    pub id: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Document-level relocation, run immediately
    pub document: Option<DocumentRule>,
    /// Panel-level rewrite, queued until all document rules ran
    pub panel: Option<PanelRule>,
}

impl MigrationStep {
    /// Whether a document recorded at `from` still needs this step
    #[inline]
    #[must_use]
    pub fn applies_to(&self, from: u32) -> bool {
        from < self.version
    }
}

/// State shared by all panel rules within one migration pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationContext {
    next_panel_id: u64,
}

impl MigrationContext {
    /// Context whose id counter starts at `next_panel_id`
    #[inline]
    #[must_use]
    pub fn new(next_panel_id: u64) -> Self {
        Self { next_panel_id }
    }

    /// Context seeded from the highest panel id present before migration
    #[must_use]
    pub fn for_document(doc: &Map<String, Value>) -> Self {
        let max = panels(doc)
            .filter_map(|p| p.get("id").and_then(panel::panel_id_of))
            .max()
            .unwrap_or(0);
        Self::new(max.saturating_add(1))
    }

    /// Hand out the next panel id and advance the counter
    #[inline]
    pub fn take_panel_id(&mut self) -> u64 {
        let id = self.next_panel_id;
        self.next_panel_id = self.next_panel_id.saturating_add(1);
        id
    }

    /// Id the next call to [`take_panel_id`](Self::take_panel_id) returns
    #[inline]
    #[must_use]
    pub fn peek_panel_id(&self) -> u64 {
        self.next_panel_id
    }
}

fn panels(doc: &Map<String, Value>) -> impl Iterator<Item = &Value> {
    doc.get("rows")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|row| row.get("panels").and_then(Value::as_array))
        .flatten()
}

/// All schema steps in version order
#[must_use]
pub fn all_steps() -> &'static [MigrationStep] {
    &STEPS
}

static STEPS: [MigrationStep; 7] = [
    MigrationStep {
        version: 2,
        id: "services.filter.v002",
        description: "Fold services.filter time and variables into time and templating",
        document: Some(document::fold_services),
        panel: Some(panel::upgrade_graph_panel),
    },
    MigrationStep {
        version: 3,
        id: "panel.ids.v003",
        description: "Assign ids to panels without one",
        document: None,
        panel: Some(panel::assign_panel_id),
    },
    MigrationStep {
        version: 4,
        id: "graph.alias_yaxis.v004",
        description: "Move aliasYAxis entries into seriesOverrides",
        document: None,
        panel: Some(panel::alias_y_axis_to_overrides),
    },
    MigrationStep {
        version: 6,
        id: "annotations.pulldowns.v006",
        description: "Move the annotations pulldown into annotations.list",
        document: Some(document::fold_pulldowns),
        panel: None,
    },
    MigrationStep {
        version: 6,
        id: "templating.defaults.v006",
        description: "Default datasource, type and allFormat on template variables",
        document: Some(document::default_template_variables),
        panel: None,
    },
    MigrationStep {
        version: 7,
        id: "timepicker.nav.v007",
        description: "Fold nav[0] into timepicker and assign query refIds",
        document: Some(document::fold_nav),
        panel: Some(panel::assign_ref_ids),
    },
    MigrationStep {
        version: 8,
        id: "influxdb.select.v008",
        description: "Rewrite fields/tags/groupBy queries into select part lists",
        document: None,
        panel: Some(panel::convert_influx_select),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn steps_are_version_ordered() {
        let versions: Vec<u32> = all_steps().iter().map(|s| s.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        assert_eq!(versions, sorted);
    }

    #[test]
    fn step_ids_are_unique() {
        let mut ids: Vec<&str> = all_steps().iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), all_steps().len());
    }

    #[test]
    fn gating_is_strictly_less_than() {
        let step = &all_steps()[1];
        assert!(step.applies_to(2));
        assert!(!step.applies_to(3));
    }

    #[test]
    fn context_starts_after_max_id() {
        let doc = json!({
            "rows": [
                {"panels": [{"id": 5}, {"id": 2}]},
                {"panels": [{}]},
            ]
        });
        let mut ctx = MigrationContext::for_document(doc.as_object().unwrap());
        assert_eq!(ctx.take_panel_id(), 6);
        assert_eq!(ctx.take_panel_id(), 7);
        assert_eq!(ctx.peek_panel_id(), 8);
    }

    #[test]
    fn context_ignores_ids_above_cap() {
        let doc = json!({"rows": [{"panels": [{"id": u64::MAX}, {"id": 3}]}]});
        let ctx = MigrationContext::for_document(doc.as_object().unwrap());
        assert_eq!(ctx.peek_panel_id(), 4);
    }

    #[test]
    fn context_on_empty_document_starts_at_one() {
        let ctx = MigrationContext::for_document(&Map::new());
        assert_eq!(ctx.peek_panel_id(), 1);
    }
}
