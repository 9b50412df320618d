//! Migration driver
//!
//! Runs the step table against one raw document: document rules first, in
//! version order, then every queued panel rule over every panel.

use serde_json::{Map, Value};

use crate::step::{all_steps, MigrationContext, MigrationStep, PanelRule};
use crate::CURRENT_SCHEMA_VERSION;

/// Outcome of one migration pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Schema version recorded before migration
    pub from: u32,
    /// Schema version recorded after migration
    pub to: u32,
    /// Ids of the steps that ran, in order
    pub steps_applied: Vec<&'static str>,
    /// Panels the queued panel rules were applied to
    pub panels_visited: usize,
}

impl MigrationReport {
    fn unchanged(version: u32) -> Self {
        Self {
            from: version,
            to: version,
            steps_applied: Vec::new(),
            panels_visited: 0,
        }
    }

    /// Whether the pass left the document untouched
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.steps_applied.is_empty() && self.from == self.to
    }
}

/// Applies version-gated steps up to a target schema version
#[derive(Debug, Clone)]
pub struct Migrator {
    steps: Vec<MigrationStep>,
    target: u32,
}

impl Migrator {
    /// Migrator for the full step table, targeting the current version
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::up_to(CURRENT_SCHEMA_VERSION)
    }

    /// Migrator that stops at `target`, running only steps at or below it
    #[must_use]
    pub fn up_to(target: u32) -> Self {
        let steps = all_steps()
            .iter()
            .filter(|s| s.version <= target)
            .copied()
            .collect();
        Self { steps, target }
    }

    /// Target schema version
    #[inline]
    #[must_use]
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Steps this migrator may run
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    /// Migrate `document` in place
    ///
    /// Never fails: missing legacy fields mean nothing to migrate, and a
    /// root that is not an object is replaced by an empty document.
    pub fn run(&self, document: &mut Value) -> MigrationReport {
        if !document.is_object() {
            tracing::warn!("dashboard document is not an object, starting from an empty one");
            *document = Value::Object(Map::new());
        }
        let Some(doc) = document.as_object_mut() else {
            return MigrationReport::unchanged(0);
        };

        let from = schema_version(doc);
        if from >= self.target {
            return MigrationReport::unchanged(from);
        }

        let mut ctx = MigrationContext::for_document(doc);
        let mut panel_rules: Vec<PanelRule> = Vec::new();
        let mut steps_applied = Vec::new();

        for step in self.steps.iter().filter(|s| s.applies_to(from)) {
            tracing::debug!(step = step.id, version = step.version, "applying migration step");
            if let Some(rule) = step.document {
                rule(doc);
            }
            if let Some(rule) = step.panel {
                panel_rules.push(rule);
            }
            steps_applied.push(step.id);
        }

        doc.insert("schemaVersion".to_string(), Value::from(self.target));

        let panels_visited = if panel_rules.is_empty() {
            0
        } else {
            apply_panel_rules(doc, &panel_rules, &mut ctx)
        };

        tracing::info!(
            from,
            to = self.target,
            steps = steps_applied.len(),
            panels = panels_visited,
            "migrated dashboard schema"
        );

        MigrationReport {
            from,
            to: self.target,
            steps_applied,
            panels_visited,
        }
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Row-major, then column-major; every rule on a panel before the next panel
fn apply_panel_rules(
    doc: &mut Map<String, Value>,
    rules: &[PanelRule],
    ctx: &mut MigrationContext,
) -> usize {
    let Some(rows) = doc.get_mut("rows").and_then(Value::as_array_mut) else {
        return 0;
    };

    let mut visited = 0;
    for row in rows.iter_mut() {
        let Some(panels) = row.get_mut("panels").and_then(Value::as_array_mut) else {
            continue;
        };
        for panel in panels.iter_mut().filter_map(Value::as_object_mut) {
            for rule in rules {
                rule(panel, ctx);
            }
            visited += 1;
        }
    }
    visited
}

/// Recorded schema version, 0 when absent or unreadable
#[must_use]
pub fn schema_version(doc: &Map<String, Value>) -> u32 {
    let Some(recorded) = doc.get("schemaVersion") else {
        return 0;
    };
    parse_version(recorded).unwrap_or_else(|| {
        tracing::debug!(%recorded, "unreadable schemaVersion, treating as 0");
        0
    })
}

/// Non-negative integral version number
///
/// Accepts integers, integral floats and numeric strings such as `"8"`.
#[must_use]
pub fn parse_version(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }?;
    u32::try_from(n).ok()
}

fn integral(f: f64) -> Option<u64> {
    (f.fract() == 0.0 && f >= 0.0 && f <= f64::from(u32::MAX)).then(|| f as u64)
}

/// Promote a legacy `version` field to `schemaVersion`
///
/// Documents saved before `schemaVersion` existed recorded the schema in
/// `version`. Only applies to documents with no `id` and no `schemaVersion`.
/// Returns whether the document was changed.
pub fn promote_legacy_version(document: &mut Value) -> bool {
    let Some(doc) = document.as_object_mut() else {
        return false;
    };
    let has_id = doc.get("id").is_some_and(|id| !id.is_null());
    if has_id || doc.contains_key("schemaVersion") {
        return false;
    }
    let Some(version) = doc.get("version").and_then(parse_version).filter(|v| *v > 0) else {
        return false;
    };
    tracing::debug!(version, "promoting legacy version to schemaVersion");
    doc.insert("schemaVersion".to_string(), Value::from(version));
    true
}
