//! Human and JSON summaries of a loaded dashboard

use std::fmt::Write;

use dash_model::{Dashboard, Violation};
use serde::Serialize;

/// Layout summary printed by `inspect`
#[derive(Debug, Serialize)]
pub(crate) struct Summary {
    title: String,
    schema_version: u32,
    migrated_from: Option<u32>,
    steps_applied: Vec<&'static str>,
    next_panel_id: u64,
    can_edit: bool,
    rows: Vec<RowSummary>,
}

#[derive(Debug, Serialize)]
struct RowSummary {
    title: String,
    span: u32,
    panels: Vec<PanelSummary>,
}

#[derive(Debug, Serialize)]
struct PanelSummary {
    id: u64,
    kind: String,
    span: u8,
    title: String,
    queries: Vec<String>,
}

impl Summary {
    pub(crate) fn of(dashboard: &Dashboard) -> Self {
        let migration = dashboard.migration().filter(|report| !report.is_noop());
        let rows = dashboard
            .rows()
            .iter()
            .map(|row| RowSummary {
                title: row.title.clone(),
                span: row.span(),
                panels: row
                    .panels()
                    .iter()
                    .map(|panel| PanelSummary {
                        id: panel.id().0,
                        kind: panel.kind.as_str().to_string(),
                        span: panel.span.get(),
                        title: panel.title.clone(),
                        queries: panel
                            .queries()
                            .iter()
                            .map(|q| q.ref_id().map_or_else(|| "?".to_string(), ToString::to_string))
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            title: dashboard.title().to_string(),
            schema_version: dashboard.schema_version(),
            migrated_from: migration.map(|report| report.from),
            steps_applied: migration.map(|report| report.steps_applied.clone()).unwrap_or_default(),
            next_panel_id: dashboard.next_panel_id().0,
            can_edit: dashboard.meta().can_edit,
            rows,
        }
    }

    pub(crate) fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Dashboard: {}", self.title);
        let _ = writeln!(out, "Schema version: {}", self.schema_version);
        if let Some(from) = self.migrated_from {
            let _ = writeln!(out, "Migrated from: {from} ({})", self.steps_applied.join(", "));
        }
        let _ = writeln!(out, "Next panel id: {}", self.next_panel_id);
        let _ = writeln!(out, "Editable: {}", self.can_edit);

        for (index, row) in self.rows.iter().enumerate() {
            let _ = writeln!(out);
            let title = if row.title.is_empty() { "(untitled)" } else { &row.title };
            let _ = writeln!(out, "Row {index}: {title} [span {}/12]", row.span);
            for panel in &row.panels {
                let kind = if panel.kind.is_empty() { "?" } else { &panel.kind };
                let _ = write!(out, "  #{} {kind} span={}", panel.id, panel.span);
                if !panel.title.is_empty() {
                    let _ = write!(out, " \"{}\"", panel.title);
                }
                if !panel.queries.is_empty() {
                    let _ = write!(out, " queries={}", panel.queries.join(","));
                }
                let _ = writeln!(out);
            }
        }
        out
    }
}

/// One line per violation, for `check`
pub(crate) fn render_violations(violations: &[Violation]) -> String {
    let mut out = String::new();
    for violation in violations {
        let line = match violation {
            Violation::UnassignedPanelId { row, index } => {
                format!("row {row} panel {index}: no panel id")
            }
            Violation::DuplicatePanelId { id } => format!("panel id {id} used more than once"),
            Violation::MissingRefId { panel, index } => {
                format!("panel {panel} query {index}: no refId")
            }
            Violation::DuplicateRefId { panel, ref_id } => {
                format!("panel {panel}: refId {ref_id} used more than once")
            }
            Violation::RowOverflow { row, span } => {
                format!("row {row}: spans add up to {span}, more than 12")
            }
        };
        let _ = writeln!(out, "{line}");
    }
    out
}
