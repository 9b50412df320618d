//! Structural invariant checks
//!
//! Reports, without fixing, every place where a dashboard breaks one of its
//! identity or layout rules.

use std::collections::HashSet;

use serde::Serialize;

use crate::document::DashboardDocument;
use crate::types::{PanelId, RefId, Span};

/// One broken invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Panel has no positive id
    UnassignedPanelId { row: usize, index: usize },
    /// Two panels share an id
    DuplicatePanelId { id: PanelId },
    /// A query has no reference letter
    MissingRefId { panel: PanelId, index: usize },
    /// Two queries of one panel share a reference letter
    DuplicateRefId { panel: PanelId, ref_id: RefId },
    /// Panel spans in a row add up to more than the grid width
    RowOverflow { row: usize, span: u32 },
}

/// Every invariant violation in `document`, in row-major order
#[must_use]
pub fn violations(document: &DashboardDocument) -> Vec<Violation> {
    let mut found = Vec::new();
    let mut seen_ids = HashSet::new();

    for (row_index, row) in document.rows().iter().enumerate() {
        for (index, panel) in row.panels().iter().enumerate() {
            let id = panel.id();
            if !id.is_assigned() {
                found.push(Violation::UnassignedPanelId { row: row_index, index });
            } else if !seen_ids.insert(id) {
                found.push(Violation::DuplicatePanelId { id });
            }

            let mut seen_refs = HashSet::new();
            for (query_index, query) in panel.queries().iter().enumerate() {
                match query.ref_id() {
                    None => found.push(Violation::MissingRefId {
                        panel: id,
                        index: query_index,
                    }),
                    Some(ref_id) if !seen_refs.insert(ref_id) => {
                        found.push(Violation::DuplicateRefId {
                            panel: id,
                            ref_id: ref_id.clone(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        let span = row.span();
        if span > u32::from(Span::GRID_WIDTH) {
            found.push(Violation::RowOverflow { row: row_index, span });
        }
    }
    found
}
