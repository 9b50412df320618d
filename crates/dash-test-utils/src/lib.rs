//! Testing utilities for the dashboard workspace
//!
//! Shared fixtures: legacy documents at various schema versions and small
//! dashboard builders.

#![allow(missing_docs)]

use dash_model::{Dashboard, MetaOverrides, Panel, PanelKind, Span};
use serde_json::{json, Value};

/// Version-0 document using the `services.filter` block
pub fn services_filter_document() -> Value {
    json!({
        "services": {
            "filter": {
                "time": {"from": "now-1d", "to": "now"},
                "list": [{}]
            }
        }
    })
}

/// Version-0 document touching every migration step
pub fn legacy_document() -> Value {
    json!({
        "title": "Legacy ops",
        "services": {"filter": {"time": {"from": "now-12h", "to": "now"}, "list": [{"name": "host", "type": "filter"}]}},
        "pulldowns": [
            {"type": "filtering"},
            {"type": "annotations", "annotations": [{"name": "deploys", "enable": true}]}
        ],
        "nav": [{"type": "timepicker", "time_options": ["5m", "1h"]}],
        "rows": [
            {"title": "top", "panels": [
                {"type": "graphite", "span": 8, "legend": true,
                 "grid": {"min": 0, "max": 100},
                 "y_format": "bytes", "y2_format": "ms",
                 "aliasYAxis": {"latency": 2},
                 "targets": [{"target": "web.*.requests"}, {"target": "web.*.errors"}]},
                {"id": 3, "type": "text", "span": 4, "content": "hello"}
            ]},
            {"title": "influx", "panels": [
                {"type": "graph", "span": 12, "targets": [
                    legacy_influx_target(false),
                    legacy_influx_target(true)
                ]}
            ]}
        ]
    })
}

/// Influx query in the pre-`select` shape
pub fn legacy_influx_target(raw: bool) -> Value {
    json!({
        "measurement": "cpu",
        "rawQuery": raw,
        "query": "SELECT mean(value) FROM cpu",
        "fields": [
            {"name": "value", "func": "mean", "mathExpr": "/100", "asExpr": "pct"},
            {"name": "idle", "func": "max"}
        ],
        "tags": [{"key": "host", "value": "web-1"}],
        "groupBy": [{"type": "time", "interval": "auto"}, {"type": "tag", "key": "dc"}],
        "fill": "null"
    })
}

/// Current-version document with one row of the given panel spans
///
/// Panels get ids `1..=n`.
pub fn row_document(spans: &[u8]) -> Value {
    let panels: Vec<Value> = spans
        .iter()
        .enumerate()
        .map(|(i, span)| json!({"id": i + 1, "type": "graph", "span": span}))
        .collect();
    json!({
        "title": "Fixture",
        "schemaVersion": dash_model::CURRENT_SCHEMA_VERSION,
        "rows": [{"title": "main", "panels": panels}]
    })
}

/// Dashboard with one row of the given panel spans
pub fn dashboard_with_row(spans: &[u8]) -> Dashboard {
    Dashboard::new(row_document(spans), MetaOverrides::new()).unwrap()
}

/// Unplaced graph panel
pub fn graph_panel(span: u8) -> Panel {
    Panel::new(PanelKind::Graph).with_span(Span::new(span).unwrap())
}

/// Unplaced graph panel with a title and datasource
pub fn titled_graph_panel(title: &str, datasource: &str, span: u8) -> Panel {
    graph_panel(span).with_title(title).with_datasource(datasource)
}

/// Spans of a row, in order
pub fn row_spans(dashboard: &Dashboard, row: usize) -> Vec<u8> {
    dashboard.rows()[row]
        .panels()
        .iter()
        .map(|p| p.span.get())
        .collect()
}
