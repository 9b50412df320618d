//! Panel-level rewrite rules
//!
//! Queued by their steps and applied to every panel after the document
//! rules of the same pass.

use serde_json::{json, Map, Value};

use crate::ref_id::{first_unused_letter, held_letters};
use crate::step::MigrationContext;

const DEFAULT_Y_FORMAT: &str = "short";
const DEFAULT_SELECT_FUNCTION: &str = "mean";

/// Largest panel id read from a document (`u32::MAX`)
///
/// Larger ids count as missing and are reassigned, so `max + 1` never
/// overflows.
pub const MAX_PANEL_ID: u64 = 0xFFFF_FFFF;

/// Positive integer panel id, if the value holds one
///
/// Ids written by older tooling sometimes arrive as integral floats. Ids
/// above [`MAX_PANEL_ID`] are rejected.
#[must_use]
pub fn panel_id_of(value: &Value) -> Option<u64> {
    let Value::Number(n) = value else {
        return None;
    };
    let id = n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= f64::from(u32::MAX))
            .map(|f| f as u64)
    });
    id.filter(|id| (1..=MAX_PANEL_ID).contains(id))
}

/// Rename `graphite` panels and normalize graph legend, grid and y formats
pub(crate) fn upgrade_graph_panel(panel: &mut Map<String, Value>, _ctx: &mut MigrationContext) {
    if panel.get("type").and_then(Value::as_str) == Some("graphite") {
        panel.insert("type".to_string(), Value::from("graph"));
    }
    if panel.get("type").and_then(Value::as_str) != Some("graph") {
        return;
    }

    if let Some(show) = panel.get("legend").and_then(Value::as_bool) {
        panel.insert("legend".to_string(), json!({ "show": show }));
    }

    if let Some(grid) = panel.get_mut("grid").and_then(Value::as_object_mut) {
        rename_present(grid, "min", "leftMin");
        rename_present(grid, "max", "leftMax");
    }

    for (legacy, axis) in [("y_format", 0), ("y2_format", 1)] {
        let Some(format) = panel.remove(legacy) else {
            continue;
        };
        if format.is_null() {
            continue;
        }
        let formats = panel
            .entry("y_formats")
            .or_insert_with(|| json!([DEFAULT_Y_FORMAT, DEFAULT_Y_FORMAT]));
        match formats.as_array_mut() {
            Some(formats) => {
                while formats.len() <= axis {
                    formats.push(Value::from(DEFAULT_Y_FORMAT));
                }
                formats[axis] = format;
            }
            None => tracing::debug!(legacy, "y_formats is not a list, dropping legacy format"),
        }
    }
}

/// Give panels without a positive id the next id from the shared counter
pub(crate) fn assign_panel_id(panel: &mut Map<String, Value>, ctx: &mut MigrationContext) {
    if panel.get("id").and_then(panel_id_of).is_some() {
        return;
    }
    let id = ctx.take_panel_id();
    tracing::debug!(id, "assigned panel id");
    panel.insert("id".to_string(), Value::from(id));
}

/// `aliasYAxis: {alias: axis}` → one `seriesOverrides` entry per alias
pub(crate) fn alias_y_axis_to_overrides(panel: &mut Map<String, Value>, _ctx: &mut MigrationContext) {
    if panel.get("type").and_then(Value::as_str) != Some("graph") {
        return;
    }
    let Some(aliases) = panel.remove("aliasYAxis") else {
        return;
    };
    let Value::Object(aliases) = aliases else {
        tracing::debug!("aliasYAxis is not a map, dropping it");
        return;
    };
    if aliases.is_empty() {
        return;
    }

    let overrides = panel
        .entry("seriesOverrides")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !overrides.is_array() {
        *overrides = Value::Array(Vec::new());
    }
    if let Some(overrides) = overrides.as_array_mut() {
        for (alias, yaxis) in aliases {
            overrides.push(json!({ "alias": alias, "yaxis": yaxis }));
        }
    }
}

/// Give every target without a `refId` the first unused letter
pub(crate) fn assign_ref_ids(panel: &mut Map<String, Value>, _ctx: &mut MigrationContext) {
    let Some(targets) = panel.get_mut("targets").and_then(Value::as_array_mut) else {
        return;
    };

    for index in 0..targets.len() {
        if has_ref_id(&targets[index]) {
            continue;
        }
        let Some(letter) = first_unused_letter(held_letters(targets)) else {
            tracing::warn!(index, "all query reference letters in use, leaving target without refId");
            continue;
        };
        if let Some(target) = targets[index].as_object_mut() {
            target.insert("refId".to_string(), Value::from(letter.to_string()));
        }
    }
}

/// Rewrite `fields`/`tags`/`groupBy` queries into the `select` form
pub(crate) fn convert_influx_select(panel: &mut Map<String, Value>, _ctx: &mut MigrationContext) {
    let Some(targets) = panel.get_mut("targets").and_then(Value::as_array_mut) else {
        return;
    };

    for target in targets.iter_mut().filter_map(Value::as_object_mut) {
        if !is_legacy_influx(target) {
            continue;
        }

        if target.get("rawQuery").is_some_and(is_truthy) {
            target.remove("fields");
            target.remove("fill");
            continue;
        }

        if let Some(Value::Array(fields)) = target.remove("fields") {
            let select: Vec<Value> = fields.iter().map(select_parts).collect();
            target.insert("select".to_string(), Value::Array(select));
        }

        let fill = target.remove("fill").filter(is_truthy);
        if let Some(group_by) = target.get_mut("groupBy").and_then(Value::as_array_mut) {
            for part in group_by.iter_mut().filter_map(Value::as_object_mut) {
                normalize_group_by(part);
            }
            if let Some(fill) = fill {
                group_by.push(json!({ "type": "fill", "params": [fill] }));
            }
        }
    }
}

fn is_legacy_influx(target: &Map<String, Value>) -> bool {
    ["fields", "tags", "groupBy"]
        .iter()
        .all(|key| target.get(*key).is_some_and(|v| !v.is_null()))
}

/// `{name, func, mathExpr, asExpr}` → ordered part list
fn select_parts(field: &Value) -> Value {
    let name = field.get("name").cloned().unwrap_or(Value::Null);
    let func = field
        .get("func")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_SELECT_FUNCTION);

    let mut parts = vec![
        json!({ "type": "field", "params": [name] }),
        json!({ "type": func, "params": [] }),
    ];
    if let Some(math) = field.get("mathExpr").filter(|v| is_truthy(v)) {
        parts.push(json!({ "type": "math", "params": [math] }));
    }
    if let Some(alias) = field.get("asExpr").filter(|v| is_truthy(v)) {
        parts.push(json!({ "type": "alias", "params": [alias] }));
    }
    Value::Array(parts)
}

fn normalize_group_by(part: &mut Map<String, Value>) {
    let legacy_key = match part.get("type").and_then(Value::as_str) {
        Some("time") => "interval",
        Some("tag") => "key",
        _ => return,
    };
    if let Some(param) = part.remove(legacy_key) {
        if is_truthy(&param) {
            part.insert("params".to_string(), Value::Array(vec![param]));
        }
    }
}

fn rename_present(map: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = map.remove(from) {
        if !value.is_null() {
            map.insert(to.to_string(), value);
        }
    }
}

fn has_ref_id(target: &Value) -> bool {
    target
        .get("refId")
        .and_then(Value::as_str)
        .is_some_and(|r| !r.is_empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
