//! Document-level relocation rules
//!
//! Each rule moves a legacy top-level block into its current home. The old
//! field is removed only after the new one is populated; an absent or
//! wrong-shaped legacy field means there is nothing to do.

use serde_json::{Map, Value};

/// `services.filter.{time,list}` → `time`, `templating.list`
pub(crate) fn fold_services(doc: &mut Map<String, Value>) {
    let filter = doc
        .get("services")
        .and_then(|s| s.get("filter"))
        .and_then(Value::as_object)
        .cloned();

    if let Some(filter) = filter {
        if let Some(time) = filter.get("time").filter(|t| t.is_object()) {
            doc.insert("time".to_string(), time.clone());
        }
        let list = filter
            .get("list")
            .filter(|l| l.is_array())
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        match list_holder(doc, "templating") {
            Some(templating) => {
                templating.insert("list".to_string(), list);
            }
            None => tracing::debug!("templating is not an object, dropping legacy filter list"),
        }
    }

    doc.remove("services");
}

/// Annotations pulldown → `annotations.list`
pub(crate) fn fold_pulldowns(doc: &mut Map<String, Value>) {
    let annotations = doc
        .get("pulldowns")
        .and_then(Value::as_array)
        .and_then(|pulldowns| {
            pulldowns
                .iter()
                .find(|p| p.get("type").and_then(Value::as_str) == Some("annotations"))
        })
        .map(|entry| {
            entry
                .get("annotations")
                .filter(|a| a.is_array())
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new()))
        });

    if let Some(list) = annotations {
        let mut holder = Map::new();
        holder.insert("list".to_string(), list);
        doc.insert("annotations".to_string(), Value::Object(holder));
    }

    doc.remove("pulldowns");
}

/// Fill in `datasource`, `type` and `allFormat` on template variables
pub(crate) fn default_template_variables(doc: &mut Map<String, Value>) {
    let Some(list) = doc
        .get_mut("templating")
        .and_then(|t| t.get_mut("list"))
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    for variable in list.iter_mut().filter_map(Value::as_object_mut) {
        variable
            .entry("datasource")
            .or_insert(Value::Null);

        let kind = variable.get("type").and_then(Value::as_str);
        if matches!(kind, None | Some("filter")) {
            variable.insert("type".to_string(), Value::from("query"));
        }

        variable
            .entry("allFormat")
            .or_insert_with(|| Value::from("glob"));
    }
}

/// `nav[0]` → `timepicker`
pub(crate) fn fold_nav(doc: &mut Map<String, Value>) {
    let Some(nav) = doc.get("nav").and_then(Value::as_array) else {
        return;
    };

    if let Some(first) = nav.first().cloned() {
        doc.insert("timepicker".to_string(), first);
    }
    doc.remove("nav");
}

/// `{ list: [] }` holder at `key`, created when absent
///
/// Returns `None` when the key holds something other than an object.
fn list_holder<'a>(doc: &'a mut Map<String, Value>, key: &str) -> Option<&'a mut Map<String, Value>> {
    let holder = doc
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()?;
    holder
        .entry("list")
        .or_insert_with(|| Value::Array(Vec::new()));
    Some(holder)
}
