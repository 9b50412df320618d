use std::collections::HashSet;

use dash_model::prelude::*;
use dash_model::Violation;
use dash_test_utils::{dashboard_with_row, graph_panel, row_spans, titled_graph_panel};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

#[test]
fn next_panel_id_after_five_is_six() {
    let dash = Dashboard::new(
        json!({"rows": [{"panels": [{"id": 5, "type": "graph"}]}]}),
        MetaOverrides::new(),
    )
    .unwrap();
    assert_eq!(dash.next_panel_id(), PanelId(6));
    assert_eq!(Dashboard::empty(MetaOverrides::new()).next_panel_id(), PanelId(1));
}

#[test]
fn queries_get_consecutive_letters() {
    let mut dash = dashboard_with_row(&[12]);
    let panel = dash.panel_mut(PanelId(1)).unwrap();

    assert_eq!(panel.add_data_query(None).unwrap().as_str(), "A");
    assert_eq!(panel.add_data_query(Some("graphite")).unwrap().as_str(), "B");
    assert_eq!(
        panel.query(&RefId::from("B")).unwrap().datasource.as_deref(),
        Some("graphite")
    );
}

#[test]
fn duplicated_query_takes_next_free_letter() {
    let mut dash = dashboard_with_row(&[12]);
    let panel = dash.panel_mut(PanelId(1)).unwrap();
    let first = panel.add_data_query(None).unwrap();
    panel
        .query_mut(&first)
        .unwrap()
        .params
        .insert("target".into(), json!("cpu.*"));

    let copy = panel.duplicate_data_query(&first).unwrap();
    assert_eq!(copy.as_str(), "B");
    assert_eq!(panel.query(&copy).unwrap().params["target"], json!("cpu.*"));
}

#[test]
fn removed_letter_is_reused() {
    let mut dash = dashboard_with_row(&[12]);
    let panel = dash.panel_mut(PanelId(1)).unwrap();
    for _ in 0..3 {
        panel.add_data_query(None).unwrap();
    }
    panel.remove_data_query(&RefId::from("A")).unwrap();
    assert_eq!(panel.add_data_query(None).unwrap().as_str(), "A");
}

#[test]
fn letters_run_out_after_twenty_six() {
    let mut dash = dashboard_with_row(&[12]);
    let panel = dash.panel_mut(PanelId(1)).unwrap();
    for _ in 0..26 {
        panel.add_data_query(None).unwrap();
    }
    let err = panel.add_data_query(None).unwrap_err();
    assert!(matches!(err, ModelError::QueryLettersExhausted { .. }));
    assert_eq!(panel.queries().len(), 26);
}

#[test]
fn text_panel_takes_no_queries() {
    let mut dash = dashboard_with_row(&[6]);
    let id = dash.add_panel(0, Panel::new(PanelKind::Text).with_span(Span::HALF)).unwrap();
    let err = dash.panel_mut(id).unwrap().add_data_query(None).unwrap_err();
    assert!(matches!(err, ModelError::QueriesNotSupported { kind: PanelKind::Text }));
}

#[test]
fn full_row_splits_in_half() {
    let mut dash = dashboard_with_row(&[12]);
    let id = dash.add_panel(0, graph_panel(4)).unwrap();
    assert_eq!(id, PanelId(2));
    assert_eq!(row_spans(&dash, 0), vec![6, 6]);
}

#[test]
fn added_panel_keeps_title_and_datasource() {
    let mut dash = dashboard_with_row(&[6]);
    let id = dash.add_panel(0, titled_graph_panel("Latency", "graphite", 6)).unwrap();

    let saved = dash.to_save_value().unwrap();
    let panel = &saved["rows"][0]["panels"][1];
    assert_eq!(panel["id"], json!(id.0));
    assert_eq!(panel["title"], json!("Latency"));
    assert_eq!(panel["datasource"], json!("graphite"));
}

#[test]
fn two_panel_row_splits_in_thirds() {
    let mut dash = dashboard_with_row(&[8, 4]);
    dash.add_panel(0, graph_panel(2)).unwrap();
    assert_eq!(row_spans(&dash, 0), vec![4, 4, 4]);
}

#[test]
fn duplicate_of_repeated_panel_is_plain() {
    let mut dash = dashboard_with_row(&[6]);
    let source = Panel::new(PanelKind::Graph)
        .with_span(Span::HALF)
        .with_repeat("host")
        .with_repeat_binding(PanelId(1), json!(1_700_000_000), serde_json::Map::new());
    let repeated = dash.add_panel(0, source).unwrap();

    let copy = dash.duplicate_panel(repeated).unwrap();
    let copy = dash.panel(copy).unwrap();
    assert!(copy.repeat.is_none());
    assert!(copy.repeat_panel_id().is_none());
    assert!(copy.repeat_iteration().is_none());
    assert!(copy.scoped_vars().is_none());
}

#[test]
fn singlestat_requires_one_series() {
    let mut dash = dashboard_with_row(&[6]);
    let id = dash
        .add_panel(0, Panel::new(PanelKind::Singlestat).with_span(Span::HALF))
        .unwrap();
    let panel = dash.panel(id).unwrap();

    assert!(panel.check_series(&[json!({"target": "a"})]).is_ok());
    let err = panel
        .check_series(&[json!({"target": "a"}), json!({"target": "b"})])
        .unwrap_err();
    assert!(err.payload().is_some());
}

#[test]
fn save_model_excludes_metadata() {
    let dash = Dashboard::new(
        json!({"title": "Ops", "rows": [{"panels": [{"id": 1, "type": "graph"}]}]}),
        MetaOverrides::read_only(),
    )
    .unwrap();
    let saved = dash.to_save_value().unwrap();
    assert!(saved.get("meta").is_none());
    assert_eq!(saved["title"], json!("Ops"));
}

#[derive(Debug, Clone)]
enum Edit {
    AddPanel(u8),
    DuplicatePanel(usize),
    RemovePanel(usize),
    AddQuery(usize),
    DuplicateQuery(usize, usize),
    RemoveQuery(usize, usize),
    MoveQuery(usize, usize, usize),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (1u8..=12).prop_map(Edit::AddPanel),
        any::<usize>().prop_map(Edit::DuplicatePanel),
        any::<usize>().prop_map(Edit::RemovePanel),
        any::<usize>().prop_map(Edit::AddQuery),
        (any::<usize>(), any::<usize>()).prop_map(|(p, q)| Edit::DuplicateQuery(p, q)),
        (any::<usize>(), any::<usize>()).prop_map(|(p, q)| Edit::RemoveQuery(p, q)),
        (any::<usize>(), 0usize..30, 0usize..30).prop_map(|(p, a, b)| Edit::MoveQuery(p, a, b)),
    ]
}

fn pick(dash: &Dashboard, n: usize) -> Option<PanelId> {
    let ids: Vec<PanelId> = dash.panels().map(Panel::id).collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids[n % ids.len()])
    }
}

fn pick_query(dash: &Dashboard, panel: PanelId, n: usize) -> Option<RefId> {
    let queries = dash.panel(panel)?.queries();
    if queries.is_empty() {
        return None;
    }
    queries[n % queries.len()].ref_id().cloned()
}

fn apply(dash: &mut Dashboard, edit: Edit) {
    match edit {
        Edit::AddPanel(span) => {
            let _ = dash.add_panel(0, graph_panel(span));
        }
        Edit::DuplicatePanel(n) => {
            if let Some(id) = pick(dash, n) {
                dash.duplicate_panel(id).unwrap();
            }
        }
        Edit::RemovePanel(n) => {
            if let Some(id) = pick(dash, n) {
                dash.remove_panel(id).unwrap();
            }
        }
        Edit::AddQuery(n) => {
            if let Some(id) = pick(dash, n) {
                let _ = dash.panel_mut(id).unwrap().add_data_query(None);
            }
        }
        Edit::DuplicateQuery(n, q) => {
            if let Some(id) = pick(dash, n) {
                if let Some(ref_id) = pick_query(dash, id, q) {
                    let _ = dash.panel_mut(id).unwrap().duplicate_data_query(&ref_id);
                }
            }
        }
        Edit::RemoveQuery(n, q) => {
            if let Some(id) = pick(dash, n) {
                if let Some(ref_id) = pick_query(dash, id, q) {
                    dash.panel_mut(id).unwrap().remove_data_query(&ref_id).unwrap();
                }
            }
        }
        Edit::MoveQuery(n, from, to) => {
            if let Some(id) = pick(dash, n) {
                let _ = dash.panel_mut(id).unwrap().move_data_query(from, to);
            }
        }
    }
}

proptest! {
    #[test]
    fn prop_edits_keep_ids_and_letters_unique(edits in proptest::collection::vec(edit(), 0..60)) {
        let mut dash = dashboard_with_row(&[4, 4]);
        for edit in edits {
            apply(&mut dash, edit);
        }

        let identity_violations: Vec<Violation> = dash
            .violations()
            .into_iter()
            .filter(|v| !matches!(v, Violation::RowOverflow { .. }))
            .collect();
        prop_assert!(identity_violations.is_empty(), "{:?}", identity_violations);

        let ids: Vec<PanelId> = dash.panels().map(Panel::id).collect();
        let unique: HashSet<PanelId> = ids.iter().copied().collect();
        prop_assert_eq!(ids.len(), unique.len());
        prop_assert!(ids.iter().all(|id| *id < dash.next_panel_id()));
    }

    #[test]
    fn prop_save_model_reloads_to_same_layout(spans in proptest::collection::vec(1u8..=12, 0..8)) {
        let mut dash = Dashboard::empty(MetaOverrides::new());
        dash.add_row(Row::new("main"));
        for span in spans {
            dash.add_panel(0, graph_panel(span)).unwrap();
        }

        let saved = dash.to_save_value().unwrap();
        let reloaded = Dashboard::new(saved, MetaOverrides::new()).unwrap();
        prop_assert_eq!(row_spans(&reloaded, 0), row_spans(&dash, 0));
        prop_assert_eq!(reloaded.next_panel_id(), dash.next_panel_id());
    }
}
