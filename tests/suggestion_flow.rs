//! End-to-end suggestion behavior through the public API.

use rxsage::catalog::{CatalogEntry, CatalogIndex, CatalogSchema, IndexOptions};
use rxsage::suggest::{
    EditBuffer, FieldId, FieldSessions, KeyOutcome, NavKey, NavPhase, SuggestConfig,
    SuggestionController, SuggestionSession,
};
use serde_json::{Map, Value, json};
use std::sync::Arc;

fn entry(label: &str, category: &str) -> CatalogEntry {
    CatalogEntry {
        label: label.to_string(),
        code: None,
        category: category.to_string(),
        attributes: Map::new(),
    }
}

fn controller(labels: &[&str]) -> SuggestionController {
    let index = CatalogIndex::build(
        labels.iter().map(|l| entry(l, "medicine")),
        IndexOptions::default(),
    );
    SuggestionController::new(Arc::new(index), SuggestConfig::default())
}

fn listing(controller: &SuggestionController, buffer: &EditBuffer) -> SuggestionSession {
    let mut session = SuggestionSession::new();
    session.text_changed(controller, buffer);
    session
}

#[test]
fn short_tokens_never_suggest() {
    let c = controller(&["Paracetamol", "Pa", "P"]);
    for text in ["p", "pa", "Give pa", "Give p", "1-0-1 pa"] {
        let state = c.on_text_changed(text, text.chars().count());
        assert!(state.is_empty(), "{text:?} should not suggest");
    }
    assert!(!c.on_text_changed("par", 3).is_empty());
}

#[test]
fn results_are_capped() {
    let labels: Vec<String> = (0..25).map(|i| format!("Amoxicillin {}mg", i * 25)).collect();
    let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let c = controller(&refs);
    let state = c.on_text_changed("amoxicillin", 11);
    assert_eq!(state.len(), 10);
    assert_eq!(c.index().unwrap().search("amoxicillin", 3).len(), 3);
}

#[test]
fn apply_splices_label_at_caret() {
    let c = controller(&["Paracetamol"]);
    let edit = c.apply("Give paracet 500mg", 12, "Paracetamol");
    assert_eq!(edit.text, "Give Paracetamol  500mg");
    assert_eq!(edit.caret, 17);
}

#[test]
fn successive_applies_only_touch_the_token() {
    let c = controller(&["Paracetamol", "Omeprazole"]);
    let first = c.apply("Give parac then ome", 10, "Paracetamol");
    assert_eq!(first.text, "Give Paracetamol  then ome");
    let end = first.text.chars().count();
    let second = c.apply(&first.text, end, "Omeprazole");
    assert_eq!(second.text, "Give Paracetamol  then Omeprazole ");
    assert_eq!(second.caret, second.text.chars().count());
}

#[test]
fn arrows_wrap_around_three_items() {
    let c = controller(&["Paracetamol 500mg", "Paracetamol 650mg", "Paracetamol drops"]);
    let buffer = EditBuffer::at_end("paracetamol");
    let mut session = listing(&c, &buffer);
    assert_eq!(session.state().len(), 3);

    session.handle_key(NavKey::Up, &c, &buffer);
    assert_eq!(session.state().highlighted, Some(2));
    session.handle_key(NavKey::Down, &c, &buffer);
    assert_eq!(session.state().highlighted, Some(0));
    session.handle_key(NavKey::Up, &c, &buffer);
    assert_eq!(session.state().highlighted, Some(2));
}

#[test]
fn enter_commits_only_after_navigation() {
    let c = controller(&["Paracetamol"]);
    let buffer = EditBuffer::at_end("Give paracet");
    let mut session = listing(&c, &buffer);
    assert_eq!(session.phase(), NavPhase::Listing);

    assert_eq!(session.handle_key(NavKey::Enter, &c, &buffer), KeyOutcome::Ignored);
    assert_eq!(session.phase(), NavPhase::Listing);

    session.handle_key(NavKey::Down, &c, &buffer);
    match session.handle_key(NavKey::Enter, &c, &buffer) {
        KeyOutcome::Committed { entry, edit } => {
            assert_eq!(entry.label, "Paracetamol");
            assert_eq!(edit.text, "Give Paracetamol ");
        }
        other => panic!("expected a commit, got {other:?}"),
    }
    assert_eq!(session.phase(), NavPhase::Idle);
}

#[test]
fn near_misses_match_and_noise_does_not() {
    let c = controller(&["Paracetamol"]);
    let index = c.index().unwrap();
    assert_eq!(index.search("parcetamol", 10)[0].label, "Paracetamol");
    assert!(index.search("xyz123notdrug", 10).is_empty());
}

#[test]
fn merged_catalogs_keep_their_categories() {
    let medicines: Vec<Value> = vec![json!({"medicine_desc": "Metformin 500mg", "sku_code": "M1"})];
    let procedures: Vec<Value> = vec![json!({"name": "Metanephrines Urine", "code": "P1"})];
    let med_schema = CatalogSchema::medicines();
    let proc_schema = CatalogSchema::procedure_sku_list();
    let index = CatalogIndex::merge(
        [
            (medicines.as_slice(), &med_schema),
            (procedures.as_slice(), &proc_schema),
        ],
        IndexOptions::default(),
    );

    let met = index.search("metformin", 10);
    assert_eq!(met.len(), 1);
    assert_eq!(met[0].category, "medicine");
    assert_eq!(met[0].code.as_deref(), Some("M1"));

    let neph = index.search("metanephrines", 10);
    assert_eq!(neph.len(), 1);
    assert_eq!(neph[0].category, "procedure");
    assert_eq!(neph[0].code.as_deref(), Some("P1"));
}

#[test]
fn field_sessions_do_not_share_state() {
    let c = controller(&["MRI Brain Plain", "MRI Brain Contrast"]);
    let mut fields = FieldSessions::new();
    let a = FieldId::new(0, "matched");
    let b = FieldId::new(1, "matched");

    fields.focus(a.clone());
    let buffer = EditBuffer::at_end("brain");
    fields.session_mut(&a).text_changed(&c, &buffer);
    fields.session_mut(&a).handle_key(NavKey::Down, &c, &buffer);
    assert_eq!(fields.session(&a).unwrap().state().highlighted, Some(0));

    fields.focus(b.clone());
    assert!(!fields.session(&a).unwrap().is_active());
    fields.session_mut(&b).text_changed(&c, &buffer);
    let state = fields.session(&b).unwrap().state();
    assert_eq!(state.len(), 2);
    assert_eq!(state.highlighted, None);
    assert!(!state.navigated);
}
