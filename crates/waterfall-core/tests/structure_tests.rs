use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

use waterfall_core::structuring::{
    parse_rating, InMemoryStructureStore, Rating, StructureStore, TrancheDefinition,
    TrancheStructure, TrancheUpdate, MAX_TRANCHES, MIN_TRANCHES,
};
use waterfall_core::WaterfallError;

// ===========================================================================
// Structure lifecycle: edit in memory, save through a store, cascade delete
// ===========================================================================

// ---------------------------------------------------------------------------
// Editing session
// ---------------------------------------------------------------------------

#[test]
fn test_new_structure_edit_then_save() {
    let mut s = TrancheStructure::new("Q3 Deal", "consumer-book");
    assert_eq!(s.tranches.len(), MIN_TRANCHES);
    assert!(!s.is_valid());

    let ids: Vec<_> = s.tranches.iter().map(|t| t.id.clone()).collect();
    let edits = [
        ("Class A AAA", dec!(75), dec!(120)),
        ("Class B BB", dec!(15), dec!(300)),
        ("Residual", dec!(10), dec!(600)),
    ];
    for (id, (name, thickness, cost)) in ids.iter().zip(edits) {
        s.update_tranche(id, TrancheUpdate::Name(name.into())).unwrap();
        s.update_tranche(id, TrancheUpdate::ThicknessPercent(thickness))
            .unwrap();
        s.update_tranche(id, TrancheUpdate::CostBps(cost)).unwrap();
    }
    assert!(s.is_valid());

    let mut store = InMemoryStructureStore::default();
    let saved = s.save(&mut store).unwrap();
    assert_eq!(saved, s.id);
    assert_eq!(store.get(&saved), Some(s));
}

#[test]
fn test_save_rejected_leaves_store_empty() {
    let s = TrancheStructure::with_tranches(
        "Short",
        "ds",
        vec![
            TrancheDefinition::new("A", dec!(50), dec!(100)),
            TrancheDefinition::new("B", dec!(30), dec!(200)),
            TrancheDefinition::new("C", dec!(10), dec!(300)),
        ],
    );
    let mut store = InMemoryStructureStore::default();
    match s.save(&mut store) {
        Err(WaterfallError::InvalidStructure { reasons }) => {
            assert_eq!(reasons, vec!["Tranche thicknesses sum to 90%, expected 100%".to_string()]);
        }
        other => panic!("expected InvalidStructure, got {other:?}"),
    }
    assert!(store.is_empty());
}

#[test]
fn test_tranche_count_guard_rails() {
    let mut s = TrancheStructure::new("Deal", "ds");
    for _ in MIN_TRANCHES..MAX_TRANCHES {
        s.add_tranche().unwrap();
    }
    assert!(matches!(
        s.add_tranche(),
        Err(WaterfallError::TooManyTranches { max: 10 })
    ));

    while s.tranches.len() > MIN_TRANCHES {
        let id = s.tranches[0].id.clone();
        s.remove_tranche(&id).unwrap();
    }
    let id = s.tranches[0].id.clone();
    assert!(matches!(
        s.remove_tranche(&id),
        Err(WaterfallError::TooFewTranches { min: 3 })
    ));
    assert_eq!(s.tranches.len(), MIN_TRANCHES);
}

#[test]
fn test_structure_json_round_trip_with_updates() {
    let json = r#"{"field": "thickness_percent", "value": "42.5"}"#;
    let update: TrancheUpdate = serde_json::from_str(json).unwrap();
    assert_eq!(update, TrancheUpdate::ThicknessPercent(dec!(42.5)));
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

fn deal(name: &str, dataset: &str) -> TrancheStructure {
    TrancheStructure::with_tranches(
        name,
        dataset,
        vec![
            TrancheDefinition::new("Senior", dec!(80), dec!(100)),
            TrancheDefinition::new("Mezz", dec!(15), dec!(300)),
            TrancheDefinition::new("Equity", dec!(5), dec!(800)),
        ],
    )
}

#[test]
fn test_store_replace_tranches_revalidates() {
    let mut store = InMemoryStructureStore::default();
    let s = deal("D1", "ds");
    let id = s.save(&mut store).unwrap();

    let bad = vec![
        TrancheDefinition::new("X", dec!(60), dec!(100)),
        TrancheDefinition::new("Y", dec!(60), dec!(100)),
        TrancheDefinition::new("Z", dec!(60), dec!(100)),
    ];
    assert!(store.replace_tranches(&id, bad).is_err());
    assert_eq!(store.get(&id).unwrap().tranches, s.tranches);

    let good = vec![
        TrancheDefinition::new("X", dec!(40), dec!(100)),
        TrancheDefinition::new("Y", dec!(35), dec!(100)),
        TrancheDefinition::new("Z", dec!(25), dec!(100)),
    ];
    store.replace_tranches(&id, good.clone()).unwrap();
    assert_eq!(store.get(&id).unwrap().tranches, good);
}

#[test]
fn test_duplicate_tranche_ids_cannot_be_stored() {
    let mut store = InMemoryStructureStore::default();
    let dup = TrancheStructure::with_tranches(
        "Dup",
        "ds",
        vec![
            TrancheDefinition::new("Senior", dec!(70), dec!(150)).with_id("t"),
            TrancheDefinition::new("Mezz", dec!(20), dec!(250)).with_id("t"),
            TrancheDefinition::new("Sub", dec!(10), dec!(450)).with_id("u"),
        ],
    );
    assert!(!dup.is_valid());
    match dup.save(&mut store) {
        Err(WaterfallError::InvalidStructure { reasons }) => {
            assert_eq!(reasons, vec!["Tranche id 't' is used more than once".to_string()]);
        }
        other => panic!("expected InvalidStructure, got {other:?}"),
    }
    assert!(store.is_empty());

    let s = deal("D1", "ds");
    let id = s.save(&mut store).unwrap();
    assert!(store.replace_tranches(&id, dup.tranches.clone()).is_err());
    assert_eq!(store.get(&id).unwrap().tranches, s.tranches);
}

#[test]
fn test_delete_dataset_cascades() {
    let mut store = InMemoryStructureStore::default();
    deal("D1", "alpha").save(&mut store).unwrap();
    deal("D2", "alpha").save(&mut store).unwrap();
    let keep = deal("D3", "beta").save(&mut store).unwrap();

    assert_eq!(store.list_for_dataset("alpha").len(), 2);
    assert_eq!(store.delete_dataset("alpha"), 2);
    assert!(store.list_for_dataset("alpha").is_empty());
    assert_eq!(store.len(), 1);
    assert!(store.get(&keep).is_some());
}

// ---------------------------------------------------------------------------
// Rating tags
// ---------------------------------------------------------------------------

#[test]
fn test_rating_tags_from_names() {
    let cases = [
        ("Senior AAA", Rating::Aaa),
        ("class a notes", Rating::A),
        ("BBB- Mezzanine", Rating::Bbb),
        ("Mezzanine", Rating::Unrated),
        ("Tranche 2", Rating::Unrated),
        ("CCC/CC split", Rating::Ccc),
    ];
    for (name, expected) in cases {
        assert_eq!(parse_rating(name), expected, "name: {name}");
    }
}
