// Category mapping: total, deterministic, fixed priority order.

use nutricycle::detect::{map_label, WasteCategory};

#[test]
fn maps_known_coco_labels() {
    assert_eq!(map_label("broccoli"), WasteCategory::LeafyVegetable);
    assert_eq!(map_label("carrot"), WasteCategory::LeafyVegetable);
    assert_eq!(map_label("bottle"), WasteCategory::Plastic);
    assert_eq!(map_label("cup"), WasteCategory::Plastic);
    assert_eq!(map_label("fork"), WasteCategory::Metal);
    assert_eq!(map_label("knife"), WasteCategory::Metal);
    assert_eq!(map_label("book"), WasteCategory::Paper);
}

#[test]
fn is_case_insensitive() {
    assert_eq!(map_label("Bottle"), WasteCategory::Plastic);
    assert_eq!(map_label("BROCCOLI"), WasteCategory::LeafyVegetable);
}

#[test]
fn matches_on_substring() {
    // A custom-trained model may emit labels like "plastic_bottle".
    assert_eq!(map_label("plastic_bottle"), WasteCategory::Plastic);
    assert_eq!(map_label("water bottle"), WasteCategory::Plastic);
    assert_eq!(map_label("leafy_vegetables"), WasteCategory::LeafyVegetable);
}

#[test]
fn unmatched_labels_are_unknown() {
    assert_eq!(map_label("dog"), WasteCategory::Unknown);
    assert_eq!(map_label(""), WasteCategory::Unknown);
    assert_eq!(map_label("🦀"), WasteCategory::Unknown);
}

#[test]
fn every_label_maps_to_exactly_one_category() {
    // Totality over an arbitrary label sample, and repeated calls agree.
    let labels = [
        "bottle", "broccoli", "fork", "book", "dog", "", "x", "apple pie", "spoon rest",
        "paperback", "cupboard",
    ];
    for label in labels {
        let first = map_label(label);
        let second = map_label(label);
        assert_eq!(first, second, "mapping must be deterministic for {label:?}");
        assert!(
            WasteCategory::ALL.contains(&first),
            "label {label:?} mapped outside the fixed category set"
        );
    }
}

#[test]
fn priority_order_resolves_multi_category_labels() {
    // "cupboard" contains both "cup" (plastic) and "board"; plastic wins
    // because it is tested before paper.
    assert_eq!(map_label("cupboard"), WasteCategory::Plastic);
    // Vegetable keywords take priority over everything else.
    assert_eq!(map_label("apple cup"), WasteCategory::LeafyVegetable);
}

#[test]
fn serializes_with_wire_names() {
    assert_eq!(
        serde_json::to_string(&WasteCategory::LeafyVegetable).unwrap(),
        "\"leafy_vegetables\""
    );
    assert_eq!(
        serde_json::to_string(&WasteCategory::Plastic).unwrap(),
        "\"plastic\""
    );
    assert_eq!(WasteCategory::Metal.as_str(), "metal");
}

#[test]
fn contamination_excludes_clean_category() {
    assert!(!WasteCategory::LeafyVegetable.is_contamination());
    assert!(WasteCategory::Plastic.is_contamination());
    assert!(WasteCategory::Unknown.is_contamination());
}
