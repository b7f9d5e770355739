use serde::{Deserialize, Serialize};
use std::fmt;

/// Waste categories tracked by the contamination monitor.
///
/// `LeafyVegetable` is the clean target category; everything else counts as
/// contamination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WasteCategory {
    #[serde(rename = "leafy_vegetables")]
    LeafyVegetable,
    Plastic,
    Metal,
    Paper,
    Unknown,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 5] = [
        WasteCategory::LeafyVegetable,
        WasteCategory::Plastic,
        WasteCategory::Metal,
        WasteCategory::Paper,
        WasteCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::LeafyVegetable => "leafy_vegetables",
            WasteCategory::Plastic => "plastic",
            WasteCategory::Metal => "metal",
            WasteCategory::Paper => "paper",
            WasteCategory::Unknown => "unknown",
        }
    }

    pub fn is_contamination(&self) -> bool {
        !matches!(self, WasteCategory::LeafyVegetable)
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Keyword lists for the pretrained COCO label set. A custom-trained model emits
// category names directly, which still land on the right arm here.
const VEGETABLE_KEYWORDS: &[&str] = &["broccoli", "carrot", "apple", "orange", "banana", "leafy"];
const PLASTIC_KEYWORDS: &[&str] = &["bottle", "cup", "plastic"];
const METAL_KEYWORDS: &[&str] = &["fork", "knife", "spoon", "metal"];
const PAPER_KEYWORDS: &[&str] = &["book", "paper"];

/// Map a raw model label to a waste category.
///
/// Total and deterministic: the label is lower-cased and tested against fixed
/// keyword lists in priority order; the first match wins and anything else is
/// `Unknown`.
pub fn map_label(label: &str) -> WasteCategory {
    let label = label.to_lowercase();
    let matches_any = |keywords: &[&str]| keywords.iter().any(|k| label.contains(k));

    if matches_any(VEGETABLE_KEYWORDS) {
        WasteCategory::LeafyVegetable
    } else if matches_any(PLASTIC_KEYWORDS) {
        WasteCategory::Plastic
    } else if matches_any(METAL_KEYWORDS) {
        WasteCategory::Metal
    } else if matches_any(PAPER_KEYWORDS) {
        WasteCategory::Paper
    } else {
        WasteCategory::Unknown
    }
}
