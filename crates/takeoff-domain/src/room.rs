//! Rooms counted on layout drawings

use crate::confidence::Confidence;
use crate::fixtures::{FixtureCounts, SOCKET_KEYS, WATERPROOF_SOCKET_KEY};
use crate::tracked::Tracked;
use serde::{Deserialize, Serialize};

/// Room types treated as wet areas
pub const WET_AREA_TYPES: &[&str] = &[
    "bathroom", "toilet", "shower", "laundry", "kitchen", "scullery",
];

/// A room on a layout drawing
///
/// Room names are unique within a building block, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Room {
    pub name: String,

    /// Item-level provenance used by the confidence scorer
    #[serde(default)]
    pub confidence: Confidence,

    #[serde(default)]
    pub room_number: Tracked<u32>,
    #[serde(rename = "type", default)]
    pub room_type: Tracked<String>,
    #[serde(default)]
    pub area_m2: Tracked<f64>,
    #[serde(default)]
    pub floor: Tracked<String>,

    #[serde(default)]
    pub is_wet_area: Tracked<bool>,
    #[serde(default)]
    pub has_ac: Tracked<bool>,
    #[serde(default)]
    pub has_geyser: Tracked<bool>,

    /// Circuit references such as "L1" or "DB-S1 L1"; accumulated
    #[serde(default)]
    pub circuit_refs: Vec<String>,

    /// Free-text observations; accumulated
    #[serde(default)]
    pub notes: Vec<String>,

    #[serde(default)]
    pub fixtures: FixtureCounts,
}

impl Room {
    /// Create an empty room
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Lower-cased room type
    pub fn kind(&self) -> String {
        self.room_type.value.trim().to_lowercase()
    }

    /// Wet area by flag or by room type
    pub fn is_wet(&self) -> bool {
        self.is_wet_area.value || WET_AREA_TYPES.contains(&self.kind().as_str())
    }

    /// Socket outlets excluding waterproof, ceiling and floor outlets
    pub fn general_sockets(&self) -> u32 {
        SOCKET_KEYS
            .iter()
            .take(4)
            .map(|key| self.fixtures.get(key))
            .fold(0, u32::saturating_add)
    }

    /// Waterproof socket outlets
    pub fn waterproof_sockets(&self) -> u32 {
        self.fixtures.get(WATERPROOF_SOCKET_KEY)
    }

    /// Whether this room lists the given circuit reference
    ///
    /// A reference matches when it equals the bare circuit id or
    /// "<board> <circuit>", both case-insensitively.
    pub fn references_circuit(&self, board: &str, circuit: &str) -> bool {
        let bare = normalize_ref(circuit);
        let qualified = normalize_ref(&format!("{} {}", board, circuit));
        self.circuit_refs.iter().any(|r| {
            let r = normalize_ref(r);
            r == bare || r == qualified
        })
    }
}

fn normalize_ref(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
