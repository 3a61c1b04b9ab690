//! Typed extraction payloads, one schema per drawing kind
//!
//! Every field is optional. Decoding goes through the [`lenient`](crate::lenient)
//! helpers so a numeric string or a `null` list never rejects a payload.

use crate::error::ExtractorError;
use crate::lenient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use takeoff_domain::{Confidence, PageType};

/// Drawing kind a payload was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// Single-line diagram: boards, circuits, equipment, supply
    Sld,
    /// Lighting layout: rooms and light fixtures
    Lighting,
    /// Plugs layout: rooms and socket outlets
    Plugs,
    /// Combined lighting and power layout
    Combined,
    /// Site plan: cable runs and outside lights
    #[serde(alias = "site")]
    SiteInfra,
}

impl PayloadKind {
    /// Every kind, in pipeline processing order
    pub const ALL: [PayloadKind; 5] = [
        PayloadKind::Sld,
        PayloadKind::Lighting,
        PayloadKind::Plugs,
        PayloadKind::Combined,
        PayloadKind::SiteInfra,
    ];

    /// Short label, also the section name in verification responses
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Sld => "sld",
            PayloadKind::Lighting => "lighting",
            PayloadKind::Plugs => "plugs",
            PayloadKind::Combined => "combined",
            PayloadKind::SiteInfra => "site",
        }
    }

    /// Parse a label; accepts `site_infra` and `outside` for site drawings
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sld" => Some(PayloadKind::Sld),
            "lighting" => Some(PayloadKind::Lighting),
            "plugs" | "power" => Some(PayloadKind::Plugs),
            "combined" => Some(PayloadKind::Combined),
            "site" | "site_infra" | "outside" | "outside_lights" => Some(PayloadKind::SiteInfra),
            _ => None,
        }
    }

    /// Kind extracted from a classified page, if the page is extracted at all
    pub fn for_page(page_type: PageType) -> Option<Self> {
        match page_type {
            PageType::Sld => Some(PayloadKind::Sld),
            PageType::LayoutLighting => Some(PayloadKind::Lighting),
            PageType::LayoutPlugs => Some(PayloadKind::Plugs),
            PageType::LayoutCombined => Some(PayloadKind::Combined),
            PageType::OutsideLights => Some(PayloadKind::SiteInfra),
            PageType::Register | PageType::Unknown => None,
        }
    }

    /// Whether this kind carries room records
    pub fn has_rooms(&self) -> bool {
        matches!(
            self,
            PayloadKind::Lighting | PayloadKind::Plugs | PayloadKind::Combined
        )
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tier for a label found in a payload
///
/// A `manual` label reads as Extracted: only reviewer corrections pin a
/// field.
pub(crate) fn payload_tier(label: &str) -> Confidence {
    match Confidence::parse(label) {
        Confidence::Manual => Confidence::Extracted,
        tier => tier,
    }
}

/// Read an item-level confidence label
pub(crate) fn confidence_of(label: &Option<String>) -> Option<Confidence> {
    label.as_deref().map(payload_tier)
}

/// Schedule data from single-line diagrams
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SldPayload {
    /// Block the schedule belongs to
    #[serde(default, deserialize_with = "lenient::text")]
    pub building_block: Option<String>,
    /// Boards with their circuits
    #[serde(default, deserialize_with = "lenient::list")]
    pub distribution_boards: Vec<BoardPayload>,
    /// Large fixed loads
    #[serde(default, deserialize_with = "lenient::list")]
    pub heavy_equipment: Vec<EquipmentPayload>,
    /// Incoming supplies
    #[serde(default, deserialize_with = "lenient::list")]
    pub supply_points: Vec<SupplyPointPayload>,
    /// Installation-wide parameters
    #[serde(default)]
    pub system_parameters: Option<SystemParametersPayload>,
}

/// One distribution board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct BoardPayload {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub supply_from: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub supply_cable: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub supply_cable_size_mm2: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub supply_cable_length_m: Option<f64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub main_breaker_a: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub main_breaker_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub earth_leakage: Option<bool>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub earth_leakage_rating_a: Option<u32>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub surge_protection: Option<bool>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub spare_ways: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phase: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub voltage_v: Option<u32>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fault_level_ka: Option<f64>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub circuits: Vec<CircuitPayload>,
}

/// One circuit row of a board schedule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CircuitPayload {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub confidence: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub circuit_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub wattage_w: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub wattage_formula: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub cable_size_mm2: Option<f64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub cable_cores: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub cable_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub breaker_a: Option<u32>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub breaker_poles: Option<u32>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub num_points: Option<u32>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_spare: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_vsd: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_isolator: Option<bool>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub isolator_rating_a: Option<u32>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_overload_relay: Option<bool>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub feeds_board: Option<String>,
    #[serde(default, deserialize_with = "lenient::texts")]
    pub controlled_circuits: Vec<String>,
}

/// One heavy equipment item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct EquipmentPayload {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub confidence: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub equipment_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rating_kw: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub cable_size_mm2: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub cable_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub breaker_a: Option<u32>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_vsd: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_dol: Option<bool>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub isolator_a: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub fed_from_db: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub qty: Option<u32>,
}

/// One incoming supply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SupplyPointPayload {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub confidence: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub supply_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub voltage_v: Option<u32>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub capacity_kva: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phase: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub location: Option<String>,
}

/// Installation-wide parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SystemParametersPayload {
    #[serde(default, deserialize_with = "lenient::text")]
    pub confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub supply_voltage_v: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phase: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub frequency_hz: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub earthing_system: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fault_level_ka: Option<f64>,
}

/// Room data from lighting, plugs or combined layouts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomsPayload {
    /// Block the layout belongs to
    #[serde(default, deserialize_with = "lenient::text")]
    pub building_block: Option<String>,
    /// Rooms on the layout
    #[serde(default, deserialize_with = "lenient::list")]
    pub rooms: Vec<RoomPayload>,
}

/// One room on a layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RoomPayload {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub room_number: Option<u32>,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub room_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub area_m2: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub floor: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_wet_area: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_ac: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub has_geyser: Option<bool>,
    /// Fixture key to count, with optional `<key>_confidence` siblings
    #[serde(default, deserialize_with = "lenient::map")]
    pub fixtures: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient::texts")]
    pub circuit_refs: Vec<String>,
    #[serde(default, deserialize_with = "lenient::texts")]
    pub notes: Vec<String>,
}

/// Cable runs and outside lights from site drawings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitePayload {
    /// Runs between site points
    #[serde(default, deserialize_with = "lenient::list")]
    pub site_cable_runs: Vec<CableRunPayload>,
    /// External luminaire counts
    #[serde(default, deserialize_with = "lenient::map")]
    pub outside_lights: Map<String, Value>,
}

/// One site cable run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CableRunPayload {
    #[serde(default, deserialize_with = "lenient::text")]
    pub from_point: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub to_point: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub cable_spec: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub cable_size_mm2: Option<f64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub cable_cores: Option<u32>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub cable_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub length_m: Option<f64>,
    /// Whether the length was dimensioned or scaled off the drawing
    #[serde(default, deserialize_with = "lenient::text")]
    pub length_confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_underground: Option<bool>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub needs_trenching: Option<bool>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: Option<String>,
}

/// One fixture count read from a fixture map
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureEntry {
    /// Normalized fixture key
    pub key: String,
    /// Count, when readable
    pub count: Option<u32>,
    /// Tier from the `<key>_confidence` sibling
    pub confidence: Option<Confidence>,
}

/// Split a fixture map into counts and their confidence tags
///
/// Keys ending in `_confidence` are tags, not fixtures. Entries come back in
/// key order.
pub fn fixture_entries(map: &Map<String, Value>) -> Vec<FixtureEntry> {
    let mut entries: Vec<FixtureEntry> = map
        .iter()
        .filter(|(key, _)| !key.ends_with("_confidence"))
        .filter(|(key, _)| !key.trim().is_empty())
        .map(|(key, value)| FixtureEntry {
            key: key.trim().to_lowercase(),
            count: lenient::count_of(value),
            confidence: map
                .get(&format!("{}_confidence", key))
                .and_then(Value::as_str)
                .map(payload_tier),
        })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    entries
}

/// A decoded payload of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Single-line diagram
    Sld(SldPayload),
    /// Lighting layout
    Lighting(RoomsPayload),
    /// Plugs layout
    Plugs(RoomsPayload),
    /// Combined layout
    Combined(RoomsPayload),
    /// Site drawing
    Site(SitePayload),
}

impl Payload {
    /// Decode a JSON object as the schema for `kind`
    pub fn from_value(kind: PayloadKind, value: Value) -> Result<Self, ExtractorError> {
        if !value.is_object() {
            return Err(ExtractorError::InvalidFormat(format!(
                "{} payload must be a JSON object",
                kind
            )));
        }
        let schema_error = |e: serde_json::Error| ExtractorError::Schema {
            kind: kind.to_string(),
            message: e.to_string(),
        };
        Ok(match kind {
            PayloadKind::Sld => Payload::Sld(serde_json::from_value(value).map_err(schema_error)?),
            PayloadKind::Lighting => {
                Payload::Lighting(serde_json::from_value(value).map_err(schema_error)?)
            }
            PayloadKind::Plugs => {
                Payload::Plugs(serde_json::from_value(value).map_err(schema_error)?)
            }
            PayloadKind::Combined => {
                Payload::Combined(serde_json::from_value(value).map_err(schema_error)?)
            }
            PayloadKind::SiteInfra => {
                Payload::Site(serde_json::from_value(value).map_err(schema_error)?)
            }
        })
    }

    /// Decode raw response text (lenient parse, then schema)
    pub fn from_response(kind: PayloadKind, response: &str) -> Result<Self, ExtractorError> {
        let map = crate::parser::parse_response(response)?;
        Self::from_value(kind, Value::Object(map))
    }

    /// Kind of this payload
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Sld(_) => PayloadKind::Sld,
            Payload::Lighting(_) => PayloadKind::Lighting,
            Payload::Plugs(_) => PayloadKind::Plugs,
            Payload::Combined(_) => PayloadKind::Combined,
            Payload::Site(_) => PayloadKind::SiteInfra,
        }
    }

    /// Number of top-level entity records carried
    pub fn entity_count(&self) -> usize {
        match self {
            Payload::Sld(sld) => {
                sld.distribution_boards.len()
                    + sld.heavy_equipment.len()
                    + sld.supply_points.len()
                    + usize::from(sld.system_parameters.is_some())
            }
            Payload::Lighting(rooms) | Payload::Plugs(rooms) | Payload::Combined(rooms) => {
                rooms.rooms.len()
            }
            Payload::Site(site) => {
                site.site_cable_runs.len() + usize::from(!fixture_entries(&site.outside_lights).is_empty())
            }
        }
    }

    /// Whether the payload carries no entity records
    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0
    }
}
