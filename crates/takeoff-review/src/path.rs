//! Correction paths and the fields they resolve to
//!
//! Grammar (names match case-insensitively):
//!
//! ```text
//! blocks.<block>.boards.<board>.<field>
//! blocks.<block>.boards.<board>.circuits.<id>.<field>
//! blocks.<block>.rooms.<room>.<field>
//! blocks.<block>.rooms.<room>.fixtures.<key>
//! blocks.<block>.equipment.<name>.<field>
//! site_cable_runs.<index>.<field>
//! supply_points.<name>.<field>
//! system_parameters.<field>
//! ```

use crate::error::{Result, ReviewError};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use takeoff_domain::{
    Circuit, DistributionBoard, FixtureCounts, HeavyEquipment, Project, Room, SiteCableRun,
    SupplyPoint, SystemParameters, Tracked,
};

/// A parsed correction path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    /// Board attribute
    Board {
        /// Block name
        block: String,
        /// Board name
        board: String,
        /// Field name
        field: String,
    },
    /// Circuit attribute
    Circuit {
        /// Block name
        block: String,
        /// Board name
        board: String,
        /// Circuit id
        circuit: String,
        /// Field name
        field: String,
    },
    /// Room attribute
    Room {
        /// Block name
        block: String,
        /// Room name
        room: String,
        /// Field name
        field: String,
    },
    /// One fixture count in a room
    Fixture {
        /// Block name
        block: String,
        /// Room name
        room: String,
        /// Fixture key
        key: String,
    },
    /// Heavy equipment attribute
    Equipment {
        /// Block name
        block: String,
        /// Equipment name
        name: String,
        /// Field name
        field: String,
    },
    /// Site cable run attribute, by position
    CableRun {
        /// Index into the project's cable runs
        index: usize,
        /// Field name
        field: String,
    },
    /// Supply point attribute
    SupplyPoint {
        /// Supply point name
        name: String,
        /// Field name
        field: String,
    },
    /// Installation-wide parameter
    SystemParameter {
        /// Field name
        field: String,
    },
}

impl FieldPath {
    /// Parse a dot-delimited path
    pub fn parse(path: &str) -> Result<Self> {
        let invalid = |reason: &str| ReviewError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        let parts: Vec<&str> = path.split('.').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("empty segment"));
        }
        let own = |s: &str| s.to_string();

        match parts.as_slice() {
            ["blocks", block, "boards", board, "circuits", circuit, field] => Ok(FieldPath::Circuit {
                block: own(block),
                board: own(board),
                circuit: own(circuit),
                field: own(field),
            }),
            ["blocks", block, "boards", board, field] => Ok(FieldPath::Board {
                block: own(block),
                board: own(board),
                field: own(field),
            }),
            ["blocks", block, "rooms", room, "fixtures", key] => Ok(FieldPath::Fixture {
                block: own(block),
                room: own(room),
                key: key.to_lowercase(),
            }),
            ["blocks", block, "rooms", room, field] => Ok(FieldPath::Room {
                block: own(block),
                room: own(room),
                field: own(field),
            }),
            ["blocks", block, "equipment", name, field] => Ok(FieldPath::Equipment {
                block: own(block),
                name: own(name),
                field: own(field),
            }),
            ["site_cable_runs", index, field] => {
                let index = index
                    .parse()
                    .map_err(|_| invalid("cable run index must be a non-negative integer"))?;
                Ok(FieldPath::CableRun {
                    index,
                    field: own(field),
                })
            }
            ["supply_points", name, field] => Ok(FieldPath::SupplyPoint {
                name: own(name),
                field: own(field),
            }),
            ["system_parameters", field] => Ok(FieldPath::SystemParameter { field: own(field) }),
            _ => Err(invalid("does not match any correctable field")),
        }
    }

    /// Block named by the path, if it is block-scoped
    pub fn block(&self) -> Option<&str> {
        match self {
            FieldPath::Board { block, .. }
            | FieldPath::Circuit { block, .. }
            | FieldPath::Room { block, .. }
            | FieldPath::Fixture { block, .. }
            | FieldPath::Equipment { block, .. } => Some(block),
            _ => None,
        }
    }
}

impl FromStr for FieldPath {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Board { block, board, field } => {
                write!(f, "blocks.{}.boards.{}.{}", block, board, field)
            }
            FieldPath::Circuit {
                block,
                board,
                circuit,
                field,
            } => write!(
                f,
                "blocks.{}.boards.{}.circuits.{}.{}",
                block, board, circuit, field
            ),
            FieldPath::Room { block, room, field } => {
                write!(f, "blocks.{}.rooms.{}.{}", block, room, field)
            }
            FieldPath::Fixture { block, room, key } => {
                write!(f, "blocks.{}.rooms.{}.fixtures.{}", block, room, key)
            }
            FieldPath::Equipment { block, name, field } => {
                write!(f, "blocks.{}.equipment.{}.{}", block, name, field)
            }
            FieldPath::CableRun { index, field } => write!(f, "site_cable_runs.{}.{}", index, field),
            FieldPath::SupplyPoint { name, field } => write!(f, "supply_points.{}.{}", name, field),
            FieldPath::SystemParameter { field } => write!(f, "system_parameters.{}", field),
        }
    }
}

/// A mutable handle on one correctable field
pub(crate) enum Slot<'a> {
    Text(&'a mut Tracked<String>),
    Number(&'a mut Tracked<f64>),
    Count(&'a mut Tracked<u32>),
    Flag(&'a mut Tracked<bool>),
    Fixture(&'a mut FixtureCounts, String),
}

/// A value converted to a slot's type, ready to write
pub(crate) enum Typed {
    Text(String),
    Number(f64),
    Count(u32),
    Flag(bool),
}

impl Slot<'_> {
    /// Current value as JSON
    pub(crate) fn current(&self) -> Value {
        match self {
            Slot::Text(t) => Value::from(t.value.clone()),
            Slot::Number(t) => Value::from(t.value),
            Slot::Count(t) => Value::from(t.value),
            Slot::Flag(t) => Value::from(t.value),
            Slot::Fixture(counts, key) => Value::from(counts.get(key)),
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Slot::Text(_) => "a string",
            Slot::Number(_) => "a number",
            Slot::Count(_) | Slot::Fixture(..) => "a non-negative integer",
            Slot::Flag(_) => "a boolean",
        }
    }

    /// Convert a JSON value to this slot's type without writing it
    pub(crate) fn convert(&self, value: &Value, path: &str) -> Result<Typed> {
        let typed = match self {
            Slot::Text(_) => value.as_str().map(|s| Typed::Text(s.to_string())),
            Slot::Number(_) => value.as_f64().filter(|n| n.is_finite()).map(Typed::Number),
            Slot::Count(_) | Slot::Fixture(..) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Typed::Count),
            Slot::Flag(_) => value.as_bool().map(Typed::Flag),
        };
        typed.ok_or_else(|| ReviewError::TypeMismatch {
            path: path.to_string(),
            expected: self.expected(),
            found: value.to_string(),
        })
    }

    /// Pin a converted value as Manual
    pub(crate) fn pin(self, value: Typed) {
        match (self, value) {
            (Slot::Text(t), Typed::Text(v)) => t.set_manual(v),
            (Slot::Number(t), Typed::Number(v)) => t.set_manual(v),
            (Slot::Count(t), Typed::Count(v)) => t.set_manual(v),
            (Slot::Flag(t), Typed::Flag(v)) => t.set_manual(v),
            (Slot::Fixture(counts, key), Typed::Count(v)) => counts.set_manual(&key, v),
            // convert() only yields the slot's own type
            _ => {}
        }
    }
}

fn unknown(kind: &'static str, field: &str) -> ReviewError {
    ReviewError::UnknownField {
        kind,
        field: field.to_string(),
    }
}

fn not_found(kind: &'static str, name: impl Into<String>) -> ReviewError {
    ReviewError::NotFound {
        kind,
        name: name.into(),
    }
}

fn board_slot<'a>(board: &'a mut DistributionBoard, field: &str) -> Result<Slot<'a>> {
    Ok(match field {
        "description" => Slot::Text(&mut board.description),
        "location" => Slot::Text(&mut board.location),
        "supply_from" => Slot::Text(&mut board.supply_from),
        "supply_cable" => Slot::Text(&mut board.supply_cable),
        "supply_cable_size_mm2" => Slot::Number(&mut board.supply_cable_size_mm2),
        "supply_cable_length_m" => Slot::Number(&mut board.supply_cable_length_m),
        "main_breaker_a" => Slot::Count(&mut board.main_breaker_a),
        "main_breaker_type" => Slot::Text(&mut board.main_breaker_type),
        "earth_leakage" => Slot::Flag(&mut board.earth_leakage),
        "earth_leakage_rating_a" => Slot::Count(&mut board.earth_leakage_rating_a),
        "surge_protection" => Slot::Flag(&mut board.surge_protection),
        "spare_ways" => Slot::Count(&mut board.spare_ways),
        "phase" => Slot::Text(&mut board.phase),
        "voltage_v" => Slot::Count(&mut board.voltage_v),
        "fault_level_ka" => Slot::Number(&mut board.fault_level_ka),
        _ => return Err(unknown("board", field)),
    })
}

fn circuit_slot<'a>(circuit: &'a mut Circuit, field: &str) -> Result<Slot<'a>> {
    Ok(match field {
        "type" | "circuit_type" => Slot::Text(&mut circuit.circuit_type),
        "description" => Slot::Text(&mut circuit.description),
        "wattage_w" => Slot::Number(&mut circuit.wattage_w),
        "wattage_formula" => Slot::Text(&mut circuit.wattage_formula),
        "cable_size_mm2" => Slot::Number(&mut circuit.cable_size_mm2),
        "cable_cores" => Slot::Count(&mut circuit.cable_cores),
        "cable_type" => Slot::Text(&mut circuit.cable_type),
        "breaker_a" => Slot::Count(&mut circuit.breaker_a),
        "breaker_poles" => Slot::Count(&mut circuit.breaker_poles),
        "num_points" => Slot::Count(&mut circuit.num_points),
        "is_spare" => Slot::Flag(&mut circuit.is_spare),
        "has_vsd" => Slot::Flag(&mut circuit.has_vsd),
        "has_isolator" => Slot::Flag(&mut circuit.has_isolator),
        "isolator_rating_a" => Slot::Count(&mut circuit.isolator_rating_a),
        "has_overload_relay" => Slot::Flag(&mut circuit.has_overload_relay),
        "feeds_board" => Slot::Text(&mut circuit.feeds_board),
        _ => return Err(unknown("circuit", field)),
    })
}

fn room_slot<'a>(room: &'a mut Room, field: &str) -> Result<Slot<'a>> {
    Ok(match field {
        "room_number" => Slot::Count(&mut room.room_number),
        "type" | "room_type" => Slot::Text(&mut room.room_type),
        "area_m2" => Slot::Number(&mut room.area_m2),
        "floor" => Slot::Text(&mut room.floor),
        "is_wet_area" => Slot::Flag(&mut room.is_wet_area),
        "has_ac" => Slot::Flag(&mut room.has_ac),
        "has_geyser" => Slot::Flag(&mut room.has_geyser),
        _ => return Err(unknown("room", field)),
    })
}

fn equipment_slot<'a>(item: &'a mut HeavyEquipment, field: &str) -> Result<Slot<'a>> {
    Ok(match field {
        "type" | "equipment_type" => Slot::Text(&mut item.equipment_type),
        "rating_kw" => Slot::Number(&mut item.rating_kw),
        "cable_size_mm2" => Slot::Number(&mut item.cable_size_mm2),
        "cable_type" => Slot::Text(&mut item.cable_type),
        "breaker_a" => Slot::Count(&mut item.breaker_a),
        "has_vsd" => Slot::Flag(&mut item.has_vsd),
        "has_dol" => Slot::Flag(&mut item.has_dol),
        "isolator_a" => Slot::Count(&mut item.isolator_a),
        "fed_from_db" => Slot::Text(&mut item.fed_from_db),
        "qty" => Slot::Count(&mut item.qty),
        _ => return Err(unknown("equipment", field)),
    })
}

fn cable_run_slot<'a>(run: &'a mut SiteCableRun, field: &str) -> Result<Slot<'a>> {
    Ok(match field {
        "cable_spec" => Slot::Text(&mut run.cable_spec),
        "cable_size_mm2" => Slot::Number(&mut run.cable_size_mm2),
        "cable_cores" => Slot::Count(&mut run.cable_cores),
        "cable_type" => Slot::Text(&mut run.cable_type),
        "length_m" => Slot::Number(&mut run.length_m),
        "is_underground" => Slot::Flag(&mut run.is_underground),
        "needs_trenching" => Slot::Flag(&mut run.needs_trenching),
        "notes" => Slot::Text(&mut run.notes),
        _ => return Err(unknown("cable run", field)),
    })
}

fn supply_point_slot<'a>(point: &'a mut SupplyPoint, field: &str) -> Result<Slot<'a>> {
    Ok(match field {
        "type" | "supply_type" => Slot::Text(&mut point.supply_type),
        "voltage_v" => Slot::Count(&mut point.voltage_v),
        "capacity_kva" => Slot::Number(&mut point.capacity_kva),
        "phase" => Slot::Text(&mut point.phase),
        "location" => Slot::Text(&mut point.location),
        _ => return Err(unknown("supply point", field)),
    })
}

fn system_slot<'a>(params: &'a mut SystemParameters, field: &str) -> Result<Slot<'a>> {
    Ok(match field {
        "supply_voltage_v" => Slot::Count(&mut params.supply_voltage_v),
        "phase" => Slot::Text(&mut params.phase),
        "frequency_hz" => Slot::Count(&mut params.frequency_hz),
        "earthing_system" => Slot::Text(&mut params.earthing_system),
        "fault_level_ka" => Slot::Number(&mut params.fault_level_ka),
        _ => return Err(unknown("system parameters", field)),
    })
}

/// Resolve a path to the field it names
///
/// Entities are never created here, with one exception: system parameters
/// are created empty on first correction since the project holds at most one.
/// Callers that reject the correction afterwards must drop them again.
pub(crate) fn resolve<'a>(project: &'a mut Project, path: &FieldPath) -> Result<Slot<'a>> {
    match path {
        FieldPath::Board { block, board, field } => {
            let block = project.block_mut(block).ok_or_else(|| not_found("block", block))?;
            let board = block.board_mut(board).ok_or_else(|| not_found("board", board))?;
            board_slot(board, field)
        }
        FieldPath::Circuit {
            block,
            board,
            circuit,
            field,
        } => {
            let block = project.block_mut(block).ok_or_else(|| not_found("block", block))?;
            let board = block.board_mut(board).ok_or_else(|| not_found("board", board))?;
            let circuit = board
                .circuit_mut(circuit)
                .ok_or_else(|| not_found("circuit", circuit))?;
            circuit_slot(circuit, field)
        }
        FieldPath::Room { block, room, field } => {
            let block = project.block_mut(block).ok_or_else(|| not_found("block", block))?;
            let room = block.room_mut(room).ok_or_else(|| not_found("room", room))?;
            room_slot(room, field)
        }
        FieldPath::Fixture { block, room, key } => {
            let block = project.block_mut(block).ok_or_else(|| not_found("block", block))?;
            let room = block.room_mut(room).ok_or_else(|| not_found("room", room))?;
            Ok(Slot::Fixture(&mut room.fixtures, key.clone()))
        }
        FieldPath::Equipment { block, name, field } => {
            let block = project.block_mut(block).ok_or_else(|| not_found("block", block))?;
            let item = block
                .equipment_mut(name)
                .ok_or_else(|| not_found("equipment", name))?;
            equipment_slot(item, field)
        }
        FieldPath::CableRun { index, field } => {
            let run = project
                .site_cable_runs
                .get_mut(*index)
                .ok_or_else(|| not_found("cable run", index.to_string()))?;
            cable_run_slot(run, field)
        }
        FieldPath::SupplyPoint { name, field } => {
            let point = project
                .supply_point_mut(name)
                .ok_or_else(|| not_found("supply point", name))?;
            supply_point_slot(point, field)
        }
        FieldPath::SystemParameter { field } => {
            let params = project
                .system_parameters
                .get_or_insert_with(SystemParameters::default);
            system_slot(params, field)
        }
    }
}
