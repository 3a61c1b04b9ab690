//! Merge Engine
//!
//! Folds one typed [`Payload`] into a [`Project`]. Entities are matched by
//! natural key (board, room, equipment and supply point names compared
//! case-insensitively, circuit ids within their board, cable runs by their
//! endpoints); unmatched items are appended.
//!
//! Field writes go through [`Tracked::absorb`] in [`MergeMode::Accumulate`]
//! and [`Tracked::replace`] in [`MergeMode::Replace`]. Neither touches a Manual
//! field. Evidence lists (circuit refs, notes, controlled circuits) are
//! set-unions in both modes.
//!
//! Accumulating the same payload twice leaves the graph exactly as after the
//! first merge.

use crate::payload::{
    confidence_of, fixture_entries, BoardPayload, CableRunPayload, CircuitPayload,
    EquipmentPayload, Payload, PayloadKind, RoomPayload, RoomsPayload, SitePayload, SldPayload,
    SupplyPointPayload, SystemParametersPayload,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use takeoff_domain::{
    names_match, union_into, BuildingBlock, Circuit, Confidence, DistributionBoard,
    FixtureCounts, HeavyEquipment, Project, Room, SiteCableRun, SupplyPoint, SystemParameters,
    Tracked, Truthy, DEFAULT_BLOCK_NAME,
};
use tracing::{debug, warn};

/// How scalar fields are overwritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Initial extraction: truthy overwrite
    #[default]
    Accumulate,
    /// Verification: any present value wins, Manual fields excepted
    Replace,
}

/// What a merge did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MergeReport {
    pub blocks_created: usize,
    pub boards_created: usize,
    pub boards_updated: usize,
    pub circuits_created: usize,
    pub circuits_updated: usize,
    pub rooms_created: usize,
    pub rooms_updated: usize,
    pub equipment_created: usize,
    pub equipment_updated: usize,
    pub cable_runs_created: usize,
    pub cable_runs_updated: usize,
    pub supply_points_created: usize,
    pub supply_points_updated: usize,

    /// Entity records carried by the merged payloads
    pub payload_entities: usize,

    /// Field values, tiers and list entries that actually changed
    pub fields_changed: usize,

    /// Items dropped for lack of a natural key
    pub skipped: usize,

    /// Ambiguities and skipped items, in order
    pub warnings: Vec<String>,
}

impl MergeReport {
    /// Entities appended to the graph
    pub fn entities_created(&self) -> usize {
        self.blocks_created
            + self.boards_created
            + self.circuits_created
            + self.rooms_created
            + self.equipment_created
            + self.cable_runs_created
            + self.supply_points_created
    }

    /// Entities created or matched
    pub fn entities_touched(&self) -> usize {
        self.entities_created() - self.blocks_created
            + self.boards_updated
            + self.circuits_updated
            + self.rooms_updated
            + self.equipment_updated
            + self.cable_runs_updated
            + self.supply_points_updated
    }

    /// Fold another report into this one
    pub fn combine(&mut self, other: MergeReport) {
        self.blocks_created += other.blocks_created;
        self.boards_created += other.boards_created;
        self.boards_updated += other.boards_updated;
        self.circuits_created += other.circuits_created;
        self.circuits_updated += other.circuits_updated;
        self.rooms_created += other.rooms_created;
        self.rooms_updated += other.rooms_updated;
        self.equipment_created += other.equipment_created;
        self.equipment_updated += other.equipment_updated;
        self.cable_runs_created += other.cable_runs_created;
        self.cable_runs_updated += other.cable_runs_updated;
        self.supply_points_created += other.supply_points_created;
        self.supply_points_updated += other.supply_points_updated;
        self.payload_entities += other.payload_entities;
        self.fields_changed += other.fields_changed;
        self.skipped += other.skipped;
        self.warnings.extend(other.warnings);
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    fn skip(&mut self, message: String) {
        self.skipped += 1;
        self.warn(message);
    }
}

/// Folds payloads into a project under one [`MergeMode`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeEngine {
    mode: MergeMode,
}

impl MergeEngine {
    /// Create an engine with the given mode
    pub fn new(mode: MergeMode) -> Self {
        Self { mode }
    }

    /// Engine for initial extraction
    pub fn accumulate() -> Self {
        Self::new(MergeMode::Accumulate)
    }

    /// Engine for verification passes
    pub fn replace() -> Self {
        Self::new(MergeMode::Replace)
    }

    /// Configured mode
    pub fn mode(&self) -> MergeMode {
        self.mode
    }

    /// Merge one payload into the project
    pub fn merge(&self, payload: &Payload, project: &mut Project) -> MergeReport {
        let mut report = MergeReport::default();
        let mut writer = Writer::new(self.mode);

        match payload {
            Payload::Sld(sld) => merge_sld(sld, project, &mut writer, &mut report),
            Payload::Lighting(rooms) => {
                merge_rooms(PayloadKind::Lighting, rooms, project, &mut writer, &mut report)
            }
            Payload::Plugs(rooms) => {
                merge_rooms(PayloadKind::Plugs, rooms, project, &mut writer, &mut report)
            }
            Payload::Combined(rooms) => {
                merge_rooms(PayloadKind::Combined, rooms, project, &mut writer, &mut report)
            }
            Payload::Site(site) => merge_site(site, project, &mut writer, &mut report),
        }

        report.fields_changed = writer.changed;
        report.payload_entities = payload.entity_count();
        debug!(
            kind = %payload.kind(),
            mode = ?self.mode,
            created = report.entities_created(),
            fields_changed = report.fields_changed,
            "Merged payload"
        );
        report
    }
}

/// Accumulating merge of one payload
pub fn merge(payload: &Payload, project: &mut Project) -> MergeReport {
    MergeEngine::accumulate().merge(payload, project)
}

/// Applies field writes under a mode and counts what changed
struct Writer {
    mode: MergeMode,
    changed: usize,
}

impl Writer {
    fn new(mode: MergeMode) -> Self {
        Self { mode, changed: 0 }
    }

    fn put<T: Truthy + PartialEq>(
        &mut self,
        field: &mut Tracked<T>,
        candidate: Option<T>,
        confidence: Confidence,
    ) {
        let changed = match self.mode {
            MergeMode::Accumulate => field.absorb(candidate, confidence),
            MergeMode::Replace => field.replace(candidate, confidence),
        };
        if changed {
            self.changed += 1;
        }
    }

    fn put_text(&mut self, field: &mut Tracked<String>, candidate: &Option<String>, confidence: Confidence) {
        self.put(field, candidate.clone(), confidence);
    }

    fn union(&mut self, target: &mut Vec<String>, incoming: &[String]) {
        self.changed += union_into(target, incoming.iter().cloned());
    }

    /// Item-level tier: only an explicit label changes it, never over Manual
    fn item_confidence(&mut self, current: &mut Confidence, incoming: Option<Confidence>) {
        if current.is_manual() {
            return;
        }
        if let Some(confidence) = incoming {
            if *current != confidence {
                *current = confidence;
                self.changed += 1;
            }
        }
    }

    fn fixtures(&mut self, counts: &mut FixtureCounts, map: &Map<String, Value>, fallback: Confidence) {
        for entry in fixture_entries(map) {
            let confidence = entry.confidence.unwrap_or(fallback);
            let changed = match self.mode {
                MergeMode::Accumulate => counts.absorb(&entry.key, entry.count, confidence),
                MergeMode::Replace => counts.replace(&entry.key, entry.count, confidence),
            };
            if changed {
                self.changed += 1;
            }
        }
    }
}

fn natural_key(name: &Option<String>) -> Option<&str> {
    name.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Find an item by key or append a new one; the flag is true when created
fn find_or_insert<T>(
    items: &mut Vec<T>,
    matches: impl Fn(&T) -> bool,
    create: impl FnOnce() -> T,
) -> (&mut T, bool) {
    match items.iter().position(matches) {
        Some(idx) => (&mut items[idx], false),
        None => {
            items.push(create());
            let last = items.len() - 1;
            (&mut items[last], true)
        }
    }
}

/// Pick the block a payload's block-level items go to
///
/// A case-insensitive name match wins. Otherwise the first block is used, or
/// a block is created when the project has none.
fn resolve_block<'a>(
    project: &'a mut Project,
    declared: Option<&str>,
    kind: PayloadKind,
    report: &mut MergeReport,
) -> &'a mut BuildingBlock {
    let declared = declared.map(str::trim).filter(|s| !s.is_empty());

    if let Some(name) = declared {
        if let Some(idx) = project
            .building_blocks
            .iter()
            .position(|b| names_match(&b.name, name))
        {
            return &mut project.building_blocks[idx];
        }
    }

    if project.building_blocks.is_empty() {
        let name = declared.unwrap_or(DEFAULT_BLOCK_NAME);
        debug!(block = %name, "Creating building block");
        project.building_blocks.push(BuildingBlock::new(name));
        report.blocks_created += 1;
    } else {
        let first = project.building_blocks[0].name.clone();
        match declared {
            Some(name) => report.warn(format!(
                "{} payload names unknown block '{}'; assigned to '{}'",
                kind, name, first
            )),
            None if project.building_blocks.len() > 1 => report.warn(format!(
                "{} payload names no block; assigned to '{}' of {} blocks",
                kind,
                first,
                project.building_blocks.len()
            )),
            None => {}
        }
    }

    &mut project.building_blocks[0]
}

fn merge_sld(sld: &SldPayload, project: &mut Project, w: &mut Writer, report: &mut MergeReport) {
    if !sld.distribution_boards.is_empty() || !sld.heavy_equipment.is_empty() {
        let block = resolve_block(project, sld.building_block.as_deref(), PayloadKind::Sld, report);
        for board in &sld.distribution_boards {
            merge_board(block, board, w, report);
        }
        for equipment in &sld.heavy_equipment {
            merge_equipment(block, equipment, w, report);
        }
    }

    for supply in &sld.supply_points {
        merge_supply_point(project, supply, w, report);
    }

    if let Some(params) = &sld.system_parameters {
        let target = project
            .system_parameters
            .get_or_insert_with(SystemParameters::default);
        merge_system_parameters(target, params, w);
    }
}

fn merge_board(block: &mut BuildingBlock, bp: &BoardPayload, w: &mut Writer, report: &mut MergeReport) {
    let Some(name) = natural_key(&bp.name) else {
        report.skip(format!(
            "sld: distribution board without a name skipped in block '{}'",
            block.name
        ));
        return;
    };

    let (board, created) = find_or_insert(
        &mut block.distribution_boards,
        |b| names_match(&b.name, name),
        || DistributionBoard::new(name),
    );
    if created {
        report.boards_created += 1;
    } else {
        report.boards_updated += 1;
    }

    let incoming = confidence_of(&bp.confidence);
    w.item_confidence(&mut board.confidence, incoming);
    let c = incoming.unwrap_or_default();

    w.put_text(&mut board.description, &bp.description, c);
    w.put_text(&mut board.location, &bp.location, c);
    w.put_text(&mut board.supply_from, &bp.supply_from, c);
    w.put_text(&mut board.supply_cable, &bp.supply_cable, c);
    w.put(&mut board.supply_cable_size_mm2, bp.supply_cable_size_mm2, c);
    w.put(&mut board.supply_cable_length_m, bp.supply_cable_length_m, c);
    w.put(&mut board.main_breaker_a, bp.main_breaker_a, c);
    w.put_text(&mut board.main_breaker_type, &bp.main_breaker_type, c);
    w.put(&mut board.earth_leakage, bp.earth_leakage, c);
    w.put(&mut board.earth_leakage_rating_a, bp.earth_leakage_rating_a, c);
    w.put(&mut board.surge_protection, bp.surge_protection, c);
    w.put(&mut board.spare_ways, bp.spare_ways, c);
    w.put_text(&mut board.phase, &bp.phase, c);
    w.put(&mut board.voltage_v, bp.voltage_v, c);
    w.put(&mut board.fault_level_ka, bp.fault_level_ka, c);

    for cp in &bp.circuits {
        merge_circuit(board, cp, w, report);
    }
}

fn merge_circuit(
    board: &mut DistributionBoard,
    cp: &CircuitPayload,
    w: &mut Writer,
    report: &mut MergeReport,
) {
    let Some(id) = natural_key(&cp.id) else {
        report.skip(format!(
            "sld: circuit without an id skipped on board '{}'",
            board.name
        ));
        return;
    };

    let (circuit, created) = find_or_insert(
        &mut board.circuits,
        |c| names_match(&c.id, id),
        || Circuit::new(id),
    );
    if created {
        report.circuits_created += 1;
    } else {
        report.circuits_updated += 1;
    }

    let incoming = confidence_of(&cp.confidence);
    w.item_confidence(&mut circuit.confidence, incoming);
    let c = incoming.unwrap_or_default();

    w.put_text(&mut circuit.circuit_type, &cp.circuit_type, c);
    w.put_text(&mut circuit.description, &cp.description, c);
    w.put(&mut circuit.wattage_w, cp.wattage_w, c);
    w.put_text(&mut circuit.wattage_formula, &cp.wattage_formula, c);
    w.put(&mut circuit.cable_size_mm2, cp.cable_size_mm2, c);
    w.put(&mut circuit.cable_cores, cp.cable_cores, c);
    w.put_text(&mut circuit.cable_type, &cp.cable_type, c);
    w.put(&mut circuit.breaker_a, cp.breaker_a, c);
    w.put(&mut circuit.breaker_poles, cp.breaker_poles, c);
    w.put(&mut circuit.num_points, cp.num_points, c);
    w.put(&mut circuit.is_spare, cp.is_spare, c);
    w.put(&mut circuit.has_vsd, cp.has_vsd, c);
    w.put(&mut circuit.has_isolator, cp.has_isolator, c);
    w.put(&mut circuit.isolator_rating_a, cp.isolator_rating_a, c);
    w.put(&mut circuit.has_overload_relay, cp.has_overload_relay, c);
    w.put_text(&mut circuit.feeds_board, &cp.feeds_board, c);
    w.union(&mut circuit.controlled_circuits, &cp.controlled_circuits);
}

fn merge_equipment(
    block: &mut BuildingBlock,
    ep: &EquipmentPayload,
    w: &mut Writer,
    report: &mut MergeReport,
) {
    let Some(name) = natural_key(&ep.name) else {
        report.skip(format!(
            "sld: heavy equipment without a name skipped in block '{}'",
            block.name
        ));
        return;
    };

    let (equipment, created) = find_or_insert(
        &mut block.heavy_equipment,
        |e| names_match(&e.name, name),
        || HeavyEquipment::new(name),
    );
    if created {
        report.equipment_created += 1;
    } else {
        report.equipment_updated += 1;
    }

    let incoming = confidence_of(&ep.confidence);
    w.item_confidence(&mut equipment.confidence, incoming);
    let c = incoming.unwrap_or_default();

    w.put_text(&mut equipment.equipment_type, &ep.equipment_type, c);
    w.put(&mut equipment.rating_kw, ep.rating_kw, c);
    w.put(&mut equipment.cable_size_mm2, ep.cable_size_mm2, c);
    w.put_text(&mut equipment.cable_type, &ep.cable_type, c);
    w.put(&mut equipment.breaker_a, ep.breaker_a, c);
    w.put(&mut equipment.has_vsd, ep.has_vsd, c);
    w.put(&mut equipment.has_dol, ep.has_dol, c);
    w.put(&mut equipment.isolator_a, ep.isolator_a, c);
    w.put_text(&mut equipment.fed_from_db, &ep.fed_from_db, c);
    w.put(&mut equipment.qty, ep.qty, c);
}

fn merge_supply_point(
    project: &mut Project,
    sp: &SupplyPointPayload,
    w: &mut Writer,
    report: &mut MergeReport,
) {
    let Some(name) = natural_key(&sp.name) else {
        report.skip("sld: supply point without a name skipped".to_string());
        return;
    };

    let (supply, created) = find_or_insert(
        &mut project.supply_points,
        |s| names_match(&s.name, name),
        || SupplyPoint::new(name),
    );
    if created {
        report.supply_points_created += 1;
    } else {
        report.supply_points_updated += 1;
    }

    let incoming = confidence_of(&sp.confidence);
    w.item_confidence(&mut supply.confidence, incoming);
    let c = incoming.unwrap_or_default();

    w.put_text(&mut supply.supply_type, &sp.supply_type, c);
    w.put(&mut supply.voltage_v, sp.voltage_v, c);
    w.put(&mut supply.capacity_kva, sp.capacity_kva, c);
    w.put_text(&mut supply.phase, &sp.phase, c);
    w.put_text(&mut supply.location, &sp.location, c);
}

fn merge_system_parameters(
    params: &mut SystemParameters,
    pp: &SystemParametersPayload,
    w: &mut Writer,
) {
    let c = confidence_of(&pp.confidence).unwrap_or_default();
    w.put(&mut params.supply_voltage_v, pp.supply_voltage_v, c);
    w.put_text(&mut params.phase, &pp.phase, c);
    w.put(&mut params.frequency_hz, pp.frequency_hz, c);
    w.put_text(&mut params.earthing_system, &pp.earthing_system, c);
    w.put(&mut params.fault_level_ka, pp.fault_level_ka, c);
}

fn merge_rooms(
    kind: PayloadKind,
    payload: &RoomsPayload,
    project: &mut Project,
    w: &mut Writer,
    report: &mut MergeReport,
) {
    if payload.rooms.is_empty() {
        return;
    }
    let block = resolve_block(project, payload.building_block.as_deref(), kind, report);
    for room in &payload.rooms {
        merge_room(kind, block, room, w, report);
    }
}

fn merge_room(
    kind: PayloadKind,
    block: &mut BuildingBlock,
    rp: &RoomPayload,
    w: &mut Writer,
    report: &mut MergeReport,
) {
    let Some(name) = natural_key(&rp.name) else {
        report.skip(format!(
            "{}: room without a name skipped in block '{}'",
            kind, block.name
        ));
        return;
    };

    let (room, created) = find_or_insert(
        &mut block.rooms,
        |r| names_match(&r.name, name),
        || Room::new(name),
    );
    if created {
        report.rooms_created += 1;
    } else {
        report.rooms_updated += 1;
    }

    let incoming = confidence_of(&rp.confidence);
    w.item_confidence(&mut room.confidence, incoming);
    let c = incoming.unwrap_or_default();

    w.put(&mut room.room_number, rp.room_number, c);
    w.put_text(&mut room.room_type, &rp.room_type, c);
    w.put(&mut room.area_m2, rp.area_m2, c);
    w.put_text(&mut room.floor, &rp.floor, c);
    w.put(&mut room.is_wet_area, rp.is_wet_area, c);
    w.put(&mut room.has_ac, rp.has_ac, c);
    w.put(&mut room.has_geyser, rp.has_geyser, c);
    w.union(&mut room.circuit_refs, &rp.circuit_refs);
    w.union(&mut room.notes, &rp.notes);
    w.fixtures(&mut room.fixtures, &rp.fixtures, c);
}

fn merge_site(site: &SitePayload, project: &mut Project, w: &mut Writer, report: &mut MergeReport) {
    for run in &site.site_cable_runs {
        merge_cable_run(project, run, w, report);
    }

    if !fixture_entries(&site.outside_lights).is_empty() {
        let counts = project.outside_lights.get_or_insert_with(FixtureCounts::new);
        w.fixtures(counts, &site.outside_lights, Confidence::Estimated);
    }
}

fn merge_cable_run(
    project: &mut Project,
    rp: &CableRunPayload,
    w: &mut Writer,
    report: &mut MergeReport,
) {
    let (Some(from), Some(to)) = (natural_key(&rp.from_point), natural_key(&rp.to_point)) else {
        report.skip("site: cable run without both endpoints skipped".to_string());
        return;
    };

    let (run, created) = find_or_insert(
        &mut project.site_cable_runs,
        |r| r.connects(from, to),
        || SiteCableRun::new(from, to),
    );
    if created {
        report.cable_runs_created += 1;
    } else {
        report.cable_runs_updated += 1;
    }

    let incoming = confidence_of(&rp.confidence);
    w.item_confidence(&mut run.confidence, incoming);
    let c = incoming.unwrap_or_default();
    let length_c = confidence_of(&rp.length_confidence).unwrap_or(c);

    w.put_text(&mut run.cable_spec, &rp.cable_spec, c);
    w.put(&mut run.cable_size_mm2, rp.cable_size_mm2, c);
    w.put(&mut run.cable_cores, rp.cable_cores, c);
    w.put_text(&mut run.cable_type, &rp.cable_type, c);
    w.put(&mut run.length_m, rp.length_m, length_c);
    w.put(&mut run.is_underground, rp.is_underground, c);
    w.put(&mut run.needs_trenching, rp.needs_trenching, c);
    w.put_text(&mut run.notes, &rp.notes, c);
}
