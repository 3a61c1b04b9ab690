//! Project module - the root of the entity graph
//!
//! The graph is a plain owned tree: a [`Project`] owns its building blocks, which
//! own their boards, rooms and equipment. Entities are created the first time a
//! payload mentions them and mutated in place afterwards; there is no partial
//! deletion.

use crate::board::DistributionBoard;
use crate::fixtures::FixtureCounts;
use crate::room::Room;
use crate::site::{HeavyEquipment, SiteCableRun, SupplyPoint, SystemParameters};
use serde::{Deserialize, Serialize};

/// Name used for a block created from a payload that names none
pub const DEFAULT_BLOCK_NAME: &str = "Main Building";

/// Case-insensitive, whitespace-trimmed name comparison
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// One distinct building or section within a project
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildingBlock {
    /// Block name, matched case-insensitively
    pub name: String,

    /// Boards in this block
    #[serde(default)]
    pub distribution_boards: Vec<DistributionBoard>,

    /// Rooms in this block
    #[serde(default)]
    pub rooms: Vec<Room>,

    /// Heavy equipment in this block
    #[serde(default)]
    pub heavy_equipment: Vec<HeavyEquipment>,
}

impl BuildingBlock {
    /// Create an empty block
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Board by name
    pub fn board(&self, name: &str) -> Option<&DistributionBoard> {
        self.distribution_boards
            .iter()
            .find(|b| names_match(&b.name, name))
    }

    /// Mutable board by name
    pub fn board_mut(&mut self, name: &str) -> Option<&mut DistributionBoard> {
        self.distribution_boards
            .iter_mut()
            .find(|b| names_match(&b.name, name))
    }

    /// Room by name
    pub fn room(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| names_match(&r.name, name))
    }

    /// Mutable room by name
    pub fn room_mut(&mut self, name: &str) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| names_match(&r.name, name))
    }

    /// Mutable equipment by name
    pub fn equipment_mut(&mut self, name: &str) -> Option<&mut HeavyEquipment> {
        self.heavy_equipment
            .iter_mut()
            .find(|e| names_match(&e.name, name))
    }

    /// Scheduled circuits across all boards
    pub fn total_circuits(&self) -> usize {
        self.distribution_boards.iter().map(|b| b.circuits.len()).sum()
    }

    /// Declared points across all boards
    pub fn total_points(&self) -> u32 {
        self.distribution_boards
            .iter()
            .map(|b| b.total_points())
            .fold(0, u32::saturating_add)
    }

    /// Whether any circuit in the block mentions the load in its type or description
    pub fn has_dedicated_circuit(&self, load: &str) -> bool {
        self.distribution_boards
            .iter()
            .flat_map(|b| b.circuits.iter())
            .any(|c| c.references_load(load))
    }
}

/// Root of the entity graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Project {
    /// Project name (informational)
    #[serde(default)]
    pub name: String,

    /// Building blocks in discovery order
    #[serde(default)]
    pub building_blocks: Vec<BuildingBlock>,

    /// Site cable runs
    #[serde(default)]
    pub site_cable_runs: Vec<SiteCableRun>,

    /// Installation-wide parameters, once any are known
    #[serde(default)]
    pub system_parameters: Option<SystemParameters>,

    /// Incoming supplies
    #[serde(default)]
    pub supply_points: Vec<SupplyPoint>,

    /// External luminaires from site drawings
    #[serde(default)]
    pub outside_lights: Option<FixtureCounts>,

    /// Pages submitted for extraction
    #[serde(default)]
    pub pages_processed: u32,

    /// Pages whose extraction yielded at least one entity
    #[serde(default)]
    pub pages_with_data: u32,
}

impl Project {
    /// Create an empty project
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a project with block names known up front (e.g. from a drawing register)
    pub fn with_blocks<I, S>(name: impl Into<String>, blocks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut project = Self::new(name);
        for block in blocks {
            let block = block.into();
            if !block.trim().is_empty() && project.block(&block).is_none() {
                project.building_blocks.push(BuildingBlock::new(block));
            }
        }
        project
    }

    /// Block by name
    pub fn block(&self, name: &str) -> Option<&BuildingBlock> {
        self.building_blocks.iter().find(|b| names_match(&b.name, name))
    }

    /// Mutable block by name
    pub fn block_mut(&mut self, name: &str) -> Option<&mut BuildingBlock> {
        self.building_blocks
            .iter_mut()
            .find(|b| names_match(&b.name, name))
    }

    /// Supply point by name
    pub fn supply_point_mut(&mut self, name: &str) -> Option<&mut SupplyPoint> {
        self.supply_points
            .iter_mut()
            .find(|s| names_match(&s.name, name))
    }

    /// Cable run by endpoints
    pub fn cable_run_mut(&mut self, from_point: &str, to_point: &str) -> Option<&mut SiteCableRun> {
        self.site_cable_runs
            .iter_mut()
            .find(|r| r.connects(from_point, to_point))
    }

    /// Fraction of processed pages that yielded data (0 when nothing was processed)
    pub fn completeness(&self) -> f64 {
        if self.pages_processed == 0 {
            return 0.0;
        }
        (self.pages_with_data as f64 / self.pages_processed as f64).min(1.0)
    }

    /// All boards paired with their block
    pub fn boards(&self) -> impl Iterator<Item = (&BuildingBlock, &DistributionBoard)> {
        self.building_blocks
            .iter()
            .flat_map(|block| block.distribution_boards.iter().map(move |b| (block, b)))
    }

    /// All rooms paired with their block
    pub fn rooms(&self) -> impl Iterator<Item = (&BuildingBlock, &Room)> {
        self.building_blocks
            .iter()
            .flat_map(|block| block.rooms.iter().map(move |r| (block, r)))
    }

    /// Total scheduled circuits
    pub fn total_circuits(&self) -> usize {
        self.building_blocks.iter().map(|b| b.total_circuits()).sum()
    }

    /// Whether the graph holds no entities at all
    pub fn is_empty(&self) -> bool {
        self.building_blocks.iter().all(|b| {
            b.distribution_boards.is_empty() && b.rooms.is_empty() && b.heavy_equipment.is_empty()
        }) && self.site_cable_runs.is_empty()
            && self.supply_points.is_empty()
            && self.system_parameters.is_none()
            && self.outside_lights.as_ref().map_or(true, |f| f.is_empty())
    }
}
