//! Board with hex grid, terrain, elevation and buildings
//!
//! The resolution pipeline reads the board through [`BoardView`]; only the
//! board owner mutates it, and every mutation is recorded as a
//! [`BoardChange`] for hosts that cache derived data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::board::hex::HexCoord;
use crate::board::terrain::{Building, Terrain};

/// A single hex on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hex {
    pub coord: HexCoord,
    pub terrain: Terrain,
    pub elevation: i32,
    pub water_depth: i32,
    pub smoke: bool,
    pub burning: bool,
    pub building: Option<Building>,
}

impl Hex {
    pub fn new(coord: HexCoord, terrain: Terrain) -> Self {
        Self {
            coord,
            terrain,
            elevation: 0,
            water_depth: 0,
            smoke: false,
            burning: false,
            building: None,
        }
    }

    /// Height of whatever stands in the hex above its elevation
    pub fn feature_height(&self) -> i32 {
        match (&self.building, self.terrain) {
            (Some(building), _) if !building.is_collapsed() => building.height,
            (_, Terrain::LightWoods) | (_, Terrain::HeavyWoods) => 2,
            _ => 0,
        }
    }

    /// Absolute height of the hex's top surface
    pub fn ceiling(&self) -> i32 {
        self.elevation + self.feature_height()
    }

    pub fn has_standing_building(&self) -> bool {
        self.building.as_ref().is_some_and(|b| !b.is_collapsed())
    }
}

/// Notification that board state changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardChange {
    Hex(HexCoord),
    Whole,
}

/// Read-only board queries used by modifier and line-of-sight evaluation
pub trait BoardView {
    fn hex(&self, coord: HexCoord) -> Option<&Hex>;

    fn contains(&self, coord: HexCoord) -> bool {
        self.hex(coord).is_some()
    }

    fn elevation(&self, coord: HexCoord) -> i32 {
        self.hex(coord).map(|h| h.elevation).unwrap_or(0)
    }

    fn terrain(&self, coord: HexCoord) -> Terrain {
        self.hex(coord).map(|h| h.terrain).unwrap_or_default()
    }

    fn water_depth(&self, coord: HexCoord) -> i32 {
        self.hex(coord).map(|h| h.water_depth).unwrap_or(0)
    }

    fn building_at(&self, coord: HexCoord) -> Option<&Building> {
        self.hex(coord)
            .and_then(|h| h.building.as_ref())
            .filter(|b| !b.is_collapsed())
    }
}

/// The full board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    hexes: HashMap<HexCoord, Hex>,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    changes: Vec<BoardChange>,
}

impl Board {
    /// Create a new board of clear terrain
    pub fn new(width: u32, height: u32) -> Self {
        let mut hexes = HashMap::new();

        for q in 0..width as i32 {
            for r in 0..height as i32 {
                let coord = HexCoord::new(q, r);
                hexes.insert(coord, Hex::new(coord, Terrain::Clear));
            }
        }

        Self {
            hexes,
            width,
            height,
            changes: Vec::new(),
        }
    }

    fn hex_mut(&mut self, coord: HexCoord) -> Option<&mut Hex> {
        let hex = self.hexes.get_mut(&coord)?;
        self.changes.push(BoardChange::Hex(coord));
        Some(hex)
    }

    pub fn set_terrain(&mut self, coord: HexCoord, terrain: Terrain) {
        if let Some(hex) = self.hex_mut(coord) {
            hex.terrain = terrain;
        }
    }

    pub fn set_elevation(&mut self, coord: HexCoord, elevation: i32) {
        if let Some(hex) = self.hex_mut(coord) {
            hex.elevation = elevation;
        }
    }

    /// Flood a hex; depth 0 drains it back to clear
    pub fn set_water(&mut self, coord: HexCoord, depth: i32) {
        if let Some(hex) = self.hex_mut(coord) {
            hex.water_depth = depth.max(0);
            hex.terrain = if depth > 0 { Terrain::Water } else { Terrain::Clear };
        }
    }

    pub fn set_smoke(&mut self, coord: HexCoord, smoke: bool) {
        if let Some(hex) = self.hex_mut(coord) {
            hex.smoke = smoke;
        }
    }

    pub fn place_building(&mut self, coord: HexCoord, building: Building) {
        if let Some(hex) = self.hex_mut(coord) {
            hex.terrain = Terrain::Building;
            hex.building = Some(building);
        }
    }

    /// Damage the building in a hex. Returns `Some(collapsed)` if there was one.
    pub fn damage_building(&mut self, coord: HexCoord, amount: i32) -> Option<bool> {
        let hex = self.hex_mut(coord)?;
        let building = hex.building.as_mut()?;
        let collapsed = building.take_damage(amount);
        if collapsed {
            hex.terrain = Terrain::Rubble;
        }
        Some(collapsed)
    }

    /// Set a hex alight. Returns false if its terrain cannot burn.
    pub fn ignite(&mut self, coord: HexCoord) -> bool {
        if !self.hex(coord).is_some_and(|h| h.terrain.ignitable()) {
            return false;
        }
        if let Some(hex) = self.hex_mut(coord) {
            hex.burning = true;
        }
        true
    }

    /// Reduce woods one step (heavy to light, light to rough)
    pub fn clear_woods(&mut self, coord: HexCoord) {
        if let Some(hex) = self.hex_mut(coord) {
            hex.terrain = match hex.terrain {
                Terrain::HeavyWoods => Terrain::LightWoods,
                Terrain::LightWoods => Terrain::Rough,
                other => other,
            };
        }
    }

    /// Replace every hex at once (e.g. loading a new map)
    pub fn reset(&mut self, hexes: impl IntoIterator<Item = Hex>) {
        self.hexes = hexes.into_iter().map(|h| (h.coord, h)).collect();
        self.changes.push(BoardChange::Whole);
    }

    /// Drain the change notifications recorded since the last call
    pub fn take_changes(&mut self) -> Vec<BoardChange> {
        std::mem::take(&mut self.changes)
    }
}

impl BoardView for Board {
    fn hex(&self, coord: HexCoord) -> Option<&Hex> {
        self.hexes.get(&coord)
    }
}
