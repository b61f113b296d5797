//! Terrain types and their combat effects

use serde::{Deserialize, Serialize};

/// Primary terrain type for a board hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Terrain {
    #[default]
    Clear,
    Pavement,
    Rough,
    Rubble,
    LightWoods,
    HeavyWoods,
    /// Depth lives on the hex; depth 0 water is treated as clear
    Water,
    /// A building stands in the hex (see [`Building`])
    Building,
}

impl Terrain {
    /// Woods density counted against line of sight
    pub fn woods_density(&self) -> u32 {
        match self {
            Terrain::LightWoods => 1,
            Terrain::HeavyWoods => 2,
            _ => 0,
        }
    }

    /// Penalty for attacking a unit standing in this terrain
    pub fn target_modifier(&self) -> i32 {
        match self {
            Terrain::LightWoods => 1,
            Terrain::HeavyWoods => 2,
            _ => 0,
        }
    }

    /// Can a weapon set this terrain on fire?
    pub fn ignitable(&self) -> bool {
        matches!(
            self,
            Terrain::LightWoods | Terrain::HeavyWoods | Terrain::Building
        )
    }

    /// Can an intentional clearing attack reduce this terrain?
    pub fn clearable(&self) -> bool {
        matches!(self, Terrain::LightWoods | Terrain::HeavyWoods)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Terrain::Clear => "clear",
            Terrain::Pavement => "pavement",
            Terrain::Rough => "rough",
            Terrain::Rubble => "rubble",
            Terrain::LightWoods => "light woods",
            Terrain::HeavyWoods => "heavy woods",
            Terrain::Water => "water",
            Terrain::Building => "building",
        }
    }
}

/// A structure occupying a hex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub name: String,
    /// Remaining construction factor; the building collapses at zero
    pub construction_factor: i32,
    /// Height in levels above the hex elevation
    pub height: i32,
}

impl Building {
    pub fn new(name: impl Into<String>, construction_factor: i32, height: i32) -> Self {
        Self {
            name: name.into(),
            construction_factor,
            height,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.construction_factor <= 0
    }

    /// Apply damage; returns true if this damage collapsed the building
    pub fn take_damage(&mut self, amount: i32) -> bool {
        let was_standing = !self.is_collapsed();
        self.construction_factor = (self.construction_factor - amount).max(0);
        was_standing && self.is_collapsed()
    }
}
