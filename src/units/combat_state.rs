//! Per-unit transient combat state
//!
//! Fields here carry information resolution needs across actions and
//! rounds. Only the resolution pipeline and the round-boundary hooks mutate
//! them; within a round the flags only ever move from false to true.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::board::hex::HexCoord;
use crate::core::types::WeaponId;

/// Adjust-fire state for one weapon aimed at one hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtilleryAdjustment {
    /// Cumulative to-hit modifier from spotted misses
    Modifier(i32),
    /// The hex has been hit; further shots land automatically
    AutomaticHit,
}

impl Default for ArtilleryAdjustment {
    fn default() -> Self {
        ArtilleryAdjustment::Modifier(0)
    }
}

impl ArtilleryAdjustment {
    pub fn modifier(&self) -> i32 {
        match self {
            ArtilleryAdjustment::Modifier(m) => *m,
            ArtilleryAdjustment::AutomaticHit => 0,
        }
    }
}

/// Artillery modifier memory keyed by weapon and target hex
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ArtilleryEntry>", into = "Vec<ArtilleryEntry>")]
pub struct ArtilleryMemory {
    entries: AHashMap<(WeaponId, HexCoord), ArtilleryAdjustment>,
}

/// Serialized form of one memory entry; JSON maps need string keys
type ArtilleryEntry = ((WeaponId, HexCoord), ArtilleryAdjustment);

impl From<Vec<ArtilleryEntry>> for ArtilleryMemory {
    fn from(entries: Vec<ArtilleryEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

impl From<ArtilleryMemory> for Vec<ArtilleryEntry> {
    fn from(memory: ArtilleryMemory) -> Self {
        let mut entries: Vec<ArtilleryEntry> = memory.entries.into_iter().collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }
}

impl ArtilleryMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the adjustment, creating a zero entry on first access
    pub fn modifier(&mut self, weapon: WeaponId, hex: HexCoord) -> ArtilleryAdjustment {
        *self.entries.entry((weapon, hex)).or_default()
    }

    /// Read without creating an entry
    pub fn peek(&self, weapon: WeaponId, hex: HexCoord) -> Option<ArtilleryAdjustment> {
        self.entries.get(&(weapon, hex)).copied()
    }

    pub fn set(&mut self, weapon: WeaponId, hex: HexCoord, adjustment: ArtilleryAdjustment) {
        self.entries.insert((weapon, hex), adjustment);
    }

    pub fn contains(&self, weapon: WeaponId, hex: HexCoord) -> bool {
        self.entries.contains_key(&(weapon, hex))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchlightState {
    /// The unit has swept its searchlight this round
    pub used_this_turn: bool,
    /// The unit is lit by someone's searchlight this round
    pub illuminated: bool,
}

impl SearchlightState {
    pub fn mark_used(&mut self) {
        self.used_this_turn = true;
    }

    pub fn illuminate(&mut self) {
        self.illuminated = true;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Lingering taser effects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaserState {
    /// Rounds the unit remains shut down
    pub shutdown_rounds: u32,
    /// Rounds the interference penalty remains
    pub interference_rounds: u32,
    /// To-hit and piloting penalty while interference lasts
    pub interference_modifier: i32,
}

impl TaserState {
    /// Longer effects win over shorter ones; they never stack
    pub fn apply_shutdown(&mut self, rounds: u32) {
        self.shutdown_rounds = self.shutdown_rounds.max(rounds);
    }

    pub fn apply_interference(&mut self, rounds: u32, modifier: i32) {
        self.interference_rounds = self.interference_rounds.max(rounds);
        self.interference_modifier = self.interference_modifier.max(modifier);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown_rounds > 0
    }

    /// Current penalty, zero once expired
    pub fn interference(&self) -> i32 {
        if self.interference_rounds > 0 {
            self.interference_modifier
        } else {
            0
        }
    }

    fn tick(&mut self) {
        self.shutdown_rounds = self.shutdown_rounds.saturating_sub(1);
        self.interference_rounds = self.interference_rounds.saturating_sub(1);
        if self.interference_rounds == 0 {
            self.interference_modifier = 0;
        }
    }
}

/// All transient combat state owned by one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    pub artillery: ArtilleryMemory,
    pub searchlight: SearchlightState,
    pub taser: TaserState,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Round boundary: clear searchlight flags and count down taser effects
    pub fn end_of_round(&mut self) {
        self.searchlight.reset();
        self.taser.tick();
    }
}
