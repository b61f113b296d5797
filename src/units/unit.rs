//! Combat units and their weapons

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::hex::{Facing, FiringArc, HexCoord};
use crate::board::los::Viewpoint;
use crate::board::map::BoardView;
use crate::core::types::{PlayerId, UnitId, WeaponId};
use crate::units::combat_state::CombatState;
use crate::units::locations::Location;

/// Broad unit category; decides hit tables, height and legal attacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    Mech,
    Vehicle,
    Infantry,
    BattleArmor,
    ProtoMech,
    GunEmplacement,
}

impl UnitClass {
    /// Levels the unit stands above its hex
    pub fn height(&self) -> i32 {
        match self {
            UnitClass::Mech => 1,
            _ => 0,
        }
    }

    /// Can this unit make limb-based physical attacks (punch, kick, charge)?
    pub fn has_limbs(&self) -> bool {
        matches!(self, UnitClass::Mech)
    }

    pub fn is_mobile(&self) -> bool {
        !matches!(self, UnitClass::GunEmplacement)
    }
}

/// How a unit moved this round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MovementMode {
    #[default]
    Stationary,
    Walked,
    Ran,
    Jumped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Movement {
    pub mode: MovementMode,
    pub hexes_moved: u32,
}

impl Movement {
    pub fn new(mode: MovementMode, hexes_moved: u32) -> Self {
        Self { mode, hexes_moved }
    }

    /// Penalty the mover suffers on its own attacks
    pub fn attacker_modifier(&self) -> i32 {
        match self.mode {
            MovementMode::Stationary => 0,
            MovementMode::Walked => 1,
            MovementMode::Ran => 2,
            MovementMode::Jumped => 3,
        }
    }

    /// Penalty for attacking the mover, banded by hexes moved
    pub fn target_modifier(&self) -> i32 {
        let band = match self.hexes_moved {
            0..=2 => 0,
            3..=4 => 1,
            5..=6 => 2,
            7..=9 => 3,
            10..=17 => 4,
            18..=24 => 5,
            _ => 6,
        };
        if self.mode == MovementMode::Jumped {
            band + 1
        } else {
            band
        }
    }
}

/// How a weapon resolves its attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponFamily {
    /// One hit for full damage
    Direct,
    /// Rolls on the cluster table; `size` missiles per volley
    Cluster { size: u32 },
    /// Indirect area fire at a hex
    Artillery,
    /// Low damage with a shutdown effect
    Taser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: WeaponId,
    pub name: String,
    pub family: WeaponFamily,
    /// Damage per hit (per missile for cluster weapons)
    pub damage: i32,
    pub min_range: u32,
    pub short_range: u32,
    pub medium_range: u32,
    pub long_range: u32,
    pub arc: FiringArc,
    pub can_ignite: bool,
    pub destroyed: bool,
}

impl Weapon {
    pub fn new(id: WeaponId, name: impl Into<String>, family: WeaponFamily, damage: i32) -> Self {
        Self {
            id,
            name: name.into(),
            family,
            damage,
            min_range: 0,
            short_range: 3,
            medium_range: 6,
            long_range: 9,
            arc: FiringArc::Forward,
            can_ignite: false,
            destroyed: false,
        }
    }

    pub fn with_ranges(mut self, min: u32, short: u32, medium: u32, long: u32) -> Self {
        self.min_range = min;
        self.short_range = short;
        self.medium_range = medium;
        self.long_range = long;
        self
    }

    pub fn with_arc(mut self, arc: FiringArc) -> Self {
        self.arc = arc;
        self
    }

    pub fn igniting(mut self) -> Self {
        self.can_ignite = true;
        self
    }

    /// Medium laser: 5 damage, 3/6/9
    pub fn medium_laser(id: WeaponId) -> Self {
        Self::new(id, "Medium Laser", WeaponFamily::Direct, 5).igniting()
    }

    /// LRM-10: 1 damage per missile, minimum range 6
    pub fn lrm10(id: WeaponId) -> Self {
        Self::new(id, "LRM 10", WeaponFamily::Cluster { size: 10 }, 1).with_ranges(6, 7, 14, 21)
    }

    /// Arrow IV: 20 damage area fire
    pub fn arrow_iv(id: WeaponId) -> Self {
        Self::new(id, "Arrow IV", WeaponFamily::Artillery, 20).with_ranges(0, 30, 60, 90)
    }

    /// Mech taser: 1 damage plus shutdown roll
    pub fn taser(id: WeaponId) -> Self {
        Self::new(id, "Mech Taser", WeaponFamily::Taser, 1).with_ranges(0, 1, 2, 3)
    }
}

/// Design quirks and pilot advantages that adjust to-hit numbers last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quirk {
    ImprovedTargeting,
    PoorTargeting,
    MeleeSpecialist,
    Sniper,
}

/// A combat unit on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub owner: PlayerId,
    pub name: String,
    pub class: UnitClass,
    pub tonnage: u32,

    pub position: HexCoord,
    pub facing: Facing,
    pub movement: Movement,

    pub gunnery: i32,
    pub piloting: i32,

    pub prone: bool,
    pub immobile: bool,
    pub spotting: bool,
    /// Carried inside another unit
    pub carrier: Option<UnitId>,
    /// Battle armor clinging to (swarming) another unit
    pub swarming: Option<UnitId>,
    /// Submerged below the surface at depth
    pub diving: bool,

    pub has_searchlight: bool,
    pub searchlight_on: bool,

    pub weapons: Vec<Weapon>,
    pub quirks: Vec<Quirk>,
    /// Remaining damage capacity per location
    pub locations: BTreeMap<Location, i32>,
    pub destroyed: bool,

    pub combat: CombatState,
}

impl Unit {
    pub fn new(id: UnitId, owner: PlayerId, class: UnitClass, tonnage: u32) -> Self {
        let locations = Location::layout(class)
            .iter()
            .map(|loc| (*loc, loc.default_capacity(class, tonnage)))
            .collect();

        Self {
            id,
            owner,
            name: format!("{class:?} {}", id.0),
            class,
            tonnage,
            position: HexCoord::default(),
            facing: Facing::default(),
            movement: Movement::default(),
            gunnery: 4,
            piloting: 5,
            prone: false,
            immobile: false,
            spotting: false,
            carrier: None,
            swarming: None,
            diving: false,
            has_searchlight: false,
            searchlight_on: false,
            weapons: Vec::new(),
            quirks: Vec::new(),
            locations,
            destroyed: false,
            combat: CombatState::new(),
        }
    }

    pub fn at(mut self, position: HexCoord, facing: Facing) -> Self {
        self.position = position;
        self.facing = facing;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapons.push(weapon);
        self
    }

    pub fn with_quirk(mut self, quirk: Quirk) -> Self {
        self.quirks.push(quirk);
        self
    }

    pub fn with_searchlight(mut self) -> Self {
        self.has_searchlight = true;
        self.searchlight_on = true;
        self
    }

    pub fn has_quirk(&self, quirk: Quirk) -> bool {
        self.quirks.contains(&quirk)
    }

    pub fn weapon(&self, id: WeaponId) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn is_shut_down(&self) -> bool {
        self.combat.taser.is_shut_down()
    }

    /// Immobile for targeting purposes
    pub fn counts_as_immobile(&self) -> bool {
        self.immobile || self.is_shut_down() || !self.class.is_mobile()
    }

    pub fn is_off_board(&self) -> bool {
        self.carrier.is_some()
    }

    pub fn viewpoint(&self) -> Viewpoint {
        Viewpoint::new(self.position, if self.prone { 0 } else { self.class.height() })
    }

    /// Is the given location under water where the unit stands?
    ///
    /// Depth 1 covers a standing mech's legs; depth 2 or more covers it all.
    pub fn location_submerged(&self, board: &dyn BoardView, location: Location) -> bool {
        let depth = board.water_depth(self.position);
        if depth <= 0 {
            return false;
        }
        if depth >= 2 || self.prone || self.class != UnitClass::Mech {
            return true;
        }
        location.is_leg()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map::Board;

    #[test]
    fn test_target_movement_bands() {
        assert_eq!(Movement::new(MovementMode::Walked, 2).target_modifier(), 0);
        assert_eq!(Movement::new(MovementMode::Walked, 4).target_modifier(), 1);
        assert_eq!(Movement::new(MovementMode::Ran, 9).target_modifier(), 3);
        assert_eq!(Movement::new(MovementMode::Jumped, 4).target_modifier(), 2);
        assert_eq!(Movement::new(MovementMode::Ran, 30).target_modifier(), 6);
    }

    #[test]
    fn test_attacker_movement_ordering() {
        let jump = Movement::new(MovementMode::Jumped, 3).attacker_modifier();
        let run = Movement::new(MovementMode::Ran, 3).attacker_modifier();
        let walk = Movement::new(MovementMode::Walked, 3).attacker_modifier();
        assert!(jump > run && run > walk && walk > 0);
    }

    #[test]
    fn test_new_mech_has_full_layout() {
        let mech = Unit::new(UnitId(1), PlayerId(1), UnitClass::Mech, 50);
        assert_eq!(mech.locations.len(), 8);
        assert!(mech.locations.values().all(|capacity| *capacity > 0));
    }

    #[test]
    fn test_submerged_legs_in_shallow_water() {
        let mut board = Board::new(5, 5);
        board.set_water(HexCoord::new(1, 1), 1);
        let mech = Unit::new(UnitId(1), PlayerId(1), UnitClass::Mech, 50)
            .at(HexCoord::new(1, 1), Facing::East);

        assert!(mech.location_submerged(&board, Location::LeftLeg));
        assert!(!mech.location_submerged(&board, Location::LeftArm));

        board.set_water(HexCoord::new(1, 1), 2);
        assert!(mech.location_submerged(&board, Location::LeftArm));
    }

    #[test]
    fn test_prone_unit_is_low() {
        let mut mech = Unit::new(UnitId(1), PlayerId(1), UnitClass::Mech, 50);
        assert_eq!(mech.viewpoint().height, 1);
        mech.prone = true;
        assert_eq!(mech.viewpoint().height, 0);
    }
}
