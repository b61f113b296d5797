//! Hit locations and the tables that pick them
//!
//! Which location a hit lands on depends on the unit's internal layout, so
//! the lookup lives with the unit model rather than with attack logic.

use serde::{Deserialize, Serialize};

use crate::combat::to_hit::{HitTable, SideTable};
use crate::units::unit::UnitClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    // Mech and ProtoMech
    Head,
    CenterTorso,
    LeftTorso,
    RightTorso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
    Legs,
    // Vehicles
    Front,
    LeftSide,
    RightSide,
    Rear,
    Turret,
    // Conventional infantry and battle armor
    Troopers,
    // Emplacements
    Structure,
}

const MECH_LAYOUT: &[Location] = &[
    Location::Head,
    Location::CenterTorso,
    Location::LeftTorso,
    Location::RightTorso,
    Location::LeftArm,
    Location::RightArm,
    Location::LeftLeg,
    Location::RightLeg,
];

const PROTO_LAYOUT: &[Location] = &[
    Location::Head,
    Location::CenterTorso,
    Location::LeftArm,
    Location::RightArm,
    Location::Legs,
];

const VEHICLE_LAYOUT: &[Location] = &[
    Location::Front,
    Location::LeftSide,
    Location::RightSide,
    Location::Rear,
    Location::Turret,
];

impl Location {
    /// Locations a unit class is built from
    pub fn layout(class: UnitClass) -> &'static [Location] {
        match class {
            UnitClass::Mech => MECH_LAYOUT,
            UnitClass::ProtoMech => PROTO_LAYOUT,
            UnitClass::Vehicle => VEHICLE_LAYOUT,
            UnitClass::Infantry | UnitClass::BattleArmor => &[Location::Troopers],
            UnitClass::GunEmplacement => &[Location::Structure],
        }
    }

    /// Starting damage capacity for a location on a new unit
    pub fn default_capacity(&self, class: UnitClass, tonnage: u32) -> i32 {
        let tons = tonnage as i32;
        match (class, self) {
            (_, Location::Head) => 9,
            (UnitClass::Mech, Location::CenterTorso) => tons / 2 + tons / 5,
            (UnitClass::Mech, Location::LeftTorso | Location::RightTorso) => tons / 3 + tons / 6,
            (UnitClass::Mech, Location::LeftArm | Location::RightArm) => tons / 4 + tons / 8,
            (UnitClass::Mech, _) => tons / 3 + tons / 8,
            (UnitClass::ProtoMech, _) => tons.max(2),
            (UnitClass::Vehicle, _) => tons / 3 + 4,
            (UnitClass::Infantry, _) => 28,
            (UnitClass::BattleArmor, _) => 4 * 11,
            (UnitClass::GunEmplacement, _) => 40,
        }
    }

    pub fn is_leg(&self) -> bool {
        matches!(self, Location::LeftLeg | Location::RightLeg | Location::Legs)
    }

    /// Where excess damage flows once this location is destroyed.
    ///
    /// Losing a location with nowhere to transfer destroys the unit.
    pub fn transfer(&self, class: UnitClass) -> Option<Location> {
        match (class, self) {
            (UnitClass::Mech, Location::LeftArm | Location::LeftLeg) => Some(Location::LeftTorso),
            (UnitClass::Mech, Location::RightArm | Location::RightLeg) => Some(Location::RightTorso),
            (UnitClass::Mech, Location::LeftTorso | Location::RightTorso) => Some(Location::CenterTorso),
            (UnitClass::ProtoMech, Location::LeftArm | Location::RightArm | Location::Legs) => {
                Some(Location::CenterTorso)
            }
            _ => None,
        }
    }
}

/// Look up the location struck for a die result.
///
/// `roll` is a two-dice sum for [`HitTable::Normal`] and a single die for the
/// punch and kick tables. Returns `None` for [`HitTable::None`].
pub fn location_for_roll(class: UnitClass, table: HitTable, side: SideTable, roll: i32) -> Option<Location> {
    use Location::*;

    match table {
        HitTable::None => None,
        HitTable::Normal => Some(match class {
            UnitClass::Mech => mech_normal(side, roll),
            UnitClass::ProtoMech => match roll {
                ..=4 => Legs,
                5..=9 => CenterTorso,
                10 => LeftArm,
                11 => RightArm,
                _ => Head,
            },
            UnitClass::Vehicle => {
                if roll >= 12 {
                    Turret
                } else {
                    vehicle_side(side)
                }
            }
            UnitClass::Infantry | UnitClass::BattleArmor => Troopers,
            UnitClass::GunEmplacement => Structure,
        }),
        HitTable::Punch => Some(match class {
            UnitClass::Mech => match (side, roll) {
                (SideTable::Left, ..=2) => LeftTorso,
                (SideTable::Left, 3) => CenterTorso,
                (SideTable::Left, 4..=5) => LeftArm,
                (SideTable::Right, ..=2) => RightTorso,
                (SideTable::Right, 3) => CenterTorso,
                (SideTable::Right, 4..=5) => RightArm,
                (_, 6..) => Head,
                (_, ..=1) => LeftArm,
                (_, 2) => LeftTorso,
                (_, 3) => CenterTorso,
                (_, 4) => RightTorso,
                (_, 5) => RightArm,
            },
            UnitClass::ProtoMech => {
                if roll >= 6 {
                    Head
                } else {
                    CenterTorso
                }
            }
            _ => return location_for_roll(class, HitTable::Normal, side, 7),
        }),
        HitTable::Kick => Some(match class {
            UnitClass::Mech => match side {
                SideTable::Left => LeftLeg,
                SideTable::Right => RightLeg,
                _ if roll <= 3 => RightLeg,
                _ => LeftLeg,
            },
            UnitClass::ProtoMech => Legs,
            _ => return location_for_roll(class, HitTable::Normal, side, 7),
        }),
    }
}

fn mech_normal(side: SideTable, roll: i32) -> Location {
    use Location::*;

    match side {
        SideTable::Front | SideTable::Rear => match roll {
            ..=2 => CenterTorso,
            3..=4 => RightArm,
            5 => RightLeg,
            6 => RightTorso,
            7 => CenterTorso,
            8 => LeftTorso,
            9 => LeftLeg,
            10..=11 => LeftArm,
            _ => Head,
        },
        SideTable::Left => match roll {
            ..=2 => LeftTorso,
            3 | 6 => LeftLeg,
            4..=5 => LeftArm,
            7 => LeftTorso,
            8 => CenterTorso,
            9 => RightTorso,
            10 => RightArm,
            11 => RightLeg,
            _ => Head,
        },
        SideTable::Right => match roll {
            ..=2 => RightTorso,
            3 | 6 => RightLeg,
            4..=5 => RightArm,
            7 => RightTorso,
            8 => CenterTorso,
            9 => LeftTorso,
            10 => LeftArm,
            11 => LeftLeg,
            _ => Head,
        },
    }
}

fn vehicle_side(side: SideTable) -> Location {
    match side {
        SideTable::Front => Location::Front,
        SideTable::Left => Location::LeftSide,
        SideTable::Right => Location::RightSide,
        SideTable::Rear => Location::Rear,
    }
}

/// Dice the table is rolled with
pub fn table_dice(table: HitTable) -> u32 {
    match table {
        HitTable::Normal => 2,
        HitTable::Punch | HitTable::Kick => 1,
        HitTable::None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mech_front_table() {
        let loc = |roll| location_for_roll(UnitClass::Mech, HitTable::Normal, SideTable::Front, roll);
        assert_eq!(loc(7), Some(Location::CenterTorso));
        assert_eq!(loc(12), Some(Location::Head));
        assert_eq!(loc(5), Some(Location::RightLeg));
    }

    #[test]
    fn test_left_side_table_favours_left() {
        let left_hits = (2..=12)
            .filter_map(|roll| location_for_roll(UnitClass::Mech, HitTable::Normal, SideTable::Left, roll))
            .filter(|loc| matches!(loc, Location::LeftArm | Location::LeftLeg | Location::LeftTorso))
            .count();
        assert!(left_hits >= 6);
    }

    #[test]
    fn test_kick_table_hits_legs() {
        for roll in 1..=6 {
            for side in [SideTable::Front, SideTable::Left, SideTable::Right, SideTable::Rear] {
                let loc = location_for_roll(UnitClass::Mech, HitTable::Kick, side, roll);
                assert!(loc.is_some_and(|l| l.is_leg()));
            }
        }
    }

    #[test]
    fn test_punch_table_six_is_head() {
        assert_eq!(
            location_for_roll(UnitClass::Mech, HitTable::Punch, SideTable::Front, 6),
            Some(Location::Head)
        );
    }

    #[test]
    fn test_vehicle_sides() {
        assert_eq!(
            location_for_roll(UnitClass::Vehicle, HitTable::Normal, SideTable::Rear, 7),
            Some(Location::Rear)
        );
        assert_eq!(
            location_for_roll(UnitClass::Vehicle, HitTable::Kick, SideTable::Left, 3),
            Some(Location::LeftSide)
        );
    }

    #[test]
    fn test_no_table_no_location() {
        assert_eq!(location_for_roll(UnitClass::Mech, HitTable::None, SideTable::Front, 7), None);
    }

    #[test]
    fn test_transfer_chain_ends_at_center() {
        assert_eq!(Location::LeftArm.transfer(UnitClass::Mech), Some(Location::LeftTorso));
        assert_eq!(Location::LeftTorso.transfer(UnitClass::Mech), Some(Location::CenterTorso));
        assert_eq!(Location::CenterTorso.transfer(UnitClass::Mech), None);
    }
}
