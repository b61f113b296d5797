//! Attack declarations
//!
//! A declaration is the immutable record of intent: who attacks, what, and
//! with which attack type. The sub-parameters an attack type needs (weapon,
//! limb) travel inside its [`AttackKind`] variant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::hex::HexCoord;
use crate::core::types::{UnitId, WeaponId};

/// What a hex-targeted attack is trying to do to the hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexEffect {
    /// Knock down woods
    Clear,
    /// Set the hex alight
    Ignite,
    /// Area fire aimed at the hex
    Artillery,
    /// Light up the hex with a searchlight
    Illuminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    Unit(UnitId),
    Hex { coord: HexCoord, effect: HexEffect },
    Building(HexCoord),
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRef::Unit(id) => write!(f, "{id}"),
            TargetRef::Hex { coord, effect } => {
                write!(f, "hex ({}, {}) [{effect:?}]", coord.q, coord.r)
            }
            TargetRef::Building(coord) => write!(f, "building at ({}, {})", coord.q, coord.r),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Limb {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    WeaponFire { weapon: WeaponId },
    Punch { arm: Limb },
    Kick { leg: Limb },
    Charge,
    ProtoStrike,
    Searchlight,
}

impl AttackKind {
    pub fn is_physical(&self) -> bool {
        matches!(
            self,
            AttackKind::Punch { .. } | AttackKind::Kick { .. } | AttackKind::Charge | AttackKind::ProtoStrike
        )
    }

    pub fn label(&self) -> String {
        match self {
            AttackKind::WeaponFire { weapon } => format!("fires {weapon}"),
            AttackKind::Punch { arm } => format!("punches ({arm:?} arm)"),
            AttackKind::Kick { leg } => format!("kicks ({leg:?} leg)"),
            AttackKind::Charge => "charges".to_string(),
            AttackKind::ProtoStrike => "strikes".to_string(),
            AttackKind::Searchlight => "sweeps a searchlight".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackDeclaration {
    pub attacker: UnitId,
    pub target: TargetRef,
    pub kind: AttackKind,
}

impl AttackDeclaration {
    pub fn new(attacker: UnitId, target: TargetRef, kind: AttackKind) -> Self {
        Self {
            attacker,
            target,
            kind,
        }
    }

    pub fn weapon_fire(attacker: UnitId, target: TargetRef, weapon: WeaponId) -> Self {
        Self::new(attacker, target, AttackKind::WeaponFire { weapon })
    }

    pub fn punch(attacker: UnitId, target: TargetRef, arm: Limb) -> Self {
        Self::new(attacker, target, AttackKind::Punch { arm })
    }

    pub fn kick(attacker: UnitId, target: TargetRef, leg: Limb) -> Self {
        Self::new(attacker, target, AttackKind::Kick { leg })
    }

    pub fn searchlight(attacker: UnitId, target: TargetRef) -> Self {
        Self::new(attacker, target, AttackKind::Searchlight)
    }
}

impl fmt::Display for AttackDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} at {}", self.attacker, self.kind.label(), self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_display() {
        let decl = AttackDeclaration::weapon_fire(UnitId(1), TargetRef::Unit(UnitId(2)), WeaponId(7));
        assert_eq!(decl.to_string(), "unit#1 fires weapon#7 at unit#2");

        let punch = AttackDeclaration::punch(UnitId(1), TargetRef::Building(HexCoord::new(2, 3)), Limb::Left);
        assert_eq!(punch.to_string(), "unit#1 punches (Left arm) at building at (2, 3)");
    }

    #[test]
    fn test_physical_kinds() {
        assert!(AttackKind::Charge.is_physical());
        assert!(AttackKind::Kick { leg: Limb::Right }.is_physical());
        assert!(!AttackKind::Searchlight.is_physical());
        assert!(!AttackKind::WeaponFire { weapon: WeaponId(1) }.is_physical());
    }
}
