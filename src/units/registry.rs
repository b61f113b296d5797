//! Unit registry - arena of units addressed by id
//!
//! This is the unit/health seam the resolution pipeline calls into: damage
//! application, status effects and hit-location rolls.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::board::hex::HexCoord;
use crate::combat::to_hit::{HitTable, SideTable};
use crate::core::error::{EngineError, Result};
use crate::core::rng::RngService;
use crate::core::types::{UnitId, WeaponId};
use crate::units::combat_state::ArtilleryAdjustment;
use crate::units::locations::{location_for_roll, table_dice, Location};
use crate::units::unit::Unit;

/// Non-damage effect applied to a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusEffect {
    TaserShutdown { rounds: u32 },
    TaserInterference { rounds: u32, modifier: i32 },
    Illuminated,
    SearchlightUsed,
    ArtilleryAdjusted {
        weapon: WeaponId,
        hex: HexCoord,
        adjustment: ArtilleryAdjustment,
    },
}

/// What a single damage application did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageOutcome {
    /// (location, points absorbed) in the order damage flowed
    pub absorbed: Vec<(Location, i32)>,
    pub locations_destroyed: Vec<Location>,
    pub unit_destroyed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    units: Vec<Unit>,
    index: AHashMap<UnitId, usize>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, unit: Unit) -> Result<()> {
        if self.index.contains_key(&unit.id) {
            return Err(EngineError::DuplicateUnit(unit.id));
        }
        self.index.insert(unit.id, self.units.len());
        self.units.push(unit);
        Ok(())
    }

    pub fn remove(&mut self, id: UnitId) -> Result<Unit> {
        let idx = self.index.remove(&id).ok_or_else(|| EngineError::unit_not_found(id))?;
        let unit = self.units.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Ok(unit)
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: UnitId) -> Result<&Unit> {
        self.index
            .get(&id)
            .map(|&idx| &self.units[idx])
            .ok_or_else(|| EngineError::unit_not_found(id))
    }

    pub fn get_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        match self.index.get(&id) {
            Some(&idx) => Ok(&mut self.units[idx]),
            None => Err(EngineError::unit_not_found(id)),
        }
    }

    /// Units in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Live, on-board units standing in a hex, ordered by id
    pub fn units_at(&self, coord: HexCoord) -> Vec<&Unit> {
        let mut found: Vec<&Unit> = self
            .units
            .iter()
            .filter(|u| u.position == coord && !u.destroyed && !u.is_off_board())
            .collect();
        found.sort_by_key(|u| u.id);
        found
    }

    /// Check that damage could be applied without mutating anything
    pub fn check_damage(&self, id: UnitId, location: Location) -> Result<()> {
        let unit = self.get(id)?;
        if !unit.locations.contains_key(&location) {
            return Err(EngineError::Reference {
                what: format!("{id} has no {location:?} location"),
            });
        }
        Ok(())
    }

    /// Apply damage to a location, flowing excess inward
    pub fn apply_damage(&mut self, id: UnitId, location: Location, amount: i32) -> Result<DamageOutcome> {
        self.check_damage(id, location)?;
        let unit = self.get_mut(id)?;
        let class = unit.class;

        let mut outcome = DamageOutcome {
            absorbed: Vec::new(),
            locations_destroyed: Vec::new(),
            unit_destroyed: false,
        };
        let mut remaining = amount.max(0);
        let mut current = location;

        while remaining > 0 {
            let Some(capacity) = unit.locations.get_mut(&current) else {
                break;
            };
            if *capacity > remaining {
                *capacity -= remaining;
                outcome.absorbed.push((current, remaining));
                break;
            }

            let taken = *capacity;
            remaining -= taken;
            *capacity = 0;
            if taken > 0 {
                outcome.absorbed.push((current, taken));
                outcome.locations_destroyed.push(current);
            }

            match current.transfer(class) {
                Some(next) => current = next,
                None => {
                    unit.destroyed = true;
                    break;
                }
            }
        }

        outcome.unit_destroyed = unit.destroyed;
        Ok(outcome)
    }

    pub fn set_status(&mut self, id: UnitId, effect: StatusEffect) -> Result<()> {
        let unit = self.get_mut(id)?;
        let state = &mut unit.combat;
        match effect {
            StatusEffect::TaserShutdown { rounds } => state.taser.apply_shutdown(rounds),
            StatusEffect::TaserInterference { rounds, modifier } => {
                state.taser.apply_interference(rounds, modifier)
            }
            StatusEffect::Illuminated => state.searchlight.illuminate(),
            StatusEffect::SearchlightUsed => state.searchlight.mark_used(),
            StatusEffect::ArtilleryAdjusted {
                weapon,
                hex,
                adjustment,
            } => state.artillery.set(weapon, hex, adjustment),
        }
        Ok(())
    }

    /// Roll where a hit lands on the unit. `None` for tables without locations.
    pub fn roll_hit_location(
        &self,
        id: UnitId,
        table: HitTable,
        side: SideTable,
        rng: &mut dyn RngService,
    ) -> Result<Option<Location>> {
        let unit = self.get(id)?;
        let dice = table_dice(table);
        if dice == 0 {
            return Ok(None);
        }
        let roll = rng.roll(dice);
        Ok(location_for_roll(unit.class, table, side, roll))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::FixedDice;
    use crate::core::types::PlayerId;
    use crate::units::unit::UnitClass;

    fn mech(id: u32) -> Unit {
        Unit::new(UnitId(id), PlayerId(1), UnitClass::Mech, 50)
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = UnitRegistry::new();
        registry.add(mech(1)).unwrap();
        assert!(matches!(registry.add(mech(1)), Err(EngineError::DuplicateUnit(_))));
    }

    #[test]
    fn test_missing_unit_is_reference_error() {
        let registry = UnitRegistry::new();
        assert!(matches!(registry.get(UnitId(9)), Err(EngineError::Reference { .. })));
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut registry = UnitRegistry::new();
        for id in 1..=3 {
            registry.add(mech(id)).unwrap();
        }
        registry.remove(UnitId(1)).unwrap();
        assert_eq!(registry.get(UnitId(3)).unwrap().id, UnitId(3));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_removed_unit_takes_artillery_memory_along() {
        let mut registry = UnitRegistry::new();
        registry.add(mech(1)).unwrap();
        let hex = HexCoord::new(4, 4);
        registry
            .set_status(
                UnitId(1),
                StatusEffect::ArtilleryAdjusted {
                    weapon: WeaponId(1),
                    hex,
                    adjustment: ArtilleryAdjustment::AutomaticHit,
                },
            )
            .unwrap();

        let removed = registry.remove(UnitId(1)).unwrap();
        assert_eq!(removed.combat.artillery.len(), 1);

        registry.add(mech(1)).unwrap();
        assert_eq!(registry.get(UnitId(1)).unwrap().combat.artillery.peek(WeaponId(1), hex), None);
    }

    #[test]
    fn test_damage_transfers_inward() {
        let mut registry = UnitRegistry::new();
        registry.add(mech(1)).unwrap();
        let arm = registry.get(UnitId(1)).unwrap().locations[&Location::LeftArm];

        let outcome = registry.apply_damage(UnitId(1), Location::LeftArm, arm + 3).unwrap();
        assert_eq!(outcome.locations_destroyed, vec![Location::LeftArm]);
        assert_eq!(outcome.absorbed, vec![(Location::LeftArm, arm), (Location::LeftTorso, 3)]);
        assert!(!outcome.unit_destroyed);
    }

    #[test]
    fn test_head_destruction_kills_unit() {
        let mut registry = UnitRegistry::new();
        registry.add(mech(1)).unwrap();
        let outcome = registry.apply_damage(UnitId(1), Location::Head, 50).unwrap();
        assert!(outcome.unit_destroyed);
        assert!(registry.get(UnitId(1)).unwrap().destroyed);
    }

    #[test]
    fn test_damage_to_missing_location_fails_untouched() {
        let mut registry = UnitRegistry::new();
        registry
            .add(Unit::new(UnitId(1), PlayerId(1), UnitClass::Infantry, 3))
            .unwrap();
        let before = registry.get(UnitId(1)).unwrap().clone();
        assert!(registry.apply_damage(UnitId(1), Location::LeftArm, 5).is_err());
        assert_eq!(registry.get(UnitId(1)).unwrap(), &before);
    }

    #[test]
    fn test_status_effects() {
        let mut registry = UnitRegistry::new();
        registry.add(mech(1)).unwrap();
        registry
            .set_status(UnitId(1), StatusEffect::TaserShutdown { rounds: 2 })
            .unwrap();
        registry.set_status(UnitId(1), StatusEffect::Illuminated).unwrap();
        let unit = registry.get(UnitId(1)).unwrap();
        assert!(unit.is_shut_down());
        assert!(unit.combat.searchlight.illuminated);
    }

    #[test]
    fn test_roll_hit_location_uses_table_dice() {
        let mut registry = UnitRegistry::new();
        registry.add(mech(1)).unwrap();
        let mut dice = FixedDice::new([12]);
        let loc = registry
            .roll_hit_location(UnitId(1), HitTable::Normal, SideTable::Front, &mut dice)
            .unwrap();
        assert_eq!(loc, Some(Location::Head));

        let none = registry
            .roll_hit_location(UnitId(1), HitTable::None, SideTable::Front, &mut dice)
            .unwrap();
        assert_eq!(none, None);
        assert_eq!(dice.rolls_made(), 1);
    }

    #[test]
    fn test_units_at_sorted_and_filters_carried() {
        let mut registry = UnitRegistry::new();
        let hex = HexCoord::new(2, 2);
        registry.add(mech(5).at(hex, Default::default())).unwrap();
        registry.add(mech(2).at(hex, Default::default())).unwrap();
        let mut carried = mech(3).at(hex, Default::default());
        carried.carrier = Some(UnitId(5));
        registry.add(carried).unwrap();

        let ids: Vec<UnitId> = registry.units_at(hex).iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![UnitId(2), UnitId(5)]);
    }
}
