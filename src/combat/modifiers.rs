//! Shared legality checks and to-hit modifiers
//!
//! Each attack handler assembles its own chain from these pieces. Order of
//! application matters only for the terminal verdicts (the first one wins);
//! soft modifiers are additive. Quirks are always applied last.

use crate::board::hex::HexCoord;
use crate::board::map::BoardView;
use crate::combat::context::{AttackContext, ResolvedTarget};
use crate::combat::to_hit::{SideTable, ToHitProfile};
use crate::units::unit::{Quirk, Unit, UnitClass, Weapon};

/// Which quirks apply to an attack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackFamily {
    Weapon,
    Physical,
}

/// Range bracket of a weapon shot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBand {
    Short,
    Medium,
    Long,
    OutOfRange,
}

impl RangeBand {
    pub fn for_distance(weapon: &Weapon, distance: u32) -> Self {
        if distance <= weapon.short_range {
            RangeBand::Short
        } else if distance <= weapon.medium_range {
            RangeBand::Medium
        } else if distance <= weapon.long_range {
            RangeBand::Long
        } else {
            RangeBand::OutOfRange
        }
    }

    pub fn modifier(&self) -> i32 {
        match self {
            RangeBand::Short => 0,
            RangeBand::Medium => 2,
            RangeBand::Long | RangeBand::OutOfRange => 4,
        }
    }
}

/// Checks every attack type shares. Returns the reason the attack is
/// impossible, if it is.
pub fn common_legality(attacker: &Unit, target: &ResolvedTarget<'_>) -> Option<String> {
    if let ResolvedTarget::Unit(unit) = target {
        if unit.id == attacker.id {
            return Some("Cannot target self".into());
        }
    }
    if attacker.destroyed {
        return Some("Attacker is destroyed".into());
    }
    if attacker.is_off_board() {
        return Some("Attacker is being transported".into());
    }
    if attacker.is_shut_down() {
        return Some("Attacker is shut down".into());
    }

    let ResolvedTarget::Unit(unit) = target else {
        return None;
    };
    if unit.destroyed {
        return Some("Target is already destroyed".into());
    }
    if unit.is_off_board() {
        return Some("Target is being transported".into());
    }
    if unit.diving {
        return Some("Target is submerged out of reach".into());
    }
    None
}

/// Can only fire between units inside buildings if both share the hex
pub fn crosses_building_wall(board: &dyn BoardView, from: HexCoord, to: HexCoord) -> bool {
    let inside = |coord| board.building_at(coord).is_some();
    from != to && (inside(from) || inside(to))
}

/// Which side of the target faces the attacker
pub fn side_table(attacker_position: HexCoord, target: &ResolvedTarget<'_>) -> SideTable {
    match target {
        ResolvedTarget::Unit(unit) if unit.position != attacker_position => {
            SideTable::from_relative_bearing(unit.position.relative_bearing(unit.facing, &attacker_position))
        }
        _ => SideTable::Front,
    }
}

pub fn add_attacker_movement(profile: &mut ToHitProfile, attacker: &Unit) {
    profile.add(
        attacker.movement.attacker_modifier(),
        format!("attacker {:?}", attacker.movement.mode).to_lowercase(),
    );
}

pub fn add_attacker_state(profile: &mut ToHitProfile, ctx: &AttackContext<'_>, attacker: &Unit) {
    profile.add(attacker.combat.taser.interference(), "taser interference");
    if ctx.board.water_depth(attacker.position) == 1 && attacker.class != UnitClass::Mech {
        profile.add(1, "attacker in water");
    }
}

/// Target movement, stance and terrain
pub fn add_target_state(
    profile: &mut ToHitProfile,
    ctx: &AttackContext<'_>,
    target: &ResolvedTarget<'_>,
    distance: u32,
) {
    match target {
        ResolvedTarget::Unit(unit) => {
            profile.add(unit.movement.target_modifier(), "target movement");
            if unit.prone {
                if distance <= 1 {
                    profile.add(ctx.config.prone_adjacent_modifier, "target prone and adjacent");
                } else {
                    profile.add(ctx.config.prone_at_range_modifier, "target prone at range");
                }
            }
            if unit.counts_as_immobile() {
                profile.add(ctx.config.immobile_target_modifier, "target immobile");
            }
            let terrain = ctx.board.terrain(unit.position);
            profile.add(terrain.target_modifier(), format!("target in {}", terrain.label()));
        }
        ResolvedTarget::Hex { .. } | ResolvedTarget::Building { .. } => {
            profile.add(ctx.config.immobile_target_modifier, "immobile target");
        }
    }
}

/// Night and dusk penalties unless the target is lit
pub fn add_light(profile: &mut ToHitProfile, ctx: &AttackContext<'_>, target: &ResolvedTarget<'_>) {
    let lit = target.unit().is_some_and(|u| u.combat.searchlight.illuminated);
    if !lit {
        profile.add(
            ctx.config.light_modifier(ctx.environment.light),
            format!("{:?} conditions", ctx.environment.light).to_lowercase(),
        );
    }
}

/// Range bracket and minimum range. Returns false when out of range.
pub fn add_range(profile: &mut ToHitProfile, attacker: &Unit, weapon: &Weapon, distance: u32) -> bool {
    let band = RangeBand::for_distance(weapon, distance);
    if band == RangeBand::OutOfRange {
        profile.set_impossible("Target out of range");
        return false;
    }

    let mut modifier = band.modifier();
    if attacker.has_quirk(Quirk::Sniper) {
        modifier /= 2;
    }
    profile.add(modifier, format!("{band:?} range").to_lowercase());

    if weapon.min_range > 0 && distance <= weapon.min_range {
        profile.add((weapon.min_range - distance + 1) as i32, "minimum range");
    }
    true
}

/// Quirk adjustments, applied after every other modifier
pub fn apply_quirks(profile: &mut ToHitProfile, attacker: &Unit, family: AttackFamily) {
    for quirk in &attacker.quirks {
        match (quirk, family) {
            (Quirk::ImprovedTargeting, AttackFamily::Weapon) => profile.add(-1, "improved targeting"),
            (Quirk::PoorTargeting, AttackFamily::Weapon) => profile.add(1, "poor targeting"),
            (Quirk::MeleeSpecialist, AttackFamily::Physical) => profile.add(-1, "melee specialist"),
            _ => {}
        }
    }
}

/// Closing pass of every rolled chain: quirks, then a target number no roll
/// can reach becomes an automatic failure
pub fn finish_chain(profile: &mut ToHitProfile, ctx: &AttackContext<'_>, attacker: &Unit, family: AttackFamily) {
    apply_quirks(profile, attacker, family);
    let highest = ctx.config.to_hit_dice as i32 * 6;
    if let Some(target) = profile.target_number() {
        if target > highest {
            profile.set_automatic_failure(format!("Target number {target} exceeds the highest roll of {highest}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::hex::Facing;
    use crate::board::map::Board;
    use crate::core::config::RulesConfig;
    use crate::core::types::{PlayerId, UnitId, WeaponId};
    use crate::units::registry::UnitRegistry;

    fn mech(id: u32, q: i32, r: i32, facing: Facing) -> Unit {
        Unit::new(UnitId(id), PlayerId(1), UnitClass::Mech, 50).at(HexCoord::new(q, r), facing)
    }

    #[test]
    fn test_range_bands() {
        let laser = Weapon::medium_laser(WeaponId(1));
        assert_eq!(RangeBand::for_distance(&laser, 3), RangeBand::Short);
        assert_eq!(RangeBand::for_distance(&laser, 6), RangeBand::Medium);
        assert_eq!(RangeBand::for_distance(&laser, 9), RangeBand::Long);
        assert_eq!(RangeBand::for_distance(&laser, 10), RangeBand::OutOfRange);
    }

    #[test]
    fn test_minimum_range_penalty() {
        let shooter = mech(1, 0, 0, Facing::East);
        let lrm = Weapon::lrm10(WeaponId(1));
        let mut profile = ToHitProfile::new(4, "gunnery skill");
        assert!(add_range(&mut profile, &shooter, &lrm, 4));
        // short range, min 6 at distance 4 => +3
        assert_eq!(profile.target_number(), Some(7));
    }

    #[test]
    fn test_sniper_halves_range() {
        let shooter = mech(1, 0, 0, Facing::East).with_quirk(Quirk::Sniper);
        let laser = Weapon::medium_laser(WeaponId(1));
        let mut profile = ToHitProfile::new(4, "gunnery skill");
        add_range(&mut profile, &shooter, &laser, 8);
        assert_eq!(profile.target_number(), Some(6));
    }

    #[test]
    fn test_out_of_range_is_impossible() {
        let shooter = mech(1, 0, 0, Facing::East);
        let laser = Weapon::medium_laser(WeaponId(1));
        let mut profile = ToHitProfile::new(4, "gunnery skill");
        assert!(!add_range(&mut profile, &shooter, &laser, 12));
        assert!(profile.is_impossible());
    }

    #[test]
    fn test_side_table_from_target_facing() {
        let target = mech(2, 3, 0, Facing::East);
        let resolved = ResolvedTarget::Unit(&target);
        // Attacker directly behind (west of) an east-facing target
        assert_eq!(side_table(HexCoord::new(0, 0), &resolved), SideTable::Rear);
        assert_eq!(side_table(HexCoord::new(6, 0), &resolved), SideTable::Front);
    }

    #[test]
    fn test_side_table_for_adjacent_attackers() {
        for facing in Facing::all() {
            let target = mech(2, 4, 4, facing);
            let resolved = ResolvedTarget::Unit(&target);
            let at = |turn: i32| target.position.neighbor(Facing::from_index(facing.index() as i32 + turn));

            assert_eq!(side_table(at(0), &resolved), SideTable::Front, "{facing:?}");
            assert_eq!(side_table(at(1), &resolved), SideTable::Front, "{facing:?} front-left");
            assert_eq!(side_table(at(-1), &resolved), SideTable::Front, "{facing:?} front-right");
            assert_eq!(side_table(at(2), &resolved), SideTable::Left, "{facing:?}");
            assert_eq!(side_table(at(3), &resolved), SideTable::Rear, "{facing:?}");
            assert_eq!(side_table(at(-2), &resolved), SideTable::Right, "{facing:?}");
        }
    }

    #[test]
    fn test_quirks_by_family() {
        let attacker = mech(1, 0, 0, Facing::East)
            .with_quirk(Quirk::ImprovedTargeting)
            .with_quirk(Quirk::MeleeSpecialist);

        let mut weapon = ToHitProfile::new(4, "gunnery skill");
        apply_quirks(&mut weapon, &attacker, AttackFamily::Weapon);
        assert_eq!(weapon.target_number(), Some(3));

        let mut physical = ToHitProfile::new(5, "piloting skill");
        apply_quirks(&mut physical, &attacker, AttackFamily::Physical);
        assert_eq!(physical.target_number(), Some(4));
    }

    #[test]
    fn test_common_legality() {
        let attacker = mech(1, 0, 0, Facing::East);
        assert_eq!(
            common_legality(&attacker, &ResolvedTarget::Unit(&attacker)),
            Some("Cannot target self".into())
        );

        let mut carried = mech(2, 1, 0, Facing::East);
        carried.carrier = Some(UnitId(3));
        assert_eq!(
            common_legality(&attacker, &ResolvedTarget::Unit(&carried)),
            Some("Target is being transported".into())
        );

        let mut shut_down = mech(4, 0, 0, Facing::East);
        shut_down.combat.taser.apply_shutdown(1);
        let target = mech(5, 1, 0, Facing::East);
        assert_eq!(
            common_legality(&shut_down, &ResolvedTarget::Unit(&target)),
            Some("Attacker is shut down".into())
        );
    }

    #[test]
    fn test_unreachable_target_number_fails_automatically() {
        let board = Board::new(5, 5);
        let units = UnitRegistry::new();
        let config = RulesConfig::default();
        let ctx = AttackContext {
            board: &board,
            units: &units,
            config: &config,
            environment: crate::core::config::Environment::default(),
        };
        let attacker = mech(1, 0, 0, Facing::East).with_quirk(Quirk::PoorTargeting);

        let mut reachable = ToHitProfile::new(4, "gunnery skill");
        reachable.add(7, "long range in heavy woods");
        finish_chain(&mut reachable, &ctx, &attacker, AttackFamily::Weapon);
        assert_eq!(reachable.target_number(), Some(12));

        let mut hopeless = ToHitProfile::new(4, "gunnery skill");
        hopeless.add(8, "long range in heavy woods");
        finish_chain(&mut hopeless, &ctx, &attacker, AttackFamily::Weapon);
        assert!(matches!(
            hopeless.status(),
            crate::combat::to_hit::ToHitStatus::AutomaticFailure(_)
        ));
        assert!(!hopeless.is_impossible());
    }

    #[test]
    fn test_night_penalty_skips_lit_targets() {
        let board = Board::new(5, 5);
        let units = UnitRegistry::new();
        let config = RulesConfig::default();
        let ctx = AttackContext {
            board: &board,
            units: &units,
            config: &config,
            environment: crate::core::config::Environment::night(),
        };

        let mut target = mech(2, 1, 0, Facing::East);
        let mut dark = ToHitProfile::new(4, "gunnery skill");
        add_light(&mut dark, &ctx, &ResolvedTarget::Unit(&target));
        assert_eq!(dark.target_number(), Some(6));

        target.combat.searchlight.illuminate();
        let mut lit = ToHitProfile::new(4, "gunnery skill");
        add_light(&mut lit, &ctx, &ResolvedTarget::Unit(&target));
        assert_eq!(lit.target_number(), Some(4));
    }
}
