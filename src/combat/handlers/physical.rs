//! Physical attacks: punch, kick, charge and the ProtoMech strike
//!
//! All of them need an adjacent target in the forward arc within one level
//! of elevation, and all roll against piloting rather than gunnery. A
//! standing building next to the attacker cannot be missed.

use crate::board::hex::FiringArc;
use crate::combat::attack::{AttackDeclaration, AttackKind, Limb};
use crate::combat::context::{AttackContext, ResolvedTarget};
use crate::combat::dispatch::HandlerKey;
use crate::combat::handlers::{standard_hit, strike_unit, submerged_damage, Aim, AttackBehavior, Resolution};
use crate::combat::modifiers::{
    add_attacker_state, add_light, add_target_state, common_legality, finish_chain, side_table, AttackFamily,
};
use crate::combat::report::{templates, ReportEntry};
use crate::combat::to_hit::{HitTable, SideTable, ToHitProfile};
use crate::core::error::Result;
use crate::core::rng::RngService;
use crate::units::locations::Location;
use crate::units::unit::{MovementMode, Unit, UnitClass};

fn arm(limb: Limb) -> Location {
    match limb {
        Limb::Left => Location::LeftArm,
        Limb::Right => Location::RightArm,
    }
}

fn leg(limb: Limb) -> Location {
    match limb {
        Limb::Left => Location::LeftLeg,
        Limb::Right => Location::RightLeg,
    }
}

fn limb_destroyed(unit: &Unit, location: Location) -> bool {
    unit.locations.get(&location).map_or(true, |capacity| *capacity <= 0)
}

/// Ground elevation of the target relative to the attacker
fn elevation_step(ctx: &AttackContext<'_>, attacker: &Unit, target: &ResolvedTarget<'_>) -> i32 {
    ctx.board.elevation(target.position()) - ctx.board.elevation(attacker.position)
}

/// Checks shared by every physical attack
fn physical_legality(ctx: &AttackContext<'_>, attacker: &Unit, target: &ResolvedTarget<'_>) -> Option<String> {
    if let Some(reason) = common_legality(attacker, target) {
        return Some(reason);
    }
    if attacker.spotting {
        return Some("Attacker is spotting this round".into());
    }
    match target {
        ResolvedTarget::Hex { .. } => return Some("Target is not a unit or building".into()),
        ResolvedTarget::Building { building: None, .. } => return Some("No building in hex".into()),
        ResolvedTarget::Unit(unit) if unit.swarming.is_some() => {
            return Some("Target is swarming another unit".into());
        }
        _ => {}
    }
    if attacker.position.distance(&target.position()) != 1 {
        return Some("Target not in adjacent hex".into());
    }
    if elevation_step(ctx, attacker, target).abs() > 1 {
        return Some("Target elevation not in range".into());
    }
    if !FiringArc::Forward.contains(attacker.position, attacker.facing, target.position()) {
        return Some("Target not in forward arc".into());
    }
    None
}

/// Modifier chain shared by every physical attack, after legality.
/// Attack-specific modifiers go in before [`finish_physical`].
fn physical_profile(
    ctx: &AttackContext<'_>,
    attacker: &Unit,
    target: &ResolvedTarget<'_>,
    base: i32,
    label: &str,
) -> ToHitProfile {
    let mut profile = ToHitProfile::new(attacker.piloting, "piloting skill");
    profile.add(base, label);
    if matches!(target, ResolvedTarget::Building { .. }) {
        profile.set_automatic_success("Adjacent building cannot be missed");
    }
    add_attacker_state(&mut profile, ctx, attacker);
    add_target_state(&mut profile, ctx, target, 1);
    add_light(&mut profile, ctx, target);
    profile
}

/// Quirk pass and table selection
fn finish_physical(
    ctx: &AttackContext<'_>,
    mut profile: ToHitProfile,
    attacker: &Unit,
    target: &ResolvedTarget<'_>,
    table: HitTable,
) -> ToHitProfile {
    finish_chain(&mut profile, ctx, attacker, AttackFamily::Physical);
    profile.set_tables(table, side_table(attacker.position, target));
    profile
}

pub struct PunchHandler;

impl AttackBehavior for PunchHandler {
    fn key(&self) -> HandlerKey {
        HandlerKey::Punch
    }

    fn to_hit(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<ToHitProfile> {
        let attacker = ctx.attacker(declaration)?;
        let target = ctx.target(declaration)?;
        let AttackKind::Punch { arm: limb } = declaration.kind else {
            return Ok(ToHitProfile::impossible("Not a punch"));
        };

        if let Some(reason) = physical_legality(ctx, attacker, &target) {
            return Ok(ToHitProfile::impossible(reason));
        }
        if !attacker.class.has_limbs() {
            return Ok(ToHitProfile::impossible("Only mechs can punch"));
        }
        if attacker.prone {
            return Ok(ToHitProfile::impossible("Attacker is prone"));
        }
        if limb_destroyed(attacker, arm(limb)) {
            return Ok(ToHitProfile::impossible("Arm destroyed"));
        }

        // A punch at a lower target lands where a kick would
        let table = if elevation_step(ctx, attacker, &target) < 0 {
            HitTable::Kick
        } else {
            HitTable::Punch
        };
        let profile = physical_profile(ctx, attacker, &target, ctx.config.punch_base, "punch");
        Ok(finish_physical(ctx, profile, attacker, &target, table))
    }

    fn damage(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<i32> {
        let attacker = ctx.attacker(declaration)?;
        let damage = (attacker.tonnage as i32 + 9) / 10;
        let submerged = match declaration.kind {
            AttackKind::Punch { arm: limb } => attacker.location_submerged(ctx.board, arm(limb)),
            _ => false,
        };
        Ok(if submerged { submerged_damage(damage) } else { damage })
    }
}

pub struct KickHandler;

impl AttackBehavior for KickHandler {
    fn key(&self) -> HandlerKey {
        HandlerKey::Kick
    }

    fn to_hit(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<ToHitProfile> {
        let attacker = ctx.attacker(declaration)?;
        let target = ctx.target(declaration)?;
        let AttackKind::Kick { leg: limb } = declaration.kind else {
            return Ok(ToHitProfile::impossible("Not a kick"));
        };

        if let Some(reason) = physical_legality(ctx, attacker, &target) {
            return Ok(ToHitProfile::impossible(reason));
        }
        if !attacker.class.has_limbs() {
            return Ok(ToHitProfile::impossible("Only mechs can kick"));
        }
        if attacker.prone {
            return Ok(ToHitProfile::impossible("Attacker is prone"));
        }
        if limb_destroyed(attacker, leg(limb)) {
            return Ok(ToHitProfile::impossible("Leg destroyed"));
        }

        // A kick at a higher target lands where a punch would
        let table = if elevation_step(ctx, attacker, &target) > 0 {
            HitTable::Punch
        } else {
            HitTable::Kick
        };
        let profile = physical_profile(ctx, attacker, &target, ctx.config.kick_base, "kick");
        Ok(finish_physical(ctx, profile, attacker, &target, table))
    }

    fn damage(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<i32> {
        let attacker = ctx.attacker(declaration)?;
        let damage = attacker.tonnage as i32 / 5;
        let submerged = match declaration.kind {
            AttackKind::Kick { leg: limb } => attacker.location_submerged(ctx.board, leg(limb)),
            _ => false,
        };
        Ok(if submerged { submerged_damage(damage) } else { damage })
    }
}

pub struct ChargeHandler;

impl AttackBehavior for ChargeHandler {
    fn key(&self) -> HandlerKey {
        HandlerKey::Charge
    }

    fn to_hit(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<ToHitProfile> {
        let attacker = ctx.attacker(declaration)?;
        let target = ctx.target(declaration)?;

        if let Some(reason) = physical_legality(ctx, attacker, &target) {
            return Ok(ToHitProfile::impossible(reason));
        }
        if !matches!(attacker.class, UnitClass::Mech | UnitClass::Vehicle) {
            return Ok(ToHitProfile::impossible("Unit cannot charge"));
        }
        if attacker.prone {
            return Ok(ToHitProfile::impossible("Attacker is prone"));
        }
        match attacker.movement.mode {
            MovementMode::Jumped => return Ok(ToHitProfile::impossible("Cannot charge after jumping")),
            MovementMode::Stationary => return Ok(ToHitProfile::impossible("Attacker did not move")),
            MovementMode::Walked | MovementMode::Ran => {}
        }
        if attacker.movement.hexes_moved == 0 {
            return Ok(ToHitProfile::impossible("Attacker did not move"));
        }

        let mut profile = physical_profile(ctx, attacker, &target, ctx.config.charge_base, "charge");
        if let Some(unit) = target.unit() {
            profile.add(attacker.piloting - unit.piloting, "piloting skill difference");
        }
        Ok(finish_physical(ctx, profile, attacker, &target, HitTable::Normal))
    }

    fn damage(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<i32> {
        let attacker = ctx.attacker(declaration)?;
        let mass = attacker.tonnage as i32 * attacker.movement.hexes_moved as i32;
        Ok((mass + 9) / 10)
    }

    fn on_hit(
        &self,
        ctx: &AttackContext<'_>,
        declaration: &AttackDeclaration,
        profile: &ToHitProfile,
        rng: &mut dyn RngService,
    ) -> Result<Resolution> {
        let damage = self.damage(ctx, declaration)?;
        let mut out = standard_hit(ctx, declaration, profile, damage, rng)?;

        if let ResolvedTarget::Unit(target) = ctx.target(declaration)? {
            let attacker = ctx.attacker(declaration)?;
            let recoil = (target.tonnage as i32 + 9) / 10;
            let aim = Aim {
                table: HitTable::Normal,
                side: SideTable::Front,
                partial_cover: false,
            };
            out.report(ReportEntry::new(templates::CHARGE_RECOIL).subject(attacker.id).add(recoil));
            strike_unit(ctx, attacker, aim, recoil, rng, &mut out)?;
        }
        Ok(out)
    }
}

pub struct ProtoStrikeHandler;

impl ProtoStrikeHandler {
    /// Strike damage by weight class
    pub fn damage_for(tonnage: u32) -> i32 {
        match tonnage {
            0..=5 => 1,
            6..=9 => 2,
            _ => 3,
        }
    }
}

impl AttackBehavior for ProtoStrikeHandler {
    fn key(&self) -> HandlerKey {
        HandlerKey::ProtoStrike
    }

    fn to_hit(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<ToHitProfile> {
        let attacker = ctx.attacker(declaration)?;
        let target = ctx.target(declaration)?;

        if let Some(reason) = physical_legality(ctx, attacker, &target) {
            return Ok(ToHitProfile::impossible(reason));
        }
        if attacker.class != UnitClass::ProtoMech {
            return Ok(ToHitProfile::impossible("Only protomechs can strike"));
        }
        let profile = physical_profile(ctx, attacker, &target, ctx.config.proto_strike_base, "protomech strike");
        Ok(finish_physical(ctx, profile, attacker, &target, HitTable::Normal))
    }

    fn damage(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<i32> {
        let attacker = ctx.attacker(declaration)?;
        let damage = Self::damage_for(attacker.tonnage);
        if attacker.location_submerged(ctx.board, Location::Legs) {
            Ok(submerged_damage(damage))
        } else {
            Ok(damage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::hex::{Facing, HexCoord};
    use crate::board::map::Board;
    use crate::combat::attack::TargetRef;
    use crate::combat::context::Battlefield;
    use crate::core::config::RulesConfig;
    use crate::core::types::{PlayerId, UnitId};
    use crate::units::unit::Movement;

    fn field() -> Battlefield {
        let mut field = Battlefield::new(Board::new(8, 8));
        field
            .units
            .add(
                Unit::new(UnitId(1), PlayerId(1), UnitClass::Mech, 50)
                    .at(HexCoord::new(2, 2), Facing::East),
            )
            .unwrap();
        field
            .units
            .add(
                Unit::new(UnitId(2), PlayerId(2), UnitClass::Mech, 65)
                    .at(HexCoord::new(3, 2), Facing::West),
            )
            .unwrap();
        field
    }

    #[test]
    fn test_punch_and_kick_damage() {
        let field = field();
        let config = RulesConfig::default();
        let ctx = field.context(&config);

        let punch = AttackDeclaration::punch(UnitId(1), TargetRef::Unit(UnitId(2)), Limb::Left);
        assert_eq!(PunchHandler.damage(&ctx, &punch).unwrap(), 5);
        let kick = AttackDeclaration::kick(UnitId(1), TargetRef::Unit(UnitId(2)), Limb::Right);
        assert_eq!(KickHandler.damage(&ctx, &kick).unwrap(), 10);
    }

    #[test]
    fn test_submerged_punch_halves() {
        let mut field = field();
        field.board.set_water(HexCoord::new(2, 2), 2);
        let config = RulesConfig::default();
        let ctx = field.context(&config);

        let punch = AttackDeclaration::punch(UnitId(1), TargetRef::Unit(UnitId(2)), Limb::Left);
        assert_eq!(PunchHandler.damage(&ctx, &punch).unwrap(), 3);
    }

    #[test]
    fn test_kick_uses_piloting_and_kick_table() {
        let field = field();
        let config = RulesConfig::default();
        let ctx = field.context(&config);

        let kick = AttackDeclaration::kick(UnitId(1), TargetRef::Unit(UnitId(2)), Limb::Left);
        let profile = KickHandler.to_hit(&ctx, &kick).unwrap();
        assert_eq!(profile.target_number(), Some(3));
        assert_eq!(profile.hit_table(), HitTable::Kick);
        assert_eq!(profile.side_table(), SideTable::Front);
    }

    #[test]
    fn test_punch_at_lower_target_uses_kick_table() {
        let mut field = field();
        field.board.set_elevation(HexCoord::new(2, 2), 1);
        let config = RulesConfig::default();
        let ctx = field.context(&config);

        let punch = AttackDeclaration::punch(UnitId(1), TargetRef::Unit(UnitId(2)), Limb::Right);
        let profile = PunchHandler.to_hit(&ctx, &punch).unwrap();
        assert_eq!(profile.hit_table(), HitTable::Kick);
    }

    #[test]
    fn test_spotting_attacker_cannot_punch() {
        let mut field = field();
        field.units.get_mut(UnitId(1)).unwrap().spotting = true;
        let config = RulesConfig::default();
        let ctx = field.context(&config);

        let punch = AttackDeclaration::punch(UnitId(1), TargetRef::Unit(UnitId(2)), Limb::Right);
        let profile = PunchHandler.to_hit(&ctx, &punch).unwrap();
        assert_eq!(profile.impossible_reason(), Some("Attacker is spotting this round"));
    }

    #[test]
    fn test_charge_needs_movement() {
        let mut field = field();
        let config = RulesConfig::default();
        let charge = AttackDeclaration::new(UnitId(1), TargetRef::Unit(UnitId(2)), AttackKind::Charge);

        let profile = ChargeHandler.to_hit(&field.context(&config), &charge).unwrap();
        assert!(profile.is_impossible());

        field.units.get_mut(UnitId(1)).unwrap().movement = Movement::new(MovementMode::Ran, 4);
        let ctx = field.context(&config);
        let profile = ChargeHandler.to_hit(&ctx, &charge).unwrap();
        assert!(!profile.is_impossible());
        // 50 tons over 4 hexes
        assert_eq!(ChargeHandler.damage(&ctx, &charge).unwrap(), 20);
    }

    #[test]
    fn test_charge_quirks_come_last() {
        let mut field = field();
        {
            let attacker = field.units.get_mut(UnitId(1)).unwrap();
            attacker.movement = Movement::new(MovementMode::Walked, 2);
            attacker.piloting = 6;
            attacker.quirks.push(crate::units::unit::Quirk::MeleeSpecialist);
        }
        let config = RulesConfig::default();
        let ctx = field.context(&config);
        let charge = AttackDeclaration::new(UnitId(1), TargetRef::Unit(UnitId(2)), AttackKind::Charge);

        let profile = ChargeHandler.to_hit(&ctx, &charge).unwrap();
        let labels: Vec<&str> = profile.modifiers().iter().map(|m| m.label.as_str()).collect();
        let difference = labels.iter().position(|l| *l == "piloting skill difference").unwrap();
        assert_eq!(labels.last(), Some(&"melee specialist"));
        assert!(difference < labels.len() - 1);
    }

    #[test]
    fn test_proto_strike_bands() {
        assert_eq!(ProtoStrikeHandler::damage_for(4), 1);
        assert_eq!(ProtoStrikeHandler::damage_for(7), 2);
        assert_eq!(ProtoStrikeHandler::damage_for(15), 3);
    }
}
