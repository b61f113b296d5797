//! Direct and cluster weapon fire, and the weapon to-hit chain they share
//! with the taser

use crate::combat::attack::{AttackDeclaration, AttackKind, HexEffect};
use crate::combat::context::{AttackContext, ResolvedTarget};
use crate::combat::dispatch::HandlerKey;
use crate::combat::effects::Effect;
use crate::combat::handlers::{standard_hit, strike_in_groups, Aim, AttackBehavior, Resolution};
use crate::combat::modifiers::{
    add_attacker_movement, add_attacker_state, add_light, add_range, add_target_state, common_legality,
    finish_chain, side_table, AttackFamily,
};
use crate::combat::report::{templates, ReportEntry};
use crate::combat::to_hit::{HitTable, ToHitProfile};
use crate::core::error::{EngineError, Result};
use crate::core::rng::RngService;
use crate::units::unit::{Unit, UnitClass, Weapon, WeaponFamily};

/// Look up the firing unit, its weapon and the target
pub(crate) fn weapon_shot<'a>(
    ctx: &AttackContext<'a>,
    declaration: &AttackDeclaration,
) -> Result<(&'a Unit, &'a Weapon, ResolvedTarget<'a>)> {
    let attacker = ctx.attacker(declaration)?;
    let AttackKind::WeaponFire { weapon } = declaration.kind else {
        return Err(EngineError::Reference {
            what: format!("{declaration} does not fire a weapon"),
        });
    };
    let weapon = attacker.weapon(weapon).ok_or_else(|| EngineError::Reference {
        what: format!("{} has no {weapon}", attacker.id),
    })?;
    let target = ctx.target(declaration)?;
    Ok((attacker, weapon, target))
}

/// To-hit chain for line-of-sight weapon fire
pub(crate) fn weapon_to_hit(
    ctx: &AttackContext<'_>,
    attacker: &Unit,
    weapon: &Weapon,
    target: &ResolvedTarget<'_>,
) -> ToHitProfile {
    if let Some(reason) = common_legality(attacker, target) {
        return ToHitProfile::impossible(reason);
    }
    if weapon.destroyed {
        return ToHitProfile::impossible("Weapon destroyed");
    }
    match target {
        ResolvedTarget::Hex {
            coord,
            effect: HexEffect::Ignite,
        } => {
            if !weapon.can_ignite {
                return ToHitProfile::impossible("Weapon cannot start fires");
            }
            if !ctx.board.terrain(*coord).ignitable() {
                return ToHitProfile::impossible("Nothing in the hex can burn");
            }
        }
        ResolvedTarget::Hex {
            coord,
            effect: HexEffect::Clear,
        } => {
            if !ctx.board.terrain(*coord).clearable() {
                return ToHitProfile::impossible("No woods to clear");
            }
        }
        ResolvedTarget::Hex {
            effect: HexEffect::Artillery,
            ..
        } => return ToHitProfile::impossible("Only artillery can deliver area fire"),
        ResolvedTarget::Hex {
            effect: HexEffect::Illuminate,
            ..
        } => return ToHitProfile::impossible("Weapons cannot illuminate a hex"),
        ResolvedTarget::Building { building: None, .. } => {
            return ToHitProfile::impossible("No building in hex");
        }
        _ => {}
    }

    let from = attacker.position;
    let to = target.position();
    let distance = from.distance(&to);

    let mut profile = ToHitProfile::new(attacker.gunnery, "gunnery skill");
    if !add_range(&mut profile, attacker, weapon, distance) {
        return profile;
    }
    if !weapon.arc.contains(from, attacker.facing, to) {
        return ToHitProfile::impossible("Target not in firing arc");
    }
    let los = ctx.los(attacker.viewpoint(), target.viewpoint());
    if let Some(reason) = los.blocked_reason() {
        return ToHitProfile::impossible(format!("No line of sight: {reason}"));
    }
    if matches!(target, ResolvedTarget::Building { .. }) && distance <= 1 {
        profile.set_automatic_success("Adjacent building cannot be missed");
    }

    add_attacker_movement(&mut profile, attacker);
    add_attacker_state(&mut profile, ctx, attacker);
    if attacker.spotting {
        profile.add(1, "attacker spotting");
    }
    add_target_state(&mut profile, ctx, target, distance);
    profile.add(los.density as i32, "intervening woods and smoke");

    let wading = target
        .unit()
        .is_some_and(|u| u.class == UnitClass::Mech && !u.prone && ctx.board.water_depth(u.position) == 1);
    if los.partial_cover || wading {
        profile.add(ctx.config.partial_cover_modifier, "partial cover");
        profile.set_partial_cover(true);
    }
    add_light(&mut profile, ctx, target);
    finish_chain(&mut profile, ctx, attacker, AttackFamily::Weapon);

    profile.set_tables(HitTable::Normal, side_table(from, target));
    profile
}

/// Missiles that strike for a cluster roll.
///
/// Standard rows cover the common launcher sizes; other sizes scale from
/// the 20-missile row.
pub fn cluster_hits(size: u32, roll: i32) -> u32 {
    const ROWS: [(u32, [u32; 11]); 7] = [
        (2, [1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2]),
        (4, [1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4]),
        (5, [1, 2, 2, 3, 3, 3, 3, 4, 4, 5, 5]),
        (6, [2, 2, 3, 3, 4, 4, 4, 5, 5, 6, 6]),
        (10, [3, 3, 4, 6, 6, 6, 6, 8, 8, 10, 10]),
        (15, [5, 5, 6, 9, 9, 9, 9, 12, 12, 15, 15]),
        (20, [6, 6, 9, 12, 12, 12, 12, 16, 16, 20, 20]),
    ];

    if size == 0 {
        return 0;
    }
    let column = (roll.clamp(2, 12) - 2) as usize;
    if let Some((_, row)) = ROWS.iter().find(|(s, _)| *s == size) {
        return row[column];
    }
    let base = ROWS[6].1[column];
    ((base * size + 10) / 20).clamp(1, size)
}

pub struct DirectFireHandler;

impl AttackBehavior for DirectFireHandler {
    fn key(&self) -> HandlerKey {
        HandlerKey::DirectFire
    }

    fn to_hit(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<ToHitProfile> {
        let (attacker, weapon, target) = weapon_shot(ctx, declaration)?;
        Ok(weapon_to_hit(ctx, attacker, weapon, &target))
    }

    fn damage(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<i32> {
        let (_, weapon, _) = weapon_shot(ctx, declaration)?;
        Ok(weapon.damage)
    }
}

pub struct ClusterFireHandler;

impl AttackBehavior for ClusterFireHandler {
    fn key(&self) -> HandlerKey {
        HandlerKey::ClusterFire
    }

    fn to_hit(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<ToHitProfile> {
        let (attacker, weapon, target) = weapon_shot(ctx, declaration)?;
        Ok(weapon_to_hit(ctx, attacker, weapon, &target))
    }

    /// Damage per missile
    fn damage(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<i32> {
        let (_, weapon, _) = weapon_shot(ctx, declaration)?;
        Ok(weapon.damage)
    }

    fn on_hit(
        &self,
        ctx: &AttackContext<'_>,
        declaration: &AttackDeclaration,
        profile: &ToHitProfile,
        rng: &mut dyn RngService,
    ) -> Result<Resolution> {
        let (_, weapon, target) = weapon_shot(ctx, declaration)?;
        let WeaponFamily::Cluster { size } = weapon.family else {
            return Err(EngineError::Reference {
                what: format!("{} is not a cluster weapon", weapon.name),
            });
        };

        let roll = rng.two_d6();
        let hits = cluster_hits(size, roll);
        let total = hits as i32 * weapon.damage;

        let mut out = match target {
            ResolvedTarget::Unit(unit) => {
                let mut out = Resolution::new();
                strike_in_groups(ctx, unit, Aim::from_profile(profile), total, rng, &mut out)?;
                out
            }
            ResolvedTarget::Building { coord, .. } => {
                let mut out = Resolution::new();
                out.effect(Effect::BuildingDamage { coord, amount: total });
                out
            }
            ResolvedTarget::Hex { .. } => standard_hit(ctx, declaration, profile, total, rng)?,
        };
        out.reports.insert(
            0,
            ReportEntry::new(templates::CLUSTER_HITS)
                .subject(declaration.attacker)
                .add(roll)
                .add(hits),
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_table_rows() {
        assert_eq!(cluster_hits(10, 2), 3);
        assert_eq!(cluster_hits(10, 7), 6);
        assert_eq!(cluster_hits(10, 12), 10);
        assert_eq!(cluster_hits(5, 9), 4);
    }

    #[test]
    fn test_cluster_scales_unlisted_sizes() {
        // 8 missiles on an average roll: 12 * 8 / 20 rounds to 5
        assert_eq!(cluster_hits(8, 7), 5);
        assert_eq!(cluster_hits(3, 2), 1);
        assert_eq!(cluster_hits(0, 12), 0);
    }

    #[test]
    fn test_cluster_never_exceeds_size() {
        for size in 1..=40 {
            for roll in 2..=12 {
                assert!(cluster_hits(size, roll) <= size);
            }
        }
    }
}
