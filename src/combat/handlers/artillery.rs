//! Indirect artillery fire with adjust-fire memory
//!
//! Each artillery weapon remembers, per target hex, how well its fire has
//! been walked in. A hit locks the hex in (later shots hit automatically);
//! a miss observed by a friendly unit with line of sight to the hex makes
//! the next shot easier. Misses scatter by the margin they missed by.

use crate::board::hex::{Facing, HexCoord};
use crate::board::los::Viewpoint;
use crate::combat::attack::{AttackDeclaration, HexEffect};
use crate::combat::context::{AttackContext, ResolvedTarget};
use crate::combat::dispatch::HandlerKey;
use crate::combat::effects::Effect;
use crate::combat::handlers::weapon_fire::weapon_shot;
use crate::combat::handlers::{strike_in_groups, Aim, AttackBehavior, Resolution};
use crate::combat::modifiers::{
    add_attacker_movement, add_attacker_state, add_range, common_legality, finish_chain, AttackFamily,
};
use crate::combat::report::{templates, ReportEntry};
use crate::combat::to_hit::{HitTable, SideTable, ToHitProfile};
use crate::core::error::{EngineError, Result};
use crate::core::rng::RngService;
use crate::units::combat_state::ArtilleryAdjustment;
use crate::units::registry::StatusEffect;
use crate::units::unit::Unit;

/// Penalty when the firing unit cannot see the target hex itself
pub const INDIRECT_FIRE_MODIFIER: i32 = 4;

/// The hex an artillery declaration is aimed at
fn aim_point(target: &ResolvedTarget<'_>) -> Option<HexCoord> {
    match target {
        ResolvedTarget::Unit(unit) => Some(unit.position),
        ResolvedTarget::Hex {
            coord,
            effect: HexEffect::Artillery,
        } => Some(*coord),
        ResolvedTarget::Building { coord, .. } => Some(*coord),
        ResolvedTarget::Hex { .. } => None,
    }
}

fn require_aim_point(target: &ResolvedTarget<'_>) -> Result<HexCoord> {
    aim_point(target).ok_or_else(|| EngineError::Reference {
        what: "artillery declaration has no target hex".into(),
    })
}

/// Is a friendly unit other than the shooter watching the hex?
fn spotted(ctx: &AttackContext<'_>, attacker: &Unit, hex: HexCoord) -> bool {
    ctx.units.iter().any(|u| {
        u.owner == attacker.owner
            && u.id != attacker.id
            && !u.destroyed
            && !u.is_off_board()
            && ctx.los(u.viewpoint(), Viewpoint::ground(hex)).can_see()
    })
}

/// Full damage in the impact hex, a share of it in each neighbour
fn area_damage(
    ctx: &AttackContext<'_>,
    hex: HexCoord,
    damage: i32,
    rng: &mut dyn RngService,
    out: &mut Resolution,
) -> Result<()> {
    let splash = (damage as f32 * ctx.config.artillery_splash_ratio).floor() as i32;

    let mut blast = vec![(hex, damage)];
    if splash > 0 {
        blast.extend(
            hex.neighbors()
                .into_iter()
                .filter(|n| ctx.board.contains(*n))
                .map(|n| (n, splash)),
        );
    }

    for (coord, amount) in blast {
        for unit in ctx.units.units_at(coord) {
            strike_in_groups(ctx, unit, Aim::area(), amount, rng, out)?;
        }
        if ctx.board.building_at(coord).is_some() {
            out.effect(Effect::BuildingDamage { coord, amount });
        }
    }
    Ok(())
}

pub struct ArtilleryHandler;

impl AttackBehavior for ArtilleryHandler {
    fn key(&self) -> HandlerKey {
        HandlerKey::Artillery
    }

    fn to_hit(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<ToHitProfile> {
        let (attacker, weapon, target) = weapon_shot(ctx, declaration)?;
        if let Some(reason) = common_legality(attacker, &target) {
            return Ok(ToHitProfile::impossible(reason));
        }
        if weapon.destroyed {
            return Ok(ToHitProfile::impossible("Weapon destroyed"));
        }
        let Some(hex) = aim_point(&target) else {
            return Ok(ToHitProfile::impossible("Artillery can only deliver area fire"));
        };

        let mut profile = ToHitProfile::new(attacker.gunnery, "gunnery skill");
        if !add_range(&mut profile, attacker, weapon, attacker.position.distance(&hex)) {
            return Ok(profile);
        }

        match attacker.combat.artillery.peek(weapon.id, hex) {
            Some(ArtilleryAdjustment::AutomaticHit) => {
                profile.set_automatic_success("Fire already adjusted onto the hex");
            }
            Some(ArtilleryAdjustment::Modifier(m)) => profile.add(m, "adjusted fire"),
            None => {}
        }

        if !ctx.los(attacker.viewpoint(), Viewpoint::ground(hex)).can_see() {
            profile.add(INDIRECT_FIRE_MODIFIER, "indirect fire");
        }
        add_attacker_movement(&mut profile, attacker);
        add_attacker_state(&mut profile, ctx, attacker);
        finish_chain(&mut profile, ctx, attacker, AttackFamily::Weapon);

        profile.set_tables(HitTable::None, SideTable::Front);
        Ok(profile)
    }

    fn damage(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<i32> {
        let (_, weapon, _) = weapon_shot(ctx, declaration)?;
        Ok(weapon.damage)
    }

    fn on_hit(
        &self,
        ctx: &AttackContext<'_>,
        declaration: &AttackDeclaration,
        _profile: &ToHitProfile,
        rng: &mut dyn RngService,
    ) -> Result<Resolution> {
        let (attacker, weapon, target) = weapon_shot(ctx, declaration)?;
        let hex = require_aim_point(&target)?;

        let mut out = Resolution::new();
        out.effect(Effect::Status {
            unit: attacker.id,
            status: StatusEffect::ArtilleryAdjusted {
                weapon: weapon.id,
                hex,
                adjustment: ArtilleryAdjustment::AutomaticHit,
            },
        });
        out.report(
            ReportEntry::new(templates::ARTILLERY_LOCKED_ON)
                .subject(attacker.id)
                .add(hex.q)
                .add(hex.r),
        );
        area_damage(ctx, hex, weapon.damage, rng, &mut out)?;
        Ok(out)
    }

    fn on_miss(
        &self,
        ctx: &AttackContext<'_>,
        declaration: &AttackDeclaration,
        _profile: &ToHitProfile,
        margin: i32,
        rng: &mut dyn RngService,
    ) -> Result<Resolution> {
        let (attacker, weapon, target) = weapon_shot(ctx, declaration)?;
        let hex = require_aim_point(&target)?;
        let mut out = Resolution::new();

        let current = attacker.combat.artillery.peek(weapon.id, hex).unwrap_or_default();
        let adjustment = match current {
            ArtilleryAdjustment::Modifier(m) if spotted(ctx, attacker, hex) => {
                let next = m + ctx.config.artillery_spotter_adjustment;
                out.report(ReportEntry::new(templates::ARTILLERY_ADJUSTED).subject(attacker.id).add(next));
                ArtilleryAdjustment::Modifier(next)
            }
            other => other,
        };
        out.effect(Effect::Status {
            unit: attacker.id,
            status: StatusEffect::ArtilleryAdjusted {
                weapon: weapon.id,
                hex,
                adjustment,
            },
        });

        let direction = Facing::from_index(rng.d6() - 1);
        let distance = margin.max(1) as u32;
        let landing = hex.translated(direction, distance);
        out.report(
            ReportEntry::new(templates::ARTILLERY_SCATTER)
                .subject(attacker.id)
                .add(landing.q)
                .add(landing.r)
                .add(distance),
        );

        if ctx.board.contains(landing) {
            area_damage(ctx, landing, weapon.damage, rng, &mut out)?;
        } else {
            out.report(ReportEntry::new(templates::ARTILLERY_OFF_BOARD).subject(attacker.id));
        }
        Ok(out)
    }
}
