//! Attack-type handlers
//!
//! Every attack type implements [`AttackBehavior`]: its legality checks and
//! modifier chain, its damage formula, and any resolution beyond "roll a
//! location and apply damage". Handlers read the battlefield through an
//! [`AttackContext`] and return staged [`Effect`]s; they never mutate.

pub mod artillery;
pub mod physical;
pub mod searchlight;
pub mod taser;
pub mod weapon_fire;

pub use artillery::ArtilleryHandler;
pub use physical::{ChargeHandler, KickHandler, ProtoStrikeHandler, PunchHandler};
pub use searchlight::SearchlightHandler;
pub use taser::TaserHandler;
pub use weapon_fire::{ClusterFireHandler, DirectFireHandler};

use crate::combat::attack::{AttackDeclaration, HexEffect};
use crate::combat::context::{AttackContext, ResolvedTarget};
use crate::combat::dispatch::HandlerKey;
use crate::combat::effects::Effect;
use crate::combat::report::{templates, ReportEntry};
use crate::combat::to_hit::{HitTable, SideTable, ToHitProfile};
use crate::core::error::Result;
use crate::core::rng::RngService;
use crate::units::unit::Unit;

/// Damage is dealt in groups of this size by cluster and area attacks
pub const DAMAGE_GROUP: i32 = 5;

/// Effects and reports a handler produced for one attack
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub effects: Vec<Effect>,
    pub reports: Vec<ReportEntry>,
}

impl Resolution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn report(&mut self, entry: ReportEntry) {
        self.reports.push(entry);
    }
}

pub trait AttackBehavior: Send + Sync {
    fn key(&self) -> HandlerKey;

    /// Legality checks and the modifier chain. Must not mutate anything.
    fn to_hit(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<ToHitProfile>;

    /// Base damage of a successful attack
    fn damage(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<i32>;

    /// Whether a possible attack rolls against its target number
    fn rolls_to_hit(&self) -> bool {
        true
    }

    fn on_hit(
        &self,
        ctx: &AttackContext<'_>,
        declaration: &AttackDeclaration,
        profile: &ToHitProfile,
        rng: &mut dyn RngService,
    ) -> Result<Resolution> {
        let damage = self.damage(ctx, declaration)?;
        standard_hit(ctx, declaration, profile, damage, rng)
    }

    /// `margin` is how far the roll fell short (zero for automatic failures)
    fn on_miss(
        &self,
        _ctx: &AttackContext<'_>,
        _declaration: &AttackDeclaration,
        _profile: &ToHitProfile,
        _margin: i32,
        _rng: &mut dyn RngService,
    ) -> Result<Resolution> {
        Ok(Resolution::new())
    }
}

/// How a hit picks its location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aim {
    pub table: HitTable,
    pub side: SideTable,
    pub partial_cover: bool,
}

impl Aim {
    pub fn from_profile(profile: &ToHitProfile) -> Self {
        Self {
            table: profile.hit_table(),
            side: profile.side_table(),
            partial_cover: profile.partial_cover(),
        }
    }

    /// Area effects strike the front on the normal table
    pub fn area() -> Self {
        Self {
            table: HitTable::Normal,
            side: SideTable::Front,
            partial_cover: false,
        }
    }
}

/// Roll one location and stage `damage` there.
///
/// Leg hits on a unit behind partial cover strike the cover instead.
pub fn strike_unit(
    ctx: &AttackContext<'_>,
    target: &Unit,
    aim: Aim,
    damage: i32,
    rng: &mut dyn RngService,
    out: &mut Resolution,
) -> Result<()> {
    let Some(location) = ctx.units.roll_hit_location(target.id, aim.table, aim.side, rng)? else {
        return Ok(());
    };
    if aim.partial_cover && location.is_leg() {
        out.report(
            ReportEntry::new(templates::COVER_ABSORBED)
                .subject(target.id)
                .add(format!("{location:?}")),
        );
        return Ok(());
    }
    out.effect(Effect::Damage {
        unit: target.id,
        location,
        amount: damage,
    });
    Ok(())
}

/// Split `total` into groups and roll a location for each
pub fn strike_in_groups(
    ctx: &AttackContext<'_>,
    target: &Unit,
    aim: Aim,
    total: i32,
    rng: &mut dyn RngService,
    out: &mut Resolution,
) -> Result<()> {
    let mut remaining = total;
    while remaining > 0 {
        let group = remaining.min(DAMAGE_GROUP);
        strike_unit(ctx, target, aim, group, rng, out)?;
        remaining -= group;
    }
    Ok(())
}

/// The common hit path: damage a unit, a building, or act on a hex
pub fn standard_hit(
    ctx: &AttackContext<'_>,
    declaration: &AttackDeclaration,
    profile: &ToHitProfile,
    damage: i32,
    rng: &mut dyn RngService,
) -> Result<Resolution> {
    let mut out = Resolution::new();
    match ctx.target(declaration)? {
        ResolvedTarget::Unit(unit) => {
            strike_unit(ctx, unit, Aim::from_profile(profile), damage, rng, &mut out)?
        }
        ResolvedTarget::Building { coord, .. } => out.effect(Effect::BuildingDamage { coord, amount: damage }),
        ResolvedTarget::Hex {
            coord,
            effect: HexEffect::Ignite,
        } => out.effect(Effect::Ignite { coord }),
        ResolvedTarget::Hex {
            coord,
            effect: HexEffect::Clear,
        } => out.effect(Effect::ClearWoods { coord }),
        ResolvedTarget::Hex {
            effect: HexEffect::Artillery | HexEffect::Illuminate,
            ..
        } => {}
    }
    Ok(out)
}

/// Half damage, rounded up, for a limb fighting under water
pub fn submerged_damage(damage: i32) -> i32 {
    (damage + 1) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submerged_rounds_up() {
        assert_eq!(submerged_damage(5), 3);
        assert_eq!(submerged_damage(10), 5);
        assert_eq!(submerged_damage(1), 1);
    }
}
