//! Taser: a light hit followed by a discharge roll
//!
//! After the damage location is rolled, a 2d6 discharge roll is read from
//! the top of the configured table down: long shutdown, short shutdown,
//! recoil into the attacker, otherwise interference on the target.

use crate::combat::attack::AttackDeclaration;
use crate::combat::context::{AttackContext, ResolvedTarget};
use crate::combat::dispatch::HandlerKey;
use crate::combat::effects::Effect;
use crate::combat::handlers::weapon_fire::{weapon_shot, weapon_to_hit};
use crate::combat::handlers::{standard_hit, AttackBehavior, Resolution};
use crate::combat::report::{templates, ReportEntry};
use crate::combat::to_hit::ToHitProfile;
use crate::core::config::TaserTable;
use crate::core::error::Result;
use crate::core::rng::RngService;
use crate::core::types::UnitId;
use crate::units::registry::StatusEffect;

/// What a discharge roll does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discharge {
    Shutdown { rounds: u32 },
    Interference,
    Recoil,
}

impl Discharge {
    pub fn from_roll(table: &TaserTable, roll: i32) -> Self {
        if roll >= table.long_shutdown_at {
            Discharge::Shutdown {
                rounds: table.long_shutdown_rounds,
            }
        } else if roll >= table.short_shutdown_at {
            Discharge::Shutdown {
                rounds: table.short_shutdown_rounds,
            }
        } else if roll <= table.recoil_at_or_below {
            Discharge::Recoil
        } else {
            Discharge::Interference
        }
    }
}

pub struct TaserHandler;

impl AttackBehavior for TaserHandler {
    fn key(&self) -> HandlerKey {
        HandlerKey::Taser
    }

    fn to_hit(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<ToHitProfile> {
        let (attacker, weapon, target) = weapon_shot(ctx, declaration)?;
        if !matches!(target, ResolvedTarget::Unit(_)) {
            return Ok(ToHitProfile::impossible("Tasers only affect units"));
        }
        Ok(weapon_to_hit(ctx, attacker, weapon, &target))
    }

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
        let damage = self.damage(ctx, declaration)?;
        let mut out = standard_hit(ctx, declaration, profile, damage, rng)?;
        let ResolvedTarget::Unit(target) = ctx.target(declaration)? else {
            return Ok(out);
        };

        let table = &ctx.config.taser;
        let roll = rng.two_d6();
        out.report(ReportEntry::new(templates::TASER_ROLL).subject(target.id).add(roll));

        let interference = |unit: UnitId| Effect::Status {
            unit,
            status: StatusEffect::TaserInterference {
                rounds: table.interference_rounds,
                modifier: table.interference_modifier,
            },
        };

        match Discharge::from_roll(table, roll) {
            Discharge::Shutdown { rounds } => {
                out.effect(Effect::Status {
                    unit: target.id,
                    status: StatusEffect::TaserShutdown { rounds },
                });
                out.report(ReportEntry::new(templates::TASER_SHUTDOWN).subject(target.id).add(rounds));
            }
            Discharge::Recoil => {
                out.effect(interference(declaration.attacker));
                out.report(ReportEntry::new(templates::TASER_RECOIL).subject(declaration.attacker));
            }
            Discharge::Interference => {
                out.effect(interference(target.id));
                out.report(
                    ReportEntry::new(templates::TASER_INTERFERENCE)
                        .subject(target.id)
                        .add(table.interference_rounds)
                        .add(table.interference_modifier),
                );
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discharge_bands_read_top_down() {
        let table = TaserTable::default();
        assert_eq!(Discharge::from_roll(&table, 12), Discharge::Shutdown { rounds: 3 });
        assert_eq!(Discharge::from_roll(&table, 8), Discharge::Shutdown { rounds: 1 });
        assert_eq!(Discharge::from_roll(&table, 7), Discharge::Interference);
        assert_eq!(Discharge::from_roll(&table, 3), Discharge::Interference);
        assert_eq!(Discharge::from_roll(&table, 2), Discharge::Recoil);
    }
}
