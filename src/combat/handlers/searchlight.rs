//! Searchlight sweeps
//!
//! A sweep never rolls. It lights every unit along the beam that the
//! attacker can see, including units in the target hex, and uses up the
//! searchlight for the round.

use crate::board::hex::FiringArc;
use crate::combat::attack::{AttackDeclaration, HexEffect};
use crate::combat::context::{AttackContext, ResolvedTarget};
use crate::combat::dispatch::HandlerKey;
use crate::combat::effects::Effect;
use crate::combat::handlers::{AttackBehavior, Resolution};
use crate::combat::modifiers::{common_legality, crosses_building_wall};
use crate::combat::report::{templates, ReportEntry};
use crate::combat::to_hit::{HitTable, SideTable, ToHitProfile};
use crate::core::error::Result;
use crate::core::rng::RngService;
use crate::units::registry::StatusEffect;

pub struct SearchlightHandler;

impl AttackBehavior for SearchlightHandler {
    fn key(&self) -> HandlerKey {
        HandlerKey::Searchlight
    }

    fn to_hit(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<ToHitProfile> {
        let attacker = ctx.attacker(declaration)?;
        let target = ctx.target(declaration)?;

        if let Some(reason) = common_legality(attacker, &target) {
            return Ok(ToHitProfile::impossible(reason));
        }
        match target {
            ResolvedTarget::Building { .. } => {
                return Ok(ToHitProfile::impossible("Searchlights sweep units or open hexes"));
            }
            ResolvedTarget::Hex { effect, .. } if effect != HexEffect::Illuminate => {
                return Ok(ToHitProfile::impossible("Searchlights can only illuminate"));
            }
            _ => {}
        }
        if !attacker.has_searchlight || !attacker.searchlight_on {
            return Ok(ToHitProfile::impossible("No active searchlight"));
        }
        if attacker.combat.searchlight.used_this_turn {
            return Ok(ToHitProfile::impossible("Searchlight already used this round"));
        }

        let to = target.position();
        if attacker.position.distance(&to) > ctx.config.searchlight_range {
            return Ok(ToHitProfile::impossible("Target out of searchlight range"));
        }
        if !FiringArc::Forward.contains(attacker.position, attacker.facing, to) {
            return Ok(ToHitProfile::impossible("Target not in forward arc"));
        }
        if crosses_building_wall(ctx.board, attacker.position, to) {
            return Ok(ToHitProfile::impossible("Cannot sweep into or out of a building"));
        }
        if let Some(reason) = ctx.los(attacker.viewpoint(), target.viewpoint()).blocked_reason() {
            return Ok(ToHitProfile::impossible(format!("No line of sight: {reason}")));
        }

        Ok(ToHitProfile::automatic_success("Searchlight sweep").with_tables(HitTable::None, SideTable::Front))
    }

    fn damage(&self, _ctx: &AttackContext<'_>, _declaration: &AttackDeclaration) -> Result<i32> {
        Ok(0)
    }

    fn rolls_to_hit(&self) -> bool {
        false
    }

    fn on_hit(
        &self,
        ctx: &AttackContext<'_>,
        declaration: &AttackDeclaration,
        _profile: &ToHitProfile,
        _rng: &mut dyn RngService,
    ) -> Result<Resolution> {
        let attacker = ctx.attacker(declaration)?;
        let target = ctx.target(declaration)?;
        let mut out = Resolution::new();

        out.effect(Effect::Status {
            unit: attacker.id,
            status: StatusEffect::SearchlightUsed,
        });

        let beam = attacker.position.line_to(&target.position());
        for coord in beam.into_iter().skip(1).filter(|c| ctx.board.contains(*c)) {
            for unit in ctx.units.units_at(coord) {
                if unit.id == attacker.id || !ctx.los(attacker.viewpoint(), unit.viewpoint()).can_see() {
                    continue;
                }
                out.effect(Effect::Status {
                    unit: unit.id,
                    status: StatusEffect::Illuminated,
                });
                out.report(ReportEntry::new(templates::SEARCHLIGHT_ILLUMINATES).subject(unit.id));
            }
        }
        Ok(out)
    }
}
