//! Round and phase driver
//!
//! Each round: initiative -> movement -> weapon declarations -> physical
//! declarations -> resolution -> end of round.
//!
//! Declarations queue up during the declaration phases and are resolved
//! one at a time, in declaration order, during resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::attack::AttackDeclaration;
use crate::combat::context::Battlefield;
use crate::combat::dispatch::{AttackOutcome, HandlerRegistry};
use crate::combat::report::{templates, GameLog, ReportEntry, ReportSink};
use crate::combat::to_hit::ToHitProfile;
use crate::core::config::RulesConfig;
use crate::core::error::{EngineError, Result};
use crate::core::rng::RngService;
use crate::core::types::{PlayerId, Round, UnitId};
use crate::turn::initiative::{Contender, Initiative};
use crate::turn::order::TurnOrder;

/// Phases of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Initiative,
    Movement,
    WeaponDeclaration,
    PhysicalDeclaration,
    Resolution,
    EndOfRound,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Initiative => "initiative",
            Phase::Movement => "movement",
            Phase::WeaponDeclaration => "weapon attack declaration",
            Phase::PhysicalDeclaration => "physical attack declaration",
            Phase::Resolution => "attack resolution",
            Phase::EndOfRound => "end of round",
        };
        f.write_str(name)
    }
}

/// Owns the battlefield and resolves attacks against it
pub struct CombatEngine<R: RngService> {
    field: Battlefield,
    handlers: HandlerRegistry,
    config: RulesConfig,
    rng: R,
    log: GameLog,
    round: Round,
    phase: Phase,
    pending: Vec<AttackDeclaration>,
}

impl<R: RngService> CombatEngine<R> {
    pub fn new(field: Battlefield, config: RulesConfig, rng: R) -> Result<Self> {
        Self::with_handlers(field, config, rng, HandlerRegistry::standard()?)
    }

    /// Engine over a custom handler set, which must cover every attack type
    pub fn with_handlers(field: Battlefield, config: RulesConfig, rng: R, handlers: HandlerRegistry) -> Result<Self> {
        config.validate()?;
        handlers.validate()?;
        Ok(Self {
            field,
            handlers,
            config,
            rng,
            log: GameLog::new(),
            round: 1,
            phase: Phase::default(),
            pending: Vec::new(),
        })
    }

    pub fn field(&self) -> &Battlefield {
        &self.field
    }

    /// Mutable access for movement and scenario setup
    pub fn field_mut(&mut self) -> &mut Battlefield {
        &mut self.field
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }

    pub fn log(&self) -> &GameLog {
        &self.log
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending(&self) -> &[AttackDeclaration] {
        &self.pending
    }

    pub fn begin_phase(&mut self, phase: Phase) {
        tracing::info!(round = self.round, %phase, "phase begins");
        self.phase = phase;
        self.log.submit(
            self.round,
            ReportEntry::new(templates::PHASE_BEGIN).add(phase.to_string()).newline(),
        );
    }

    /// Roll initiative for the contenders and build this phase's turn order
    pub fn roll_initiative(&mut self, contenders: &[Contender]) -> Result<TurnOrder> {
        let players: Vec<PlayerId> = contenders.iter().map(|c| c.player).collect();
        let initiative = Initiative::roll(&players, &mut self.rng);
        self.log.submit_all(self.round, initiative.reports());
        initiative.arrange(contenders)
    }

    /// Queue a declaration for the resolution phase.
    ///
    /// The attacker must exist; everything else is judged at resolution.
    pub fn declare(&mut self, declaration: AttackDeclaration) -> Result<()> {
        self.field.units.get(declaration.attacker)?;
        tracing::debug!(%declaration, "declared");
        self.pending.push(declaration);
        Ok(())
    }

    /// Withdraw every unresolved declaration made by `attacker`
    pub fn withdraw(&mut self, attacker: UnitId) -> Vec<AttackDeclaration> {
        let (withdrawn, kept): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|d| d.attacker == attacker);
        self.pending = kept;
        withdrawn
    }

    /// To-hit profile for a declaration against the current state
    pub fn to_hit(&self, declaration: &AttackDeclaration) -> Result<ToHitProfile> {
        let ctx = self.field.context(&self.config);
        self.handlers.to_hit(&ctx, declaration)
    }

    /// Resolve one declaration immediately and log its reports
    pub fn resolve(&mut self, declaration: &AttackDeclaration) -> Result<AttackOutcome> {
        let outcome = self
            .handlers
            .resolve(&mut self.field, &self.config, &mut self.rng, declaration)?;
        tracing::info!(%declaration, result = ?outcome.result, "attack resolved");
        self.log.submit_all(self.round, outcome.reports.clone());
        Ok(outcome)
    }

    /// Resolve every queued declaration in order.
    ///
    /// A declaration whose resolution fails is recorded as resolved with
    /// error and the rest still resolve. Any other error, a dangling
    /// reference included, stops the phase and is returned; the failing
    /// declaration and everything after it stay queued.
    pub fn resolve_all(&mut self) -> Result<Vec<AttackOutcome>> {
        let queue = std::mem::take(&mut self.pending);
        let mut outcomes = Vec::with_capacity(queue.len());
        for (i, &declaration) in queue.iter().enumerate() {
            match self.resolve(&declaration) {
                Ok(outcome) => outcomes.push(outcome),
                Err(error @ EngineError::AttackResolution { .. }) => {
                    tracing::warn!(%declaration, %error, "attack resolved with error");
                    let outcome = AttackOutcome::failed(declaration, &error);
                    self.log.submit_all(self.round, outcome.reports.clone());
                    outcomes.push(outcome);
                }
                Err(error) => {
                    self.pending = queue[i..].to_vec();
                    return Err(error);
                }
            }
        }
        Ok(outcomes)
    }

    /// Round boundary: clear searchlights, count down taser effects and
    /// start the next round
    pub fn end_round(&mut self) {
        self.phase = Phase::EndOfRound;
        for unit in self.field.units.iter_mut() {
            unit.combat.end_of_round();
        }
        self.log.submit(self.round, ReportEntry::new(templates::ROUND_END).add(self.round).newline());
        tracing::info!(round = self.round, "round ends");
        self.round += 1;
        self.phase = Phase::Initiative;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::hex::{Facing, HexCoord};
    use crate::board::map::Board;
    use crate::combat::attack::{Limb, TargetRef};
    use crate::core::rng::FixedDice;
    use crate::units::unit::{Unit, UnitClass};

    fn engine(dice: FixedDice) -> CombatEngine<FixedDice> {
        let mut field = Battlefield::new(Board::new(10, 10));
        field
            .units
            .add(Unit::new(UnitId(1), PlayerId(1), UnitClass::Mech, 50).at(HexCoord::new(2, 2), Facing::East))
            .unwrap();
        field
            .units
            .add(Unit::new(UnitId(2), PlayerId(2), UnitClass::Mech, 50).at(HexCoord::new(2, 2), Facing::West))
            .unwrap();
        CombatEngine::new(field, RulesConfig::default(), dice).unwrap()
    }

    #[test]
    fn test_dangling_reference_stops_resolution() {
        let mut engine = engine(FixedDice::empty());
        engine
            .declare(AttackDeclaration::punch(UnitId(1), TargetRef::Unit(UnitId(99)), Limb::Left))
            .unwrap();
        engine
            .declare(AttackDeclaration::punch(UnitId(1), TargetRef::Unit(UnitId(2)), Limb::Left))
            .unwrap();

        let result = engine.resolve_all();
        assert!(matches!(result, Err(EngineError::Reference { .. })));
        assert_eq!(engine.rng().rolls_made(), 0);
        assert_eq!(engine.log().with_template(templates::RESOLUTION_ERROR).count(), 0);
        assert_eq!(engine.pending().len(), 2);

        assert_eq!(engine.withdraw(UnitId(1)).len(), 2);
        assert!(engine.resolve_all().unwrap().is_empty());
    }

    #[test]
    fn test_impossible_declarations_resolve_in_order() {
        let mut engine = engine(FixedDice::empty());
        engine
            .declare(AttackDeclaration::punch(UnitId(1), TargetRef::Unit(UnitId(2)), Limb::Left))
            .unwrap();
        engine
            .declare(AttackDeclaration::kick(UnitId(2), TargetRef::Unit(UnitId(1)), Limb::Right))
            .unwrap();

        // same hex: both impossible, nothing rolled
        let outcomes = engine.resolve_all().unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o.result, crate::combat::dispatch::AttackResult::Impossible(_))));
        assert_eq!(outcomes[0].declaration.attacker, UnitId(1));
        assert_eq!(engine.rng().rolls_made(), 0);
        assert!(engine.pending().is_empty());
    }

    #[test]
    fn test_declare_requires_attacker() {
        let mut engine = engine(FixedDice::empty());
        let result = engine.declare(AttackDeclaration::punch(UnitId(42), TargetRef::Unit(UnitId(2)), Limb::Left));
        assert!(matches!(result, Err(EngineError::Reference { .. })));
    }

    #[test]
    fn test_withdraw_only_that_attacker() {
        let mut engine = engine(FixedDice::empty());
        engine
            .declare(AttackDeclaration::punch(UnitId(1), TargetRef::Unit(UnitId(2)), Limb::Left))
            .unwrap();
        engine
            .declare(AttackDeclaration::punch(UnitId(2), TargetRef::Unit(UnitId(1)), Limb::Right))
            .unwrap();
        let withdrawn = engine.withdraw(UnitId(1));
        assert_eq!(withdrawn.len(), 1);
        assert_eq!(engine.pending().len(), 1);
        assert_eq!(engine.pending()[0].attacker, UnitId(2));
    }

    #[test]
    fn test_end_round_advances_and_resets_searchlights() {
        let mut engine = engine(FixedDice::empty());
        engine.field_mut().units.get_mut(UnitId(1)).unwrap().combat.searchlight.mark_used();
        engine.begin_phase(Phase::Movement);
        engine.end_round();

        assert_eq!(engine.round(), 2);
        assert_eq!(engine.phase(), Phase::Initiative);
        assert!(!engine.field().units.get(UnitId(1)).unwrap().combat.searchlight.used_this_turn);
        assert_eq!(engine.log().with_template(templates::ROUND_END).count(), 1);
        assert_eq!(engine.log().for_round(1).count(), 2);
    }

    #[test]
    fn test_initiative_feeds_turn_order() {
        let mut engine = engine(FixedDice::new([8, 3]));
        let mut order = engine
            .roll_initiative(&[Contender::new(PlayerId(1), 1, 0), Contender::new(PlayerId(2), 1, 0)])
            .unwrap();
        assert_eq!(order.next().unwrap().player, PlayerId(2));
        assert_eq!(order.next().unwrap().player, PlayerId(1));
        assert_eq!(engine.log().with_template(templates::INITIATIVE_ROLL).count(), 2);
    }
}
