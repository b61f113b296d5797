//! Handler registry and the resolution pipeline
//!
//! Resolving one declaration walks a fixed sequence of stages:
//! declared, to-hit computed, then either impossible (nothing rolled or
//! changed) or rolled, side effects applied, reported. Any failure after
//! the to-hit stage aborts the whole attack with
//! [`EngineError::AttackResolution`] before a single effect is committed.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::combat::attack::{AttackDeclaration, AttackKind};
use crate::combat::context::{AttackContext, Battlefield};
use crate::combat::effects;
use crate::combat::handlers::{
    ArtilleryHandler, AttackBehavior, ChargeHandler, ClusterFireHandler, DirectFireHandler, KickHandler,
    ProtoStrikeHandler, PunchHandler, Resolution, SearchlightHandler, TaserHandler,
};
use crate::combat::report::{templates, ReportEntry};
use crate::combat::to_hit::{ToHitProfile, ToHitStatus};
use crate::core::config::RulesConfig;
use crate::core::error::{EngineError, Result};
use crate::core::rng::RngService;
use crate::units::registry::UnitRegistry;
use crate::units::unit::WeaponFamily;

/// One handler per attack type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandlerKey {
    DirectFire,
    ClusterFire,
    Artillery,
    Taser,
    Punch,
    Kick,
    Charge,
    ProtoStrike,
    Searchlight,
}

impl HandlerKey {
    pub const ALL: [HandlerKey; 9] = [
        HandlerKey::DirectFire,
        HandlerKey::ClusterFire,
        HandlerKey::Artillery,
        HandlerKey::Taser,
        HandlerKey::Punch,
        HandlerKey::Kick,
        HandlerKey::Charge,
        HandlerKey::ProtoStrike,
        HandlerKey::Searchlight,
    ];

    /// Pick the handler for a declaration. Weapon fire is keyed by the
    /// weapon's family, so the weapon must exist.
    pub fn for_declaration(units: &UnitRegistry, declaration: &AttackDeclaration) -> Result<Self> {
        Ok(match declaration.kind {
            AttackKind::WeaponFire { weapon } => {
                let attacker = units.get(declaration.attacker)?;
                let weapon = attacker.weapon(weapon).ok_or_else(|| EngineError::Reference {
                    what: format!("{} has no {weapon}", attacker.id),
                })?;
                match weapon.family {
                    WeaponFamily::Direct => HandlerKey::DirectFire,
                    WeaponFamily::Cluster { .. } => HandlerKey::ClusterFire,
                    WeaponFamily::Artillery => HandlerKey::Artillery,
                    WeaponFamily::Taser => HandlerKey::Taser,
                }
            }
            AttackKind::Punch { .. } => HandlerKey::Punch,
            AttackKind::Kick { .. } => HandlerKey::Kick,
            AttackKind::Charge => HandlerKey::Charge,
            AttackKind::ProtoStrike => HandlerKey::ProtoStrike,
            AttackKind::Searchlight => HandlerKey::Searchlight,
        })
    }
}

/// Where an attack's resolution has got to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionStage {
    Declared,
    ToHitComputed,
    Impossible,
    RolledHit,
    RolledMiss,
    SideEffectsApplied,
    Reported,
    ResolvedWithError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackResult {
    Impossible(String),
    /// `roll` is `None` when the attack succeeded without rolling
    Hit { roll: Option<i32> },
    Miss { roll: Option<i32> },
    ResolvedWithError(String),
}

/// Everything that happened to one declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub declaration: AttackDeclaration,
    pub handler: Option<HandlerKey>,
    pub profile: Option<ToHitProfile>,
    pub result: AttackResult,
    pub stages: Vec<ResolutionStage>,
    pub reports: Vec<ReportEntry>,
}

impl AttackOutcome {
    /// Outcome for a declaration whose resolution failed
    pub fn failed(declaration: AttackDeclaration, error: &EngineError) -> Self {
        let handler = match error {
            EngineError::AttackResolution { handler, .. } => Some(*handler),
            EngineError::MissingHandler(key) => Some(*key),
            _ => None,
        };
        let reason = error.to_string();
        Self {
            declaration,
            handler,
            profile: None,
            result: AttackResult::ResolvedWithError(reason.clone()),
            stages: vec![ResolutionStage::Declared, ResolutionStage::ResolvedWithError],
            reports: vec![ReportEntry::new(templates::RESOLUTION_ERROR)
                .subject(declaration.attacker)
                .add(reason)],
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self.result, AttackResult::Hit { .. })
    }

    pub fn final_stage(&self) -> Option<ResolutionStage> {
        self.stages.last().copied()
    }
}

/// The complete set of attack handlers
pub struct HandlerRegistry {
    handlers: AHashMap<HandlerKey, Box<dyn AttackBehavior>>,
}

impl HandlerRegistry {
    /// Empty registry; call [`validate`](Self::validate) once populated
    pub fn empty() -> Self {
        Self {
            handlers: AHashMap::new(),
        }
    }

    /// Registry with every built-in handler, checked for totality
    pub fn standard() -> Result<Self> {
        let mut registry = Self::empty();
        registry.register(Box::new(DirectFireHandler));
        registry.register(Box::new(ClusterFireHandler));
        registry.register(Box::new(ArtilleryHandler));
        registry.register(Box::new(TaserHandler));
        registry.register(Box::new(PunchHandler));
        registry.register(Box::new(KickHandler));
        registry.register(Box::new(ChargeHandler));
        registry.register(Box::new(ProtoStrikeHandler));
        registry.register(Box::new(SearchlightHandler));
        registry.validate()?;
        Ok(registry)
    }

    /// Add or replace the handler for its key
    pub fn register(&mut self, handler: Box<dyn AttackBehavior>) {
        self.handlers.insert(handler.key(), handler);
    }

    /// Fail if any attack type has no handler
    pub fn validate(&self) -> Result<()> {
        match HandlerKey::ALL.iter().find(|key| !self.handlers.contains_key(key)) {
            Some(missing) => Err(EngineError::MissingHandler(*missing)),
            None => Ok(()),
        }
    }

    pub fn get(&self, key: HandlerKey) -> Result<&dyn AttackBehavior> {
        self.handlers
            .get(&key)
            .map(|h| h.as_ref())
            .ok_or(EngineError::MissingHandler(key))
    }

    /// Compute the to-hit profile without changing anything
    pub fn to_hit(&self, ctx: &AttackContext<'_>, declaration: &AttackDeclaration) -> Result<ToHitProfile> {
        let key = HandlerKey::for_declaration(ctx.units, declaration)?;
        self.get(key)?.to_hit(ctx, declaration)
    }

    /// Resolve one declaration against the battlefield.
    ///
    /// Reference errors in the declaration itself are returned unchanged;
    /// anything that goes wrong after the to-hit stage is wrapped in
    /// [`EngineError::AttackResolution`]. Either way nothing is committed.
    pub fn resolve(
        &self,
        field: &mut Battlefield,
        config: &RulesConfig,
        rng: &mut dyn RngService,
        declaration: &AttackDeclaration,
    ) -> Result<AttackOutcome> {
        let key = HandlerKey::for_declaration(&field.units, declaration)?;
        let handler = self.get(key)?;
        let mut stages = vec![ResolutionStage::Declared];
        let mut reports = vec![ReportEntry::new(templates::ATTACK_DECLARED)
            .subject(declaration.attacker)
            .add(declaration.kind.label())
            .add(declaration.target.to_string())];

        let wrap = |error: EngineError| EngineError::AttackResolution {
            declaration: Box::new(*declaration),
            handler: key,
            reason: error.to_string(),
        };

        let (profile, result, resolution) = {
            let ctx = field.context(config);
            let profile = handler.to_hit(&ctx, declaration)?;
            stages.push(ResolutionStage::ToHitComputed);
            debug!(%declaration, handler = ?key, to_hit = %profile, "to-hit computed");

            let (result, resolution) = match profile.status() {
                ToHitStatus::Impossible(reason) => {
                    reports.push(ReportEntry::new(templates::TO_HIT_IMPOSSIBLE).add(reason.clone()));
                    stages.push(ResolutionStage::Impossible);
                    stages.push(ResolutionStage::Reported);
                    return Ok(AttackOutcome {
                        declaration: *declaration,
                        handler: Some(key),
                        profile: Some(profile),
                        result: AttackResult::Impossible(reason),
                        stages,
                        reports,
                    });
                }
                ToHitStatus::AutomaticSuccess(reason) => {
                    reports.push(ReportEntry::new(templates::TO_HIT_AUTOMATIC_SUCCESS).add(reason));
                    stages.push(ResolutionStage::RolledHit);
                    let resolution = handler.on_hit(&ctx, declaration, &profile, rng).map_err(wrap)?;
                    (AttackResult::Hit { roll: None }, resolution)
                }
                ToHitStatus::AutomaticFailure(reason) => {
                    reports.push(ReportEntry::new(templates::TO_HIT_AUTOMATIC_FAILURE).add(reason));
                    stages.push(ResolutionStage::RolledMiss);
                    let resolution = handler.on_miss(&ctx, declaration, &profile, 0, rng).map_err(wrap)?;
                    (AttackResult::Miss { roll: None }, resolution)
                }
                ToHitStatus::Possible(_) if !handler.rolls_to_hit() => {
                    stages.push(ResolutionStage::RolledHit);
                    let resolution = handler.on_hit(&ctx, declaration, &profile, rng).map_err(wrap)?;
                    (AttackResult::Hit { roll: None }, resolution)
                }
                ToHitStatus::Possible(target) => {
                    reports.push(
                        ReportEntry::new(templates::TO_HIT_NUMBER)
                            .add(target)
                            .add(profile.to_string()),
                    );
                    let roll = rng.roll(config.to_hit_dice);
                    trace!(roll, target, "to-hit roll");
                    if roll >= target {
                        reports.push(ReportEntry::new(templates::ROLL_HIT).add(roll));
                        stages.push(ResolutionStage::RolledHit);
                        let resolution = handler.on_hit(&ctx, declaration, &profile, rng).map_err(wrap)?;
                        (AttackResult::Hit { roll: Some(roll) }, resolution)
                    } else {
                        reports.push(ReportEntry::new(templates::ROLL_MISS).add(roll));
                        stages.push(ResolutionStage::RolledMiss);
                        let resolution = handler
                            .on_miss(&ctx, declaration, &profile, target - roll, rng)
                            .map_err(wrap)?;
                        (AttackResult::Miss { roll: Some(roll) }, resolution)
                    }
                }
            };
            (profile, result, resolution)
        };

        let Resolution {
            effects: staged,
            reports: handler_reports,
        } = resolution;
        effects::validate(&staged, &field.board, &field.units).map_err(wrap)?;
        let committed = effects::commit(staged, field).map_err(wrap)?;
        stages.push(ResolutionStage::SideEffectsApplied);

        reports.extend(handler_reports);
        reports.extend(committed);
        stages.push(ResolutionStage::Reported);

        Ok(AttackOutcome {
            declaration: *declaration,
            handler: Some(key),
            profile: Some(profile),
            result,
            stages,
            reports,
        })
    }
}
