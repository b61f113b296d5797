//! Attack declarations, to-hit computation and resolution

pub mod attack;
pub mod context;
pub mod dispatch;
pub mod effects;
pub mod handlers;
pub mod modifiers;
pub mod report;
pub mod to_hit;

pub use attack::{AttackDeclaration, AttackKind, HexEffect, Limb, TargetRef};
pub use context::{AttackContext, Battlefield, ResolvedTarget};
pub use dispatch::{AttackOutcome, AttackResult, HandlerKey, HandlerRegistry, ResolutionStage};
pub use effects::Effect;
pub use report::{GameLog, ReportEntry, ReportSink, ReportValue};
pub use to_hit::{HitTable, SideTable, ToHitProfile, ToHitStatus};
