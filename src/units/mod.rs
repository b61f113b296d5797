//! Units, their hit locations and transient combat state

pub mod combat_state;
pub mod locations;
pub mod registry;
pub mod unit;

pub use combat_state::{ArtilleryAdjustment, ArtilleryMemory, CombatState, SearchlightState, TaserState};
pub use locations::Location;
pub use registry::{DamageOutcome, StatusEffect, UnitRegistry};
pub use unit::{Movement, MovementMode, Quirk, Unit, UnitClass, Weapon, WeaponFamily};
