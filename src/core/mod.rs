pub mod config;
pub mod error;
pub mod rng;
pub mod types;

pub use config::{Environment, LightCondition, RulesConfig};
pub use error::{EngineError, Result};
pub use rng::{FixedDice, RngService, SeededDice};
pub use types::{PlayerId, Round, UnitId, WeaponId};
