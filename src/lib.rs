//! Hexfire - hex-grid tactical combat resolution and turn sequencing

pub mod board;
pub mod combat;
pub mod core;
pub mod engine;
pub mod turn;
pub mod units;

pub use crate::engine::{CombatEngine, Phase};
