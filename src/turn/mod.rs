//! Turn sequencing within a phase

pub mod initiative;
pub mod order;

pub use initiative::{interleave, Contender, Initiative};
pub use order::{TurnMarker, TurnOrder};
