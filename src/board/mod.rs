//! Board model - hex grid, terrain, buildings and line of sight

pub mod hex;
pub mod los;
pub mod map;
pub mod terrain;

pub use hex::{Facing, FiringArc, HexCoord};
pub use los::{line_of_sight, Clarity, LosResult, Viewpoint, Visibility};
pub use map::{Board, BoardChange, BoardView, Hex};
pub use terrain::{Building, Terrain};
