//! Line of sight between two board positions
//!
//! Evaluation is a pure function of the board at call time. Nothing is
//! cached; hosts that want caching key it on [`BoardChange`] events.
//!
//! [`BoardChange`]: crate::board::map::BoardChange

use serde::{Deserialize, Serialize};

use crate::board::hex::HexCoord;
use crate::board::map::BoardView;

/// Woods (and smoke) density at which sight is blocked
pub const BLOCKING_DENSITY: u32 = 3;

/// Density contributed by a smoke-filled hex
pub const SMOKE_DENSITY: u32 = 2;

/// One end of a sight line: a hex and how tall the observer/target is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewpoint {
    pub coord: HexCoord,
    /// Levels above the hex elevation the unit's top reaches
    pub height: i32,
}

impl Viewpoint {
    pub fn new(coord: HexCoord, height: i32) -> Self {
        Self { coord, height }
    }

    /// A point on the ground, e.g. an empty target hex
    pub fn ground(coord: HexCoord) -> Self {
        Self { coord, height: 0 }
    }

    fn top(&self, board: &dyn BoardView) -> i32 {
        board.elevation(self.coord) + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clarity {
    Clear,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    CanSee(Clarity),
    Blocked(String),
}

/// Result of a line-of-sight evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LosResult {
    pub visibility: Visibility,
    /// Hexes strictly between the two endpoints, in order from the observer
    pub intervening: Vec<HexCoord>,
    /// Accumulated woods and smoke density along the line
    pub density: u32,
    /// The hex in front of the target rises to cover its lower half
    pub partial_cover: bool,
}

impl LosResult {
    pub fn can_see(&self) -> bool {
        matches!(self.visibility, Visibility::CanSee(_))
    }

    pub fn blocked_reason(&self) -> Option<&str> {
        match &self.visibility {
            Visibility::Blocked(reason) => Some(reason),
            Visibility::CanSee(_) => None,
        }
    }
}

/// Evaluate sight from `from` to `to`
pub fn line_of_sight(board: &dyn BoardView, from: Viewpoint, to: Viewpoint) -> LosResult {
    let intervening = from.coord.intervening(&to.coord);

    if !board.contains(from.coord) || !board.contains(to.coord) {
        return LosResult {
            visibility: Visibility::Blocked("Position is off the board".into()),
            intervening,
            density: 0,
            partial_cover: false,
        };
    }

    let from_top = from.top(board);
    let to_top = to.top(board);
    let line_top = from_top.max(to_top);
    let line_bottom = from_top.min(to_top);
    let target_ground = board.elevation(to.coord);

    let mut density = 0;
    let mut partial_cover = false;
    let mut blocked: Option<String> = None;

    for (i, coord) in intervening.iter().enumerate() {
        let Some(hex) = board.hex(*coord) else {
            continue;
        };

        if hex.elevation > line_top {
            blocked.get_or_insert_with(|| "Intervening elevation".into());
            break;
        }

        if hex.has_standing_building() && hex.ceiling() >= line_top {
            blocked.get_or_insert_with(|| "Intervening building".into());
            break;
        }

        if hex.ceiling() > line_bottom {
            density += hex.terrain.woods_density();
        }
        if hex.smoke {
            density += SMOKE_DENSITY;
        }

        let next_to_target = i + 1 == intervening.len();
        if next_to_target && to.height > 0 && hex.elevation == target_ground + 1 && from_top <= hex.elevation + 1 {
            partial_cover = true;
        }
    }

    if blocked.is_none() && density >= BLOCKING_DENSITY {
        blocked = Some("Too much intervening woods or smoke".into());
    }

    let visibility = match blocked {
        Some(reason) => Visibility::Blocked(reason),
        None if density > 0 || partial_cover => Visibility::CanSee(Clarity::Partial),
        None => Visibility::CanSee(Clarity::Clear),
    };

    LosResult {
        visibility,
        intervening,
        density,
        partial_cover,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map::Board;
    use crate::board::terrain::{Building, Terrain};

    fn mech_at(q: i32, r: i32) -> Viewpoint {
        Viewpoint::new(HexCoord::new(q, r), 1)
    }

    #[test]
    fn test_open_ground_is_clear() {
        let board = Board::new(10, 10);
        let los = line_of_sight(&board, mech_at(0, 0), mech_at(5, 0));
        assert_eq!(los.visibility, Visibility::CanSee(Clarity::Clear));
        assert_eq!(los.intervening.len(), 4);
    }

    #[test]
    fn test_light_woods_partial_heavy_stack_blocks() {
        let mut board = Board::new(10, 10);
        board.set_terrain(HexCoord::new(2, 0), Terrain::LightWoods);
        let los = line_of_sight(&board, mech_at(0, 0), mech_at(5, 0));
        assert_eq!(los.visibility, Visibility::CanSee(Clarity::Partial));
        assert_eq!(los.density, 1);

        board.set_terrain(HexCoord::new(3, 0), Terrain::HeavyWoods);
        let los = line_of_sight(&board, mech_at(0, 0), mech_at(5, 0));
        assert!(!los.can_see());
        assert_eq!(los.density, 3);
    }

    #[test]
    fn test_endpoint_woods_do_not_count() {
        let mut board = Board::new(10, 10);
        board.set_terrain(HexCoord::new(5, 0), Terrain::HeavyWoods);
        board.set_terrain(HexCoord::new(0, 0), Terrain::HeavyWoods);
        let los = line_of_sight(&board, mech_at(0, 0), mech_at(5, 0));
        assert_eq!(los.density, 0);
    }

    #[test]
    fn test_hill_blocks() {
        let mut board = Board::new(10, 10);
        board.set_elevation(HexCoord::new(2, 0), 3);
        let los = line_of_sight(&board, mech_at(0, 0), mech_at(5, 0));
        assert_eq!(los.blocked_reason(), Some("Intervening elevation"));
    }

    #[test]
    fn test_high_observer_sees_over_hill() {
        let mut board = Board::new(10, 10);
        board.set_elevation(HexCoord::new(2, 0), 3);
        board.set_elevation(HexCoord::new(0, 0), 4);
        let los = line_of_sight(&board, mech_at(0, 0), mech_at(5, 0));
        assert!(los.can_see());
    }

    #[test]
    fn test_building_blocks() {
        let mut board = Board::new(10, 10);
        board.place_building(HexCoord::new(3, 0), Building::new("tower", 40, 3));
        let los = line_of_sight(&board, mech_at(0, 0), mech_at(5, 0));
        assert_eq!(los.blocked_reason(), Some("Intervening building"));
    }

    #[test]
    fn test_rise_before_target_gives_partial_cover() {
        let mut board = Board::new(10, 10);
        board.set_elevation(HexCoord::new(4, 0), 1);
        let los = line_of_sight(&board, mech_at(0, 0), mech_at(5, 0));
        assert!(los.partial_cover);
        assert_eq!(los.visibility, Visibility::CanSee(Clarity::Partial));
    }

    #[test]
    fn test_off_board_blocked() {
        let board = Board::new(5, 5);
        let los = line_of_sight(&board, mech_at(0, 0), mech_at(20, 0));
        assert!(!los.can_see());
    }

    #[test]
    fn test_repeat_evaluation_identical() {
        let mut board = Board::new(10, 10);
        board.set_terrain(HexCoord::new(2, 1), Terrain::LightWoods);
        board.set_smoke(HexCoord::new(3, 1), true);
        let a = line_of_sight(&board, mech_at(0, 1), mech_at(6, 1));
        let b = line_of_sight(&board, mech_at(0, 1), mech_at(6, 1));
        assert_eq!(a, b);
    }
}
