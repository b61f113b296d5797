//! Hex coordinate system for the board (axial coordinates)
//!
//! Uses axial coordinates (q, r) with pointy-top hexes. Bearings are measured
//! in degrees counter-clockwise from east, with north up.

use serde::{Deserialize, Serialize};

/// Axial hex coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Cube coordinate S (derived from q and r)
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Distance in hexes
    pub fn distance(&self, other: &Self) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    pub fn is_adjacent(&self, other: &Self) -> bool {
        self.distance(other) == 1
    }

    /// The neighbouring hex in a direction
    pub fn neighbor(&self, direction: Facing) -> HexCoord {
        let offset = direction.offset();
        HexCoord::new(self.q + offset.q, self.r + offset.r)
    }

    /// Move `steps` hexes in a direction
    pub fn translated(&self, direction: Facing, steps: u32) -> HexCoord {
        let offset = direction.offset();
        let steps = steps as i32;
        HexCoord::new(self.q + offset.q * steps, self.r + offset.r * steps)
    }

    /// Get all 6 neighboring hex coordinates
    pub fn neighbors(&self) -> [HexCoord; 6] {
        Facing::all().map(|direction| self.neighbor(direction))
    }

    /// Get hex coordinates in a line from self to other (inclusive)
    pub fn line_to(&self, other: &Self) -> Vec<HexCoord> {
        let n = self.distance(other) as i32;
        if n == 0 {
            return vec![*self];
        }

        // Nudge off exact hex edges so ties always break the same way
        const NUDGE: f64 = 1e-6;
        let mut results = Vec::with_capacity((n + 1) as usize);
        for i in 0..=n {
            let t = i as f64 / n as f64;
            let q = self.q as f64 + NUDGE + (other.q - self.q) as f64 * t;
            let r = self.r as f64 + NUDGE + (other.r - self.r) as f64 * t;
            results.push(Self::round(q, r));
        }
        results
    }

    /// Hexes strictly between self and other
    pub fn intervening(&self, other: &Self) -> Vec<HexCoord> {
        let line = self.line_to(other);
        if line.len() <= 2 {
            return Vec::new();
        }
        line[1..line.len() - 1].to_vec()
    }

    /// Round floating point hex to nearest integer hex
    fn round(q: f64, r: f64) -> Self {
        let s = -q - r;
        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let q_diff = (rq - q).abs();
        let r_diff = (rr - r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        }

        Self::new(rq as i32, rr as i32)
    }

    /// Bearing from self to other in degrees [0, 360)
    pub fn bearing_to(&self, other: &Self) -> f64 {
        let dq = (other.q - self.q) as f64;
        let dr = (other.r - self.r) as f64;
        let x = 3f64.sqrt() * (dq + dr / 2.0);
        let y = -1.5 * dr;
        y.atan2(x).to_degrees().rem_euclid(360.0)
    }

    /// Bearing to `other` measured from a facing, in degrees [0, 360).
    ///
    /// Rounded to a millionth of a degree so hexes on an arc boundary land
    /// on the exact boundary value for every facing.
    pub fn relative_bearing(&self, facing: Facing, other: &Self) -> f64 {
        let raw = (self.bearing_to(other) - facing.degrees()).rem_euclid(360.0);
        ((raw * 1e6).round() / 1e6).rem_euclid(360.0)
    }
}

/// Direction a unit faces, one per hexside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Facing {
    #[default]
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl Facing {
    /// Get the hex offset for this direction
    pub fn offset(&self) -> HexCoord {
        match self {
            Facing::East => HexCoord::new(1, 0),
            Facing::NorthEast => HexCoord::new(1, -1),
            Facing::NorthWest => HexCoord::new(0, -1),
            Facing::West => HexCoord::new(-1, 0),
            Facing::SouthWest => HexCoord::new(-1, 1),
            Facing::SouthEast => HexCoord::new(0, 1),
        }
    }

    /// Get opposite direction
    pub fn opposite(&self) -> Self {
        match self {
            Facing::East => Facing::West,
            Facing::NorthEast => Facing::SouthWest,
            Facing::NorthWest => Facing::SouthEast,
            Facing::West => Facing::East,
            Facing::SouthWest => Facing::NorthEast,
            Facing::SouthEast => Facing::NorthWest,
        }
    }

    pub fn index(&self) -> u8 {
        match self {
            Facing::East => 0,
            Facing::NorthEast => 1,
            Facing::NorthWest => 2,
            Facing::West => 3,
            Facing::SouthWest => 4,
            Facing::SouthEast => 5,
        }
    }

    /// Facing for a hexside index; wraps modulo 6
    pub fn from_index(index: i32) -> Self {
        Self::all()[index.rem_euclid(6) as usize]
    }

    pub fn degrees(&self) -> f64 {
        self.index() as f64 * 60.0
    }

    /// All directions
    pub fn all() -> [Facing; 6] {
        [
            Facing::East,
            Facing::NorthEast,
            Facing::NorthWest,
            Facing::West,
            Facing::SouthWest,
            Facing::SouthEast,
        ]
    }
}

/// Arc a weapon or device can cover relative to the mounting unit's facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FiringArc {
    #[default]
    Forward,
    Rear,
    Turret,
}

impl FiringArc {
    /// Is `target` inside this arc for a unit at `origin` facing `facing`?
    ///
    /// A target in the unit's own hex is always inside.
    pub fn contains(&self, origin: HexCoord, facing: Facing, target: HexCoord) -> bool {
        if origin == target {
            return true;
        }
        let rel = origin.relative_bearing(facing, &target);
        match self {
            FiringArc::Forward => rel <= 60.0 || rel >= 300.0,
            FiringArc::Rear => (120.0..=240.0).contains(&rel),
            FiringArc::Turret => true,
        }
    }
}
