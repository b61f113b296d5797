//! Turn order for one phase
//!
//! Two fixed-capacity collections of markers: normal turns, then turns
//! that must wait until every normal turn is taken. Each is read once,
//! front to back, through its own cursor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::types::PlayerId;

/// The right of one actor of a category to act once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnMarker {
    pub player: PlayerId,
}

impl TurnMarker {
    pub fn new(player: PlayerId) -> Self {
        Self { player }
    }
}

impl fmt::Display for TurnMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {} turn", self.player.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct MarkerQueue {
    name: &'static str,
    capacity: usize,
    markers: Vec<TurnMarker>,
    cursor: usize,
}

impl MarkerQueue {
    fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            capacity,
            markers: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    fn push(&mut self, marker: TurnMarker) -> Result<()> {
        if self.markers.len() >= self.capacity {
            return Err(EngineError::CapacityExceeded {
                collection: self.name,
                capacity: self.capacity,
            });
        }
        self.markers.push(marker);
        Ok(())
    }

    fn next(&mut self) -> Result<TurnMarker> {
        let marker = self
            .markers
            .get(self.cursor)
            .copied()
            .ok_or(EngineError::TurnOrderExhausted { collection: self.name })?;
        self.cursor += 1;
        Ok(marker)
    }

    fn has_next(&self) -> bool {
        self.cursor < self.markers.len()
    }
}

/// Turn markers for one phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOrder {
    normal: MarkerQueue,
    deferred: MarkerQueue,
    min_repeat: u32,
}

impl TurnOrder {
    /// Empty order able to hold exactly `normal` and `deferred` markers
    pub fn new(normal: usize, deferred: usize, min_repeat: u32) -> Self {
        Self {
            normal: MarkerQueue::new("normal", normal),
            deferred: MarkerQueue::new("deferred", deferred),
            min_repeat,
        }
    }

    pub fn push_normal(&mut self, marker: TurnMarker) -> Result<()> {
        self.normal.push(marker)
    }

    pub fn push_deferred(&mut self, marker: TurnMarker) -> Result<()> {
        self.deferred.push(marker)
    }

    /// Next normal marker. Never falls through to the deferred markers.
    pub fn next(&mut self) -> Result<TurnMarker> {
        self.normal.next()
    }

    pub fn next_deferred(&mut self) -> Result<TurnMarker> {
        self.deferred.next()
    }

    pub fn has_next(&self) -> bool {
        self.normal.has_next()
    }

    pub fn has_next_deferred(&self) -> bool {
        self.deferred.has_next()
    }

    /// Fewest times any category repeats among the normal markers
    pub fn min_repeat(&self) -> u32 {
        self.min_repeat
    }

    pub fn normal_markers(&self) -> &[TurnMarker] {
        &self.normal.markers
    }

    pub fn deferred_markers(&self) -> &[TurnMarker] {
        &self.deferred.markers
    }

    /// Markers not yet handed out, normal first
    pub fn remaining(&self) -> impl Iterator<Item = &TurnMarker> {
        self.normal.markers[self.normal.cursor..]
            .iter()
            .chain(&self.deferred.markers[self.deferred.cursor..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(p: u32) -> TurnMarker {
        TurnMarker::new(PlayerId(p))
    }

    #[test]
    fn test_normal_then_exhausted() {
        let mut order = TurnOrder::new(2, 1, 1);
        order.push_normal(marker(1)).unwrap();
        order.push_normal(marker(2)).unwrap();
        order.push_deferred(marker(3)).unwrap();

        assert_eq!(order.next().unwrap(), marker(1));
        assert_eq!(order.next().unwrap(), marker(2));
        assert!(!order.has_next());
        assert!(matches!(
            order.next(),
            Err(EngineError::TurnOrderExhausted { collection: "normal" })
        ));

        // the deferred marker is still there
        assert!(order.has_next_deferred());
        assert_eq!(order.next_deferred().unwrap(), marker(3));
    }

    #[test]
    fn test_capacity_enforced() {
        let mut order = TurnOrder::new(1, 0, 1);
        order.push_normal(marker(1)).unwrap();
        assert!(matches!(
            order.push_normal(marker(2)),
            Err(EngineError::CapacityExceeded {
                collection: "normal",
                capacity: 1
            })
        ));
        assert!(matches!(
            order.push_deferred(marker(2)),
            Err(EngineError::CapacityExceeded {
                collection: "deferred",
                capacity: 0
            })
        ));
    }

    #[test]
    fn test_remaining_tracks_cursors() {
        let mut order = TurnOrder::new(2, 1, 1);
        order.push_normal(marker(1)).unwrap();
        order.push_normal(marker(2)).unwrap();
        order.push_deferred(marker(3)).unwrap();
        order.next().unwrap();

        let rest: Vec<_> = order.remaining().copied().collect();
        assert_eq!(rest, vec![marker(2), marker(3)]);
    }
}
