//! Initiative and fair interleaving of turn markers
//!
//! Every category rolls two dice; ties reroll among the tied categories
//! only. The lowest roll acts first. Normal markers are then spread over
//! `m` slots, where `m` is the smallest non-zero normal count, so that a
//! large force never gets all its turns in one block.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combat::report::{templates, ReportEntry};
use crate::core::error::{EngineError, Result};
use crate::core::rng::RngService;
use crate::core::types::PlayerId;
use crate::turn::order::{TurnMarker, TurnOrder};

/// How many turns one category takes this phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contender {
    pub player: PlayerId,
    pub normal: u32,
    pub deferred: u32,
}

impl Contender {
    pub fn new(player: PlayerId, normal: u32, deferred: u32) -> Self {
        Self {
            player,
            normal,
            deferred,
        }
    }
}

/// Result of an initiative roll-off
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initiative {
    /// Acting order, first mover first
    pub ranking: Vec<PlayerId>,
    /// Every roll each category made, rerolls included
    pub rolls: BTreeMap<PlayerId, Vec<i32>>,
}

impl Initiative {
    /// Roll initiative for the given categories
    pub fn roll(players: &[PlayerId], rng: &mut dyn RngService) -> Self {
        let mut rolls = BTreeMap::new();
        let ranking = rank(players.to_vec(), rng, &mut rolls);
        info!(?ranking, "initiative rolled");
        Self { ranking, rolls }
    }

    pub fn position(&self, player: PlayerId) -> Option<usize> {
        self.ranking.iter().position(|p| *p == player)
    }

    pub fn first(&self) -> Option<PlayerId> {
        self.ranking.first().copied()
    }

    /// One report per roll, in acting order
    pub fn reports(&self) -> Vec<ReportEntry> {
        self.ranking
            .iter()
            .flat_map(|player| {
                self.rolls
                    .get(player)
                    .into_iter()
                    .flatten()
                    .map(move |roll| ReportEntry::new(templates::INITIATIVE_ROLL).add(player.0).add(*roll))
            })
            .collect()
    }

    /// Build the phase's turn order from this ranking.
    ///
    /// Every contender must have taken part in the roll.
    pub fn arrange(&self, contenders: &[Contender]) -> Result<TurnOrder> {
        let mut ordered = Vec::with_capacity(contenders.len());
        for contender in contenders {
            let position = self.position(contender.player).ok_or_else(|| EngineError::Reference {
                what: format!("player {} did not roll initiative", contender.player.0),
            })?;
            ordered.push((position, *contender));
        }
        ordered.sort_by_key(|(position, _)| *position);
        let ordered: Vec<Contender> = ordered.into_iter().map(|(_, c)| c).collect();
        interleave(&ordered)
    }
}

fn rank(players: Vec<PlayerId>, rng: &mut dyn RngService, rolls: &mut BTreeMap<PlayerId, Vec<i32>>) -> Vec<PlayerId> {
    if players.len() <= 1 {
        return players;
    }

    let mut groups: BTreeMap<i32, Vec<PlayerId>> = BTreeMap::new();
    for player in players {
        let roll = rng.two_d6();
        rolls.entry(player).or_default().push(roll);
        groups.entry(roll).or_default().push(player);
    }

    let mut ranking = Vec::new();
    for (roll, group) in groups {
        if group.len() > 1 {
            debug!(roll, tied = ?group, "initiative tie, rerolling");
        }
        ranking.extend(rank(group, rng, rolls));
    }
    ranking
}

/// Interleave contenders, already in acting order, into a turn order
pub fn interleave(contenders: &[Contender]) -> Result<TurnOrder> {
    let normal_total: u32 = contenders.iter().map(|c| c.normal).sum();
    let deferred_total: u32 = contenders.iter().map(|c| c.deferred).sum();
    let slots = contenders.iter().map(|c| c.normal).filter(|n| *n > 0).min().unwrap_or(0);

    let mut order = TurnOrder::new(normal_total as usize, deferred_total as usize, slots);
    for slot in 0..slots {
        for contender in contenders.iter().filter(|c| c.normal > 0) {
            let extra = u32::from(slot < contender.normal % slots);
            for _ in 0..contender.normal / slots + extra {
                order.push_normal(TurnMarker::new(contender.player))?;
            }
        }
    }
    for contender in contenders {
        for _ in 0..contender.deferred {
            order.push_deferred(TurnMarker::new(contender.player))?;
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::FixedDice;

    fn players(marks: &[TurnMarker]) -> Vec<u32> {
        marks.iter().map(|m| m.player.0).collect()
    }

    #[test]
    fn test_lowest_roll_acts_first() {
        let mut dice = FixedDice::new([9, 4, 7]);
        let initiative = Initiative::roll(&[PlayerId(1), PlayerId(2), PlayerId(3)], &mut dice);
        assert_eq!(initiative.ranking, vec![PlayerId(2), PlayerId(3), PlayerId(1)]);
        assert_eq!(initiative.first(), Some(PlayerId(2)));
    }

    #[test]
    fn test_ties_reroll_among_tied_only() {
        // 1 and 3 tie on 6, 2 rolls 10; the reroll gives 3 the lower total
        let mut dice = FixedDice::new([6, 10, 6, 8, 5]);
        let initiative = Initiative::roll(&[PlayerId(1), PlayerId(2), PlayerId(3)], &mut dice);
        assert_eq!(initiative.ranking, vec![PlayerId(3), PlayerId(1), PlayerId(2)]);
        assert_eq!(initiative.rolls[&PlayerId(1)], vec![6, 8]);
        assert_eq!(initiative.rolls[&PlayerId(2)], vec![10]);
        assert_eq!(dice.rolls_made(), 5);
        assert_eq!(initiative.reports().len(), 5);
    }

    #[test]
    fn test_interleave_proportional() {
        // 2 units against 5: two slots, the larger force gets 3 then 2
        let order = interleave(&[Contender::new(PlayerId(1), 2, 0), Contender::new(PlayerId(2), 5, 0)]).unwrap();
        assert_eq!(players(order.normal_markers()), vec![1, 2, 2, 2, 1, 2, 2]);
        assert_eq!(order.min_repeat(), 2);
    }

    #[test]
    fn test_interleave_skips_empty_categories() {
        let order = interleave(&[
            Contender::new(PlayerId(1), 0, 1),
            Contender::new(PlayerId(2), 3, 0),
            Contender::new(PlayerId(3), 1, 2),
        ])
        .unwrap();
        assert_eq!(players(order.normal_markers()), vec![2, 2, 2, 3]);
        assert_eq!(players(order.deferred_markers()), vec![1, 3, 3]);
        assert_eq!(order.min_repeat(), 1);
    }

    #[test]
    fn test_arrange_uses_ranking() {
        let initiative = Initiative {
            ranking: vec![PlayerId(2), PlayerId(1)],
            rolls: BTreeMap::new(),
        };
        let order = initiative
            .arrange(&[Contender::new(PlayerId(1), 1, 0), Contender::new(PlayerId(2), 1, 0)])
            .unwrap();
        assert_eq!(players(order.normal_markers()), vec![2, 1]);

        let stranger = initiative.arrange(&[Contender::new(PlayerId(9), 1, 0)]);
        assert!(matches!(stranger, Err(EngineError::Reference { .. })));
    }

    #[test]
    fn test_no_normal_turns() {
        let order = interleave(&[Contender::new(PlayerId(1), 0, 2)]).unwrap();
        assert!(!order.has_next());
        assert_eq!(order.min_repeat(), 0);
        assert_eq!(order.deferred_markers().len(), 2);
    }
}
