//! Dice rolling service
//!
//! Every random outcome in the engine goes through [`RngService`]. Seeded
//! play uses [`SeededDice`]; tests substitute [`FixedDice`] to script exact
//! results and to count how often the engine rolled.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Number of faces on every die the engine rolls
pub const DIE_FACES: i32 = 6;

/// Source of die rolls
pub trait RngService {
    /// Roll `n_dice` six-sided dice and return their sum.
    fn roll(&mut self, n_dice: u32) -> i32;

    /// Number of `roll` calls made so far
    fn rolls_made(&self) -> u64;

    fn d6(&mut self) -> i32 {
        self.roll(1)
    }

    fn two_d6(&mut self) -> i32 {
        self.roll(2)
    }
}

/// Reproducible dice driven by a seeded ChaCha8 stream
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: ChaCha8Rng,
    seed: u64,
    rolls: u64,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            rolls: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RngService for SeededDice {
    fn roll(&mut self, n_dice: u32) -> i32 {
        self.rolls += 1;
        (0..n_dice).map(|_| self.rng.gen_range(1..=DIE_FACES)).sum()
    }

    fn rolls_made(&self) -> u64 {
        self.rolls
    }
}

/// Scripted dice: each `roll` call returns the next queued result as-is,
/// whatever the number of dice requested.
///
/// Running out of scripted results is a broken test setup and panics.
#[derive(Debug, Clone, Default)]
pub struct FixedDice {
    results: VecDeque<i32>,
    rolls: u64,
}

impl FixedDice {
    pub fn new(results: impl IntoIterator<Item = i32>) -> Self {
        Self {
            results: results.into_iter().collect(),
            rolls: 0,
        }
    }

    /// Dice that must never be rolled
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: i32) {
        self.results.push_back(result);
    }

    pub fn remaining(&self) -> usize {
        self.results.len()
    }
}

impl RngService for FixedDice {
    fn roll(&mut self, n_dice: u32) -> i32 {
        self.rolls += 1;
        match self.results.pop_front() {
            Some(result) => result,
            None => panic!("FixedDice exhausted after {} rolls ({n_dice} dice requested)", self.rolls - 1),
        }
    }

    fn rolls_made(&self) -> u64 {
        self.rolls
    }
}
