//! To-hit profiles: the modifier chain result for a single attack
//!
//! A profile accumulates a base value and labelled deltas. Once a terminal
//! verdict (impossible, automatic success or failure) is recorded, later
//! modifiers are ignored and the first verdict stands.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which hit-location table a successful hit rolls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HitTable {
    #[default]
    Normal,
    Punch,
    Kick,
    /// Attacks that strike no location (illumination, area effects)
    None,
}

/// Which side of the target faces the attacker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SideTable {
    #[default]
    Front,
    Left,
    Right,
    Rear,
}

impl SideTable {
    /// Classify a bearing relative to the target's facing (degrees, [0, 360)).
    ///
    /// The front table covers the three forward hexsides; each side and the
    /// rear get one hexside wedge. Boundary bearings fall to the front, then
    /// to the side.
    pub fn from_relative_bearing(bearing: f64) -> Self {
        if bearing > 90.0 && bearing <= 150.0 {
            SideTable::Left
        } else if bearing > 150.0 && bearing < 210.0 {
            SideTable::Rear
        } else if (210.0..270.0).contains(&bearing) {
            SideTable::Right
        } else {
            SideTable::Front
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub delta: i32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToHitStatus {
    /// Roll this number or higher to hit
    Possible(i32),
    AutomaticSuccess(String),
    AutomaticFailure(String),
    Impossible(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum Verdict {
    AutomaticSuccess(String),
    AutomaticFailure(String),
    Impossible(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToHitProfile {
    base: i32,
    base_label: String,
    modifiers: Vec<Modifier>,
    hit_table: HitTable,
    side_table: SideTable,
    /// Lower half of the target is behind cover; leg hits strike the cover
    partial_cover: bool,
    verdict: Option<Verdict>,
}

impl ToHitProfile {
    pub fn new(base: i32, label: impl Into<String>) -> Self {
        Self {
            base,
            base_label: label.into(),
            modifiers: Vec::new(),
            hit_table: HitTable::Normal,
            side_table: SideTable::Front,
            partial_cover: false,
            verdict: None,
        }
    }

    pub fn impossible(reason: impl Into<String>) -> Self {
        let mut profile = Self::new(0, "impossible");
        profile.set_impossible(reason);
        profile
    }

    pub fn automatic_success(reason: impl Into<String>) -> Self {
        let mut profile = Self::new(0, "automatic");
        profile.set_automatic_success(reason);
        profile
    }

    /// Append a modifier; zero deltas are dropped
    pub fn add(&mut self, delta: i32, label: impl Into<String>) {
        if self.verdict.is_some() || delta == 0 {
            return;
        }
        self.modifiers.push(Modifier {
            delta,
            label: label.into(),
        });
    }

    pub fn set_impossible(&mut self, reason: impl Into<String>) {
        self.verdict.get_or_insert_with(|| Verdict::Impossible(reason.into()));
    }

    pub fn set_automatic_success(&mut self, reason: impl Into<String>) {
        self.verdict
            .get_or_insert_with(|| Verdict::AutomaticSuccess(reason.into()));
    }

    pub fn set_automatic_failure(&mut self, reason: impl Into<String>) {
        self.verdict
            .get_or_insert_with(|| Verdict::AutomaticFailure(reason.into()));
    }

    pub fn with_tables(mut self, hit_table: HitTable, side_table: SideTable) -> Self {
        self.hit_table = hit_table;
        self.side_table = side_table;
        self
    }

    pub fn set_tables(&mut self, hit_table: HitTable, side_table: SideTable) {
        self.hit_table = hit_table;
        self.side_table = side_table;
    }

    pub fn set_partial_cover(&mut self, covered: bool) {
        self.partial_cover = covered;
    }

    pub fn partial_cover(&self) -> bool {
        self.partial_cover
    }

    pub fn status(&self) -> ToHitStatus {
        match &self.verdict {
            Some(Verdict::Impossible(r)) => ToHitStatus::Impossible(r.clone()),
            Some(Verdict::AutomaticSuccess(r)) => ToHitStatus::AutomaticSuccess(r.clone()),
            Some(Verdict::AutomaticFailure(r)) => ToHitStatus::AutomaticFailure(r.clone()),
            None => ToHitStatus::Possible(self.total()),
        }
    }

    pub fn is_impossible(&self) -> bool {
        matches!(self.verdict, Some(Verdict::Impossible(_)))
    }

    pub fn is_terminal(&self) -> bool {
        self.verdict.is_some()
    }

    pub fn impossible_reason(&self) -> Option<&str> {
        match &self.verdict {
            Some(Verdict::Impossible(r)) => Some(r),
            _ => None,
        }
    }

    /// Roll needed to hit, if the attack is decided by a roll
    pub fn target_number(&self) -> Option<i32> {
        match self.verdict {
            None => Some(self.total()),
            Some(_) => None,
        }
    }

    fn total(&self) -> i32 {
        self.base + self.modifiers.iter().map(|m| m.delta).sum::<i32>()
    }

    pub fn base(&self) -> i32 {
        self.base
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn hit_table(&self) -> HitTable {
        self.hit_table
    }

    pub fn side_table(&self) -> SideTable {
        self.side_table
    }
}

impl fmt::Display for ToHitProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.verdict {
            Some(Verdict::Impossible(r)) => write!(f, "impossible: {r}"),
            Some(Verdict::AutomaticSuccess(r)) => write!(f, "automatic success: {r}"),
            Some(Verdict::AutomaticFailure(r)) => write!(f, "automatic failure: {r}"),
            None => {
                write!(f, "{} ({})", self.base, self.base_label)?;
                for m in &self.modifiers {
                    let sign = if m.delta < 0 { '-' } else { '+' };
                    write!(f, " {sign} {} ({})", m.delta.abs(), m.label)?;
                }
                write!(f, " = {}", self.total())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_accumulate() {
        let mut profile = ToHitProfile::new(4, "gunnery skill");
        profile.add(1, "attacker walked");
        profile.add(2, "medium range");
        profile.add(0, "nothing");
        assert_eq!(profile.status(), ToHitStatus::Possible(7));
        assert_eq!(profile.modifiers().len(), 2);
        assert_eq!(
            profile.to_string(),
            "4 (gunnery skill) + 1 (attacker walked) + 2 (medium range) = 7"
        );
    }

    #[test]
    fn test_first_verdict_wins() {
        let mut profile = ToHitProfile::new(4, "gunnery skill");
        profile.set_impossible("Target out of range");
        profile.set_automatic_success("adjacent building");
        profile.add(3, "ignored");
        assert_eq!(
            profile.status(),
            ToHitStatus::Impossible("Target out of range".into())
        );
        assert_eq!(profile.target_number(), None);
        assert!(profile.modifiers().is_empty());
    }

    #[test]
    fn test_side_from_bearing() {
        assert_eq!(SideTable::from_relative_bearing(0.0), SideTable::Front);
        assert_eq!(SideTable::from_relative_bearing(60.0), SideTable::Front);
        assert_eq!(SideTable::from_relative_bearing(90.0), SideTable::Front);
        assert_eq!(SideTable::from_relative_bearing(120.0), SideTable::Left);
        assert_eq!(SideTable::from_relative_bearing(150.0), SideTable::Left);
        assert_eq!(SideTable::from_relative_bearing(180.0), SideTable::Rear);
        assert_eq!(SideTable::from_relative_bearing(210.0), SideTable::Right);
        assert_eq!(SideTable::from_relative_bearing(240.0), SideTable::Right);
        assert_eq!(SideTable::from_relative_bearing(270.0), SideTable::Front);
        assert_eq!(SideTable::from_relative_bearing(300.0), SideTable::Front);
    }
}
