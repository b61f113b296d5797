//! Structured combat reports
//!
//! Resolution never formats prose. It emits [`ReportEntry`] values: a
//! numeric template id, an optional subject unit and a payload list. Hosts
//! localize and render them; [`render_plain`] is a minimal English renderer
//! used by the skirmish runner and in logs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::{Round, UnitId};

/// Template ids. Stable across releases; hosts key localized text on them.
pub mod templates {
    pub const PHASE_BEGIN: u32 = 1000;
    pub const ROUND_END: u32 = 1001;
    pub const INITIATIVE_ROLL: u32 = 1010;

    pub const ATTACK_DECLARED: u32 = 3100;
    pub const TO_HIT_IMPOSSIBLE: u32 = 3105;
    pub const TO_HIT_AUTOMATIC_SUCCESS: u32 = 3110;
    pub const TO_HIT_AUTOMATIC_FAILURE: u32 = 3111;
    pub const TO_HIT_NUMBER: u32 = 3115;
    pub const ROLL_HIT: u32 = 3120;
    pub const ROLL_MISS: u32 = 3125;

    pub const DAMAGE: u32 = 3130;
    pub const LOCATION_DESTROYED: u32 = 3131;
    pub const UNIT_DESTROYED: u32 = 3132;
    pub const COVER_ABSORBED: u32 = 3135;
    pub const BUILDING_DAMAGE: u32 = 3140;
    pub const BUILDING_COLLAPSED: u32 = 3141;
    pub const HEX_IGNITED: u32 = 3145;
    pub const HEX_CLEARED: u32 = 3146;

    pub const CLUSTER_HITS: u32 = 3150;

    pub const TASER_ROLL: u32 = 3160;
    pub const TASER_SHUTDOWN: u32 = 3161;
    pub const TASER_INTERFERENCE: u32 = 3162;
    pub const TASER_RECOIL: u32 = 3163;

    pub const ARTILLERY_ADJUSTED: u32 = 3170;
    pub const ARTILLERY_SCATTER: u32 = 3171;
    pub const ARTILLERY_LOCKED_ON: u32 = 3172;
    pub const ARTILLERY_OFF_BOARD: u32 = 3173;

    pub const SEARCHLIGHT_ILLUMINATES: u32 = 3180;
    pub const CHARGE_RECOIL: u32 = 3190;

    pub const RESOLUTION_ERROR: u32 = 3999;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportValue::Int(v) => write!(f, "{v}"),
            ReportValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i32> for ReportValue {
    fn from(value: i32) -> Self {
        ReportValue::Int(value as i64)
    }
}

impl From<u32> for ReportValue {
    fn from(value: u32) -> Self {
        ReportValue::Int(value as i64)
    }
}

impl From<String> for ReportValue {
    fn from(value: String) -> Self {
        ReportValue::Text(value)
    }
}

impl From<&str> for ReportValue {
    fn from(value: &str) -> Self {
        ReportValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub template: u32,
    pub subject: Option<UnitId>,
    pub values: Vec<ReportValue>,
    /// Blank lines to emit after the entry
    pub newlines: u8,
}

impl ReportEntry {
    pub fn new(template: u32) -> Self {
        Self {
            template,
            subject: None,
            values: Vec::new(),
            newlines: 0,
        }
    }

    pub fn subject(mut self, unit: UnitId) -> Self {
        self.subject = Some(unit);
        self
    }

    pub fn add(mut self, value: impl Into<ReportValue>) -> Self {
        self.values.push(value.into());
        self
    }

    pub fn newline(mut self) -> Self {
        self.newlines += 1;
        self
    }
}

/// Destination for report entries
pub trait ReportSink {
    fn submit(&mut self, round: Round, entry: ReportEntry);

    fn submit_all(&mut self, round: Round, entries: Vec<ReportEntry>) {
        for entry in entries {
            self.submit(round, entry);
        }
    }
}

impl ReportSink for Vec<ReportEntry> {
    fn submit(&mut self, _round: Round, entry: ReportEntry) {
        self.push(entry);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedReport {
    pub round: Round,
    pub entry: ReportEntry,
}

/// Append-only log of everything reported during a game
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameLog {
    pub entries: Vec<LoggedReport>,
}

impl GameLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_round(&self, round: Round) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.round == round).map(|e| &e.entry)
    }

    pub fn with_template(&self, template: u32) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .map(|e| &e.entry)
            .filter(move |e| e.template == template)
    }
}

impl ReportSink for GameLog {
    fn submit(&mut self, round: Round, entry: ReportEntry) {
        self.entries.push(LoggedReport { round, entry });
    }
}

fn template_text(template: u32) -> &'static str {
    use templates::*;

    match template {
        PHASE_BEGIN => "phase begins",
        ROUND_END => "round ends",
        INITIATIVE_ROLL => "initiative roll",
        ATTACK_DECLARED => "attacks",
        TO_HIT_IMPOSSIBLE => "attack impossible",
        TO_HIT_AUTOMATIC_SUCCESS => "hits automatically",
        TO_HIT_AUTOMATIC_FAILURE => "misses automatically",
        TO_HIT_NUMBER => "needs",
        ROLL_HIT => "rolls and hits",
        ROLL_MISS => "rolls and misses",
        DAMAGE => "takes damage",
        LOCATION_DESTROYED => "location destroyed",
        UNIT_DESTROYED => "is destroyed",
        COVER_ABSORBED => "cover absorbs the hit",
        BUILDING_DAMAGE => "building takes damage",
        BUILDING_COLLAPSED => "building collapses",
        HEX_IGNITED => "hex catches fire",
        HEX_CLEARED => "woods are cut down",
        CLUSTER_HITS => "cluster hits",
        TASER_ROLL => "taser discharge roll",
        TASER_SHUTDOWN => "is shut down",
        TASER_INTERFERENCE => "suffers interference",
        TASER_RECOIL => "taser arcs back",
        ARTILLERY_ADJUSTED => "artillery fire adjusted",
        ARTILLERY_SCATTER => "artillery scatters",
        ARTILLERY_LOCKED_ON => "artillery locked on",
        ARTILLERY_OFF_BOARD => "shell lands off the board",
        SEARCHLIGHT_ILLUMINATES => "is illuminated",
        CHARGE_RECOIL => "takes charge recoil",
        RESOLUTION_ERROR => "attack aborted",
        _ => "report",
    }
}

/// Render an entry as a single English line
pub fn render_plain(entry: &ReportEntry) -> String {
    let mut line = String::new();
    if let Some(subject) = entry.subject {
        line.push_str(&format!("{subject} "));
    }
    line.push_str(template_text(entry.template));
    if !entry.values.is_empty() {
        let values: Vec<String> = entry.values.iter().map(|v| v.to_string()).collect();
        line.push_str(&format!(": {}", values.join(", ")));
    }
    for _ in 0..entry.newlines {
        line.push('\n');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_builder() {
        let entry = ReportEntry::new(templates::DAMAGE)
            .subject(UnitId(4))
            .add("CenterTorso")
            .add(5)
            .newline();
        assert_eq!(entry.values, vec![ReportValue::Text("CenterTorso".into()), ReportValue::Int(5)]);
        assert_eq!(render_plain(&entry), "unit#4 takes damage: CenterTorso, 5\n");
    }

    #[test]
    fn test_game_log_filters() {
        let mut log = GameLog::new();
        log.submit(1, ReportEntry::new(templates::ROLL_HIT).add(8));
        log.submit(2, ReportEntry::new(templates::ROLL_MISS).add(3));
        log.submit(2, ReportEntry::new(templates::ROLL_HIT).add(11));

        assert_eq!(log.for_round(2).count(), 2);
        assert_eq!(log.with_template(templates::ROLL_HIT).count(), 2);
    }
}
