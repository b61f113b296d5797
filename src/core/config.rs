//! Rules configuration with documented constants
//!
//! All tunable numbers the resolution pipeline reads are collected here.
//! A config is passed explicitly with every resolution call; there is no
//! process-wide instance.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};

/// Ambient light on the battlefield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightCondition {
    #[default]
    Day,
    Dusk,
    Night,
}

/// Per-battle environment passed alongside the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Environment {
    pub light: LightCondition,
}

impl Environment {
    pub fn night() -> Self {
        Self {
            light: LightCondition::Night,
        }
    }
}

/// Severity outcome bands for a taser secondary roll.
///
/// The roll is compared against the thresholds from the top down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaserTable {
    /// At or above: long shutdown
    pub long_shutdown_at: i32,
    /// At or above: short shutdown
    pub short_shutdown_at: i32,
    /// At or below: the discharge arcs back into the attacker
    pub recoil_at_or_below: i32,
    /// Rounds a long shutdown lasts
    pub long_shutdown_rounds: u32,
    /// Rounds a short shutdown lasts
    pub short_shutdown_rounds: u32,
    /// Rounds the interference penalty lasts (target or recoiling attacker)
    pub interference_rounds: u32,
    /// To-hit and piloting penalty while interference is active
    pub interference_modifier: i32,
}

impl Default for TaserTable {
    fn default() -> Self {
        Self {
            long_shutdown_at: 12,
            short_shutdown_at: 8,
            recoil_at_or_below: 2,
            long_shutdown_rounds: 3,
            short_shutdown_rounds: 1,
            interference_rounds: 2,
            interference_modifier: 1,
        }
    }
}

/// Configuration for combat resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    // === DICE ===
    /// Dice rolled against a to-hit target number
    pub to_hit_dice: u32,

    // === PHYSICAL ATTACKS ===
    /// Punch modifier applied on top of piloting skill
    pub punch_base: i32,
    /// Kick modifier (kicks are easier to land than punches)
    pub kick_base: i32,
    /// Charge modifier before the piloting difference
    pub charge_base: i32,
    /// ProtoMech strike modifier
    pub proto_strike_base: i32,

    // === TARGET STATE ===
    /// Bonus for a prone target in an adjacent hex (negative = easier)
    pub prone_adjacent_modifier: i32,
    /// Penalty for a prone target further away
    pub prone_at_range_modifier: i32,
    /// Bonus for an immobile (or shut down) target
    pub immobile_target_modifier: i32,
    /// Penalty when the target has partial cover
    pub partial_cover_modifier: i32,

    // === ENVIRONMENT ===
    /// Penalty for firing at an unlit target at night
    pub night_modifier: i32,
    /// Penalty for firing at an unlit target at dusk
    pub dusk_modifier: i32,
    /// How far a searchlight beam reaches (hexes)
    pub searchlight_range: u32,

    // === ARTILLERY ===
    /// Adjustment added per spotted miss at the same hex
    pub artillery_spotter_adjustment: i32,
    /// Fraction of artillery damage dealt in each adjacent hex
    pub artillery_splash_ratio: f32,

    // === TASER ===
    pub taser: TaserTable,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            to_hit_dice: 2,

            punch_base: 0,
            kick_base: -2,
            charge_base: 0,
            proto_strike_base: 0,

            prone_adjacent_modifier: -2,
            prone_at_range_modifier: 1,
            immobile_target_modifier: -4,
            partial_cover_modifier: 1,

            night_modifier: 2,
            dusk_modifier: 1,
            searchlight_range: 30,

            artillery_spotter_adjustment: -1,
            artillery_splash_ratio: 0.5,

            taser: TaserTable::default(),
        }
    }
}

impl RulesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RulesConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.to_hit_dice == 0 {
            return Err(EngineError::Config("to_hit_dice must be at least 1".into()));
        }

        if !(0.0..=1.0).contains(&self.artillery_splash_ratio) {
            return Err(EngineError::Config(format!(
                "artillery_splash_ratio ({}) must be within 0.0..=1.0",
                self.artillery_splash_ratio
            )));
        }

        let taser = &self.taser;
        if taser.short_shutdown_at > taser.long_shutdown_at {
            return Err(EngineError::Config(format!(
                "taser.short_shutdown_at ({}) must not exceed taser.long_shutdown_at ({})",
                taser.short_shutdown_at, taser.long_shutdown_at
            )));
        }
        if taser.recoil_at_or_below >= taser.short_shutdown_at {
            return Err(EngineError::Config(format!(
                "taser.recoil_at_or_below ({}) must be below taser.short_shutdown_at ({})",
                taser.recoil_at_or_below, taser.short_shutdown_at
            )));
        }

        Ok(())
    }

    /// Environment penalty for a target that is not illuminated
    pub fn light_modifier(&self, light: LightCondition) -> i32 {
        match light {
            LightCondition::Day => 0,
            LightCondition::Dusk => self.dusk_modifier,
            LightCondition::Night => self.night_modifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RulesConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RulesConfig::from_toml_str(
            r#"
            night_modifier = 3

            [taser]
            long_shutdown_at = 11
            "#,
        )
        .unwrap();

        assert_eq!(config.night_modifier, 3);
        assert_eq!(config.taser.long_shutdown_at, 11);
        assert_eq!(config.kick_base, -2);
        assert_eq!(config.taser.short_shutdown_at, 8);
    }

    #[test]
    fn test_invalid_splash_ratio_rejected() {
        let result = RulesConfig::from_toml_str("artillery_splash_ratio = 1.5");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = RulesConfig::from_toml_str("night_modifier = \"dark\"");
        assert!(matches!(result, Err(EngineError::Toml(_))));
    }

    #[test]
    fn test_light_modifier() {
        let config = RulesConfig::default();
        assert_eq!(config.light_modifier(LightCondition::Day), 0);
        assert_eq!(config.light_modifier(LightCondition::Night), 2);
    }
}
