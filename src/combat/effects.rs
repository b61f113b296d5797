//! Staged state changes
//!
//! Handlers never mutate the battlefield. They return a list of effects;
//! the whole list is validated against the current state first and only
//! then committed, so a failing resolution leaves no partial update behind.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::hex::HexCoord;
use crate::board::map::BoardView;
use crate::combat::context::Battlefield;
use crate::combat::report::{templates, ReportEntry};
use crate::core::error::{EngineError, Result};
use crate::core::types::UnitId;
use crate::units::locations::Location;
use crate::units::registry::{StatusEffect, UnitRegistry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Damage {
        unit: UnitId,
        location: Location,
        amount: i32,
    },
    Status {
        unit: UnitId,
        status: StatusEffect,
    },
    BuildingDamage {
        coord: HexCoord,
        amount: i32,
    },
    Ignite {
        coord: HexCoord,
    },
    ClearWoods {
        coord: HexCoord,
    },
}

/// Check every effect against the current state without changing it
pub fn validate(effects: &[Effect], board: &dyn BoardView, units: &UnitRegistry) -> Result<()> {
    for effect in effects {
        match effect {
            Effect::Damage { unit, location, .. } => units.check_damage(*unit, *location)?,
            Effect::Status { unit, .. } => {
                units.get(*unit)?;
            }
            Effect::BuildingDamage { coord, .. } => {
                if board.building_at(*coord).is_none() {
                    return Err(EngineError::Reference {
                        what: format!("no standing building at ({}, {})", coord.q, coord.r),
                    });
                }
            }
            Effect::Ignite { coord } | Effect::ClearWoods { coord } => {
                if !board.contains(*coord) {
                    return Err(EngineError::Reference {
                        what: format!("hex ({}, {}) is off the board", coord.q, coord.r),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Apply validated effects in order. Returns the damage and terrain reports.
pub fn commit(effects: Vec<Effect>, field: &mut Battlefield) -> Result<Vec<ReportEntry>> {
    let mut reports = Vec::new();

    for effect in effects {
        match effect {
            Effect::Damage { unit, location, amount } => {
                if field.units.get(unit)?.destroyed {
                    continue;
                }
                let outcome = field.units.apply_damage(unit, location, amount)?;
                reports.push(
                    ReportEntry::new(templates::DAMAGE)
                        .subject(unit)
                        .add(format!("{location:?}"))
                        .add(amount),
                );
                for lost in outcome.locations_destroyed {
                    reports.push(
                        ReportEntry::new(templates::LOCATION_DESTROYED)
                            .subject(unit)
                            .add(format!("{lost:?}")),
                    );
                }
                if outcome.unit_destroyed {
                    reports.push(ReportEntry::new(templates::UNIT_DESTROYED).subject(unit));
                }
            }
            Effect::Status { unit, status } => field.units.set_status(unit, status)?,
            Effect::BuildingDamage { coord, amount } => {
                // Standing at validation; an earlier effect in this batch may have brought it down
                if field.board.building_at(coord).is_none() {
                    debug!(q = coord.q, r = coord.r, "building already collapsed, damage skipped");
                    continue;
                }
                let collapsed = field
                    .board
                    .damage_building(coord, amount)
                    .ok_or_else(|| EngineError::Reference {
                        what: format!("no building at ({}, {})", coord.q, coord.r),
                    })?;
                let remaining = field
                    .board
                    .hex(coord)
                    .and_then(|h| h.building.as_ref())
                    .map(|b| b.construction_factor.max(0))
                    .unwrap_or(0);
                reports.push(
                    ReportEntry::new(templates::BUILDING_DAMAGE)
                        .add(amount)
                        .add(remaining),
                );
                if collapsed {
                    reports.push(ReportEntry::new(templates::BUILDING_COLLAPSED).add(coord.q).add(coord.r));
                }
            }
            Effect::Ignite { coord } => {
                if field.board.ignite(coord) {
                    reports.push(ReportEntry::new(templates::HEX_IGNITED).add(coord.q).add(coord.r));
                }
            }
            Effect::ClearWoods { coord } => {
                field.board.clear_woods(coord);
                reports.push(ReportEntry::new(templates::HEX_CLEARED).add(coord.q).add(coord.r));
            }
        }
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map::Board;
    use crate::board::terrain::Building;
    use crate::core::types::PlayerId;
    use crate::units::unit::{Unit, UnitClass};

    fn field() -> Battlefield {
        let mut field = Battlefield::new(Board::new(6, 6));
        field
            .units
            .add(Unit::new(UnitId(1), PlayerId(1), UnitClass::Mech, 50))
            .unwrap();
        field
    }

    #[test]
    fn test_invalid_effect_rejects_whole_batch() {
        let field = field();
        let effects = vec![
            Effect::Damage {
                unit: UnitId(1),
                location: Location::CenterTorso,
                amount: 5,
            },
            Effect::Status {
                unit: UnitId(2),
                status: StatusEffect::Illuminated,
            },
        ];
        assert!(validate(&effects, &field.board, &field.units).is_err());
    }

    #[test]
    fn test_building_damage_needs_building() {
        let mut field = field();
        let coord = HexCoord::new(2, 2);
        let effects = vec![Effect::BuildingDamage { coord, amount: 5 }];
        assert!(validate(&effects, &field.board, &field.units).is_err());

        field.board.place_building(coord, Building::new("depot", 20, 2));
        assert!(validate(&effects, &field.board, &field.units).is_ok());
        let reports = commit(effects, &mut field).unwrap();
        assert_eq!(reports[0].template, templates::BUILDING_DAMAGE);
        assert_eq!(field.board.building_at(coord).map(|b| b.construction_factor), Some(15));
    }

    #[test]
    fn test_damage_after_collapse_in_same_batch_is_skipped() {
        let mut field = field();
        let coord = HexCoord::new(3, 1);
        field.board.place_building(coord, Building::new("shed", 20, 1));
        let effects = vec![
            Effect::BuildingDamage { coord, amount: 25 },
            Effect::BuildingDamage { coord, amount: 5 },
        ];
        validate(&effects, &field.board, &field.units).unwrap();

        let reports = commit(effects, &mut field).unwrap();
        let emitted: Vec<u32> = reports.iter().map(|r| r.template).collect();
        assert_eq!(emitted, vec![templates::BUILDING_DAMAGE, templates::BUILDING_COLLAPSED]);
        assert!(field.board.building_at(coord).is_none());
    }

    #[test]
    fn test_commit_reports_damage() {
        let mut field = field();
        let before = field.units.get(UnitId(1)).unwrap().locations[&Location::CenterTorso];
        let reports = commit(
            vec![Effect::Damage {
                unit: UnitId(1),
                location: Location::CenterTorso,
                amount: 4,
            }],
            &mut field,
        )
        .unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(
            field.units.get(UnitId(1)).unwrap().locations[&Location::CenterTorso],
            before - 4
        );
    }
}
