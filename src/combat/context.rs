//! The battlefield an attack is resolved against, and the read-only view
//! handlers compute with

use crate::board::hex::HexCoord;
use crate::board::los::{line_of_sight, LosResult, Viewpoint};
use crate::board::map::{Board, BoardView};
use crate::board::terrain::Building;
use crate::combat::attack::{AttackDeclaration, HexEffect, TargetRef};
use crate::core::config::{Environment, RulesConfig};
use crate::core::error::{EngineError, Result};
use crate::units::registry::UnitRegistry;
use crate::units::unit::Unit;

/// Everything resolution may mutate
#[derive(Debug, Clone)]
pub struct Battlefield {
    pub board: Board,
    pub units: UnitRegistry,
    pub environment: Environment,
}

impl Battlefield {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            units: UnitRegistry::new(),
            environment: Environment::default(),
        }
    }

    pub fn context<'a>(&'a self, config: &'a RulesConfig) -> AttackContext<'a> {
        AttackContext {
            board: &self.board,
            units: &self.units,
            config,
            environment: self.environment,
        }
    }
}

/// Read-only view used for legality checks, modifiers and effect planning
#[derive(Clone, Copy)]
pub struct AttackContext<'a> {
    pub board: &'a dyn BoardView,
    pub units: &'a UnitRegistry,
    pub config: &'a RulesConfig,
    pub environment: Environment,
}

/// A target reference with its ids looked up
#[derive(Debug, Clone, Copy)]
pub enum ResolvedTarget<'a> {
    Unit(&'a Unit),
    Hex { coord: HexCoord, effect: HexEffect },
    Building {
        coord: HexCoord,
        building: Option<&'a Building>,
    },
}

impl<'a> ResolvedTarget<'a> {
    pub fn position(&self) -> HexCoord {
        match self {
            ResolvedTarget::Unit(unit) => unit.position,
            ResolvedTarget::Hex { coord, .. } | ResolvedTarget::Building { coord, .. } => *coord,
        }
    }

    pub fn viewpoint(&self) -> Viewpoint {
        match self {
            ResolvedTarget::Unit(unit) => unit.viewpoint(),
            ResolvedTarget::Hex { coord, .. } => Viewpoint::ground(*coord),
            ResolvedTarget::Building { coord, building } => {
                Viewpoint::new(*coord, building.map(|b| b.height).unwrap_or(0))
            }
        }
    }

    pub fn unit(&self) -> Option<&'a Unit> {
        match self {
            ResolvedTarget::Unit(unit) => Some(unit),
            _ => None,
        }
    }
}

impl<'a> AttackContext<'a> {
    pub fn attacker(&self, declaration: &AttackDeclaration) -> Result<&'a Unit> {
        self.units.get(declaration.attacker)
    }

    /// Look up the declared target. Dangling unit ids and off-board hexes
    /// are reference errors.
    pub fn target(&self, declaration: &AttackDeclaration) -> Result<ResolvedTarget<'a>> {
        match declaration.target {
            TargetRef::Unit(id) => Ok(ResolvedTarget::Unit(self.units.get(id)?)),
            TargetRef::Hex { coord, effect } => {
                self.require_on_board(coord)?;
                Ok(ResolvedTarget::Hex { coord, effect })
            }
            TargetRef::Building(coord) => {
                self.require_on_board(coord)?;
                Ok(ResolvedTarget::Building {
                    coord,
                    building: self.board.building_at(coord),
                })
            }
        }
    }

    fn require_on_board(&self, coord: HexCoord) -> Result<()> {
        if self.board.contains(coord) {
            Ok(())
        } else {
            Err(EngineError::Reference {
                what: format!("hex ({}, {}) is off the board", coord.q, coord.r),
            })
        }
    }

    pub fn los(&self, from: Viewpoint, to: Viewpoint) -> LosResult {
        line_of_sight(self.board, from, to)
    }
}
