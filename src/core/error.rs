use thiserror::Error;

use crate::combat::attack::AttackDeclaration;
use crate::combat::dispatch::HandlerKey;
use crate::core::types::UnitId;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A declaration or query points at something that no longer exists.
    #[error("Reference error: {what}")]
    Reference { what: String },

    #[error("Capacity exceeded for {collection} turn markers (capacity {capacity})")]
    CapacityExceeded {
        collection: &'static str,
        capacity: usize,
    },

    #[error("No {collection} turn markers remain")]
    TurnOrderExhausted { collection: &'static str },

    #[error("Attack resolution failed in {handler:?} handler for {declaration}: {reason}")]
    AttackResolution {
        declaration: Box<AttackDeclaration>,
        handler: HandlerKey,
        reason: String,
    },

    #[error("No handler registered for {0:?}")]
    MissingHandler(HandlerKey),

    #[error("Unit already registered: {0}")]
    DuplicateUnit(UnitId),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl EngineError {
    pub fn unit_not_found(id: UnitId) -> Self {
        EngineError::Reference {
            what: format!("{id} does not exist"),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
