use thiserror::Error;

use crate::edge::EdgeId;
use crate::node::NodeId;
use crate::registry::ModelKind;

pub type SimResult<T> = Result<T, SimError>;

/// Errors raised by the kernel. Configuration and resolution errors surface before any round
/// runs; the remaining variants are invariant violations and abort the run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimError {
    #[error("Invalid configuration at '{field}': {reason}")]
    Config { field: String, reason: String },

    #[error("No {kind} model registered as '{identifier}'")]
    ModelNotFound { kind: ModelKind, identifier: String },

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Node {0} already exists")]
    DuplicateNode(NodeId),

    #[error("Cannot {0} an inert position")]
    InertPosition(&'static str),

    #[error("Value {value} of '{field}' is outside [{min}, {max}]")]
    OutOfBounds {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Timer delay must be positive, got {0}")]
    InvalidTimerDelay(f64),

    #[error("Packet from {origin} to {destination} does not belong to edge {edge}")]
    EdgeMismatch {
        edge: EdgeId,
        origin: NodeId,
        destination: NodeId,
    },

    #[error("Edge {0} released more packets than it carried")]
    EdgeUnderflow(EdgeId),

    #[error("Simulation was aborted in round {round} and cannot continue")]
    Aborted { round: u64 },
}

impl SimError {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SimError::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
