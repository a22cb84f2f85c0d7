/***************************************/
/*        3rd party libraries          */
/***************************************/
use thiserror::Error;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::structs::{BoardingState, ElevatorId, RiderId};

/// Fatal errors raised while configuring or running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invariant violation on elevator {elevator}: {detail}")]
    InvariantViolation { elevator: ElevatorId, detail: String },

    #[error("elevator {0} did not stop within the shutdown grace period")]
    ShutdownTimeout(ElevatorId),

    #[error("elevator {0} task panicked")]
    TaskPanicked(ElevatorId),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Soft failures of a single dispatch attempt. The rider is never lost.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("no elevator available for rider {0}")]
    NoElevators(RiderId),

    #[error("rider {rider} is no longer waiting ({state:?})")]
    AlreadyAssigned { rider: RiderId, state: BoardingState },
}

pub type SimResult<T> = Result<T, SimulationError>;
