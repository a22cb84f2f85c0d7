pub mod closest_accept;

pub use closest_accept::Candidate;
pub use closest_accept::ClosestAccept;

use std::sync::Arc;

use crate::elevator::ElevatorHandle;
use crate::rider::Rider;
use crate::shared::{AssignmentError, ElevatorId};

/// Matches a waiting rider to one of the building's elevators.
///
/// Implementations must hand the rider to the chosen elevator through
/// `ElevatorState::accept_request` while holding that elevator's lock, and must reject riders
/// that are no longer waiting.
pub trait DispatchPolicy: Send {
    fn name(&self) -> &'static str;

    fn assign(
        &self,
        rider: &Arc<Rider>,
        elevators: &[ElevatorHandle],
    ) -> Result<ElevatorId, AssignmentError>;
}
