/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{info, warn};
use std::sync::Arc;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::dispatch::DispatchPolicy;
use crate::elevator::ElevatorHandle;
use crate::rider::Rider;
use crate::shared::{
    AssignmentError, Behaviour, BoardingState, Direction, ElevatorId, ElevatorSnapshot, Floor,
};

/**
 * Closest-accept dispatch.
 *
 * The elevator that is already travelling towards the rider and is closest to the rider's start
 * floor gets the rider. Idle elevators always qualify. Elevators moving away from the rider are
 * only used when nothing else qualifies, and then the closest one wins. Ties go to the lowest
 * elevator id.
 */
#[derive(Debug, Default, Clone, Copy)]
pub struct ClosestAccept;

/// How one elevator scores for one rider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub elevator: ElevatorId,
    pub distance: Floor,
    pub direction: Direction,
    pub compatible: bool,
}

/// Scores `elevator` for picking up `rider`.
pub fn evaluate(rider: &Rider, elevator: &ElevatorSnapshot) -> Candidate {
    let start = rider.start_floor();
    let current = elevator.current_floor;

    let (compatible, distance, direction) = match elevator.direction {
        Direction::Up if current <= start => (true, start - current, Direction::Up),
        Direction::Down if current >= start => (true, current - start, Direction::Down),
        Direction::Idle => {
            let direction = if current == start {
                // Same floor, go wherever the rider is headed
                rider.direction()
            } else {
                Direction::toward(current, start)
            };
            (true, (current - start).abs(), direction)
        }
        moving_away => (false, (current - start).abs(), moving_away),
    };

    Candidate {
        elevator: elevator.id,
        distance,
        direction,
        compatible,
    }
}

/// Picks the best candidate among in-service elevators.
pub fn select(rider: &Rider, elevators: &[ElevatorSnapshot]) -> Option<Candidate> {
    let candidates: Vec<Candidate> = elevators
        .iter()
        .filter(|e| e.behaviour != Behaviour::OutOfService)
        .map(|e| evaluate(rider, e))
        .collect();

    let closest = |compatible_only: bool| {
        candidates
            .iter()
            .filter(|c| c.compatible || !compatible_only)
            .min_by_key(|c| (c.distance, c.elevator))
            .copied()
    };

    closest(true).or_else(|| closest(false))
}

impl DispatchPolicy for ClosestAccept {
    fn name(&self) -> &'static str {
        "closest-accept"
    }

    fn assign(
        &self,
        rider: &Arc<Rider>,
        elevators: &[ElevatorHandle],
    ) -> Result<ElevatorId, AssignmentError> {
        let state = rider.state();
        if state != BoardingState::Waiting {
            return Err(AssignmentError::AlreadyAssigned {
                rider: rider.id(),
                state,
            });
        }

        let snapshots: Vec<ElevatorSnapshot> = elevators.iter().map(|e| e.snapshot()).collect();
        let Some(candidate) = select(rider, &snapshots) else {
            warn!("Not able to assign rider {}", rider.id());
            return Err(AssignmentError::NoElevators(rider.id()));
        };

        let handle = elevators
            .iter()
            .find(|e| e.id() == candidate.elevator)
            .ok_or(AssignmentError::NoElevators(rider.id()))?;

        // Accept and retarget under the same lock so the elevator task sees both or neither
        let mut elevator = handle.lock();
        elevator.accept_request(Arc::clone(rider))?;
        elevator.apply_target(candidate.direction, rider.destination_floor());

        info!(
            "Assigned rider {} to take elevator {} because the distance is {}{}",
            rider.id(),
            candidate.elevator,
            candidate.distance,
            if candidate.compatible { "" } else { " (fallback)" }
        );
        Ok(candidate.elevator)
    }
}
