/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::info;
use serde::Deserialize;
use serde::Serialize;
use std::sync::Mutex;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::shared::sync::lock;
use crate::shared::{
    AssignmentError, BoardingState, Direction, ElevatorId, Floor, RiderId, RiderSnapshot,
    SimResult, SimulationError,
};

/**
 * A single trip request.
 *
 * The trip itself is immutable once created. The boarding state is the only mutable part and
 * every transition goes through a compare-and-set style method so that the dispatcher and the
 * elevator tasks can race on the same rider without double-assigning it.
 *
 * # Fields
 * - `id`:                  Unique id, handed out in increasing order by the run context.
 * - `start_floor`:         Floor where the rider waits.
 * - `destination_floor`:   Floor where the rider leaves the elevator.
 * - `state`:               Current boarding state.
 */
#[derive(Debug)]
pub struct Rider {
    id: RiderId,
    start_floor: Floor,
    destination_floor: Floor,
    state: Mutex<BoardingState>,
}

/// A trip as written in a configuration file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiderRequest {
    pub start_floor: i64,
    pub destination_floor: i64,
}

impl Rider {
    pub fn new(id: RiderId, start_floor: Floor, destination_floor: Floor) -> SimResult<Rider> {
        if start_floor == destination_floor {
            return Err(SimulationError::Configuration(format!(
                "rider {} starts and ends at floor {}",
                id, start_floor
            )));
        }

        Ok(Rider {
            id,
            start_floor,
            destination_floor,
            state: Mutex::new(BoardingState::Waiting),
        })
    }

    pub fn id(&self) -> RiderId {
        self.id
    }

    pub fn start_floor(&self) -> Floor {
        self.start_floor
    }

    pub fn destination_floor(&self) -> Floor {
        self.destination_floor
    }

    pub fn direction(&self) -> Direction {
        Direction::toward(self.start_floor, self.destination_floor)
    }

    pub fn state(&self) -> BoardingState {
        *lock(&self.state)
    }

    pub fn is_waiting(&self) -> bool {
        self.state() == BoardingState::Waiting
    }

    pub fn has_arrived(&self) -> bool {
        matches!(self.state(), BoardingState::Arrived(_))
    }

    /// Next floor this rider needs an elevator to visit, if any.
    pub fn pending_stop(&self) -> Option<Floor> {
        match self.state() {
            BoardingState::Waiting | BoardingState::Assigned(_) => Some(self.start_floor),
            BoardingState::Aboard(_) => Some(self.destination_floor),
            BoardingState::Arrived(_) => None,
        }
    }

    /// Waiting -> Assigned. Rejected in every other state.
    pub fn try_assign(&self, elevator: ElevatorId) -> Result<(), AssignmentError> {
        let mut state = lock(&self.state);
        match *state {
            BoardingState::Waiting => {
                *state = BoardingState::Assigned(elevator);
                Ok(())
            }
            other => Err(AssignmentError::AlreadyAssigned {
                rider: self.id,
                state: other,
            }),
        }
    }

    /// Waiting or Assigned(elevator) -> Aboard(elevator). Returns whether the rider boarded.
    pub fn try_board(&self, elevator: ElevatorId, floor: Floor) -> bool {
        if floor != self.start_floor {
            return false;
        }

        let mut state = lock(&self.state);
        match *state {
            BoardingState::Waiting => {}
            BoardingState::Assigned(assigned) if assigned == elevator => {}
            _ => return false,
        }
        *state = BoardingState::Aboard(elevator);
        info!("Rider {} stepped into elevator {} at floor {}", self.id, elevator, floor);
        true
    }

    /// Assigned(elevator) -> Waiting, used when the assigned elevator goes out of service.
    pub fn release(&self, elevator: ElevatorId) -> bool {
        let mut state = lock(&self.state);
        if *state == BoardingState::Assigned(elevator) {
            *state = BoardingState::Waiting;
            true
        } else {
            false
        }
    }

    /// Aboard(elevator) -> Arrived(elevator). Leaving anywhere but the destination is fatal.
    pub fn arrive(&self, elevator: ElevatorId, floor: Floor) -> SimResult<()> {
        let mut state = lock(&self.state);

        if *state != BoardingState::Aboard(elevator) {
            return Err(SimulationError::InvariantViolation {
                elevator,
                detail: format!("rider {} unloaded while {:?}", self.id, *state),
            });
        }

        if floor != self.destination_floor {
            return Err(SimulationError::InvariantViolation {
                elevator,
                detail: format!(
                    "rider {} unloaded at floor {} instead of {}",
                    self.id, floor, self.destination_floor
                ),
            });
        }

        *state = BoardingState::Arrived(elevator);
        info!("Rider {} got off elevator {} at floor {}", self.id, elevator, floor);
        Ok(())
    }

    pub fn snapshot(&self) -> RiderSnapshot {
        RiderSnapshot {
            id: self.id,
            start_floor: self.start_floor,
            destination_floor: self.destination_floor,
            state: self.state(),
        }
    }
}
