/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::rider::Rider;
use crate::shared::sync::lock;
use crate::shared::{AssignmentError, Behaviour, Direction, ElevatorId, ElevatorSnapshot, Floor};

/**
 * Mutable state of one elevator.
 *
 * Shared between the elevator's own task and the dispatch policy through an `ElevatorHandle`.
 * Only the elevator task moves the car, boards and unloads; the dispatcher only appends to
 * `assigned` and adjusts `target_floor`.
 *
 * # Fields
 * - `id`:                  Index of the elevator in the building.
 * - `current_floor`:       Floor the car is at, always within `[0, floors]`.
 * - `direction`:           Direction of travel, `Idle` while undirected.
 * - `behaviour`:           Current state of the state machine.
 * - `target_floor`:        Floor the car is committed to reach next, `None` when awaiting work.
 * - `assigned`:            Riders accepted by this elevator but not yet aboard, oldest first.
 * - `aboard`:              Riders inside the car, in boarding order.
 * - `total_transported`:   Riders delivered to their destination so far.
 */
#[derive(Debug)]
pub struct ElevatorState {
    pub id: ElevatorId,
    pub current_floor: Floor,
    pub direction: Direction,
    pub behaviour: Behaviour,
    pub target_floor: Option<Floor>,
    pub assigned: Vec<Arc<Rider>>,
    pub aboard: Vec<Arc<Rider>>,
    pub total_transported: u64,
}

impl ElevatorState {
    pub fn new(id: ElevatorId, floor: Floor) -> ElevatorState {
        ElevatorState {
            id,
            current_floor: floor,
            direction: Direction::Idle,
            behaviour: Behaviour::Idle,
            target_floor: None,
            assigned: Vec::new(),
            aboard: Vec::new(),
            total_transported: 0,
        }
    }

    pub fn has_riders(&self) -> bool {
        !self.assigned.is_empty() || !self.aboard.is_empty()
    }

    /// Takes responsibility for picking up `rider`.
    pub fn accept_request(&mut self, rider: Arc<Rider>) -> Result<(), AssignmentError> {
        rider.try_assign(self.id)?;

        info!("Elevator {} has agreed to pick up rider {}", self.id, rider.id());
        self.assigned.push(rider);
        if self.behaviour == Behaviour::Idle {
            self.behaviour = Behaviour::Undirected;
        }
        Ok(())
    }

    /// Narrows the target towards `destination` for travel in `direction`.
    ///
    /// A destination at or behind the car is ignored, the pick-up stop then decides where the
    /// car goes next.
    pub fn apply_target(&mut self, direction: Direction, destination: Floor) {
        let current = self.current_floor;
        self.target_floor = match direction {
            Direction::Up if destination > current => {
                Some(self.target_floor.map_or(destination, |t| t.min(destination)))
            }
            Direction::Down if destination < current => {
                Some(self.target_floor.map_or(destination, |t| t.max(destination)))
            }
            _ => self.target_floor,
        };
    }

    /// Floors this elevator still has to visit: pick-ups of assigned riders and drop-offs of
    /// riders aboard.
    pub fn pending_stops(&self) -> impl Iterator<Item = Floor> + '_ {
        self.assigned
            .iter()
            .chain(self.aboard.iter())
            .filter_map(|r| r.pending_stop())
    }

    pub fn has_work_at(&self, floor: Floor) -> bool {
        self.pending_stops().any(|stop| stop == floor)
    }

    /// Nearest pending stop at or beyond the current floor in `direction`.
    pub fn next_stop_in(&self, direction: Direction) -> Option<Floor> {
        let current = self.current_floor;
        match direction {
            Direction::Up => self.pending_stops().filter(|&f| f >= current).min(),
            Direction::Down => self.pending_stops().filter(|&f| f <= current).max(),
            Direction::Idle => None,
        }
    }

    /// Picks a direction for an undirected elevator.
    ///
    /// Heads for the dispatch target if there is one, otherwise for the next stop of the
    /// least-recently-assigned rider.
    pub fn resolve_direction(&self) -> Direction {
        if let Some(target) = self.target_floor {
            if target != self.current_floor {
                return Direction::toward(self.current_floor, target);
            }
        }

        self.pending_stops()
            .find(|&stop| stop != self.current_floor)
            .map_or(Direction::Idle, |stop| Direction::toward(self.current_floor, stop))
    }

    /// Recomputes target and direction from the pending stops.
    pub fn recompute_target(&mut self) {
        if !self.has_riders() {
            if self.target_floor.is_some() || self.behaviour != Behaviour::Idle {
                info!("Elevator {} going idle at floor {}", self.id, self.current_floor);
            }
            self.target_floor = None;
            self.direction = Direction::Idle;
            self.behaviour = Behaviour::Idle;
            return;
        }

        if self.direction == Direction::Idle {
            self.direction = self.resolve_direction();
        }

        let mut next = self.next_stop_in(self.direction);
        if next.is_none() {
            self.direction = self.direction.opposite();
            next = self.next_stop_in(self.direction);
        }

        self.target_floor = next;
        self.behaviour = match next {
            Some(target) if target != self.current_floor => {
                Behaviour::moving(Direction::toward(self.current_floor, target))
            }
            Some(_) => Behaviour::AtFloor,
            None => Behaviour::Undirected,
        };
        debug!(
            "Elevator {} at floor {} heading {} to {:?}",
            self.id, self.current_floor, self.direction, self.target_floor
        );
    }

    /// Hands back every rider that has not boarded yet, detaching them from this elevator.
    pub fn release_pending(&mut self) -> Vec<Arc<Rider>> {
        let id = self.id;
        self.assigned
            .drain(..)
            .filter(|rider| rider.release(id))
            .collect()
    }

    pub fn snapshot(&self) -> ElevatorSnapshot {
        ElevatorSnapshot {
            id: self.id,
            current_floor: self.current_floor,
            direction: self.direction,
            behaviour: self.behaviour,
            target_floor: self.target_floor,
            total_transported: self.total_transported,
            riders_aboard: self.aboard.iter().map(|r| r.id()).collect(),
            riders_assigned: self.assigned.iter().map(|r| r.id()).collect(),
        }
    }
}

/// Cloneable, thread-safe reference to one elevator's state.
#[derive(Debug, Clone)]
pub struct ElevatorHandle {
    id: ElevatorId,
    state: Arc<Mutex<ElevatorState>>,
}

impl ElevatorHandle {
    pub fn new(id: ElevatorId, floor: Floor) -> ElevatorHandle {
        ElevatorHandle {
            id,
            state: Arc::new(Mutex::new(ElevatorState::new(id, floor))),
        }
    }

    pub fn id(&self) -> ElevatorId {
        self.id
    }

    pub fn lock(&self) -> MutexGuard<'_, ElevatorState> {
        lock(&self.state)
    }

    pub fn snapshot(&self) -> ElevatorSnapshot {
        self.lock().snapshot()
    }
}
