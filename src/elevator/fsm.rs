/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, error, info};
use std::sync::Arc;
use std::thread::sleep;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::coordinator::SimulationContext;
use crate::elevator::state::ElevatorHandle;
use crate::shared::{Behaviour, Direction, ElevatorSnapshot, Floor, SimResult, SimulationError};

/**
 * Runs one elevator.
 *
 * The `ElevatorUnit` is the task side of an elevator. It moves the car one floor at a time
 * towards its target, stops at every floor where an assigned rider waits or a rider aboard
 * wants to leave, and recomputes its target after each stop. The coordinator stops it by
 * dropping the terminate sender; the unit only checks for that at the top of its loop and
 * while idling, so a load or unload is never cut short.
 *
 * # Fields
 * - `handle`:          Shared state of this elevator, also used by the dispatch policy.
 * - `ctx`:             Run-scoped context (floors, timing, active riders).
 * - `terminate_rx`:    Disconnects when the simulation ends.
 */
pub struct ElevatorUnit {
    handle: ElevatorHandle,
    ctx: Arc<SimulationContext>,
    terminate_rx: cbc::Receiver<()>,
}

/// What the unit does in one iteration of its loop.
#[derive(Debug, PartialEq)]
enum Step {
    Service(Floor),
    Move(Direction),
    Wait,
}

impl ElevatorUnit {
    pub fn new(
        handle: ElevatorHandle,
        ctx: Arc<SimulationContext>,
        terminate_rx: cbc::Receiver<()>,
    ) -> ElevatorUnit {
        ElevatorUnit {
            handle,
            ctx,
            terminate_rx,
        }
    }

    pub fn run(self) -> SimResult<ElevatorSnapshot> {
        let id = self.handle.id();
        info!("Elevator {} starting...", id);

        // Main loop
        while !self.should_terminate() {
            if let Err(e) = self.step() {
                error!("Elevator {} stopped: {}", id, e);
                self.handle.lock().behaviour = Behaviour::OutOfService;
                return Err(e);
            }
        }

        let snapshot = self.handle.snapshot();
        info!(
            "Elevator {} simulation over. Dropped off {} riders and had {} remaining riders",
            id,
            snapshot.total_transported,
            snapshot.riders_aboard.len() + snapshot.riders_assigned.len()
        );
        Ok(snapshot)
    }

    fn should_terminate(&self) -> bool {
        !matches!(self.terminate_rx.try_recv(), Err(cbc::TryRecvError::Empty))
    }

    fn step(&self) -> SimResult<()> {
        match self.next_step() {
            Step::Service(floor) => self.arrive_at_floor(floor),
            Step::Move(direction) => self.move_one_floor(direction),
            Step::Wait => {
                // Returns early when the coordinator hangs up
                let _ = self.terminate_rx.recv_timeout(self.ctx.timing().idle_poll());
                Ok(())
            }
        }
    }

    fn next_step(&self) -> Step {
        let mut state = self.handle.lock();
        let floor = state.current_floor;

        if state.has_work_at(floor) {
            return Step::Service(floor);
        }

        match state.target_floor {
            Some(target) if target != floor => {}
            _ => state.recompute_target(),
        }

        match state.target_floor {
            Some(target) if target != floor => {
                let direction = Direction::toward(floor, target);
                state.direction = direction;
                state.behaviour = Behaviour::moving(direction);
                Step::Move(direction)
            }
            Some(_) => Step::Service(floor),
            None => Step::Wait,
        }
    }

    fn move_one_floor(&self, direction: Direction) -> SimResult<()> {
        let id = self.handle.id();
        let from = self.handle.lock().current_floor;
        let to = from + direction.step();

        if to < 0 || to > self.ctx.floors() {
            return Err(SimulationError::InvariantViolation {
                elevator: id,
                detail: format!(
                    "tried to move {} from floor {} outside [0, {}]",
                    direction,
                    from,
                    self.ctx.floors()
                ),
            });
        }

        sleep(self.ctx.timing().floor_travel());

        self.handle.lock().current_floor = to;
        debug!("Elevator {}: going {} from {} to {}", id, direction, from, to);
        Ok(())
    }

    fn arrive_at_floor(&self, floor: Floor) -> SimResult<()> {
        let id = self.handle.id();
        info!("Elevator {} arriving at {}", id, floor);

        // Unload everyone whose destination is this floor
        let dropped = {
            let mut state = self.handle.lock();
            state.behaviour = Behaviour::AtFloor;

            let (leaving, staying) = state
                .aboard
                .drain(..)
                .partition::<Vec<_>, _>(|r| r.destination_floor() == floor);
            state.aboard = staying;

            let mut dropped = 0;
            let mut leaving = leaving.into_iter();
            while let Some(rider) = leaving.next() {
                if let Err(e) = rider.arrive(id, floor) {
                    // Keep everyone not yet unloaded in the car so they are still reported
                    state.aboard.push(rider);
                    state.aboard.extend(leaving);
                    return Err(e);
                }
                state.total_transported += 1;
                dropped += 1;
            }
            dropped
        };
        if dropped > 0 {
            info!("Elevator {} dropped off {} riders at {}", id, dropped, floor);
        }
        sleep(self.ctx.timing().unload());

        // Board assigned riders first, then anyone still waiting on this floor
        let boarded = {
            let mut state = self.handle.lock();
            let mut boarded = Vec::new();

            let (boarding, still_assigned) = state
                .assigned
                .drain(..)
                .partition::<Vec<_>, _>(|r| r.try_board(id, floor));
            state.assigned = still_assigned;
            boarded.extend(boarding);

            for rider in self.ctx.riders_waiting_at(floor) {
                if rider.try_board(id, floor) {
                    boarded.push(rider);
                }
            }

            let count = boarded.len();
            state.aboard.extend(boarded);
            count
        };
        if boarded > 0 {
            info!("Elevator {} picked up {} riders at {}", id, boarded, floor);
            sleep(self.ctx.timing().load());
        }

        self.handle.lock().recompute_target();
        Ok(())
    }
}
