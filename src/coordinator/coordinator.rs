/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::mem;
use std::thread::{sleep, Builder, JoinHandle};
use std::time::Instant;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::{Config, RiderSource};
use crate::coordinator::context::{SimulationContext, SimulationHandle};
use crate::dispatch::{ClosestAccept, DispatchPolicy};
use crate::elevator::{ElevatorHandle, ElevatorUnit};
use crate::rider::Rider;
use crate::shared::{
    AssignmentError, Behaviour, BoardingState, ElevatorId, ElevatorSnapshot, RiderSnapshot,
    SimResult, SimulationError,
};

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ElevatorFailure {
    pub elevator: ElevatorId,
    pub error: String,
}

/// Everything a collaborator needs to check a finished run.
#[derive(Serialize, Debug, Clone)]
pub struct RunReport {
    pub policy: String,
    pub elapsed_ms: u128,
    pub elevators: Vec<ElevatorSnapshot>,
    pub riders: Vec<RiderSnapshot>,
    pub failures: Vec<ElevatorFailure>,
}

impl RunReport {
    pub fn total_transported(&self) -> u64 {
        self.elevators.iter().map(|e| e.total_transported).sum()
    }

    pub fn all_arrived(&self) -> bool {
        self.riders
            .iter()
            .all(|r| matches!(r.state, BoardingState::Arrived(_)))
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

type TaskResult = (ElevatorId, SimResult<ElevatorSnapshot>);
type TaskThread = (ElevatorId, JoinHandle<()>);

/**
 * Owns one simulation run.
 *
 * The coordinator validates the configuration, seeds the initial riders, starts one thread per
 * elevator and then runs the assignment loop on the calling thread: pop the oldest unassigned
 * rider, hand it to the dispatch policy, sleep one dispatch interval. When the clock runs out it
 * hangs up on the elevator threads, waits for them up to the grace period and collects the
 * report.
 *
 * # Fields
 * - `ctx`:             Run-scoped context shared with the elevator units.
 * - `policy`:          Dispatch heuristic.
 * - `elevators`:       Fixed pool of elevators, indexed by id.
 * - `unassigned_rx`:   Single consumer of the unassigned-rider queue.
 * - `end_when_all_arrived`: End the run as soon as every rider has arrived.
 * - `failures`:        Elevator failures recorded so far, by elevator.
 * - `reported`:        Elevators whose task has sent back its result.
 */
pub struct Coordinator {
    ctx: Arc<SimulationContext>,
    policy: Box<dyn DispatchPolicy>,
    elevators: Vec<ElevatorHandle>,
    unassigned_rx: cbc::Receiver<Arc<Rider>>,
    end_when_all_arrived: bool,
    failures: BTreeMap<ElevatorId, SimulationError>,
    reported: Vec<bool>,
}

impl Coordinator {
    pub fn new(config: &Config) -> SimResult<Coordinator> {
        Coordinator::with_policy(config, Box::new(ClosestAccept))
    }

    pub fn with_policy(config: &Config, policy: Box<dyn DispatchPolicy>) -> SimResult<Coordinator> {
        config.validate()?;

        let floors = config.floor_count()?;
        let (ctx, unassigned_rx) = SimulationContext::new(
            floors,
            config.timing.clone(),
            config.timeout()?,
            config.simulation.seed,
        );

        match config.rider_source()? {
            RiderSource::Explicit(requests) => {
                for request in requests {
                    // Range checked by validate()
                    ctx.add_rider(request.start_floor as i32, request.destination_floor as i32)?;
                }
            }
            RiderSource::Synthesized(count) => {
                for _ in 0..count {
                    ctx.synthesize_rider()?;
                }
            }
        }

        let elevators: Vec<ElevatorHandle> = (0..config.elevator_count()?)
            .map(|id| ElevatorHandle::new(id, 0))
            .collect();
        let reported = vec![false; elevators.len()];

        Ok(Coordinator {
            ctx,
            policy,
            elevators,
            unassigned_rx,
            end_when_all_arrived: config.simulation.end_when_all_arrived,
            failures: BTreeMap::new(),
            reported,
        })
    }

    pub fn handle(&self) -> SimulationHandle {
        SimulationHandle::new(Arc::clone(&self.ctx))
    }

    pub fn elevators(&self) -> &[ElevatorHandle] {
        &self.elevators
    }

    pub fn run(mut self) -> SimResult<RunReport> {
        let started = self.ctx.clock().start();
        info!(
            "Starting simulation with {} elevators, {} floors and {} riders using {}",
            self.elevators.len(),
            self.ctx.floors(),
            self.ctx.rider_count(),
            self.policy.name()
        );

        // Dropping terminate_tx tells every elevator to stop
        let (terminate_tx, terminate_rx) = cbc::unbounded::<()>();
        let (done_tx, done_rx) = cbc::unbounded::<TaskResult>();
        let mut threads = self.spawn_elevators(&terminate_rx, &done_tx)?;
        drop(done_tx);

        // Main loop
        while self.ctx.clock().is_active() {
            self.collect_finished(&done_rx, &mut threads);

            if self.end_when_all_arrived && self.ctx.all_arrived() {
                info!("Every rider has arrived, ending simulation early");
                break;
            }

            match self.unassigned_rx.try_recv() {
                Ok(rider) => self.dispatch(rider),
                Err(cbc::TryRecvError::Empty) => {}
                Err(cbc::TryRecvError::Disconnected) => break,
            }

            sleep(self.ctx.timing().dispatch_interval());
        }

        info!("Simulation over after {:?}, stopping elevators", started.elapsed());
        drop(terminate_tx);
        self.shutdown(&done_rx, threads);

        Ok(self.report(started))
    }

    fn spawn_elevators(
        &self,
        terminate_rx: &cbc::Receiver<()>,
        done_tx: &cbc::Sender<TaskResult>,
    ) -> SimResult<Vec<TaskThread>> {
        let mut threads = Vec::with_capacity(self.elevators.len());

        for handle in &self.elevators {
            let id = handle.id();
            let unit =
                ElevatorUnit::new(handle.clone(), Arc::clone(&self.ctx), terminate_rx.clone());
            let done_tx = done_tx.clone();

            let thread = Builder::new()
                .name(format!("elevator_{}", id))
                .spawn(move || {
                    let result = unit.run();
                    let _ = done_tx.send((id, result));
                })?;
            threads.push((id, thread));
        }

        Ok(threads)
    }

    fn dispatch(&mut self, rider: Arc<Rider>) {
        debug!("About to assign rider {}", rider.id());

        match self.policy.assign(&rider, &self.elevators) {
            Ok(_) => {}
            Err(AssignmentError::AlreadyAssigned { rider, state }) => {
                debug!("Rider {} is {:?}, nothing to assign", rider, state);
            }
            Err(e @ AssignmentError::NoElevators(_)) => {
                warn!("{}, retrying later", e);
                self.ctx.requeue(rider);
            }
        }
    }

    // Records elevators that stopped before the end of the run, including panicked threads
    fn collect_finished(
        &mut self,
        done_rx: &cbc::Receiver<TaskResult>,
        threads: &mut Vec<TaskThread>,
    ) {
        // Checked before draining, a task sends its result before its thread exits
        let (exited, running): (Vec<_>, Vec<_>) =
            mem::take(threads).into_iter().partition(|(_, t)| t.is_finished());
        *threads = running;

        while let Ok((id, result)) = done_rx.try_recv() {
            self.receive_result(id, result);
        }

        for (id, thread) in exited {
            let _ = thread.join();
            if !self.reported[id] {
                self.record_failure(id, SimulationError::TaskPanicked(id));
            }
        }
    }

    fn receive_result(&mut self, id: ElevatorId, result: SimResult<ElevatorSnapshot>) {
        self.reported[id] = true;
        if let Err(e) = result {
            self.record_failure(id, e);
        }
    }

    fn record_failure(&mut self, id: ElevatorId, e: SimulationError) {
        error!("Elevator {} failed: {}", id, e);

        if let Some(handle) = self.elevators.get(id) {
            let released = {
                let mut state = handle.lock();
                state.behaviour = Behaviour::OutOfService;
                state.release_pending()
            };
            for rider in released {
                info!("Re-queueing rider {} after elevator {} failed", rider.id(), id);
                self.ctx.requeue(rider);
            }
        }
        self.failures.insert(id, e);
    }

    fn shutdown(&mut self, done_rx: &cbc::Receiver<TaskResult>, mut threads: Vec<TaskThread>) {
        let deadline = Instant::now() + self.ctx.timing().shutdown_grace();

        loop {
            self.collect_finished(done_rx, &mut threads);
            if threads.is_empty() || Instant::now() >= deadline {
                break;
            }
            if let Ok((id, result)) = done_rx.recv_timeout(self.ctx.timing().idle_poll()) {
                self.receive_result(id, result);
            }
        }

        // Still running after the grace period, left detached
        for (id, _) in threads {
            if !self.reported[id] {
                self.record_failure(id, SimulationError::ShutdownTimeout(id));
            }
        }
    }

    fn report(&self, started: Instant) -> RunReport {
        let report = RunReport {
            policy: self.policy.name().to_string(),
            elapsed_ms: started.elapsed().as_millis(),
            elevators: self.elevators.iter().map(|e| e.snapshot()).collect(),
            riders: self.ctx.rider_snapshots(),
            failures: self
                .failures
                .iter()
                .map(|(id, e)| ElevatorFailure {
                    elevator: *id,
                    error: e.to_string(),
                })
                .collect(),
        };

        let not_arrived = report
            .riders
            .iter()
            .filter(|r| !matches!(r.state, BoardingState::Arrived(_)));
        for rider in not_arrived {
            warn!("Rider {} did not arrive, last state {:?}", rider.id, rider.state);
        }
        report
    }
}
