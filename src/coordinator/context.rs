/***************************************/
/*        3rd party libraries          */
/***************************************/
use crossbeam_channel as cbc;
use log::info;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::{Duration, Instant};

/***************************************/
/*           Local modules             */
/***************************************/
use crate::config::TimingConfig;
use crate::rider::Rider;
use crate::shared::sync::{lock, read, write};
use crate::shared::{Floor, RiderId, RiderSnapshot, SimResult, SimulationError};

/**
 * Wall-clock bounded simulation time.
 *
 * The clock is started once by the coordinator. It is active until the configured duration has
 * elapsed or someone asks it to stop early.
 */
#[derive(Debug)]
pub struct SimClock {
    started: OnceLock<Instant>,
    duration: Duration,
    stopped: AtomicBool,
}

impl SimClock {
    pub fn new(duration: Duration) -> SimClock {
        SimClock {
            started: OnceLock::new(),
            duration,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn start(&self) -> Instant {
        *self.started.get_or_init(Instant::now)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.get().map_or(Duration::ZERO, Instant::elapsed)
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.started.get().is_some()
            && !self.stopped.load(Ordering::SeqCst)
            && self.elapsed() < self.duration
    }
}

/**
 * Everything that belongs to one simulation run.
 *
 * Passed explicitly to the coordinator, the elevator units and the rider producers so that
 * several runs can exist side by side without sharing riders or elevators.
 *
 * # Fields
 * - `floors`:          Highest serviceable floor. Elevators move within `[0, floors]`.
 * - `timing`:          Per-step costs.
 * - `clock`:           Run clock.
 * - `active_riders`:   Every rider of the run, in creation order.
 * - `unassigned_tx`:   Producer side of the queue consumed by the coordinator.
 * - `next_rider_id`:   Rider id counter.
 * - `rng`:             Generator for synthesized riders.
 */
#[derive(Debug)]
pub struct SimulationContext {
    floors: Floor,
    timing: TimingConfig,
    clock: SimClock,
    active_riders: RwLock<Vec<Arc<Rider>>>,
    unassigned_tx: cbc::Sender<Arc<Rider>>,
    next_rider_id: AtomicU64,
    rng: Mutex<SmallRng>,
}

impl SimulationContext {
    /// Creates the context and the consumer side of the unassigned-rider queue.
    pub fn new(
        floors: Floor,
        timing: TimingConfig,
        duration: Duration,
        seed: Option<u64>,
    ) -> (Arc<SimulationContext>, cbc::Receiver<Arc<Rider>>) {
        let (unassigned_tx, unassigned_rx) = cbc::unbounded::<Arc<Rider>>();
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let ctx = SimulationContext {
            floors,
            timing,
            clock: SimClock::new(duration),
            active_riders: RwLock::new(Vec::new()),
            unassigned_tx,
            next_rider_id: AtomicU64::new(1),
            rng: Mutex::new(rng),
        };
        (Arc::new(ctx), unassigned_rx)
    }

    pub fn floors(&self) -> Floor {
        self.floors
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Registers a new rider and queues it for assignment.
    pub fn add_rider(&self, start_floor: Floor, destination_floor: Floor) -> SimResult<Arc<Rider>> {
        for floor in [start_floor, destination_floor] {
            if floor < 1 || floor > self.floors {
                return Err(SimulationError::Configuration(format!(
                    "floor {} is outside 1..={}",
                    floor, self.floors
                )));
            }
        }

        let id = self.next_rider_id.fetch_add(1, Ordering::SeqCst);
        let rider = Arc::new(Rider::new(id, start_floor, destination_floor)?);
        info!(
            "Rider {} starting at floor {} going to {}",
            id, start_floor, destination_floor
        );

        write(&self.active_riders).push(Arc::clone(&rider));
        self.requeue(Arc::clone(&rider));
        Ok(rider)
    }

    /// Creates a rider with random, distinct start and destination floors.
    pub fn synthesize_rider(&self) -> SimResult<Arc<Rider>> {
        if self.floors < 2 {
            return Err(SimulationError::Configuration(format!(
                "cannot generate riders in a building with {} floors",
                self.floors
            )));
        }

        let (start, destination) = {
            let mut rng = lock(&self.rng);
            let start = rng.gen_range(1..=self.floors);
            let mut destination = rng.gen_range(1..=self.floors);
            while destination == start {
                destination = rng.gen_range(1..=self.floors);
            }
            (start, destination)
        };
        self.add_rider(start, destination)
    }

    /// Puts a rider (back) at the tail of the unassigned queue.
    pub fn requeue(&self, rider: Arc<Rider>) {
        // Only fails once the coordinator is gone
        let _ = self.unassigned_tx.send(rider);
    }

    pub fn riders_waiting_at(&self, floor: Floor) -> Vec<Arc<Rider>> {
        read(&self.active_riders)
            .iter()
            .filter(|r| r.start_floor() == floor && r.is_waiting())
            .cloned()
            .collect()
    }

    pub fn rider_count(&self) -> usize {
        read(&self.active_riders).len()
    }

    pub fn all_arrived(&self) -> bool {
        read(&self.active_riders).iter().all(|r| r.has_arrived())
    }

    pub fn rider_snapshots(&self) -> Vec<RiderSnapshot> {
        read(&self.active_riders)
            .iter()
            .map(|r| r.snapshot())
            .collect()
    }
}

/**
 * Live interaction surface of a run.
 *
 * Cheap to clone and safe to use from any thread while the coordinator is running.
 */
#[derive(Debug, Clone)]
pub struct SimulationHandle {
    ctx: Arc<SimulationContext>,
}

impl SimulationHandle {
    pub fn new(ctx: Arc<SimulationContext>) -> SimulationHandle {
        SimulationHandle { ctx }
    }

    /// Adds `count` freshly generated riders to the run.
    pub fn inject_riders(&self, count: usize) -> SimResult<Vec<RiderId>> {
        (0..count)
            .map(|_| self.ctx.synthesize_rider().map(|r| r.id()))
            .collect()
    }

    pub fn inject_rider(&self, start_floor: Floor, destination_floor: Floor) -> SimResult<RiderId> {
        self.ctx
            .add_rider(start_floor, destination_floor)
            .map(|r| r.id())
    }

    pub fn is_active(&self) -> bool {
        self.ctx.clock().is_active()
    }

    /// Asks the coordinator to end the run at its next cycle.
    pub fn stop(&self) {
        self.ctx.clock().stop();
    }

    pub fn riders(&self) -> Vec<RiderSnapshot> {
        self.ctx.rider_snapshots()
    }
}
