/***************************************/
/*        3rd party libraries          */
/***************************************/
use log::warn;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/***************************************/
/*           Local modules             */
/***************************************/
use crate::rider::RiderRequest;
use crate::shared::{Floor, SimResult, SimulationError};

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Config {
    pub building: BuildingConfig,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BuildingConfig {
    pub elevator_count: i64,
    pub floor_count: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SimulationConfig {
    pub timeout_secs: i64,
    #[serde(default)]
    pub rider_count: Option<i64>,
    #[serde(default)]
    pub riders: Option<Vec<RiderRequest>>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub end_when_all_arrived: bool,
}

/// Per-step costs of the simulated building, in milliseconds.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    pub floor_travel_ms: u64,
    pub load_ms: u64,
    pub unload_ms: u64,
    pub dispatch_interval_ms: u64,
    pub idle_poll_ms: u64,
    pub shutdown_grace_ms: u64,
}

/// Which riders a run starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiderSource {
    Explicit(Vec<RiderRequest>),
    Synthesized(usize),
}

impl Default for BuildingConfig {
    fn default() -> Self {
        BuildingConfig {
            elevator_count: 5,
            floor_count: 20,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            timeout_secs: 50,
            rider_count: Some(10),
            riders: None,
            seed: None,
            end_when_all_arrived: false,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            floor_travel_ms: 100,
            load_ms: 100,
            unload_ms: 100,
            dispatch_interval_ms: 1000,
            idle_poll_ms: 100,
            shutdown_grace_ms: 3000,
        }
    }
}

impl TimingConfig {
    pub fn floor_travel(&self) -> Duration {
        Duration::from_millis(self.floor_travel_ms)
    }

    pub fn load(&self) -> Duration {
        Duration::from_millis(self.load_ms)
    }

    pub fn unload(&self) -> Duration {
        Duration::from_millis(self.unload_ms)
    }

    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_millis(self.dispatch_interval_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/***************************************/
/*             Public API              */
/***************************************/
impl Config {
    /// Configuration for a run with a known list of riders.
    pub fn with_riders(
        elevator_count: i64,
        floor_count: i64,
        timeout_secs: i64,
        riders: Vec<RiderRequest>,
    ) -> Config {
        Config {
            building: BuildingConfig {
                elevator_count,
                floor_count,
            },
            simulation: SimulationConfig {
                timeout_secs,
                rider_count: None,
                riders: Some(riders),
                ..SimulationConfig::default()
            },
            timing: TimingConfig::default(),
        }
    }

    /// Configuration for a run with `rider_count` randomly generated riders.
    pub fn with_rider_count(
        elevator_count: i64,
        floor_count: i64,
        timeout_secs: i64,
        rider_count: i64,
    ) -> Config {
        Config {
            building: BuildingConfig {
                elevator_count,
                floor_count,
            },
            simulation: SimulationConfig {
                timeout_secs,
                rider_count: Some(rider_count),
                riders: None,
                ..SimulationConfig::default()
            },
            timing: TimingConfig::default(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Config> {
        let config_str = fs::read_to_string(path)?;
        Config::from_toml_str(&config_str)
    }

    pub fn from_toml_str(config_str: &str) -> SimResult<Config> {
        Ok(toml::from_str(config_str)?)
    }

    pub fn validate(&self) -> SimResult<()> {
        self.elevator_count()?;
        self.timeout()?;
        self.rider_source()?;
        Ok(())
    }

    pub fn elevator_count(&self) -> SimResult<usize> {
        non_negative("elevator_count", self.building.elevator_count)
    }

    pub fn floor_count(&self) -> SimResult<Floor> {
        let floors = self.building.floor_count;
        if floors < 0 {
            return Err(negative("floor_count", floors));
        }
        Floor::try_from(floors).map_err(|_| {
            SimulationError::Configuration(format!("floor_count {} is too large", floors))
        })
    }

    pub fn timeout(&self) -> SimResult<Duration> {
        let secs = non_negative("timeout_secs", self.simulation.timeout_secs)?;
        Ok(Duration::from_secs(secs as u64))
    }

    /// Resolves and validates the initial riders of the run.
    pub fn rider_source(&self) -> SimResult<RiderSource> {
        let floors = self.floor_count()?;

        match (&self.simulation.riders, self.simulation.rider_count) {
            (Some(riders), count) => {
                if count.is_some() {
                    warn!("Both riders and rider_count are set, using the explicit rider list");
                }
                for (index, request) in riders.iter().enumerate() {
                    validate_request(index, request, floors)?;
                }
                Ok(RiderSource::Explicit(riders.clone()))
            }
            (None, Some(count)) => {
                let count = non_negative("rider_count", count)?;
                if count > 0 && floors < 2 {
                    return Err(SimulationError::Configuration(format!(
                        "cannot generate riders in a building with {} floors",
                        floors
                    )));
                }
                Ok(RiderSource::Synthesized(count))
            }
            (None, None) => Err(SimulationError::Configuration(
                "rider list is unset, provide riders or rider_count".to_string(),
            )),
        }
    }
}

/***************************************/
/*          Private functions          */
/***************************************/
fn negative(name: &str, value: i64) -> SimulationError {
    SimulationError::Configuration(format!("{} must not be negative, got {}", name, value))
}

fn non_negative(name: &str, value: i64) -> SimResult<usize> {
    if value < 0 {
        return Err(negative(name, value));
    }
    usize::try_from(value)
        .map_err(|_| SimulationError::Configuration(format!("{} {} is too large", name, value)))
}

fn validate_request(index: usize, request: &RiderRequest, floors: Floor) -> SimResult<()> {
    let in_range = |floor: i64| floor >= 1 && floor <= floors as i64;

    if !in_range(request.start_floor) || !in_range(request.destination_floor) {
        return Err(SimulationError::Configuration(format!(
            "rider #{} travels {} -> {}, outside floors 1..={}",
            index, request.start_floor, request.destination_floor, floors
        )));
    }
    if request.start_floor == request.destination_floor {
        return Err(SimulationError::Configuration(format!(
            "rider #{} starts and ends at floor {}",
            index, request.start_floor
        )));
    }
    Ok(())
}
