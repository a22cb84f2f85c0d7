//! Multi-elevator dispatch simulation.
//!
//! A [`Coordinator`] owns one run: it starts a thread per elevator, feeds waiting riders to a
//! [`DispatchPolicy`] and returns a [`RunReport`] once the clock runs out. Riders can be added
//! while the run is live through a [`SimulationHandle`].

pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod elevator;
pub mod rider;
pub mod shared;

pub use config::Config;
pub use coordinator::{Coordinator, RunReport, SimulationHandle};
pub use dispatch::{ClosestAccept, DispatchPolicy};
pub use elevator::{ElevatorHandle, ElevatorUnit};
pub use rider::{Rider, RiderRequest};
pub use shared::{AssignmentError, SimResult, SimulationError};
