pub mod context;
pub mod coordinator;

pub use context::SimClock;
pub use context::SimulationContext;
pub use context::SimulationHandle;
pub use coordinator::Coordinator;
pub use coordinator::ElevatorFailure;
pub use coordinator::RunReport;
