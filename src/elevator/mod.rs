pub mod fsm;
pub mod fsm_tests;
pub mod state;

pub use fsm::ElevatorUnit;
pub use state::ElevatorHandle;
pub use state::ElevatorState;
