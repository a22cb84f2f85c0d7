pub mod error;
pub mod macros;
pub mod structs;
pub mod sync;

pub use error::AssignmentError;
pub use error::SimResult;
pub use error::SimulationError;
pub use structs::Behaviour;
pub use structs::BoardingState;
pub use structs::Direction;
pub use structs::ElevatorId;
pub use structs::ElevatorSnapshot;
pub use structs::Floor;
pub use structs::RiderId;
pub use structs::RiderSnapshot;
