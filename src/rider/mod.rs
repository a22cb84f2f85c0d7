pub mod rider;
pub mod rider_tests;

pub use rider::Rider;
pub use rider::RiderRequest;
