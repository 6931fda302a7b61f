pub mod beds;
pub mod chapel;
pub mod reservations;
pub mod volunteers;
