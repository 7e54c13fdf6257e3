//! Domain definitions.

pub mod customer;
pub mod equipment;
pub mod rental;

pub use self::{customer::Customer, equipment::Equipment, rental::Rental};
