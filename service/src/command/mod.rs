//! [`Command`] definition.

pub mod close_rental;
pub mod create_rental;
pub mod extend_rental;
pub mod finalize_rental;
pub mod mark_rental_paid;
pub mod update_rental;

#[cfg(test)]
mod fixture;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    close_rental::CloseRental, create_rental::CreateRental,
    extend_rental::ExtendRental, finalize_rental::FinalizeRental,
    mark_rental_paid::MarkRentalPaid, update_rental::UpdateRental,
};
