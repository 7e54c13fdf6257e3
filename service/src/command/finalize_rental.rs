//! [`Command`] for recording a physical return of a [`Rental`]'s equipment.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{rental, Rental},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recording a physical return of a paid [`Rental`]'s
/// equipment.
///
/// Finalizing an already finalized [`Rental`] succeeds without changing it.
#[derive(Clone, Copy, Debug)]
pub struct FinalizeRental {
    /// ID of the [`Rental`] to be finalized.
    pub rental_id: rental::Id,

    /// [`Date`] the equipment is returned on.
    pub today: Date,
}

impl<Db> Command<FinalizeRental> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Rental, rental::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Rental>, rental::Id>>,
            Ok = Option<Rental>,
            Err = Traced<database::Error>,
        > + Database<Update<Rental>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Rental;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: FinalizeRental,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let FinalizeRental { rental_id, today } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut rental = tx
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;

        match rental.finalize(today) {
            Ok(()) => {}
            Err(rental::Error::AlreadyFinalized(id)) => {
                log::debug!("`Rental(id: {id})` is already finalized");
                return Ok(rental);
            }
            Err(e) => return Err(tracerr::new!(E::Rental(e))),
        }

        tx.execute(Update(rental.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(rental)
    }
}

/// Error of [`FinalizeRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rental`] cannot be finalized.
    #[display("Cannot finalize `Rental`: {_0}")]
    #[from]
    Rental(rental::Error),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            fixture::{date, inner, world},
            MarkRentalPaid,
        },
        domain::rental::{self, PaymentMethod, State},
        Command as _,
    };

    use super::{ExecutionError, FinalizeRental};

    #[tokio::test]
    async fn finalizes_paid_rental() {
        let world = world();
        let rental = world.create(world.fixed_rental()).await;
        let paid = world
            .service
            .execute(MarkRentalPaid {
                rental_id: rental.id,
                date: date("2024-01-05"),
                method: PaymentMethod::Cash,
            })
            .await
            .unwrap();

        let finalized = world
            .service
            .execute(FinalizeRental {
                rental_id: rental.id,
                today: date("2024-01-06"),
            })
            .await
            .unwrap();

        assert_eq!(finalized.state(), State::ReturnedPaid);
        assert_eq!(finalized.actual_return_date(), Some(date("2024-01-06")));
        assert_eq!(finalized.payment, paid.payment);
        assert_eq!(finalized.value(), paid.value());
        assert_eq!(world.stored(&rental), Some(finalized));
    }

    #[tokio::test]
    async fn finalizes_idempotently() {
        let world = world();
        let mut rental = world.create(world.fixed_rental()).await;
        rental.mark_paid(date("2024-01-05"), PaymentMethod::Cash);
        rental.finalize(date("2024-01-06")).unwrap();
        world.store(rental.clone()).await;

        let again = world
            .service
            .execute(FinalizeRental {
                rental_id: rental.id,
                today: date("2024-01-09"),
            })
            .await
            .unwrap();

        assert_eq!(again, rental);
        assert_eq!(again.actual_return_date(), Some(date("2024-01-06")));
    }

    #[tokio::test]
    async fn rejects_unpaid_rental() {
        let world = world();
        let rental = world.create(world.fixed_rental()).await;

        let err = world
            .service
            .execute(FinalizeRental {
                rental_id: rental.id,
                today: date("2024-01-06"),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            inner(&err),
            ExecutionError::Rental(rental::Error::PaymentNotConfirmed(_)),
        ));
        assert_eq!(world.stored(&rental), Some(rental));
    }

    #[tokio::test]
    async fn rejects_open_ended_rental() {
        let world = world();
        let mut rental = world.create(world.open_ended_rental()).await;
        rental.mark_paid(date("2024-01-05"), PaymentMethod::Cash);
        world.store(rental.clone()).await;

        let err = world
            .service
            .execute(FinalizeRental {
                rental_id: rental.id,
                today: date("2024-01-06"),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            inner(&err),
            ExecutionError::Rental(rental::Error::StillOpenEnded(_)),
        ));
    }
}
