//! [`Command`] for closing an open-ended [`Rental`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{rental, Rental},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for closing an open-ended [`Rental`], pricing it for every
/// billable day up to `today`.
#[derive(Clone, Copy, Debug)]
pub struct CloseRental {
    /// ID of the [`Rental`] to be closed.
    pub rental_id: rental::Id,

    /// [`Date`] the [`Rental`] is closed on.
    pub today: Date,
}

impl<Db> Command<CloseRental> for Service<Db>
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

    async fn execute(&self, cmd: CloseRental) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CloseRental { rental_id, today } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid closing the same `Rental` twice.
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

        rental
            .close(today)
            .map_err(tracerr::from_and_wrap!(=> E))?;

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

/// Error of [`CloseRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rental`] cannot be closed.
    #[display("Cannot close `Rental`: {_0}")]
    #[from]
    Rental(rental::Error),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture::{date, inner, money, world},
        domain::rental::{self, PaymentStatus, State},
        Command as _,
    };

    use super::{CloseRental, ExecutionError};

    #[tokio::test]
    async fn closes_open_ended_rental() {
        let world = world();
        let rental = world.create(world.open_ended_rental()).await;

        let closed = world
            .service
            .execute(CloseRental {
                rental_id: rental.id,
                today: date("2024-01-10"),
            })
            .await
            .unwrap();

        assert_eq!(closed.state(), State::OpenFixed);
        assert_eq!(closed.rental_days(), 10);
        assert_eq!(closed.value(), money("1000"));
        assert_eq!(closed.expected_return_date(), date("2024-01-10"));
        assert_eq!(closed.payment.status, PaymentStatus::Pending);
        assert_eq!(world.stored(&rental), Some(closed));
    }

    #[tokio::test]
    async fn rejects_fixed_term_rental() {
        let world = world();
        let rental = world.create(world.fixed_rental()).await;

        let err = world
            .service
            .execute(CloseRental {
                rental_id: rental.id,
                today: date("2024-01-10"),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            inner(&err),
            ExecutionError::Rental(rental::Error::NotOpenEnded(id))
                if *id == rental.id,
        ));
        assert_eq!(world.stored(&rental), Some(rental));
    }

    #[tokio::test]
    async fn rejects_closing_before_start() {
        let world = world();
        let rental = world.create(world.open_ended_rental()).await;

        let err = world
            .service
            .execute(CloseRental {
                rental_id: rental.id,
                today: date("2023-12-31"),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            inner(&err),
            ExecutionError::Rental(rental::Error::ClosedBeforeStart(_)),
        ));
        assert_eq!(world.stored(&rental), Some(rental));
    }
}
