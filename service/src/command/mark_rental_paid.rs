//! [`Command`] for marking a [`Rental`] as paid.

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        rental::{self, PaymentDate, PaymentMethod},
        Rental,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for marking a [`Rental`] as paid.
///
/// Doesn't finalize the [`Rental`].
#[derive(Clone, Copy, Debug)]
pub struct MarkRentalPaid {
    /// ID of the paid [`Rental`].
    pub rental_id: rental::Id,

    /// [`PaymentDate`] the [`Rental`] was paid on.
    pub date: PaymentDate,

    /// [`PaymentMethod`] the [`Rental`] was paid with.
    pub method: PaymentMethod,
}

impl<Db> Command<MarkRentalPaid> for Service<Db>
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
        cmd: MarkRentalPaid,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkRentalPaid {
            rental_id,
            date,
            method,
        } = cmd;

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

        rental.mark_paid(date, method);

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

/// Error of [`MarkRentalPaid`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture::{date, inner, world},
        domain::rental::{self, PaymentMethod, PaymentStatus, State},
        Command as _,
    };

    use super::{ExecutionError, MarkRentalPaid};

    #[tokio::test]
    async fn marks_rental_paid() {
        let world = world();
        let rental = world.create(world.fixed_rental()).await;

        let paid = world
            .service
            .execute(MarkRentalPaid {
                rental_id: rental.id,
                date: date("2024-01-03"),
                method: PaymentMethod::Pix,
            })
            .await
            .unwrap();

        assert_eq!(paid.payment.status, PaymentStatus::Paid);
        assert_eq!(paid.payment.method, Some(PaymentMethod::Pix));
        assert_eq!(paid.payment.date, Some(date("2024-01-03")));
        assert_eq!(paid.state(), State::OpenFixed);
        assert_eq!(paid.value(), rental.value());
        assert_eq!(world.stored(&rental), Some(paid));
    }

    #[tokio::test]
    async fn rejects_unknown_rental() {
        let world = world();
        let rental_id = rental::Id::new();

        let err = world
            .service
            .execute(MarkRentalPaid {
                rental_id,
                date: date("2024-01-03"),
                method: PaymentMethod::Cash,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            inner(&err),
            ExecutionError::RentalNotExists(id) if *id == rental_id,
        ));
    }
}
