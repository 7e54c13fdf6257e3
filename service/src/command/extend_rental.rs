//! [`Command`] for extending a [`Rental`] with a linked successor one.

use std::collections::HashMap;

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        equipment,
        rental::{
            self,
            extension::{self, SourceFinalization},
            Extension,
        },
        Equipment, Rental,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for extending a [`Rental`] with a new one, continuing right
/// after the extended [`Rental`]'s expected return date.
///
/// A paid extended [`Rental`] is finalized along.
#[derive(Clone, Copy, Debug)]
pub struct ExtendRental {
    /// ID of the [`Rental`] to be extended.
    pub rental_id: rental::Id,

    /// Requested [`Extension`].
    pub extension: Extension,

    /// [`Date`] the [`Rental`] is extended on.
    pub today: Date,
}

/// Result of [`ExtendRental`] [`Command`] execution.
#[derive(Clone, Debug)]
pub struct Output {
    /// Extended [`Rental`], as stored after the execution.
    pub source: Rental,

    /// New extending [`Rental`].
    pub rental: Rental,

    /// [`SourceFinalization`] of the extended [`Rental`].
    pub source_finalization: SourceFinalization,
}

impl<Db> Command<ExtendRental> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Rental, rental::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Rental>, rental::Id>>,
            Ok = Option<Rental>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<equipment::Id, Equipment>, Vec<equipment::Id>>>,
            Ok = HashMap<equipment::Id, Equipment>,
            Err = Traced<database::Error>,
        > + Database<Insert<Rental>, Err = Traced<database::Error>>
        + Database<Update<Rental>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ExtendRental) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ExtendRental {
            rental_id,
            extension,
            today,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid extending or finalizing the same `Rental` concurrently.
        tx.execute(Lock(By::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut source = tx
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;

        _ = extension::validate(&source, extension)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let catalog = tx
            .execute(Select(By::<HashMap<_, _>, _>::new(
                source
                    .lines
                    .iter()
                    .map(|l| l.equipment_id)
                    .collect::<Vec<_>>(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let extension::Extended {
            rental,
            source_finalization,
        } = extension::extend(
            &mut source,
            extension,
            rental::Id::new(),
            today,
            &catalog,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        if source_finalization == SourceFinalization::Finalized {
            tx.execute(Update(source.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Insert(rental.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output {
            source,
            rental,
            source_finalization,
        })
    }
}

/// Error of [`ExtendRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rental`] cannot be extended as requested.
    #[display("Cannot extend `Rental`: {_0}")]
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
        domain::rental::{
            self,
            extension::{Kind, SourceFinalization},
            Extension, PaymentMethod, PaymentStatus, State, WeekendBilling,
        },
        Command as _,
    };

    use super::{ExecutionError, ExtendRental};

    fn fixed(additional_days: i32) -> Extension {
        Extension {
            kind: Kind::Fixed { additional_days },
            weekend: WeekendBilling::WEEKDAYS_ONLY,
        }
    }

    #[tokio::test]
    async fn extends_unpaid_rental() {
        let world = world();
        let source = world.create(world.fixed_rental()).await;

        let out = world
            .service
            .execute(ExtendRental {
                rental_id: source.id,
                extension: fixed(3),
                today: date("2024-01-05"),
            })
            .await
            .unwrap();

        assert_eq!(out.source_finalization, SourceFinalization::NotPaid);
        assert_eq!(out.source, source);

        // Source ends on Friday 2024-01-05, so weekends are skipped.
        assert_eq!(out.rental.start_date, date("2024-01-08"));
        assert_eq!(out.rental.expected_return_date(), date("2024-01-10"));
        assert_eq!(out.rental.rental_days(), 3);
        assert_eq!(out.rental.value(), money("540"));
        assert_eq!(out.rental.discount(), money("0"));
        assert_eq!(out.rental.payment.status, PaymentStatus::Pending);
        assert_eq!(out.rental.customer_id, source.customer_id);
        assert_eq!(out.rental.lines, source.lines);
        assert!(out
            .rental
            .notes
            .as_ref()
            .is_some_and(|n| n.to_string().contains(&source.id.to_string())));

        let stored = world.service.database().committed().rentals;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored.get(&out.rental.id), Some(&out.rental));
        assert_eq!(stored.get(&source.id), Some(&source));
    }

    #[tokio::test]
    async fn finalizes_paid_source() {
        let world = world();
        let mut source = world.create(world.fixed_rental()).await;
        source.mark_paid(date("2024-01-04"), PaymentMethod::Pix);
        world.store(source.clone()).await;

        let out = world
            .service
            .execute(ExtendRental {
                rental_id: source.id,
                extension: Extension {
                    kind: Kind::OpenEnded,
                    weekend: WeekendBilling::ALL_DAYS,
                },
                today: date("2024-01-05"),
            })
            .await
            .unwrap();

        assert_eq!(out.source_finalization, SourceFinalization::Finalized);
        assert_eq!(out.source.state(), State::ReturnedPaid);
        assert_eq!(out.source.actual_return_date(), Some(date("2024-01-05")));
        assert_eq!(out.rental.state(), State::OpenEnded);
        assert_eq!(out.rental.start_date, date("2024-01-06"));
        assert_eq!(world.stored(&source), Some(out.source));
    }

    #[tokio::test]
    async fn rejects_open_ended_source() {
        let world = world();
        let source = world.create(world.open_ended_rental()).await;

        let err = world
            .service
            .execute(ExtendRental {
                rental_id: source.id,
                extension: fixed(3),
                today: date("2024-01-05"),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            inner(&err),
            ExecutionError::Rental(rental::Error::CannotExtendOpenEnded(id))
                if *id == source.id,
        ));
        assert_eq!(world.service.database().committed().rentals.len(), 1);
    }

    #[tokio::test]
    async fn rejects_non_positive_days() {
        let world = world();
        let mut source = world.create(world.fixed_rental()).await;
        source.mark_paid(date("2024-01-04"), PaymentMethod::Pix);
        world.store(source.clone()).await;

        let err = world
            .service
            .execute(ExtendRental {
                rental_id: source.id,
                extension: fixed(0),
                today: date("2024-01-05"),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            inner(&err),
            ExecutionError::Rental(rental::Error::InvalidAdditionalDays(0)),
        ));
        assert_eq!(world.stored(&source), Some(source));
    }

    #[tokio::test]
    async fn persists_nothing_on_failed_insert() {
        let world = world();
        let mut source = world.create(world.fixed_rental()).await;
        source.mark_paid(date("2024-01-04"), PaymentMethod::Pix);
        world.store(source.clone()).await;
        world.service.database().reject_inserts();

        let err = world
            .service
            .execute(ExtendRental {
                rental_id: source.id,
                extension: fixed(2),
                today: date("2024-01-05"),
            })
            .await
            .unwrap_err();

        assert!(matches!(inner(&err), ExecutionError::Db(_)));
        let stored = world.service.database().committed().rentals;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.get(&source.id), Some(&source));
    }
}
