//! [`Command`] for editing an existing [`Rental`].

use std::collections::HashMap;

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Money,
};
use derive_more::{Display, Error, From};
use itertools::Itertools as _;
use tracerr::Traced;

use crate::{
    domain::{
        customer, equipment,
        rental::{
            self, Changes, DeliveryAddress, Notes, PaymentMethod,
            PaymentStatus, WeekendBilling,
        },
        Customer, Equipment, Rental,
    },
    infra::{database, Database},
    Service,
};

use super::{
    create_rental::{resolve_lines, Line},
    Command,
};

/// [`Command`] for editing an existing [`Rental`].
///
/// [`None`] fields are left untouched. Blank texts remove the optional
/// values they stand for.
#[derive(Clone, Debug, Default)]
pub struct UpdateRental {
    /// ID of the [`Rental`] to be edited.
    pub rental_id: rental::Id,

    /// ID of the new [`Customer`] renting the equipment.
    pub customer_id: Option<customer::Id>,

    /// New `YYYY-MM-DD` date the [`Rental`] starts on.
    pub start_date: Option<String>,

    /// Whether the [`Rental`] becomes open-ended or fixed-term.
    pub is_open_ended: Option<bool>,

    /// New number of calendar days of a fixed-term [`Rental`].
    pub rental_days: Option<i32>,

    /// New freight of a fixed-term [`Rental`].
    pub freight: Option<Money>,

    /// Whether Saturdays become billable.
    pub charge_saturdays: Option<bool>,

    /// Whether Sundays become billable.
    pub charge_sundays: Option<bool>,

    /// New rented equipment [`Line`]s.
    pub lines: Option<Vec<Line>>,

    /// New [`PaymentStatus`].
    pub payment_status: Option<PaymentStatus>,

    /// New [`PaymentMethod`], or its removal.
    pub payment_method: Option<Option<PaymentMethod>>,

    /// New `YYYY-MM-DD` payment date, or its removal if blank.
    pub payment_date: Option<String>,

    /// `YYYY-MM-DD` date the rented equipment was returned on.
    ///
    /// Blank one is ignored, as a recorded return is never removed.
    pub actual_return_date: Option<String>,

    /// New notes, or their removal if blank.
    pub notes: Option<String>,

    /// New delivery address, or its removal if blank.
    pub delivery_address: Option<String>,
}

impl<Db> Command<UpdateRental> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Rental, rental::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Customer>, customer::Id>>,
            Ok = Option<Customer>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Rental>, rental::Id>>,
            Ok = Option<Rental>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<equipment::Id, Equipment>, Vec<equipment::Id>>>,
            Ok = HashMap<equipment::Id, Equipment>,
            Err = Traced<database::Error>,
        > + Database<Update<Rental>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Rental;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateRental) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateRental {
            rental_id,
            customer_id,
            start_date,
            is_open_ended,
            rental_days,
            freight,
            charge_saturdays,
            charge_sundays,
            lines,
            payment_status,
            payment_method,
            payment_date,
            actual_return_date,
            notes,
            delivery_address,
        } = cmd;

        let start_date = start_date
            .map(|d| rental::parse_date(&d))
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let payment_date = payment_date
            .map(|d| rental::parse_optional_date(&d))
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let actual_return_date = actual_return_date
            .map(|d| rental::parse_optional_date(&d))
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent edits.
        tx.execute(Lock(By::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let rental = tx
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;

        // Refreshes the customer name snapshot even if the customer is kept.
        let customer = match (
            tx.execute(Select(By::<Option<Customer>, _>::new(
                customer_id.unwrap_or(rental.customer_id),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?,
            customer_id,
        ) {
            (Some(customer), _) => Some(customer),
            (None, Some(id)) => {
                return Err(tracerr::new!(E::CustomerNotExists(id)));
            }
            (None, None) => None,
        };

        let catalog = tx
            .execute(Select(By::<HashMap<_, _>, _>::new(
                rental
                    .lines
                    .iter()
                    .map(|l| l.equipment_id)
                    .chain(lines.iter().flatten().map(|l| l.equipment_id))
                    .unique()
                    .collect::<Vec<_>>(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let lines = lines
            .map(|lines| resolve_lines(lines, &catalog))
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let weekend = (charge_saturdays.is_some() || charge_sundays.is_some())
            .then(|| WeekendBilling {
                saturdays: charge_saturdays
                    .unwrap_or(rental.weekend.saturdays),
                sundays: charge_sundays.unwrap_or(rental.weekend.sundays),
            });

        let updated = rental
            .update(
                Changes {
                    customer,
                    start_date,
                    is_open_ended,
                    rental_days,
                    freight,
                    weekend,
                    lines,
                    payment_status,
                    payment_method,
                    payment_date,
                    actual_return_date,
                    notes: notes.map(Notes::new),
                    delivery_address: delivery_address
                        .map(DeliveryAddress::new),
                },
                &catalog,
            )
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Update(updated.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(updated)
    }
}

/// Error of [`UpdateRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Customer`] with the provided ID does not exist.
    #[display("`Customer(id: {_0})` does not exist")]
    CustomerNotExists(#[error(not(source))] customer::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rental`] cannot be edited as requested.
    #[display("Invalid `Rental` edit: {_0}")]
    #[from]
    Rental(rental::Error),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),
}
