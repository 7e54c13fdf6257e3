//! [`Command`] for creating a new [`Rental`].

use std::collections::{HashMap, HashSet};

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        customer, equipment,
        rental::{
            self, DeliveryAddress, DraftTerm, Notes, Payment, PaymentMethod,
            PriceBasis, Quantity, WeekendBilling,
        },
        Customer, Equipment, Rental,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Rental`].
///
/// New [`Rental`]s are always pending payment.
#[derive(Clone, Debug)]
pub struct CreateRental {
    /// ID of the [`Customer`] renting the equipment.
    pub customer_id: customer::Id,

    /// `YYYY-MM-DD` date the [`Rental`] starts on.
    pub start_date: String,

    /// Indicator whether the [`Rental`] has no predetermined end.
    pub is_open_ended: bool,

    /// Number of calendar days a fixed-term [`Rental`] lasts.
    ///
    /// Ignored for an open-ended [`Rental`].
    pub rental_days: i32,

    /// Freight charged for a fixed-term [`Rental`].
    ///
    /// Ignored for an open-ended [`Rental`].
    pub freight: Money,

    /// [`WeekendBilling`] policy of the [`Rental`].
    pub weekend: WeekendBilling,

    /// [`PaymentMethod`] the [`Rental`] is going to be paid with, if known.
    pub payment_method: Option<PaymentMethod>,

    /// Free-text notes of the [`Rental`].
    pub notes: Option<String>,

    /// Address the rented equipment is delivered to.
    pub delivery_address: Option<String>,

    /// Rented equipment [`Line`]s.
    pub lines: Vec<Line>,
}

/// Requested rented equipment line.
#[derive(Clone, Copy, Debug)]
pub struct Line {
    /// ID of the rented [`Equipment`].
    pub equipment_id: equipment::Id,

    /// Number of rented units.
    pub quantity: Quantity,

    /// Agreed daily rate of a single unit, if it differs from the standard
    /// one.
    pub custom_daily_rate: Option<Money>,
}

/// Resolves the provided [`Line`]s into [`rental::Line`]s against the
/// provided [`Equipment`] catalog.
///
/// # Errors
///
/// - [`rental::Error::EquipmentNotExists`] if some [`Equipment`] is not in the
///   catalog.
/// - [`rental::Error::DuplicateEquipment`] if some [`Equipment`] is listed
///   twice.
pub(crate) fn resolve_lines(
    lines: Vec<Line>,
    catalog: &HashMap<equipment::Id, Equipment>,
) -> Result<Vec<rental::Line>, rental::Error> {
    let mut seen = HashSet::with_capacity(lines.len());
    lines
        .into_iter()
        .map(|line| {
            let equipment = catalog
                .get(&line.equipment_id)
                .ok_or(rental::Error::EquipmentNotExists(line.equipment_id))?;
            if !seen.insert(line.equipment_id) {
                return Err(rental::Error::DuplicateEquipment(
                    line.equipment_id,
                ));
            }
            Ok(rental::Line {
                equipment_id: line.equipment_id,
                name: equipment.name.clone(),
                quantity: line.quantity,
                custom_daily_rate: line.custom_daily_rate,
            })
        })
        .collect()
}

impl<Db> Command<CreateRental> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Customer>, customer::Id>>,
            Ok = Option<Customer>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<equipment::Id, Equipment>, Vec<equipment::Id>>>,
            Ok = HashMap<equipment::Id, Equipment>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<Insert<Rental>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Rental;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateRental) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateRental {
            customer_id,
            start_date,
            is_open_ended,
            rental_days,
            freight,
            weekend,
            payment_method,
            notes,
            delivery_address,
            lines,
        } = cmd;

        let start_date = rental::parse_date(&start_date)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let customer = self
            .database()
            .execute(Select(By::<Option<Customer>, _>::new(customer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CustomerNotExists(customer_id))
            .map_err(tracerr::wrap!())?;

        let catalog = self
            .database()
            .execute(Select(By::<HashMap<_, _>, _>::new(
                lines.iter().map(|l| l.equipment_id).collect::<Vec<_>>(),
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let lines = resolve_lines(lines, &catalog)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let term = if is_open_ended {
            DraftTerm::OpenEnded
        } else {
            DraftTerm::Fixed {
                rental_days,
                freight,
                basis: PriceBasis::CalendarDays,
            }
        };
        let rental = Rental::create(
            rental::Id::new(),
            rental::Draft {
                customer,
                start_date,
                term,
                weekend,
                payment: Payment {
                    method: payment_method,
                    ..Payment::PENDING
                },
                notes: notes.and_then(Notes::new),
                delivery_address: delivery_address
                    .and_then(DeliveryAddress::new),
                lines,
            },
            &catalog,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Insert(rental.clone()))
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

/// Error of [`CreateRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Customer`] with the provided ID does not exist.
    #[display("`Customer(id: {_0})` does not exist")]
    CustomerNotExists(#[error(not(source))] customer::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rental`] cannot be created as requested.
    #[display("Invalid `Rental`: {_0}")]
    #[from]
    Rental(rental::Error),
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::{
        command::fixture::{date, inner, money, world},
        domain::rental::{self, PaymentStatus, State, Term},
        Command as _,
    };

    use super::{CreateRental, ExecutionError};

    #[tokio::test]
    async fn creates_fixed_term_rental() {
        let world = world();

        let rental = world.create(world.fixed_rental()).await;

        assert_eq!(rental.state(), State::OpenFixed);
        assert_eq!(rental.customer_name, world.customer.name);
        assert_eq!(rental.rental_days(), 5);
        assert_eq!(rental.expected_return_date(), date("2024-01-05"));
        assert_eq!(rental.value(), money("930"));
        assert_eq!(rental.discount(), money("100"));
        assert_eq!(rental.freight(), money("30"));
        assert_eq!(rental.payment.status, PaymentStatus::Pending);
        assert_eq!(rental.lines[0].name, world.mixer.name);
        assert_eq!(world.stored(&rental), Some(rental));
    }

    #[tokio::test]
    async fn creates_open_ended_rental() {
        let world = world();

        let rental = world.create(world.open_ended_rental()).await;

        assert_eq!(rental.state(), State::OpenEnded);
        assert_eq!(rental.rental_days(), 0);
        assert_eq!(rental.expected_return_date(), date("2024-01-01"));
        assert!(matches!(
            rental.term,
            Term::OpenEnded(o) if o.daily_rate == money("100"),
        ));
        assert_eq!(rental.freight(), Money::ZERO);
    }

    #[tokio::test]
    async fn stores_blank_texts_as_absent() {
        let world = world();

        let rental = world
            .create(CreateRental {
                notes: Some("   ".into()),
                delivery_address: Some(String::new()),
                ..world.fixed_rental()
            })
            .await;

        assert_eq!(rental.notes, None);
        assert_eq!(rental.delivery_address, None);
    }

    #[tokio::test]
    async fn rejects_invalid_start_date() {
        let world = world();

        let err = world
            .service
            .execute(CreateRental {
                start_date: "2024-02-30".into(),
                ..world.fixed_rental()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            inner(&err),
            ExecutionError::Rental(rental::Error::InvalidDate(d)) if d == "2024-02-30",
        ));
        assert!(world.service.database().committed().rentals.is_empty());
    }

    #[tokio::test]
    async fn rejects_zero_rental_days() {
        let world = world();

        let err = world
            .service
            .execute(CreateRental {
                rental_days: 0,
                ..world.fixed_rental()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            inner(&err),
            ExecutionError::Rental(rental::Error::InvalidRentalDays(0)),
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_customer() {
        let world = world();
        let customer_id = crate::domain::customer::Id::new();

        let err = world
            .service
            .execute(CreateRental {
                customer_id,
                ..world.fixed_rental()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            inner(&err),
            ExecutionError::CustomerNotExists(id) if *id == customer_id,
        ));
    }

    #[tokio::test]
    async fn rejects_duplicate_equipment() {
        let world = world();
        let mut cmd = world.fixed_rental();
        cmd.lines[1].equipment_id = world.mixer.id;

        let err = world.service.execute(cmd).await.unwrap_err();

        assert!(matches!(
            inner(&err),
            ExecutionError::Rental(rental::Error::DuplicateEquipment(id))
                if *id == world.mixer.id,
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_equipment() {
        let world = world();
        let mut cmd = world.fixed_rental();
        let unknown = crate::domain::equipment::Id::new();
        cmd.lines[1].equipment_id = unknown;

        let err = world.service.execute(cmd).await.unwrap_err();

        assert!(matches!(
            inner(&err),
            ExecutionError::Rental(rental::Error::EquipmentNotExists(id))
                if *id == unknown,
        ));
    }
}
