//! Shared setup of [`Command`] tests.
//!
//! [`Command`]: super::Command

use std::{collections::HashMap, time::Duration};

use common::{operations::Insert, DateOf, Money};
use tracerr::Traced;

use crate::{
    domain::{
        customer, equipment,
        rental::{Quantity, WeekendBilling},
        Customer, Equipment, Rental,
    },
    infra::{
        database::{memory, Memory},
        Database as _,
    },
    task::mark_overdue_rentals,
    Config, Service,
};

use super::{create_rental, CreateRental};

pub(super) fn money(s: &str) -> Money {
    s.parse().unwrap()
}

pub(super) fn date<Of: ?Sized>(s: &str) -> DateOf<Of> {
    DateOf::parse(s).unwrap()
}

/// Returns the error wrapped into the provided [`Traced`] one.
pub(super) fn inner<E>(err: &Traced<E>) -> &E {
    err.as_ref()
}

/// [`Service`] with a single [`Customer`] and two pieces of [`Equipment`]
/// in stock.
pub(super) struct World {
    pub(super) service: Service<Memory>,
    pub(super) customer: Customer,

    /// Concrete mixer with a standard daily rate of `50`.
    pub(super) mixer: Equipment,

    /// Drill with a standard daily rate of `100`.
    pub(super) drill: Equipment,
}

pub(super) fn world() -> World {
    let customer = Customer {
        id: customer::Id::new(),
        name: customer::Name::new("ACME Construction").unwrap(),
    };
    let mixer = Equipment {
        id: equipment::Id::new(),
        name: equipment::Name::new("Concrete mixer").unwrap(),
        daily_rental_rate: money("50"),
        quantity: 4,
    };
    let drill = Equipment {
        id: equipment::Id::new(),
        name: equipment::Name::new("Drill").unwrap(),
        daily_rental_rate: money("100"),
        quantity: 10,
    };

    let state = memory::State {
        customers: HashMap::from([(customer.id, customer.clone())]),
        equipment: HashMap::from([
            (mixer.id, mixer.clone()),
            (drill.id, drill.clone()),
        ]),
        ..memory::State::default()
    };
    let config = Config {
        mark_overdue_rentals: mark_overdue_rentals::Config {
            interval: Duration::from_secs(60),
        },
    };
    let (service, _) = Service::new(config, Memory::new(state));

    World {
        service,
        customer,
        mixer,
        drill,
    }
}

impl World {
    /// Returns [`CreateRental`] of a fixed-term [`Rental`] lasting 5 days
    /// from Monday 2024-01-01 of 2 mixers at a custom rate of `40` and a drill
    /// at its standard rate, with a freight of `30`.
    pub(super) fn fixed_rental(&self) -> CreateRental {
        CreateRental {
            customer_id: self.customer.id,
            start_date: "2024-01-01".into(),
            is_open_ended: false,
            rental_days: 5,
            freight: money("30"),
            weekend: WeekendBilling::ALL_DAYS,
            payment_method: None,
            notes: None,
            delivery_address: Some("12 Main St".into()),
            lines: vec![
                create_rental::Line {
                    equipment_id: self.mixer.id,
                    quantity: Quantity::new(2).unwrap(),
                    custom_daily_rate: Some(money("40")),
                },
                create_rental::Line {
                    equipment_id: self.drill.id,
                    quantity: Quantity::new(1).unwrap(),
                    custom_daily_rate: None,
                },
            ],
        }
    }

    /// Returns [`CreateRental`] of an open-ended [`Rental`] starting on
    /// Monday 2024-01-01 of a single drill.
    pub(super) fn open_ended_rental(&self) -> CreateRental {
        CreateRental {
            is_open_ended: true,
            rental_days: 0,
            freight: Money::ZERO,
            lines: vec![create_rental::Line {
                equipment_id: self.drill.id,
                quantity: Quantity::new(1).unwrap(),
                custom_daily_rate: None,
            }],
            ..self.fixed_rental()
        }
    }

    /// Executes the provided [`CreateRental`] [`Command`].
    ///
    /// [`Command`]: super::Command
    pub(super) async fn create(&self, cmd: CreateRental) -> Rental {
        self.service.execute(cmd).await.unwrap()
    }

    /// Stores the provided [`Rental`] as is.
    pub(super) async fn store(&self, rental: Rental) {
        self.service
            .database()
            .execute(Insert(rental))
            .await
            .unwrap();
    }

    /// Returns the committed [`Rental`] with the provided ID.
    pub(super) fn stored(&self, rental: &Rental) -> Option<Rental> {
        self.service
            .database()
            .committed()
            .rentals
            .get(&rental.id)
            .cloned()
    }
}
