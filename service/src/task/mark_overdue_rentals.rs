//! [`MarkOverdueRentals`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::{
    operations::{By, Perform, Start, Update},
    Date,
};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::rental::Overdue,
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::{rental::PaymentStatus, Rental};

use super::Task;

/// Configuration for [`MarkOverdueRentals`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between checks of [`Rental`]s being overdue.
    pub interval: time::Duration,
}

/// [`Task`] for marking fixed-term [`Rental`]s not paid by their expected
/// return date as [`PaymentStatus::Overdue`].
#[derive(Clone, Copy, Debug)]
pub struct MarkOverdueRentals<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<MarkOverdueRentals<Self>, Config>>> for Service<Db>
where
    MarkOverdueRentals<Service<Db>>:
        Task<Perform<Date>, Ok = u64, Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<MarkOverdueRentals<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = MarkOverdueRentals {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(Date::today())).await {
                Ok(0) => {}
                Ok(n) => log::info!("{n} `Rental`s became overdue"),
                Err(e) => log::error!("`task::MarkOverdueRentals` failed: {e}"),
            }
        }
    }
}

impl<Db> Task<Perform<Date>> for MarkOverdueRentals<Service<Db>>
where
    Db: Database<
        Update<By<Overdue, Date>>,
        Ok = u64,
        Err = Traced<database::Error>,
    >,
{
    type Ok = u64;
    type Err = ExecutionError;

    async fn execute(
        &self,
        Perform(today): Perform<Date>,
    ) -> Result<Self::Ok, Self::Err> {
        self.service
            .database()
            .execute(Update(By::new(today)))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`MarkOverdueRentals`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use std::{collections::HashMap, time::Duration};

    use common::{operations::Perform, Date, Money};

    use crate::{
        domain::{
            customer, equipment,
            rental::{self, Changes, Draft, DraftTerm, Payment, PaymentMethod},
            Customer, Rental,
        },
        infra::database::{memory, Memory},
        Config, Service,
    };

    use super::{MarkOverdueRentals, Task as _};

    fn date<Of: ?Sized>(s: &str) -> common::DateOf<Of> {
        common::DateOf::parse(s).unwrap()
    }

    fn no_rates() -> HashMap<equipment::Id, Money> {
        HashMap::new()
    }

    fn rental(term: DraftTerm) -> Rental {
        let draft = Draft {
            customer: Customer {
                id: customer::Id::new(),
                name: customer::Name::new("ACME Construction").unwrap(),
            },
            start_date: date("2024-01-01"),
            term,
            weekend: rental::WeekendBilling::ALL_DAYS,
            payment: Payment::PENDING,
            notes: None,
            delivery_address: None,
            lines: vec![],
        };
        Rental::create(rental::Id::new(), draft, &no_rates()).unwrap()
    }

    fn fixed(days: i32) -> Rental {
        rental(DraftTerm::Fixed {
            rental_days: days,
            freight: "30".parse().unwrap(),
            basis: rental::PriceBasis::CalendarDays,
        })
    }

    #[tokio::test]
    async fn marks_only_overdue_rentals() {
        let overdue = fixed(5);
        let running = fixed(10);
        let mut paid = fixed(5);
        paid.mark_paid(date("2024-01-02"), PaymentMethod::Cash);
        let open_ended = rental(DraftTerm::OpenEnded);
        let returned = fixed(5)
            .update(
                Changes {
                    actual_return_date: Some(Some(date("2024-01-05"))),
                    ..Changes::default()
                },
                &no_rates(),
            )
            .unwrap();

        let state = memory::State {
            rentals: [&overdue, &running, &paid, &open_ended, &returned]
                .into_iter()
                .map(|r| (r.id, r.clone()))
                .collect(),
            ..memory::State::default()
        };
        let config = Config {
            mark_overdue_rentals: super::Config {
                interval: Duration::from_secs(60),
            },
        };
        let (service, _) = Service::new(config, Memory::new(state));
        let task = MarkOverdueRentals {
            config: config.mark_overdue_rentals,
            service: service.clone(),
        };

        let today: Date = date("2024-01-06");
        assert_eq!(task.execute(Perform(today)).await.unwrap(), 1);
        assert_eq!(task.execute(Perform(today)).await.unwrap(), 0);

        let stored = service.database().committed().rentals;
        assert_eq!(
            stored[&overdue.id].payment.status,
            rental::PaymentStatus::Overdue,
        );
        for r in [&running, &paid, &open_ended, &returned] {
            assert_eq!(&stored[&r.id], r);
        }
    }
}
