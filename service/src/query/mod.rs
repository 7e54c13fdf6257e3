//! [`Query`] definition.

pub mod customer;
pub mod equipment;
pub mod rental;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use std::{collections::HashMap, time::Duration};

    use crate::{
        domain::{customer, equipment, Customer, Equipment},
        infra::database::{memory, Memory},
        task::mark_overdue_rentals,
        Config, Query as _, Service,
    };

    use super::{customer as customer_query, equipment as equipment_query};

    fn service(state: memory::State) -> Service<Memory> {
        let config = Config {
            mark_overdue_rentals: mark_overdue_rentals::Config {
                interval: Duration::from_secs(60),
            },
        };
        Service::new(config, Memory::new(state)).0
    }

    #[tokio::test]
    async fn selects_equipment_by_ids() {
        let (mixer, drill) = (equipment::Id::new(), equipment::Id::new());
        let svc = service(memory::State {
            equipment: HashMap::from([(
                mixer,
                Equipment {
                    id: mixer,
                    name: equipment::Name::new("Concrete mixer").unwrap(),
                    daily_rental_rate: "50".parse().unwrap(),
                    quantity: 3,
                },
            )]),
            ..memory::State::default()
        });

        let found = svc
            .execute(equipment_query::ByIds::by(vec![mixer, drill]))
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[&mixer].quantity, 3);
    }

    #[tokio::test]
    async fn selects_customer_by_id() {
        let id = customer::Id::new();
        let customer = Customer {
            id,
            name: customer::Name::new("ACME Construction").unwrap(),
        };
        let svc = service(memory::State {
            customers: HashMap::from([(id, customer.clone())]),
            ..memory::State::default()
        });

        assert_eq!(
            svc.execute(customer_query::ById::by(id)).await.unwrap(),
            Some(customer),
        );
        assert_eq!(
            svc.execute(customer_query::ById::by(customer::Id::new()))
                .await
                .unwrap(),
            None,
        );
    }
}
