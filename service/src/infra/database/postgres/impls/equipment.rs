//! [`Equipment`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{equipment, Equipment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C, IDs> Database<Select<By<HashMap<equipment::Id, Equipment>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[equipment::Id]>,
{
    type Ok = HashMap<equipment::Id, Equipment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<equipment::Id, Equipment>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[equipment::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).expect("too many IDs");

        const SQL: &str = "\
            SELECT id, name, daily_rental_rate, quantity \
            FROM equipment \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                (
                    id,
                    Equipment {
                        id,
                        name: row.get("name"),
                        daily_rental_rate: row.get("daily_rental_rate"),
                        quantity: u32::try_from(row.get::<_, i32>("quantity"))
                            .unwrap_or_default(),
                    },
                )
            })
            .collect())
    }
}
