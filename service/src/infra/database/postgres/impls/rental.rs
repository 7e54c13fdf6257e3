//! [`Rental`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Date, Money,
};
use itertools::Itertools as _;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        rental::{
            self, Days, Fixed, Line, OpenEnded, Overdue, Payment,
            PaymentStatus, Quantity, Term, WeekendBilling,
        },
        Rental,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Builds a [`Rental`] out of the provided `rentals` table [`Row`] and its
/// [`Line`]s.
fn rental_from_row(row: &Row, lines: Vec<Line>) -> Rental {
    let term = if row.get("is_open_ended") {
        Term::OpenEnded(OpenEnded {
            daily_rate: row.get("value"),
        })
    } else {
        Term::Fixed(Fixed {
            days: u32::try_from(row.get::<_, i32>("rental_days"))
                .ok()
                .and_then(Days::new)
                .expect("`rental_days` is positive for fixed-term rentals"),
            expected_return: row.get("expected_return_date"),
            value: row.get("value"),
            freight: row.get("freight_value"),
            discount: row.get("discount_value"),
            returned_at: row.get("actual_return_date"),
        })
    };
    Rental {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        customer_name: row.get("customer_name"),
        start_date: row.get("rental_start_date"),
        term,
        weekend: WeekendBilling {
            saturdays: row.get("charge_saturdays"),
            sundays: row.get("charge_sundays"),
        },
        payment: Payment {
            status: row.get("payment_status"),
            method: row.get("payment_method"),
            date: row.get("payment_date"),
        },
        notes: row.get("notes"),
        delivery_address: row.get("delivery_address"),
        lines,
    }
}

impl<C, IDs> Database<Select<By<HashMap<rental::Id, Rental>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[rental::Id]>,
{
    type Ok = HashMap<rental::Id, Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<rental::Id, Rental>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[rental::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).expect("too many IDs");

        const LINES_SQL: &str = "\
            SELECT rental_id, equipment_id, name, quantity, custom_daily_rate \
            FROM rental_equipment \
            WHERE rental_id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            ORDER BY rental_id, position";
        let mut lines = self
            .query(LINES_SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                (
                    row.get::<_, rental::Id>("rental_id"),
                    Line {
                        equipment_id: row.get("equipment_id"),
                        name: row.get("name"),
                        quantity: u32::try_from(row.get::<_, i32>("quantity"))
                            .ok()
                            .and_then(Quantity::new)
                            .expect("`quantity` is positive"),
                        custom_daily_rate: row.get("custom_daily_rate"),
                    },
                )
            })
            .into_group_map();

        const SQL: &str = "\
            SELECT id, customer_id, customer_name, \
                   rental_start_date, rental_days, \
                   expected_return_date, actual_return_date, \
                   freight_value, discount_value, value, \
                   payment_status, payment_method, payment_date, \
                   notes, delivery_address, \
                   is_open_ended, charge_saturdays, charge_sundays \
            FROM rentals \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                let lines = lines.remove(&id).unwrap_or_default();
                (id, rental_from_row(&row, lines))
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Rental>, rental::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<rental::Id, Rental>, [rental::Id; 1]>>,
        Ok = HashMap<rental::Id, Rental>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Rental>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Insert<Rental>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Rental>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rental): Insert<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(rental)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Rental>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(rental): Update<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        let rental_days = i32::try_from(rental.rental_days())
            .expect("`rental_days` overflow");
        let expected_return_date = rental.expected_return_date();
        let actual_return_date = rental.actual_return_date();
        let (freight, discount, value) =
            (rental.freight(), rental.discount(), rental.value());
        let is_open_ended = rental.is_open_ended();
        let Rental {
            id,
            customer_id,
            customer_name,
            start_date,
            term: _,
            weekend,
            payment,
            notes,
            delivery_address,
            lines,
        } = rental;

        const SQL: &str = "\
            INSERT INTO rentals (\
                id, customer_id, customer_name, \
                rental_start_date, rental_days, \
                expected_return_date, actual_return_date, \
                freight_value, discount_value, value, \
                payment_status, payment_method, payment_date, \
                notes, delivery_address, \
                is_open_ended, charge_saturdays, charge_sundays \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, \
                $4::DATE, $5::INT4, \
                $6::DATE, $7::DATE, \
                $8::NUMERIC, $9::NUMERIC, $10::NUMERIC, \
                $11::INT2, $12::INT2, $13::DATE, \
                $14::TEXT, $15::TEXT, \
                $16::BOOL, $17::BOOL, $18::BOOL \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET customer_id = EXCLUDED.customer_id, \
                customer_name = EXCLUDED.customer_name, \
                rental_start_date = EXCLUDED.rental_start_date, \
                rental_days = EXCLUDED.rental_days, \
                expected_return_date = EXCLUDED.expected_return_date, \
                actual_return_date = EXCLUDED.actual_return_date, \
                freight_value = EXCLUDED.freight_value, \
                discount_value = EXCLUDED.discount_value, \
                value = EXCLUDED.value, \
                payment_status = EXCLUDED.payment_status, \
                payment_method = EXCLUDED.payment_method, \
                payment_date = EXCLUDED.payment_date, \
                notes = EXCLUDED.notes, \
                delivery_address = EXCLUDED.delivery_address, \
                is_open_ended = EXCLUDED.is_open_ended, \
                charge_saturdays = EXCLUDED.charge_saturdays, \
                charge_sundays = EXCLUDED.charge_sundays";
        self.exec(
            SQL,
            &[
                &id,
                &customer_id,
                &customer_name,
                &start_date,
                &rental_days,
                &expected_return_date,
                &actual_return_date,
                &freight,
                &discount,
                &value,
                &payment.status,
                &payment.method,
                &payment.date,
                &notes,
                &delivery_address,
                &is_open_ended,
                &weekend.saturdays,
                &weekend.sundays,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

        const DELETE_LINES_SQL: &str = "\
            DELETE FROM rental_equipment \
            WHERE rental_id = $1::UUID";
        self.exec(DELETE_LINES_SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        if lines.is_empty() {
            return Ok(());
        }
        let positions = (0..).take(lines.len()).collect::<Vec<i32>>();
        let equipment_ids = lines.iter().map(|l| l.equipment_id).collect_vec();
        let names = lines.iter().map(|l| &l.name).collect_vec();
        let quantities = lines
            .iter()
            .map(|l| {
                i32::try_from(l.quantity.get()).expect("`quantity` overflow")
            })
            .collect_vec();
        let custom_rates: Vec<Option<Money>> =
            lines.iter().map(|l| l.custom_daily_rate).collect();

        const INSERT_LINES_SQL: &str = "\
            INSERT INTO rental_equipment (\
                rental_id, \
                position, equipment_id, name, quantity, custom_daily_rate \
            ) \
            SELECT $1::UUID, * \
            FROM unnest(\
                $2::INT4[], $3::UUID[], $4::VARCHAR[], \
                $5::INT4[], $6::NUMERIC[] \
            )";
        self.exec(
            INSERT_LINES_SQL,
            &[
                &id,
                &positions,
                &equipment_ids,
                &names,
                &quantities,
                &custom_rates,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Rental, rental::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Rental, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: rental::Id = by.into_inner();

        // Updating a conflicting row keeps it locked till the transaction end.
        const SQL: &str = "\
            INSERT INTO rentals_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE \
            SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<By<Overdue, Date>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<Overdue, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        let today = by.into_inner();

        const SQL: &str = "\
            UPDATE rentals \
            SET payment_status = $1::INT2 \
            WHERE is_open_ended = FALSE \
              AND actual_return_date IS NULL \
              AND payment_status = $2::INT2 \
              AND expected_return_date < $3::DATE";
        self.exec(
            SQL,
            &[&PaymentStatus::Overdue, &PaymentStatus::Pending, &today],
        )
        .await
        .map_err(tracerr::wrap!())
    }
}
