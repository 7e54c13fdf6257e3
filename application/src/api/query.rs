//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{domain, query, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `Rental` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_NOT_EXISTS` - the `Rental` with the specified ID does not
    ///                         exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "rental",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn rental(
        id: api::rental::Id,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        ctx.service()
            .execute(query::rental::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| RentalError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Equipment` with the specified IDs, in the requested
    /// order.
    ///
    /// Unknown IDs are skipped.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "equipment",
            ids = ?ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn equipment(
        ids: Vec<api::equipment::Id>,
        ctx: &Context,
    ) -> Result<Vec<api::Equipment>, Error> {
        let mut found = ctx
            .service()
            .execute(query::equipment::ByIds::by(
                ids.iter().copied().map(Into::into).collect(),
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        Ok(ids
            .into_iter()
            .filter_map(|id| found.remove(&domain::equipment::Id::from(id)))
            .map(Into::into)
            .collect())
    }
}

define_error! {
    enum EquipmentError {
        #[code = "EQUIPMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Equipment` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum RentalError {
        #[code = "RENTAL_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Rental` with the specified ID does not exist"]
        NotExists,
    }
}
