//! [`Equipment`]-related definitions.

use std::future;

use common::{Handler as _, Money};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A rentable equipment.
#[derive(Clone, Debug)]
pub struct Equipment {
    /// ID of this [`Equipment`].
    id: Id,

    /// Underlying [`domain::Equipment`].
    equipment: OnceCell<domain::Equipment>,
}

impl From<domain::Equipment> for Equipment {
    fn from(equipment: domain::Equipment) -> Self {
        Self {
            id: equipment.id.into(),
            equipment: OnceCell::new_with(Some(equipment)),
        }
    }
}

impl Equipment {
    /// Creates a new [`Equipment`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Equipment`] with the provided ID exists,
    /// otherwise accessing this [`Equipment`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            equipment: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Equipment`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Equipment`] doesn't exist.
    async fn equipment(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Equipment, Error> {
        let id = self.id.into();
        self.equipment
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::equipment::ByIds::by(vec![id]))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|mut found| {
                        future::ready(found.remove(&id).ok_or_else(|| {
                            api::query::EquipmentError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A rentable equipment.
#[graphql_object(context = Context)]
impl Equipment {
    /// Unique identifier of this `Equipment`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Equipment.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of this `Equipment`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Equipment.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.equipment(ctx).await?.name.clone().into())
    }

    /// Standard daily rental rate of a single unit of this `Equipment`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Equipment.dailyRentalRate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn daily_rental_rate(
        &self,
        ctx: &Context,
    ) -> Result<Money, Error> {
        Ok(self.equipment(ctx).await?.daily_rental_rate)
    }

    /// Number of units of this `Equipment` owned by the business.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Equipment.quantity",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn quantity(&self, ctx: &Context) -> Result<i32, Error> {
        i32::try_from(self.equipment(ctx).await?.quantity)
            .map_err(AsError::into_error)
    }
}

/// Unique identifier of an `Equipment`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::equipment::Id)]
#[into(domain::equipment::Id)]
#[graphql(name = "EquipmentId", transparent)]
pub struct Id(Uuid);

/// Name of an `Equipment`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "EquipmentName",
    with = scalar::Via::<domain::equipment::Name>,
)]
pub struct Name(domain::equipment::Name);
