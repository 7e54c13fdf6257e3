//! GraphQL [`Mutation`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{
    command,
    domain::rental::{extension, Extension, WeekendBilling},
    Command as _,
};

use crate::{api, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `Rental`, pending payment.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CUSTOMER_NOT_EXISTS` - the specified customer does not exist;
    /// - `DUPLICATE_EQUIPMENT` - the same `Equipment` is listed twice;
    /// - `EQUIPMENT_NOT_EXISTS` - the specified `Equipment` does not exist;
    /// - `INVALID_DATE` - the start date is not in `YYYY-MM-DD` format;
    /// - `INVALID_QUANTITY` - a rented quantity is not positive;
    /// - `INVALID_RENTAL_DAYS` - a fixed-term `Rental` lasts less than 1 day,
    ///                          or ends out of supported dates.
    #[tracing::instrument(
        skip_all,
        fields(
            customer_id = %input.customer_id,
            gql.name = "createRental",
            is_open_ended = input.is_open_ended,
            otel.name = Self::SPAN_NAME,
            start_date = %input.start_date,
        ),
    )]
    pub async fn create_rental(
        input: api::rental::CreateInput,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        let cmd = command::CreateRental::try_from(input).map_err(ctx.error())?;
        ctx.service()
            .execute(cmd)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Edits the `Rental` with the specified ID, repricing it if needed.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_NOT_EXISTS` - the `Rental` with the specified ID does not
    ///                         exist;
    /// - `CUSTOMER_NOT_EXISTS` - the specified customer does not exist;
    /// - `STILL_OPEN_ENDED` - a return date is set for an open-ended
    ///                        `Rental`;
    /// - `PAYMENT_NOT_CONFIRMED` - a return date is set for a `Rental` which
    ///                             is not paid;
    /// - `ALREADY_FINALIZED` - a return date differing from the recorded one
    ///                         is set;
    /// - `INVALID_DATE`, `INVALID_QUANTITY`, `INVALID_RENTAL_DAYS`,
    ///   `DUPLICATE_EQUIPMENT`, `EQUIPMENT_NOT_EXISTS` - see `createRental`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateRental",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_rental(
        id: api::rental::Id,
        input: api::rental::UpdateInput,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        let cmd = input.into_command(id).map_err(ctx.error())?;
        ctx.service()
            .execute(cmd)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Marks the `Rental` with the specified ID as paid.
    ///
    /// Payment date defaults to today.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_NOT_EXISTS` - the `Rental` with the specified ID does not
    ///                         exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "markRentalPaid",
            id = %id,
            method = ?method,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn mark_rental_paid(
        id: api::rental::Id,
        method: api::rental::PaymentMethod,
        date: Option<Date>,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        ctx.service()
            .execute(command::MarkRentalPaid {
                rental_id: id.into(),
                date: date.unwrap_or_else(Date::today).coerce(),
                method: method.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Extends the `Rental` with the specified ID with a new one, starting on
    /// the first billable day after its expected return date.
    ///
    /// A paid extended `Rental` is finalized along.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_NOT_EXISTS` - the `Rental` with the specified ID does not
    ///                         exist;
    /// - `CANNOT_EXTEND_OPEN_ENDED` - the `Rental` is open-ended;
    /// - `INVALID_ADDITIONAL_DAYS` - a fixed-term extension lasts less than
    ///                               1 billable day, or ends out of
    ///                               supported dates;
    /// - `INVALID_DATE` - an open-ended extension starts out of supported
    ///                    dates.
    #[tracing::instrument(
        skip_all,
        fields(
            additional_days = ?additional_days,
            gql.name = "extendRental",
            id = %id,
            is_open_ended = is_open_ended,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn extend_rental(
        id: api::rental::Id,
        is_open_ended: bool,
        additional_days: Option<i32>,
        charge_saturdays: bool,
        charge_sundays: bool,
        ctx: &Context,
    ) -> Result<api::rental::ExtendResult, Error> {
        let kind = if is_open_ended {
            extension::Kind::OpenEnded
        } else {
            extension::Kind::Fixed {
                additional_days: additional_days.unwrap_or_default(),
            }
        };
        ctx.service()
            .execute(command::ExtendRental {
                rental_id: id.into(),
                extension: Extension {
                    kind,
                    weekend: WeekendBilling {
                        saturdays: charge_saturdays,
                        sundays: charge_sundays,
                    },
                },
                today: Date::today(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Closes the open-ended `Rental` with the specified ID as of today,
    /// pricing it by its billable days.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_NOT_EXISTS` - the `Rental` with the specified ID does not
    ///                         exist;
    /// - `NOT_OPEN_ENDED` - the `Rental` is not open-ended;
    /// - `CLOSED_BEFORE_START` - the `Rental` starts after today.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "closeRental",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn close_rental(
        id: api::rental::Id,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        ctx.service()
            .execute(command::CloseRental {
                rental_id: id.into(),
                today: Date::today(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Records the return of the equipment of the paid `Rental` with the
    /// specified ID as of today.
    ///
    /// Finalizing a finalized `Rental` returns it as is.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RENTAL_NOT_EXISTS` - the `Rental` with the specified ID does not
    ///                         exist;
    /// - `STILL_OPEN_ENDED` - the `Rental` is open-ended;
    /// - `PAYMENT_NOT_CONFIRMED` - the `Rental` is not paid.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "finalizeRental",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn finalize_rental(
        id: api::rental::Id,
        ctx: &Context,
    ) -> Result<api::Rental, Error> {
        ctx.service()
            .execute(command::FinalizeRental {
                rental_id: id.into(),
                today: Date::today(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for command::create_rental::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::CustomerNotExists(_) => {
                Some(api::rental::CustomerError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::Rental(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_rental::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::CustomerNotExists(_) => {
                Some(api::rental::CustomerError::NotExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::Rental(e) => e.try_as_error(),
            Self::RentalNotExists(_) => {
                Some(api::query::RentalError::NotExists.into())
            }
        }
    }
}

impl AsError for command::mark_rental_paid::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::RentalNotExists(_) => {
                Some(api::query::RentalError::NotExists.into())
            }
        }
    }
}

impl AsError for command::extend_rental::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Rental(e) => e.try_as_error(),
            Self::RentalNotExists(_) => {
                Some(api::query::RentalError::NotExists.into())
            }
        }
    }
}

impl AsError for command::close_rental::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Rental(e) => e.try_as_error(),
            Self::RentalNotExists(_) => {
                Some(api::query::RentalError::NotExists.into())
            }
        }
    }
}

impl AsError for command::finalize_rental::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Rental(e) => e.try_as_error(),
            Self::RentalNotExists(_) => {
                Some(api::query::RentalError::NotExists.into())
            }
        }
    }
}
