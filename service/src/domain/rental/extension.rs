//! Extending [`Rental`]s with linked successor ones.

use common::{Date, Money};
use tracing as log;

use crate::domain::Customer;

use super::{
    calendar, Days, Draft, DraftTerm, Error, Id, Notes, Payment, PriceBasis,
    Rental, StandardRates, StartDate, WeekendBilling,
};

/// Requested extension of a [`Rental`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Extension {
    /// [`Kind`] of the extending [`Rental`].
    pub kind: Kind,

    /// [`WeekendBilling`] policy of the extending [`Rental`].
    pub weekend: WeekendBilling,
}

/// Kind of an extending [`Rental`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// Fixed-term [`Rental`] lasting the provided number of billable days.
    Fixed {
        /// Number of billable days the extending [`Rental`] lasts.
        additional_days: i32,
    },

    /// Open-ended [`Rental`].
    OpenEnded,
}

/// Outcome of finalizing the extended [`Rental`] along with its extension.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SourceFinalization {
    /// Extended [`Rental`] was finalized.
    Finalized,

    /// Extended [`Rental`] was finalized already.
    AlreadyFinalized,

    /// Extended [`Rental`] is not paid, so it was left as is.
    NotPaid,

    /// Extended [`Rental`] failed to be finalized, and was left as is.
    Failed(Error),
}

/// Result of extending a [`Rental`].
#[derive(Clone, Debug)]
pub struct Extended {
    /// New extending [`Rental`].
    pub rental: Rental,

    /// [`SourceFinalization`] of the extended [`Rental`].
    pub source_finalization: SourceFinalization,
}

/// Checks whether the provided `source` [`Rental`] may be extended as
/// requested, returning the number of billable days of a fixed-term
/// extension.
///
/// # Errors
///
/// - [`Error::CannotExtendOpenEnded`] if the `source` is open-ended.
/// - [`Error::InvalidAdditionalDays`] if a fixed-term extension is requested
///   to last less than a single billable day.
pub fn validate(
    source: &Rental,
    extension: Extension,
) -> Result<Option<Days>, Error> {
    if source.is_open_ended() {
        return Err(Error::CannotExtendOpenEnded(source.id));
    }
    match extension.kind {
        Kind::OpenEnded => Ok(None),
        Kind::Fixed { additional_days } => u32::try_from(additional_days)
            .ok()
            .and_then(Days::new)
            .map(Some)
            .ok_or(Error::InvalidAdditionalDays(additional_days)),
    }
}

/// Finalizes the provided paid `source` [`Rental`] being extended.
///
/// Never fails: a failure is logged and reported as
/// [`SourceFinalization::Failed`], leaving the `source` untouched.
pub fn finalize_source(
    source: &mut Rental,
    today: Date,
) -> SourceFinalization {
    if !source.is_paid() {
        return SourceFinalization::NotPaid;
    }
    match source.finalize(today) {
        Ok(()) => SourceFinalization::Finalized,
        Err(Error::AlreadyFinalized(_)) => SourceFinalization::AlreadyFinalized,
        Err(e) => {
            log::warn!(
                "failed to finalize extended `Rental(id: {})`: {e}",
                source.id,
            );
            SourceFinalization::Failed(e)
        }
    }
}

/// Drafts a new [`Rental`] continuing the provided `source` one right after
/// its expected return date.
///
/// The new [`Rental`] starts on the first billable day after the `source`
/// expected return date, keeps the `source` customer, equipment, custom rates
/// and delivery address, and is pending payment without any freight or
/// discount. Its [`Notes`] reference the `source`.
///
/// # Errors
///
/// - See [`validate()`].
/// - [`Error::InvalidAdditionalDays`] if a fixed-term extension would end
///   out of the supported date range.
/// - [`Error::InvalidDate`] if an open-ended extension would start out of
///   the supported date range.
pub fn draft(source: &Rental, extension: Extension) -> Result<Draft, Error> {
    let billable_days = validate(source, extension)?;
    let out_of_range = || match extension.kind {
        Kind::Fixed { additional_days } => {
            Error::InvalidAdditionalDays(additional_days)
        }
        Kind::OpenEnded => {
            Error::InvalidDate(source.expected_return_date().to_string())
        }
    };

    let start_date: StartDate = calendar::advance_to_next_billable_day(
        source.expected_return_date(),
        extension.weekend,
    )
    .ok_or_else(out_of_range)?
    .coerce();

    let term = match billable_days {
        None => DraftTerm::OpenEnded,
        Some(billable) => {
            let end = calendar::end_of_billable_span(
                start_date,
                billable,
                extension.weekend,
            )
            .ok_or_else(out_of_range)?;
            DraftTerm::Fixed {
                rental_days: i32::try_from(end.days_since(start_date) + 1)
                    .unwrap_or(i32::MAX),
                freight: Money::ZERO,
                basis: PriceBasis::BillableDays(billable),
            }
        }
    };

    Ok(Draft {
        customer: Customer {
            id: source.customer_id,
            name: source.customer_name.clone(),
        },
        start_date,
        term,
        weekend: extension.weekend,
        payment: Payment::PENDING,
        notes: Some(Notes(format!(
            "Extension of rental {} ({} to {})",
            source.id,
            source.start_date,
            source.expected_return_date(),
        ))),
        delivery_address: source.delivery_address.clone(),
        lines: source.lines.clone(),
    })
}

/// Extends the provided `source` [`Rental`] with a new one of the provided
/// `id`, finalizing the `source` along if it's paid.
///
/// The new [`Rental`] is priced with the current standard `rates` for the
/// equipment without custom rates.
///
/// # Errors
///
/// If the [`Rental`] cannot be drafted (see [`draft()`]) or created (see
/// [`Rental::create()`]). The `source` stays untouched then.
pub fn extend(
    source: &mut Rental,
    extension: Extension,
    id: Id,
    today: Date,
    rates: &impl StandardRates,
) -> Result<Extended, Error> {
    let rental = Rental::create(id, draft(source, extension)?, rates)?;
    let source_finalization = finalize_source(source, today);
    Ok(Extended {
        rental,
        source_finalization,
    })
}
