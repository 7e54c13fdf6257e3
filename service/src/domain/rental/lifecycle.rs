//! Creating and editing [`Rental`]s.

use common::Money;

use crate::domain::Customer;

use super::{
    pricing, ActualReturnDate, Days, DeliveryAddress, Error, ExpectedReturnDate,
    Fixed, Id, Line, Notes, OpenEnded, Payment, PaymentDate, PaymentMethod,
    PaymentStatus, Rental, StandardRates, StartDate, Term, WeekendBilling,
};

/// Everything needed to create a new [`Rental`].
#[derive(Clone, Debug)]
pub struct Draft {
    /// [`Customer`] renting the equipment.
    pub customer: Customer,

    /// [`StartDate`] of the new [`Rental`].
    pub start_date: StartDate,

    /// [`DraftTerm`] of the new [`Rental`].
    pub term: DraftTerm,

    /// [`WeekendBilling`] policy of the new [`Rental`].
    pub weekend: WeekendBilling,

    /// Initial [`Payment`] of the new [`Rental`].
    pub payment: Payment,

    /// [`Notes`] of the new [`Rental`].
    pub notes: Option<Notes>,

    /// [`DeliveryAddress`] of the new [`Rental`].
    pub delivery_address: Option<DeliveryAddress>,

    /// Rented equipment [`Line`]s.
    pub lines: Vec<Line>,
}

/// Requested [`Term`] of a new [`Rental`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DraftTerm {
    /// [`Term::Fixed`] lasting the provided number of calendar days.
    Fixed {
        /// Number of calendar days the [`Rental`] lasts.
        rental_days: i32,

        /// Freight charged for the [`Rental`].
        freight: Money,

        /// [`PriceBasis`] of the [`Rental`] value.
        basis: PriceBasis,
    },

    /// [`Term::OpenEnded`].
    OpenEnded,
}

/// Number of days a fixed-term [`Rental`] value is computed for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PriceBasis {
    /// Every calendar day of the [`Rental`] is charged, and custom daily
    /// rates below the standard ones are accounted as a discount.
    #[default]
    CalendarDays,

    /// Only the pre-agreed number of billable days is charged, without any
    /// discount accounted.
    BillableDays(Days),
}

/// Explicit edit of an existing [`Rental`].
///
/// [`None`] fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct Changes {
    /// New [`Customer`] renting the equipment.
    pub customer: Option<Customer>,

    /// New [`StartDate`].
    pub start_date: Option<StartDate>,

    /// Whether the [`Rental`] becomes open-ended or fixed-term.
    pub is_open_ended: Option<bool>,

    /// New number of calendar days of a fixed-term [`Rental`].
    ///
    /// Ignored for a [`Rental`] which stays or becomes open-ended.
    pub rental_days: Option<i32>,

    /// New freight of a fixed-term [`Rental`].
    pub freight: Option<Money>,

    /// New [`WeekendBilling`] policy.
    pub weekend: Option<WeekendBilling>,

    /// New rented equipment [`Line`]s.
    pub lines: Option<Vec<Line>>,

    /// New [`PaymentStatus`].
    pub payment_status: Option<PaymentStatus>,

    /// New [`PaymentMethod`], or its removal.
    pub payment_method: Option<Option<PaymentMethod>>,

    /// New [`PaymentDate`], or its removal.
    ///
    /// Always removed for a [`Rental`] which is not [`PaymentStatus::Paid`].
    pub payment_date: Option<Option<PaymentDate>>,

    /// [`ActualReturnDate`] to record.
    ///
    /// Once recorded, an [`ActualReturnDate`] is never removed nor replaced,
    /// so `Some(None)` keeps the current one (if any). Recording a new one
    /// requires the [`Rental`] to be paid, same as finalization does.
    pub actual_return_date: Option<Option<ActualReturnDate>>,

    /// New [`Notes`], or their removal.
    pub notes: Option<Option<Notes>>,

    /// New [`DeliveryAddress`], or its removal.
    pub delivery_address: Option<Option<DeliveryAddress>>,
}

impl Rental {
    /// Creates a new [`Rental`] out of the provided [`Draft`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRentalDays`] if a fixed-term [`Rental`] is requested
    ///   to last less than a day, or to end out of the supported date range.
    /// - [`Error::EquipmentNotExists`] if a standard rate of some rented
    ///   equipment is required but unknown.
    pub fn create(
        id: Id,
        draft: Draft,
        rates: &impl StandardRates,
    ) -> Result<Self, Error> {
        let Draft {
            customer,
            start_date,
            term,
            weekend,
            payment,
            notes,
            delivery_address,
            lines,
        } = draft;

        let term = match term {
            DraftTerm::OpenEnded => Term::OpenEnded(OpenEnded {
                daily_rate: pricing::daily_rate_sum(&lines, rates)?,
            }),
            DraftTerm::Fixed {
                rental_days,
                freight,
                basis,
            } => {
                let days = rental_days_from(rental_days)?;
                let expected_return = expected_return_date(start_date, days)?;
                let (value, discount) = match basis {
                    PriceBasis::CalendarDays => (
                        pricing::fixed_term_value(
                            &lines,
                            days.get(),
                            freight,
                            rates,
                        )?,
                        pricing::discount(&lines, days.get(), rates)?,
                    ),
                    PriceBasis::BillableDays(billable) => (
                        pricing::fixed_term_value(
                            &lines,
                            billable.get(),
                            freight,
                            rates,
                        )?,
                        Money::ZERO,
                    ),
                };
                Term::Fixed(Fixed {
                    days,
                    expected_return,
                    value,
                    freight,
                    discount,
                    returned_at: None,
                })
            }
        };

        Ok(Self {
            id,
            customer_id: customer.id,
            customer_name: customer.name,
            start_date,
            term,
            weekend,
            payment,
            notes,
            delivery_address,
            lines,
        })
    }

    /// Returns a copy of this [`Rental`] with the provided [`Changes`]
    /// applied.
    ///
    /// The expected return date is re-derived only when the start date, the
    /// number of days or the open-endedness actually change. The value and the
    /// discount are recomputed only when the lines, the number of days or the
    /// open-endedness actually change, while a changed freight alone is just
    /// swapped in the value. So, empty [`Changes`] result in an identical
    /// [`Rental`].
    ///
    /// # Errors
    ///
    /// - [`Error::StillOpenEnded`] if the resulting [`Rental`] would be
    ///   open-ended and returned at the same time.
    /// - [`Error::AlreadyFinalized`] if a return date different from the
    ///   recorded one is requested.
    /// - [`Error::PaymentNotConfirmed`] if a return date is requested for the
    ///   resulting [`Rental`] which is not paid.
    /// - [`Error::InvalidRentalDays`] if the resulting fixed-term [`Rental`]
    ///   would last less than a day, or end out of the supported date range.
    /// - [`Error::EquipmentNotExists`] if a standard rate of some rented
    ///   equipment is required but unknown.
    pub fn update(
        &self,
        changes: Changes,
        rates: &impl StandardRates,
    ) -> Result<Self, Error> {
        let Changes {
            customer,
            start_date,
            is_open_ended,
            rental_days,
            freight,
            weekend,
            lines,
            payment_status,
            payment_method,
            payment_date,
            actual_return_date,
            notes,
            delivery_address,
        } = changes;

        let mut updated = self.clone();

        if let Some(customer) = customer {
            updated.customer_id = customer.id;
            updated.customer_name = customer.name;
        }
        if let Some(weekend) = weekend {
            updated.weekend = weekend;
        }
        if let Some(status) = payment_status {
            updated.payment.status = status;
        }
        if let Some(method) = payment_method {
            updated.payment.method = method;
        }
        if let Some(date) = payment_date {
            updated.payment.date = date;
        }
        if !updated.is_paid() {
            updated.payment.date = None;
        }
        if let Some(notes) = notes {
            updated.notes = notes;
        }
        if let Some(address) = delivery_address {
            updated.delivery_address = address;
        }

        let start_changed = start_date.is_some_and(|d| d != self.start_date);
        if let Some(date) = start_date {
            updated.start_date = date;
        }
        let lines_changed = lines.as_ref().is_some_and(|l| *l != self.lines);
        if let Some(lines) = lines {
            updated.lines = lines;
        }
        let requested_return = actual_return_date.flatten();

        let previous = match self.term {
            Term::Fixed(fixed) => Some(fixed),
            Term::OpenEnded(_) => None,
        };

        updated.term = if is_open_ended.unwrap_or(previous.is_none()) {
            if requested_return.is_some()
                || previous.is_some_and(|p| p.returned_at.is_some())
            {
                return Err(Error::StillOpenEnded(self.id));
            }
            match self.term {
                Term::OpenEnded(open) if !lines_changed => Term::OpenEnded(open),
                Term::OpenEnded(_) | Term::Fixed(_) => {
                    Term::OpenEnded(OpenEnded {
                        daily_rate: pricing::daily_rate_sum(
                            &updated.lines,
                            rates,
                        )?,
                    })
                }
            }
        } else {
            let days = match (rental_days, previous) {
                (Some(days), _) => rental_days_from(days)?,
                (None, Some(p)) => p.days,
                (None, None) => return Err(Error::InvalidRentalDays(0)),
            };
            let stored_return = previous.and_then(|p| p.returned_at);
            let returned_at = match (requested_return, stored_return) {
                (None, stored) => stored,
                (Some(new), Some(stored)) if new == stored => Some(stored),
                (Some(_), Some(_)) => {
                    return Err(Error::AlreadyFinalized(self.id));
                }
                (Some(_), None) if !updated.is_paid() => {
                    return Err(Error::PaymentNotConfirmed(self.id));
                }
                (Some(new), None) => Some(new),
            };
            let freight = freight
                .or(previous.map(|p| p.freight))
                .unwrap_or(Money::ZERO);

            let expected_return = match previous {
                Some(p) if !start_changed && p.days == days => {
                    p.expected_return
                }
                Some(_) | None => {
                    expected_return_date(updated.start_date, days)?
                }
            };
            let (value, discount) = match previous {
                Some(p) if !lines_changed && p.days == days => {
                    (p.value - p.freight + freight, p.discount)
                }
                Some(_) | None => (
                    pricing::fixed_term_value(
                        &updated.lines,
                        days.get(),
                        freight,
                        rates,
                    )?,
                    pricing::discount(&updated.lines, days.get(), rates)?,
                ),
            };

            Term::Fixed(Fixed {
                days,
                expected_return,
                value,
                freight,
                discount,
                returned_at,
            })
        };

        Ok(updated)
    }

    /// Marks this [`Rental`] as paid on the provided [`PaymentDate`] with the
    /// provided [`PaymentMethod`].
    ///
    /// Nothing else changes, so a paid [`Rental`] still needs to be
    /// finalized separately.
    pub fn mark_paid(&mut self, date: PaymentDate, method: PaymentMethod) {
        self.payment = Payment {
            status: PaymentStatus::Paid,
            method: Some(method),
            date: Some(date),
        };
    }
}

/// Returns the [`ExpectedReturnDate`] of a fixed-term [`Rental`] starting on
/// the provided [`StartDate`] and lasting the provided [`Days`].
///
/// The start day is the first day of the term.
///
/// # Errors
///
/// [`Error::InvalidRentalDays`] if the term ends out of the supported date
/// range.
fn expected_return_date(
    start: StartDate,
    days: Days,
) -> Result<ExpectedReturnDate, Error> {
    start
        .add_days(i64::from(days.get()) - 1)
        .map(StartDate::coerce)
        .ok_or_else(|| {
            Error::InvalidRentalDays(
                i32::try_from(days.get()).unwrap_or(i32::MAX),
            )
        })
}

/// Validates the requested number of calendar days of a fixed-term
/// [`Rental`].
fn rental_days_from(days: i32) -> Result<Days, Error> {
    u32::try_from(days)
        .ok()
        .and_then(Days::new)
        .ok_or(Error::InvalidRentalDays(days))
}
