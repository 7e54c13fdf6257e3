//! Closing open-ended [`Rental`]s.

use common::{Date, Money};

use super::{
    calendar, Days, Error, Fixed, OpenEnded, PaymentStatus, Rental, Term,
};

impl Rental {
    /// Closes this open-ended [`Rental`] on the provided `today` date,
    /// turning it into a fixed-term one billed for every billable day from
    /// its start up to `today` inclusively.
    ///
    /// The equipment is not considered returned yet, and the [`Rental`]
    /// payment becomes pending.
    ///
    /// # Errors
    ///
    /// - [`Error::NotOpenEnded`] if this [`Rental`] is not open-ended.
    /// - [`Error::ClosedBeforeStart`] if `today` precedes the start date.
    pub fn close(&mut self, today: Date) -> Result<(), Error> {
        let Term::OpenEnded(OpenEnded { daily_rate }) = self.term else {
            return Err(Error::NotOpenEnded(self.id));
        };
        if today < self.start_date.coerce() {
            return Err(Error::ClosedBeforeStart(self.id));
        }

        let billable_days =
            calendar::count_billable_days(self.start_date, today, self.weekend);

        self.term = Term::Fixed(Fixed {
            // A term spanning only non-billable weekend days still lasts a
            // day, while costing nothing.
            days: Days::new(billable_days).unwrap_or(Days::ONE),
            expected_return: today.coerce(),
            value: daily_rate * billable_days,
            freight: Money::ZERO,
            discount: Money::ZERO,
            returned_at: None,
        });
        self.payment.status = PaymentStatus::Pending;

        Ok(())
    }
}
