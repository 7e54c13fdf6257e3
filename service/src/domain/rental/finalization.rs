//! Recording physical return of [`Rental`]s.

use common::Date;

use super::{Error, Fixed, Rental, Term};

impl Rental {
    /// Records the rented equipment as physically returned on the provided
    /// `today` date.
    ///
    /// Nothing else changes.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyFinalized`] if the equipment is returned already, in
    ///   which case this [`Rental`] stays untouched and may be used as is.
    /// - [`Error::StillOpenEnded`] if this [`Rental`] is not closed yet.
    /// - [`Error::PaymentNotConfirmed`] if this [`Rental`] is not paid yet.
    pub fn finalize(&mut self, today: Date) -> Result<(), Error> {
        let is_paid = self.is_paid();
        match &mut self.term {
            Term::Fixed(Fixed {
                returned_at: Some(_),
                ..
            }) => Err(Error::AlreadyFinalized(self.id)),
            Term::OpenEnded(_) => Err(Error::StillOpenEnded(self.id)),
            Term::Fixed(_) if !is_paid => {
                Err(Error::PaymentNotConfirmed(self.id))
            }
            Term::Fixed(fixed) => {
                fixed.returned_at = Some(today.coerce());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use common::{Date, Money};

    use crate::domain::{
        customer,
        rental::{
            Days, Error, Fixed, Id, OpenEnded, Payment, PaymentMethod, Rental,
            State, Term, WeekendBilling,
        },
    };

    fn date<Of: ?Sized>(s: &str) -> common::DateOf<Of> {
        common::DateOf::parse(s).unwrap()
    }

    fn fixed_term() -> Rental {
        Rental {
            id: Id::new(),
            customer_id: customer::Id::new(),
            customer_name: customer::Name::new("ACME Construction").unwrap(),
            start_date: date("2024-01-01"),
            term: Term::Fixed(Fixed {
                days: Days::new(5).unwrap(),
                expected_return: date("2024-01-05"),
                value: "930".parse().unwrap(),
                freight: "30".parse().unwrap(),
                discount: "100".parse().unwrap(),
                returned_at: None,
            }),
            weekend: WeekendBilling::ALL_DAYS,
            payment: Payment::PENDING,
            notes: None,
            delivery_address: None,
            lines: vec![],
        }
    }

    fn today() -> Date {
        date("2024-01-06")
    }

    #[test]
    fn finalizes_paid_rental() {
        let mut rental = fixed_term();
        rental.mark_paid(date("2024-01-02"), PaymentMethod::Pix);
        let before = rental.clone();

        rental.finalize(today()).unwrap();

        assert_eq!(rental.state(), State::ReturnedPaid);
        assert_eq!(rental.actual_return_date(), Some(date("2024-01-06")));
        assert_eq!(rental.value(), before.value());
        assert_eq!(rental.payment, before.payment);
        assert_eq!(rental.term, Term::Fixed(Fixed {
            returned_at: Some(date("2024-01-06")),
            ..match before.term {
                Term::Fixed(f) => f,
                Term::OpenEnded(_) => unreachable!(),
            }
        }));
    }

    #[test]
    fn is_idempotent() {
        let mut rental = fixed_term();
        rental.mark_paid(date("2024-01-02"), PaymentMethod::Pix);
        rental.finalize(today()).unwrap();
        let finalized = rental.clone();

        assert_eq!(
            rental.finalize(date("2024-01-09")),
            Err(Error::AlreadyFinalized(rental.id)),
        );
        assert_eq!(rental, finalized);
    }

    #[test]
    fn rejects_unpaid_rental() {
        let mut rental = fixed_term();
        let before = rental.clone();

        assert_eq!(
            rental.finalize(today()),
            Err(Error::PaymentNotConfirmed(rental.id)),
        );
        assert_eq!(rental, before);
    }

    #[test]
    fn rejects_open_ended_rental() {
        let mut rental = fixed_term();
        rental.term = Term::OpenEnded(OpenEnded {
            daily_rate: Money::from(100_u32),
        });
        rental.mark_paid(date("2024-01-02"), PaymentMethod::Cash);
        let before = rental.clone();

        assert_eq!(
            rental.finalize(today()),
            Err(Error::StillOpenEnded(rental.id)),
        );
        assert_eq!(rental, before);
    }
}
