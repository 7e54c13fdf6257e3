//! [`Rental`] definitions.

pub mod calendar;
mod closure;
pub mod extension;
mod finalization;
mod lifecycle;
pub mod pricing;

use std::num::NonZeroU32;

#[cfg(doc)]
use common::Date;
use common::{define_kind, DateOf, Money};
use derive_more::{AsRef, Display, Error as StdError, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{customer, equipment};

#[cfg(doc)]
use self::extension::SourceFinalization;

pub use self::{
    calendar::WeekendBilling,
    extension::Extension,
    lifecycle::{Changes, Draft, DraftTerm, PriceBasis},
    pricing::StandardRates,
};

/// Equipment rental contract.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rental {
    /// ID of this [`Rental`].
    pub id: Id,

    /// ID of the [`Customer`] renting the equipment.
    ///
    /// [`Customer`]: crate::domain::Customer
    pub customer_id: customer::Id,

    /// Name of the [`Customer`] at the moment this [`Rental`] was created or
    /// last updated.
    ///
    /// [`Customer`]: crate::domain::Customer
    pub customer_name: customer::Name,

    /// [`Date`] this [`Rental`] starts on.
    pub start_date: StartDate,

    /// [`Term`] of this [`Rental`].
    pub term: Term,

    /// [`WeekendBilling`] policy of this [`Rental`].
    pub weekend: WeekendBilling,

    /// [`Payment`] of this [`Rental`].
    pub payment: Payment,

    /// [`Notes`] of this [`Rental`].
    pub notes: Option<Notes>,

    /// [`DeliveryAddress`] of this [`Rental`].
    pub delivery_address: Option<DeliveryAddress>,

    /// Rented equipment [`Line`]s, in order.
    pub lines: Vec<Line>,
}

impl Rental {
    /// Returns the current [`State`] of this [`Rental`].
    #[must_use]
    pub fn state(&self) -> State {
        match self.term {
            Term::OpenEnded(_) => State::OpenEnded,
            Term::Fixed(Fixed {
                returned_at: None, ..
            }) => State::OpenFixed,
            Term::Fixed(Fixed {
                returned_at: Some(_),
                ..
            }) => {
                if self.is_paid() {
                    State::ReturnedPaid
                } else {
                    State::ReturnedUnpaid
                }
            }
        }
    }

    /// Indicates whether this [`Rental`] has no predetermined end.
    #[must_use]
    pub fn is_open_ended(&self) -> bool {
        matches!(self.term, Term::OpenEnded(_))
    }

    /// Indicates whether this [`Rental`] is paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment.status == PaymentStatus::Paid
    }

    /// Indicates whether this [`Rental`] should be considered
    /// [`PaymentStatus::Overdue`] on the provided `today` date.
    ///
    /// Only fixed-term [`Rental`]s having their equipment not returned and
    /// their payment still [`PaymentStatus::Pending`] after their expected
    /// return date become overdue.
    #[must_use]
    pub fn is_overdue<Of: ?Sized>(&self, today: DateOf<Of>) -> bool {
        match self.term {
            Term::Fixed(f) => {
                f.returned_at.is_none()
                    && self.payment.status == PaymentStatus::Pending
                    && f.expected_return < today.coerce()
            }
            Term::OpenEnded(_) => false,
        }
    }

    /// Returns the number of calendar days this [`Rental`] lasts.
    ///
    /// `0` for an open-ended [`Rental`].
    #[must_use]
    pub fn rental_days(&self) -> u32 {
        match self.term {
            Term::Fixed(f) => f.days.get(),
            Term::OpenEnded(_) => 0,
        }
    }

    /// Returns the [`Date`] this [`Rental`] is expected to end on.
    ///
    /// For an open-ended [`Rental`] it's a placeholder equal to its
    /// [`Rental::start_date`].
    #[must_use]
    pub fn expected_return_date(&self) -> ExpectedReturnDate {
        match self.term {
            Term::Fixed(f) => f.expected_return,
            Term::OpenEnded(_) => self.start_date.coerce(),
        }
    }

    /// Returns the [`Date`] the rented equipment was physically returned on,
    /// if any.
    #[must_use]
    pub fn actual_return_date(&self) -> Option<ActualReturnDate> {
        match self.term {
            Term::Fixed(f) => f.returned_at,
            Term::OpenEnded(_) => None,
        }
    }

    /// Returns the total price of a fixed-term [`Rental`], or the daily rate
    /// of an open-ended one.
    #[must_use]
    pub fn value(&self) -> Money {
        match self.term {
            Term::Fixed(f) => f.value,
            Term::OpenEnded(o) => o.daily_rate,
        }
    }

    /// Returns the freight charged for this [`Rental`].
    #[must_use]
    pub fn freight(&self) -> Money {
        match self.term {
            Term::Fixed(f) => f.freight,
            Term::OpenEnded(_) => Money::ZERO,
        }
    }

    /// Returns the discount granted for this [`Rental`].
    #[must_use]
    pub fn discount(&self) -> Money {
        match self.term {
            Term::Fixed(f) => f.discount,
            Term::OpenEnded(_) => Money::ZERO,
        }
    }
}

/// ID of a [`Rental`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Marker of a [`Rental`] start.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// [`Date`] a [`Rental`] starts on.
pub type StartDate = DateOf<(Rental, Start)>;

/// Marker of an expected [`Rental`] end.
#[derive(Clone, Copy, Debug)]
pub struct ExpectedReturn;

/// [`Date`] a [`Rental`] is expected to end on.
pub type ExpectedReturnDate = DateOf<(Rental, ExpectedReturn)>;

/// Marker of a physical return of the rented equipment.
#[derive(Clone, Copy, Debug)]
pub struct ActualReturn;

/// [`Date`] the rented equipment was physically returned on.
pub type ActualReturnDate = DateOf<(Rental, ActualReturn)>;

/// Selector of [`Rental`]s which became overdue.
///
/// See [`Rental::is_overdue()`].
#[derive(Clone, Copy, Debug)]
pub struct Overdue;

/// [`Date`] a [`Rental`] was paid on.
pub type PaymentDate = DateOf<(Rental, Payment)>;

/// Term of a [`Rental`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Term {
    /// [`Rental`] of a predetermined length and price.
    Fixed(Fixed),

    /// [`Rental`] without a predetermined end, billed daily until closed.
    OpenEnded(OpenEnded),
}

/// [`Term::Fixed`] details.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Fixed {
    /// Number of calendar days the [`Rental`] lasts.
    pub days: Days,

    /// [`Date`] the [`Rental`] is expected to end on.
    pub expected_return: ExpectedReturnDate,

    /// Total price of the [`Rental`], freight included.
    pub value: Money,

    /// Freight charged for the [`Rental`].
    pub freight: Money,

    /// Discount granted by custom daily rates.
    pub discount: Money,

    /// [`Date`] the rented equipment was physically returned on.
    ///
    /// Never cleared once set.
    pub returned_at: Option<ActualReturnDate>,
}

/// [`Term::OpenEnded`] details.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OpenEnded {
    /// Sum of daily rates of all the rented equipment.
    pub daily_rate: Money,
}

/// State of a [`Rental`] derived from its [`Term`] and [`Payment`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum State {
    /// Fixed-term [`Rental`] whose equipment is not returned yet.
    OpenFixed,

    /// Open-ended [`Rental`].
    OpenEnded,

    /// Returned but not yet paid [`Rental`].
    ReturnedUnpaid,

    /// Returned and paid [`Rental`]. Terminal.
    ReturnedPaid,
}

/// Positive number of days.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Days(NonZeroU32);

impl Days {
    /// Single day.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Creates new [`Days`] if the provided `days` number is positive.
    #[must_use]
    pub fn new(days: u32) -> Option<Self> {
        NonZeroU32::new(days).map(Self)
    }

    /// Returns the number of these [`Days`].
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

/// Positive quantity of rented equipment units.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// Creates a new [`Quantity`] if the provided `quantity` is positive.
    #[must_use]
    pub fn new(quantity: u32) -> Option<Self> {
        NonZeroU32::new(quantity).map(Self)
    }

    /// Returns the number of units in this [`Quantity`].
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

/// Rented equipment line of a [`Rental`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Line {
    /// ID of the rented [`Equipment`].
    ///
    /// [`Equipment`]: crate::domain::Equipment
    pub equipment_id: equipment::Id,

    /// Name of the rented [`Equipment`] at the moment of renting.
    ///
    /// [`Equipment`]: crate::domain::Equipment
    pub name: equipment::Name,

    /// Number of rented units.
    pub quantity: Quantity,

    /// Daily rate of a single unit agreed for this [`Rental`].
    ///
    /// [`None`] means the current standard rate of the [`Equipment`].
    ///
    /// [`Equipment`]: crate::domain::Equipment
    pub custom_daily_rate: Option<Money>,
}

/// Payment details of a [`Rental`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Payment {
    /// [`PaymentStatus`] of the [`Rental`].
    pub status: PaymentStatus,

    /// [`PaymentMethod`] the [`Rental`] is paid with.
    pub method: Option<PaymentMethod>,

    /// [`Date`] the [`Rental`] was paid on.
    pub date: Option<PaymentDate>,
}

impl Payment {
    /// Pending [`Payment`] without any details.
    pub const PENDING: Self = Self {
        status: PaymentStatus::Pending,
        method: None,
        date: None,
    };
}

define_kind! {
    #[doc = "Status of a [`Rental`] payment."]
    enum PaymentStatus {
        #[doc = "Payment is received."]
        Paid = 1,

        #[doc = "Payment is not received yet."]
        Pending = 2,

        #[doc = "Payment is not received after the expected return date."]
        Overdue = 3,
    }
}

define_kind! {
    #[doc = "Method of a [`Rental`] payment."]
    enum PaymentMethod {
        #[doc = "Cash."]
        Cash = 1,

        #[doc = "Instant bank transfer."]
        Pix = 2,

        #[doc = "Credit card."]
        CreditCard = 3,

        #[doc = "Debit card."]
        DebitCard = 4,

        #[doc = "Regular bank transfer."]
        BankTransfer = 5,

        #[doc = "Bank slip."]
        BankSlip = 6,
    }
}

/// Free-text notes of a [`Rental`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Notes(String);

impl Notes {
    /// Creates new [`Notes`] out of the provided `text`, trimmed.
    ///
    /// [`None`] is returned for a blank or too long `text`.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        (!text.is_empty() && text.len() <= 4096).then(|| Self(text.into()))
    }
}

/// Address the rented equipment is delivered to.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct DeliveryAddress(String);

impl DeliveryAddress {
    /// Creates a new [`DeliveryAddress`] out of the provided `address`,
    /// trimmed.
    ///
    /// [`None`] is returned for a blank or too long `address`.
    #[must_use]
    pub fn new(address: impl AsRef<str>) -> Option<Self> {
        let address = address.as_ref().trim();
        (!address.is_empty() && address.len() <= 1024)
            .then(|| Self(address.into()))
    }
}

/// Parses the provided `YYYY-MM-DD` `input` into a [`DateOf`].
///
/// # Errors
///
/// With [`Error::InvalidDate`] if the `input` is not a valid date.
pub fn parse_date<Of: ?Sized>(input: &str) -> Result<DateOf<Of>, Error> {
    DateOf::parse(input).map_err(|_| Error::InvalidDate(input.into()))
}

/// Parses the provided `YYYY-MM-DD` `input` into a [`DateOf`], treating a
/// blank `input` as an absent date.
///
/// # Errors
///
/// With [`Error::InvalidDate`] if a non-blank `input` is not a valid date.
pub fn parse_optional_date<Of: ?Sized>(
    input: &str,
) -> Result<Option<DateOf<Of>>, Error> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    parse_date(input).map(Some)
}

/// Error of a [`Rental`] lifecycle operation.
///
/// [`Error::AlreadyFinalized`] is benign: the [`Rental`] stays exactly as it
/// was (see [`SourceFinalization`]).
#[derive(Clone, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// [`Rental`] has its equipment returned already.
    #[display("`Rental(id: {_0})` is already finalized")]
    AlreadyFinalized(#[error(not(source))] Id),

    /// Open-ended [`Rental`] cannot be extended.
    #[display("`Rental(id: {_0})` is open-ended and must be closed first")]
    CannotExtendOpenEnded(#[error(not(source))] Id),

    /// [`Rental`] cannot be closed before it starts.
    #[display("`Rental(id: {_0})` cannot be closed before its start date")]
    ClosedBeforeStart(#[error(not(source))] Id),

    /// [`Equipment`] with the provided ID is rented twice in the same
    /// [`Rental`].
    ///
    /// [`Equipment`]: crate::domain::Equipment
    #[display("`Equipment(id: {_0})` is listed more than once")]
    DuplicateEquipment(#[error(not(source))] equipment::Id),

    /// [`Equipment`] with the provided ID has no known standard rate.
    ///
    /// [`Equipment`]: crate::domain::Equipment
    #[display("`Equipment(id: {_0})` does not exist")]
    EquipmentNotExists(#[error(not(source))] equipment::Id),

    /// Extension is requested to last less than a single billable day, or to
    /// end out of the supported date range.
    #[display(
        "extension must last at least 1 billable day within supported dates, \
         not {_0}"
    )]
    InvalidAdditionalDays(#[error(not(source))] i32),

    /// Provided string is not a valid `YYYY-MM-DD` [`Date`], or a date
    /// cannot be moved past it within the supported range.
    #[display("`{_0}` is not a valid `YYYY-MM-DD` date or is out of range")]
    InvalidDate(#[error(not(source))] String),

    /// Fixed-term [`Rental`] is requested to last less than a single day, or
    /// to end out of the supported date range.
    #[display(
        "fixed-term `Rental` must last at least 1 day within supported dates, \
         not {_0}"
    )]
    InvalidRentalDays(#[error(not(source))] i32),

    /// [`Rental`] is expected to be open-ended, but it isn't.
    #[display("`Rental(id: {_0})` is not open-ended")]
    NotOpenEnded(#[error(not(source))] Id),

    /// [`Rental`] is expected to be paid, but it isn't.
    #[display("`Rental(id: {_0})` is not paid")]
    PaymentNotConfirmed(#[error(not(source))] Id),

    /// [`Rental`] is open-ended, so it cannot have its equipment returned.
    #[display("`Rental(id: {_0})` is still open-ended")]
    StillOpenEnded(#[error(not(source))] Id),
}
