//! [`Rental`]-related definitions.

use common::{Date, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar, Nullable,
};
use service::{command, domain};
use uuid::Uuid;

use crate::{api, api::scalar, define_error, AsError, Context, Error};

/// An equipment rental.
#[derive(Clone, Debug, From, Into)]
pub struct Rental(domain::Rental);

/// An equipment rental.
#[graphql_object(context = Context)]
impl Rental {
    /// Unique identifier of this `Rental`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the customer renting the equipment.
    #[must_use]
    pub fn customer_id(&self) -> CustomerId {
        self.0.customer_id.into()
    }

    /// Name of the customer as of the moment of renting.
    #[must_use]
    pub fn customer_name(&self) -> CustomerName {
        self.0.customer_name.clone().into()
    }

    /// `Date` this `Rental` starts on.
    #[must_use]
    pub fn start_date(&self) -> Date {
        self.0.start_date.coerce()
    }

    /// Current `RentalState` of this `Rental`.
    #[must_use]
    pub fn state(&self) -> State {
        self.0.state().into()
    }

    /// Indicator whether this `Rental` has no predetermined end.
    #[must_use]
    pub fn is_open_ended(&self) -> bool {
        self.0.is_open_ended()
    }

    /// Number of days this `Rental` lasts.
    ///
    /// Always `0` for an open-ended `Rental`.
    pub fn rental_days(&self) -> Result<i32, Error> {
        i32::try_from(self.0.rental_days()).map_err(AsError::into_error)
    }

    /// `Date` the rented equipment is expected to be returned on.
    ///
    /// Equals to the `startDate` for an open-ended `Rental`.
    #[must_use]
    pub fn expected_return_date(&self) -> Date {
        self.0.expected_return_date().coerce()
    }

    /// `Date` the rented equipment was physically returned on, if any.
    #[must_use]
    pub fn actual_return_date(&self) -> Option<Date> {
        self.0.actual_return_date().map(|d| d.coerce())
    }

    /// Freight charged for this `Rental`.
    #[must_use]
    pub fn freight(&self) -> Money {
        self.0.freight()
    }

    /// Discount granted by custom daily rates.
    #[must_use]
    pub fn discount(&self) -> Money {
        self.0.discount()
    }

    /// Total price of this `Rental`, freight included.
    ///
    /// For an open-ended `Rental` this is its daily rate.
    #[must_use]
    pub fn value(&self) -> Money {
        self.0.value()
    }

    /// Indicator whether Saturdays are billable.
    #[must_use]
    pub fn charge_saturdays(&self) -> bool {
        self.0.weekend.saturdays
    }

    /// Indicator whether Sundays are billable.
    #[must_use]
    pub fn charge_sundays(&self) -> bool {
        self.0.weekend.sundays
    }

    /// `PaymentStatus` of this `Rental`.
    #[must_use]
    pub fn payment_status(&self) -> PaymentStatus {
        self.0.payment.status.into()
    }

    /// `PaymentMethod` this `Rental` is paid with, if known.
    #[must_use]
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.0.payment.method.map(Into::into)
    }

    /// `Date` this `Rental` was paid on, if any.
    #[must_use]
    pub fn payment_date(&self) -> Option<Date> {
        self.0.payment.date.map(|d| d.coerce())
    }

    /// Free-text notes of this `Rental`.
    #[must_use]
    pub fn notes(&self) -> Option<String> {
        self.0.notes.as_ref().map(ToString::to_string)
    }

    /// Address the rented equipment is delivered to.
    #[must_use]
    pub fn delivery_address(&self) -> Option<String> {
        self.0.delivery_address.as_ref().map(ToString::to_string)
    }

    /// Rented equipment of this `Rental`.
    #[must_use]
    pub fn lines(&self) -> Vec<Line> {
        self.0.lines.iter().cloned().map(Line).collect()
    }
}

/// Rented equipment line of a [`Rental`].
#[derive(Clone, Debug)]
pub struct Line(domain::rental::Line);

/// Rented equipment line of a `Rental`.
#[graphql_object(name = "RentalLine", context = Context)]
impl Line {
    /// Rented `Equipment`.
    #[must_use]
    pub fn equipment(&self) -> api::Equipment {
        #[expect(
            unsafe_code,
            reason = "`Rental` references existing `Equipment` only"
        )]
        unsafe {
            api::Equipment::new_unchecked(self.0.equipment_id)
        }
    }

    /// Name of the rented `Equipment` as of the moment of renting.
    #[must_use]
    pub fn equipment_name(&self) -> api::equipment::Name {
        self.0.name.clone().into()
    }

    /// Number of rented units.
    pub fn quantity(&self) -> Result<i32, Error> {
        i32::try_from(self.0.quantity.get()).map_err(AsError::into_error)
    }

    /// Agreed daily rate of a single unit, if it differs from the standard
    /// one.
    #[must_use]
    pub fn custom_daily_rate(&self) -> Option<Money> {
        self.0.custom_daily_rate
    }
}

/// Result of a `Rental` extension.
#[derive(Clone, Debug, From)]
pub struct ExtendResult(command::extend_rental::Output);

/// Result of a `Rental` extension.
#[graphql_object(name = "RentalExtendResult", context = Context)]
impl ExtendResult {
    /// Extended `Rental`, as stored after the extension.
    #[must_use]
    pub fn source(&self) -> Rental {
        self.0.source.clone().into()
    }

    /// New `Rental` continuing the extended one.
    #[must_use]
    pub fn rental(&self) -> Rental {
        self.0.rental.clone().into()
    }

    /// Outcome of finalizing the extended `Rental`.
    #[must_use]
    pub fn source_finalization(&self) -> SourceFinalization {
        (&self.0.source_finalization).into()
    }
}

/// Unique identifier of a `Rental`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::rental::Id)]
#[into(domain::rental::Id)]
#[graphql(name = "RentalId", transparent)]
pub struct Id(Uuid);

/// Unique identifier of a customer.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::customer::Id)]
#[into(domain::customer::Id)]
#[graphql(name = "CustomerId", transparent)]
pub struct CustomerId(Uuid);

/// Name of a customer.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CustomerName",
    with = scalar::Via::<domain::customer::Name>,
)]
pub struct CustomerName(domain::customer::Name);

/// State of a `Rental`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "RentalState")]
pub enum State {
    /// Fixed-term `Rental` whose equipment is not returned yet.
    OpenFixed,

    /// Open-ended `Rental`.
    OpenEnded,

    /// Returned but not yet paid `Rental`.
    ReturnedUnpaid,

    /// Returned and paid `Rental`.
    ReturnedPaid,
}

impl From<domain::rental::State> for State {
    fn from(state: domain::rental::State) -> Self {
        use domain::rental::State as S;
        match state {
            S::OpenFixed => Self::OpenFixed,
            S::OpenEnded => Self::OpenEnded,
            S::ReturnedUnpaid => Self::ReturnedUnpaid,
            S::ReturnedPaid => Self::ReturnedPaid,
        }
    }
}

/// Status of a `Rental` payment.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
pub enum PaymentStatus {
    /// Payment is received.
    Paid,

    /// Payment is not received yet.
    Pending,

    /// Payment is not received after the expected return date.
    Overdue,
}

impl From<domain::rental::PaymentStatus> for PaymentStatus {
    fn from(status: domain::rental::PaymentStatus) -> Self {
        use domain::rental::PaymentStatus as S;
        match status {
            S::Paid => Self::Paid,
            S::Pending => Self::Pending,
            S::Overdue => Self::Overdue,
        }
    }
}

impl From<PaymentStatus> for domain::rental::PaymentStatus {
    fn from(status: PaymentStatus) -> Self {
        match status {
            PaymentStatus::Paid => Self::Paid,
            PaymentStatus::Pending => Self::Pending,
            PaymentStatus::Overdue => Self::Overdue,
        }
    }
}

/// Method of a `Rental` payment.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
pub enum PaymentMethod {
    /// Cash.
    Cash,

    /// Instant bank transfer.
    Pix,

    /// Credit card.
    CreditCard,

    /// Debit card.
    DebitCard,

    /// Regular bank transfer.
    BankTransfer,

    /// Bank slip.
    BankSlip,
}

impl From<domain::rental::PaymentMethod> for PaymentMethod {
    fn from(method: domain::rental::PaymentMethod) -> Self {
        use domain::rental::PaymentMethod as M;
        match method {
            M::Cash => Self::Cash,
            M::Pix => Self::Pix,
            M::CreditCard => Self::CreditCard,
            M::DebitCard => Self::DebitCard,
            M::BankTransfer => Self::BankTransfer,
            M::BankSlip => Self::BankSlip,
        }
    }
}

impl From<PaymentMethod> for domain::rental::PaymentMethod {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Cash => Self::Cash,
            PaymentMethod::Pix => Self::Pix,
            PaymentMethod::CreditCard => Self::CreditCard,
            PaymentMethod::DebitCard => Self::DebitCard,
            PaymentMethod::BankTransfer => Self::BankTransfer,
            PaymentMethod::BankSlip => Self::BankSlip,
        }
    }
}

/// Outcome of finalizing an extended `Rental`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
pub enum SourceFinalization {
    /// Extended `Rental` was finalized.
    Finalized,

    /// Extended `Rental` was finalized already.
    AlreadyFinalized,

    /// Extended `Rental` is not paid, so it was left as is.
    NotPaid,

    /// Extended `Rental` failed to be finalized, and was left as is.
    Failed,
}

impl From<&domain::rental::extension::SourceFinalization>
    for SourceFinalization
{
    fn from(outcome: &domain::rental::extension::SourceFinalization) -> Self {
        use domain::rental::extension::SourceFinalization as F;
        match outcome {
            F::Finalized => Self::Finalized,
            F::AlreadyFinalized => Self::AlreadyFinalized,
            F::NotPaid => Self::NotPaid,
            F::Failed(_) => Self::Failed,
        }
    }
}

/// Requested rented equipment line of a `Rental`.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "RentalLineInput")]
pub struct LineInput {
    /// ID of the rented `Equipment`.
    pub equipment_id: api::equipment::Id,

    /// Number of rented units. Must be positive.
    pub quantity: i32,

    /// Agreed daily rate of a single unit, if it differs from the standard
    /// one.
    pub custom_daily_rate: Option<Money>,
}

impl TryFrom<LineInput> for command::create_rental::Line {
    type Error = Error;

    fn try_from(input: LineInput) -> Result<Self, Self::Error> {
        let LineInput {
            equipment_id,
            quantity,
            custom_daily_rate,
        } = input;
        Ok(Self {
            equipment_id: equipment_id.into(),
            quantity: u32::try_from(quantity)
                .ok()
                .and_then(domain::rental::Quantity::new)
                .ok_or_else(|| Error::from(LineError::InvalidQuantity))?,
            custom_daily_rate,
        })
    }
}

/// Converts the provided [`LineInput`]s into [`command::create_rental::Line`]s.
///
/// # Errors
///
/// With `INVALID_QUANTITY` if any of the quantities is not positive.
pub(crate) fn into_lines(
    lines: Vec<LineInput>,
) -> Result<Vec<command::create_rental::Line>, Error> {
    lines.into_iter().map(TryInto::try_into).collect()
}

/// Input of a new `Rental`.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "CreateRentalInput")]
pub struct CreateInput {
    /// ID of the customer renting the equipment.
    pub customer_id: CustomerId,

    /// `YYYY-MM-DD` date the `Rental` starts on.
    pub start_date: String,

    /// Indicator whether the `Rental` has no predetermined end.
    pub is_open_ended: bool,

    /// Number of calendar days a fixed-term `Rental` lasts.
    pub rental_days: Option<i32>,

    /// Freight charged for a fixed-term `Rental`.
    pub freight: Option<Money>,

    /// Indicator whether Saturdays are billable.
    pub charge_saturdays: bool,

    /// Indicator whether Sundays are billable.
    pub charge_sundays: bool,

    /// `PaymentMethod` the `Rental` is going to be paid with, if known.
    pub payment_method: Option<PaymentMethod>,

    /// Free-text notes.
    pub notes: Option<String>,

    /// Address the rented equipment is delivered to.
    pub delivery_address: Option<String>,

    /// Rented equipment.
    pub lines: Vec<LineInput>,
}

impl TryFrom<CreateInput> for command::CreateRental {
    type Error = Error;

    fn try_from(input: CreateInput) -> Result<Self, Self::Error> {
        let CreateInput {
            customer_id,
            start_date,
            is_open_ended,
            rental_days,
            freight,
            charge_saturdays,
            charge_sundays,
            payment_method,
            notes,
            delivery_address,
            lines,
        } = input;
        Ok(Self {
            customer_id: customer_id.into(),
            start_date,
            is_open_ended,
            rental_days: rental_days.unwrap_or_default(),
            freight: freight.unwrap_or_default(),
            weekend: domain::rental::WeekendBilling {
                saturdays: charge_saturdays,
                sundays: charge_sundays,
            },
            payment_method: payment_method.map(Into::into),
            notes,
            delivery_address,
            lines: into_lines(lines)?,
        })
    }
}

/// Changes of an existing `Rental`.
///
/// Omitted fields are left untouched. Blank texts remove the optional values
/// they stand for.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "UpdateRentalInput")]
pub struct UpdateInput {
    /// ID of the new customer renting the equipment.
    pub customer_id: Option<CustomerId>,

    /// New `YYYY-MM-DD` date the `Rental` starts on.
    pub start_date: Option<String>,

    /// Indicator whether the `Rental` becomes open-ended or fixed-term.
    pub is_open_ended: Option<bool>,

    /// New number of calendar days of a fixed-term `Rental`.
    pub rental_days: Option<i32>,

    /// New freight of a fixed-term `Rental`.
    pub freight: Option<Money>,

    /// Indicator whether Saturdays become billable.
    pub charge_saturdays: Option<bool>,

    /// Indicator whether Sundays become billable.
    pub charge_sundays: Option<bool>,

    /// New rented equipment.
    pub lines: Option<Vec<LineInput>>,

    /// New `PaymentStatus`.
    pub payment_status: Option<PaymentStatus>,

    /// New `PaymentMethod`, or its removal if `null`.
    pub payment_method: Nullable<PaymentMethod>,

    /// New `YYYY-MM-DD` payment date, or its removal if blank.
    pub payment_date: Option<String>,

    /// `YYYY-MM-DD` date the rented equipment was returned on.
    pub actual_return_date: Option<String>,

    /// New notes, or their removal if blank.
    pub notes: Option<String>,

    /// New delivery address, or its removal if blank.
    pub delivery_address: Option<String>,
}

impl UpdateInput {
    /// Converts this [`UpdateInput`] into a [`command::UpdateRental`] of the
    /// [`Rental`] with the provided ID.
    ///
    /// # Errors
    ///
    /// With `INVALID_QUANTITY` if any of the quantities is not positive.
    pub(crate) fn into_command(
        self,
        rental_id: Id,
    ) -> Result<command::UpdateRental, Error> {
        let Self {
            customer_id,
            start_date,
            is_open_ended,
            rental_days,
            freight,
            charge_saturdays,
            charge_sundays,
            lines,
            payment_status,
            payment_method,
            payment_date,
            actual_return_date,
            notes,
            delivery_address,
        } = self;

        Ok(command::UpdateRental {
            rental_id: rental_id.into(),
            customer_id: customer_id.map(Into::into),
            start_date,
            is_open_ended,
            rental_days,
            freight,
            charge_saturdays,
            charge_sundays,
            lines: lines.map(into_lines).transpose()?,
            payment_status: payment_status.map(Into::into),
            payment_method: payment_method
                .explicit()
                .map(|m| m.map(Into::into)),
            payment_date,
            actual_return_date,
            notes,
            delivery_address,
        })
    }
}

define_error! {
    enum LineError {
        #[code = "INVALID_QUANTITY"]
        #[status = BAD_REQUEST]
        #[message = "Rented quantity must be positive"]
        InvalidQuantity,
    }
}

define_error! {
    enum CustomerError {
        #[code = "CUSTOMER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "Customer with the specified ID does not exist"]
        NotExists,
    }
}

impl AsError for domain::rental::Error {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "ALREADY_FINALIZED"]
                #[status = CONFLICT]
                #[message = "`Rental` is finalized already"]
                AlreadyFinalized,

                #[code = "CANNOT_EXTEND_OPEN_ENDED"]
                #[status = CONFLICT]
                #[message = "Open-ended `Rental` must be closed before \
                             extending"]
                CannotExtendOpenEnded,

                #[code = "CLOSED_BEFORE_START"]
                #[status = CONFLICT]
                #[message = "`Rental` cannot be closed before its start date"]
                ClosedBeforeStart,

                #[code = "DUPLICATE_EQUIPMENT"]
                #[status = BAD_REQUEST]
                #[message = "`Equipment` is listed more than once"]
                DuplicateEquipment,

                #[code = "EQUIPMENT_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Equipment` with the specified ID does not \
                             exist"]
                EquipmentNotExists,

                #[code = "INVALID_ADDITIONAL_DAYS"]
                #[status = BAD_REQUEST]
                #[message = "Extension must last at least 1 billable day and \
                             end within supported dates"]
                InvalidAdditionalDays,

                #[code = "INVALID_DATE"]
                #[status = BAD_REQUEST]
                #[message = "Date must be in `YYYY-MM-DD` format and within \
                             supported dates"]
                InvalidDate,

                #[code = "INVALID_RENTAL_DAYS"]
                #[status = BAD_REQUEST]
                #[message = "Fixed-term `Rental` must last at least 1 day and \
                             end within supported dates"]
                InvalidRentalDays,

                #[code = "NOT_OPEN_ENDED"]
                #[status = CONFLICT]
                #[message = "`Rental` is not open-ended"]
                NotOpenEnded,

                #[code = "PAYMENT_NOT_CONFIRMED"]
                #[status = CONFLICT]
                #[message = "`Rental` must be paid first"]
                PaymentNotConfirmed,

                #[code = "STILL_OPEN_ENDED"]
                #[status = CONFLICT]
                #[message = "Open-ended `Rental` must be closed first"]
                StillOpenEnded,
            }
        }

        use domain::rental::Error as E;
        Some(
            match self {
                E::AlreadyFinalized(_) => Error::AlreadyFinalized,
                E::CannotExtendOpenEnded(_) => Error::CannotExtendOpenEnded,
                E::ClosedBeforeStart(_) => Error::ClosedBeforeStart,
                E::DuplicateEquipment(_) => Error::DuplicateEquipment,
                E::EquipmentNotExists(_) => Error::EquipmentNotExists,
                E::InvalidAdditionalDays(_) => Error::InvalidAdditionalDays,
                E::InvalidDate(_) => Error::InvalidDate,
                E::InvalidRentalDays(_) => Error::InvalidRentalDays,
                E::NotOpenEnded(_) => Error::NotOpenEnded,
                E::PaymentNotConfirmed(_) => Error::PaymentNotConfirmed,
                E::StillOpenEnded(_) => Error::StillOpenEnded,
            }
            .into(),
        )
    }
}
