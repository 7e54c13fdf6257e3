//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute, representing a
/// domain newtype (like a customer or equipment name) as a GraphQL string.
///
/// The string is produced by the [`Display`] impl of the `As` type, and is
/// validated by its [`FromStr`] impl, so an invalid name never reaches the
/// service layer.
///
/// Target type must implement [`TryFrom`] and [`AsRef`] for `As` type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Converts the target type into a string scalar [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Constructs the target type from a string scalar [`InputValue`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the input value is not a string;
    /// - the input value cannot be parsed into `As` type;
    /// - the parsed value cannot be converted into the target type.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let name = T::name(&()).unwrap_or("<unnamed>");
        let s = input.as_string_value().ok_or_else(|| {
            format!("`{name}` expects a string, found: {input}")
        })?;
        let parsed = s
            .parse::<As>()
            .map_err(|e| format!("`{name}` cannot be \"{s}\": {e}"))?;
        T::try_from(parsed).map_err(|e| format!("`{name}` is invalid: {e}"))
    }

    /// Parses the provided [`ScalarToken`] as a [`String`].
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a string.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue};
    use service::domain;

    use crate::api::rental::CustomerName;

    use super::Via;

    type CustomerNameVia = Via<domain::customer::Name>;

    #[test]
    fn parses_valid_name() {
        let name = CustomerNameVia::from_input::<
            CustomerName,
            DefaultScalarValue,
        >(&InputValue::scalar("ACME Construction"))
        .unwrap();

        assert_eq!(name.to_string(), "ACME Construction");
    }

    #[test]
    fn rejects_invalid_name() {
        let err = CustomerNameVia::from_input::<
            CustomerName,
            DefaultScalarValue,
        >(&InputValue::scalar(" ACME"))
        .unwrap_err();

        assert!(err.starts_with("`CustomerName` cannot be"), "{err}");
    }

    #[test]
    fn rejects_non_string_input() {
        let err = CustomerNameVia::from_input::<
            CustomerName,
            DefaultScalarValue,
        >(&InputValue::scalar(42))
        .unwrap_err();

        assert!(err.starts_with("`CustomerName` expects a string"), "{err}");
    }
}
