//! Rates and values of [`Rental`]s.
//!
//! [`Rental`]: super::Rental

use std::{collections::HashMap, hash::BuildHasher};

use common::Money;

use crate::domain::{equipment, Equipment};

use super::{Error, Line};

/// Source of standard daily rental rates of [`Equipment`].
pub trait StandardRates {
    /// Returns the standard daily rental rate of the [`Equipment`] with the
    /// provided ID, if it's known.
    fn standard_rate(&self, id: equipment::Id) -> Option<Money>;
}

impl<S: BuildHasher> StandardRates for HashMap<equipment::Id, Money, S> {
    fn standard_rate(&self, id: equipment::Id) -> Option<Money> {
        self.get(&id).copied()
    }
}

impl<S: BuildHasher> StandardRates for HashMap<equipment::Id, Equipment, S> {
    fn standard_rate(&self, id: equipment::Id) -> Option<Money> {
        self.get(&id).map(|e| e.daily_rental_rate)
    }
}

/// Returns the standard daily rate of the provided [`Line`]'s [`Equipment`].
///
/// # Errors
///
/// With [`Error::EquipmentNotExists`] if the rate is unknown.
pub fn standard_rate(
    line: &Line,
    rates: &impl StandardRates,
) -> Result<Money, Error> {
    rates
        .standard_rate(line.equipment_id)
        .ok_or(Error::EquipmentNotExists(line.equipment_id))
}

/// Returns the daily rate actually charged for a single unit of the provided
/// [`Line`]'s [`Equipment`].
///
/// A custom daily rate wins over the standard one, even when it's zero.
///
/// # Errors
///
/// With [`Error::EquipmentNotExists`] if no custom rate is set and the
/// standard one is unknown.
pub fn effective_rate(
    line: &Line,
    rates: &impl StandardRates,
) -> Result<Money, Error> {
    match line.custom_daily_rate {
        Some(rate) => Ok(rate),
        None => standard_rate(line, rates),
    }
}

/// Sums effective daily rates of all the provided [`Line`]s weighted by
/// their quantities.
///
/// # Errors
///
/// See [`effective_rate()`].
pub fn daily_rate_sum(
    lines: &[Line],
    rates: &impl StandardRates,
) -> Result<Money, Error> {
    lines.iter().try_fold(Money::ZERO, |sum, line| {
        Ok(sum + effective_rate(line, rates)? * line.quantity.get())
    })
}

/// Computes the total value of a fixed-term rental of the provided [`Line`]s
/// lasting `days` days, including `freight`.
///
/// # Errors
///
/// See [`effective_rate()`].
pub fn fixed_term_value(
    lines: &[Line],
    days: u32,
    freight: Money,
    rates: &impl StandardRates,
) -> Result<Money, Error> {
    Ok(daily_rate_sum(lines, rates)? * days + freight)
}

/// Computes the discount granted by custom daily rates of the provided
/// [`Line`]s over a rental lasting `days` days.
///
/// The discount is the difference between the standard and the effective
/// subtotals, so custom rates above the standard ones offset the lower ones
/// and never produce a negative discount.
///
/// # Errors
///
/// See [`standard_rate()`].
pub fn discount(
    lines: &[Line],
    days: u32,
    rates: &impl StandardRates,
) -> Result<Money, Error> {
    let (standard, effective) = lines.iter().try_fold(
        (Money::ZERO, Money::ZERO),
        |(standard, effective), line| {
            let quantity = line.quantity.get();
            Ok::<_, Error>((
                standard + standard_rate(line, rates)? * quantity,
                effective + effective_rate(line, rates)? * quantity,
            ))
        },
    )?;
    Ok(((standard - effective) * days).non_negative())
}

#[cfg(test)]
mod spec {
    use std::collections::HashMap;

    use common::Money;

    use crate::domain::{
        equipment,
        rental::{Error, Line, Quantity},
    };

    use super::{daily_rate_sum, discount, effective_rate, fixed_term_value};

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn line(id: equipment::Id, quantity: u32, custom: Option<&str>) -> Line {
        Line {
            equipment_id: id,
            name: equipment::Name::new("Concrete mixer").unwrap(),
            quantity: Quantity::new(quantity).unwrap(),
            custom_daily_rate: custom.map(money),
        }
    }

    fn catalog(
        items: &[(equipment::Id, &str)],
    ) -> HashMap<equipment::Id, Money> {
        items.iter().map(|(id, rate)| (*id, money(rate))).collect()
    }

    #[test]
    fn prefers_custom_rate() {
        let id = equipment::Id::new();
        let rates = catalog(&[(id, "50")]);

        assert_eq!(effective_rate(&line(id, 1, None), &rates), Ok(money("50")));
        assert_eq!(
            effective_rate(&line(id, 1, Some("40")), &rates),
            Ok(money("40")),
        );
        assert_eq!(
            effective_rate(&line(id, 1, Some("0")), &rates),
            Ok(Money::ZERO),
        );
    }

    #[test]
    fn custom_rate_needs_no_catalog() {
        let id = equipment::Id::new();
        let rates = catalog(&[]);

        assert_eq!(
            effective_rate(&line(id, 1, Some("40")), &rates),
            Ok(money("40")),
        );
        assert_eq!(
            effective_rate(&line(id, 1, None), &rates),
            Err(Error::EquipmentNotExists(id)),
        );
    }

    #[test]
    fn sums_daily_rates() {
        let (mixer, drill) = (equipment::Id::new(), equipment::Id::new());
        let rates = catalog(&[(mixer, "50"), (drill, "100")]);
        let lines = [line(mixer, 2, Some("40")), line(drill, 1, None)];

        assert_eq!(daily_rate_sum(&lines, &rates), Ok(money("180")));
        assert_eq!(daily_rate_sum(&[], &rates), Ok(Money::ZERO));
    }

    #[test]
    fn computes_fixed_term_value() {
        let (mixer, drill) = (equipment::Id::new(), equipment::Id::new());
        let rates = catalog(&[(mixer, "50"), (drill, "100")]);
        let lines = [line(mixer, 2, Some("40")), line(drill, 1, None)];

        assert_eq!(
            fixed_term_value(&lines, 5, money("30"), &rates),
            Ok(money("930")),
        );
        assert_eq!(
            fixed_term_value(&lines, 0, money("30"), &rates),
            Ok(money("30")),
        );
    }

    #[test]
    fn computes_discount() {
        let (mixer, drill) = (equipment::Id::new(), equipment::Id::new());
        let rates = catalog(&[(mixer, "50"), (drill, "100")]);
        let lines = [line(mixer, 2, Some("40")), line(drill, 1, None)];

        assert_eq!(discount(&lines, 5, &rates), Ok(money("100")));
    }

    #[test]
    fn never_discounts_negatively() {
        let mixer = equipment::Id::new();
        let rates = catalog(&[(mixer, "50")]);

        assert_eq!(
            discount(&[line(mixer, 3, Some("70"))], 10, &rates),
            Ok(Money::ZERO),
        );
    }

    #[test]
    fn offsets_discount_by_surcharges() {
        let (mixer, drill) = (equipment::Id::new(), equipment::Id::new());
        let rates = catalog(&[(mixer, "50"), (drill, "100")]);

        let lines = [line(mixer, 1, Some("70")), line(drill, 1, Some("80"))];
        assert_eq!(discount(&lines, 3, &rates), Ok(Money::ZERO));

        let lines = [line(mixer, 1, Some("60")), line(drill, 1, Some("80"))];
        assert_eq!(discount(&lines, 3, &rates), Ok(money("30")));
    }

    #[test]
    fn reads_rates_from_equipment() {
        let id = equipment::Id::new();
        let rates = HashMap::from([(
            id,
            crate::domain::Equipment {
                id,
                name: equipment::Name::new("Scaffold").unwrap(),
                daily_rental_rate: money("12.5"),
                quantity: 8,
            },
        )]);

        assert_eq!(
            daily_rate_sum(&[line(id, 4, None)], &rates),
            Ok(money("50")),
        );
    }
}
