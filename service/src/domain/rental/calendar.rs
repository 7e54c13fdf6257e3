//! Billable days arithmetic.
//!
//! A calendar day is billable unless it's a Saturday or a Sunday which the
//! [`WeekendBilling`] policy excludes. Weekdays are always billable.

use std::iter;

use common::{date::Weekday, DateOf};

use super::Days;

/// Policy of billing weekend days.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct WeekendBilling {
    /// Whether Saturdays are billable.
    pub saturdays: bool,

    /// Whether Sundays are billable.
    pub sundays: bool,
}

impl WeekendBilling {
    /// Every calendar day is billable.
    pub const ALL_DAYS: Self = Self {
        saturdays: true,
        sundays: true,
    };

    /// Only weekdays are billable.
    pub const WEEKDAYS_ONLY: Self = Self {
        saturdays: false,
        sundays: false,
    };

    /// Checks whether the provided [`Weekday`] is billable under this
    /// [`WeekendBilling`] policy.
    #[must_use]
    pub fn is_billable(self, weekday: Weekday) -> bool {
        match weekday {
            Weekday::Saturday => self.saturdays,
            Weekday::Sunday => self.sundays,
            Weekday::Monday
            | Weekday::Tuesday
            | Weekday::Wednesday
            | Weekday::Thursday
            | Weekday::Friday => true,
        }
    }
}

/// Counts billable days in the inclusive `[start, end]` span.
///
/// Returns `0` if `end` precedes `start`.
#[must_use]
pub fn count_billable_days<A: ?Sized, B: ?Sized>(
    start: DateOf<A>,
    end: DateOf<B>,
    weekend: WeekendBilling,
) -> u32 {
    let end = end.coerce::<A>();
    let count = iter::successors(Some(start), |d| d.next_day())
        .take_while(|d| *d <= end)
        .filter(|d| weekend.is_billable(d.weekday()))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Checks whether the provided date is a weekend day excluded from billing.
#[must_use]
pub fn is_non_billable_weekend_day<Of: ?Sized>(
    date: DateOf<Of>,
    weekend: WeekendBilling,
) -> bool {
    !weekend.is_billable(date.weekday())
}

/// Returns the first billable date strictly after the provided one.
///
/// [`None`] is returned if there is no such date in the supported range.
#[must_use]
pub fn advance_to_next_billable_day<Of: ?Sized>(
    date: DateOf<Of>,
    weekend: WeekendBilling,
) -> Option<DateOf<Of>> {
    let mut date = date.next_day()?;
    while is_non_billable_weekend_day(date, weekend) {
        date = date.next_day()?;
    }
    Some(date)
}

/// Returns the date on which a span of `billable_days` billable days
/// starting at `start` ends.
///
/// `start` is counted as the first billable day unconditionally, so it's
/// expected to be billable already (see [`advance_to_next_billable_day()`]).
///
/// [`None`] is returned if the span ends out of the supported range.
#[must_use]
pub fn end_of_billable_span<Of: ?Sized>(
    start: DateOf<Of>,
    billable_days: Days,
    weekend: WeekendBilling,
) -> Option<DateOf<Of>> {
    // Every whole week contains the same number of billable days, and lands
    // on a weekday as billable as the `start` one.
    let per_week =
        5 + u32::from(weekend.saturdays) + u32::from(weekend.sundays);
    let weeks = (billable_days.get() - 1) / per_week;

    let mut end = start.add_days(i64::from(weeks) * 7)?;
    let mut counted = weeks * per_week + 1;
    while counted < billable_days.get() {
        end = end.next_day()?;
        if !is_non_billable_weekend_day(end, weekend) {
            counted += 1;
        }
    }
    Some(end)
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::domain::rental::Days;

    use super::{
        advance_to_next_billable_day, count_billable_days,
        end_of_billable_span, is_non_billable_weekend_day, WeekendBilling,
    };

    fn date(s: &str) -> Date {
        Date::parse(s).unwrap()
    }

    fn days(n: u32) -> Days {
        Days::new(n).unwrap()
    }

    const SATURDAYS_ONLY: WeekendBilling = WeekendBilling {
        saturdays: true,
        sundays: false,
    };

    #[test]
    fn counts_billable_days() {
        // Monday to Sunday.
        let (mon, sun) = (date("2024-01-01"), date("2024-01-07"));

        assert_eq!(count_billable_days(mon, sun, WeekendBilling::ALL_DAYS), 7);
        assert_eq!(
            count_billable_days(mon, sun, WeekendBilling::WEEKDAYS_ONLY),
            5,
        );
        assert_eq!(count_billable_days(mon, sun, SATURDAYS_ONLY), 6);
    }

    #[test]
    fn counts_single_day_span() {
        let sat = date("2024-01-06");

        assert_eq!(count_billable_days(sat, sat, WeekendBilling::ALL_DAYS), 1);
        assert_eq!(
            count_billable_days(sat, sat, WeekendBilling::WEEKDAYS_ONLY),
            0,
        );
    }

    #[test]
    fn counts_nothing_for_reversed_span() {
        assert_eq!(
            count_billable_days(
                date("2024-01-10"),
                date("2024-01-09"),
                WeekendBilling::ALL_DAYS,
            ),
            0,
        );
    }

    #[test]
    fn counts_across_months() {
        // 2024-01-29 (Mon) ... 2024-02-11 (Sun) is two full weeks.
        assert_eq!(
            count_billable_days(
                date("2024-01-29"),
                date("2024-02-11"),
                WeekendBilling::WEEKDAYS_ONLY,
            ),
            10,
        );
    }

    #[test]
    fn detects_non_billable_weekend_days() {
        let (fri, sat, sun) =
            (date("2024-01-05"), date("2024-01-06"), date("2024-01-07"));

        let weekdays = WeekendBilling::WEEKDAYS_ONLY;

        assert!(!is_non_billable_weekend_day(fri, weekdays));
        assert!(is_non_billable_weekend_day(sat, weekdays));
        assert!(is_non_billable_weekend_day(sun, weekdays));

        assert!(!is_non_billable_weekend_day(sat, SATURDAYS_ONLY));
        assert!(is_non_billable_weekend_day(sun, SATURDAYS_ONLY));

        assert!(!is_non_billable_weekend_day(sun, WeekendBilling::ALL_DAYS));
    }

    #[test]
    fn advances_to_next_billable_day() {
        let (thu, fri, sat, sun, mon) = (
            date("2024-01-04"),
            date("2024-01-05"),
            date("2024-01-06"),
            date("2024-01-07"),
            date("2024-01-08"),
        );
        let weekdays = WeekendBilling::WEEKDAYS_ONLY;

        assert_eq!(advance_to_next_billable_day(thu, weekdays), Some(fri));
        assert_eq!(advance_to_next_billable_day(fri, weekdays), Some(mon));
        assert_eq!(advance_to_next_billable_day(sat, weekdays), Some(mon));
        assert_eq!(advance_to_next_billable_day(sun, weekdays), Some(mon));

        assert_eq!(
            advance_to_next_billable_day(fri, SATURDAYS_ONLY),
            Some(sat),
        );
        assert_eq!(
            advance_to_next_billable_day(sat, SATURDAYS_ONLY),
            Some(mon),
        );

        assert_eq!(
            advance_to_next_billable_day(fri, WeekendBilling::ALL_DAYS),
            Some(sat),
        );
    }

    #[test]
    fn finds_end_of_billable_span() {
        let mon = date("2024-01-08");

        assert_eq!(
            end_of_billable_span(mon, days(1), WeekendBilling::WEEKDAYS_ONLY),
            Some(mon),
        );
        assert_eq!(
            end_of_billable_span(mon, days(5), WeekendBilling::WEEKDAYS_ONLY),
            Some(date("2024-01-12")),
        );
        assert_eq!(
            end_of_billable_span(mon, days(6), WeekendBilling::WEEKDAYS_ONLY),
            Some(date("2024-01-15")),
        );
        assert_eq!(
            end_of_billable_span(mon, days(6), WeekendBilling::ALL_DAYS),
            Some(date("2024-01-13")),
        );
        assert_eq!(
            end_of_billable_span(mon, days(7), SATURDAYS_ONLY),
            Some(date("2024-01-15")),
        );
    }

    #[test]
    fn billable_span_covers_exactly_requested_days() {
        let start = date("2024-01-05");
        for policy in [
            WeekendBilling::ALL_DAYS,
            WeekendBilling::WEEKDAYS_ONLY,
            SATURDAYS_ONLY,
        ] {
            let start = advance_to_next_billable_day(start, policy).unwrap();
            for n in (1..=30).chain([364, 365, 1000]) {
                let end =
                    end_of_billable_span(start, days(n), policy).unwrap();

                assert_eq!(count_billable_days(start, end, policy), n);
                assert!(!is_non_billable_weekend_day(end, policy));
            }
        }
    }

    #[test]
    fn stops_at_end_of_supported_range() {
        let last = date("9999-12-31");

        assert_eq!(
            advance_to_next_billable_day(last, WeekendBilling::ALL_DAYS),
            None,
        );
        assert_eq!(
            end_of_billable_span(
                date("2024-01-08"),
                days(u32::MAX),
                WeekendBilling::WEEKDAYS_ONLY,
            ),
            None,
        );
        assert_eq!(
            end_of_billable_span(last, days(2), WeekendBilling::ALL_DAYS),
            None,
        );
    }
}
