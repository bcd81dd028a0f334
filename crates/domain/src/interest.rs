use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

const DAYS_IN_YEAR: i64 = 365;

/// Whole days `as_of` is past the start of `due_date` (UTC).
///
/// Partial days are truncated by dividing elapsed hours by 24, so a
/// document becomes one day overdue exactly 24 hours after its due date.
pub fn days_overdue(due_date: NaiveDate, as_of: DateTime<Utc>) -> i64 {
    let due = match due_date.and_hms_opt(0, 0, 0) {
        Some(due) => DateTime::<Utc>::from_naive_utc_and_offset(due, Utc),
        None => return 0,
    };
    if as_of <= due {
        return 0;
    }
    (as_of - due).num_hours() / 24
}

/// Simple interest on `outstanding` for `days` at a yearly rate given in
/// percent, rounded to cents.
pub fn overdue_interest(outstanding: Decimal, yearly_rate_percent: Decimal, days: i64) -> Decimal {
    if days <= 0 || outstanding <= Decimal::ZERO || yearly_rate_percent <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let interest = outstanding * yearly_rate_percent / Decimal::ONE_HUNDRED * Decimal::from(days)
        / Decimal::from(DAYS_IN_YEAR);
    interest.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn not_overdue_before_due_date() {
        let as_of = Utc.with_ymd_and_hms(2024, 12, 30, 12, 0, 0).unwrap();
        assert_eq!(days_overdue(due(), as_of), 0);
    }

    #[test]
    fn truncates_partial_days() {
        let as_of = Utc.with_ymd_and_hms(2025, 1, 1, 23, 59, 59).unwrap();
        assert_eq!(days_overdue(due(), as_of), 0);
        let as_of = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(days_overdue(due(), as_of), 1);
        let as_of = Utc.with_ymd_and_hms(2025, 1, 8, 18, 0, 0).unwrap();
        assert_eq!(days_overdue(due(), as_of), 7);
    }

    #[test]
    fn computes_simple_interest() {
        // 1000 * 8% * 30 / 365 = 6.5753...
        assert_eq!(
            overdue_interest(Decimal::from(1000), Decimal::from(8), 30),
            Decimal::new(658, 2)
        );
        assert_eq!(
            overdue_interest(Decimal::from(1000), Decimal::from(8), 0),
            Decimal::ZERO
        );
        assert_eq!(
            overdue_interest(Decimal::ZERO, Decimal::from(8), 30),
            Decimal::ZERO
        );
    }
}
