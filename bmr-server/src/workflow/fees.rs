//! Membership fee calculation

use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::util::age_on;

/// Applicants at or below this age pay half
pub const YOUTH_MAX_AGE: i32 = 18;
/// Applicants at or above this age pay half
pub const SENIOR_MIN_AGE: i32 = 60;

/// Fee for an applicant, given the type's base amount and their birth date.
///
/// A missing membership type or profile yields zero, which callers treat as
/// "prerequisite data missing" rather than a free membership. The half price
/// is exact; rounding to cents happens where the amount is charged.
pub fn calculate_fee(
    base_amount: Option<Decimal>,
    date_of_birth: Option<NaiveDate>,
    today: NaiveDate,
) -> Decimal {
    let (Some(base), Some(dob)) = (base_amount, date_of_birth) else {
        return Decimal::ZERO;
    };
    let age = age_on(dob, today);
    if age <= YOUTH_MAX_AGE || age >= SENIOR_MIN_AGE {
        base / Decimal::TWO
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn fee_at_age(age: i32) -> Decimal {
        let today = d(2025, 6, 1);
        calculate_fee(Some(Decimal::new(3000, 2)), Some(d(2025 - age, 1, 1)), today)
    }

    #[test]
    fn half_price_for_youth_and_seniors() {
        assert_eq!(fee_at_age(17), Decimal::new(1500, 2));
        assert_eq!(fee_at_age(18), Decimal::new(1500, 2));
        assert_eq!(fee_at_age(19), Decimal::new(3000, 2));
        assert_eq!(fee_at_age(30), Decimal::new(3000, 2));
        assert_eq!(fee_at_age(59), Decimal::new(3000, 2));
        assert_eq!(fee_at_age(60), Decimal::new(1500, 2));
        assert_eq!(fee_at_age(65), Decimal::new(1500, 2));
    }

    #[test]
    fn birthday_not_yet_reached_counts_as_younger() {
        // Turns 19 on 2025-06-02, so still 18 on 2025-06-01
        let fee = calculate_fee(Some(Decimal::new(3000, 2)), Some(d(2006, 6, 2)), d(2025, 6, 1));
        assert_eq!(fee, Decimal::new(1500, 2));
        // Turns 60 tomorrow, so still 59
        let fee = calculate_fee(Some(Decimal::new(3000, 2)), Some(d(1965, 6, 2)), d(2025, 6, 1));
        assert_eq!(fee, Decimal::new(3000, 2));
    }

    #[test]
    fn missing_inputs_yield_zero() {
        let today = d(2025, 6, 1);
        assert_eq!(calculate_fee(None, Some(d(1990, 1, 1)), today), Decimal::ZERO);
        assert_eq!(calculate_fee(Some(Decimal::new(3000, 2)), None, today), Decimal::ZERO);
    }

    #[test]
    fn odd_cents_keep_the_exact_half() {
        let fee = calculate_fee(Some(Decimal::new(2555, 2)), Some(d(2015, 1, 1)), d(2025, 6, 1));
        assert_eq!(fee, Decimal::new(12775, 3));
    }
}
