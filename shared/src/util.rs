use chrono::{Datelike, NaiveDate};

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current UTC calendar date
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Current UTC calendar year
pub fn current_year() -> i32 {
    today().year()
}

/// Whole years between `birth` and `on`, counting a year only once the
/// birthday has been reached.
pub fn age_on(birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn age_before_and_after_birthday() {
        assert_eq!(age_on(d(2000, 6, 15), d(2018, 6, 14)), 17);
        assert_eq!(age_on(d(2000, 6, 15), d(2018, 6, 15)), 18);
        assert_eq!(age_on(d(2000, 6, 15), d(2018, 12, 1)), 18);
    }

    #[test]
    fn age_leap_day_birth() {
        assert_eq!(age_on(d(2004, 2, 29), d(2022, 2, 28)), 17);
        assert_eq!(age_on(d(2004, 2, 29), d(2022, 3, 1)), 18);
    }

    #[test]
    fn now_is_recent() {
        assert!(now_millis() > 1_700_000_000_000);
    }
}
