//! Human-facing identifiers: reference, membership and receipt numbers

use rand::Rng;
use rand::distributions::Alphanumeric;

const REFERENCE_PREFIX: &str = "BMR-";
const REFERENCE_SUFFIX_LEN: usize = 8;

/// Prefix used when a membership has no type code
const DEFAULT_TYPE_CODE: &str = "OR";

/// `BMR-` followed by 8 random upper-case letters or digits
pub fn generate_reference_no<R: Rng>(rng: &mut R) -> String {
    let suffix: String = rng
        .sample_iter(&Alphanumeric)
        .map(|b| (b as char).to_ascii_uppercase())
        .take(REFERENCE_SUFFIX_LEN)
        .collect();
    format!("{REFERENCE_PREFIX}{suffix}")
}

pub fn is_reference_no(value: &str) -> bool {
    value.strip_prefix(REFERENCE_PREFIX).is_some_and(|suffix| {
        suffix.len() == REFERENCE_SUFFIX_LEN
            && suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    })
}

/// `{type code, upper-cased, first 2 chars}{year}`
pub fn membership_number_prefix(type_code: Option<&str>, year: i32) -> String {
    let code: String = type_code
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_TYPE_CODE)
        .to_uppercase()
        .chars()
        .take(2)
        .collect();
    format!("{code}{year}")
}

pub fn format_membership_number(prefix: &str, sequence: i64) -> String {
    format!("{prefix}{sequence:04}")
}

/// Numbers to try in order, starting after the `issued` ones already taken
pub fn membership_number_candidates(
    prefix: &str,
    issued: i64,
    attempts: i64,
) -> impl Iterator<Item = String> + '_ {
    (1..=attempts).map(move |n| format_membership_number(prefix, issued.saturating_add(n)))
}

/// `BMR-{yy}-`
pub fn receipt_prefix(year: i32) -> String {
    format!("BMR-{:02}-", year.rem_euclid(100))
}

pub fn format_receipt_no(prefix: &str, sequence: i64) -> String {
    format!("{prefix}{sequence:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_skip_issued_numbers_and_never_repeat() {
        let tried: Vec<String> = membership_number_candidates("OR2025", 41, 3).collect();
        assert_eq!(tried, vec!["OR20250042", "OR20250043", "OR20250044"]);
        assert_eq!(membership_number_candidates("OR2025", 0, 0).count(), 0);
    }

    #[test]
    fn reference_numbers_match_pattern() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let reference = generate_reference_no(&mut rng);
            assert!(is_reference_no(&reference), "{reference}");
            assert_eq!(reference.len(), 12);
        }
    }

    #[test]
    fn reference_pattern_rejects_malformed() {
        assert!(is_reference_no("BMR-AB12CD34"));
        assert!(!is_reference_no("BMR-ab12cd34"));
        assert!(!is_reference_no("BMR-AB12CD3"));
        assert!(!is_reference_no("XYZ-AB12CD34"));
        assert!(!is_reference_no("BMR-AB12-D34"));
    }

    #[test]
    fn membership_number_format() {
        let prefix = membership_number_prefix(Some("or"), 2025);
        assert_eq!(prefix, "OR2025");
        assert_eq!(format_membership_number(&prefix, 1), "OR20250001");
        assert_eq!(format_membership_number(&prefix, 123), "OR20250123");
        assert_eq!(membership_number_prefix(Some("life"), 2025), "LI2025");
        assert_eq!(membership_number_prefix(None, 2026), "OR2026");
        assert_eq!(membership_number_prefix(Some("  "), 2026), "OR2026");
    }

    #[test]
    fn receipt_number_format() {
        assert_eq!(receipt_prefix(2025), "BMR-25-");
        assert_eq!(receipt_prefix(2007), "BMR-07-");
        assert_eq!(format_receipt_no("BMR-25-", 7), "BMR-25-007");
        assert_eq!(format_receipt_no("BMR-25-", 1234), "BMR-25-1234");
    }
}
