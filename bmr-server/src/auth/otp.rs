//! One-time code verification

use shared::error::{AppError, ErrorCode};

/// Check a submitted code against the stored one.
///
/// A code is expired once `now` is strictly past its expiry; the expiry
/// instant itself is still accepted.
pub fn check_otp(
    stored_code: Option<&str>,
    expires_at: Option<i64>,
    provided: &str,
    now: i64,
) -> Result<(), AppError> {
    let (Some(code), Some(expires_at)) = (stored_code, expires_at) else {
        return Err(AppError::with_message(ErrorCode::OtpNotRequested, "No OTP requested."));
    };
    if now > expires_at {
        return Err(AppError::with_message(ErrorCode::OtpExpired, "OTP expired."));
    }
    if code != provided.trim() {
        return Err(AppError::with_message(ErrorCode::OtpInvalid, "Invalid OTP."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPIRY: i64 = 1_000_000;

    #[test]
    fn matching_code_before_expiry() {
        assert!(check_otp(Some("0421"), Some(EXPIRY), "0421", EXPIRY - 1).is_ok());
        assert!(check_otp(Some("0421"), Some(EXPIRY), " 0421 ", EXPIRY - 1).is_ok());
    }

    #[test]
    fn expiry_instant_is_still_valid() {
        assert!(check_otp(Some("0421"), Some(EXPIRY), "0421", EXPIRY).is_ok());
    }

    #[test]
    fn expired_after_expiry() {
        let err = check_otp(Some("0421"), Some(EXPIRY), "0421", EXPIRY + 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::OtpExpired);
        assert_eq!(err.message, "OTP expired.");
    }

    #[test]
    fn expiry_checked_before_code() {
        let err = check_otp(Some("0421"), Some(EXPIRY), "9999", EXPIRY + 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::OtpExpired);
    }

    #[test]
    fn wrong_code_is_invalid() {
        let err = check_otp(Some("0421"), Some(EXPIRY), "0422", EXPIRY - 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::OtpInvalid);
    }

    #[test]
    fn nothing_requested() {
        let err = check_otp(None, None, "0421", 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::OtpNotRequested);
        assert!(check_otp(Some("0421"), None, "0421", 0).is_err());
    }
}
