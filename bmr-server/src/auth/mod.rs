//! Authentication, authorization and rate limiting for the user API

pub mod google;
pub mod otp;
pub mod permissions;
pub mod rate_limit;
pub mod user_auth;

pub use google::GoogleVerifier;
pub use rate_limit::RateLimiter;
pub use user_auth::CurrentUser;
