//! Unified error codes for the BMR membership backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Account errors (registration, OTP, passwords)
//! - 4xxx: Membership workflow errors
//! - 5xxx: Payment errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so that web clients can
/// switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Rate limit exceeded
    TooManyRequests = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (identifier/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is locked pending OTP verification
    AccountLocked = 1006,
    /// Email address not verified
    EmailNotVerified = 1008,
    /// Google identity token rejected
    GoogleTokenInvalid = 1009,
    /// Operation only available to Google-linked accounts
    GoogleAccountRequired = 1010,
    /// Refresh token unknown, revoked or expired
    RefreshTokenInvalid = 1011,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Staff flag required
    StaffRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: Account ====================
    /// User not found
    UserNotFound = 3001,
    /// Username already taken
    UsernameTaken = 3002,
    /// Email already registered
    EmailTaken = 3003,
    /// No OTP has been requested for this account
    OtpNotRequested = 3004,
    /// OTP has expired
    OtpExpired = 3005,
    /// OTP does not match
    OtpInvalid = 3006,
    /// Password too short
    PasswordTooShort = 3007,
    /// Password confirmation does not match
    PasswordMismatch = 3008,
    /// Role not found
    RoleNotFound = 3009,

    // ==================== 4xxx: Membership ====================
    /// Membership not found
    MembershipNotFound = 4001,
    /// Membership can no longer be edited in its current status
    MembershipNotEditable = 4002,
    /// Page 1 (profile + contact) must be completed first
    PageOneIncomplete = 4003,
    /// Status transition not allowed
    InvalidTransition = 4004,
    /// A reason is required for this transition
    ReasonRequired = 4005,
    /// Workflow status code unknown
    StatusNotFound = 4006,
    /// NRIC/FIN format invalid
    InvalidNric = 4007,
    /// Membership type not found
    MembershipTypeNotFound = 4008,
    /// Fee cannot be derived (membership type or profile missing)
    FeeUnavailable = 4009,
    /// Education level not found
    EducationLevelNotFound = 4010,
    /// Institution not found
    InstitutionNotFound = 4011,

    // ==================== 5xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Gateway rejected or failed to create the payment
    PaymentCreateFailed = 5002,
    /// Gateway credentials/configuration missing
    PaymentGatewayMisconfigured = 5003,
    /// Webhook callback URL is not publicly reachable
    InvalidCallbackUrl = 5004,
    /// Webhook signature missing or invalid
    WebhookSignatureInvalid = 5005,
    /// Invalid payment method for this operation
    PaymentInvalidMethod = 5006,
    /// Payment cannot be confirmed in its current state
    PaymentNotConfirmable = 5007,
    /// Webhook payload carries no payment id
    PaymentMissingExternalId = 5008,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Outbound email could not be delivered
    EmailDeliveryFailed = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountLocked => {
                "Your account is locked. Please verify OTP to unlock your account"
            }
            ErrorCode::EmailNotVerified => "Please verify your email to access your account",
            ErrorCode::GoogleTokenInvalid => "Google identity token is invalid",
            ErrorCode::GoogleAccountRequired => {
                "Only Google users can set password with this endpoint"
            }
            ErrorCode::RefreshTokenInvalid => "Invalid refresh token",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::StaffRequired => "Staff access is required",
            ErrorCode::AdminRequired => "Administrator access is required",

            // Account
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::UsernameTaken => "Username is already taken",
            ErrorCode::EmailTaken => "Email is already registered",
            ErrorCode::OtpNotRequested => "No OTP requested",
            ErrorCode::OtpExpired => "OTP expired",
            ErrorCode::OtpInvalid => "Invalid OTP",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",
            ErrorCode::PasswordMismatch => "Passwords do not match",
            ErrorCode::RoleNotFound => "Role not found",

            // Membership
            ErrorCode::MembershipNotFound => "Membership not found",
            ErrorCode::MembershipNotEditable => "Cannot edit membership in its current status",
            ErrorCode::PageOneIncomplete => {
                "Please complete Page 1 (Profile & Contact Info) first"
            }
            ErrorCode::InvalidTransition => "Status transition is not allowed",
            ErrorCode::ReasonRequired => "A reason is required for this status change",
            ErrorCode::StatusNotFound => "Workflow status not found",
            ErrorCode::InvalidNric => {
                "NRIC/FIN must start with S, T, F, or G followed by 7 digits and an alphabet"
            }
            ErrorCode::MembershipTypeNotFound => "Membership type not found",
            ErrorCode::FeeUnavailable => {
                "Amount is required when membership has no membership type or profile"
            }
            ErrorCode::EducationLevelNotFound => "Education level not found",
            ErrorCode::InstitutionNotFound => "Institution not found",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::PaymentCreateFailed => "Payment creation failed",
            ErrorCode::PaymentGatewayMisconfigured => "Payment gateway is not configured",
            ErrorCode::InvalidCallbackUrl => "Invalid webhook URL configured for production",
            ErrorCode::WebhookSignatureInvalid => "Webhook signature verification failed",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::PaymentNotConfirmable => "Payment cannot be confirmed",
            ErrorCode::PaymentMissingExternalId => "Missing payment ID",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::EmailDeliveryFailed => "Failed to send email",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Returned when a numeric value does not correspond to any [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::TooManyRequests),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1006 => Ok(ErrorCode::AccountLocked),
            1008 => Ok(ErrorCode::EmailNotVerified),
            1009 => Ok(ErrorCode::GoogleTokenInvalid),
            1010 => Ok(ErrorCode::GoogleAccountRequired),
            1011 => Ok(ErrorCode::RefreshTokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::StaffRequired),
            2003 => Ok(ErrorCode::AdminRequired),

            // Account
            3001 => Ok(ErrorCode::UserNotFound),
            3002 => Ok(ErrorCode::UsernameTaken),
            3003 => Ok(ErrorCode::EmailTaken),
            3004 => Ok(ErrorCode::OtpNotRequested),
            3005 => Ok(ErrorCode::OtpExpired),
            3006 => Ok(ErrorCode::OtpInvalid),
            3007 => Ok(ErrorCode::PasswordTooShort),
            3008 => Ok(ErrorCode::PasswordMismatch),
            3009 => Ok(ErrorCode::RoleNotFound),

            // Membership
            4001 => Ok(ErrorCode::MembershipNotFound),
            4002 => Ok(ErrorCode::MembershipNotEditable),
            4003 => Ok(ErrorCode::PageOneIncomplete),
            4004 => Ok(ErrorCode::InvalidTransition),
            4005 => Ok(ErrorCode::ReasonRequired),
            4006 => Ok(ErrorCode::StatusNotFound),
            4007 => Ok(ErrorCode::InvalidNric),
            4008 => Ok(ErrorCode::MembershipTypeNotFound),
            4009 => Ok(ErrorCode::FeeUnavailable),
            4010 => Ok(ErrorCode::EducationLevelNotFound),
            4011 => Ok(ErrorCode::InstitutionNotFound),

            // Payment
            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::PaymentCreateFailed),
            5003 => Ok(ErrorCode::PaymentGatewayMisconfigured),
            5004 => Ok(ErrorCode::InvalidCallbackUrl),
            5005 => Ok(ErrorCode::WebhookSignatureInvalid),
            5006 => Ok(ErrorCode::PaymentInvalidMethod),
            5007 => Ok(ErrorCode::PaymentNotConfirmable),
            5008 => Ok(ErrorCode::PaymentMissingExternalId),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::EmailDeliveryFailed),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
