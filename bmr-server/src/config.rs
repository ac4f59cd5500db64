//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// BMR server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for access tokens
    pub jwt_secret: String,
    /// Base64 AES-256 key for PII columns (env: FIELD_ENCRYPTION_KEY)
    pub field_encryption_key: String,
    /// SES sender email address
    pub ses_from_email: String,
    /// HitPay business API key
    pub hitpay_api_key: String,
    /// HitPay webhook salt; webhook HMAC is only checked when set
    pub hitpay_salt: Option<String>,
    /// HitPay create-payment endpoint
    pub hitpay_create_payment_url: String,
    /// Public callback URL handed to HitPay
    pub hitpay_webhook_url: String,
    /// Outbound gateway request timeout
    pub hitpay_timeout_secs: u64,
    /// OAuth client id expected as `aud` of Google ID tokens
    pub google_client_id: String,
    /// Currency used when a request does not name one
    pub default_currency: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            field_encryption_key: Self::require_secret("FIELD_ENCRYPTION_KEY", &environment)?,
            ses_from_email: std::env::var("SES_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@bmr.org.sg".into()),
            hitpay_api_key: Self::require_secret("HITPAY_API_KEY", &environment)?,
            hitpay_salt: std::env::var("HITPAY_SALT").ok().filter(|s| !s.is_empty()),
            hitpay_create_payment_url: std::env::var("HITPAY_CREATE_PAYMENT_URL")
                .unwrap_or_else(|_| "https://api.sandbox.hit-pay.com/v1/payment-requests".into()),
            hitpay_webhook_url: std::env::var("HITPAY_WEBHOOK_URL").unwrap_or_else(|_| {
                "http://localhost:8000/memberships/payments/webhooks/hitpay".into()
            }),
            hitpay_timeout_secs: std::env::var("HITPAY_TIMEOUT_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            default_currency: std::env::var("DEFAULT_CURRENCY")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_uppercase())
                .unwrap_or_else(|| "SGD".into()),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_secret_placeholder_only_in_development() {
        let name = "BMR_TEST_SECRET_THAT_IS_NEVER_SET";
        let dev = Config::require_secret(name, "development").unwrap();
        assert_eq!(dev, format!("dev-{name}-not-for-production"));
        assert!(Config::require_secret(name, "production").is_err());
    }
}
