//! Application state for bmr-server

use aws_sdk_sesv2::Client as SesClient;
use sqlx::PgPool;

use crate::auth::{GoogleVerifier, RateLimiter};
use crate::config::Config;
use crate::crypto::FieldCipher;
use crate::error::BoxError;
use crate::hitpay::HitpayClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    pub config: Config,
    /// PII column cipher
    pub cipher: FieldCipher,
    /// HitPay payment gateway client
    pub hitpay: HitpayClient,
    /// Google ID token verifier
    pub google: GoogleVerifier,
    /// AWS SES client for OTP and username emails
    pub ses: SesClient,
    /// JWT secret for access tokens
    pub jwt_secret: String,
    /// Rate limiter for login/registration/OTP routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let ses = if let Ok(ses_region) = std::env::var("SES_REGION") {
            let ses_config = aws_config
                .to_builder()
                .region(aws_config::Region::new(ses_region))
                .build();
            SesClient::new(&ses_config)
        } else {
            SesClient::new(&aws_config)
        };

        let hitpay = HitpayClient::new(
            &config.hitpay_api_key,
            &config.hitpay_create_payment_url,
            config.hitpay_timeout_secs,
        )?;

        Ok(Self {
            pool,
            config: config.clone(),
            cipher: load_cipher(config)?,
            hitpay,
            google: GoogleVerifier::new(&config.google_client_id)?,
            ses,
            jwt_secret: config.jwt_secret.clone(),
            rate_limiter: RateLimiter::new(),
        })
    }

    pub fn ses_from_email(&self) -> &str {
        &self.config.ses_from_email
    }
}

/// Field cipher from `FIELD_ENCRYPTION_KEY`.
///
/// Development placeholders are not valid keys, so development derives one
/// from whatever value is configured instead of failing startup.
fn load_cipher(config: &Config) -> Result<FieldCipher, BoxError> {
    match FieldCipher::from_base64(&config.field_encryption_key) {
        Ok(cipher) => Ok(cipher),
        Err(e) if config.is_development() => {
            tracing::warn!("FIELD_ENCRYPTION_KEY is not a base64 AES-256 key ({e}), deriving one");
            Ok(FieldCipher::derive(&config.field_encryption_key))
        }
        Err(e) => Err(format!("Invalid FIELD_ENCRYPTION_KEY: {e}").into()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub fn config(environment: &str, key: &str) -> Config {
        Config {
            database_url: "postgres://localhost/bmr".into(),
            http_port: 8000,
            environment: environment.into(),
            jwt_secret: "secret".into(),
            field_encryption_key: key.into(),
            ses_from_email: "noreply@example.com".into(),
            hitpay_api_key: "key".into(),
            hitpay_salt: None,
            hitpay_create_payment_url: "https://api.sandbox.hit-pay.com/v1/payment-requests".into(),
            hitpay_webhook_url: "https://bmr.example.com/memberships/payments/webhooks/hitpay".into(),
            hitpay_timeout_secs: 30,
            google_client_id: String::new(),
            default_currency: "SGD".into(),
        }
    }

    /// State over a lazy pool: nothing connects until a query runs.
    /// Must be called inside a tokio runtime.
    pub fn state() -> AppState {
        let config = config("development", "dev-FIELD_ENCRYPTION_KEY");
        let ses_config = aws_sdk_sesv2::Config::builder()
            .behavior_version(aws_sdk_sesv2::config::BehaviorVersion::latest())
            .region(aws_sdk_sesv2::config::Region::new("ap-southeast-1"))
            .build();
        AppState {
            pool: PgPool::connect_lazy(&config.database_url).unwrap(),
            cipher: load_cipher(&config).unwrap(),
            hitpay: HitpayClient::new(
                &config.hitpay_api_key,
                &config.hitpay_create_payment_url,
                config.hitpay_timeout_secs,
            )
            .unwrap(),
            google: GoogleVerifier::new("").unwrap(),
            ses: SesClient::from_conf(ses_config),
            jwt_secret: config.jwt_secret.clone(),
            rate_limiter: RateLimiter::new(),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::config;
    use super::*;

    #[test]
    fn placeholder_key_is_derived_in_development() {
        let cipher = load_cipher(&config("development", "dev-FIELD_ENCRYPTION_KEY")).unwrap();
        let sealed = cipher.encrypt_field("S1234567D").unwrap();
        assert_eq!(cipher.decrypt_field(&sealed).unwrap(), "S1234567D");
    }

    #[test]
    fn placeholder_key_fails_in_production() {
        assert!(load_cipher(&config("production", "dev-FIELD_ENCRYPTION_KEY")).is_err());
    }

    #[test]
    fn real_key_loads_everywhere() {
        // 32 zero bytes
        let key = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";
        assert!(load_cipher(&config("production", key)).is_ok());
    }
}
