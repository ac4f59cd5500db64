//! HitPay integration via REST API (no SDK dependency)
//!
//! - create-payment: form POST, returns the payment request id and PayNow QR
//! - webhook: form or JSON callback, optionally signed with the account salt

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sha2::Sha256;
use shared::error::{AppError, ErrorCode};
use url::{Host, Url};

use crate::error::BoxError;

/// Gateway failures, kept apart from validation errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HitPay API key is not configured")]
    MissingApiKey,
    #[error("HitPay request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HitPay returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("HitPay response has no payment request id")]
    MissingId,
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::MissingApiKey => AppError::new(ErrorCode::PaymentGatewayMisconfigured),
            other => AppError::with_message(
                ErrorCode::PaymentCreateFailed,
                format!("Payment creation failed: {other}"),
            ),
        }
    }
}

/// Two-decimal money string, e.g. `15.00`
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

/// Parameters of a payment request
#[derive(Debug)]
pub struct CreatePaymentRequest<'a> {
    pub amount: Decimal,
    pub currency: &'a str,
    pub webhook: &'a str,
    pub reference_number: &'a str,
    pub purpose: &'a str,
}

impl CreatePaymentRequest<'_> {
    fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("amount", format_amount(self.amount)),
            ("currency", self.currency.to_uppercase()),
            ("payment_methods[]", "paynow_online".to_string()),
            ("generate_qr", "true".to_string()),
            ("webhook", self.webhook.to_string()),
            ("reference_number", self.reference_number.to_string()),
            ("purpose", self.purpose.to_string()),
        ]
    }
}

/// A payment request the gateway accepted
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub external_id: String,
    pub qr_code: Option<String>,
    pub raw: serde_json::Value,
}

impl PaymentIntent {
    /// Read `id` and `qr_code_data.qr_code` from a create-payment response
    pub fn from_response(raw: serde_json::Value) -> Result<Self, GatewayError> {
        let external_id = raw["id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .map(String::from)
            .ok_or(GatewayError::MissingId)?;
        let qr_code = raw["qr_code_data"]["qr_code"].as_str().map(String::from);
        Ok(Self {
            external_id,
            qr_code,
            raw,
        })
    }

    /// Stand-in used in development when the callback URL is not reachable
    pub fn dev_placeholder(reference_no: &str, amount: Decimal, currency: &str) -> Self {
        Self {
            external_id: format!("dev-{reference_no}"),
            qr_code: Some("DEV_MODE_QR_CODE".to_string()),
            raw: serde_json::json!({
                "dev_mode": true,
                "reference_number": reference_no,
                "amount": format_amount(amount),
                "currency": currency,
            }),
        }
    }
}

#[derive(Clone)]
pub struct HitpayClient {
    http: reqwest::Client,
    api_key: String,
    create_payment_url: String,
}

impl HitpayClient {
    pub fn new(
        api_key: impl Into<String>,
        create_payment_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, BoxError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            create_payment_url: create_payment_url.into(),
        })
    }

    /// Create a PayNow payment request
    pub async fn create_payment(
        &self,
        request: &CreatePaymentRequest<'_>,
    ) -> Result<PaymentIntent, GatewayError> {
        if self.api_key.trim().is_empty() {
            return Err(GatewayError::MissingApiKey);
        }

        let response = self
            .http
            .post(&self.create_payment_url)
            .header("X-BUSINESS-API-KEY", &self.api_key)
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&request.form_fields())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %body, "HitPay rejected payment request");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let raw: serde_json::Value = response.json().await?;
        let intent = PaymentIntent::from_response(raw)?;
        tracing::info!(
            external_id = %intent.external_id,
            reference = request.reference_number,
            "HitPay payment request created"
        );
        Ok(intent)
    }
}

// ── Callback URL ────────────────────────────────────────────────────

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_unspecified()
        || ip.is_link_local()
        || ip.is_broadcast()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        || (first & 0xfe00) == 0xfc00
        || (first & 0xffc0) == 0xfe80
        || ip.to_ipv4_mapped().is_some_and(is_private_v4)
}

/// Check the webhook URL can be reached by the gateway from the internet.
///
/// Returns the reason on rejection.
pub fn validate_callback_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw.trim()).map_err(|e| format!("not a valid URL: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    match url.host() {
        None => Err("URL has no host".to_string()),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            if domain == "localhost" || domain.ends_with(".localhost") {
                Err(format!("host '{domain}' is not publicly reachable"))
            } else {
                Ok(())
            }
        }
        Some(Host::Ipv4(ip)) if is_private_v4(ip) => {
            Err(format!("address {ip} is not publicly reachable"))
        }
        Some(Host::Ipv6(ip)) if is_private_v6(ip) => {
            Err(format!("address {ip} is not publicly reachable"))
        }
        Some(_) => Ok(()),
    }
}

// ── Webhook ─────────────────────────────────────────────────────────

/// Webhook body: the payload exactly as received plus a flattened
/// `key -> text` view for field lookup and signing
#[derive(Debug, Clone, Default)]
pub struct WebhookPayload {
    raw: serde_json::Value,
    fields: BTreeMap<String, String>,
}

impl WebhookPayload {
    /// From a JSON body; nested values are flattened to their JSON text and
    /// nulls are left out of the field view
    pub fn from_json(raw: serde_json::Value) -> Self {
        let fields = raw
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| {
                        let text = match v {
                            serde_json::Value::Null => return None,
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        Some((k.clone(), text))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { raw, fields }
    }

    /// From an `application/x-www-form-urlencoded` body.
    ///
    /// The stored payload keeps every pair; a repeated key becomes an array
    /// of its values in arrival order.
    pub fn from_form(body: &[u8]) -> Self {
        let mut raw = serde_json::Map::new();
        let mut fields = BTreeMap::new();
        for (k, v) in url::form_urlencoded::parse(body) {
            let (k, v) = (k.into_owned(), v.into_owned());
            match raw.get_mut(&k) {
                Some(serde_json::Value::Array(values)) => values.push(v.clone().into()),
                Some(first) => *first = serde_json::json!([first.take(), v.clone()]),
                None => {
                    raw.insert(k.clone(), v.clone().into());
                }
            }
            fields.insert(k, v);
        }
        Self {
            raw: serde_json::Value::Object(raw),
            fields,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Gateway payment request id
    pub fn external_id(&self) -> Option<&str> {
        self.get("id").or_else(|| self.get("payment_request_id"))
    }

    /// Lower-cased gateway status
    pub fn status(&self) -> Option<String> {
        self.get("status").map(str::to_ascii_lowercase)
    }

    /// Payload as received, stored on the payment row for audit
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    fn signing_string(&self) -> String {
        self.fields
            .iter()
            .filter(|(k, _)| k.as_str() != "hmac")
            .map(|(k, v)| format!("{k}{v}"))
            .collect()
    }

    /// Constant-time check of the `hmac` field against the salt
    pub fn verify_hmac(&self, salt: &str) -> Result<(), &'static str> {
        let provided = self.get("hmac").ok_or("Missing hmac field")?;
        let sig_bytes = hex::decode(provided).map_err(|_| "Invalid signature hex")?;
        let mut mac = Hmac::<Sha256>::new_from_slice(salt.as_bytes()).map_err(|_| "HMAC key error")?;
        mac.update(self.signing_string().as_bytes());
        mac.verify_slice(&sig_bytes)
            .map_err(|_| "Webhook signature mismatch")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_url_rejects_local_hosts() {
        for url in [
            "http://localhost:8000/webhook",
            "http://api.localhost/webhook",
            "http://127.0.0.1/webhook",
            "http://10.0.0.5/webhook",
            "http://192.168.1.10/webhook",
            "http://172.16.4.1/webhook",
            "http://169.254.1.1/webhook",
            "http://0.0.0.0/webhook",
            "http://[::1]/webhook",
            "http://[fd00::1]/webhook",
            "http://[fe80::1]/webhook",
            "ftp://example.com/webhook",
            "not a url",
        ] {
            assert!(validate_callback_url(url).is_err(), "{url}");
        }
    }

    #[test]
    fn callback_url_accepts_public_hosts() {
        for url in [
            "https://api.bmr.org.sg/memberships/payments/webhooks/hitpay",
            "http://203.0.113.7/webhook",
            "https://[2001:db8::1]/webhook",
        ] {
            assert!(validate_callback_url(url).is_ok(), "{url}");
        }
    }

    #[test]
    fn mapped_private_v6_is_local() {
        assert!(validate_callback_url("http://[::ffff:192.168.0.1]/webhook").is_err());
        assert!(validate_callback_url("http://[::ffff:8.8.8.8]/webhook").is_ok());
    }

    #[test]
    fn amounts_have_two_decimals() {
        assert_eq!(format_amount(Decimal::new(15, 0)), "15.00");
        assert_eq!(format_amount(Decimal::new(12775, 3)), "12.78");
        assert_eq!(format_amount(Decimal::new(3000, 2)), "30.00");
    }

    #[test]
    fn create_request_form_fields() {
        let req = CreatePaymentRequest {
            amount: Decimal::new(1500, 2),
            currency: "sgd",
            webhook: "https://api.bmr.org.sg/hook",
            reference_number: "BMR-AB12CD34",
            purpose: "Membership application payment - BMR-AB12CD34",
        };
        let fields = req.form_fields();
        assert!(fields.contains(&("amount", "15.00".to_string())));
        assert!(fields.contains(&("currency", "SGD".to_string())));
        assert!(fields.contains(&("payment_methods[]", "paynow_online".to_string())));
        assert!(fields.contains(&("generate_qr", "true".to_string())));
        assert!(fields.contains(&("reference_number", "BMR-AB12CD34".to_string())));
    }

    #[test]
    fn intent_from_response() {
        let raw = serde_json::json!({
            "id": "9a5c1b2e-req",
            "status": "pending",
            "qr_code_data": { "qr_code": "00020101021226..." }
        });
        let intent = PaymentIntent::from_response(raw).unwrap();
        assert_eq!(intent.external_id, "9a5c1b2e-req");
        assert_eq!(intent.qr_code.as_deref(), Some("00020101021226..."));
        assert_eq!(intent.raw["status"], "pending");

        let err = PaymentIntent::from_response(serde_json::json!({"status": "pending"}));
        assert!(matches!(err, Err(GatewayError::MissingId)));
    }

    #[test]
    fn gateway_errors_map_to_payment_codes() {
        let err: AppError = GatewayError::MissingApiKey.into();
        assert_eq!(err.code, ErrorCode::PaymentGatewayMisconfigured);
        let err: AppError = GatewayError::Rejected {
            status: 422,
            body: "bad amount".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::PaymentCreateFailed);
        assert!(err.message.contains("422"));
    }

    #[test]
    fn dev_placeholder_shape() {
        let intent = PaymentIntent::dev_placeholder("BMR-AB12CD34", Decimal::new(3000, 2), "SGD");
        assert_eq!(intent.external_id, "dev-BMR-AB12CD34");
        assert_eq!(intent.qr_code.as_deref(), Some("DEV_MODE_QR_CODE"));
        assert_eq!(intent.raw["dev_mode"], true);
    }

    fn sign(payload: &WebhookPayload, salt: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(salt.as_bytes()).unwrap();
        mac.update(payload.signing_string().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn payload_from_form_and_json() {
        let form = WebhookPayload::from_form(
            b"payment_id=p1&payment_request_id=req-1&status=COMPLETED&amount=30.00",
        );
        assert_eq!(form.external_id(), Some("req-1"));
        assert_eq!(form.status().as_deref(), Some("completed"));

        let json = WebhookPayload::from_json(serde_json::json!({
            "id": "req-2",
            "status": "succeeded",
            "amount": 30.0,
            "reference_number": null
        }));
        assert_eq!(json.external_id(), Some("req-2"));
        assert_eq!(json.get("amount"), Some("30.0"));
        assert_eq!(json.get("reference_number"), None);

        let empty = WebhookPayload::from_json(serde_json::json!({"id": "  "}));
        assert_eq!(empty.external_id(), None);
    }

    #[test]
    fn json_payload_is_kept_verbatim() {
        let raw = serde_json::json!({
            "id": "req-3",
            "status": "completed",
            "amount": 30.0,
            "meta": { "a": 1 },
            "ref": null
        });
        let payload = WebhookPayload::from_json(raw.clone());
        assert_eq!(payload.raw(), &raw);
        // lookup view is flattened, the stored payload is not
        assert_eq!(payload.get("meta"), Some(r#"{"a":1}"#));
        assert_eq!(payload.get("ref"), None);
    }

    #[test]
    fn form_payload_keeps_every_pair() {
        let payload = WebhookPayload::from_form(
            b"payment_request_id=req-4&status=completed&amount=30.00&tag=a&tag=b",
        );
        assert_eq!(
            payload.raw(),
            &serde_json::json!({
                "payment_request_id": "req-4",
                "status": "completed",
                "amount": "30.00",
                "tag": ["a", "b"]
            })
        );
    }

    #[test]
    fn hmac_verification() {
        let salt = "test-salt";
        let mut payload =
            WebhookPayload::from_form(b"payment_request_id=req-1&status=completed&amount=30.00");
        let signature = sign(&payload, salt);

        // Sorted key + value concatenation
        let mut mac = Hmac::<Sha256>::new_from_slice(salt.as_bytes()).unwrap();
        mac.update(b"amount30.00payment_request_idreq-1statuscompleted");
        assert_eq!(signature, hex::encode(mac.finalize().into_bytes()));

        payload.fields.insert("hmac".into(), signature);
        assert!(payload.verify_hmac(salt).is_ok());
        assert!(payload.verify_hmac("other-salt").is_err());

        payload.fields.insert("status".into(), "failed".into());
        assert!(payload.verify_hmac(salt).is_err());

        let unsigned = WebhookPayload::from_form(b"payment_request_id=req-1");
        assert_eq!(unsigned.verify_hmac(salt), Err("Missing hmac field"));
    }
}
