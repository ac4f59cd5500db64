//! HitPay webhook
//!
//! POST /memberships/payments/webhooks/hitpay. Unauthenticated; the body is
//! either JSON or form-encoded and is checked against `HITPAY_SALT` when one
//! is configured.

use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Router, extract::State};
use shared::error::{ApiResponse, AppError};

use super::ApiResult;
use super::views::PaymentView;
use crate::hitpay::WebhookPayload;
use crate::payments;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/memberships/payments/webhooks/hitpay", post(handle_webhook))
}

/// Parse the raw body according to its content type
fn parse_payload(content_type: Option<&str>, body: &[u8]) -> Result<WebhookPayload, AppError> {
    let is_form = content_type
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if is_form {
        return Ok(WebhookPayload::from_form(body));
    }
    let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(%e, "Failed to parse webhook JSON");
        AppError::invalid_request("Invalid webhook payload.")
    })?;
    Ok(WebhookPayload::from_json(value))
}

pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<PaymentView> {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let payload = parse_payload(content_type, &body)?;

    tracing::info!(
        external_id = payload.external_id().unwrap_or("-"),
        status = payload.status().as_deref().unwrap_or("-"),
        "Received HitPay webhook"
    );

    let payment = payments::reconcile_webhook(&state, &payload).await?;
    Ok(ApiResponse::success_with_message(
        "Webhook processed successfully",
        PaymentView::from(payment),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_body_is_parsed() {
        let payload = parse_payload(
            Some("application/x-www-form-urlencoded; charset=utf-8"),
            b"payment_request_id=pr_1&status=Completed&hmac=abc",
        )
        .unwrap();
        assert_eq!(payload.external_id(), Some("pr_1"));
        assert_eq!(payload.status().as_deref(), Some("completed"));
    }

    #[test]
    fn json_body_is_parsed() {
        let payload = parse_payload(
            Some("application/json"),
            br#"{"id": "pr_2", "status": "succeeded", "amount": 30.0}"#,
        )
        .unwrap();
        assert_eq!(payload.external_id(), Some("pr_2"));
        assert_eq!(payload.get("amount"), Some("30.0"));
    }

    #[test]
    fn missing_content_type_defaults_to_json() {
        let payload = parse_payload(None, br#"{"id": "pr_3"}"#).unwrap();
        assert_eq!(payload.external_id(), Some("pr_3"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = parse_payload(Some("application/json"), b"id=pr_4").unwrap_err();
        assert_eq!(err.code, shared::error::ErrorCode::InvalidRequest);
    }
}
