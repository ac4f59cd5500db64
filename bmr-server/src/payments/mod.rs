//! Payment sub-ledger
//!
//! Payments are only ever saved through [`save_status`], which logs every
//! status change and advances the parent membership once a payment is paid.
//! Gateway calls happen before any transaction is opened, so a failed or
//! timed-out call never leaves a half-written payment row.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{PaymentMethod, PaymentStatus};
use shared::util::{current_year, now_millis, today};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::db;
use crate::db::memberships::MembershipRow;
use crate::db::payments::{NewPayment, PaymentRow};
use crate::error::ServiceResult;
use crate::hitpay::{CreatePaymentRequest, PaymentIntent, WebhookPayload, validate_callback_url};
use crate::state::AppState;
use crate::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, normalize_currency, validate_optional_text};
use crate::workflow::fees::calculate_fee;
use crate::workflow::{self, Actor};

/// Receipt numbers tried before giving up on an insert
const MAX_RECEIPT_ATTEMPTS: i64 = 20;

// ── Pure decisions ──────────────────────────────────────────────────

/// Field changes resulting from a status save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub paid_at: Option<i64>,
    /// Status differs from the stored one (a log row is due)
    pub status_changed: bool,
}

/// Decide what saving `target` onto a payment changes.
///
/// - `paid_at` is stamped on the first move into Paid and never rewritten.
/// - A Paid payment is never moved back by a later status.
/// - `None` means nothing needs to be written.
pub fn plan_payment_update(
    current: Option<PaymentStatus>,
    paid_at: Option<i64>,
    target: PaymentStatus,
    now: i64,
) -> Option<PaymentUpdate> {
    if current == Some(PaymentStatus::Paid) && target != PaymentStatus::Paid {
        return None;
    }
    let new_paid_at = if target == PaymentStatus::Paid {
        paid_at.or(Some(now))
    } else {
        paid_at
    };
    let status_changed = current != Some(target);
    if !status_changed && new_paid_at == paid_at {
        return None;
    }
    Some(PaymentUpdate {
        status: target,
        paid_at: new_paid_at,
        status_changed,
    })
}

/// Amount of an online payment: the explicit amount, else the applicant's fee
/// rounded to cents (half to even)
pub fn resolve_online_amount(
    explicit: Option<Decimal>,
    base_amount: Option<Decimal>,
    date_of_birth: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<Decimal, AppError> {
    if let Some(amount) = explicit {
        return validate_amount(amount);
    }
    let fee = calculate_fee(base_amount, date_of_birth, today).round_dp(2);
    if fee > Decimal::ZERO {
        Ok(fee)
    } else {
        Err(AppError::new(ErrorCode::FeeUnavailable))
    }
}

fn validate_amount(amount: Decimal) -> Result<Decimal, AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::field("amount", "Amount must be greater than zero."));
    }
    if amount.scale() > 2 && amount != amount.round_dp(2) {
        return Err(AppError::field(
            "amount",
            "Ensure that there are no more than 2 decimal places.",
        ));
    }
    Ok(amount)
}

fn default_description(reference_no: &str) -> String {
    format!("Membership application payment - {reference_no}")
}

// ── Requests ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct OnlinePaymentRequest {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub period_year: Option<i32>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct OfflinePaymentRequest {
    pub method: PaymentMethod,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    /// Free-text bank or receipt reference
    #[serde(default)]
    pub reference_no: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub period_year: Option<i32>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// URL of an uploaded receipt image
    #[serde(default)]
    pub receipt_image: Option<String>,
}

impl OfflinePaymentRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.method.is_offline() {
            return Err(AppError::with_message(
                ErrorCode::PaymentInvalidMethod,
                "Offline payments must use bank_transfer or cash.",
            )
            .with_detail("method", serde_json::json!(["Invalid payment method."])));
        }
        validate_amount(self.amount)?;
        validate_optional_text(&self.reference_no, "reference_no", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&self.description, "description", MAX_NOTE_LEN)?;
        validate_optional_text(&self.receipt_image, "receipt_image", MAX_URL_LEN)
    }
}

// ── Persistence helpers ─────────────────────────────────────────────

/// Insert a payment under the next free receipt number and log its creation
pub async fn insert_payment(
    conn: &mut PgConnection,
    payment: &NewPayment<'_>,
    actor: Actor,
    now: i64,
) -> ServiceResult<PaymentRow> {
    let prefix = crate::workflow::numbers::receipt_prefix(current_year());
    let mut sequence = db::payments::count_receipts_with_prefix(conn, &prefix).await? + 1;
    for _ in 0..MAX_RECEIPT_ATTEMPTS {
        let receipt_no = crate::workflow::numbers::format_receipt_no(&prefix, sequence);
        if let Some(row) =
            db::payments::try_insert(conn, payment, &receipt_no, actor.user_id, now).await?
        {
            db::logs::insert_payment_log(
                conn,
                row.id,
                None,
                &row.status,
                Some("created"),
                actor.user_id,
                now,
            )
            .await?;
            tracing::info!(
                payment_id = row.id,
                membership_id = payment.membership_id,
                receipt_no = %row.receipt_no,
                method = payment.method,
                "Payment created"
            );
            return Ok(row);
        }
        sequence += 1;
    }
    Err(AppError::internal("Could not allocate a receipt number").into())
}

/// Save a new status onto a locked payment row.
///
/// Writes one payment log row when the status changes and advances the
/// membership when the payment ends up paid. Returns whether anything was
/// written.
pub async fn save_status(
    conn: &mut PgConnection,
    payment: &PaymentRow,
    target: PaymentStatus,
    note: Option<&str>,
    actor: Actor,
    now: i64,
) -> ServiceResult<bool> {
    let current = PaymentStatus::from_db(&payment.status);
    let Some(update) = plan_payment_update(current, payment.paid_at, target, now) else {
        if current == Some(PaymentStatus::Paid) && target != PaymentStatus::Paid {
            tracing::warn!(
                payment_id = payment.id,
                requested = target.as_db(),
                "Ignoring status change on a paid payment"
            );
        }
        return Ok(false);
    };

    db::payments::update_status(
        conn,
        payment.id,
        update.status.as_db(),
        update.paid_at,
        actor.user_id,
        now,
    )
    .await?;

    if update.status_changed {
        db::logs::insert_payment_log(
            conn,
            payment.id,
            Some(&payment.status),
            update.status.as_db(),
            note,
            actor.user_id,
            now,
        )
        .await?;
        tracing::info!(
            payment_id = payment.id,
            from = %payment.status,
            to = update.status.as_db(),
            "Payment status changed"
        );
    }

    if update.status == PaymentStatus::Paid
        && let Some(membership_id) = payment.membership_id
    {
        workflow::advance_on_payment(conn, membership_id, actor, now).await?;
    }
    Ok(true)
}

// ── Online payments ─────────────────────────────────────────────────

struct OnlineTerms {
    amount: Decimal,
    currency: String,
    description: String,
    period_year: i32,
    due_date: Option<NaiveDate>,
}

/// Ask the gateway for a payment request, or fall back to a placeholder in
/// development when the callback URL cannot be reached from outside.
async fn request_intent(
    state: &AppState,
    reference_no: &str,
    terms: &OnlineTerms,
) -> ServiceResult<PaymentIntent> {
    let webhook = state.config.hitpay_webhook_url.as_str();
    if let Err(reason) = validate_callback_url(webhook) {
        if state.config.is_development() {
            tracing::warn!(%webhook, %reason, "Callback URL not public, creating placeholder payment");
            return Ok(PaymentIntent::dev_placeholder(
                reference_no,
                terms.amount,
                &terms.currency,
            ));
        }
        tracing::error!(%webhook, %reason, "Refusing to create payment with unreachable callback URL");
        return Err(AppError::with_message(
            ErrorCode::InvalidCallbackUrl,
            format!("Invalid webhook URL configured for production: {reason}"),
        )
        .into());
    }

    let intent = state
        .hitpay
        .create_payment(&CreatePaymentRequest {
            amount: terms.amount,
            currency: &terms.currency,
            webhook,
            reference_number: reference_no,
            purpose: &terms.description,
        })
        .await
        .map_err(|e| {
            tracing::error!(reference = reference_no, "HitPay create payment failed: {e}");
            AppError::from(e)
        })?;
    Ok(intent)
}

async fn online_terms(
    state: &AppState,
    membership: &MembershipRow,
    request: &OnlinePaymentRequest,
) -> ServiceResult<OnlineTerms> {
    validate_optional_text(&request.description, "description", MAX_NOTE_LEN)?;

    let base_amount = match membership.membership_type_id {
        Some(id) => db::lookups::find_membership_type_by_id(&state.pool, id)
            .await?
            .map(|t| t.amount),
        None => None,
    };
    let date_of_birth = match membership.profile_info_id {
        Some(id) => db::infos::find_personal(&state.pool, id)
            .await?
            .map(|p| p.date_of_birth),
        None => None,
    };

    Ok(OnlineTerms {
        amount: resolve_online_amount(request.amount, base_amount, date_of_birth, today())?,
        currency: normalize_currency(request.currency.as_deref(), &state.config.default_currency)?,
        description: request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from)
            .unwrap_or_else(|| default_description(&membership.reference_no)),
        period_year: request.period_year.unwrap_or_else(current_year),
        due_date: request.due_date,
    })
}

fn online_payment<'a>(
    membership: &'a MembershipRow,
    terms: &'a OnlineTerms,
    intent: &'a PaymentIntent,
) -> NewPayment<'a> {
    NewPayment {
        membership_id: membership.id,
        method: PaymentMethod::Hitpay.as_db(),
        provider: PaymentMethod::Hitpay.provider(),
        status: PaymentStatus::Created.as_db(),
        external_id: Some(&intent.external_id),
        reference_no: Some(&membership.reference_no),
        description: Some(&terms.description),
        amount: terms.amount,
        currency: &terms.currency,
        period_year: terms.period_year,
        due_date: terms.due_date,
        qr_code: intent.qr_code.as_deref(),
        receipt_image: None,
        raw_response: Some(&intent.raw),
    }
}

/// Create an online payment intent for a membership
pub async fn create_online(
    state: &AppState,
    membership: &MembershipRow,
    request: &OnlinePaymentRequest,
    actor: Actor,
) -> ServiceResult<PaymentRow> {
    let terms = online_terms(state, membership, request).await?;
    let intent = request_intent(state, &membership.reference_no, &terms).await?;

    let now = now_millis();
    let mut tx = state.pool.begin().await?;
    let row = insert_payment(&mut tx, &online_payment(membership, &terms, &intent), actor, now).await?;
    db::memberships::mark_payment_generated(&mut tx, membership.id, actor.user_id, now).await?;
    tx.commit().await?;
    Ok(row)
}

/// First payment intent of an application, created once per membership.
///
/// Returns `None` when a concurrent submission already generated it.
pub async fn create_initial_payment(
    state: &AppState,
    membership_id: i64,
    actor: Actor,
) -> ServiceResult<Option<PaymentRow>> {
    let membership = db::memberships::find_by_id(&state.pool, membership_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound))?;
    let terms = online_terms(state, &membership, &OnlinePaymentRequest::default()).await?;
    let intent = request_intent(state, &membership.reference_no, &terms).await?;

    let now = now_millis();
    let mut tx = state.pool.begin().await?;
    let locked = db::memberships::lock_by_id(&mut tx, membership_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound))?;
    if locked.is_payment_generated {
        tx.rollback().await?;
        tracing::info!(
            membership_id,
            external_id = %intent.external_id,
            "Payment already generated by a concurrent submission, discarding intent"
        );
        return Ok(None);
    }
    let row = insert_payment(&mut tx, &online_payment(&locked, &terms, &intent), actor, now).await?;
    db::memberships::mark_payment_generated(&mut tx, membership_id, actor.user_id, now).await?;
    tx.commit().await?;
    Ok(Some(row))
}

// ── Offline payments ────────────────────────────────────────────────

/// Record a bank transfer or cash payment awaiting staff confirmation
pub async fn create_offline(
    state: &AppState,
    membership: &MembershipRow,
    request: &OfflinePaymentRequest,
    actor: Actor,
) -> ServiceResult<PaymentRow> {
    request.validate()?;
    let currency = normalize_currency(request.currency.as_deref(), &state.config.default_currency)?;
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
        .unwrap_or_else(|| default_description(&membership.reference_no));

    let now = now_millis();
    let mut tx = state.pool.begin().await?;
    let row = insert_payment(
        &mut tx,
        &NewPayment {
            membership_id: membership.id,
            method: request.method.as_db(),
            provider: request.method.provider(),
            status: PaymentStatus::Pending.as_db(),
            external_id: None,
            reference_no: request.reference_no.as_deref().map(str::trim),
            description: Some(&description),
            amount: request.amount,
            currency: &currency,
            period_year: request.period_year.unwrap_or_else(current_year),
            due_date: request.due_date,
            qr_code: None,
            receipt_image: request.receipt_image.as_deref(),
            raw_response: None,
        },
        actor,
        now,
    )
    .await?;
    tx.commit().await?;
    Ok(row)
}

/// Whether staff may mark a payment with this method and status as paid
pub fn check_confirmable(
    method: Option<PaymentMethod>,
    status: Option<PaymentStatus>,
) -> Result<(), AppError> {
    if !method.is_some_and(|m| m.is_offline()) {
        return Err(AppError::with_message(
            ErrorCode::PaymentNotConfirmable,
            "Only bank transfer or cash payments can be confirmed manually.",
        ));
    }
    match status {
        Some(PaymentStatus::Pending | PaymentStatus::Created | PaymentStatus::Paid) => Ok(()),
        _ => Err(AppError::with_message(
            ErrorCode::PaymentNotConfirmable,
            "Payment cannot be confirmed in its current status.",
        )),
    }
}

/// Staff confirmation of an offline payment; repeat confirmations are no-ops
pub async fn confirm_offline(
    pool: &PgPool,
    payment_uuid: Uuid,
    actor: Actor,
) -> ServiceResult<PaymentRow> {
    let now = now_millis();
    let mut tx = pool.begin().await?;
    let payment = db::payments::lock_by_uuid(&mut tx, payment_uuid)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;
    check_confirmable(
        PaymentMethod::from_db(&payment.method),
        PaymentStatus::from_db(&payment.status),
    )?;
    save_status(
        &mut tx,
        &payment,
        PaymentStatus::Paid,
        Some("confirmed by staff"),
        actor,
        now,
    )
    .await?;
    tx.commit().await?;

    db::payments::find_by_uuid(pool, payment_uuid)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound).into())
}

// ── Webhook ─────────────────────────────────────────────────────────

/// Apply a gateway callback to the payment it refers to
pub async fn reconcile_webhook(
    state: &AppState,
    payload: &WebhookPayload,
) -> ServiceResult<PaymentRow> {
    let external_id = payload.external_id().ok_or_else(|| {
        AppError::with_message(ErrorCode::PaymentMissingExternalId, "Missing payment ID.")
    })?;

    match state.config.hitpay_salt.as_deref() {
        Some(salt) => {
            if let Err(reason) = payload.verify_hmac(salt) {
                tracing::warn!(%external_id, %reason, "Webhook signature verification failed");
                return Err(AppError::new(ErrorCode::WebhookSignatureInvalid).into());
            }
        }
        None => {
            tracing::warn!(%external_id, "HITPAY_SALT not set, skipping webhook signature check");
        }
    }

    let now = now_millis();
    let mut tx = state.pool.begin().await?;
    let payment =
        db::payments::lock_by_external_id(&mut tx, external_id, PaymentMethod::Hitpay.as_db())
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound))?;

    db::payments::store_raw_response(&mut tx, payment.id, payload.raw(), now).await?;

    let reported = payload.status();
    match reported.as_deref().and_then(PaymentStatus::from_gateway) {
        Some(target) => {
            save_status(&mut tx, &payment, target, Some("webhook"), Actor::system(), now).await?;
        }
        None => {
            tracing::info!(
                payment_id = payment.id,
                status = reported.as_deref().unwrap_or("-"),
                "Unmapped gateway status, keeping current payment status"
            );
        }
    }
    tx.commit().await?;

    db::payments::find_by_uuid(&state.pool, payment.uuid)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PaymentNotFound).into())
}

// ── Annual billing ──────────────────────────────────────────────────

/// Create one pending bank-transfer payment per billable membership for
/// `year`, skipping memberships that already have a payment for it.
pub async fn generate_annual(
    pool: &PgPool,
    year: i32,
    currency: &str,
    actor: Actor,
) -> ServiceResult<usize> {
    let description = format!("Membership fee {year}");
    let mut created = 0;

    for (membership_id, membership_type_id) in db::memberships::list_billable(pool).await? {
        let now = now_millis();
        let mut tx = pool.begin().await?;
        if db::payments::exists_for_year(&mut tx, membership_id, year).await? {
            continue;
        }
        let Some(membership_type) =
            db::lookups::find_membership_type_by_id(&mut *tx, membership_type_id).await?
        else {
            continue;
        };
        insert_payment(
            &mut tx,
            &NewPayment {
                membership_id,
                method: PaymentMethod::BankTransfer.as_db(),
                provider: None,
                status: PaymentStatus::Pending.as_db(),
                external_id: None,
                reference_no: None,
                description: Some(&description),
                amount: membership_type.amount,
                currency,
                period_year: year,
                due_date: None,
                qr_code: None,
                receipt_image: None,
                raw_response: None,
            },
            actor,
            now,
        )
        .await?;
        tx.commit().await?;
        created += 1;
    }

    tracing::info!(year, created, "Annual payments generated");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use PaymentStatus::*;

    const NOW: i64 = 1_750_000_000_000;
    const EARLIER: i64 = 1_740_000_000_000;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn first_paid_stamps_paid_at_and_logs() {
        let update = plan_payment_update(Some(Created), None, Paid, NOW).unwrap();
        assert_eq!(update.status, Paid);
        assert_eq!(update.paid_at, Some(NOW));
        assert!(update.status_changed);
    }

    #[test]
    fn replayed_paid_is_a_no_op() {
        assert_eq!(plan_payment_update(Some(Paid), Some(EARLIER), Paid, NOW), None);
    }

    #[test]
    fn paid_without_timestamp_gets_one_without_log() {
        let update = plan_payment_update(Some(Paid), None, Paid, NOW).unwrap();
        assert_eq!(update.paid_at, Some(NOW));
        assert!(!update.status_changed);
    }

    #[test]
    fn paid_never_regresses() {
        for target in [Created, Pending, Failed, Cancelled] {
            assert_eq!(plan_payment_update(Some(Paid), Some(EARLIER), target, NOW), None);
        }
    }

    #[test]
    fn non_paid_changes_are_logged_without_paid_at() {
        let update = plan_payment_update(Some(Created), None, Failed, NOW).unwrap();
        assert_eq!(update.paid_at, None);
        assert!(update.status_changed);
        assert_eq!(plan_payment_update(Some(Failed), None, Failed, NOW), None);
    }

    #[test]
    fn webhook_sequence_sets_paid_at_once() {
        // pending -> succeeded -> succeeded (replay) -> pending (late)
        let mut status = Some(Created);
        let mut paid_at = None;
        let mut logs = 0;
        for (gateway, at) in [("pending", 1), ("succeeded", 2), ("succeeded", 3), ("pending", 4)] {
            let target = PaymentStatus::from_gateway(gateway).unwrap();
            if let Some(update) = plan_payment_update(status, paid_at, target, at) {
                if update.status_changed {
                    logs += 1;
                }
                status = Some(update.status);
                paid_at = update.paid_at;
            }
        }
        assert_eq!(status, Some(Paid));
        assert_eq!(paid_at, Some(2));
        assert_eq!(logs, 1);
    }

    #[test]
    fn online_amount_resolution() {
        let today = d(2025, 6, 1);
        let base = Some(Decimal::new(3000, 2));
        assert_eq!(
            resolve_online_amount(Some(Decimal::new(4200, 2)), None, None, today).unwrap(),
            Decimal::new(4200, 2)
        );
        assert_eq!(
            resolve_online_amount(None, base, Some(d(1990, 1, 1)), today).unwrap(),
            Decimal::new(3000, 2)
        );
        assert_eq!(
            resolve_online_amount(None, base, Some(d(2010, 1, 1)), today).unwrap(),
            Decimal::new(1500, 2)
        );
        let err = resolve_online_amount(None, None, Some(d(1990, 1, 1)), today).unwrap_err();
        assert_eq!(err.code, ErrorCode::FeeUnavailable);
        let err = resolve_online_amount(None, base, None, today).unwrap_err();
        assert_eq!(err.code, ErrorCode::FeeUnavailable);
    }

    #[test]
    fn half_price_is_charged_in_whole_cents() {
        let today = d(2025, 6, 1);
        let youth = Some(d(2015, 1, 1));
        // 12.775 -> 12.78, 12.765 -> 12.76
        assert_eq!(
            resolve_online_amount(None, Some(Decimal::new(2555, 2)), youth, today).unwrap(),
            Decimal::new(1278, 2)
        );
        assert_eq!(
            resolve_online_amount(None, Some(Decimal::new(2553, 2)), youth, today).unwrap(),
            Decimal::new(1276, 2)
        );
    }

    #[test]
    fn explicit_amount_must_be_positive_cents() {
        let today = d(2025, 6, 1);
        assert!(resolve_online_amount(Some(Decimal::ZERO), None, None, today).is_err());
        assert!(resolve_online_amount(Some(Decimal::new(-100, 2)), None, None, today).is_err());
        assert!(resolve_online_amount(Some(Decimal::new(10005, 3)), None, None, today).is_err());
        assert!(resolve_online_amount(Some(Decimal::new(10000, 3)), None, None, today).is_ok());
    }

    #[test]
    fn offline_request_requires_offline_method() {
        let req: OfflinePaymentRequest = serde_json::from_value(serde_json::json!({
            "method": "hitpay",
            "amount": "30.00"
        }))
        .unwrap();
        assert_eq!(req.validate().unwrap_err().code, ErrorCode::PaymentInvalidMethod);

        let req: OfflinePaymentRequest = serde_json::from_value(serde_json::json!({
            "method": "bank_transfer",
            "amount": "30.00",
            "reference_no": "DBS-0042"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn only_offline_payments_are_confirmable() {
        assert!(check_confirmable(Some(PaymentMethod::Cash), Some(Pending)).is_ok());
        assert!(check_confirmable(Some(PaymentMethod::BankTransfer), Some(Paid)).is_ok());
        assert_eq!(
            check_confirmable(Some(PaymentMethod::Hitpay), Some(Created))
                .unwrap_err()
                .code,
            ErrorCode::PaymentNotConfirmable
        );
        assert!(check_confirmable(Some(PaymentMethod::Cash), Some(Cancelled)).is_err());
        assert!(check_confirmable(None, Some(Pending)).is_err());
    }

    #[test]
    fn description_defaults_to_reference() {
        assert_eq!(
            default_description("BMR-AB12CD34"),
            "Membership application payment - BMR-AB12CD34"
        );
    }
}
