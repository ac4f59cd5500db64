//! Account audit trail
//!
//! One row per security-relevant account event. `user_id` is the account the
//! event is about, `actor_id` whoever caused it (the same user for self-service
//! actions, an administrator for promotions and role changes).

use serde::Serialize;
use shared::util::now_millis;
use sqlx::PgPool;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Register,
    VerifyEmail,
    Login,
    GoogleLogin,
    Logout,
    PasswordReset,
    SetPassword,
    PromoteUser,
    AssignRoles,
}

impl AuditAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::VerifyEmail => "verify_email",
            Self::Login => "login",
            Self::GoogleLogin => "google_login",
            Self::Logout => "logout",
            Self::PasswordReset => "password_reset",
            Self::SetPassword => "set_password",
            Self::PromoteUser => "promote_user",
            Self::AssignRoles => "assign_roles",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditEvent<'a> {
    pub user_id: i64,
    pub actor_id: Option<i64>,
    pub action: AuditAction,
    pub detail: Option<serde_json::Value>,
    pub ip_address: Option<&'a str>,
}

impl<'a> AuditEvent<'a> {
    /// Self-service event: the user is also the actor
    pub fn own(user_id: i64, action: AuditAction) -> Self {
        Self {
            user_id,
            actor_id: Some(user_id),
            action,
            detail: None,
            ip_address: None,
        }
    }

    /// Event performed by `actor_id` on another account
    pub fn by(actor_id: i64, user_id: i64, action: AuditAction) -> Self {
        Self {
            actor_id: Some(actor_id),
            ..Self::own(user_id, action)
        }
    }

    pub fn detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn ip(mut self, ip: &'a str) -> Self {
        self.ip_address = Some(ip);
        self
    }
}

pub async fn insert(pool: &PgPool, event: &AuditEvent<'_>, now: i64) -> Result<(), BoxError> {
    sqlx::query(
        "INSERT INTO audit_logs (user_id, actor_id, action, detail, ip_address, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(event.user_id)
    .bind(event.actor_id)
    .bind(event.action.as_str())
    .bind(event.detail.as_ref())
    .bind(event.ip_address)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Best-effort write: a failed insert is logged and never fails the request
pub async fn record(pool: &PgPool, event: AuditEvent<'_>) {
    if let Err(e) = insert(pool, &event, now_millis()).await {
        tracing::warn!(
            user_id = event.user_id,
            action = event.action.as_str(),
            "Failed to write audit entry: {e}"
        );
    }
}

#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub actor_id: Option<i64>,
    pub action: String,
    pub detail: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub created_at: i64,
}

/// Entries about one account, newest first
pub async fn list_for_user(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<AuditEntry>, sqlx::Error> {
    sqlx::query_as::<_, AuditEntry>(
        "SELECT id, actor_id, action, detail, ip_address, created_at FROM audit_logs \
         WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
