//! Account authentication API
//!
//! Registration and OTP verification, password and Google sign-in, token
//! refresh/logout, and the password/username recovery flows.

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Extension, Json, Router, extract::State, middleware};
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::util::now_millis;

use super::ApiResult;
use crate::auth::google::username_candidate;
use crate::auth::otp::check_otp;
use crate::auth::rate_limit::{ClientIp, login_rate_limit, otp_rate_limit};
use crate::auth::user_auth::{create_token, user_auth_middleware};
use crate::auth::CurrentUser;
use crate::db;
use crate::db::audit::{AuditAction, AuditEvent};
use crate::db::users::UserRow;
use crate::email;
use crate::error::db_err;
use crate::state::AppState;
use crate::util::{OTP_TTL_MS, generate_otp, hash_password, verify_password};
use crate::validation::{
    MAX_CONTACT_LEN, MAX_NAME_LEN, MAX_URL_LEN, validate_email, validate_optional_text,
    validate_password, validate_required_text,
};

/// Attempts at finding a free username for a new Google account
const MAX_USERNAME_ATTEMPTS: u32 = 50;

const FORGOT_PASSWORD_MESSAGE: &str = "If the email exists, an OTP has been sent.";
const FORGOT_USERNAME_MESSAGE: &str = "If the email exists, the username has been sent.";

pub fn router(state: &AppState) -> Router<AppState> {
    let login_limited = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/google", post(google_login))
        .route_layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    let otp_limited = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/send-otp", post(send_otp))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/forgot-username", post(forgot_username))
        .route_layer(middleware::from_fn_with_state(state.clone(), otp_rate_limit));

    let authenticated = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/set-password", post(set_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    Router::new()
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/token/refresh", post(refresh_token))
        .merge(login_limited)
        .merge(otp_limited)
        .merge(authenticated)
}

// ── Request / response bodies ───────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RegisterProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub secondary_mobile: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub profile: RegisterProfile,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_required_text(&self.username, "username", MAX_NAME_LEN)?;
        validate_email(self.email.trim())?;
        if self.password != self.confirm_password {
            return Err(AppError::with_message(
                ErrorCode::PasswordMismatch,
                "Passwords do not match.",
            ));
        }
        validate_password(&self.password, "password")?;

        let profile = &self.profile;
        if profile.mobile.as_deref().map(str::trim).unwrap_or_default().is_empty() {
            return Err(AppError::new(ErrorCode::ValidationFailed).with_detail(
                "profile",
                serde_json::json!({ "mobile": ["This field is required."] }),
            ));
        }
        validate_optional_text(&profile.full_name, "full_name", MAX_NAME_LEN)?;
        validate_optional_text(&profile.mobile, "mobile", MAX_CONTACT_LEN)?;
        validate_optional_text(&profile.secondary_mobile, "secondary_mobile", MAX_CONTACT_LEN)?;
        validate_optional_text(&profile.avatar, "avatar", MAX_URL_LEN)
    }
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: RegisteredUser,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password: String,
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Login gate applied after the password matched
fn check_can_login(user: &UserRow) -> Result<(), AppError> {
    if !user.is_verified {
        return Err(AppError::with_message(
            ErrorCode::EmailNotVerified,
            "Please verify your email to access your account.",
        ));
    }
    if user.is_locked {
        return Err(AppError::with_message(
            ErrorCode::AccountLocked,
            "Your account is locked. Please verify OTP to unlock your account.",
        ));
    }
    Ok(())
}

/// Gate for a Google sign-in. Only a Google-verified email may claim an
/// account, new or existing. Returns whether an existing account still needs
/// linking (first Google sign-in, or a locked account being unlocked).
fn check_google_sign_in(existing: Option<&UserRow>, email_verified: bool) -> Result<bool, AppError> {
    if !email_verified {
        return Err(AppError::with_message(
            ErrorCode::GoogleTokenInvalid,
            "Google account email is not verified.",
        ));
    }
    match existing {
        Some(user) if !user.is_active => Err(AppError::invalid_credentials()),
        Some(user) => Ok(!user.is_google_login || user.is_locked),
        None => Ok(false),
    }
}

fn password_matches(user: &UserRow, password: &str) -> bool {
    user.is_active
        && user
            .hashed_password
            .as_deref()
            .is_some_and(|hash| verify_password(password, hash))
}

async fn issue_tokens(state: &AppState, user: &UserRow) -> Result<TokenPair, AppError> {
    let access = create_token(user.id, &user.username, user.is_staff, &state.jwt_secret)
        .map_err(|e| {
            tracing::error!("JWT creation failed: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;
    let refresh = db::refresh_tokens::create(&state.pool, user.id)
        .await
        .map_err(db_err("Failed to store refresh token"))?;
    Ok(TokenPair { access, refresh })
}

async fn find_by_email(state: &AppState, email: &str) -> Result<Option<UserRow>, AppError> {
    db::users::find_by_email(&state.pool, email.trim())
        .await
        .map_err(db_err("DB error looking up user by email"))
}

async fn deliver_otp(state: &AppState, user: &UserRow) -> Result<(), AppError> {
    let code = generate_otp();
    let now = now_millis();
    db::users::set_otp(&state.pool, user.id, &code, now + OTP_TTL_MS, now)
        .await
        .map_err(db_err("Failed to store OTP"))?;
    email::send_otp(&state.ses, state.ses_from_email(), &user.email, &code)
        .await
        .map_err(|e| {
            tracing::error!(user_id = user.id, "Failed to send OTP email: {e}");
            AppError::new(ErrorCode::EmailDeliveryFailed)
        })
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<RegisterResponse>), AppError> {
    req.validate()?;
    let username = req.username.trim();
    let email_addr = req.email.trim();

    if db::users::username_exists(&state.pool, username)
        .await
        .map_err(db_err("DB error checking username"))?
    {
        return Err(AppError::new(ErrorCode::UsernameTaken)
            .with_detail("username", serde_json::json!(["A user with that username already exists."])));
    }
    if db::users::email_exists(&state.pool, email_addr)
        .await
        .map_err(db_err("DB error checking email"))?
    {
        return Err(AppError::new(ErrorCode::EmailTaken)
            .with_detail("email", serde_json::json!(["A user with that email already exists."])));
    }

    let hashed = hash_password(&req.password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;
    let code = generate_otp();
    let now = now_millis();
    let profile = &req.profile;

    let mut tx = state.pool.begin().await.map_err(db_err("Failed to begin transaction"))?;
    let user_id = db::users::create(
        &mut tx,
        &db::users::NewUser {
            username,
            email: email_addr,
            hashed_password: Some(&hashed),
            is_verified: false,
            is_locked: true,
            is_google_login: false,
            otp_code: Some(&code),
            otp_expired_at: Some(now + OTP_TTL_MS),
        },
        now,
    )
    .await
    .map_err(db_err("Failed to create user"))?;
    db::profiles::create(
        &mut tx,
        user_id,
        &db::profiles::NewProfile {
            full_name: profile.full_name.as_deref().map(str::trim).unwrap_or_default(),
            avatar: profile.avatar.as_deref(),
            mobile: profile.mobile.as_deref().map(str::trim).unwrap_or_default(),
            secondary_mobile: profile.secondary_mobile.as_deref().map(str::trim),
        },
        now,
    )
    .await
    .map_err(db_err("Failed to create profile"))?;

    // No account is kept when the code cannot be delivered
    email::send_otp(&state.ses, state.ses_from_email(), email_addr, &code)
        .await
        .map_err(|e| {
            tracing::error!(%email_addr, "Failed to send registration OTP: {e}");
            AppError::new(ErrorCode::EmailDeliveryFailed)
        })?;
    tx.commit().await.map_err(db_err("Failed to commit registration"))?;

    tracing::info!(user_id, username, "User registered");
    db::audit::record(&state.pool, AuditEvent::own(user_id, AuditAction::Register).ip(&ip)).await;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message(
            "Registered. OTP sent.",
            RegisterResponse {
                user: RegisteredUser {
                    username: username.to_string(),
                    email: email_addr.to_string(),
                },
            },
        ),
    ))
}

/// POST /auth/send-otp
pub async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<()> {
    validate_email(req.email.trim())?;
    let user = find_by_email(&state, &req.email).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::UserNotFound, "User not found.")
            .with_detail("email", serde_json::json!(["User not found."]))
    })?;
    deliver_otp(&state, &user).await?;
    Ok(ApiResponse::ok("OTP sent."))
}

/// POST /auth/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> ApiResult<()> {
    let user = find_by_email(&state, &req.email)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::UserNotFound, "User not found."))?;
    let now = now_millis();
    check_otp(user.otp_code.as_deref(), user.otp_expired_at, &req.code, now)?;

    db::users::mark_verified(&state.pool, user.id, now)
        .await
        .map_err(db_err("Failed to mark user verified"))?;
    tracing::info!(user_id = user.id, "Email verified");
    db::audit::record(&state.pool, AuditEvent::own(user.id, AuditAction::VerifyEmail)).await;

    Ok(ApiResponse::ok("Email verified."))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<TokenPair> {
    let identifier = req.identifier.trim();

    // Username first, then the identifier as an email
    let mut user = db::users::find_by_username(&state.pool, identifier)
        .await
        .map_err(db_err("DB error during login"))?
        .filter(|u| password_matches(u, &req.password));
    if user.is_none() {
        user = find_by_email(&state, identifier)
            .await?
            .filter(|u| password_matches(u, &req.password));
    }
    let Some(user) = user else {
        tracing::info!(identifier, "Login failed");
        return Err(AppError::invalid_credentials());
    };

    check_can_login(&user)?;

    let tokens = issue_tokens(&state, &user).await?;
    db::audit::record(&state.pool, AuditEvent::own(user.id, AuditAction::Login).ip(&ip)).await;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(ApiResponse::success_with_message("Logged in.", tokens))
}

/// POST /auth/token/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<TokenPair> {
    let token = req
        .refresh
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::field("refresh", "This field is required."))?;

    let (user_id, refresh) = db::refresh_tokens::rotate(&state.pool, token.trim())
        .await
        .map_err(db_err("Failed to rotate refresh token"))?
        .ok_or_else(|| AppError::new(ErrorCode::RefreshTokenInvalid))?;

    let user = db::users::find_by_id(&state.pool, user_id)
        .await
        .map_err(db_err("DB error loading user"))?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::new(ErrorCode::RefreshTokenInvalid))?;

    let access = create_token(user.id, &user.username, user.is_staff, &state.jwt_secret)
        .map_err(|e| {
            tracing::error!("JWT creation failed: {e}");
            AppError::new(ErrorCode::InternalError)
        })?;

    Ok(ApiResponse::success_with_message(
        "Token refreshed.",
        TokenPair { access, refresh },
    ))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<()> {
    let token = req
        .refresh
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::field("refresh", "This field is required."))?;

    let revoked = db::refresh_tokens::revoke(&state.pool, current.user_id, token.trim())
        .await
        .map_err(db_err("Failed to revoke refresh token"))?;
    if !revoked {
        return Err(AppError::with_message(
            ErrorCode::RefreshTokenInvalid,
            "Invalid refresh token.",
        ));
    }

    db::audit::record(&state.pool, AuditEvent::own(current.user_id, AuditAction::Logout)).await;
    Ok(ApiResponse::ok("Logged out."))
}

/// POST /auth/forgot-password
///
/// Answers identically whether or not the email belongs to an account.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<()> {
    validate_email(req.email.trim())?;
    if let Some(user) = find_by_email(&state, &req.email).await?
        && let Err(e) = deliver_otp(&state, &user).await
    {
        tracing::warn!(user_id = user.id, "Password reset OTP not delivered: {}", e.message);
    }
    Ok(ApiResponse::ok(FORGOT_PASSWORD_MESSAGE))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<()> {
    validate_password(&req.new_password, "new_password")?;

    let user = find_by_email(&state, &req.email)
        .await?
        .ok_or_else(|| AppError::validation("Invalid code or email."))?;
    let now = now_millis();
    check_otp(user.otp_code.as_deref(), user.otp_expired_at, &req.code, now)
        .map_err(|e| AppError::with_message(e.code, "Invalid or expired OTP."))?;

    let hashed = hash_password(&req.new_password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;
    db::users::reset_password(&state.pool, user.id, &hashed, now)
        .await
        .map_err(db_err("Failed to reset password"))?;
    db::refresh_tokens::revoke_all(&state.pool, user.id)
        .await
        .map_err(db_err("Failed to revoke refresh tokens"))?;

    tracing::info!(user_id = user.id, "Password reset");
    db::audit::record(&state.pool, AuditEvent::own(user.id, AuditAction::PasswordReset)).await;
    Ok(ApiResponse::ok("Password reset successful."))
}

/// POST /auth/forgot-username
pub async fn forgot_username(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<()> {
    validate_email(req.email.trim())?;
    if let Some(user) = find_by_email(&state, &req.email).await?
        && let Err(e) =
            email::send_username(&state.ses, state.ses_from_email(), &user.email, &user.username)
                .await
    {
        tracing::warn!(user_id = user.id, "Username reminder not delivered: {e}");
    }
    Ok(ApiResponse::ok(FORGOT_USERNAME_MESSAGE))
}

/// POST /auth/google
pub async fn google_login(
    State(state): State<AppState>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    Json(req): Json<GoogleLoginRequest>,
) -> ApiResult<TokenPair> {
    let identity = state.google.verify(req.id_token.trim()).await?;
    let now = now_millis();

    let existing = find_by_email(&state, &identity.email).await?;
    let needs_link = check_google_sign_in(existing.as_ref(), identity.email_verified)?;

    let user = match existing {
        Some(user) => {
            if needs_link {
                db::users::mark_google_login(&state.pool, user.id, now)
                    .await
                    .map_err(db_err("Failed to link Google account"))?;
            }
            if let Some(name) = identity.name.as_deref() {
                db::profiles::set_full_name(&state.pool, user.id, name, now)
                    .await
                    .map_err(db_err("Failed to update profile name"))?;
            }
            user
        }
        None => create_google_user(&state, &identity, now).await?,
    };

    let tokens = issue_tokens(&state, &user).await?;
    db::audit::record(&state.pool, AuditEvent::own(user.id, AuditAction::GoogleLogin).ip(&ip)).await;
    tracing::info!(user_id = user.id, "Google sign-in");

    Ok(ApiResponse::success_with_message(
        "Google login successful.",
        tokens,
    ))
}

async fn create_google_user(
    state: &AppState,
    identity: &crate::auth::google::GoogleIdentity,
    now: i64,
) -> Result<UserRow, AppError> {
    let mut username = None;
    for attempt in 0..MAX_USERNAME_ATTEMPTS {
        let candidate = username_candidate(&identity.email, attempt);
        if !db::users::username_exists(&state.pool, &candidate)
            .await
            .map_err(db_err("DB error checking username"))?
        {
            username = Some(candidate);
            break;
        }
    }
    let username = username
        .ok_or_else(|| AppError::internal("Could not derive a free username"))?;

    let mut tx = state.pool.begin().await.map_err(db_err("Failed to begin transaction"))?;
    let user_id = db::users::create(
        &mut tx,
        &db::users::NewUser {
            username: &username,
            email: &identity.email,
            hashed_password: None,
            is_verified: true,
            is_locked: false,
            is_google_login: true,
            otp_code: None,
            otp_expired_at: None,
        },
        now,
    )
    .await
    .map_err(db_err("Failed to create Google user"))?;
    db::profiles::create(
        &mut tx,
        user_id,
        &db::profiles::NewProfile {
            full_name: identity.name.as_deref().unwrap_or_default(),
            avatar: None,
            mobile: "",
            secondary_mobile: None,
        },
        now,
    )
    .await
    .map_err(db_err("Failed to create Google profile"))?;
    tx.commit().await.map_err(db_err("Failed to commit Google user"))?;

    tracing::info!(user_id, %username, "Account created from Google sign-in");
    db::users::find_by_id(&state.pool, user_id)
        .await
        .map_err(db_err("DB error loading user"))?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))
}

/// POST /auth/set-password
pub async fn set_password(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<SetPasswordRequest>,
) -> ApiResult<()> {
    let user = db::users::find_by_id(&state.pool, current.user_id)
        .await
        .map_err(db_err("DB error loading user"))?
        .ok_or_else(AppError::not_authenticated)?;
    if !user.is_google_login {
        return Err(AppError::with_message(
            ErrorCode::GoogleAccountRequired,
            "Only Google users can set password with this endpoint.",
        ));
    }
    validate_password(&req.new_password, "new_password")?;

    let hashed = hash_password(&req.new_password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;
    let now = now_millis();
    db::users::set_password(&state.pool, user.id, &hashed, now)
        .await
        .map_err(db_err("Failed to set password"))?;
    db::audit::record(&state.pool, AuditEvent::own(user.id, AuditAction::SetPassword)).await;

    Ok(ApiResponse::ok("Password set."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserRow {
        UserRow {
            id: 1,
            uuid: uuid::Uuid::nil(),
            username: "jdoe".into(),
            email: "jdoe@example.com".into(),
            hashed_password: Some(hash_password("StrongPass123!").unwrap()),
            is_staff: false,
            is_locked: false,
            is_verified: true,
            otp_code: None,
            otp_expired_at: None,
            is_google_login: false,
            is_active: true,
        }
    }

    fn register_request(json: serde_json::Value) -> RegisterRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn unverified_account_cannot_log_in() {
        let mut u = user();
        u.is_verified = false;
        u.is_locked = true;
        let err = check_can_login(&u).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailNotVerified);
    }

    #[test]
    fn locked_account_cannot_log_in() {
        let mut u = user();
        u.is_locked = true;
        let err = check_can_login(&u).unwrap_err();
        assert_eq!(err.code, ErrorCode::AccountLocked);
        assert_eq!(
            err.message,
            "Your account is locked. Please verify OTP to unlock your account."
        );
    }

    #[test]
    fn verified_unlocked_account_logs_in() {
        assert!(check_can_login(&user()).is_ok());
    }

    #[test]
    fn unverified_google_email_never_links_an_account() {
        let mut local = user();
        local.is_google_login = false;
        let err = check_google_sign_in(Some(&local), false).unwrap_err();
        assert_eq!(err.code, ErrorCode::GoogleTokenInvalid);
        let err = check_google_sign_in(None, false).unwrap_err();
        assert_eq!(err.code, ErrorCode::GoogleTokenInvalid);
    }

    #[test]
    fn verified_google_email_links_local_or_locked_accounts() {
        let mut local = user();
        local.is_google_login = false;
        assert!(check_google_sign_in(Some(&local), true).unwrap());

        let mut locked = user();
        locked.is_google_login = true;
        locked.is_locked = true;
        assert!(check_google_sign_in(Some(&locked), true).unwrap());

        let mut linked = user();
        linked.is_google_login = true;
        assert!(!check_google_sign_in(Some(&linked), true).unwrap());
        assert!(!check_google_sign_in(None, true).unwrap());
    }

    #[test]
    fn inactive_account_rejects_google_sign_in() {
        let mut u = user();
        u.is_active = false;
        let err = check_google_sign_in(Some(&u), true).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
    }

    #[test]
    fn password_match_requires_active_local_password() {
        let u = user();
        assert!(password_matches(&u, "StrongPass123!"));
        assert!(!password_matches(&u, "wrong-password"));

        let mut inactive = user();
        inactive.is_active = false;
        assert!(!password_matches(&inactive, "StrongPass123!"));

        let mut google_only = user();
        google_only.hashed_password = None;
        assert!(!password_matches(&google_only, "StrongPass123!"));
    }

    #[test]
    fn register_requires_matching_passwords() {
        let req = register_request(serde_json::json!({
            "username": "jdoe",
            "email": "jdoe@example.com",
            "password": "StrongPass123!",
            "confirm_password": "StrongPass123?",
            "profile": { "mobile": "91234567" }
        }));
        assert_eq!(req.validate().unwrap_err().code, ErrorCode::PasswordMismatch);
    }

    #[test]
    fn register_requires_mobile() {
        let req = register_request(serde_json::json!({
            "username": "jdoe",
            "email": "jdoe@example.com",
            "password": "StrongPass123!",
            "confirm_password": "StrongPass123!",
            "profile": { "full_name": "John Doe" }
        }));
        let err = req.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.details.unwrap().contains_key("profile"));
    }

    #[test]
    fn register_rejects_short_password() {
        let req = register_request(serde_json::json!({
            "username": "jdoe",
            "email": "jdoe@example.com",
            "password": "short",
            "confirm_password": "short",
            "profile": { "mobile": "91234567" }
        }));
        assert_eq!(req.validate().unwrap_err().code, ErrorCode::PasswordTooShort);
    }

    #[test]
    fn register_accepts_complete_request() {
        let req = register_request(serde_json::json!({
            "username": "jdoe",
            "email": "jdoe@example.com",
            "password": "StrongPass123!",
            "confirm_password": "StrongPass123!",
            "profile": { "full_name": "John Doe", "mobile": "91234567" }
        }));
        assert!(req.validate().is_ok());
    }
}
