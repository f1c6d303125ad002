use axum::{
    extract::{FromRef, Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{error, info, instrument, warn};

use crate::auth::{
    dto::{
        AppVersionRequest, AppVersionResponse, ChangePasswordRequest, ForgotPasswordRequest,
        LoginRequest, LoginResponse, PaymentRequest, RefreshRequest, RefreshResponse,
        ResetPasswordRequest, SignupRequest, UpdateUserRequest,
    },
    extractors::AuthUser,
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo::{latest_app_version, NewUser, User},
};
use crate::billing;
use crate::common::MessageResponse;
use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/updateUser", post(update_user))
        .route("/changePassword", post(change_password))
        .route("/payments", post(payments))
        .route("/forgotPassword", post(forgot_password))
        .route("/resetPassword/:token", post(reset_password))
        .route("/refreshToken", post(refresh_token))
        .route("/appVersion", post(app_version))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// A required field that was omitted is a 400 with the endpoint's message.
fn require<T>(value: Option<T>, message: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::bad_request(message))
}

/// Like `require`, but an empty string counts as missing too.
fn require_text(value: Option<String>, message: &str) -> Result<String, ApiError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(ApiError::bad_request(message)),
    }
}

#[instrument(skip(state, payload))]
async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    const MISSING: &str = "All required fields must be provided";
    let email = require_text(payload.email, MISSING)?;
    let password = require_text(payload.password, MISSING)?;
    let role = require_text(payload.role, MISSING)?;
    let birthdate = require_text(payload.birthdate, MISSING)?;
    let first_name = require_text(payload.first_name, MISSING)?;
    let last_name = require_text(payload.last_name, MISSING)?;
    let mobile_number = require_text(payload.mobile_number, MISSING)?;

    if !is_valid_email(&email) {
        warn!(%email, "signup with invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(%email, "signup for existing email");
        return Err(ApiError::bad_request("User already exists"));
    }

    let password_hash = hash_password(&password)?;
    let user = User::create(
        &state.db,
        NewUser {
            username: payload.username.as_deref().unwrap_or(""),
            email: &email,
            password_hash: &password_hash,
            role: &role,
            birthdate: &birthdate,
            profile_picture: payload.profile_picture.as_deref().unwrap_or(""),
            first_name: &first_name,
            last_name: &last_name,
            mobile_number: &mobile_number,
        },
    )
    .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    const MISSING: &str = "All fields are required";
    let email = require_text(payload.email, MISSING)?;
    let password = require_text(payload.password, MISSING)?;

    // Unknown email and wrong password produce the same response so the
    // endpoint cannot be used to enumerate accounts.
    const BAD_CREDENTIALS: &str = "Invalid email or password";

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            warn!(%email, "login for unknown email");
            return Err(ApiError::bad_request(BAD_CREDENTIALS));
        }
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login with invalid password");
        return Err(ApiError::bad_request(BAD_CREDENTIALS));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id, &user.email)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    // Seed the single-slot map; any earlier refresh token stops working here.
    state
        .tokens
        .store_refresh(user.id, refresh_token.clone())
        .await;

    // Subscription lookup failure degrades to an inactive status rather than
    // failing the login.
    let subscription_end = match billing::repo::latest_subscription_end(&state.db, user.id).await {
        Ok(end) => end,
        Err(e) => {
            error!(error = %e, user_id = %user.id, "subscription lookup failed");
            None
        }
    };
    let subscription_status =
        billing::repo::subscription_active(subscription_end, OffsetDateTime::now_utc());

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login Successful".into(),
        access_token,
        refresh_token,
        user_id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        mobile_number: user.mobile_number,
        birthdate: user.birthdate,
        subscription_status,
        profile_picture: user.profile_picture,
    }))
}

/// Revokes whatever token string the header carries, without verifying it.
/// Revoking an already-revoked token is a no-op.
#[instrument(skip(state, headers))]
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let auth = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Authorization header is missing"))?;

    let token = auth
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| ApiError::unauthorized("Token is missing"))?;

    state.tokens.revoke(token).await;
    info!("token revoked");
    Ok(Json(MessageResponse::new(
        "Logout successful, token invalidated",
    )))
}

#[instrument(skip(state, payload))]
async fn update_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user_id = require(payload.user_id, "User ID is required")?;

    let rows = User::update_profile(
        &state.db,
        user_id,
        &payload.first_name,
        &payload.last_name,
        &payload.email,
        &payload.mobile_number,
        &payload.birthdate,
    )
    .await?;

    if rows == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    info!(%user_id, "profile updated");
    Ok(Json(MessageResponse::new("Profile updated successfully")))
}

#[instrument(skip(state, payload))]
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    const MISSING: &str = "All fields are required";
    let user_id = require(payload.user_id, MISSING)?;
    let old_password = require_text(payload.old_password, MISSING)?;
    let new_password = require_text(payload.new_password, MISSING)?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password(&old_password, &user.password_hash)? {
        warn!(%user_id, "password change with invalid old password");
        return Err(ApiError::bad_request("Invalid password"));
    }

    let password_hash = hash_password(&new_password)?;
    User::update_password(&state.db, user_id, &password_hash).await?;

    info!(%user_id, actor = %auth.email, "password changed");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

#[instrument(skip(state, payload))]
async fn payments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    const MISSING: &str = "All fields are required";
    let user_id = require(payload.user_id, MISSING)?;
    let amount = require(payload.amount, MISSING)?;
    let payment_id = require_text(payload.payment_id, MISSING)?;
    let currency = require_text(payload.currency, MISSING)?;
    let plan_id = require(payload.subscription_plan_id, MISSING)?;

    // The payment row is written before the plan is looked up, so a payment
    // against an unknown plan is still recorded.
    billing::repo::record_payment(
        &state.db,
        billing::repo::NewPayment {
            user_id,
            payment_id: &payment_id,
            order_id: payload.order_id.as_deref(),
            amount,
            currency: &currency,
            payment_status: "success",
            subscription_plan_id: plan_id,
        },
    )
    .await?;

    let duration_days = billing::repo::plan_duration(&state.db, plan_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Subscription plan not found"))?;

    let (start, end) = billing::repo::subscription_window(OffsetDateTime::now_utc(), duration_days);
    billing::repo::insert_subscription(&state.db, user_id, plan_id, start, end).await?;

    info!(%user_id, %plan_id, "subscription activated");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Your subscription has been successfully activated. Enjoy!",
        )),
    ))
}

#[instrument(skip(state, payload))]
async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = require_text(payload.email, "Email is required")?;

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::bad_request("No account found with this email"))?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_reset(&user.email)?;
    let expiry =
        OffsetDateTime::now_utc() + TimeDuration::minutes(state.config.jwt.reset_ttl_minutes);
    User::set_reset_token(&state.db, user.id, &token, expiry).await?;

    // If the send fails the persisted token stays live until it expires;
    // the client sees a 500 and may retry, which issues a fresh token.
    let link = format!("{}/{}", state.config.mail.reset_link_base, token);
    if let Err(e) = state.mailer.send_reset_link(&user.email, &link).await {
        error!(error = %e, user_id = %user.id, "reset email send failed");
        return Err(ApiError::Internal(e));
    }

    info!(user_id = %user.id, "reset link sent");
    Ok(Json(MessageResponse::new(
        "Password reset link sent to your email",
    )))
}

#[instrument(skip(state, token, payload))]
async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let password = require_text(payload.password, "Password is required")?;

    const INVALID: &str = "Invalid or expired reset token";

    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_reset(&token).map_err(|e| {
        warn!(error = %e, "reset token verification failed");
        ApiError::bad_request(INVALID)
    })?;

    // Both the token's own expiry and the stored expiry column must hold,
    // and the stored token must not have been consumed already.
    let user = User::find_by_reset_token(&state.db, &claims.email, &token)
        .await?
        .ok_or_else(|| ApiError::bad_request(INVALID))?;

    let password_hash = hash_password(&password)?;
    User::reset_password(&state.db, user.id, &password_hash).await?;

    info!(user_id = %user.id, "password reset completed");
    Ok(Json(MessageResponse::new(
        "Password has been reset successfully",
    )))
}

#[instrument(skip(state, payload))]
async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    const MISSING: &str = "All fields are required";
    let user_id = require(payload.user_id, MISSING)?;
    let old_refresh = require_text(payload.old_refresh_token, MISSING)?;

    const INVALID: &str = "Invalid or expired refresh token";

    match state.tokens.current_refresh(user_id).await {
        Some(stored) if stored == old_refresh => {}
        _ => {
            warn!(%user_id, "refresh token does not match stored slot");
            return Err(ApiError::forbidden(INVALID));
        }
    }

    let keys = JwtKeys::from_ref(&state);
    if let Err(e) = keys.verify_refresh(&old_refresh) {
        warn!(%user_id, error = %e, "refresh token verification failed");
        return Err(ApiError::forbidden(INVALID));
    }

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::forbidden(INVALID))?;

    // Rotation: only the first concurrent refresh wins the slot, the loser
    // sees a mismatch and fails.
    let refresh_token = keys.sign_refresh(user.id)?;
    if !state
        .tokens
        .rotate_refresh(user.id, &old_refresh, refresh_token.clone())
        .await
    {
        warn!(%user_id, "lost refresh rotation race");
        return Err(ApiError::forbidden(INVALID));
    }

    let access_token = keys.sign_refreshed_access(user.id, &user.email)?;

    info!(user_id = %user.id, "tokens refreshed");
    Ok(Json(RefreshResponse {
        access_token,
        refresh_token,
    }))
}

#[instrument(skip(state, payload))]
async fn app_version(
    State(state): State<AppState>,
    Json(payload): Json<AppVersionRequest>,
) -> Result<Json<AppVersionResponse>, ApiError> {
    let version = require_text(payload.version, "Version is required")?;

    let latest = latest_app_version(&state.db).await?;
    let result = latest.as_deref() == Some(version.as_str());
    let message = if result {
        "App is up to date"
    } else {
        "A newer version is available"
    };

    Ok(Json(AppVersionResponse {
        result,
        message: message.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use uuid::Uuid;

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn logout_without_header_is_401() {
        let state = AppState::fake();
        let err = logout(State(state), HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_without_token_is_401() {
        let state = AppState::fake();
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer".parse().unwrap(),
        );
        let err = logout(State(state), headers).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_blacklists_the_token_without_verifying_it() {
        let state = AppState::fake();
        // Not even a real JWT; logout revokes the raw string as-is.
        logout(State(state.clone()), bearer("opaque-string"))
            .await
            .expect("logout should succeed");
        assert!(state.tokens.is_revoked("opaque-string").await);

        // Second logout with the same token is a no-op, not an error.
        logout(State(state.clone()), bearer("opaque-string"))
            .await
            .expect("repeat logout should succeed");
        assert!(state.tokens.is_revoked("opaque-string").await);
    }

    #[tokio::test]
    async fn refresh_with_missing_fields_is_400() {
        let state = AppState::fake();
        let err = refresh_token(
            State(state),
            Json(RefreshRequest {
                user_id: Some(Uuid::new_v4()),
                old_refresh_token: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn refresh_with_no_stored_slot_is_403() {
        let state = AppState::fake();
        let err = refresh_token(
            State(state),
            Json(RefreshRequest {
                user_id: Some(Uuid::new_v4()),
                old_refresh_token: Some("anything".into()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn refresh_with_mismatched_token_is_403() {
        let state = AppState::fake();
        let user_id = Uuid::new_v4();
        state.tokens.store_refresh(user_id, "stored".into()).await;

        let err = refresh_token(
            State(state.clone()),
            Json(RefreshRequest {
                user_id: Some(user_id),
                old_refresh_token: Some("different".into()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
        // The stored slot is untouched by the failed attempt.
        assert_eq!(
            state.tokens.current_refresh(user_id).await.as_deref(),
            Some("stored")
        );
    }

    #[tokio::test]
    async fn refresh_with_unverifiable_stored_token_is_403() {
        let state = AppState::fake();
        let user_id = Uuid::new_v4();
        // Slot matches, but the token was never signed by us.
        state
            .tokens
            .store_refresh(user_id, "not-a-jwt".into())
            .await;

        let err = refresh_token(
            State(state),
            Json(RefreshRequest {
                user_id: Some(user_id),
                old_refresh_token: Some("not-a-jwt".into()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("tech@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
    }
}
