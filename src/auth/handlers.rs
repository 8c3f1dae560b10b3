use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
            RegisteredResponse, ResetPasswordRequest, TokenResponse, UpdatePasswordRequest,
            UpdateUsernameRequest,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::User,
        services::{generate_otp, is_valid_email, is_valid_password, is_valid_username, otp_expiry},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:id/username", put(update_username))
        .route("/users/:id/password", put(update_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("invalid email"));
    }
    if !is_valid_username(&payload.username) {
        warn!(username = %payload.username, "invalid username");
        return Err(ApiError::validation(
            "username must be 3-30 alphanumeric characters",
        ));
    }
    if !is_valid_password(&payload.password) {
        warn!("password too short");
        return Err(ApiError::validation("password must be at least 8 characters"));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::conflict("email already registered"));
    }
    if User::find_by_username(&state.db, &payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already taken");
        return Err(ApiError::conflict("username already taken"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.username, &payload.email, &hash).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse { user_id: user.id }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::validation("invalid email"));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::auth("invalid credentials")
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::auth("invalid credentials"));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "forgot-password unknown email");
            ApiError::not_found("no account with that email")
        })?;

    let otp = generate_otp(&mut rand::thread_rng());
    let expires_at = otp_expiry(state.config.otp_ttl_minutes);
    User::set_otp(&state.db, user.id, &otp, expires_at).await?;
    state.mailer.send_otp(&user.email, &otp).await?;

    info!(user_id = %user.id, "otp issued");
    Ok(Json(MessageResponse {
        message: "OTP sent to your email",
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::not_found("no account with that email"))?;

    let stored = user
        .otp_code
        .as_deref()
        .ok_or_else(|| ApiError::validation("invalid or expired OTP"))?;
    let expires_at = user
        .otp_expires_at
        .ok_or_else(|| ApiError::validation("invalid or expired OTP"))?;

    if stored != payload.otp || expires_at < OffsetDateTime::now_utc() {
        warn!(user_id = %user.id, "otp mismatch or expired");
        return Err(ApiError::validation("invalid or expired OTP"));
    }

    if !is_valid_password(&payload.new_password) {
        return Err(ApiError::validation("password must be at least 8 characters"));
    }

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, user.id, &hash).await?;
    User::clear_otp(&state.db, user.id).await?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(MessageResponse {
        message: "password reset successfully",
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_username(
    State(state): State<AppState>,
    AuthUser(auth_id): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUsernameRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if auth_id != user_id {
        return Err(ApiError::auth("token does not match user"));
    }
    if !is_valid_username(&payload.username) {
        return Err(ApiError::validation(
            "username must be 3-30 alphanumeric characters",
        ));
    }

    if let Some(existing) = User::find_by_username(&state.db, &payload.username).await? {
        if existing.id != user_id {
            return Err(ApiError::conflict("username already taken"));
        }
    }

    if !User::update_username(&state.db, user_id, &payload.username).await? {
        return Err(ApiError::not_found("user not found"));
    }

    info!(%user_id, "username updated");
    Ok(Json(MessageResponse {
        message: "username updated",
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(auth_id): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if auth_id != user_id {
        return Err(ApiError::auth("token does not match user"));
    }

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(%user_id, "current password mismatch");
        return Err(ApiError::auth("invalid credentials"));
    }
    if !is_valid_password(&payload.new_password) {
        return Err(ApiError::validation("password must be at least 8 characters"));
    }

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, user_id, &hash).await?;

    info!(%user_id, "password updated");
    Ok(Json(MessageResponse {
        message: "password updated",
    }))
}
