//! Authentication Handlers

use axum::{Extension, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::{CurrentUser, password};
use crate::core::ServerState;
use crate::db::repository::user;
use crate::utils::validation::{
    MAX_NAME_LEN, validate_email, validate_password, validate_required_text,
};
use crate::utils::{AppError, AppResult};
use shared::models::{User, UserRole};

/// Registration payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// Login payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response with bearer token
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/register - create a member account
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    validate_required_text(&req.full_name, "full_name", MAX_NAME_LEN)?;

    if user::find_by_email(&state.pool, &req.email).await?.is_some() {
        return Err(AppError::conflict("Email already registered"));
    }

    let password_hash = password::hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

    let created = user::create(
        &state.pool,
        &req.email,
        &password_hash,
        &req.full_name,
        UserRole::Member,
    )
    .await?;

    tracing::info!(user_id = created.id, email = %created.email, "user registered");

    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/auth/login - verify credentials and issue a token
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = user::find_by_email(&state.pool, &req.email)
        .await?
        .ok_or_else(|| AppError::validation("Invalid email or password"))?;

    if !user.is_active {
        return Err(AppError::forbidden("Account has been disabled"));
    }

    let password_valid = password::verify_password(&req.password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;
    if !password_valid {
        return Err(AppError::validation("Invalid email or password"));
    }

    let token = state
        .jwt_service
        .generate_token(&user)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(
        user_id = user.id,
        email = %user.email,
        role = user.role.as_str(),
        "user logged in"
    );

    Ok(Json(LoginResponse { token, user }))
}

/// GET /api/auth/me - current authenticated user
pub async fn me(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<User>> {
    let user = user::find_by_id(&state.pool, current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(user))
}
