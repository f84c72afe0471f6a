/// Authentication handlers
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use super::ApiError;
use super::AppState;
use super::AuthUser;
use crate::api::types::ApiResponse;
use crate::api::types::AuthResponse;
use crate::api::types::LoginRequest;
use crate::api::types::UserResponse;
use crate::api::types::VerifyResponse;
use crate::errors::CrystalPathError;
use crate::models::CreateUserRequest;

/// Register a new account (POST /api/auth/register)
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(CrystalPathError::InvalidInput("邮箱和密码不能为空".to_string()).into());
    }

    if state.database.get_user_by_email(&req.email).await?.is_some() {
        return Err(CrystalPathError::EmailTaken(req.email).into());
    }

    let password_hash = state.auth.hash_password(&req.password)?;
    let user = state
        .database
        .create_user(&req.email, &password_hash, req.full_name.as_deref())
        .await?;

    let token = state.auth.issue_token(&user)?;
    info!("Registered user {} ({})", user.id, user.email);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthResponse {
            user: UserResponse::from(&user),
            token,
        })),
    ))
}

/// Log in (POST /api/auth/login)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(CrystalPathError::InvalidCredentials.into());
    }

    let user = state
        .database
        .get_user_by_email(&req.email)
        .await?
        .ok_or(CrystalPathError::InvalidCredentials)?;

    if !state.auth.verify_password(&req.password, &user.password_hash)? {
        return Err(CrystalPathError::InvalidCredentials.into());
    }

    let token = state.auth.issue_token(&user)?;
    info!("User {} logged in", user.id);

    Ok(Json(ApiResponse::success(AuthResponse {
        user: UserResponse::from(&user),
        token,
    })))
}

/// Current account details (GET /api/auth/me)
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state
        .database
        .get_user_by_id(auth.user_id)
        .await?
        .ok_or(CrystalPathError::UserNotFound(auth.user_id))?;

    Ok(Json(ApiResponse::success(UserResponse::from(&user))))
}

/// Token validity check (GET /api/auth/verify)
pub async fn verify(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<VerifyResponse>>, ApiError> {
    let user = state
        .database
        .get_user_by_id(auth.user_id)
        .await?
        .ok_or(CrystalPathError::UserNotFound(auth.user_id))?;

    Ok(Json(ApiResponse::success(VerifyResponse {
        valid: true,
        user: UserResponse::from(&user),
    })))
}
