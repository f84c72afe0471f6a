/// API request handlers
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use tracing::error;

use crate::api::types::ApiResponse;
use crate::api::types::ErrorResponse;
use crate::api::types::HealthResponse;
use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::database::Database;
use crate::errors::CrystalPathError;
use crate::payment::AlipayClient;
use crate::prediction::PredictionService;

// Re-export sub-modules
pub mod auth;
pub mod crystals;
pub mod payments;
pub mod predictions;

pub use auth::*;
pub use crystals::*;
pub use payments::*;
pub use predictions::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<Database>,
    pub auth: Arc<AuthService>,
    pub payment: Arc<AlipayClient>,
    pub prediction: Arc<PredictionService>,
    pub config: Arc<AppConfig>,
}

/// Domain error mapped to an HTTP response.
pub struct ApiError(pub CrystalPathError);

impl From<CrystalPathError> for ApiError {
    fn from(e: CrystalPathError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, need_payment) = match &self.0 {
            CrystalPathError::InsufficientCredits => (
                StatusCode::PAYMENT_REQUIRED,
                "预测次数不足，请购买更多次数".to_string(),
                Some(true),
            ),
            CrystalPathError::ChartDerivation(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone(), None)
            }
            CrystalPathError::EmailTaken(_) => {
                (StatusCode::BAD_REQUEST, "该邮箱已被注册".to_string(), None)
            }
            CrystalPathError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "邮箱或密码错误".to_string(), None)
            }
            CrystalPathError::Auth(_) => (StatusCode::FORBIDDEN, "Token无效".to_string(), None),
            CrystalPathError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            CrystalPathError::UserNotFound(_) => {
                (StatusCode::NOT_FOUND, "用户不存在".to_string(), None)
            }
            CrystalPathError::Payment(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            other => {
                error!("Internal error: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "服务器内部错误".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            need_payment,
        };

        (status, Json(body)).into_response()
    }
}

/// Shorthand for a plain error response with an explicit status.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: message.to_string(),
        need_payment: None,
    };
    (status, Json(body)).into_response()
}

/// Authenticated user extracted from a Bearer token. The token is verified
/// against the signing secret and the account is checked to still exist.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "));

        let Some(token) = token else {
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                "访问被拒绝，缺少认证Token",
            ));
        };

        let claims = state
            .auth
            .verify_token(token)
            .map_err(|_| error_response(StatusCode::FORBIDDEN, "Token无效"))?;

        let exists = state
            .database
            .get_user_by_id(claims.user_id)
            .await
            .map_err(|e| {
                error!("Auth lookup failed: {e}");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "服务器错误")
            })?;

        if exists.is_none() {
            return Err(error_response(StatusCode::UNAUTHORIZED, "用户不存在"));
        }

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
