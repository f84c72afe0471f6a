/// Prediction handlers
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tracing::info;

use super::error_response;
use super::ApiError;
use super::AppState;
use super::AuthUser;
use crate::api::types::ApiResponse;
use crate::errors::CrystalPathError;
use crate::models::CreatePredictionRequest;
use crate::models::PageQuery;
use crate::prediction::PredictionOutcome;
use crate::prediction::PredictionRecord;

#[derive(Debug, Serialize)]
pub struct CreatePredictionResponse {
    pub message: String,
    pub prediction: PredictionOutcome,
    pub remaining_predictions: i64,
}

/// Run the prediction pipeline (POST /api/predictions)
pub async fn create_prediction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreatePredictionRequest>,
) -> Result<Json<ApiResponse<CreatePredictionResponse>>, ApiError> {
    if req.birth_date.trim().is_empty()
        || req.birth_time.trim().is_empty()
        || req.birth_location.trim().is_empty()
    {
        return Err(CrystalPathError::InvalidInput("请提供完整的出生信息".to_string()).into());
    }

    let user = state
        .database
        .get_user_by_id(auth.user_id)
        .await?
        .ok_or(CrystalPathError::UserNotFound(auth.user_id))?;

    info!("POST /api/predictions for user {}", user.id);

    let outcome = state.prediction.create(&user, &req).await?;
    let remaining = outcome.remaining_credits;

    Ok(Json(ApiResponse::success(CreatePredictionResponse {
        message: "预测生成成功".to_string(),
        prediction: outcome,
        remaining_predictions: remaining,
    })))
}

#[derive(Debug, Serialize)]
pub struct PredictionListResponse {
    pub predictions: Vec<PredictionRecord>,
    pub page: i64,
    pub limit: i64,
}

/// Prediction history, newest first (GET /api/predictions)
pub async fn list_predictions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<PredictionListResponse>>, ApiError> {
    let predictions = state
        .prediction
        .list(auth.user_id, page.limit, page.offset())
        .await?;

    Ok(Json(ApiResponse::success(PredictionListResponse {
        predictions,
        page: page.page,
        limit: page.limit,
    })))
}

/// Single prediction, scoped to its owner (GET /api/predictions/:id)
pub async fn get_prediction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match state.prediction.get(id, auth.user_id).await? {
        Some(prediction) => Ok(Json(ApiResponse::success(prediction)).into_response()),
        None => Ok(error_response(StatusCode::NOT_FOUND, "预测记录不存在")),
    }
}
