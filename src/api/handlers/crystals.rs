/// Crystal catalog handlers
use std::collections::BTreeMap;

use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use super::error_response;
use super::ApiError;
use super::AppState;
use crate::api::types::ApiResponse;
use crate::api::types::SearchQuery;
use crate::bazi::FiveElement;
use crate::models::CrystalRecord;

/// List the whole catalog (GET /api/crystals)
pub async fn list_crystals(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CrystalRecord>>>, ApiError> {
    let crystals = state.database.list_crystals().await?;
    Ok(Json(ApiResponse::success(crystals)))
}

/// Catalog entry by id (GET /api/crystals/:id)
pub async fn get_crystal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match state.database.get_crystal(id).await? {
        Some(crystal) => Ok(Json(ApiResponse::success(crystal)).into_response()),
        None => Ok(error_response(StatusCode::NOT_FOUND, "水晶不存在")),
    }
}

/// Filter by element (GET /api/crystals/element/:element)
///
/// Accepts the Chinese element name (木/火/土/金/水) or the English word.
pub async fn crystals_by_element(
    State(state): State<AppState>,
    Path(element): Path<String>,
) -> Result<Response, ApiError> {
    let parsed = FiveElement::from_chinese(&element).or_else(|| {
        match element.to_lowercase().as_str() {
            "wood" => Some(FiveElement::Wood),
            "fire" => Some(FiveElement::Fire),
            "earth" => Some(FiveElement::Earth),
            "metal" => Some(FiveElement::Metal),
            "water" => Some(FiveElement::Water),
            _ => None,
        }
    });

    let Some(parsed) = parsed else {
        return Ok(error_response(StatusCode::BAD_REQUEST, "无效的五行属性"));
    };

    let crystals = state.database.crystals_by_element(parsed).await?;
    Ok(Json(ApiResponse::success(crystals)).into_response())
}

/// Filter by healing property (GET /api/crystals/healing/:property)
pub async fn crystals_by_healing_property(
    State(state): State<AppState>,
    Path(property): Path<String>,
) -> Result<Json<ApiResponse<Vec<CrystalRecord>>>, ApiError> {
    let crystals = state
        .database
        .crystals_by_healing_property(&property)
        .await?;
    Ok(Json(ApiResponse::success(crystals)))
}

/// Keyword search (GET /api/crystals/search?q=)
pub async fn search_crystals(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    if params.q.trim().is_empty() {
        return Ok(error_response(StatusCode::BAD_REQUEST, "请提供搜索关键词"));
    }

    let crystals = state.database.search_crystals(&params.q).await?;
    Ok(Json(ApiResponse::success(crystals)).into_response())
}

/// Catalog statistics
#[derive(Debug, Serialize)]
pub struct CrystalStats {
    pub total: usize,
    pub by_element: BTreeMap<String, usize>,
    pub by_color: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
}

/// Category/color/element counts (GET /api/crystals/stats)
pub async fn crystal_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CrystalStats>>, ApiError> {
    let crystals = state.database.list_crystals().await?;

    let mut stats = CrystalStats {
        total: crystals.len(),
        by_element: BTreeMap::new(),
        by_color: BTreeMap::new(),
        by_category: BTreeMap::new(),
    };

    for crystal in &crystals {
        for element in &crystal.elements {
            *stats
                .by_element
                .entry(element.chinese().to_string())
                .or_insert(0) += 1;
        }
        if let Some(color) = &crystal.color {
            *stats.by_color.entry(color.clone()).or_insert(0) += 1;
        }
        if let Some(category) = &crystal.category {
            *stats.by_category.entry(category.clone()).or_insert(0) += 1;
        }
    }

    Ok(Json(ApiResponse::success(stats)))
}
