use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::bazi::FiveElement;

/// Registered user (latest state)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub prediction_credits: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Create user request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Crystal catalog row as stored (JSON list columns still serialized)
#[derive(Debug, Clone, FromRow)]
pub struct CrystalRow {
    pub id: i64,
    pub english_name: String,
    pub chinese_name: String,
    pub category: Option<String>,
    pub color: Option<String>,
    pub elements: String,
    pub healing_properties: String,
    pub suitable_for: String,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
}

/// Crystal catalog entity with JSON columns decoded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrystalRecord {
    pub id: i64,
    pub english_name: String,
    pub chinese_name: String,
    pub category: Option<String>,
    pub color: Option<String>,
    pub elements: Vec<FiveElement>,
    pub healing_properties: Vec<String>,
    pub suitable_for: Vec<String>,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
}

impl TryFrom<CrystalRow> for CrystalRecord {
    type Error = serde_json::Error;

    fn try_from(row: CrystalRow) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            english_name: row.english_name,
            chinese_name: row.chinese_name,
            category: row.category,
            color: row.color,
            elements: serde_json::from_str(&row.elements)?,
            healing_properties: serde_json::from_str(&row.healing_properties)?,
            suitable_for: serde_json::from_str(&row.suitable_for)?,
            image_url: row.image_url,
            price: row.price,
            description: row.description,
        })
    }
}

/// Prediction row as stored; analysis columns are opaque JSON blobs
#[derive(Debug, Clone, FromRow)]
pub struct PredictionRow {
    pub id: i64,
    pub user_id: i64,
    pub birth_date: String,
    pub birth_time: String,
    pub birth_location: String,
    pub chart: String,
    pub fortune: String,
    pub recommendations: String,
    pub narrative: String,
    pub created_at: NaiveDateTime,
}

/// Payment record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub credits_added: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Create prediction request payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePredictionRequest {
    pub birth_date: String,
    pub birth_time: String,
    pub birth_location: String,
}

/// Pagination parameters shared by list endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_limit() -> i64 {
    10
}

impl PageQuery {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit
    }
}
