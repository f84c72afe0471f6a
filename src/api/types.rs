//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::models::User;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error body; `need_payment` is set when credits are exhausted.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_payment: Option<bool>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub prediction_credits: i64,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            prediction_credits: user.prediction_credits,
        }
    }
}

/// Registration / login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token verification response
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: UserResponse,
}

/// Crystal search query
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// Payment order creation request
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(default = "default_amount")]
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_amount() -> f64 {
    crate::payment::PACKAGE_PRICE
}

fn default_currency() -> String {
    "CNY".to_string()
}

/// Created payment order
#[derive(Debug, Serialize)]
pub struct PaymentOrderResponse {
    pub id: i64,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub payment_url: String,
    pub out_trade_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mock: Option<bool>,
}

/// Mock payment confirmation request
#[derive(Debug, Deserialize)]
pub struct MockPaymentRequest {
    pub payment_id: i64,
}
