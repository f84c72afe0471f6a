/// Payment handlers
use axum::extract::Form;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::error_response;
use super::ApiError;
use super::AppState;
use super::AuthUser;
use crate::api::types::ApiResponse;
use crate::api::types::CreatePaymentRequest;
use crate::api::types::MockPaymentRequest;
use crate::api::types::PaymentOrderResponse;
use crate::errors::CrystalPathError;
use crate::models::PageQuery;
use crate::models::Payment;
use crate::payment::PageOrder;
use crate::payment::PACKAGE_CREDITS;
use crate::payment::PACKAGE_PRICE;

/// Create a payment order (POST /api/payments)
///
/// The gateway URL is built from the signed sorted parameters; if the
/// gateway client is not configured the order degrades to a mock payment
/// URL so the flow stays testable.
pub async fn create_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<Json<ApiResponse<PaymentOrderResponse>>, ApiError> {
    if (req.amount - PACKAGE_PRICE).abs() > f64::EPSILON {
        return Err(
            CrystalPathError::InvalidInput("只支持支付5元购买2次预测机会".to_string()).into(),
        );
    }

    let payment = state
        .database
        .create_payment(auth.user_id, req.amount, &req.currency, PACKAGE_CREDITS)
        .await?;

    let out_trade_no = format!(
        "{}_CRYS{}{}",
        payment.id,
        Utc::now().timestamp_millis(),
        auth.user_id
    );

    let order = PageOrder {
        out_trade_no: out_trade_no.clone(),
        total_amount: format!("{:.2}", req.amount),
        subject: "水晶疗愈预测服务".to_string(),
        body: "购买2次八字水晶疗愈预测服务".to_string(),
        return_url: format!("{}/payment/success", state.config.server.frontend_url),
        notify_url: format!("{}/api/payments/alipay/notify", state.config.server.base_url),
    };

    let (payment_url, is_mock) = match state.payment.create_page_pay_url(&order) {
        Ok(url) => (url, None),
        Err(e) => {
            warn!("Gateway order creation failed, returning mock URL: {e}");
            (
                format!(
                    "{}/payment/mock?id={}&amount={}",
                    state.config.server.frontend_url, payment.id, req.amount
                ),
                Some(true),
            )
        }
    };

    info!("Payment order {} created for user {}", payment.id, auth.user_id);

    Ok(Json(ApiResponse::success(PaymentOrderResponse {
        id: payment.id,
        amount: req.amount,
        currency: req.currency,
        status: "pending".to_string(),
        payment_url,
        out_trade_no,
        is_mock,
    })))
}

#[derive(Debug, Serialize)]
pub struct MockPaymentResponse {
    pub id: i64,
    pub status: String,
    pub credits_added: i64,
}

/// Confirm a mock payment (POST /api/payments/mock-success)
pub async fn mock_payment_success(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<MockPaymentRequest>,
) -> Result<Response, ApiError> {
    let payment = state.database.get_payment(req.payment_id).await?;
    let Some(payment) = payment.filter(|p| p.user_id == auth.user_id) else {
        return Ok(error_response(StatusCode::NOT_FOUND, "支付记录不存在"));
    };

    if payment.status != "pending" {
        return Ok(error_response(StatusCode::BAD_REQUEST, "支付已处理"));
    }

    let transaction_id = format!("mock_{}", Utc::now().timestamp_millis());
    state
        .database
        .complete_payment(payment.id, &transaction_id)
        .await?;

    info!("Mock payment {} confirmed for user {}", payment.id, auth.user_id);

    Ok(Json(ApiResponse::success(MockPaymentResponse {
        id: payment.id,
        status: "success".to_string(),
        credits_added: payment.credits_added,
    }))
    .into_response())
}

/// Gateway webhook (POST /api/payments/alipay/notify)
///
/// Form-encoded body, plain-text `success`/`fail` reply as the gateway
/// protocol requires. Success notifications are idempotent.
pub async fn alipay_notify(
    State(state): State<AppState>,
    Form(params): Form<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    if !state.payment.verify_notification(&params) {
        error!("Webhook signature verification failed");
        return (StatusCode::BAD_REQUEST, "fail");
    }

    let trade_status = params.get("trade_status").map(String::as_str);
    let trade_no = params.get("trade_no").cloned().unwrap_or_default();

    // The local payment id is the prefix of out_trade_no
    let payment_id = params
        .get("out_trade_no")
        .and_then(|n| n.split('_').next())
        .and_then(|id| id.parse::<i64>().ok());

    let Some(payment_id) = payment_id else {
        error!("Webhook without parsable out_trade_no");
        return (StatusCode::BAD_REQUEST, "fail");
    };

    let result = match trade_status {
        Some("TRADE_SUCCESS" | "TRADE_FINISHED") => {
            match state.database.complete_payment(payment_id, &trade_no).await {
                Ok(true) => {
                    info!("Payment {payment_id} settled via webhook");
                    Ok(())
                }
                Ok(false) => Ok(()), // replay, already settled
                Err(e) => Err(e),
            }
        }
        Some("TRADE_CLOSED") => state
            .database
            .mark_payment_failed(payment_id, Some(&trade_no))
            .await,
        _ => Ok(()),
    };

    match result {
        Ok(()) => (StatusCode::OK, "success"),
        Err(e) => {
            error!("Webhook handling failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "fail")
        }
    }
}

/// Payment status (GET /api/payments/:id)
pub async fn get_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let payment = state.database.get_payment(id).await?;
    match payment.filter(|p| p.user_id == auth.user_id) {
        Some(payment) => Ok(Json(ApiResponse::success(payment)).into_response()),
        None => Ok(error_response(StatusCode::NOT_FOUND, "支付记录不存在")),
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    pub payments: Vec<Payment>,
    pub page: i64,
    pub limit: i64,
}

/// Payment history (GET /api/payments)
pub async fn list_payments(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<PaymentListResponse>>, ApiError> {
    let payments = state
        .database
        .list_payments(auth.user_id, page.limit, page.offset())
        .await?;

    Ok(Json(ApiResponse::success(PaymentListResponse {
        payments,
        page: page.page,
        limit: page.limit,
    })))
}
