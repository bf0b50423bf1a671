//! PayPal 결제 API 라우트
//!
//! 주문 생성 → 구매자 승인(PayPal 화면) → 캡처 순서로 진행됩니다.
//! 트랜잭션 기록은 DB가 있을 때만 남기며, 캡처 자체는 DB 없이도 동작합니다.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sichr_core::{PaymentStatus, TransactionStatus};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    auth::AuthUser,
    error::{bad_request, db_error, forbidden, not_found, reject, ApiError, ApiErrorResponse, ApiResult},
    extract::ValidatedJson,
    repository::{PaymentRepository, ViewingRequestRepository},
    services::{CreateOrder, PayPalError},
    state::AppState,
};

// ==================== 타입 정의 ====================

fn currency_code(value: &str) -> Result<(), ValidationError> {
    if value.len() == 3 && value.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(ValidationError::new("currency_code"))
    }
}

/// PayPal 주문 ID 형식 (영숫자와 `-`, 최대 64자)
fn paypal_order_id(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty()
        && value.len() <= 64
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        Ok(())
    } else {
        Err(ValidationError::new("paypal_order_id"))
    }
}

/// 주문 생성 요청
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[serde(alias = "viewing_request_id")]
    pub viewing_request_id: Option<Uuid>,
    /// 미지정 시 열람 수수료
    pub amount: Option<Decimal>,
    #[validate(custom(function = "currency_code"))]
    pub currency: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "return_url")]
    pub return_url: Option<String>,
    #[serde(alias = "cancel_url")]
    pub cancel_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub success: bool,
    /// PayPal 주문 ID
    pub payment_id: String,
    pub approval_url: Option<String>,
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
}

/// 캡처 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutePaymentRequest {
    #[serde(alias = "payment_id", alias = "orderId")]
    #[validate(custom(function = "paypal_order_id"))]
    pub payment_id: String,
    #[serde(alias = "payer_id", alias = "PayerID")]
    pub payer_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutePaymentResponse {
    pub success: bool,
    /// "completed"
    pub status: String,
    pub payment_id: String,
    pub payer_id: Option<String>,
}

// ==================== 헬퍼 ====================

fn paypal_error(err: PayPalError) -> ApiErrorResponse {
    match err {
        PayPalError::NotConfigured => reject(
            StatusCode::SERVICE_UNAVAILABLE,
            "PAYPAL_NOT_CONFIGURED",
            err.to_string(),
        ),
        other => {
            warn!(error = %other, "PayPal 호출 실패");
            reject(StatusCode::BAD_GATEWAY, "PAYPAL_ERROR", other.to_string())
        }
    }
}

// ==================== 핸들러 ====================

/// PayPal 주문 생성
#[utoipa::path(
    post,
    path = "/api/paypal/create",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "주문 생성", body = CreatePaymentResponse),
        (status = 400, description = "입력값 오류", body = ApiError),
        (status = 502, description = "PayPal 오류", body = ApiError),
        (status = 503, description = "PayPal 미설정", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreatePaymentRequest>,
) -> ApiResult<Json<CreatePaymentResponse>> {
    let mut amount = req.amount.unwrap_or(state.config.viewing_fee);

    // 열람 요청 결제는 요청 당사자(임차인)만 가능하고 금액은 요청에 기록된 값을 따름
    if let Some(viewing_request_id) = req.viewing_request_id {
        if let Some(db_pool) = &state.db_pool {
            let record = ViewingRequestRepository::find_by_id(db_pool, viewing_request_id)
                .await
                .map_err(|e| db_error("열람 요청 조회 실패", e))?
                .ok_or_else(|| not_found("열람 요청을 찾을 수 없습니다"))?;
            if record.tenant_id != auth.id {
                return Err(forbidden("본인 열람 요청만 결제할 수 있습니다"));
            }
            if record.payment_status.parse::<PaymentStatus>() == Ok(PaymentStatus::Paid) {
                return Err(bad_request("이미 결제된 열람 요청입니다"));
            }
            amount = record.payment_amount.unwrap_or(amount);
        }
    }

    if amount <= Decimal::ZERO {
        return Err(bad_request("결제 금액은 0보다 커야 합니다"));
    }

    let currency = req
        .currency
        .map(|c| c.to_uppercase())
        .unwrap_or_else(|| state.paypal.config().currency.clone());

    let order = CreateOrder {
        amount,
        currency: currency.clone(),
        reference_id: req.viewing_request_id.map(|id| id.to_string()),
        description: req
            .description
            .unwrap_or_else(|| "SichrPlace viewing fee".to_string()),
        return_url: req.return_url,
        cancel_url: req.cancel_url,
    };

    let created = state.paypal.create_order(&order).await.map_err(paypal_error)?;

    if let Some(db_pool) = &state.db_pool {
        PaymentRepository::create(db_pool, auth.id, req.viewing_request_id, &created.id, amount, &currency)
            .await
            .map_err(|e| db_error("결제 기록 실패", e))?;

        if let Some(viewing_request_id) = req.viewing_request_id {
            ViewingRequestRepository::update_payment_status(db_pool, viewing_request_id, PaymentStatus::Pending)
                .await
                .map_err(|e| db_error("결제 상태 변경 실패", e))?;
        }
    }

    Ok(Json(CreatePaymentResponse {
        success: true,
        payment_id: created.id,
        approval_url: created.approval_url,
        status: created.status,
        amount,
        currency,
    }))
}

/// PayPal 주문 캡처
///
/// 구매자가 승인하고 돌아온 뒤 호출됩니다. `COMPLETED`가 아니면 402.
#[utoipa::path(
    post,
    path = "/api/paypal/execute",
    request_body = ExecutePaymentRequest,
    responses(
        (status = 200, description = "결제 완료", body = ExecutePaymentResponse),
        (status = 402, description = "결제 미완료", body = ApiError),
        (status = 502, description = "PayPal 오류", body = ApiError)
    ),
    tag = "payments"
)]
pub async fn execute_payment(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<ExecutePaymentRequest>,
) -> ApiResult<Json<ExecutePaymentResponse>> {
    let capture = state
        .paypal
        .capture_order(&req.payment_id)
        .await
        .map_err(paypal_error)?;

    let status = TransactionStatus::from_paypal(&capture.status);
    let payer_id = capture.payer_id.clone().or(req.payer_id);

    if let Some(db_pool) = &state.db_pool {
        let known = PaymentRepository::find_by_order_id(db_pool, &req.payment_id)
            .await
            .map_err(|e| db_error("결제 조회 실패", e))?;

        match known {
            Some(transaction) => {
                PaymentRepository::record_capture(
                    db_pool,
                    &req.payment_id,
                    status,
                    payer_id.as_deref(),
                    &capture.raw,
                )
                .await
                .map_err(|e| db_error("결제 기록 실패", e))?;

                if let (TransactionStatus::Completed, Some(viewing_request_id)) =
                    (status, transaction.viewing_request_id)
                {
                    ViewingRequestRepository::update_payment_status(db_pool, viewing_request_id, PaymentStatus::Paid)
                        .await
                        .map_err(|e| db_error("결제 상태 변경 실패", e))?;
                }
            }
            None => warn!(order_id = %req.payment_id, "기록되지 않은 PayPal 주문 캡처"),
        }
    }

    if status != TransactionStatus::Completed {
        return Err(reject(
            StatusCode::PAYMENT_REQUIRED,
            "PAYMENT_NOT_COMPLETED",
            format!("결제가 완료되지 않았습니다 (상태: {})", capture.status),
        ));
    }

    info!(order_id = %req.payment_id, "결제 완료");

    Ok(Json(ExecutePaymentResponse {
        success: true,
        status: TransactionStatus::Completed.to_string(),
        payment_id: capture.order_id,
        payer_id,
    }))
}

// ==================== 라우터 ====================

pub fn paypal_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/paypal/create", post(create_payment))
        .route("/paypal/execute", post(execute_payment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_request_aliases() {
        let camel: ExecutePaymentRequest =
            serde_json::from_str(r#"{"paymentId": "5O190127TN364715T", "payerId": "FSMVU44LF3YUS"}"#).unwrap();
        assert_eq!(camel.payment_id, "5O190127TN364715T");
        assert_eq!(camel.payer_id.as_deref(), Some("FSMVU44LF3YUS"));

        let snake: ExecutePaymentRequest =
            serde_json::from_str(r#"{"payment_id": "ORDER-1"}"#).unwrap();
        assert_eq!(snake.payment_id, "ORDER-1");
        assert!(snake.payer_id.is_none());
    }

    #[test]
    fn test_order_id_validation() {
        for id in ["5O190127TN364715T", "ORDER-1", "abc-123"] {
            let req = ExecutePaymentRequest {
                payment_id: id.to_string(),
                payer_id: None,
            };
            assert!(req.validate().is_ok(), "{}", id);
        }

        let too_long = "A".repeat(65);
        for id in ["", "../x#", "A/B", "ORDER 1", "X%2F", too_long.as_str()] {
            let req = ExecutePaymentRequest {
                payment_id: id.to_string(),
                payer_id: None,
            };
            assert!(req.validate().is_err(), "{}", id);
        }
    }

    #[test]
    fn test_currency_validation() {
        let req = CreatePaymentRequest {
            currency: Some("EURO".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = CreatePaymentRequest {
            currency: Some("eur".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }
}
