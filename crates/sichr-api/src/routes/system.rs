//! 시스템 엔드포인트: 헬스 체크, CSRF 토큰, PayPal 공개 설정.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::state::AppState;

/// 헬스 체크 응답
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    /// 항상 "ok"
    pub status: String,
    pub version: String,
    /// DB 연결 가능 여부
    pub database: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub success: bool,
    pub csrf_token: String,
}

/// 프론트엔드용 PayPal 설정 (비밀값 제외)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayPalConfigResponse {
    pub success: bool,
    pub client_id: String,
    pub currency: String,
    /// sandbox / live
    pub environment: String,
}

/// 헬스 체크
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "서버 정상", body = HealthResponse)),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match &state.db_pool {
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "DB 헬스 체크 실패");
                false
            }
        },
        None => false,
    };

    Json(HealthResponse {
        success: true,
        status: "ok".to_string(),
        version: state.version.clone(),
        database,
        timestamp: Utc::now(),
    })
}

/// CSRF 토큰 발급 (32바이트 hex)
#[utoipa::path(
    get,
    path = "/api/csrf-token",
    responses((status = 200, description = "토큰", body = CsrfTokenResponse)),
    tag = "system"
)]
pub async fn csrf_token() -> Json<CsrfTokenResponse> {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);

    Json(CsrfTokenResponse {
        success: true,
        csrf_token: hex::encode(bytes),
    })
}

/// PayPal 공개 설정
#[utoipa::path(
    get,
    path = "/api/paypal-config",
    responses((status = 200, description = "PayPal client id와 통화", body = PayPalConfigResponse)),
    tag = "payments"
)]
pub async fn paypal_config(State(state): State<Arc<AppState>>) -> Json<PayPalConfigResponse> {
    let config = state.paypal.config();
    Json(PayPalConfigResponse {
        success: true,
        client_id: config.client_id.clone(),
        currency: config.currency.clone(),
        environment: config.environment.to_string(),
    })
}

pub fn system_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/csrf-token", get(csrf_token))
        .route("/paypal-config", get(paypal_config))
        .route("/paypal/config", get(paypal_config))
}
