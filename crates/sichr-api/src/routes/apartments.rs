//! 매물 API 라우트

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    auth::AuthUser,
    error::{db_error, db_not_configured, forbidden, not_found, ApiError, ApiResult},
    extract::ValidatedJson,
    repository::{ApartmentFilter, ApartmentRecord, ApartmentRepository, NewApartment},
    state::AppState,
};

// ==================== 타입 정의 ====================

fn positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}

fn default_rooms() -> i32 {
    1
}

/// 매물 등록 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UploadApartmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    pub address: Option<String>,
    /// 월세
    #[serde(alias = "price")]
    #[validate(custom(function = "positive_decimal"))]
    pub rent: Decimal,
    pub deposit: Option<Decimal>,
    #[serde(default = "default_rooms")]
    #[validate(range(min = 1, max = 50))]
    pub rooms: i32,
    #[serde(alias = "size")]
    pub size_sqm: Option<Decimal>,
    #[serde(alias = "availableFrom")]
    pub available_from: Option<NaiveDate>,
}

fn default_limit() -> i64 {
    20
}

/// 매물 목록 쿼리
#[derive(Debug, Deserialize, IntoParams)]
pub struct ApartmentQuery {
    /// 도시 (부분 일치)
    pub city: Option<String>,
    /// 최대 월세
    pub max_rent: Option<Decimal>,
    /// 최소 방 개수
    pub min_rooms: Option<i32>,
    /// 조회 개수 (기본 20, 최대 100)
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApartmentResponse {
    pub success: bool,
    pub apartment: ApartmentRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApartmentListResponse {
    pub success: bool,
    pub apartments: Vec<ApartmentRecord>,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub success: bool,
    pub message: String,
}

// ==================== 핸들러 ====================

/// 매물 등록 (임대인/관리자)
#[utoipa::path(
    post,
    path = "/api/upload-apartment",
    request_body = UploadApartmentRequest,
    responses(
        (status = 201, description = "등록 완료", body = ApartmentResponse),
        (status = 400, description = "입력값 오류", body = ApiError),
        (status = 401, description = "토큰 없음", body = ApiError),
        (status = 403, description = "권한 없음", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "apartments"
)]
pub async fn upload_apartment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<UploadApartmentRequest>,
) -> ApiResult<(StatusCode, Json<ApartmentResponse>)> {
    if !auth.role.can_list_apartments() {
        return Err(forbidden("임대인만 매물을 등록할 수 있습니다"));
    }
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let apartment = NewApartment {
        title: req.title.trim().to_string(),
        description: req.description,
        city: req.city.trim().to_string(),
        address: req.address,
        rent: req.rent,
        deposit: req.deposit,
        rooms: req.rooms,
        size_sqm: req.size_sqm,
        available_from: req.available_from,
    };

    let apartment = ApartmentRepository::create(db_pool, auth.id, &apartment)
        .await
        .map_err(|e| db_error("매물 등록 실패", e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApartmentResponse {
            success: true,
            apartment,
        }),
    ))
}

/// 매물 목록
#[utoipa::path(
    get,
    path = "/api/apartments",
    params(ApartmentQuery),
    responses(
        (status = 200, description = "매물 목록", body = ApartmentListResponse),
        (status = 500, description = "서버 오류", body = ApiError)
    ),
    tag = "apartments"
)]
pub async fn list_apartments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ApartmentQuery>,
) -> ApiResult<Json<ApartmentListResponse>> {
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let filter = ApartmentFilter {
        city: query.city.filter(|c| !c.trim().is_empty()),
        max_rent: query.max_rent,
        min_rooms: query.min_rooms,
        limit: query.limit.clamp(1, 100),
        offset: query.offset.max(0),
    };

    let apartments = ApartmentRepository::list(db_pool, &filter)
        .await
        .map_err(|e| db_error("매물 조회 실패", e))?;

    debug!(count = apartments.len(), "매물 목록 조회");

    Ok(Json(ApartmentListResponse {
        success: true,
        count: apartments.len(),
        apartments,
    }))
}

/// 매물 상세
#[utoipa::path(
    get,
    path = "/api/apartments/{id}",
    params(("id" = Uuid, Path, description = "매물 ID")),
    responses(
        (status = 200, description = "매물", body = ApartmentResponse),
        (status = 404, description = "매물 없음", body = ApiError)
    ),
    tag = "apartments"
)]
pub async fn get_apartment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApartmentResponse>> {
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let apartment = ApartmentRepository::find_by_id(db_pool, id)
        .await
        .map_err(|e| db_error("매물 조회 실패", e))?
        .ok_or_else(|| not_found("매물을 찾을 수 없습니다"))?;

    Ok(Json(ApartmentResponse {
        success: true,
        apartment,
    }))
}

/// 매물 삭제 (소유자/관리자)
#[utoipa::path(
    delete,
    path = "/api/apartments/{id}",
    params(("id" = Uuid, Path, description = "매물 ID")),
    responses(
        (status = 200, description = "삭제 완료", body = DeletedResponse),
        (status = 403, description = "권한 없음", body = ApiError),
        (status = 404, description = "매물 없음", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "apartments"
)]
pub async fn delete_apartment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeletedResponse>> {
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let apartment = ApartmentRepository::find_by_id(db_pool, id)
        .await
        .map_err(|e| db_error("매물 조회 실패", e))?
        .ok_or_else(|| not_found("매물을 찾을 수 없습니다"))?;

    if apartment.owner_id != auth.id && !auth.role.is_admin() {
        return Err(forbidden("본인 매물만 삭제할 수 있습니다"));
    }

    ApartmentRepository::delete(db_pool, id)
        .await
        .map_err(|e| db_error("매물 삭제 실패", e))?;

    Ok(Json(DeletedResponse {
        success: true,
        message: "매물이 삭제되었습니다".to_string(),
    }))
}

// ==================== 라우터 ====================

pub fn apartments_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload-apartment", post(upload_apartment))
        .route("/apartments", get(list_apartments))
        .route("/apartments/{id}", get(get_apartment).delete(delete_apartment))
}
