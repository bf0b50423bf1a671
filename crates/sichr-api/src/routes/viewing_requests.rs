//! 열람 요청 API 라우트
//!
//! 임차인이 요청을 만들고, 임대인이 승인/거절/완료 처리합니다.
//! 상태 변경은 [`ViewingStatus::transition`]의 전이 표와 당사자 권한을 따릅니다.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sichr_core::{TransitionError, ViewingActor, ViewingStatus};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::{
        bad_request, conflict, db_error, db_not_configured, forbidden, not_found, ApiError,
        ApiResult,
    },
    extract::ValidatedJson,
    repository::{
        ApartmentRepository, NewViewingRequest, UserRepository, ViewingRequestRecord,
        ViewingRequestRepository,
    },
    services::MailMessage,
    state::AppState,
};

// ==================== 타입 정의 ====================

/// 열람 요청 생성
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateViewingRequest {
    #[serde(alias = "apartmentId")]
    pub apartment_id: Uuid,
    #[serde(alias = "requestedDate")]
    pub requested_date: DateTime<Utc>,
    #[serde(alias = "alternativeDate")]
    pub alternative_date: Option<DateTime<Utc>>,
    #[validate(length(max = 5000))]
    pub message: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
}

/// 상태 변경 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    /// approved / rejected / cancelled / completed
    pub status: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ViewingRequestQuery {
    /// 상태 필터
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ViewingRequestResponse {
    pub success: bool,
    pub viewing_request: ViewingRequestRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ViewingRequestListResponse {
    pub success: bool,
    pub viewing_requests: Vec<ViewingRequestRecord>,
    pub count: usize,
}

// ==================== 헬퍼 ====================

/// 요청에서 호출자의 당사자 역할 결정
fn actor_for(auth: &AuthUser, record: &ViewingRequestRecord) -> Option<ViewingActor> {
    if auth.role.is_admin() {
        Some(ViewingActor::Admin)
    } else if record.landlord_id == auth.id {
        Some(ViewingActor::Landlord)
    } else if record.tenant_id == auth.id {
        Some(ViewingActor::Tenant)
    } else {
        None
    }
}

// ==================== 핸들러 ====================

/// 열람 요청 생성
#[utoipa::path(
    post,
    path = "/api/viewing-request",
    request_body = CreateViewingRequest,
    responses(
        (status = 201, description = "요청 생성", body = ViewingRequestResponse),
        (status = 400, description = "입력값 오류", body = ApiError),
        (status = 401, description = "토큰 없음", body = ApiError),
        (status = 404, description = "매물 없음", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "viewing-requests"
)]
pub async fn create_viewing_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateViewingRequest>,
) -> ApiResult<(StatusCode, Json<ViewingRequestResponse>)> {
    if req.requested_date <= Utc::now() {
        return Err(bad_request("열람 희망일은 현재 이후여야 합니다"));
    }
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let apartment = ApartmentRepository::find_by_id(db_pool, req.apartment_id)
        .await
        .map_err(|e| db_error("매물 조회 실패", e))?
        .filter(|a| a.is_active)
        .ok_or_else(|| not_found("매물을 찾을 수 없습니다"))?;

    if apartment.owner_id == auth.id {
        return Err(bad_request("본인 매물에는 열람 요청을 할 수 없습니다"));
    }

    let new_request = NewViewingRequest {
        apartment_id: apartment.id,
        tenant_id: auth.id,
        landlord_id: apartment.owner_id,
        requested_date: req.requested_date,
        alternative_date: req.alternative_date,
        message: req.message,
        phone: req.phone,
        payment_amount: Some(state.config.viewing_fee),
    };

    let record = ViewingRequestRepository::create(db_pool, &new_request)
        .await
        .map_err(|e| db_error("열람 요청 생성 실패", e))?;

    // 알림 실패는 요청 생성에 영향 없음
    if let (Ok(Some(landlord)), Ok(Some(tenant))) = (
        UserRepository::find_by_id(db_pool, apartment.owner_id).await,
        UserRepository::find_by_id(db_pool, auth.id).await,
    ) {
        state.notify(MailMessage::viewing_requested(
            &landlord.email,
            &apartment.title,
            &tenant.full_name(),
            record.requested_date,
            record.message.as_deref(),
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(ViewingRequestResponse {
            success: true,
            viewing_request: record,
        }),
    ))
}

/// 내 열람 요청 목록 (임차인/임대인 양쪽)
#[utoipa::path(
    get,
    path = "/api/viewing-requests",
    params(ViewingRequestQuery),
    responses(
        (status = 200, description = "요청 목록", body = ViewingRequestListResponse),
        (status = 400, description = "잘못된 상태 필터", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "viewing-requests"
)]
pub async fn list_viewing_requests(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ViewingRequestQuery>,
) -> ApiResult<Json<ViewingRequestListResponse>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<ViewingStatus>)
        .transpose()
        .map_err(bad_request)?;

    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let viewing_requests = ViewingRequestRepository::list_for_user(db_pool, auth.id, status)
        .await
        .map_err(|e| db_error("열람 요청 조회 실패", e))?;

    Ok(Json(ViewingRequestListResponse {
        success: true,
        count: viewing_requests.len(),
        viewing_requests,
    }))
}

/// 열람 요청 상태 변경
#[utoipa::path(
    patch,
    path = "/api/viewing-request/{id}/status",
    params(("id" = Uuid, Path, description = "열람 요청 ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "변경 완료", body = ViewingRequestResponse),
        (status = 403, description = "권한 없음", body = ApiError),
        (status = 404, description = "요청 없음", body = ApiError),
        (status = 409, description = "허용되지 않는 전이", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "viewing-requests"
)]
pub async fn update_viewing_status(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateStatusRequest>,
) -> ApiResult<Json<ViewingRequestResponse>> {
    let next: ViewingStatus = req.status.parse().map_err(bad_request)?;
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let record = ViewingRequestRepository::find_by_id(db_pool, id)
        .await
        .map_err(|e| db_error("열람 요청 조회 실패", e))?
        .ok_or_else(|| not_found("열람 요청을 찾을 수 없습니다"))?;

    let actor = actor_for(&auth, &record)
        .ok_or_else(|| forbidden("이 열람 요청의 당사자가 아닙니다"))?;

    let next = record
        .status()
        .transition(next, actor)
        .map_err(|e| match e {
            TransitionError::InvalidTransition { .. } => conflict("INVALID_TRANSITION", e.to_string()),
            TransitionError::NotPermitted { .. } => forbidden(e.to_string()),
        })?;

    let updated = ViewingRequestRepository::update_status(db_pool, id, next)
        .await
        .map_err(|e| db_error("열람 요청 상태 변경 실패", e))?;

    info!(
        viewing_request_id = %id,
        from = %record.status,
        to = %next,
        actor = ?actor,
        "열람 요청 상태 변경"
    );

    if let (Ok(Some(tenant)), Ok(Some(apartment))) = (
        UserRepository::find_by_id(db_pool, updated.tenant_id).await,
        ApartmentRepository::find_by_id(db_pool, updated.apartment_id).await,
    ) {
        state.notify(MailMessage::viewing_status_changed(
            &tenant.email,
            &apartment.title,
            &next.to_string(),
        ));
    }

    Ok(Json(ViewingRequestResponse {
        success: true,
        viewing_request: updated,
    }))
}

// ==================== 라우터 ====================

pub fn viewing_requests_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/viewing-request", post(create_viewing_request))
        .route("/viewing-requests", get(list_viewing_requests))
        .route("/viewing-request/{id}/status", patch(update_viewing_status))
}

#[cfg(test)]
mod tests {
    use sichr_core::UserRole;

    use super::*;

    fn record(tenant_id: Uuid, landlord_id: Uuid) -> ViewingRequestRecord {
        let now = Utc::now();
        ViewingRequestRecord {
            id: Uuid::new_v4(),
            apartment_id: Uuid::new_v4(),
            tenant_id,
            landlord_id,
            requested_date: now,
            alternative_date: None,
            message: None,
            phone: None,
            status: "pending".to_string(),
            payment_status: "unpaid".to_string(),
            payment_amount: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn user(id: Uuid, role: UserRole) -> AuthUser {
        AuthUser {
            id,
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_actor_resolution() {
        let tenant = Uuid::new_v4();
        let landlord = Uuid::new_v4();
        let rec = record(tenant, landlord);

        assert_eq!(actor_for(&user(tenant, UserRole::Tenant), &rec), Some(ViewingActor::Tenant));
        assert_eq!(actor_for(&user(landlord, UserRole::Landlord), &rec), Some(ViewingActor::Landlord));
        assert_eq!(actor_for(&user(Uuid::new_v4(), UserRole::Admin), &rec), Some(ViewingActor::Admin));
        assert_eq!(actor_for(&user(Uuid::new_v4(), UserRole::Landlord), &rec), None);
    }
}
