//! 관리자 API 라우트
//!
//! 모든 핸들러는 관리자 역할을 요구합니다.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sichr_core::{GdprRequestStatus, GdprRequestType};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::{bad_request, conflict, db_error, db_not_configured, not_found, ApiError, ApiResult},
    extract::ValidatedJson,
    repository::{
        table_counts, GdprRepository, GdprRequestRecord, StatusCount, TableCounts, UserProfile,
        UserRepository, ViewingRequestRepository,
    },
    state::AppState,
};

// ==================== 타입 정의 ====================

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub success: bool,
    pub counts: TableCounts,
    /// 열람 요청 상태별 건수
    pub viewing_requests_by_status: Vec<StatusCount>,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<UserProfile>,
    pub count: usize,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct GdprRequestQuery {
    /// pending / processing / completed / rejected
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GdprRequestListResponse {
    pub success: bool,
    pub requests: Vec<GdprRequestRecord>,
}

/// 요청 처리 상태 변경
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateGdprRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateGdprResponse {
    pub success: bool,
    pub request: GdprRequestRecord,
    /// 삭제 요청 완료로 사용자가 삭제되었는지
    pub user_deleted: bool,
}

// ==================== 핸들러 ====================

/// 대시보드 통계
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "통계", body = StatsResponse),
        (status = 403, description = "관리자 아님", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn stats(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<StatsResponse>> {
    auth.require_admin()?;
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let counts = table_counts(db_pool)
        .await
        .map_err(|e| db_error("통계 조회 실패", e))?;
    let viewing_requests_by_status = ViewingRequestRepository::count_by_status(db_pool)
        .await
        .map_err(|e| db_error("상태별 집계 실패", e))?;

    Ok(Json(StatsResponse {
        success: true,
        counts,
        viewing_requests_by_status,
    }))
}

/// 사용자 목록
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "사용자 목록", body = UserListResponse),
        (status = 403, description = "관리자 아님", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<UserListResponse>> {
    auth.require_admin()?;
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let users: Vec<UserProfile> =
        UserRepository::list(db_pool, query.limit.clamp(1, 500), query.offset.max(0))
            .await
            .map_err(|e| db_error("사용자 조회 실패", e))?
            .into_iter()
            .map(UserProfile::from)
            .collect();

    Ok(Json(UserListResponse {
        success: true,
        count: users.len(),
        users,
    }))
}

/// GDPR 요청 목록
#[utoipa::path(
    get,
    path = "/api/admin/gdpr-requests",
    params(GdprRequestQuery),
    responses(
        (status = 200, description = "요청 목록", body = GdprRequestListResponse),
        (status = 403, description = "관리자 아님", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn list_gdpr_requests(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<GdprRequestQuery>,
) -> ApiResult<Json<GdprRequestListResponse>> {
    auth.require_admin()?;
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<GdprRequestStatus>)
        .transpose()
        .map_err(bad_request)?;

    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let requests = GdprRepository::list_requests(db_pool, status)
        .await
        .map_err(|e| db_error("GDPR 요청 조회 실패", e))?;

    Ok(Json(GdprRequestListResponse {
        success: true,
        requests,
    }))
}

/// GDPR 요청 처리
///
/// 삭제 요청을 `completed`로 바꾸면 해당 사용자와 연관 행이 삭제됩니다.
#[utoipa::path(
    patch,
    path = "/api/admin/gdpr-requests/{id}",
    params(("id" = Uuid, Path, description = "요청 ID")),
    request_body = UpdateGdprRequest,
    responses(
        (status = 200, description = "처리 완료", body = UpdateGdprResponse),
        (status = 404, description = "요청 없음", body = ApiError),
        (status = 409, description = "이미 처리된 요청", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn update_gdpr_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateGdprRequest>,
) -> ApiResult<Json<UpdateGdprResponse>> {
    auth.require_admin()?;
    let status: GdprRequestStatus = req.status.parse().map_err(bad_request)?;
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let existing = GdprRepository::find_request(db_pool, id)
        .await
        .map_err(|e| db_error("GDPR 요청 조회 실패", e))?
        .ok_or_else(|| not_found("GDPR 요청을 찾을 수 없습니다"))?;

    if existing.status().is_some_and(|s| s.is_resolved()) {
        return Err(conflict("ALREADY_RESOLVED", "이미 처리된 요청입니다"));
    }

    let request = GdprRepository::update_request_status(db_pool, id, status)
        .await
        .map_err(|e| db_error("GDPR 요청 변경 실패", e))?;

    let mut user_deleted = false;
    if status == GdprRequestStatus::Completed
        && existing.request_type() == Some(GdprRequestType::Deletion)
    {
        match existing.user_id {
            Some(user_id) => {
                user_deleted = UserRepository::delete(db_pool, user_id)
                    .await
                    .map_err(|e| db_error("사용자 삭제 실패", e))?;
                info!(request_id = %id, user_id = %user_id, "삭제 요청 처리: 사용자 삭제");
            }
            None => warn!(request_id = %id, "삭제 요청의 사용자가 이미 없음"),
        }
    }

    info!(request_id = %id, status = %status, admin_id = %auth.id, "GDPR 요청 처리");

    Ok(Json(UpdateGdprResponse {
        success: true,
        request,
        user_deleted,
    }))
}

// ==================== 라우터 ====================

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(stats))
        .route("/users", get(list_users))
        .route("/gdpr-requests", get(list_gdpr_requests))
        .route("/gdpr-requests/{id}", patch(update_gdpr_request))
}
