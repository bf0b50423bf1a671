//! GDPR API 라우트: 동의 기록, 정보주체 요청, 데이터 내보내기.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sichr_core::{ConsentPurpose, GdprRequestType};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::{bad_request, db_error, db_not_configured, not_found, ApiError, ApiResult},
    extract::ValidatedJson,
    repository::{
        ApartmentRecord, ApartmentRepository, ConsentRecord, GdprRepository, GdprRequestRecord,
        MessageRecord, MessageRepository, UserProfile, UserRepository, ViewingRequestRecord,
        ViewingRequestRepository,
    },
    state::AppState,
};

// ==================== 타입 정의 ====================

/// 동의 변경 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ConsentRequest {
    /// necessary / analytics / marketing / messaging / viewing_data
    pub purpose: String,
    pub granted: bool,
    /// 동의한 약관 버전
    #[validate(length(max = 32))]
    pub version: Option<String>,
}

/// 정보주체 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGdprRequest {
    /// export / deletion / rectification
    #[serde(alias = "requestType", alias = "type")]
    pub request_type: String,
    #[validate(length(max = 5000))]
    pub details: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConsentResponse {
    pub success: bool,
    pub consent: ConsentRecord,
}

/// 목적별 현재 동의 상태
#[derive(Debug, Serialize, ToSchema)]
pub struct ConsentState {
    pub purpose: String,
    pub granted: bool,
    pub required: bool,
    /// 기록이 없으면 None
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConsentStateResponse {
    pub success: bool,
    pub consents: Vec<ConsentState>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GdprRequestResponse {
    pub success: bool,
    pub request: GdprRequestRecord,
}

/// 내보내기 묶음
#[derive(Debug, Serialize, ToSchema)]
pub struct DataExport {
    pub exported_at: DateTime<Utc>,
    pub user: UserProfile,
    pub apartments: Vec<ApartmentRecord>,
    pub viewing_requests: Vec<ViewingRequestRecord>,
    pub messages: Vec<MessageRecord>,
    pub consents: Vec<ConsentRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DataExportResponse {
    pub success: bool,
    pub data: DataExport,
}

/// 최신 기록을 전체 목적 목록에 맞춰 펼침
fn consent_states(latest: &[ConsentRecord]) -> Vec<ConsentState> {
    ConsentPurpose::ALL
        .iter()
        .map(|purpose| {
            let name = purpose.to_string();
            let record = latest.iter().find(|r| r.purpose == name);
            ConsentState {
                granted: record.map(|r| r.granted).unwrap_or(false),
                recorded_at: record.map(|r| r.recorded_at),
                required: purpose.is_required(),
                purpose: name,
            }
        })
        .collect()
}

// ==================== 핸들러 ====================

/// 동의 기록
#[utoipa::path(
    post,
    path = "/api/gdpr/consent",
    request_body = ConsentRequest,
    responses(
        (status = 200, description = "기록 완료", body = ConsentResponse),
        (status = 400, description = "알 수 없는 목적 또는 필수 동의 철회", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "gdpr"
)]
pub async fn record_consent(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ConsentRequest>,
) -> ApiResult<Json<ConsentResponse>> {
    let purpose: ConsentPurpose = req.purpose.parse().map_err(bad_request)?;
    if purpose.is_required() && !req.granted {
        return Err(bad_request(
            "필수 동의는 철회할 수 없습니다. 계정 삭제를 요청하세요",
        ));
    }
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let consent =
        GdprRepository::record_consent(db_pool, auth.id, purpose, req.granted, req.version.as_deref())
            .await
            .map_err(|e| db_error("동의 기록 실패", e))?;

    Ok(Json(ConsentResponse {
        success: true,
        consent,
    }))
}

/// 목적별 현재 동의 상태
#[utoipa::path(
    get,
    path = "/api/gdpr/consents",
    responses((status = 200, description = "동의 상태", body = ConsentStateResponse)),
    security(("bearer_auth" = [])),
    tag = "gdpr"
)]
pub async fn list_consents(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<ConsentStateResponse>> {
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let latest = GdprRepository::latest_consents(db_pool, auth.id)
        .await
        .map_err(|e| db_error("동의 조회 실패", e))?;

    Ok(Json(ConsentStateResponse {
        success: true,
        consents: consent_states(&latest),
    }))
}

/// 정보주체 요청 접수
#[utoipa::path(
    post,
    path = "/api/gdpr/request",
    request_body = CreateGdprRequest,
    responses(
        (status = 201, description = "접수 완료", body = GdprRequestResponse),
        (status = 400, description = "알 수 없는 요청 유형", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "gdpr"
)]
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateGdprRequest>,
) -> ApiResult<(StatusCode, Json<GdprRequestResponse>)> {
    let request_type: GdprRequestType = req.request_type.parse().map_err(bad_request)?;
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let request = GdprRepository::create_request(db_pool, auth.id, request_type, req.details.as_deref())
        .await
        .map_err(|e| db_error("GDPR 요청 저장 실패", e))?;

    Ok((
        StatusCode::CREATED,
        Json(GdprRequestResponse {
            success: true,
            request,
        }),
    ))
}

/// 내 데이터 내보내기
#[utoipa::path(
    get,
    path = "/api/gdpr/export",
    responses(
        (status = 200, description = "내보내기 묶음", body = DataExportResponse),
        (status = 404, description = "사용자 없음", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "gdpr"
)]
pub async fn export_data(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<DataExportResponse>> {
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let user = UserRepository::find_by_id(db_pool, auth.id)
        .await
        .map_err(|e| db_error("사용자 조회 실패", e))?
        .ok_or_else(|| not_found("사용자를 찾을 수 없습니다"))?;

    let apartments = ApartmentRepository::list_by_owner(db_pool, auth.id)
        .await
        .map_err(|e| db_error("매물 조회 실패", e))?;
    let viewing_requests = ViewingRequestRepository::list_for_user(db_pool, auth.id, None)
        .await
        .map_err(|e| db_error("열람 요청 조회 실패", e))?;
    let messages = MessageRepository::list_by_sender(db_pool, auth.id)
        .await
        .map_err(|e| db_error("메시지 조회 실패", e))?;
    let consents = GdprRepository::consent_history(db_pool, auth.id)
        .await
        .map_err(|e| db_error("동의 이력 조회 실패", e))?;

    info!(
        user_id = %auth.id,
        apartments = apartments.len(),
        viewing_requests = viewing_requests.len(),
        messages = messages.len(),
        "데이터 내보내기"
    );

    Ok(Json(DataExportResponse {
        success: true,
        data: DataExport {
            exported_at: Utc::now(),
            user: user.into(),
            apartments,
            viewing_requests,
            messages,
            consents,
        },
    }))
}

// ==================== 라우터 ====================

pub fn gdpr_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/gdpr/consent", post(record_consent))
        .route("/gdpr/consents", get(list_consents))
        .route("/gdpr/request", post(create_request))
        .route("/gdpr/export", get(export_data))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_consent_states_cover_every_purpose() {
        let now = Utc::now();
        let latest = vec![ConsentRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            purpose: "marketing".to_string(),
            granted: true,
            version: Some("2024-01".to_string()),
            recorded_at: now,
        }];

        let states = consent_states(&latest);
        assert_eq!(states.len(), ConsentPurpose::ALL.len());

        let marketing = states.iter().find(|s| s.purpose == "marketing").unwrap();
        assert!(marketing.granted);
        assert_eq!(marketing.recorded_at, Some(now));

        let necessary = states.iter().find(|s| s.purpose == "necessary").unwrap();
        assert!(necessary.required);
        assert!(!necessary.granted);
        assert!(necessary.recorded_at.is_none());
    }
}
