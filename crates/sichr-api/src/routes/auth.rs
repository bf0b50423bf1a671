//! 회원가입 / 로그인 / 내 정보.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sichr_core::{ConsentPurpose, UserRole};
use tracing::{info, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::{hash_password_off_thread, verify_password_off_thread, AuthUser},
    error::{
        bad_request, conflict, db_error, db_not_configured, not_found, reject, unauthorized,
        ApiError, ApiResult,
    },
    extract::ValidatedJson,
    repository::{is_unique_violation, GdprRepository, NewUser, UserProfile, UserRepository},
    state::AppState,
};

// ==================== 타입 정의 ====================

/// 회원가입 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[serde(alias = "lastName")]
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    /// tenant(기본) / landlord
    pub role: Option<String>,
    #[serde(default, alias = "gdprConsent")]
    pub gdpr_consent: bool,
}

/// 로그인 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    pub user: UserProfile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    /// Bearer 토큰
    pub token: String,
    pub user: UserProfile,
}

// ==================== 핸들러 ====================

/// 회원가입
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "가입 완료", body = UserResponse),
        (status = 400, description = "입력값 오류", body = ApiError),
        (status = 409, description = "이메일 중복", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let role = match req.role.as_deref() {
        None | Some("") => UserRole::Tenant,
        Some(raw) => raw.parse::<UserRole>().map_err(bad_request)?,
    };
    if role.is_admin() {
        return Err(bad_request("관리자 계정은 직접 가입할 수 없습니다"));
    }

    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;
    let email = req.email.trim().to_lowercase();

    if UserRepository::find_by_email(db_pool, &email)
        .await
        .map_err(|e| db_error("사용자 조회 실패", e))?
        .is_some()
    {
        return Err(conflict("EMAIL_EXISTS", "이미 등록된 이메일입니다"));
    }

    let password_hash = hash_password_off_thread(req.password.clone()).await.map_err(|e| {
        warn!(error = %e, "비밀번호 해싱 실패");
        reject(StatusCode::INTERNAL_SERVER_ERROR, "HASH_ERROR", e.to_string())
    })?;

    let new_user = NewUser {
        email,
        password_hash,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        role,
        gdpr_consent: req.gdpr_consent,
    };

    let user = UserRepository::create(db_pool, &new_user)
        .await
        .map_err(|e| {
            // 동시 가입 경합
            if is_unique_violation(&e) {
                conflict("EMAIL_EXISTS", "이미 등록된 이메일입니다")
            } else {
                db_error("사용자 생성 실패", e)
            }
        })?;

    if user.gdpr_consent {
        if let Err(e) =
            GdprRepository::record_consent(db_pool, user.id, ConsentPurpose::Necessary, true, None).await
        {
            warn!(user_id = %user.id, error = %e, "가입 동의 기록 실패");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            user: user.into(),
        }),
    ))
}

/// 로그인
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = LoginResponse),
        (status = 401, description = "인증 실패", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let user = UserRepository::find_by_email(db_pool, req.email.trim())
        .await
        .map_err(|e| db_error("사용자 조회 실패", e))?;

    let Some(user) = user else {
        return Err(unauthorized("이메일 또는 비밀번호가 올바르지 않습니다"));
    };

    let verified = verify_password_off_thread(req.password.clone(), user.password_hash.clone())
        .await
        .map_err(|e| reject(StatusCode::INTERNAL_SERVER_ERROR, "HASH_ERROR", e.to_string()))?;
    if !verified {
        return Err(unauthorized("이메일 또는 비밀번호가 올바르지 않습니다"));
    }

    let token = state
        .jwt
        .issue(user.id, &user.email, user.role())
        .map_err(|e| reject(StatusCode::INTERNAL_SERVER_ERROR, "TOKEN_ERROR", e.to_string()))?;

    info!(user_id = %user.id, "로그인");

    Ok(Json(LoginResponse {
        success: true,
        token,
        user: user.into(),
    }))
}

/// 내 정보
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "현재 사용자", body = UserResponse),
        (status = 401, description = "토큰 없음", body = ApiError),
        (status = 403, description = "토큰 오류", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<UserResponse>> {
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let user = UserRepository::find_by_id(db_pool, auth.id)
        .await
        .map_err(|e| db_error("사용자 조회 실패", e))?
        .ok_or_else(|| not_found("사용자를 찾을 수 없습니다"))?;

    Ok(Json(UserResponse {
        success: true,
        user: user.into(),
    }))
}

// ==================== 라우터 ====================

pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}
