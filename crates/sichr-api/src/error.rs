//! API 에러 응답.
//!
//! 모든 실패 응답 본문은 `{"success": false, "error": "...", "code": "..."}` 형식입니다.
//! 핸들러는 `(StatusCode, Json<ApiError>)` 튜플을 에러로 반환합니다.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

/// 에러 응답 본문
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// 항상 false
    pub success: bool,
    /// 사람이 읽을 수 있는 메시지
    pub error: String,
    /// 기계 판독용 코드 (예: `NOT_FOUND`)
    pub code: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            code: code.into(),
        }
    }
}

/// 핸들러 에러 타입
pub type ApiErrorResponse = (StatusCode, Json<ApiError>);

/// 핸들러 결과 타입
pub type ApiResult<T> = Result<T, ApiErrorResponse>;

/// 상태 코드와 함께 에러 응답 생성
pub fn reject(status: StatusCode, code: &str, message: impl Into<String>) -> ApiErrorResponse {
    (status, Json(ApiError::new(code, message)))
}

pub fn bad_request(message: impl Into<String>) -> ApiErrorResponse {
    reject(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
}

pub fn unauthorized(message: impl Into<String>) -> ApiErrorResponse {
    reject(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
}

pub fn forbidden(message: impl Into<String>) -> ApiErrorResponse {
    reject(StatusCode::FORBIDDEN, "FORBIDDEN", message)
}

pub fn not_found(message: impl Into<String>) -> ApiErrorResponse {
    reject(StatusCode::NOT_FOUND, "NOT_FOUND", message)
}

pub fn conflict(code: &str, message: impl Into<String>) -> ApiErrorResponse {
    reject(StatusCode::CONFLICT, code, message)
}

pub fn db_not_configured() -> ApiErrorResponse {
    reject(
        StatusCode::INTERNAL_SERVER_ERROR,
        "DB_NOT_CONFIGURED",
        "데이터베이스가 구성되지 않았습니다",
    )
}

/// DB 에러를 500 응답으로 변환 (로그 포함)
pub fn db_error(context: &str, err: sqlx::Error) -> ApiErrorResponse {
    warn!(error = %err, "{}", context);
    reject(
        StatusCode::INTERNAL_SERVER_ERROR,
        "DB_ERROR",
        format!("{}: {}", context, err),
    )
}

/// validator 검증 실패를 400 응답으로 변환
pub fn validation_error(errors: validator::ValidationErrors) -> ApiErrorResponse {
    let fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|field| field.to_string())
        .collect();
    bad_request(format!("입력값이 올바르지 않습니다: {}", fields.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let (status, Json(body)) = not_found("매물을 찾을 수 없습니다");
        assert_eq!(status, StatusCode::NOT_FOUND);

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["error"], "매물을 찾을 수 없습니다");
    }
}
