//! OpenAPI 문서화 설정.
//!
//! utoipa로 REST API의 OpenAPI 3 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새 엔드포인트를 추가할 때:
//!
//! 1. 요청/응답 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)`에 등록

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

// ==================== 각 모듈에서 스키마 Import ====================

use crate::error::ApiError;
use crate::repository::{
    ApartmentRecord, ConsentRecord, ConversationRecord, GdprRequestRecord, MessageRecord,
    PaymentTransactionRecord, StatusCount, TableCounts, UserProfile, ViewingRequestRecord,
};
use crate::routes::{
    admin::{
        GdprRequestListResponse, StatsResponse, UpdateGdprRequest, UpdateGdprResponse,
        UserListResponse,
    },
    apartments::{ApartmentListResponse, ApartmentResponse, DeletedResponse, UploadApartmentRequest},
    auth::{LoginRequest, LoginResponse, RegisterRequest, UserResponse},
    gdpr::{
        ConsentRequest, ConsentResponse, ConsentState, ConsentStateResponse, CreateGdprRequest,
        DataExport, DataExportResponse, GdprRequestResponse,
    },
    messages::{ConversationListResponse, MessageListResponse, SendMessageRequest, SendMessageResponse},
    paypal::{CreatePaymentRequest, CreatePaymentResponse, ExecutePaymentRequest, ExecutePaymentResponse},
    system::{CsrfTokenResponse, HealthResponse, PayPalConfigResponse},
    viewing_requests::{
        CreateViewingRequest, UpdateStatusRequest, ViewingRequestListResponse,
        ViewingRequestResponse,
    },
};

// ==================== 보안 스키마 ====================

/// `bearer_auth` 보안 스키마 등록
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

// ==================== OpenAPI 문서 정의 ====================

/// SichrPlace API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "SichrPlace API",
        version = "0.1.0",
        description = r#"
# SichrPlace REST API

임차인과 임대인을 연결하는 매물 플랫폼 API입니다.

## 주요 기능

- **매물**: 등록, 검색, 삭제
- **열람 요청**: 요청 생성 및 승인/거절/완료 흐름
- **결제**: PayPal 주문 생성 및 캡처
- **메시지**: 임차인-임대인 대화
- **GDPR**: 동의 기록, 정보주체 요청, 데이터 내보내기

## 인증

`POST /auth/login`으로 발급받은 토큰을 `Authorization: Bearer <token>` 헤더에 포함하세요.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3001", description = "로컬 개발 서버"),
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "system", description = "시스템 - 헬스 체크 및 공개 설정"),
        (name = "auth", description = "인증 - 회원가입/로그인"),
        (name = "apartments", description = "매물 - 등록/검색/삭제"),
        (name = "viewing-requests", description = "열람 요청 - 생성 및 상태 변경"),
        (name = "messages", description = "메시지 - 대화 및 메시지"),
        (name = "payments", description = "결제 - PayPal 주문/캡처"),
        (name = "gdpr", description = "GDPR - 동의 및 정보주체 요청"),
        (name = "admin", description = "관리자 - 통계 및 GDPR 요청 처리")
    ),
    // ==================== 스키마 등록 ====================
    components(
        schemas(
            // ===== Common =====
            ApiError,

            // ===== System =====
            HealthResponse,
            CsrfTokenResponse,
            PayPalConfigResponse,

            // ===== Auth =====
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UserResponse,
            UserProfile,

            // ===== Apartments =====
            UploadApartmentRequest,
            ApartmentRecord,
            ApartmentResponse,
            ApartmentListResponse,
            DeletedResponse,

            // ===== Viewing Requests =====
            CreateViewingRequest,
            UpdateStatusRequest,
            ViewingRequestRecord,
            ViewingRequestResponse,
            ViewingRequestListResponse,

            // ===== Messages =====
            SendMessageRequest,
            SendMessageResponse,
            ConversationRecord,
            MessageRecord,
            ConversationListResponse,
            MessageListResponse,

            // ===== Payments =====
            CreatePaymentRequest,
            CreatePaymentResponse,
            ExecutePaymentRequest,
            ExecutePaymentResponse,
            PaymentTransactionRecord,

            // ===== GDPR =====
            ConsentRequest,
            ConsentResponse,
            ConsentRecord,
            ConsentState,
            ConsentStateResponse,
            CreateGdprRequest,
            GdprRequestRecord,
            GdprRequestResponse,
            DataExport,
            DataExportResponse,

            // ===== Admin =====
            TableCounts,
            StatusCount,
            StatsResponse,
            UserListResponse,
            GdprRequestListResponse,
            UpdateGdprRequest,
            UpdateGdprResponse,
        )
    ),
    // ==================== 경로 등록 ====================
    paths(
        // ===== System =====
        crate::routes::system::health,
        crate::routes::system::csrf_token,
        crate::routes::system::paypal_config,

        // ===== Auth =====
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::me,

        // ===== Apartments =====
        crate::routes::apartments::upload_apartment,
        crate::routes::apartments::list_apartments,
        crate::routes::apartments::get_apartment,
        crate::routes::apartments::delete_apartment,

        // ===== Viewing Requests =====
        crate::routes::viewing_requests::create_viewing_request,
        crate::routes::viewing_requests::list_viewing_requests,
        crate::routes::viewing_requests::update_viewing_status,

        // ===== Messages =====
        crate::routes::messages::send_message,
        crate::routes::messages::list_conversations,
        crate::routes::messages::list_messages,

        // ===== Payments =====
        crate::routes::paypal::create_payment,
        crate::routes::paypal::execute_payment,

        // ===== GDPR =====
        crate::routes::gdpr::record_consent,
        crate::routes::gdpr::list_consents,
        crate::routes::gdpr::create_request,
        crate::routes::gdpr::export_data,

        // ===== Admin =====
        crate::routes::admin::stats,
        crate::routes::admin::list_users,
        crate::routes::admin::list_gdpr_requests,
        crate::routes::admin::update_gdpr_request,
    )
)]
pub struct ApiDoc;

// ==================== Swagger UI 라우터 ====================

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

// ==================== 테스트 ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_valid() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec).unwrap();

        assert!(json.contains("SichrPlace API"));

        // 경로 확인
        assert!(json.contains("/api/health"));
        assert!(json.contains("/auth/register"));
        assert!(json.contains("/api/upload-apartment"));
        assert!(json.contains("/api/paypal/execute"));
        assert!(json.contains("/api/viewing-request/{id}/status"));
        assert!(json.contains("/api/admin/gdpr-requests/{id}"));
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string(&spec).unwrap();

        assert!(json.contains("bearer_auth"));
        assert!(json.contains("ApiError"));
        assert!(json.contains("UploadApartmentRequest"));
    }

    #[test]
    fn test_swagger_ui_router_creates() {
        let _router: Router<()> = swagger_ui_router();
    }
}
