//! API 라우트.
//!
//! - `/api/*`: 시스템, 매물, 열람 요청, 메시지, 결제, GDPR
//! - `/api/admin/*`: 관리자 전용
//! - `/auth/*` (`/api/auth/*` 별칭): 회원가입, 로그인

pub mod admin;
pub mod apartments;
pub mod auth;
pub mod gdpr;
pub mod messages;
pub mod paypal;
pub mod system;
pub mod viewing_requests;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub use admin::admin_router;
pub use apartments::apartments_router;
pub use auth::auth_router;
pub use gdpr::gdpr_router;
pub use messages::messages_router;
pub use paypal::paypal_router;
pub use system::{system_router, HealthResponse};
pub use viewing_requests::viewing_requests_router;

/// 전체 API 라우터 (상태 미주입)
pub fn create_api_router() -> Router<Arc<AppState>> {
    let api = Router::new()
        .merge(system_router())
        .merge(apartments_router())
        .merge(viewing_requests_router())
        .merge(messages_router())
        .merge(paypal_router())
        .merge(gdpr_router())
        .nest("/admin", admin_router())
        .nest("/auth", auth_router());

    Router::new()
        .nest("/api", api)
        .nest("/auth", auth_router())
}
