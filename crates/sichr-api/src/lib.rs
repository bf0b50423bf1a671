//! SichrPlace REST API.
//!
//! 매물 등록, 열람 요청, PayPal 결제, 메시지, GDPR 동의 관리를
//! 하나의 axum 서비스로 제공합니다.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
