//! SichrPlace API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.

use std::{sync::Arc, time::Duration};

use axum::{http::StatusCode, Router};
use sichr_api::{openapi::swagger_ui_router, routes::create_api_router, ApiConfig, AppState};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

/// CORS 미들웨어 구성.
///
/// `CORS_ORIGINS`가 비어 있으면 개발 모드로 간주하여 모든 origin을 허용합니다.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<_> = origins.iter().filter_map(|s| s.parse().ok()).collect();

    let allow_origin = if origins.is_empty() {
        warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
        AllowOrigin::any()
    } else if parsed.is_empty() {
        warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
        AllowOrigin::any()
    } else {
        info!("CORS configured with {} allowed origins", parsed.len());
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600))
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(create_api_router().with_state(state))
        // OpenAPI 문서 및 Swagger UI
        .merge(swagger_ui_router())
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 (30초) - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(30)))
        .layer(cors)
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정된 경우
/// OpenAPI JSON 스펙을 stdout으로 출력하고 종료합니다.
fn handle_export_openapi() -> Result<(), Box<dyn std::error::Error>> {
    use sichr_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
        println!("{}", json);
        std::process::exit(0);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    handle_export_openapi()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sichr_api=info,sichr_core=info,tower_http=debug".into()),
        )
        .init();

    info!("Starting SichrPlace API server...");

    let config = ApiConfig::from_env();
    let addr = config.socket_addr().map_err(|e| {
        error!(
            host = %config.host,
            port = config.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. API_HOST, API_PORT 환경변수를 확인하세요."
        );
        e
    })?;

    let state = Arc::new(AppState::connect(config).await);

    info!(
        version = %state.version,
        has_db = state.db_pool.is_some(),
        has_paypal = state.paypal.config().is_configured(),
        has_mailer = state.notifier.is_some(),
        "Service connections status"
    );

    let app = create_router(state);

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기 (Ctrl+C 또는 SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
