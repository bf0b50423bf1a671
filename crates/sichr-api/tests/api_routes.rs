//! 라우터 통합 테스트.
//!
//! DB 없이 동작하는 경로는 항상 실행되고, DB가 필요한 테스트는 `#[ignore]`로
//! 표시되어 `DATABASE_URL` 설정 후 `cargo test -- --ignored`로 실행합니다.
//! (스키마는 `sichr-cli migrate apply`로 미리 적용해야 합니다.)

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use sichr_api::{config::PayPalEnvironment, routes::create_api_router, ApiConfig, AppState};
use sichr_core::UserRole;
use tower::ServiceExt;
use uuid::Uuid;

fn app(state: AppState) -> Router {
    create_api_router().with_state(Arc::new(state))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn apartment_body() -> Value {
    json!({
        "title": "Bright studio near TU Dresden",
        "city": "Dresden",
        "rent": "620.00",
        "rooms": 1
    })
}

// ==================== DB 없이 실행 ====================

#[tokio::test]
async fn test_health_without_database() {
    let (status, body) = send(app(AppState::new(ApiConfig::default())), get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], false);
}

#[tokio::test]
async fn test_csrf_token_is_fresh_hex() {
    let router = app(AppState::new(ApiConfig::default()));

    let (status, first) = send(router.clone(), get("/api/csrf-token")).await;
    let (_, second) = send(router, get("/api/csrf-token")).await;

    assert_eq!(status, StatusCode::OK);
    let token = first["csrfToken"].as_str().unwrap();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(first["csrfToken"], second["csrfToken"]);
}

#[tokio::test]
async fn test_paypal_config_both_paths() {
    let mut config = ApiConfig::default();
    config.paypal.client_id = "sandbox-client".to_string();
    let router = app(AppState::new(config));

    for path in ["/api/paypal-config", "/api/paypal/config"] {
        let (status, body) = send(router.clone(), get(path)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clientId"], "sandbox-client");
        assert_eq!(body["currency"], "EUR");
        assert_eq!(body["environment"], "sandbox");
        assert!(body.get("clientSecret").is_none());
    }
}

#[tokio::test]
async fn test_upload_apartment_requires_token() {
    let state = AppState::new(ApiConfig::default());
    let tenant_token = state
        .jwt
        .issue(Uuid::new_v4(), "tenant@example.com", UserRole::Tenant)
        .unwrap();
    let router = app(state);

    let (status, body) = send(router.clone(), post_json("/api/upload-apartment", &apartment_body(), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(
        router.clone(),
        post_json("/api/upload-apartment", &apartment_body(), Some("not-a-jwt")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 임차인은 매물 등록 불가
    let (status, body) = send(
        router,
        post_json("/api/upload-apartment", &apartment_body(), Some(&tenant_token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_admin_routes_reject_non_admin() {
    let state = AppState::new(ApiConfig::default());
    let tenant_token = state
        .jwt
        .issue(Uuid::new_v4(), "tenant@example.com", UserRole::Tenant)
        .unwrap();
    let landlord_token = state
        .jwt
        .issue(Uuid::new_v4(), "landlord@example.com", UserRole::Landlord)
        .unwrap();
    let router = app(state);

    for token in [&tenant_token, &landlord_token] {
        for path in ["/api/admin/stats", "/api/admin/users", "/api/admin/gdpr-requests"] {
            let request = Request::builder()
                .uri(path)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap();
            let (status, body) = send(router.clone(), request).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{}", path);
            assert_eq!(body["code"], "FORBIDDEN");
        }
    }

    let (status, _) = send(router, get("/api/admin/stats")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_token_passes_role_check() {
    let state = AppState::new(ApiConfig::default());
    let admin_token = state
        .jwt
        .issue(Uuid::new_v4(), "admin@example.com", UserRole::Admin)
        .unwrap();

    let request = Request::builder()
        .uri("/api/admin/stats")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(state), request).await;

    // 권한 검사를 통과하고 DB 단계에서 멈춤
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "DB_NOT_CONFIGURED");
}

#[tokio::test]
async fn test_register_rejects_invalid_payload() {
    let router = app(AppState::new(ApiConfig::default()));

    let (status, body) = send(
        router.clone(),
        post_json(
            "/auth/register",
            &json!({
                "email": "not-an-email",
                "password": "short",
                "first_name": "Anna",
                "last_name": "Schmidt"
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        router,
        Request::builder()
            .method(Method::POST)
            .uri("/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_database_routes_report_missing_pool() {
    let router = app(AppState::new(ApiConfig::default()));

    let (status, body) = send(router, get("/api/apartments")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "DB_NOT_CONFIGURED");
}

#[tokio::test]
async fn test_paypal_execute_completes_capture() {
    let mut server = mockito::Server::new_async().await;
    let token_mock = server
        .mock("POST", "/v1/oauth2/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "A21AA", "token_type": "Bearer", "expires_in": 32400}"#)
        .create_async()
        .await;
    let capture_mock = server
        .mock("POST", "/v2/checkout/orders/5O190127TN364715T/capture")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"id": "5O190127TN364715T", "status": "COMPLETED", "payer": {"payer_id": "FSMVU44LF3YUS"}}"#,
        )
        .create_async()
        .await;

    let mut config = ApiConfig::default();
    config.paypal.client_id = "client".to_string();
    config.paypal.client_secret = SecretString::from("secret".to_string());
    config.paypal.environment = PayPalEnvironment::Sandbox;
    config.paypal.api_base = server.url();

    let (status, body) = send(
        app(AppState::new(config)),
        post_json(
            "/api/paypal/execute",
            &json!({"paymentId": "5O190127TN364715T", "payerId": "FSMVU44LF3YUS"}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["payerId"], "FSMVU44LF3YUS");
    token_mock.assert_async().await;
    capture_mock.assert_async().await;
}

#[tokio::test]
async fn test_paypal_execute_rejects_malformed_order_id() {
    let mut server = mockito::Server::new_async().await;
    let any_call = server
        .mock("POST", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut config = ApiConfig::default();
    config.paypal.client_id = "client".to_string();
    config.paypal.client_secret = SecretString::from("secret".to_string());
    config.paypal.api_base = server.url();
    let router = app(AppState::new(config));

    for payment_id in ["../x#", "../../../v1/payments/sale/SALE-1/refund#", "A/B"] {
        let (status, body) = send(
            router.clone(),
            post_json("/api/paypal/execute", &json!({"paymentId": payment_id}), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", payment_id);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    any_call.assert_async().await;
}

#[tokio::test]
async fn test_paypal_execute_without_credentials() {
    let (status, body) = send(
        app(AppState::new(ApiConfig::default())),
        post_json("/api/paypal/execute", &json!({"paymentId": "ORDER-1"}), None),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "PAYPAL_NOT_CONFIGURED");
}

// ==================== DB 필요 ====================

async fn db_state() -> AppState {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let pool = sqlx::PgPool::connect(&url).await.unwrap();
    AppState::new(ApiConfig::default()).with_db_pool(pool)
}

fn register_body(email: &str, role: &str) -> Value {
    json!({
        "email": email,
        "password": "s3cure-passw0rd",
        "firstName": "Anna",
        "lastName": "Schmidt",
        "role": role,
        "gdprConsent": true
    })
}

#[tokio::test]
#[ignore]
async fn test_register_duplicate_email_conflicts() {
    let router = app(db_state().await);
    let email = format!("dup-{}@example.com", Uuid::new_v4());

    let (status, body) = send(router.clone(), post_json("/auth/register", &register_body(&email, "tenant"), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], email.as_str());

    let (status, body) = send(router, post_json("/auth/register", &register_body(&email, "tenant"), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "EMAIL_EXISTS");
}

#[tokio::test]
#[ignore]
async fn test_login_and_upload_apartment() {
    let router = app(db_state().await);
    let email = format!("landlord-{}@example.com", Uuid::new_v4());

    let (status, _) = send(router.clone(), post_json("/auth/register", &register_body(&email, "landlord"), None)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        router.clone(),
        post_json("/auth/login", &json!({"email": email, "password": "wrong-password"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        router.clone(),
        post_json("/auth/login", &json!({"email": email, "password": "s3cure-passw0rd"}), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], email.as_str());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        router,
        post_json("/api/upload-apartment", &apartment_body(), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["apartment"]["title"], "Bright studio near TU Dresden");
}

#[tokio::test]
#[ignore]
async fn test_concurrent_first_messages_share_conversation() {
    let state = Arc::new(db_state().await);
    let router = create_api_router().with_state(state.clone());

    let mut ids = Vec::new();
    for role in ["tenant", "landlord"] {
        let email = format!("{}-{}@example.com", role, Uuid::new_v4());
        let (status, body) = send(router.clone(), post_json("/auth/register", &register_body(&email, role), None)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id: Uuid = body["user"]["id"].as_str().unwrap().parse().unwrap();
        ids.push((id, email));
    }
    let (tenant_id, tenant_email) = &ids[0];
    let (landlord_id, landlord_email) = &ids[1];
    let tenant_token = state.jwt.issue(*tenant_id, tenant_email, UserRole::Tenant).unwrap();
    let landlord_token = state
        .jwt
        .issue(*landlord_id, landlord_email, UserRole::Landlord)
        .unwrap();

    // 매물 없이 양쪽이 동시에 첫 메시지 전송
    let from_tenant = json!({"recipient_id": landlord_id, "content": "Is the flat still free?"});
    let from_landlord = json!({"recipient_id": tenant_id, "content": "Hello!"});
    let (first, second) = tokio::join!(
        send(router.clone(), post_json("/api/send-message", &from_tenant, Some(&tenant_token))),
        send(router.clone(), post_json("/api/send-message", &from_landlord, Some(&landlord_token))),
    );

    assert_eq!(first.0, StatusCode::CREATED);
    assert_eq!(second.0, StatusCode::CREATED);
    assert_eq!(first.1["conversation_id"], second.1["conversation_id"]);

    let request = Request::builder()
        .uri("/api/conversations")
        .header(header::AUTHORIZATION, format!("Bearer {}", tenant_token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversations"].as_array().unwrap().len(), 1);
}
