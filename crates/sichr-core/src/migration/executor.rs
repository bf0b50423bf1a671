//! SQL 문장 실행기.
//!
//! 두 가지 경로를 지원합니다.
//! - [`PgExecutor`]: `DATABASE_URL`로 Postgres에 직접 연결
//! - [`SupabaseRpcExecutor`]: Supabase REST의 `exec_sql` RPC 호출
//!
//! 두 실행기 모두 문장을 개별적으로 커밋하며 트랜잭션으로 묶지 않습니다.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use super::error::{ExecError, MigrationError};

/// 임의 SQL 실행 인터페이스
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// 실행기 이름 (로그용)
    fn name(&self) -> &str;

    /// 문장 하나 실행
    async fn execute(&self, sql: &str) -> Result<(), ExecError>;
}

// ============================================================================
// Postgres 직접 연결
// ============================================================================

/// sqlx 기반 Postgres 실행기
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    /// 기존 풀로 생성
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// DB URL로 연결 (문장은 순차 실행되므로 연결 1개면 충분)
    pub async fn connect(database_url: &str) -> Result<Self, MigrationError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(|e| MigrationError::Executor(format!("DB 연결 실패: {}", e)))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn execute(&self, sql: &str) -> Result<(), ExecError> {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map(|result| {
                debug!(rows_affected = result.rows_affected(), "문장 실행 완료");
            })
            .map_err(|e| match e {
                sqlx::Error::Database(db) => ExecError::Database {
                    code: db.code().map(|c| c.to_string()),
                    message: db.message().to_string(),
                },
                other => ExecError::Transport(other.to_string()),
            })
    }
}

// ============================================================================
// Supabase RPC
// ============================================================================

/// Supabase `rpc/exec_sql` 실행기 설정
#[derive(Clone)]
pub struct SupabaseRpcConfig {
    /// 프로젝트 URL (예: https://xyz.supabase.co)
    pub url: String,
    /// service_role 키
    pub service_key: SecretString,
    /// 호출할 RPC 함수명
    pub function: String,
    /// 요청 타임아웃
    pub timeout: Duration,
}

impl std::fmt::Debug for SupabaseRpcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseRpcConfig")
            .field("url", &self.url)
            .field("service_key", &"***")
            .field("function", &self.function)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SupabaseRpcConfig {
    /// 기본 함수명(`exec_sql`)과 30초 타임아웃으로 생성
    pub fn new(url: impl Into<String>, service_key: SecretString) -> Self {
        Self {
            url: url.into(),
            service_key,
            function: "exec_sql".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// RPC 엔드포인트 URL
    pub fn endpoint(&self) -> String {
        format!(
            "{}/rest/v1/rpc/{}",
            self.url.trim_end_matches('/'),
            self.function
        )
    }
}

/// PostgREST 에러 본문
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
}

/// Supabase RPC 실행기
pub struct SupabaseRpcExecutor {
    config: SupabaseRpcConfig,
    client: reqwest::Client,
}

impl SupabaseRpcExecutor {
    /// 새 실행기 생성
    pub fn new(config: SupabaseRpcConfig) -> Result<Self, MigrationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MigrationError::Executor(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl SqlExecutor for SupabaseRpcExecutor {
    fn name(&self) -> &str {
        "supabase-rpc"
    }

    async fn execute(&self, sql: &str) -> Result<(), ExecError> {
        let key = self.config.service_key.expose_secret();

        let response = self
            .client
            .post(self.config.endpoint())
            .header("apikey", key)
            .bearer_auth(key)
            .json(&json!({ "sql": sql }))
            .send()
            .await
            .map_err(|e| ExecError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();

        // PostgREST는 DB 에러를 {code, message, details} 형태로 돌려준다
        match serde_json::from_str::<PostgrestError>(&body) {
            Ok(PostgrestError {
                message: Some(message),
                code,
                details,
            }) => {
                let message = match details {
                    Some(details) if !details.is_empty() => format!("{} ({})", message, details),
                    _ => message,
                };
                Err(ExecError::Database { code, message })
            }
            _ => Err(ExecError::Http {
                status: status.as_u16(),
                message: body,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor_for(server: &mockito::Server) -> SupabaseRpcExecutor {
        let config = SupabaseRpcConfig::new(
            format!("{}/", server.url()),
            SecretString::from("service-key".to_string()),
        );
        SupabaseRpcExecutor::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_rpc_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/rpc/exec_sql")
            .match_header("apikey", "service-key")
            .match_header("authorization", "Bearer service-key")
            .match_body(mockito::Matcher::Json(json!({ "sql": "SELECT 1" })))
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let executor = executor_for(&server);
        executor.execute("SELECT 1").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rpc_database_error_is_parsed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/rpc/exec_sql")
            .with_status(400)
            .with_body(r#"{"code":"42P07","message":"relation \"users\" already exists","details":null}"#)
            .create_async()
            .await;

        let err = executor_for(&server)
            .execute("CREATE TABLE users (id INT)")
            .await
            .unwrap_err();

        assert!(matches!(err, ExecError::Database { ref code, .. } if code.as_deref() == Some("42P07")));
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_rpc_plain_error_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/rpc/exec_sql")
            .with_status(404)
            .with_body("Could not find the function public.exec_sql")
            .create_async()
            .await;

        let err = executor_for(&server).execute("SELECT 1").await.unwrap_err();
        assert!(matches!(err, ExecError::Http { status: 404, .. }));
        assert!(!err.is_already_exists());
    }

    #[test]
    fn test_endpoint_and_debug_masking() {
        let config = SupabaseRpcConfig::new(
            "https://abc.supabase.co/",
            SecretString::from("secret".to_string()),
        );
        assert_eq!(config.endpoint(), "https://abc.supabase.co/rest/v1/rpc/exec_sql");
        assert!(!format!("{:?}", config).contains("secret\""));
    }
}
