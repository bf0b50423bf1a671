//! GDPR 동의 기록 및 정보주체 요청 Repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sichr_core::{ConsentPurpose, GdprRequestStatus, GdprRequestType};
use sqlx::{FromRow, PgPool};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

/// consents 테이블 행 (추가 전용)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ConsentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: String,
    pub granted: bool,
    pub version: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// gdpr_requests 테이블 행
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct GdprRequestRecord {
    pub id: Uuid,
    /// 삭제 완료 후에는 NULL
    pub user_id: Option<Uuid>,
    pub request_type: String,
    pub status: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl GdprRequestRecord {
    pub fn request_type(&self) -> Option<GdprRequestType> {
        self.request_type.parse().ok()
    }

    pub fn status(&self) -> Option<GdprRequestStatus> {
        self.status.parse().ok()
    }
}

pub struct GdprRepository;

impl GdprRepository {
    /// 동의 상태 기록 (이력은 덮어쓰지 않고 추가)
    pub async fn record_consent(
        pool: &PgPool,
        user_id: Uuid,
        purpose: ConsentPurpose,
        granted: bool,
        version: Option<&str>,
    ) -> Result<ConsentRecord, sqlx::Error> {
        let record = sqlx::query_as::<_, ConsentRecord>(
            r#"
            INSERT INTO consents (user_id, purpose, granted, version)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(purpose.to_string())
        .bind(granted)
        .bind(version)
        .fetch_one(pool)
        .await?;

        info!(user_id = %user_id, purpose = %purpose, granted, "동의 기록");
        Ok(record)
    }

    /// 목적별 최신 동의 상태
    pub async fn latest_consents(pool: &PgPool, user_id: Uuid) -> Result<Vec<ConsentRecord>, sqlx::Error> {
        sqlx::query_as::<_, ConsentRecord>(
            r#"
            SELECT DISTINCT ON (purpose) *
            FROM consents
            WHERE user_id = $1
            ORDER BY purpose, recorded_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// 전체 동의 이력 (데이터 내보내기용)
    pub async fn consent_history(pool: &PgPool, user_id: Uuid) -> Result<Vec<ConsentRecord>, sqlx::Error> {
        sqlx::query_as::<_, ConsentRecord>(
            "SELECT * FROM consents WHERE user_id = $1 ORDER BY recorded_at ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create_request(
        pool: &PgPool,
        user_id: Uuid,
        request_type: GdprRequestType,
        details: Option<&str>,
    ) -> Result<GdprRequestRecord, sqlx::Error> {
        let record = sqlx::query_as::<_, GdprRequestRecord>(
            r#"
            INSERT INTO gdpr_requests (user_id, request_type, status, details)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(request_type.to_string())
        .bind(GdprRequestStatus::Pending.to_string())
        .bind(details)
        .fetch_one(pool)
        .await?;

        info!(request_id = %record.id, user_id = %user_id, request_type = %request_type, "GDPR 요청 접수");
        Ok(record)
    }

    pub async fn list_requests(
        pool: &PgPool,
        status: Option<GdprRequestStatus>,
    ) -> Result<Vec<GdprRequestRecord>, sqlx::Error> {
        sqlx::query_as::<_, GdprRequestRecord>(
            r#"
            SELECT * FROM gdpr_requests
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.map(|s| s.to_string()))
        .fetch_all(pool)
        .await
    }

    pub async fn find_request(pool: &PgPool, id: Uuid) -> Result<Option<GdprRequestRecord>, sqlx::Error> {
        sqlx::query_as::<_, GdprRequestRecord>("SELECT * FROM gdpr_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 처리 상태 변경 (완료/거절 시 처리 시각 기록)
    pub async fn update_request_status(
        pool: &PgPool,
        id: Uuid,
        status: GdprRequestStatus,
    ) -> Result<GdprRequestRecord, sqlx::Error> {
        sqlx::query_as::<_, GdprRequestRecord>(
            r#"
            UPDATE gdpr_requests
            SET status = $2,
                resolved_at = CASE WHEN $3 THEN NOW() ELSE NULL END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .bind(status.is_resolved())
        .fetch_one(pool)
        .await
    }
}
