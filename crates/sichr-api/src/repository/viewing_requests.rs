//! 열람 요청 Repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sichr_core::{PaymentStatus, ViewingStatus};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

/// viewing_requests 테이블 행
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ViewingRequestRecord {
    pub id: Uuid,
    pub apartment_id: Uuid,
    pub tenant_id: Uuid,
    pub landlord_id: Uuid,
    pub requested_date: DateTime<Utc>,
    pub alternative_date: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub phone: Option<String>,
    /// pending / approved / rejected / cancelled / completed
    pub status: String,
    /// unpaid / pending / paid / refunded
    pub payment_status: String,
    pub payment_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ViewingRequestRecord {
    /// 저장된 상태 (알 수 없는 값은 pending)
    pub fn status(&self) -> ViewingStatus {
        self.status.parse().unwrap_or_default()
    }
}

/// 신규 열람 요청
#[derive(Debug, Clone)]
pub struct NewViewingRequest {
    pub apartment_id: Uuid,
    pub tenant_id: Uuid,
    pub landlord_id: Uuid,
    pub requested_date: DateTime<Utc>,
    pub alternative_date: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub phone: Option<String>,
    pub payment_amount: Option<Decimal>,
}

/// 상태별 건수
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

pub struct ViewingRequestRepository;

impl ViewingRequestRepository {
    pub async fn create(
        pool: &PgPool,
        request: &NewViewingRequest,
    ) -> Result<ViewingRequestRecord, sqlx::Error> {
        let record = sqlx::query_as::<_, ViewingRequestRecord>(
            r#"
            INSERT INTO viewing_requests (
                apartment_id, tenant_id, landlord_id, requested_date,
                alternative_date, message, phone, status, payment_status, payment_amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(request.apartment_id)
        .bind(request.tenant_id)
        .bind(request.landlord_id)
        .bind(request.requested_date)
        .bind(request.alternative_date)
        .bind(&request.message)
        .bind(&request.phone)
        .bind(ViewingStatus::Pending.to_string())
        .bind(PaymentStatus::Unpaid.to_string())
        .bind(request.payment_amount)
        .fetch_one(pool)
        .await?;

        info!(
            viewing_request_id = %record.id,
            apartment_id = %record.apartment_id,
            tenant_id = %record.tenant_id,
            "열람 요청 생성"
        );
        Ok(record)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ViewingRequestRecord>, sqlx::Error> {
        sqlx::query_as::<_, ViewingRequestRecord>("SELECT * FROM viewing_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 사용자가 임차인 또는 임대인으로 참여한 요청
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<ViewingStatus>,
    ) -> Result<Vec<ViewingRequestRecord>, sqlx::Error> {
        sqlx::query_as::<_, ViewingRequestRecord>(
            r#"
            SELECT * FROM viewing_requests
            WHERE (tenant_id = $1 OR landlord_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY requested_date DESC
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.to_string()))
        .fetch_all(pool)
        .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: ViewingStatus,
    ) -> Result<ViewingRequestRecord, sqlx::Error> {
        let record = sqlx::query_as::<_, ViewingRequestRecord>(
            r#"
            UPDATE viewing_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .fetch_one(pool)
        .await?;

        debug!(viewing_request_id = %id, status = %status, "열람 요청 상태 변경");
        Ok(record)
    }

    pub async fn update_payment_status(
        pool: &PgPool,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE viewing_requests SET payment_status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(payment_status.to_string())
        .execute(pool)
        .await?;

        debug!(viewing_request_id = %id, payment_status = %payment_status, "결제 상태 변경");
        Ok(())
    }

    /// 상태별 건수 (관리자 통계용)
    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<StatusCount>, sqlx::Error> {
        sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM viewing_requests GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await
    }
}
