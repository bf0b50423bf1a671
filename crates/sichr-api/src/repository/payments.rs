//! 결제 트랜잭션 Repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;
use sichr_core::TransactionStatus;
use sqlx::{FromRow, PgPool};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

/// payment_transactions 테이블 행
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PaymentTransactionRecord {
    pub id: Uuid,
    pub viewing_request_id: Option<Uuid>,
    pub user_id: Uuid,
    pub provider: String,
    /// PayPal 주문 ID
    pub provider_order_id: String,
    pub payer_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    /// created / completed / failed
    pub status: String,
    #[schema(value_type = Object)]
    pub raw_response: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub struct PaymentRepository;

impl PaymentRepository {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        viewing_request_id: Option<Uuid>,
        provider_order_id: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentTransactionRecord, sqlx::Error> {
        let record = sqlx::query_as::<_, PaymentTransactionRecord>(
            r#"
            INSERT INTO payment_transactions (
                user_id, viewing_request_id, provider, provider_order_id,
                amount, currency, status
            )
            VALUES ($1, $2, 'paypal', $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(viewing_request_id)
        .bind(provider_order_id)
        .bind(amount)
        .bind(currency)
        .bind(TransactionStatus::Created.to_string())
        .fetch_one(pool)
        .await?;

        info!(order_id = %provider_order_id, amount = %amount, "결제 트랜잭션 생성");
        Ok(record)
    }

    pub async fn find_by_order_id(
        pool: &PgPool,
        provider_order_id: &str,
    ) -> Result<Option<PaymentTransactionRecord>, sqlx::Error> {
        sqlx::query_as::<_, PaymentTransactionRecord>(
            "SELECT * FROM payment_transactions WHERE provider_order_id = $1",
        )
        .bind(provider_order_id)
        .fetch_optional(pool)
        .await
    }

    /// 캡처 결과 반영
    pub async fn record_capture(
        pool: &PgPool,
        provider_order_id: &str,
        status: TransactionStatus,
        payer_id: Option<&str>,
        raw_response: &JsonValue,
    ) -> Result<PaymentTransactionRecord, sqlx::Error> {
        let record = sqlx::query_as::<_, PaymentTransactionRecord>(
            r#"
            UPDATE payment_transactions
            SET status = $2,
                payer_id = COALESCE($3, payer_id),
                raw_response = $4,
                completed_at = CASE WHEN $2 = 'completed' THEN NOW() ELSE completed_at END
            WHERE provider_order_id = $1
            RETURNING *
            "#,
        )
        .bind(provider_order_id)
        .bind(status.to_string())
        .bind(payer_id)
        .bind(raw_response)
        .fetch_one(pool)
        .await?;

        info!(order_id = %provider_order_id, status = %status, "결제 캡처 기록");
        Ok(record)
    }
}
