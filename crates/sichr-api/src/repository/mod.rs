//! Repository 계층.
//!
//! 각 Repository는 `&PgPool`을 받는 정적 async 함수로 구성됩니다.

pub mod apartments;
pub mod gdpr;
pub mod messages;
pub mod payments;
pub mod users;
pub mod viewing_requests;

pub use apartments::{ApartmentFilter, ApartmentRecord, ApartmentRepository, NewApartment};
pub use gdpr::{ConsentRecord, GdprRepository, GdprRequestRecord};
pub use messages::{ConversationRecord, MessageRecord, MessageRepository};
pub use payments::{PaymentRepository, PaymentTransactionRecord};
pub use users::{NewUser, UserProfile, UserRecord, UserRepository};
pub use viewing_requests::{
    NewViewingRequest, StatusCount, ViewingRequestRecord, ViewingRequestRepository,
};

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// 유일성 제약 위반 에러인지 확인
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

/// 테이블별 행 수 (관리자 대시보드)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TableCounts {
    pub users: i64,
    pub apartments: i64,
    pub viewing_requests: i64,
    pub conversations: i64,
    pub messages: i64,
    pub pending_gdpr_requests: i64,
    pub completed_payments: i64,
}

pub async fn table_counts(pool: &PgPool) -> Result<TableCounts, sqlx::Error> {
    sqlx::query_as::<_, TableCounts>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS users,
            (SELECT COUNT(*) FROM apartments) AS apartments,
            (SELECT COUNT(*) FROM viewing_requests) AS viewing_requests,
            (SELECT COUNT(*) FROM conversations) AS conversations,
            (SELECT COUNT(*) FROM messages) AS messages,
            (SELECT COUNT(*) FROM gdpr_requests WHERE status = 'pending') AS pending_gdpr_requests,
            (SELECT COUNT(*) FROM payment_transactions WHERE status = 'completed') AS completed_payments
        "#,
    )
    .fetch_one(pool)
    .await
}
