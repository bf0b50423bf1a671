//! 사용자 Repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sichr_core::UserRole;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

/// users 테이블 행
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub gdpr_consent: bool,
    pub gdpr_consent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// 저장된 역할 (알 수 없는 값은 tenant)
    pub fn role(&self) -> UserRole {
        self.role.parse().unwrap_or_default()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// 외부로 노출하는 사용자 정보 (비밀번호 해시 제외)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// tenant / landlord / admin
    pub role: String,
    pub gdpr_consent: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            gdpr_consent: user.gdpr_consent,
            created_at: user.created_at,
        }
    }
}

/// 신규 사용자
#[derive(Debug, Clone)]
pub struct NewUser {
    /// 소문자로 정규화된 이메일
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub gdpr_consent: bool,
}

pub struct UserRepository;

impl UserRepository {
    /// 사용자 생성
    ///
    /// 이메일 중복 시 unique violation(23505) 에러가 반환됩니다.
    pub async fn create(pool: &PgPool, user: &NewUser) -> Result<UserRecord, sqlx::Error> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (
                email, password_hash, first_name, last_name, role,
                gdpr_consent, gdpr_consent_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, CASE WHEN $6 THEN NOW() END)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.to_string())
        .bind(user.gdpr_consent)
        .fetch_one(pool)
        .await?;

        info!(user_id = %record.id, role = %record.role, "사용자 등록");
        Ok(record)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = LOWER($1)")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 최근 가입 순 목록
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// 사용자 삭제 (연관 데이터는 FK CASCADE로 함께 삭제)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        debug!(user_id = %id, rows = result.rows_affected(), "사용자 삭제");
        Ok(result.rows_affected() > 0)
    }
}
