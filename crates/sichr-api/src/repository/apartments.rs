//! 매물 Repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

/// apartments 테이블 행
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ApartmentRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub city: String,
    pub address: Option<String>,
    /// 월세
    pub rent: Decimal,
    /// 보증금
    pub deposit: Option<Decimal>,
    pub rooms: i32,
    pub size_sqm: Option<Decimal>,
    pub available_from: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 신규 매물
#[derive(Debug, Clone)]
pub struct NewApartment {
    pub title: String,
    pub description: Option<String>,
    pub city: String,
    pub address: Option<String>,
    pub rent: Decimal,
    pub deposit: Option<Decimal>,
    pub rooms: i32,
    pub size_sqm: Option<Decimal>,
    pub available_from: Option<NaiveDate>,
}

/// 목록 조회 필터
#[derive(Debug, Clone, Default)]
pub struct ApartmentFilter {
    /// 도시 (대소문자 무시, 부분 일치)
    pub city: Option<String>,
    pub max_rent: Option<Decimal>,
    pub min_rooms: Option<i32>,
    pub limit: i64,
    pub offset: i64,
}

pub struct ApartmentRepository;

impl ApartmentRepository {
    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        apartment: &NewApartment,
    ) -> Result<ApartmentRecord, sqlx::Error> {
        let record = sqlx::query_as::<_, ApartmentRecord>(
            r#"
            INSERT INTO apartments (
                owner_id, title, description, city, address,
                rent, deposit, rooms, size_sqm, available_from
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(&apartment.title)
        .bind(&apartment.description)
        .bind(&apartment.city)
        .bind(&apartment.address)
        .bind(apartment.rent)
        .bind(apartment.deposit)
        .bind(apartment.rooms)
        .bind(apartment.size_sqm)
        .bind(apartment.available_from)
        .fetch_one(pool)
        .await?;

        info!(apartment_id = %record.id, owner_id = %owner_id, city = %record.city, "매물 등록");
        Ok(record)
    }

    /// 활성 매물 목록 (최신순)
    pub async fn list(pool: &PgPool, filter: &ApartmentFilter) -> Result<Vec<ApartmentRecord>, sqlx::Error> {
        let city_pattern = filter.city.as_ref().map(|c| format!("%{}%", c.trim()));

        sqlx::query_as::<_, ApartmentRecord>(
            r#"
            SELECT * FROM apartments
            WHERE is_active = TRUE
              AND ($1::text IS NULL OR city ILIKE $1)
              AND ($2::numeric IS NULL OR rent <= $2)
              AND ($3::int IS NULL OR rooms >= $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(city_pattern)
        .bind(filter.max_rent)
        .bind(filter.min_rooms)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ApartmentRecord>, sqlx::Error> {
        sqlx::query_as::<_, ApartmentRecord>("SELECT * FROM apartments WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 소유자의 매물 (데이터 내보내기용)
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<ApartmentRecord>, sqlx::Error> {
        sqlx::query_as::<_, ApartmentRecord>(
            "SELECT * FROM apartments WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM apartments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        info!(apartment_id = %id, "매물 삭제");
        Ok(result.rows_affected() > 0)
    }
}
