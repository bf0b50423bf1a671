//! 대화/메시지 Repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

/// conversations 테이블 행
///
/// 참여자는 항상 `participant_a < participant_b` 순서로 저장됩니다.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ConversationRecord {
    pub id: Uuid,
    pub apartment_id: Option<Uuid>,
    pub participant_a: Uuid,
    pub participant_b: Uuid,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ConversationRecord {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }
}

/// messages 테이블 행
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MessageRecord {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 두 참여자를 저장 순서로 정렬
fn ordered(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

pub struct MessageRepository;

impl MessageRepository {
    /// 두 사용자 사이(매물 기준)의 대화를 찾거나 생성
    ///
    /// 단일 upsert로 처리하므로 첫 메시지가 동시에 들어와도 대화는 하나만 생깁니다.
    /// `apartment_id`가 NULL인 대화도 `UNIQUE NULLS NOT DISTINCT` 제약으로 중복되지 않습니다.
    pub async fn find_or_create_conversation(
        pool: &PgPool,
        apartment_id: Option<Uuid>,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<ConversationRecord, sqlx::Error> {
        let (a, b) = ordered(user_a, user_b);

        let conversation = sqlx::query_as::<_, ConversationRecord>(
            r#"
            INSERT INTO conversations (apartment_id, participant_a, participant_b)
            VALUES ($1, $2, $3)
            ON CONFLICT (apartment_id, participant_a, participant_b)
            DO UPDATE SET participant_a = EXCLUDED.participant_a
            RETURNING *
            "#,
        )
        .bind(apartment_id)
        .bind(a)
        .bind(b)
        .fetch_one(pool)
        .await?;

        debug!(conversation_id = %conversation.id, "대화 확보");
        Ok(conversation)
    }

    /// 메시지 저장 및 대화의 마지막 메시지 시각 갱신
    pub async fn insert_message(
        pool: &PgPool,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<MessageRecord, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let message = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (conversation_id, sender_id, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET last_message_at = $2 WHERE id = $1")
            .bind(conversation_id)
            .bind(message.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(message)
    }

    pub async fn find_conversation(pool: &PgPool, id: Uuid) -> Result<Option<ConversationRecord>, sqlx::Error> {
        sqlx::query_as::<_, ConversationRecord>("SELECT * FROM conversations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 사용자가 참여한 대화 (최근 메시지 순)
    pub async fn list_conversations(pool: &PgPool, user_id: Uuid) -> Result<Vec<ConversationRecord>, sqlx::Error> {
        sqlx::query_as::<_, ConversationRecord>(
            r#"
            SELECT * FROM conversations
            WHERE participant_a = $1 OR participant_b = $1
            ORDER BY COALESCE(last_message_at, created_at) DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_messages(pool: &PgPool, conversation_id: Uuid) -> Result<Vec<MessageRecord>, sqlx::Error> {
        sqlx::query_as::<_, MessageRecord>(
            "SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
    }

    /// 상대방이 보낸 미확인 메시지를 읽음 처리
    pub async fn mark_read(pool: &PgPool, conversation_id: Uuid, reader_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET read_at = NOW()
            WHERE conversation_id = $1 AND sender_id <> $2 AND read_at IS NULL
            "#,
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// 사용자가 보낸 메시지 전체 (데이터 내보내기용)
    pub async fn list_by_sender(pool: &PgPool, sender_id: Uuid) -> Result<Vec<MessageRecord>, sqlx::Error> {
        sqlx::query_as::<_, MessageRecord>(
            "SELECT * FROM messages WHERE sender_id = $1 ORDER BY created_at ASC",
        )
        .bind(sender_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participants_are_ordered() {
        let x = Uuid::from_u128(1);
        let y = Uuid::from_u128(2);
        assert_eq!(ordered(x, y), (x, y));
        assert_eq!(ordered(y, x), (x, y));
    }
}
