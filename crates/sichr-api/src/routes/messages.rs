//! 메시지 API 라우트

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::{bad_request, db_error, db_not_configured, forbidden, not_found, ApiError, ApiResult},
    extract::ValidatedJson,
    repository::{ConversationRecord, MessageRecord, MessageRepository, UserRepository},
    state::AppState,
};

// ==================== 타입 정의 ====================

/// 메시지 전송 요청
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessageRequest {
    #[serde(alias = "recipientId")]
    pub recipient_id: Uuid,
    #[serde(alias = "apartmentId")]
    pub apartment_id: Option<Uuid>,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendMessageResponse {
    pub success: bool,
    pub conversation_id: Uuid,
    pub message: MessageRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationListResponse {
    pub success: bool,
    pub conversations: Vec<ConversationRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageListResponse {
    pub success: bool,
    pub conversation: ConversationRecord,
    pub messages: Vec<MessageRecord>,
    /// 이번 조회로 읽음 처리된 건수
    pub marked_read: u64,
}

// ==================== 핸들러 ====================

/// 메시지 전송
#[utoipa::path(
    post,
    path = "/api/send-message",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "전송 완료", body = SendMessageResponse),
        (status = 400, description = "입력값 오류", body = ApiError),
        (status = 404, description = "수신자 없음", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<SendMessageResponse>)> {
    if req.recipient_id == auth.id {
        return Err(bad_request("자기 자신에게는 메시지를 보낼 수 없습니다"));
    }
    let content = req.content.trim();
    if content.is_empty() {
        return Err(bad_request("메시지 내용이 비어 있습니다"));
    }
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    UserRepository::find_by_id(db_pool, req.recipient_id)
        .await
        .map_err(|e| db_error("수신자 조회 실패", e))?
        .ok_or_else(|| not_found("수신자를 찾을 수 없습니다"))?;

    let conversation =
        MessageRepository::find_or_create_conversation(db_pool, req.apartment_id, auth.id, req.recipient_id)
            .await
            .map_err(|e| db_error("대화 조회 실패", e))?;

    let message = MessageRepository::insert_message(db_pool, conversation.id, auth.id, content)
        .await
        .map_err(|e| db_error("메시지 저장 실패", e))?;

    debug!(conversation_id = %conversation.id, sender_id = %auth.id, "메시지 전송");

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            success: true,
            conversation_id: conversation.id,
            message,
        }),
    ))
}

/// 내 대화 목록
#[utoipa::path(
    get,
    path = "/api/conversations",
    responses((status = 200, description = "대화 목록", body = ConversationListResponse)),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<ConversationListResponse>> {
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let conversations = MessageRepository::list_conversations(db_pool, auth.id)
        .await
        .map_err(|e| db_error("대화 조회 실패", e))?;

    Ok(Json(ConversationListResponse {
        success: true,
        conversations,
    }))
}

/// 대화의 메시지 목록 (받은 메시지 읽음 처리)
#[utoipa::path(
    get,
    path = "/api/conversations/{id}/messages",
    params(("id" = Uuid, Path, description = "대화 ID")),
    responses(
        (status = 200, description = "메시지 목록", body = MessageListResponse),
        (status = 403, description = "참여자 아님", body = ApiError),
        (status = 404, description = "대화 없음", body = ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageListResponse>> {
    let db_pool = state.db_pool.as_ref().ok_or_else(db_not_configured)?;

    let conversation = MessageRepository::find_conversation(db_pool, id)
        .await
        .map_err(|e| db_error("대화 조회 실패", e))?
        .ok_or_else(|| not_found("대화를 찾을 수 없습니다"))?;

    let participant = conversation.has_participant(auth.id);
    if !participant && !auth.role.is_admin() {
        return Err(forbidden("대화 참여자만 조회할 수 있습니다"));
    }

    // 관리자 열람은 읽음 처리하지 않음
    let marked_read = if participant {
        MessageRepository::mark_read(db_pool, id, auth.id)
            .await
            .map_err(|e| db_error("읽음 처리 실패", e))?
    } else {
        0
    };

    let messages = MessageRepository::list_messages(db_pool, id)
        .await
        .map_err(|e| db_error("메시지 조회 실패", e))?;

    Ok(Json(MessageListResponse {
        success: true,
        conversation,
        messages,
        marked_read,
    }))
}

// ==================== 라우터 ====================

pub fn messages_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/send-message", post(send_message))
        .route("/conversations", get(list_conversations))
        .route("/conversations/{id}/messages", get(list_messages))
}
