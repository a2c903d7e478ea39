use axum::{
    extract::{ws::WebSocketUpgrade, Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use application::{
    AppendMessageRequest, ApplicationError, ChatView, ConversationListItem, LikeOutcome,
    MessageContent, MessageView,
};
use domain::{Broadcast, BroadcastId, ConversationId, Notification, Photo, UserId, UserSummary};

use crate::{auth::AuthUser, error::ApiError, state::AppState, ws_connection::WebSocketConnection};

#[derive(Debug, Deserialize)]
struct TextMessagePayload {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ImageMessagePayload {
    url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct BroadcastPayload {
    message: String,
}

#[derive(Debug, Serialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
struct UnblockResponse {
    unblocked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationsResponse {
    notifications: Vec<Notification>,
    unread_count: u64,
}

#[derive(Debug, Serialize)]
struct MarkReadResponse {
    updated: u64,
}

#[derive(Debug, Serialize)]
struct BroadcastResponse {
    broadcast: Broadcast,
    delivered: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/discover", get(discover))
        .route("/discover/like/{id}", post(like_user))
        .route("/discover/dislike/{id}", post(dislike_user))
        .route("/users/{id}/block", post(block_user).delete(unblock_user))
        .route("/matches", get(list_matches))
        .route("/chats", get(list_chats))
        .route("/chats/{id}", get(open_chat))
        .route("/chats/{id}/messages", post(send_text_message))
        .route("/chats/{id}/images", post(send_image_message))
        .route("/notifications", get(list_notifications))
        .route("/notifications/read", post(mark_notifications_read))
        .route("/admin/broadcasts", post(create_broadcast))
        .route("/broadcasts/{id}", get(get_broadcast))
        .route("/ws", get(websocket_upgrade))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn discover(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let candidates = state.match_service.discover(user_id).await?;
    Ok(Json(candidates))
}

async fn like_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target_id): Path<Uuid>,
) -> Result<Json<LikeOutcome>, ApiError> {
    let outcome = state
        .match_service
        .like(user_id, UserId::from(target_id))
        .await?;
    Ok(Json(outcome))
}

async fn dislike_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target_id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .match_service
        .dislike(user_id, UserId::from(target_id))
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn block_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .match_service
        .block(user_id, UserId::from(target_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unblock_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target_id): Path<Uuid>,
) -> Result<Json<UnblockResponse>, ApiError> {
    let unblocked = state
        .match_service
        .unblock(user_id, UserId::from(target_id))
        .await?;
    Ok(Json(UnblockResponse { unblocked }))
}

async fn list_matches(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    Ok(Json(state.match_service.list_matches(user_id).await?))
}

async fn list_chats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ConversationListItem>>, ApiError> {
    Ok(Json(
        state.conversation_service.list_conversations(user_id).await?,
    ))
}

/// 以对方用户 id 打开聊天，不存在会话时创建
async fn open_chat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(other_id): Path<Uuid>,
) -> Result<Json<ChatView>, ApiError> {
    let view = state
        .conversation_service
        .open_chat(user_id, UserId::from(other_id))
        .await?;
    Ok(Json(view))
}

async fn send_text_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<TextMessagePayload>,
) -> Result<(StatusCode, Json<MessageView>), ApiError> {
    let view = state
        .conversation_service
        .append_message(AppendMessageRequest {
            conversation_id: ConversationId::from(conversation_id),
            sender_id: user_id,
            content: MessageContent::Text(payload.content),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// 图片已经由上传服务保存，这里只记录地址和 public_id
async fn send_image_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<ImageMessagePayload>,
) -> Result<(StatusCode, Json<MessageView>), ApiError> {
    let photo = Photo::new(payload.url, payload.public_id).map_err(ApplicationError::from)?;
    let view = state
        .conversation_service
        .append_message(AppendMessageRequest {
            conversation_id: ConversationId::from(conversation_id),
            sender_id: user_id,
            content: MessageContent::Image(photo),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<NotificationsResponse>, ApiError> {
    let notifications = state.notification_service.list(user_id).await?;
    let unread_count = state.notification_service.unread_count(user_id).await?;
    Ok(Json(NotificationsResponse {
        notifications,
        unread_count,
    }))
}

async fn mark_notifications_read(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let updated = state.notification_service.mark_all_read(user_id).await?;
    Ok(Json(MarkReadResponse { updated }))
}

async fn create_broadcast(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<BroadcastPayload>,
) -> Result<(StatusCode, Json<BroadcastResponse>), ApiError> {
    let (broadcast, delivered) = state
        .notification_service
        .broadcast(user_id, payload.message)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(BroadcastResponse {
            broadcast,
            delivered,
        }),
    ))
}

async fn get_broadcast(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(broadcast_id): Path<Uuid>,
) -> Result<Json<Broadcast>, ApiError> {
    let broadcast = state
        .notification_service
        .get_broadcast(BroadcastId::from(broadcast_id))
        .await?;
    Ok(Json(broadcast))
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    token: String,
}

/// 浏览器无法为 WebSocket 设置请求头，令牌从查询参数传入
async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let claims = state.jwt_service.verify_token(&query.token)?;
    let user_id = UserId::from(claims.user_id);

    Ok(ws.on_upgrade(move |socket| async move {
        WebSocketConnection::new(socket, state, user_id)
            .await
            .run()
            .await;
    }))
}
