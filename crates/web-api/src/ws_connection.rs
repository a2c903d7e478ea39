use application::{
    AppendMessageRequest, ApplicationError, ConnectionId, HubConnection, MessageContent,
    RealtimeEvent, Room,
};
use axum::extract::ws::{Message as WsMessage, WebSocket};
use domain::{ConversationId, UserId};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::ApiError;
use crate::state::AppState;

/// 客户端发来的帧：`{"event": ..., "payload": ...}`
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "payload")]
enum ClientFrame {
    #[serde(rename = "joinChat")]
    JoinChat(ConversationId),
    #[serde(rename = "leaveChat")]
    LeaveChat(ConversationId),
    #[serde(rename = "chatMessage")]
    ChatMessage(ChatMessagePayload),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatMessagePayload {
    conversation_id: ConversationId,
    sender_id: UserId,
    content: String,
}

/// WebSocket 连接
///
/// 一个已认证的会话：在实时中心注册后自动订阅个人房间，
/// 之后按客户端帧加入或离开会话房间、发送消息。
pub struct WebSocketConnection {
    socket: WebSocket,
    state: AppState,
    connection: HubConnection,
}

impl WebSocketConnection {
    pub async fn new(socket: WebSocket, state: AppState, user_id: UserId) -> Self {
        let connection = state.hub.connect(user_id).await;
        tracing::info!(user_id = %user_id, connection = %connection.id, "websocket session opened");

        Self {
            socket,
            state,
            connection,
        }
    }

    /// 运行连接主循环，直到任意一端关闭
    pub async fn run(self) {
        let Self {
            socket,
            state,
            connection,
        } = self;
        let HubConnection {
            id: connection_id,
            user_id,
            events: mut hub_events,
        } = connection;

        let (mut sender, mut incoming) = socket.split();
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<WsCommand>(32);

        // 发送任务：所有对 sender 的写操作都在这里
        let mut send_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(cmd) = cmd_rx.recv() => {
                        let WsCommand::SendPong(data) = cmd;
                        if sender.send(WsMessage::Pong(data.into())).await.is_err() {
                            tracing::warn!("failed to send pong");
                            break;
                        }
                    }
                    Some(event) = hub_events.recv() => {
                        let payload = match serde_json::to_string(event.as_ref()) {
                            Ok(json) => json,
                            Err(err) => {
                                tracing::warn!(error = %err, event = event.name(), "failed to serialize websocket payload");
                                continue;
                            }
                        };
                        if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                            tracing::debug!("websocket sink closed");
                            break;
                        }
                    }
                    else => break,
                }
            }
        });

        let mut recv_task = {
            let state = state.clone();
            tokio::spawn(async move {
                while let Some(Ok(message)) = incoming.next().await {
                    match message {
                        WsMessage::Close(_) => break,
                        WsMessage::Ping(data) => {
                            if cmd_tx.send(WsCommand::SendPong(data.to_vec())).await.is_err() {
                                break;
                            }
                        }
                        WsMessage::Pong(_) => {}
                        WsMessage::Text(text) => {
                            handle_frame(&state, connection_id, user_id, text.as_str()).await;
                        }
                        WsMessage::Binary(_) => {
                            reply_error(&state, connection_id, "binary frames are not supported")
                                .await;
                        }
                    }
                }
            })
        };

        tokio::select! {
            _ = &mut send_task => recv_task.abort(),
            _ = &mut recv_task => send_task.abort(),
        }

        state.hub.disconnect(connection_id).await;
        tracing::info!(user_id = %user_id, connection = %connection_id, "websocket session closed");
    }
}

/// 处理一条文本帧。错误只回给当前会话。
async fn handle_frame(state: &AppState, connection_id: ConnectionId, user_id: UserId, text: &str) {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::debug!(connection = %connection_id, error = %err, "malformed client frame");
            reply_error(state, connection_id, format!("malformed frame: {err}")).await;
            return;
        }
    };

    let result = match frame {
        ClientFrame::JoinChat(conversation_id) => {
            join_chat(state, connection_id, user_id, conversation_id).await
        }
        ClientFrame::LeaveChat(conversation_id) => {
            state
                .hub
                .leave(connection_id, Room::Conversation(conversation_id))
                .await;
            Ok(())
        }
        ClientFrame::ChatMessage(payload) => {
            if payload.sender_id != user_id {
                reply_error(state, connection_id, "senderId does not match the authenticated user")
                    .await;
                return;
            }
            state
                .conversation_service
                .append_message(AppendMessageRequest {
                    conversation_id: payload.conversation_id,
                    sender_id: user_id,
                    content: MessageContent::Text(payload.content),
                })
                .await
                .map(|_| ())
        }
    };

    if let Err(err) = result {
        let api_error = ApiError::from(err);
        reply_error(state, connection_id, api_error.message().to_owned()).await;
    }
}

async fn join_chat(
    state: &AppState,
    connection_id: ConnectionId,
    user_id: UserId,
    conversation_id: ConversationId,
) -> Result<(), ApplicationError> {
    state
        .conversation_service
        .ensure_participant(conversation_id, user_id)
        .await?;
    state
        .hub
        .join(connection_id, Room::Conversation(conversation_id))
        .await?;
    Ok(())
}

async fn reply_error(state: &AppState, connection_id: ConnectionId, message: impl Into<String>) {
    let event = RealtimeEvent::Error {
        message: message.into(),
    };
    if !state.hub.send_to(connection_id, event).await {
        tracing::debug!(connection = %connection_id, "error reply dropped");
    }
}

/// 写操作命令
#[derive(Debug)]
enum WsCommand {
    SendPong(Vec<u8>),
}
