use std::fmt;

use async_trait::async_trait;
use domain::{ConversationId, Notification, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dto::MessageView;

/// 实时中心的可寻址房间：会话房间 + 每个用户的个人房间。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Room {
    Conversation(ConversationId),
    Personal(UserId),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Conversation(id) => write!(f, "conversation:{id}"),
            Room::Personal(id) => write!(f, "user:{id}"),
        }
    }
}

/// 推送给客户端的事件，序列化为 `{"event": ..., "payload": ...}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum RealtimeEvent {
    #[serde(rename = "message")]
    Message(MessageView),
    #[serde(rename = "new_notification")]
    NewNotification(Notification),
    #[serde(rename = "error")]
    Error { message: String },
}

impl RealtimeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RealtimeEvent::Message(_) => "message",
            RealtimeEvent::NewNotification(_) => "new_notification",
            RealtimeEvent::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
    #[error("unknown connection {0}")]
    UnknownConnection(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 按房间发布事件。至多一次、非阻塞、尽力而为；返回成功投递的连接数。
#[async_trait]
pub trait EventBroadcaster: Send + Sync {
    async fn publish(&self, room: Room, event: RealtimeEvent) -> Result<usize, BroadcastError>;
}
