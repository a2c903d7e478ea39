//! 通知与管理员公告实体

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{BroadcastId, NotificationId, Timestamp, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewMatch,
    AdminBroadcast,
    NewMessage,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::NewMatch => "new_match",
            NotificationType::AdminBroadcast => "admin_broadcast",
            NotificationType::NewMessage => "new_message",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new_match" => Some(NotificationType::NewMatch),
            "admin_broadcast" => Some(NotificationType::AdminBroadcast),
            "new_message" => Some(NotificationType::NewMessage),
            _ => None,
        }
    }
}

/// 通知实体
///
/// 创建一次；`read` 只会经由“全部标记已读”从 false 变为 true。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub sender_id: Option<UserId>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: Timestamp,
}

impl Notification {
    pub fn new(
        recipient_id: UserId,
        sender_id: Option<UserId>,
        notification_type: NotificationType,
        message: impl Into<String>,
        link: Option<String>,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(DomainError::invalid_argument("message", "cannot be empty"));
        }
        Ok(Self {
            id: NotificationId::generate(),
            recipient_id,
            sender_id,
            notification_type,
            message,
            link,
            read: false,
            created_at: now,
        })
    }
}

/// 管理员公告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    pub id: BroadcastId,
    pub admin_id: UserId,
    pub message: String,
    pub created_at: Timestamp,
}

impl Broadcast {
    pub fn new(admin_id: UserId, message: impl Into<String>, now: Timestamp) -> Result<Self, DomainError> {
        let message = message.into().trim().to_owned();
        if message.is_empty() {
            return Err(DomainError::invalid_argument(
                "message",
                "broadcast message cannot be empty",
            ));
        }
        Ok(Self {
            id: BroadcastId::generate(),
            admin_id,
            message,
            created_at: now,
        })
    }

    /// 公告通知里携带的深链接。
    pub fn link(&self) -> String {
        format!("/broadcasts/{}", self.id)
    }
}
