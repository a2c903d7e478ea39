use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{ConversationId, MessageId, Photo, Timestamp, UserId};

/// 图片消息在会话列表里的摘要。
pub const IMAGE_MESSAGE_SUMMARY: &str = "Image 📷";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
}

/// 待持久化的消息。序列号由目录存储在插入时分配。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub message_type: MessageType,
    pub content: String,
    pub media_public_id: Option<String>,
    pub created_at: Timestamp,
}

impl MessageDraft {
    pub fn text(
        conversation_id: ConversationId,
        sender_id: UserId,
        content: impl Into<String>,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::invalid_argument("content", "cannot be empty"));
        }
        Ok(Self {
            id: MessageId::generate(),
            conversation_id,
            sender_id,
            message_type: MessageType::Text,
            content,
            media_public_id: None,
            created_at: now,
        })
    }

    /// 图片已经由外部上传方保存，这里只记录 url / public_id。
    pub fn image(
        conversation_id: ConversationId,
        sender_id: UserId,
        photo: Photo,
        now: Timestamp,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            conversation_id,
            sender_id,
            message_type: MessageType::Image,
            content: photo.url,
            media_public_id: photo.public_id,
            created_at: now,
        }
    }

    pub fn into_message(self, sequence: i64) -> Message {
        Message {
            id: self.id,
            conversation_id: self.conversation_id,
            sender_id: self.sender_id,
            message_type: self.message_type,
            content: self.content,
            media_public_id: self.media_public_id,
            read: false,
            created_at: self.created_at,
            sequence,
        }
    }
}

/// 已持久化的消息，创建后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub message_type: MessageType,
    pub content: String,
    pub media_public_id: Option<String>,
    pub read: bool,
    pub created_at: Timestamp,
    /// 存储分配的单调序列号，用于同一时间戳下的插入顺序。
    pub sequence: i64,
}

impl Message {
    /// 写入会话摘要的文本。
    pub fn summary_text(&self) -> &str {
        match self.message_type {
            MessageType::Text => &self.content,
            MessageType::Image => IMAGE_MESSAGE_SUMMARY,
        }
    }

    /// 会话内的读取顺序：创建时间，其次插入序列。
    pub fn history_order(a: &Message, b: &Message) -> Ordering {
        a.created_at
            .cmp(&b.created_at)
            .then(a.sequence.cmp(&b.sequence))
    }
}
