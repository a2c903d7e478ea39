use domain::{ConversationId, Message, Timestamp, UserSummary};
use serde::{Deserialize, Serialize};

/// 推送和历史记录里使用的消息视图：完整消息 + 发送者展示字段。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub sender: UserSummary,
}

/// like 的结果：`matched` 为真时带上对方的最小摘要。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
    #[serde(rename = "match")]
    pub matched: bool,
    #[serde(rename = "targetUser", skip_serializing_if = "Option::is_none")]
    pub target: Option<UserSummary>,
}

impl LikeOutcome {
    pub fn no_match() -> Self {
        Self {
            matched: false,
            target: None,
        }
    }

    pub fn matched_with(target: UserSummary) -> Self {
        Self {
            matched: true,
            target: Some(target),
        }
    }
}

/// 会话列表项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationListItem {
    pub conversation_id: ConversationId,
    pub other_user: UserSummary,
    pub last_message: String,
    pub updated_at: Timestamp,
}

/// 打开某个聊天时返回的内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub conversation_id: ConversationId,
    pub other_user: UserSummary,
    pub messages: Vec<MessageView>,
}
