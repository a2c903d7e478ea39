use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{ConversationId, Timestamp, UserId};

/// 会话列表里没有任何消息时显示的摘要。
pub const EMPTY_CONVERSATION_SUMMARY: &str = "No messages yet.";

/// 无序的参与者对，内部总是按 `(low, high)` 规范化存储，
/// 因此 `(A, B)` 和 `(B, A)` 得到同一个值，可以直接作为唯一键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantPair {
    low: UserId,
    high: UserId,
}

impl ParticipantPair {
    pub fn new(a: UserId, b: UserId) -> Result<Self, DomainError> {
        if a == b {
            return Err(DomainError::invalid_argument(
                "participants",
                "a conversation needs two distinct users",
            ));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { low, high })
    }

    pub fn low(&self) -> UserId {
        self.low
    }

    pub fn high(&self) -> UserId {
        self.high
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.low == *user || self.high == *user
    }

    /// 返回对方；`user` 不在这对参与者中时返回 `None`。
    pub fn other(&self, user: &UserId) -> Option<UserId> {
        if self.low == *user {
            Some(self.high)
        } else if self.high == *user {
            Some(self.low)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub participants: ParticipantPair,
    pub last_message: Option<String>,
    pub last_message_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Conversation {
    pub fn open(id: ConversationId, participants: ParticipantPair, now: Timestamp) -> Self {
        Self {
            id,
            participants,
            last_message: None,
            last_message_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 刷新反范式化的最后一条消息摘要。
    /// 记录最后一条消息摘要。比当前摘要更旧的消息被忽略，返回是否生效。
    pub fn record_last_message(&mut self, summary: impl Into<String>, at: Timestamp) -> bool {
        if self.last_message_at.is_some_and(|last| last > at) {
            return false;
        }
        self.last_message = Some(summary.into());
        self.last_message_at = Some(at);
        self.updated_at = at;
        true
    }

    pub fn summary_or_placeholder(&self) -> &str {
        self.last_message
            .as_deref()
            .unwrap_or(EMPTY_CONVERSATION_SUMMARY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn pair_is_unordered() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_eq!(
            ParticipantPair::new(a, b).unwrap(),
            ParticipantPair::new(b, a).unwrap()
        );
    }

    #[test]
    fn pair_rejects_self_conversation() {
        let a = UserId::generate();
        assert!(ParticipantPair::new(a, a).is_err());
    }

    #[test]
    fn other_participant() {
        let a = UserId::generate();
        let b = UserId::generate();
        let pair = ParticipantPair::new(a, b).unwrap();
        assert_eq!(pair.other(&a), Some(b));
        assert_eq!(pair.other(&b), Some(a));
        assert_eq!(pair.other(&UserId::generate()), None);
    }

    #[test]
    fn summary_defaults_to_placeholder() {
        let pair = ParticipantPair::new(UserId::generate(), UserId::generate()).unwrap();
        let mut convo = Conversation::open(ConversationId::generate(), pair, Utc::now());
        assert_eq!(convo.summary_or_placeholder(), EMPTY_CONVERSATION_SUMMARY);
        let later = Utc::now();
        assert!(convo.record_last_message("hi", later));
        assert_eq!(convo.summary_or_placeholder(), "hi");
        assert_eq!(convo.last_message_at, Some(later));
        assert_eq!(convo.updated_at, later);
    }

    #[test]
    fn older_message_does_not_replace_summary() {
        let pair = ParticipantPair::new(UserId::generate(), UserId::generate()).unwrap();
        let opened = Utc::now();
        let mut convo = Conversation::open(ConversationId::generate(), pair, opened);
        let newer = opened + chrono::Duration::seconds(10);
        let older = opened + chrono::Duration::seconds(5);

        assert!(convo.record_last_message("newer", newer));
        assert!(!convo.record_last_message("older", older));
        assert_eq!(convo.summary_or_placeholder(), "newer");
        assert_eq!(convo.last_message_at, Some(newer));
        assert_eq!(convo.updated_at, newer);

        // 同一时刻的消息仍然生效
        assert!(convo.record_last_message("same instant", newer));
        assert_eq!(convo.summary_or_placeholder(), "same instant");
    }
}
