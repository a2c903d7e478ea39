//! 社交匹配实时交互核心的领域模型
//!
//! 包含用户及其关系集合、会话、消息、通知等核心实体，以及发现页过滤规则。

pub mod conversation;
pub mod discovery;
pub mod errors;
pub mod message;
pub mod notification;
pub mod user;
pub mod user_set;
pub mod value_objects;

// 重新导出常用类型
pub use conversation::{Conversation, ParticipantPair, EMPTY_CONVERSATION_SUMMARY};
pub use discovery::DiscoveryFilter;
pub use errors::{DomainError, DomainResult, RepositoryError};
pub use message::{Message, MessageDraft, MessageType, IMAGE_MESSAGE_SUMMARY};
pub use notification::{Broadcast, Notification, NotificationType};
pub use user::{
    blocked_between, AgeRange, Gender, GenderInterest, Preferences, RelationSet, User, UserRole,
    UserStatus, UserSummary,
};
pub use user_set::UserSet;
pub use value_objects::{
    BroadcastId, ConversationId, MessageId, NotificationId, Photo, Timestamp, UserId,
};
