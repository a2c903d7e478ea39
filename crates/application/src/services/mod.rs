mod conversation_service;
mod match_service;
mod notification_service;

pub use conversation_service::{
    AppendMessageRequest, ConversationService, ConversationServiceDependencies, MessageContent,
};
pub use match_service::{MatchService, MatchServiceDependencies, DEFAULT_DISCOVERY_PAGE_SIZE};
pub use notification_service::{
    NotificationService, NotificationServiceDependencies, NotifyRequest,
};
