//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务（匹配、会话、通知），目录存储端口，
//! 以及进程内的实时中心和内存存储实现。

pub mod broadcaster;
pub mod clock;
pub mod dto;
pub mod error;
pub mod hub;
pub mod memory;
pub mod repository;
pub mod services;

pub use broadcaster::{BroadcastError, EventBroadcaster, RealtimeEvent, Room};
pub use clock::{Clock, SystemClock};
pub use dto::{ChatView, ConversationListItem, LikeOutcome, MessageView};
pub use error::ApplicationError;
pub use hub::{ConnectionId, HubConnection, RealtimeHub, DEFAULT_CONNECTION_BUFFER};
pub use memory::memory_directory;
pub use repository::{
    BroadcastRepository, ConversationRepository, Directory, MessageRepository,
    NotificationRepository, UserRepository,
};
pub use services::{
    AppendMessageRequest, ConversationService, ConversationServiceDependencies, MatchService,
    MatchServiceDependencies, MessageContent, NotificationService,
    NotificationServiceDependencies, NotifyRequest, DEFAULT_DISCOVERY_PAGE_SIZE,
};
