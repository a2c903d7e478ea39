//! 目录存储端口。
//!
//! 目录存储是外部协作方：提供文档读写和原子的集合增删。核心层只依赖
//! 这里的 trait，内存实现在 [`crate::memory`]，PostgreSQL 实现在 infrastructure。

use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    Broadcast, BroadcastId, Conversation, ConversationId, DiscoveryFilter, Message, MessageDraft,
    Notification, ParticipantPair, RelationSet, RepositoryError, Timestamp, User, UserId,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError>;

    // 原子的 addToSet：返回本次是否真正插入。用户不存在时返回 NotFound。
    async fn add_to_set(
        &self,
        id: UserId,
        set: RelationSet,
        member: UserId,
    ) -> Result<bool, RepositoryError>;

    // 原子的 pullFromSet：返回本次是否真正移除。
    async fn pull_from_set(
        &self,
        id: UserId,
        set: RelationSet,
        member: UserId,
    ) -> Result<bool, RepositoryError>;

    async fn find_candidates(
        &self,
        filter: &DiscoveryFilter,
        limit: usize,
    ) -> Result<Vec<User>, RepositoryError>;

    // 公告的接收者：所有 active 的普通用户
    async fn list_broadcast_recipients(&self) -> Result<Vec<UserId>, RepositoryError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, RepositoryError>;

    async fn find_by_pair(
        &self,
        pair: ParticipantPair,
    ) -> Result<Option<Conversation>, RepositoryError>;

    // 同一无序参与者对已存在会话时必须返回 Conflict，而不是插入第二条
    async fn create(&self, conversation: Conversation) -> Result<Conversation, RepositoryError>;

    async fn update_summary(
        &self,
        id: ConversationId,
        summary: &str,
        at: Timestamp,
    ) -> Result<(), RepositoryError>;

    // 按最近更新时间倒序
    async fn list_for_user(&self, user: UserId) -> Result<Vec<Conversation>, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    // 持久化并分配单调递增的序列号
    async fn insert(&self, draft: MessageDraft) -> Result<Message, RepositoryError>;

    // 按 (created_at, sequence) 升序
    async fn list_for_conversation(
        &self,
        conversation: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError>;
    async fn insert_many(&self, notifications: Vec<Notification>) -> Result<usize, RepositoryError>;

    // 按创建时间倒序
    async fn list_for_recipient(&self, user: UserId) -> Result<Vec<Notification>, RepositoryError>;
    async fn mark_all_read(&self, user: UserId) -> Result<u64, RepositoryError>;
    async fn count_unread(&self, user: UserId) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait BroadcastRepository: Send + Sync {
    async fn create(&self, broadcast: Broadcast) -> Result<Broadcast, RepositoryError>;
    async fn find_by_id(&self, id: BroadcastId) -> Result<Option<Broadcast>, RepositoryError>;
}

/// 一个目录存储后端提供的全部仓储。
#[derive(Clone)]
pub struct Directory {
    pub users: Arc<dyn UserRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub broadcasts: Arc<dyn BroadcastRepository>,
}
