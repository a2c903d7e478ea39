//! 进程内的目录存储实现。
//!
//! 用于开发环境（未配置数据库时）和所有测试。语义与 PostgreSQL 实现保持一致：
//! 集合增删是原子且幂等的，会话在无序参与者对上唯一，消息序列号单调递增。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    Broadcast, BroadcastId, Conversation, ConversationId, DiscoveryFilter, Message, MessageDraft,
    Notification, ParticipantPair, RelationSet, RepositoryError, Timestamp, User, UserId,
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::repository::{
    BroadcastRepository, ConversationRepository, Directory, MessageRepository,
    NotificationRepository, UserRepository,
};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn add_to_set(
        &self,
        id: UserId,
        set: RelationSet,
        member: UserId,
    ) -> Result<bool, RepositoryError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        Ok(user.relation_mut(set).insert(member))
    }

    async fn pull_from_set(
        &self,
        id: UserId,
        set: RelationSet,
        member: UserId,
    ) -> Result<bool, RepositoryError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        Ok(user.relation_mut(set).remove(&member))
    }

    async fn find_candidates(
        &self,
        filter: &DiscoveryFilter,
        limit: usize,
    ) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.read().await;
        let mut candidates: Vec<User> = users
            .values()
            .filter(|user| filter.admits(user))
            .cloned()
            .collect();
        candidates.sort_by_key(|user| user.created_at);
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn list_broadcast_recipients(&self) -> Result<Vec<UserId>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|user| user.is_discoverable())
            .map(|user| user.id)
            .collect())
    }
}

#[derive(Default)]
struct ConversationTable {
    by_id: HashMap<ConversationId, Conversation>,
    by_pair: HashMap<ParticipantPair, ConversationId>,
}

#[derive(Default)]
pub struct MemoryConversationRepository {
    table: RwLock<ConversationTable>,
}

#[async_trait]
impl ConversationRepository for MemoryConversationRepository {
    async fn find_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.table.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_pair(
        &self,
        pair: ParticipantPair,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let table = self.table.read().await;
        Ok(table
            .by_pair
            .get(&pair)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn create(&self, conversation: Conversation) -> Result<Conversation, RepositoryError> {
        let mut table = self.table.write().await;
        if table.by_pair.contains_key(&conversation.participants)
            || table.by_id.contains_key(&conversation.id)
        {
            return Err(RepositoryError::Conflict);
        }
        table
            .by_pair
            .insert(conversation.participants, conversation.id);
        table.by_id.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn update_summary(
        &self,
        id: ConversationId,
        summary: &str,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut table = self.table.write().await;
        let conversation = table.by_id.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        if !conversation.record_last_message(summary, at) {
            debug!(conversation = %id, "stale summary update ignored");
        }
        Ok(())
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Conversation>, RepositoryError> {
        let table = self.table.read().await;
        let mut items: Vec<Conversation> = table
            .by_id
            .values()
            .filter(|conversation| conversation.participants.contains(&user))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(items)
    }
}

#[derive(Default)]
struct MessageLog {
    next_sequence: i64,
    by_conversation: HashMap<ConversationId, Vec<Message>>,
}

#[derive(Default)]
pub struct MemoryMessageRepository {
    log: RwLock<MessageLog>,
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn insert(&self, draft: MessageDraft) -> Result<Message, RepositoryError> {
        let mut log = self.log.write().await;
        log.next_sequence += 1;
        let message = draft.into_message(log.next_sequence);
        log.by_conversation
            .entry(message.conversation_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn list_for_conversation(
        &self,
        conversation: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let log = self.log.read().await;
        let mut items = log
            .by_conversation
            .get(&conversation)
            .cloned()
            .unwrap_or_default();
        items.sort_by(Message::history_order);
        Ok(items)
    }
}

#[derive(Default)]
pub struct MemoryNotificationRepository {
    items: RwLock<Vec<Notification>>,
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        self.items.write().await.push(notification.clone());
        Ok(notification)
    }

    async fn insert_many(&self, notifications: Vec<Notification>) -> Result<usize, RepositoryError> {
        let count = notifications.len();
        self.items.write().await.extend(notifications);
        Ok(count)
    }

    async fn list_for_recipient(&self, user: UserId) -> Result<Vec<Notification>, RepositoryError> {
        let items = self.items.read().await;
        // 插入顺序倒过来即为创建时间倒序
        Ok(items
            .iter()
            .rev()
            .filter(|n| n.recipient_id == user)
            .cloned()
            .collect())
    }

    async fn mark_all_read(&self, user: UserId) -> Result<u64, RepositoryError> {
        let mut items = self.items.write().await;
        let mut updated = 0;
        for notification in items
            .iter_mut()
            .filter(|n| n.recipient_id == user && !n.read)
        {
            notification.read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn count_unread(&self, user: UserId) -> Result<u64, RepositoryError> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .filter(|n| n.recipient_id == user && !n.read)
            .count() as u64)
    }
}

#[derive(Default)]
pub struct MemoryBroadcastRepository {
    items: RwLock<HashMap<BroadcastId, Broadcast>>,
}

#[async_trait]
impl BroadcastRepository for MemoryBroadcastRepository {
    async fn create(&self, broadcast: Broadcast) -> Result<Broadcast, RepositoryError> {
        self.items
            .write()
            .await
            .insert(broadcast.id, broadcast.clone());
        Ok(broadcast)
    }

    async fn find_by_id(&self, id: BroadcastId) -> Result<Option<Broadcast>, RepositoryError> {
        Ok(self.items.read().await.get(&id).cloned())
    }
}

/// 构造一个全新的内存目录存储。
pub fn memory_directory() -> Directory {
    Directory {
        users: Arc::new(MemoryUserRepository::default()),
        conversations: Arc::new(MemoryConversationRepository::default()),
        messages: Arc::new(MemoryMessageRepository::default()),
        notifications: Arc::new(MemoryNotificationRepository::default()),
        broadcasts: Arc::new(MemoryBroadcastRepository::default()),
    }
}
