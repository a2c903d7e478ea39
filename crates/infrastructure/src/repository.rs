use std::sync::Arc;

use application::repository::{
    BroadcastRepository, ConversationRepository, Directory, MessageRepository,
    NotificationRepository, UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    AgeRange, Broadcast, BroadcastId, Conversation, ConversationId, DiscoveryFilter, Message,
    MessageDraft, MessageId, Notification, NotificationId, NotificationType, ParticipantPair,
    Photo, Preferences, RelationSet, RepositoryError, Timestamp, User, UserId, UserSet,
};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepositoryError::NotFound,
        _ => RepositoryError::storage(err.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

// 枚举按 serde 的外部名称存成 TEXT，和 JSON 表示保持一致
fn enum_to_text<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(text)) => Ok(text),
        Ok(other) => Err(invalid_data(format!("enum encoded as non-string {other}"))),
        Err(err) => Err(invalid_data(err.to_string())),
    }
}

fn text_to_enum<T: DeserializeOwned>(text: String) -> Result<T, RepositoryError> {
    serde_json::from_value(serde_json::Value::String(text))
        .map_err(|err| invalid_data(err.to_string()))
}

fn age_from_db(value: i16, column: &str) -> Result<u8, RepositoryError> {
    u8::try_from(value).map_err(|_| invalid_data(format!("{column} out of range: {value}")))
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    display_name: String,
    profile_image_url: String,
    profile_image_public_id: Option<String>,
    age: Option<i16>,
    gender: Option<String>,
    preferred_genders: Vec<String>,
    preferred_age_min: i16,
    preferred_age_max: i16,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, display_name, profile_image_url, profile_image_public_id, age, \
     gender, preferred_genders, preferred_age_min, preferred_age_max, role, status, created_at";

#[derive(Debug, FromRow)]
struct RelationRecord {
    user_id: Uuid,
    relation: String,
    member_id: Uuid,
}

impl UserRecord {
    fn into_user(self, relations: &[RelationRecord]) -> Result<User, RepositoryError> {
        let age_range = AgeRange::new(
            age_from_db(self.preferred_age_min, "preferred_age_min")?,
            age_from_db(self.preferred_age_max, "preferred_age_max")?,
        )
        .map_err(|err| invalid_data(err.to_string()))?;
        let genders = self
            .preferred_genders
            .into_iter()
            .map(text_to_enum)
            .collect::<Result<Vec<_>, _>>()?;

        let mut user = User {
            id: UserId::from(self.id),
            display_name: self.display_name,
            profile_image: Photo {
                url: self.profile_image_url,
                public_id: self.profile_image_public_id,
            },
            age: self.age.map(|age| age_from_db(age, "age")).transpose()?,
            gender: self.gender.map(text_to_enum).transpose()?,
            preferences: Preferences { genders, age_range },
            role: text_to_enum(self.role)?,
            status: text_to_enum(self.status)?,
            likes: UserSet::new(),
            dislikes: UserSet::new(),
            matches: UserSet::new(),
            blocked_users: UserSet::new(),
            created_at: self.created_at,
        };

        for record in relations.iter().filter(|r| r.user_id == self.id) {
            let set = relation_from_text(&record.relation)?;
            user.relation_mut(set).insert(UserId::from(record.member_id));
        }
        Ok(user)
    }
}

fn relation_from_text(value: &str) -> Result<RelationSet, RepositoryError> {
    [
        RelationSet::Likes,
        RelationSet::Dislikes,
        RelationSet::Matches,
        RelationSet::BlockedUsers,
    ]
    .into_iter()
    .find(|set| set.as_str() == value)
    .ok_or_else(|| invalid_data(format!("unknown relation {value}")))
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 批量补全集合成员，避免逐个用户查询
    async fn hydrate(&self, records: Vec<UserRecord>) -> Result<Vec<User>, RepositoryError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        let relations = sqlx::query_as::<_, RelationRecord>(
            "SELECT user_id, relation, member_id FROM user_relations WHERE user_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records
            .into_iter()
            .map(|record| record.into_user(&relations))
            .collect()
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let genders = user
            .preferences
            .genders
            .iter()
            .map(enum_to_text)
            .collect::<Result<Vec<_>, _>>()?;

        sqlx::query(
            r#"
            INSERT INTO users (id, display_name, profile_image_url, profile_image_public_id, age,
                               gender, preferred_genders, preferred_age_min, preferred_age_max,
                               role, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(&user.display_name)
        .bind(&user.profile_image.url)
        .bind(&user.profile_image.public_id)
        .bind(user.age.map(i16::from))
        .bind(user.gender.as_ref().map(enum_to_text).transpose()?)
        .bind(&genders)
        .bind(i16::from(user.preferences.age_range.min))
        .bind(i16::from(user.preferences.age_range.max))
        .bind(enum_to_text(&user.role)?)
        .bind(enum_to_text(&user.status)?)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        for set in [
            RelationSet::Likes,
            RelationSet::Dislikes,
            RelationSet::Matches,
            RelationSet::BlockedUsers,
        ] {
            let members: Vec<Uuid> = user.relation(set).iter().map(|id| Uuid::from(*id)).collect();
            if members.is_empty() {
                continue;
            }
            sqlx::query(
                r#"
                INSERT INTO user_relations (user_id, relation, member_id)
                SELECT $1, $2, UNNEST($3::uuid[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(Uuid::from(user.id))
            .bind(set.as_str())
            .bind(&members)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        match record {
            Some(record) => Ok(self.hydrate(vec![record]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| Uuid::from(*id)).collect();
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1) ORDER BY created_at"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        self.hydrate(records).await
    }

    async fn add_to_set(
        &self,
        id: UserId,
        set: RelationSet,
        member: UserId,
    ) -> Result<bool, RepositoryError> {
        // 外键违反（用户不存在）经 map_sqlx_err 映射为 NotFound
        let result = sqlx::query(
            r#"
            INSERT INTO user_relations (user_id, relation, member_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(Uuid::from(id))
        .bind(set.as_str())
        .bind(Uuid::from(member))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn pull_from_set(
        &self,
        id: UserId,
        set: RelationSet,
        member: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM user_relations WHERE user_id = $1 AND relation = $2 AND member_id = $3",
        )
        .bind(Uuid::from(id))
        .bind(set.as_str())
        .bind(Uuid::from(member))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_candidates(
        &self,
        filter: &DiscoveryFilter,
        limit: usize,
    ) -> Result<Vec<User>, RepositoryError> {
        let excluded: Vec<Uuid> = filter.excluded.iter().map(|id| Uuid::from(*id)).collect();
        let genders = filter
            .genders
            .as_ref()
            .map(|genders| genders.iter().map(enum_to_text).collect::<Result<Vec<_>, _>>())
            .transpose()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let records = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users u
            WHERE u.id <> ALL($1)
              AND u.status = 'active'
              AND u.role = 'user'
              AND u.age BETWEEN $2 AND $3
              AND ($4::text[] IS NULL OR u.gender = ANY($4))
              AND NOT EXISTS (
                  SELECT 1 FROM user_relations r
                  WHERE r.user_id = u.id AND r.relation = 'blocked_users' AND r.member_id = $5
              )
            ORDER BY u.created_at
            LIMIT $6
            "#
        ))
        .bind(&excluded)
        .bind(i16::from(filter.age_range.min))
        .bind(i16::from(filter.age_range.max))
        .bind(&genders)
        .bind(Uuid::from(filter.actor))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let users = self.hydrate(records).await?;
        // 同一套纯规则再过一遍，保证与内存实现的判定一致
        Ok(users.into_iter().filter(|user| filter.admits(user)).collect())
    }

    async fn list_broadcast_recipients(&self) -> Result<Vec<UserId>, RepositoryError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM users WHERE status = 'active' AND role = 'user' ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(ids.into_iter().map(UserId::from).collect())
    }
}

#[derive(Debug, FromRow)]
struct ConversationRecord {
    id: Uuid,
    participant_low: Uuid,
    participant_high: Uuid,
    last_message: Option<String>,
    last_message_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConversationRecord> for Conversation {
    type Error = RepositoryError;

    fn try_from(value: ConversationRecord) -> Result<Self, Self::Error> {
        let participants = ParticipantPair::new(
            UserId::from(value.participant_low),
            UserId::from(value.participant_high),
        )
        .map_err(|err| invalid_data(err.to_string()))?;
        Ok(Conversation {
            id: ConversationId::from(value.id),
            participants,
            last_message: value.last_message,
            last_message_at: value.last_message_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

const CONVERSATION_COLUMNS: &str =
    "id, participant_low, participant_high, last_message, last_message_at, created_at, updated_at";

#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn find_by_id(&self, id: ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        let record = sqlx::query_as::<_, ConversationRecord>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        record.map(Conversation::try_from).transpose()
    }

    async fn find_by_pair(
        &self,
        pair: ParticipantPair,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let record = sqlx::query_as::<_, ConversationRecord>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations \
             WHERE participant_low = $1 AND participant_high = $2"
        ))
        .bind(Uuid::from(pair.low()))
        .bind(Uuid::from(pair.high()))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        record.map(Conversation::try_from).transpose()
    }

    async fn create(&self, conversation: Conversation) -> Result<Conversation, RepositoryError> {
        // 唯一约束冲突映射为 Conflict，由会话服务重新读取胜出者
        let record = sqlx::query_as::<_, ConversationRecord>(&format!(
            r#"
            INSERT INTO conversations (id, participant_low, participant_high, last_message,
                                       last_message_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CONVERSATION_COLUMNS}
            "#
        ))
        .bind(Uuid::from(conversation.id))
        .bind(Uuid::from(conversation.participants.low()))
        .bind(Uuid::from(conversation.participants.high()))
        .bind(&conversation.last_message)
        .bind(conversation.last_message_at)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Conversation::try_from(record)
    }

    async fn update_summary(
        &self,
        id: ConversationId,
        summary: &str,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET last_message = $2, last_message_at = $3, updated_at = $3
            WHERE id = $1 AND (last_message_at IS NULL OR last_message_at <= $3)
            "#,
        )
        .bind(Uuid::from(id))
        .bind(summary)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        if result.rows_affected() > 0 {
            return Ok(());
        }

        // 没有更新到行：要么会话不存在，要么已有更新的摘要
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM conversations WHERE id = $1)")
                .bind(Uuid::from(id))
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_err)?;
        if !exists {
            return Err(RepositoryError::NotFound);
        }
        debug!(conversation = %id, "stale summary update ignored");
        Ok(())
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Conversation>, RepositoryError> {
        let records = sqlx::query_as::<_, ConversationRecord>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations \
             WHERE participant_low = $1 OR participant_high = $1 \
             ORDER BY updated_at DESC"
        ))
        .bind(Uuid::from(user))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        records.into_iter().map(Conversation::try_from).collect()
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    sequence: i64,
    conversation_id: Uuid,
    sender_id: Uuid,
    message_type: String,
    content: String,
    media_public_id: Option<String>,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        Ok(Message {
            id: MessageId::from(value.id),
            conversation_id: ConversationId::from(value.conversation_id),
            sender_id: UserId::from(value.sender_id),
            message_type: text_to_enum(value.message_type)?,
            content: value.content,
            media_public_id: value.media_public_id,
            read: value.read,
            created_at: value.created_at,
            sequence: value.sequence,
        })
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, draft: MessageDraft) -> Result<Message, RepositoryError> {
        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, message_type, content,
                                  media_public_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING sequence
            "#,
        )
        .bind(Uuid::from(draft.id))
        .bind(Uuid::from(draft.conversation_id))
        .bind(Uuid::from(draft.sender_id))
        .bind(enum_to_text(&draft.message_type)?)
        .bind(&draft.content)
        .bind(&draft.media_public_id)
        .bind(draft.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        debug!(message = %draft.id, sequence, "message persisted");
        Ok(draft.into_message(sequence))
    }

    async fn list_for_conversation(
        &self,
        conversation: ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sequence, conversation_id, sender_id, message_type, content,
                   media_public_id, read, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, sequence ASC
            "#,
        )
        .bind(Uuid::from(conversation))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        records.into_iter().map(Message::try_from).collect()
    }
}

#[derive(Debug, FromRow)]
struct NotificationRecord {
    id: Uuid,
    recipient_id: Uuid,
    sender_id: Option<Uuid>,
    notification_type: String,
    message: String,
    link: Option<String>,
    read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRecord> for Notification {
    type Error = RepositoryError;

    fn try_from(value: NotificationRecord) -> Result<Self, Self::Error> {
        let notification_type = NotificationType::parse(&value.notification_type).ok_or_else(
            || invalid_data(format!("unknown notification type {}", value.notification_type)),
        )?;
        Ok(Notification {
            id: NotificationId::from(value.id),
            recipient_id: UserId::from(value.recipient_id),
            sender_id: value.sender_id.map(UserId::from),
            notification_type,
            message: value.message,
            link: value.link,
            read: value.read,
            created_at: value.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        self.insert_many(vec![notification.clone()]).await?;
        Ok(notification)
    }

    async fn insert_many(&self, notifications: Vec<Notification>) -> Result<usize, RepositoryError> {
        if notifications.is_empty() {
            return Ok(0);
        }
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO notifications (id, recipient_id, sender_id, notification_type, message, link, read, created_at) ",
        );
        builder.push_values(&notifications, |mut row, n| {
            row.push_bind(Uuid::from(n.id))
                .push_bind(Uuid::from(n.recipient_id))
                .push_bind(n.sender_id.map(Uuid::from))
                .push_bind(n.notification_type.as_str())
                .push_bind(&n.message)
                .push_bind(&n.link)
                .push_bind(n.read)
                .push_bind(n.created_at);
        });
        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected() as usize)
    }

    async fn list_for_recipient(&self, user: UserId) -> Result<Vec<Notification>, RepositoryError> {
        let records = sqlx::query_as::<_, NotificationRecord>(
            r#"
            SELECT id, recipient_id, sender_id, notification_type, message, link, read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(Uuid::from(user))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        records.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_all_read(&self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE recipient_id = $1 AND read = FALSE",
        )
        .bind(Uuid::from(user))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }

    async fn count_unread(&self, user: UserId) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read = FALSE",
        )
        .bind(Uuid::from(user))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(count.max(0) as u64)
    }
}

#[derive(Debug, FromRow)]
struct BroadcastRecord {
    id: Uuid,
    admin_id: Uuid,
    message: String,
    created_at: DateTime<Utc>,
}

impl From<BroadcastRecord> for Broadcast {
    fn from(value: BroadcastRecord) -> Self {
        Broadcast {
            id: BroadcastId::from(value.id),
            admin_id: UserId::from(value.admin_id),
            message: value.message,
            created_at: value.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgBroadcastRepository {
    pool: PgPool,
}

impl PgBroadcastRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BroadcastRepository for PgBroadcastRepository {
    async fn create(&self, broadcast: Broadcast) -> Result<Broadcast, RepositoryError> {
        let record = sqlx::query_as::<_, BroadcastRecord>(
            r#"
            INSERT INTO broadcasts (id, admin_id, message, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, admin_id, message, created_at
            "#,
        )
        .bind(Uuid::from(broadcast.id))
        .bind(Uuid::from(broadcast.admin_id))
        .bind(&broadcast.message)
        .bind(broadcast.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(record.into())
    }

    async fn find_by_id(&self, id: BroadcastId) -> Result<Option<Broadcast>, RepositoryError> {
        let record = sqlx::query_as::<_, BroadcastRecord>(
            "SELECT id, admin_id, message, created_at FROM broadcasts WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(record.map(Broadcast::from))
    }
}

/// PostgreSQL 目录存储：所有仓储共享同一个连接池。
#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: Arc<PgUserRepository>,
    pub conversation_repository: Arc<PgConversationRepository>,
    pub message_repository: Arc<PgMessageRepository>,
    pub notification_repository: Arc<PgNotificationRepository>,
    pub broadcast_repository: Arc<PgBroadcastRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repository: Arc::new(PgUserRepository::new(pool.clone())),
            conversation_repository: Arc::new(PgConversationRepository::new(pool.clone())),
            message_repository: Arc::new(PgMessageRepository::new(pool.clone())),
            notification_repository: Arc::new(PgNotificationRepository::new(pool.clone())),
            broadcast_repository: Arc::new(PgBroadcastRepository::new(pool.clone())),
            pool,
        }
    }

    pub fn directory(&self) -> Directory {
        Directory {
            users: self.user_repository.clone(),
            conversations: self.conversation_repository.clone(),
            messages: self.message_repository.clone(),
            notifications: self.notification_repository.clone(),
            broadcasts: self.broadcast_repository.clone(),
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
