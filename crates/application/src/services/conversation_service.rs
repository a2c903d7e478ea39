use std::collections::HashMap;
use std::sync::Arc;

use domain::{
    blocked_between, Conversation, ConversationId, DomainError, MessageDraft, ParticipantPair,
    Photo, RepositoryError, User, UserId,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    broadcaster::{EventBroadcaster, RealtimeEvent, Room},
    clock::Clock,
    dto::{ChatView, ConversationListItem, MessageView},
    error::ApplicationError,
    repository::{ConversationRepository, MessageRepository, UserRepository},
};

#[derive(Debug, Clone)]
pub enum MessageContent {
    Text(String),
    /// 已由上传方保存的图片
    Image(Photo),
}

#[derive(Debug, Clone)]
pub struct AppendMessageRequest {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: MessageContent,
}

pub struct ConversationServiceDependencies {
    pub conversation_repository: Arc<dyn ConversationRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub broadcaster: Arc<dyn EventBroadcaster>,
    pub clock: Arc<dyn Clock>,
}

/// 会话注册表：每对用户唯一的会话、消息追加与历史读取。
pub struct ConversationService {
    deps: ConversationServiceDependencies,
}

impl ConversationService {
    pub fn new(deps: ConversationServiceDependencies) -> Self {
        Self { deps }
    }

    /// 查找或创建两人之间唯一的会话。
    ///
    /// 创建时遇到唯一性冲突说明并发的另一方已经创建成功，重新读取并返回它。
    #[instrument(skip(self), fields(a = %user_a, b = %user_b))]
    pub async fn resolve(
        &self,
        user_a: UserId,
        user_b: UserId,
    ) -> Result<Conversation, ApplicationError> {
        let pair = ParticipantPair::new(user_a, user_b)?;
        let repo = &self.deps.conversation_repository;

        if let Some(existing) = repo.find_by_pair(pair).await? {
            return Ok(existing);
        }

        let candidate = Conversation::open(ConversationId::generate(), pair, self.deps.clock.now());
        match repo.create(candidate).await {
            Ok(created) => {
                info!(conversation = %created.id, "conversation created");
                Ok(created)
            }
            Err(RepositoryError::Conflict) => {
                debug!("lost conversation creation race, re-reading winner");
                repo.find_by_pair(pair)
                    .await?
                    .ok_or_else(|| RepositoryError::NotFound.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// 持久化消息，推送到会话房间，然后尽力更新会话摘要。
    ///
    /// 只有持久化失败会返回错误；推送和摘要更新失败都只记日志。
    #[instrument(skip(self, request), fields(conversation = %request.conversation_id, sender = %request.sender_id))]
    pub async fn append_message(
        &self,
        request: AppendMessageRequest,
    ) -> Result<MessageView, ApplicationError> {
        let conversation = self
            .ensure_participant(request.conversation_id, request.sender_id)
            .await?;
        let (sender, _) = self
            .load_participants(&conversation, request.sender_id)
            .await?;

        let now = self.deps.clock.now();
        let draft = match request.content {
            MessageContent::Text(text) => {
                MessageDraft::text(conversation.id, sender.id, text, now)?
            }
            MessageContent::Image(photo) => MessageDraft::image(conversation.id, sender.id, photo, now),
        };
        let message = self.deps.message_repository.insert(draft).await?;
        let view = MessageView {
            message,
            sender: sender.summary(),
        };

        let room = Room::Conversation(conversation.id);
        if let Err(err) = self
            .deps
            .broadcaster
            .publish(room, RealtimeEvent::Message(view.clone()))
            .await
        {
            warn!(room = %room, error = %err, "failed to publish chat message");
        }

        if let Err(err) = self
            .deps
            .conversation_repository
            .update_summary(
                conversation.id,
                view.message.summary_text(),
                view.message.created_at,
            )
            .await
        {
            warn!(error = %err, "failed to update conversation summary");
        }

        Ok(view)
    }

    /// 打开与某个用户的聊天：解析会话并返回完整历史。
    pub async fn open_chat(
        &self,
        actor_id: UserId,
        other_id: UserId,
    ) -> Result<ChatView, ApplicationError> {
        let users = &self.deps.user_repository;
        let actor = users
            .find_by_id(actor_id)
            .await?
            .filter(User::is_active)
            .ok_or(DomainError::UserNotFound)?;
        let other = users
            .find_by_id(other_id)
            .await?
            .filter(User::is_active)
            .ok_or(DomainError::UserNotFound)?;
        if blocked_between(&actor, &other) {
            return Err(DomainError::forbidden("users have blocked each other").into());
        }

        let conversation = self.resolve(actor_id, other_id).await?;
        let messages = self.history(&conversation, [&actor, &other]).await?;
        Ok(ChatView {
            conversation_id: conversation.id,
            other_user: other.summary(),
            messages,
        })
    }

    /// 用户的会话列表，最近更新的在前。
    pub async fn list_conversations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ConversationListItem>, ApplicationError> {
        let conversations = self
            .deps
            .conversation_repository
            .list_for_user(user_id)
            .await?;
        let others: Vec<UserId> = conversations
            .iter()
            .filter_map(|c| c.participants.other(&user_id))
            .collect();
        let users: HashMap<UserId, User> = self
            .deps
            .user_repository
            .find_many(&others)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        // 对方记录已不存在的会话直接跳过
        Ok(conversations
            .iter()
            .filter_map(|conversation| {
                let other = users.get(&conversation.participants.other(&user_id)?)?;
                Some(ConversationListItem {
                    conversation_id: conversation.id,
                    other_user: other.summary(),
                    last_message: conversation.summary_or_placeholder().to_owned(),
                    updated_at: conversation.updated_at,
                })
            })
            .collect())
    }

    /// 校验用户是会话参与者，`joinChat` 和发消息前都要经过这里。
    pub async fn ensure_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<Conversation, ApplicationError> {
        let conversation = self
            .deps
            .conversation_repository
            .find_by_id(conversation_id)
            .await?
            .ok_or(DomainError::ConversationNotFound)?;
        if !conversation.participants.contains(&user_id) {
            return Err(DomainError::NotParticipant.into());
        }
        Ok(conversation)
    }

    async fn load_participants(
        &self,
        conversation: &Conversation,
        sender_id: UserId,
    ) -> Result<(User, User), ApplicationError> {
        let other_id = conversation
            .participants
            .other(&sender_id)
            .ok_or(DomainError::NotParticipant)?;
        let users = &self.deps.user_repository;
        let sender = users
            .find_by_id(sender_id)
            .await?
            .filter(User::is_active)
            .ok_or(DomainError::UserNotFound)?;
        let other = users
            .find_by_id(other_id)
            .await?
            .filter(User::is_active)
            .ok_or(DomainError::UserNotFound)?;
        if blocked_between(&sender, &other) {
            return Err(DomainError::forbidden("users have blocked each other").into());
        }
        Ok((sender, other))
    }

    async fn history(
        &self,
        conversation: &Conversation,
        participants: [&User; 2],
    ) -> Result<Vec<MessageView>, ApplicationError> {
        let messages = self
            .deps
            .message_repository
            .list_for_conversation(conversation.id)
            .await?;
        Ok(messages
            .into_iter()
            .filter_map(|message| {
                let sender = participants
                    .iter()
                    .find(|user| user.id == message.sender_id)?;
                Some(MessageView {
                    sender: sender.summary(),
                    message,
                })
            })
            .collect())
    }
}
