use std::sync::Arc;

use domain::{
    blocked_between, DiscoveryFilter, DomainError, NotificationType, RelationSet, User, UserId,
    UserSummary,
};
use tracing::{debug, info, instrument, warn};

use crate::{
    dto::LikeOutcome,
    error::ApplicationError,
    repository::UserRepository,
    services::notification_service::{NotificationService, NotifyRequest},
};

/// 发现页默认每次返回的候选人数
pub const DEFAULT_DISCOVERY_PAGE_SIZE: usize = 20;

pub struct MatchServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub notifications: Arc<NotificationService>,
    pub page_size: usize,
}

/// 匹配引擎：like / dislike / block，以及发现页候选查询。
///
/// 不使用多文档事务。每一步都是目录存储上的原子集合操作，正确性依赖
/// “先写自己的 like，再读对方的 likes” 的顺序，以及集合插入的幂等性。
pub struct MatchService {
    deps: MatchServiceDependencies,
}

impl MatchService {
    pub fn new(deps: MatchServiceDependencies) -> Self {
        Self { deps }
    }

    #[instrument(skip(self), fields(actor = %actor_id, target = %target_id))]
    pub async fn like(
        &self,
        actor_id: UserId,
        target_id: UserId,
    ) -> Result<LikeOutcome, ApplicationError> {
        let (actor, target) = self.load_pair(actor_id, target_id).await?;
        if blocked_between(&actor, &target) {
            return Err(DomainError::forbidden("users have blocked each other").into());
        }

        let users = &self.deps.user_repository;
        users
            .add_to_set(actor_id, RelationSet::Likes, target_id)
            .await?;

        // 必须在自己的 like 写入之后重新读取对方
        let target = users
            .find_by_id(target_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        if !target.likes.contains(&actor_id) {
            debug!("like recorded, no mutual interest yet");
            return Ok(LikeOutcome::no_match());
        }

        // 规范方向（id 较小的一方）的插入结果决定由哪一次调用发通知：
        // 并发的两次调用中只有一次能让它返回 true。
        let (low, high) = if actor_id < target_id {
            (actor_id, target_id)
        } else {
            (target_id, actor_id)
        };
        let first_detection = users.add_to_set(low, RelationSet::Matches, high).await?;
        users.add_to_set(high, RelationSet::Matches, low).await?;

        if first_detection {
            if let Err(err) = self.announce_match(&actor, &target).await {
                // 通知对没有写成，撤销匹配记录，下一次 like 会重新检测并通知
                self.revoke_match(low, high).await;
                return Err(err);
            }
            info!("new match created");
        } else {
            debug!("match already recorded");
        }

        Ok(LikeOutcome::matched_with(target.summary()))
    }

    #[instrument(skip(self), fields(actor = %actor_id, target = %target_id))]
    pub async fn dislike(&self, actor_id: UserId, target_id: UserId) -> Result<(), ApplicationError> {
        ensure_distinct(actor_id, target_id)?;
        self.load_active(actor_id).await?;
        self.deps
            .user_repository
            .find_by_id(target_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        self.deps
            .user_repository
            .add_to_set(actor_id, RelationSet::Dislikes, target_id)
            .await?;
        Ok(())
    }

    /// 屏蔽对方。不修改 matches，屏蔽关系本身会阻止后续的匹配和聊天。
    #[instrument(skip(self), fields(actor = %actor_id, target = %target_id))]
    pub async fn block(&self, actor_id: UserId, target_id: UserId) -> Result<(), ApplicationError> {
        ensure_distinct(actor_id, target_id)?;
        self.load_active(actor_id).await?;
        self.deps
            .user_repository
            .find_by_id(target_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        let added = self
            .deps
            .user_repository
            .add_to_set(actor_id, RelationSet::BlockedUsers, target_id)
            .await?;
        if added {
            info!("user blocked");
        }
        Ok(())
    }

    pub async fn unblock(&self, actor_id: UserId, target_id: UserId) -> Result<bool, ApplicationError> {
        self.load_active(actor_id).await?;
        Ok(self
            .deps
            .user_repository
            .pull_from_set(actor_id, RelationSet::BlockedUsers, target_id)
            .await?)
    }

    /// 发现页候选人，最多 `page_size` 个。
    pub async fn discover(&self, actor_id: UserId) -> Result<Vec<UserSummary>, ApplicationError> {
        let actor = self.load_active(actor_id).await?;
        let filter = DiscoveryFilter::for_actor(&actor);
        let candidates = self
            .deps
            .user_repository
            .find_candidates(&filter, self.deps.page_size)
            .await?;
        Ok(candidates.iter().map(User::summary).collect())
    }

    pub async fn list_matches(&self, actor_id: UserId) -> Result<Vec<UserSummary>, ApplicationError> {
        let actor = self.load_active(actor_id).await?;
        let ids: Vec<UserId> = actor.matches.iter().copied().collect();
        let matches = self.deps.user_repository.find_many(&ids).await?;
        Ok(matches
            .iter()
            .filter(|user| user.is_active() && !blocked_between(&actor, user))
            .map(User::summary)
            .collect())
    }

    /// 双方各一条 new_match 通知，作为一批写入。
    async fn announce_match(&self, actor: &User, target: &User) -> Result<(), ApplicationError> {
        let requests = [(actor, target), (target, actor)]
            .into_iter()
            .map(|(recipient, partner)| NotifyRequest {
                recipient_id: recipient.id,
                notification_type: NotificationType::NewMatch,
                message: format!("You have a new match with {}!", partner.display_name),
                link: Some(format!("/chats/{}", partner.id)),
                sender_id: Some(partner.id),
            })
            .collect();
        self.deps.notifications.notify_all(requests).await?;
        Ok(())
    }

    async fn revoke_match(&self, low: UserId, high: UserId) {
        let users = &self.deps.user_repository;
        for (owner, member) in [(high, low), (low, high)] {
            if let Err(err) = users.pull_from_set(owner, RelationSet::Matches, member).await {
                warn!(owner = %owner, member = %member, error = %err, "failed to revoke unannounced match");
            }
        }
    }

    async fn load_active(&self, id: UserId) -> Result<User, ApplicationError> {
        self.deps
            .user_repository
            .find_by_id(id)
            .await?
            .filter(User::is_active)
            .ok_or_else(|| DomainError::UserNotFound.into())
    }

    async fn load_pair(
        &self,
        actor_id: UserId,
        target_id: UserId,
    ) -> Result<(User, User), ApplicationError> {
        ensure_distinct(actor_id, target_id)?;
        let actor = self.load_active(actor_id).await?;
        let target = self.load_active(target_id).await?;
        Ok((actor, target))
    }
}

fn ensure_distinct(actor_id: UserId, target_id: UserId) -> Result<(), DomainError> {
    if actor_id == target_id {
        return Err(DomainError::invalid_argument(
            "target_id",
            "cannot target yourself",
        ));
    }
    Ok(())
}
