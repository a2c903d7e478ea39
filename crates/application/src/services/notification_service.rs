use std::sync::Arc;

use domain::{
    Broadcast, BroadcastId, DomainError, Notification, NotificationType, UserId,
};
use tracing::{info, instrument, warn};

use crate::{
    broadcaster::{EventBroadcaster, RealtimeEvent, Room},
    clock::Clock,
    error::ApplicationError,
    repository::{BroadcastRepository, NotificationRepository, UserRepository},
};

/// 公告通知中截取的原文长度
const BROADCAST_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone)]
pub struct NotifyRequest {
    pub recipient_id: UserId,
    pub notification_type: NotificationType,
    pub message: String,
    pub link: Option<String>,
    pub sender_id: Option<UserId>,
}

pub struct NotificationServiceDependencies {
    pub notification_repository: Arc<dyn NotificationRepository>,
    pub broadcast_repository: Arc<dyn BroadcastRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub broadcaster: Arc<dyn EventBroadcaster>,
    pub clock: Arc<dyn Clock>,
}

/// 通知分发：先持久化，再尽力推送到接收者的个人房间。
pub struct NotificationService {
    deps: NotificationServiceDependencies,
}

impl NotificationService {
    pub fn new(deps: NotificationServiceDependencies) -> Self {
        Self { deps }
    }

    /// 持久化一条通知并尝试实时推送。推送失败只记录日志，不影响返回值。
    #[instrument(skip(self, request), fields(recipient = %request.recipient_id, kind = request.notification_type.as_str()))]
    pub async fn notify(&self, request: NotifyRequest) -> Result<Notification, ApplicationError> {
        let notification = Notification::new(
            request.recipient_id,
            request.sender_id,
            request.notification_type,
            request.message,
            request.link,
            self.deps.clock.now(),
        )?;
        let notification = self
            .deps
            .notification_repository
            .insert(notification)
            .await?;

        self.push(&notification).await;
        Ok(notification)
    }

    /// 一次写入一组通知，要么全部持久化要么都不写，成功后逐个推送。
    #[instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn notify_all(
        &self,
        requests: Vec<NotifyRequest>,
    ) -> Result<Vec<Notification>, ApplicationError> {
        let now = self.deps.clock.now();
        let notifications = requests
            .into_iter()
            .map(|request| {
                Notification::new(
                    request.recipient_id,
                    request.sender_id,
                    request.notification_type,
                    request.message,
                    request.link,
                    now,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        if notifications.is_empty() {
            return Ok(notifications);
        }

        self.deps
            .notification_repository
            .insert_many(notifications.clone())
            .await?;
        for notification in &notifications {
            self.push(notification).await;
        }
        Ok(notifications)
    }

    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, ApplicationError> {
        let updated = self
            .deps
            .notification_repository
            .mark_all_read(user_id)
            .await?;
        info!(user_id = %user_id, updated, "notifications marked as read");
        Ok(updated)
    }

    pub async fn list(&self, user_id: UserId) -> Result<Vec<Notification>, ApplicationError> {
        Ok(self
            .deps
            .notification_repository
            .list_for_recipient(user_id)
            .await?)
    }

    pub async fn unread_count(&self, user_id: UserId) -> Result<u64, ApplicationError> {
        Ok(self
            .deps
            .notification_repository
            .count_unread(user_id)
            .await?)
    }

    /// 管理员公告：保存公告记录，批量写入通知，再逐个推送。
    #[instrument(skip(self, message), fields(admin = %admin_id))]
    pub async fn broadcast(
        &self,
        admin_id: UserId,
        message: String,
    ) -> Result<(Broadcast, usize), ApplicationError> {
        let admin = self
            .deps
            .user_repository
            .find_by_id(admin_id)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        if !admin.is_admin() {
            return Err(DomainError::forbidden("only administrators can broadcast").into());
        }

        let now = self.deps.clock.now();
        let broadcast = Broadcast::new(admin_id, message, now)?;
        let broadcast = self.deps.broadcast_repository.create(broadcast).await?;

        let recipients = self
            .deps
            .user_repository
            .list_broadcast_recipients()
            .await?;
        let text = broadcast_preview(&broadcast.message);
        let link = broadcast.link();
        let notifications = recipients
            .into_iter()
            .map(|recipient| {
                Notification::new(
                    recipient,
                    Some(admin_id),
                    NotificationType::AdminBroadcast,
                    text.clone(),
                    Some(link.clone()),
                    now,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        if notifications.is_empty() {
            info!(broadcast = %broadcast.id, "broadcast has no recipients");
            return Ok((broadcast, 0));
        }

        let inserted = self
            .deps
            .notification_repository
            .insert_many(notifications.clone())
            .await?;
        for notification in &notifications {
            self.push(notification).await;
        }

        info!(broadcast = %broadcast.id, recipients = inserted, "broadcast delivered");
        Ok((broadcast, inserted))
    }

    pub async fn get_broadcast(&self, id: BroadcastId) -> Result<Broadcast, ApplicationError> {
        self.deps
            .broadcast_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::BroadcastNotFound.into())
    }

    async fn push(&self, notification: &Notification) {
        let room = Room::Personal(notification.recipient_id);
        let event = RealtimeEvent::NewNotification(notification.clone());
        if let Err(err) = self.deps.broadcaster.publish(room, event).await {
            warn!(
                notification = %notification.id,
                room = %room,
                error = %err,
                "failed to push notification, recipient will see it on next load"
            );
        }
    }
}

fn broadcast_preview(message: &str) -> String {
    let preview: String = message.chars().take(BROADCAST_PREVIEW_CHARS).collect();
    format!("A new announcement: \"{preview}...\"")
}
