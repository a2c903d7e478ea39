use std::sync::Arc;

use application::{
    Clock, ConversationService, ConversationServiceDependencies, Directory, EventBroadcaster,
    MatchService, MatchServiceDependencies, NotificationService, NotificationServiceDependencies,
    RealtimeHub,
};

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub match_service: Arc<MatchService>,
    pub conversation_service: Arc<ConversationService>,
    pub notification_service: Arc<NotificationService>,
    pub hub: Arc<RealtimeHub>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        match_service: Arc<MatchService>,
        conversation_service: Arc<ConversationService>,
        notification_service: Arc<NotificationService>,
        hub: Arc<RealtimeHub>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            match_service,
            conversation_service,
            notification_service,
            hub,
            jwt_service,
        }
    }

    /// 在一个目录存储之上装配全部服务，实时中心同时作为事件广播器。
    pub fn assemble(
        directory: Directory,
        hub: Arc<RealtimeHub>,
        clock: Arc<dyn Clock>,
        jwt_service: Arc<JwtService>,
        page_size: usize,
    ) -> Self {
        let broadcaster: Arc<dyn EventBroadcaster> = hub.clone();

        let notification_service = Arc::new(NotificationService::new(
            NotificationServiceDependencies {
                notification_repository: directory.notifications.clone(),
                broadcast_repository: directory.broadcasts.clone(),
                user_repository: directory.users.clone(),
                broadcaster: broadcaster.clone(),
                clock: clock.clone(),
            },
        ));
        let match_service = Arc::new(MatchService::new(MatchServiceDependencies {
            user_repository: directory.users.clone(),
            notifications: notification_service.clone(),
            page_size,
        }));
        let conversation_service = Arc::new(ConversationService::new(
            ConversationServiceDependencies {
                conversation_repository: directory.conversations,
                message_repository: directory.messages,
                user_repository: directory.users,
                broadcaster,
                clock,
            },
        ));

        Self::new(
            match_service,
            conversation_service,
            notification_service,
            hub,
            jwt_service,
        )
    }
}
