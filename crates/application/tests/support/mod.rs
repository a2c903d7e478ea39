//! 集成测试共用的装配代码：内存目录存储 + 每个测试独立的实时中心。

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use application::{
    memory_directory, Clock, ConversationService, ConversationServiceDependencies, Directory,
    EventBroadcaster, MatchService, MatchServiceDependencies, NotificationService,
    NotificationServiceDependencies, RealtimeHub, DEFAULT_DISCOVERY_PAGE_SIZE,
};
use chrono::{Duration, TimeZone, Utc};
use domain::{Timestamp, User, UserId};

/// 可手动推进的时钟，每次读取自动前进 1ms，保证创建时间严格递增。
pub struct TestClock {
    now: Mutex<Timestamp>,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> Timestamp {
        let mut now = self.now.lock().unwrap();
        *now += Duration::milliseconds(1);
        *now
    }
}

pub struct Harness {
    pub directory: Directory,
    pub hub: Arc<RealtimeHub>,
    pub clock: Arc<TestClock>,
    pub notifications: Arc<NotificationService>,
    pub matches: MatchService,
    pub conversations: ConversationService,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(memory_directory(), None)
    }

    pub fn with_directory(directory: Directory) -> Self {
        Self::build(directory, None)
    }

    /// 用自定义的广播器替换实时中心（例如总是失败的 mock）。
    pub fn with_broadcaster(broadcaster: Arc<dyn EventBroadcaster>) -> Self {
        Self::build(memory_directory(), Some(broadcaster))
    }

    pub fn build(directory: Directory, broadcaster: Option<Arc<dyn EventBroadcaster>>) -> Self {
        let hub = Arc::new(RealtimeHub::default());
        let broadcaster = broadcaster.unwrap_or_else(|| hub.clone() as Arc<dyn EventBroadcaster>);
        let clock = Arc::new(TestClock::new());

        let notifications = Arc::new(NotificationService::new(NotificationServiceDependencies {
            notification_repository: directory.notifications.clone(),
            broadcast_repository: directory.broadcasts.clone(),
            user_repository: directory.users.clone(),
            broadcaster: broadcaster.clone(),
            clock: clock.clone(),
        }));
        let matches = MatchService::new(MatchServiceDependencies {
            user_repository: directory.users.clone(),
            notifications: notifications.clone(),
            page_size: DEFAULT_DISCOVERY_PAGE_SIZE,
        });
        let conversations = ConversationService::new(ConversationServiceDependencies {
            conversation_repository: directory.conversations.clone(),
            message_repository: directory.messages.clone(),
            user_repository: directory.users.clone(),
            broadcaster,
            clock: clock.clone(),
        });

        Self {
            directory,
            hub,
            clock,
            notifications,
            matches,
            conversations,
        }
    }

    pub async fn user(&self, name: &str) -> User {
        self.user_with(name, |_| {}).await
    }

    pub async fn user_with(&self, name: &str, configure: impl FnOnce(&mut User)) -> User {
        let mut user = User::new(UserId::generate(), name, self.clock.now()).unwrap();
        configure(&mut user);
        self.directory.users.create(user).await.unwrap()
    }

    pub async fn reload(&self, id: UserId) -> User {
        self.directory.users.find_by_id(id).await.unwrap().unwrap()
    }
}
