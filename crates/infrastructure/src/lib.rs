//! 基础设施层实现。
//!
//! 提供基于 PostgreSQL 的目录存储适配器，实现应用层定义的仓储接口。

pub mod migrations;
pub mod repository;

pub use migrations::MIGRATOR;
pub use repository::{
    create_pg_pool, PgBroadcastRepository, PgConversationRepository, PgMessageRepository,
    PgNotificationRepository, PgStorage, PgUserRepository,
};
