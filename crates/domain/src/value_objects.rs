use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// 统一的时间戳类型。
pub type Timestamp = DateTime<Utc>;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(id: Uuid) -> Self {
                Self(id)
            }

            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

entity_id!(
    /// 用户唯一标识。
    UserId
);
entity_id!(
    /// 会话唯一标识。
    ConversationId
);
entity_id!(
    /// 消息唯一标识。
    MessageId
);
entity_id!(
    /// 通知唯一标识。
    NotificationId
);
entity_id!(
    /// 管理员公告唯一标识。
    BroadcastId
);

/// 外部对象存储返回的图片引用：访问地址 + 可删除的 public_id。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub url: String,
    pub public_id: Option<String>,
}

impl Photo {
    pub const DEFAULT_AVATAR_URL: &'static str = "/img/default-avatar.png";

    pub fn new(url: impl Into<String>, public_id: impl Into<String>) -> Result<Self, DomainError> {
        let url = url.into().trim().to_owned();
        if url.is_empty() {
            return Err(DomainError::invalid_argument("url", "cannot be empty"));
        }
        let public_id = public_id.into().trim().to_owned();
        if public_id.is_empty() {
            return Err(DomainError::invalid_argument("public_id", "cannot be empty"));
        }
        Ok(Self {
            url,
            public_id: Some(public_id),
        })
    }

    pub fn default_avatar() -> Self {
        Self {
            url: Self::DEFAULT_AVATAR_URL.to_owned(),
            public_id: None,
        }
    }
}

impl Default for Photo {
    fn default() -> Self {
        Self::default_avatar()
    }
}
