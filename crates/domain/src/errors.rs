//! 领域模型错误定义
//!
//! 定义了核心交互层所有可能的错误类型，提供清晰的错误上下文。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 参数校验失败
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 用户不存在（或已被封禁，对调用方不可见）
    #[error("user not found")]
    UserNotFound,

    /// 会话不存在
    #[error("conversation not found")]
    ConversationNotFound,

    /// 公告不存在
    #[error("broadcast not found")]
    BroadcastNotFound,

    /// 双方存在屏蔽关系或操作者无权执行
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    /// 发送者不是会话参与者
    #[error("user is not a participant of the conversation")]
    NotParticipant,
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }
}

/// 目录存储（持久化层）错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    /// 唯一性冲突，例如同一对用户的会话被并发创建
    #[error("unique constraint violated")]
    Conflict,

    #[error("storage failure: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
