use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::broadcaster::BroadcastError;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(RepositoryError),
    #[error("broadcast error: {0}")]
    Broadcast(#[from] BroadcastError),
    #[error("authentication failed")]
    Unauthorized,
}

impl ApplicationError {
    /// 是否属于“找不到”一类，HTTP 层据此映射 404。
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApplicationError::Domain(
                DomainError::UserNotFound
                    | DomainError::ConversationNotFound
                    | DomainError::BroadcastNotFound
            ) | ApplicationError::Repository(RepositoryError::NotFound)
        )
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(
            self,
            ApplicationError::Domain(DomainError::Forbidden { .. } | DomainError::NotParticipant)
        )
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Repository(value)
    }
}
