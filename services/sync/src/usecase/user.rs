use chrono::Utc;

use roadwatch_domain::id::UserId;

use crate::domain::repository::UserRepository;
use crate::domain::types::{DEFAULT_BLOCK_REASON, UserWithStatus};
use crate::error::SyncServiceError;

pub struct ListUsersWithStatusUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListUsersWithStatusUseCase<U> {
    pub async fn execute(&self) -> Result<Vec<UserWithStatus>, SyncServiceError> {
        self.users.list_with_status().await
    }
}

// ── GetActiveUser ─────────────────────────────────────────────────────────────

pub struct GetActiveUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetActiveUserUseCase<U> {
    /// A blocked account is refused even though the row exists.
    pub async fn execute(&self, id: UserId) -> Result<UserWithStatus, SyncServiceError> {
        let user = self
            .users
            .find_with_status(&id)
            .await?
            .ok_or(SyncServiceError::UserNotFound)?;
        if user.is_blocked {
            return Err(SyncServiceError::UserBlocked);
        }
        Ok(user)
    }
}

// ── BlockUser ─────────────────────────────────────────────────────────────────

pub struct BlockUserInput {
    pub email: String,
    pub reason: Option<String>,
}

pub struct BlockUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> BlockUserUseCase<U> {
    /// Blocking an already blocked user keeps the first reason.
    pub async fn execute(&self, input: BlockUserInput) -> Result<(), SyncServiceError> {
        let email = input.email.trim();
        if email.is_empty() {
            return Err(SyncServiceError::validation("email must not be empty"));
        }
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(SyncServiceError::UserNotFound)?;
        let reason = input
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_BLOCK_REASON);
        self.users.block_with_outbox(&user, reason, Utc::now()).await?;
        tracing::info!(user_id = %user.id, "user blocked");
        Ok(())
    }
}

// ── UnblockUser ───────────────────────────────────────────────────────────────

pub struct UnblockUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> UnblockUserUseCase<U> {
    pub async fn execute(&self, id: UserId) -> Result<(), SyncServiceError> {
        let user = self
            .users
            .find_by_id(&id)
            .await?
            .ok_or(SyncServiceError::UserNotFound)?;
        self.users.unblock_with_outbox(&user).await?;
        tracing::info!(user_id = %user.id, "user unblocked");
        Ok(())
    }
}
