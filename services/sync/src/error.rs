use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use roadwatch_domain::issue::IssueStatus;

/// Sync service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum SyncServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("road issue not found")]
    IssueNotFound,
    #[error("sync log not found")]
    OutboxEntryNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("account is blocked")]
    UserBlocked,
    #[error("cannot move issue from {from} to {to}")]
    InvalidTransition { from: IssueStatus, to: IssueStatus },
    #[error("cloud store unavailable")]
    Unavailable(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl SyncServiceError {
    pub fn validation(reason: impl Display) -> Self {
        Self::Validation(reason.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::IssueNotFound => "ISSUE_NOT_FOUND",
            Self::OutboxEntryNotFound => "OUTBOX_ENTRY_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UserBlocked => "USER_BLOCKED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Unavailable(_) => "TRANSIENT_NETWORK_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Message including the underlying cause chain, for logs and `last_error`.
    pub fn detail(&self) -> String {
        match self {
            Self::Unavailable(e) | Self::Internal(e) => format!("{self}: {e:#}"),
            _ => self.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::IssueNotFound | Self::OutboxEntryNotFound | Self::UserNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::UserBlocked => StatusCode::FORBIDDEN,
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SyncServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx are expected client errors and already visible in the trace layer.
        match &self {
            Self::Internal(e) => tracing::error!(error = ?e, kind = self.kind(), "internal error"),
            Self::Unavailable(e) => {
                tracing::error!(error = ?e, kind = self.kind(), "cloud store unavailable")
            }
            _ => {}
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
