use chrono::Utc;

use roadwatch_domain::id::IssueId;
use roadwatch_domain::issue::{DangerLevel, IssueStatus};

use crate::domain::repository::IssueRepository;
use crate::domain::types::{NewIssue, RoadIssue, validate_amounts, validate_coordinates};
use crate::error::SyncServiceError;

// ── ListIssues ────────────────────────────────────────────────────────────────

pub struct ListIssuesUseCase<I: IssueRepository> {
    pub issues: I,
}

impl<I: IssueRepository> ListIssuesUseCase<I> {
    pub async fn execute(&self) -> Result<Vec<RoadIssue>, SyncServiceError> {
        self.issues.list().await
    }
}

// ── CreateIssue ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CreateIssueInput {
    pub title: String,
    pub description: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub user_id: Option<String>,
    pub surface: Option<f64>,
    pub budget: Option<f64>,
    pub niveau_danger: Option<String>,
}

impl CreateIssueInput {
    fn validate(self) -> Result<NewIssue, SyncServiceError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(SyncServiceError::validation("title must not be empty"));
        }
        validate_coordinates(self.latitude, self.longitude)?;
        let surface = self.surface.unwrap_or(0.0);
        let budget = self.budget.unwrap_or(0.0);
        validate_amounts(surface, budget)?;
        let danger_level = match self.niveau_danger.as_deref().map(str::trim) {
            None | Some("") => DangerLevel::default(),
            Some(raw) => raw
                .parse::<DangerLevel>()
                .map_err(SyncServiceError::validation)?,
        };
        Ok(NewIssue {
            title,
            description: self.description.unwrap_or_default(),
            latitude: self.latitude,
            longitude: self.longitude,
            danger_level,
            surface,
            budget,
            user_id: self.user_id.filter(|id| !id.trim().is_empty()),
        })
    }
}

pub struct CreateIssueUseCase<I: IssueRepository> {
    pub issues: I,
}

impl<I: IssueRepository> CreateIssueUseCase<I> {
    /// Persist a new `EN_ATTENTE` issue and enqueue its `PUSH` entry.
    pub async fn execute(&self, input: CreateIssueInput) -> Result<RoadIssue, SyncServiceError> {
        let issue = input.validate()?;
        let id = IssueId::generate();
        let created = self
            .issues
            .create_with_outbox(&id, &issue, Utc::now())
            .await?;
        tracing::info!(issue_id = %created.id, "road issue created");
        Ok(created)
    }
}

// ── UpdateIssueStatus ─────────────────────────────────────────────────────────

pub struct UpdateIssueStatusInput {
    pub id: IssueId,
    pub status: String,
}

pub struct UpdateIssueStatusUseCase<I: IssueRepository> {
    pub issues: I,
}

impl<I: IssueRepository> UpdateIssueStatusUseCase<I> {
    /// Apply a status change and enqueue an `UPDATE` entry with the new snapshot.
    pub async fn execute(
        &self,
        input: UpdateIssueStatusInput,
    ) -> Result<RoadIssue, SyncServiceError> {
        let target = input
            .status
            .parse::<IssueStatus>()
            .map_err(SyncServiceError::validation)?;
        let updated = self
            .issues
            .transition_with_outbox(&input.id, target, Utc::now())
            .await?;
        tracing::info!(issue_id = %updated.id, status = %updated.status, "road issue status updated");
        Ok(updated)
    }
}
