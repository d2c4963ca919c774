//! Document store — reconciles incoming roles, job descriptions, candidates and
//! analyses against the nested role documents held by a [`DocumentBackend`].
//!
//! Every write is a resolve-or-create performed inside a role-scoped
//! transaction: the backend locks the role key, the current document is re-read,
//! mutated in memory and saved back whole. Nothing is cached between calls.

pub mod backend;
pub mod memory;
pub mod postgres;

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    key_of, Analysis, Candidate, CandidateRecord, CandidateSummary, JobDescription, JobRole,
    RoleSummary,
};
use crate::similarity::{self, SimilarityError};

pub use backend::{BackendError, DocumentBackend};
pub use memory::InMemoryBackend;
pub use postgres::PgBackend;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Role,
    Description,
    Candidate,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Role => "Job role",
            Entity::Description => "Job description",
            Entity::Candidate => "Candidate",
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: Entity, key: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    DimensionMismatch(#[from] SimilarityError),

    /// The backend could not be reached or did not answer in time.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// Only connectivity failures are worth retrying; every write converges on
    /// the same state when re-run with the same inputs.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::StorageUnavailable(_))
    }

    fn not_found(entity: Entity, key: &str) -> Self {
        StoreError::NotFound {
            entity,
            key: key.trim().to_string(),
        }
    }
}

impl From<BackendError> for StoreError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Unavailable(msg) => StoreError::StorageUnavailable(msg),
            other => StoreError::Storage(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Cosine similarity at or above which two job descriptions are the same posting.
    pub similarity_threshold: f64,
    /// Upper bound on one operation's storage round-trips, transaction included.
    pub storage_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    Created,
    Updated,
    /// An existing record was returned and nothing was written.
    Duplicate,
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub status: WriteStatus,
    pub record: T,
}

impl<T> Outcome<T> {
    fn new(status: WriteStatus, record: T) -> Self {
        Self { status, record }
    }

    pub fn was_created(&self) -> bool {
        self.status == WriteStatus::Created
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRole {
    pub role_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub worktype: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub required_experience: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewDescription {
    pub title: String,
    pub location: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCandidate {
    pub name: String,
    pub resume_text: String,
    pub embedding: Vec<f32>,
    pub github_links: BTreeSet<String>,
}

fn required(field: &str, value: &str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

#[derive(Clone)]
pub struct DocumentStore {
    backend: Arc<dyn DocumentBackend>,
    config: StoreConfig,
}

impl DocumentStore {
    pub fn new(backend: Arc<dyn DocumentBackend>, config: StoreConfig) -> Self {
        Self { backend, config }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBackend::new()), StoreConfig::default())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.config.storage_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{operation} exceeded storage timeout of {}ms",
                    self.config.storage_timeout.as_millis()
                );
                Err(StoreError::StorageUnavailable(format!(
                    "{operation} timed out after {}ms",
                    self.config.storage_timeout.as_millis()
                )))
            }
        }
    }

    // Writes

    /// Returns the role with this name, creating it on first reference.
    /// Descriptive fields of an existing role are never touched.
    pub async fn resolve_or_create_role(
        &self,
        input: NewRole,
    ) -> Result<Outcome<JobRole>, StoreError> {
        let role_name = required("role_name", &input.role_name)?;
        self.bounded("resolve_or_create_role", self.create_role_locked(role_name, input))
            .await
    }

    async fn create_role_locked(
        &self,
        role_name: String,
        input: NewRole,
    ) -> Result<Outcome<JobRole>, StoreError> {
        let mut tx = self.backend.begin(&key_of(&role_name)).await?;
        if let Some(existing) = tx.current().await? {
            debug!("Job role '{}' already exists", existing.role_name);
            return Ok(Outcome::new(WriteStatus::Duplicate, existing));
        }

        let role = JobRole {
            id: Uuid::new_v4(),
            role_name,
            department: input.department.trim().to_string(),
            worktype: input.worktype.trim().to_string(),
            salary: input.salary.trim().to_string(),
            required_experience: input.required_experience.trim().to_string(),
            created_at: Utc::now(),
            descriptions: Vec::new(),
        };
        tx.save(&role).await?;
        tx.commit().await?;

        info!("Created job role '{}' ({})", role.role_name, role.id);
        Ok(Outcome::new(WriteStatus::Created, role))
    }

    /// Returns the first description under `role_name` whose embedding matches
    /// the incoming one, or appends a new description. On a match the incoming
    /// text, title, location and embedding are discarded.
    pub async fn resolve_or_create_description(
        &self,
        role_name: &str,
        input: NewDescription,
    ) -> Result<Outcome<JobDescription>, StoreError> {
        required("role_name", role_name)?;
        required("title", &input.title)?;
        if input.text.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "job description text must not be empty".to_string(),
            ));
        }
        self.bounded(
            "resolve_or_create_description",
            self.create_description_locked(role_name, input),
        )
        .await
    }

    async fn create_description_locked(
        &self,
        role_name: &str,
        input: NewDescription,
    ) -> Result<Outcome<JobDescription>, StoreError> {
        let mut tx = self.backend.begin(&key_of(role_name)).await?;
        let mut role = tx
            .current()
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Role, role_name))?;

        // Without a vector there is nothing to compare; always create.
        if !input.embedding.is_empty() {
            for existing in &role.descriptions {
                if similarity::is_match(
                    &input.embedding,
                    &existing.embedding,
                    self.config.similarity_threshold,
                )? {
                    debug!(
                        "Job description '{}' matches existing '{}' under '{}'",
                        input.title.trim(),
                        existing.title,
                        role.role_name
                    );
                    return Ok(Outcome::new(WriteStatus::Duplicate, existing.clone()));
                }
            }
        }

        let description = JobDescription {
            title: input.title.trim().to_string(),
            location: input.location.trim().to_string(),
            text: input.text,
            embedding: input.embedding,
            created_at: Utc::now(),
            candidates: Vec::new(),
        };
        role.descriptions.push(description.clone());
        tx.save(&role).await?;
        tx.commit().await?;

        info!(
            "Created job description '{}' under '{}' (embedding dim {})",
            description.title,
            role.role_name,
            description.embedding.len()
        );
        Ok(Outcome::new(WriteStatus::Created, description))
    }

    /// Creates the candidate under (role, title), or replaces the resume fields
    /// of the existing candidate with the same name. A prior analysis survives
    /// the replace.
    pub async fn resolve_or_create_candidate(
        &self,
        role_name: &str,
        title: &str,
        input: NewCandidate,
    ) -> Result<Outcome<Candidate>, StoreError> {
        required("role_name", role_name)?;
        required("title", title)?;
        required("name", &input.name)?;
        self.bounded(
            "resolve_or_create_candidate",
            self.upsert_candidate_locked(role_name, title, input),
        )
        .await
    }

    async fn upsert_candidate_locked(
        &self,
        role_name: &str,
        title: &str,
        input: NewCandidate,
    ) -> Result<Outcome<Candidate>, StoreError> {
        let mut tx = self.backend.begin(&key_of(role_name)).await?;
        let mut role = tx
            .current()
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Role, role_name))?;
        let description = role
            .description_mut(title)
            .ok_or_else(|| StoreError::not_found(Entity::Description, title))?;

        let now = Utc::now();
        let outcome = match description.candidate_mut(&input.name) {
            Some(existing) => {
                existing.resume_text = input.resume_text;
                existing.embedding = input.embedding;
                existing.github_links = input.github_links;
                existing.uploaded_at = now;
                Outcome::new(WriteStatus::Updated, existing.clone())
            }
            None => {
                let candidate = Candidate {
                    name: input.name.trim().to_string(),
                    resume_text: input.resume_text,
                    embedding: input.embedding,
                    github_links: input.github_links,
                    uploaded_at: now,
                    analysis: None,
                };
                description.candidates.push(candidate.clone());
                Outcome::new(WriteStatus::Created, candidate)
            }
        };
        tx.save(&role).await?;
        tx.commit().await?;

        info!(
            "Candidate '{}' {:?} under '{}' / '{}'",
            outcome.record.name, outcome.status, role.role_name, title
        );
        Ok(outcome)
    }

    /// Replaces the candidate's analysis wholesale.
    pub async fn attach_analysis(
        &self,
        role_name: &str,
        title: &str,
        candidate_name: &str,
        analysis: Analysis,
    ) -> Result<Candidate, StoreError> {
        required("role_name", role_name)?;
        required("title", title)?;
        required("candidate_name", candidate_name)?;
        self.bounded(
            "attach_analysis",
            self.attach_analysis_locked(role_name, title, candidate_name, analysis),
        )
        .await
    }

    async fn attach_analysis_locked(
        &self,
        role_name: &str,
        title: &str,
        candidate_name: &str,
        analysis: Analysis,
    ) -> Result<Candidate, StoreError> {
        let mut tx = self.backend.begin(&key_of(role_name)).await?;
        let mut role = tx
            .current()
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Role, role_name))?;
        let candidate = role
            .description_mut(title)
            .ok_or_else(|| StoreError::not_found(Entity::Description, title))?
            .candidate_mut(candidate_name)
            .ok_or_else(|| StoreError::not_found(Entity::Candidate, candidate_name))?;

        candidate.analysis = Some(analysis);
        let candidate = candidate.clone();
        tx.save(&role).await?;
        tx.commit().await?;

        info!(
            "Attached analysis ({} sections) to '{}'",
            candidate.analysis.as_ref().map_or(0, |a| a.sections.len()),
            candidate.name
        );
        Ok(candidate)
    }

    // Reads

    pub async fn get_role(&self, role_name: &str) -> Result<Option<JobRole>, StoreError> {
        let key = key_of(role_name);
        self.bounded("get_role", async move {
            self.backend.fetch_role(&key).await.map_err(StoreError::from)
        })
        .await
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleSummary>, StoreError> {
        let roles = self
            .bounded("list_roles", async {
                self.backend.fetch_all().await.map_err(StoreError::from)
            })
            .await?;
        Ok(roles.iter().map(RoleSummary::from).collect())
    }

    pub async fn get_description(
        &self,
        role_name: &str,
        title: &str,
    ) -> Result<JobDescription, StoreError> {
        let role = self
            .get_role(role_name)
            .await?
            .ok_or_else(|| StoreError::not_found(Entity::Role, role_name))?;
        role.description(title)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Entity::Description, title))
    }

    /// All roles, or just the named one (`NotFound` when it does not exist).
    async fn roles_in_scope(&self, role_name: Option<&str>) -> Result<Vec<JobRole>, StoreError> {
        match role_name {
            None => {
                self.bounded("fetch_all", async {
                    self.backend.fetch_all().await.map_err(StoreError::from)
                })
                .await
            }
            Some(name) => {
                let role = self
                    .get_role(name)
                    .await?
                    .ok_or_else(|| StoreError::not_found(Entity::Role, name))?;
                Ok(vec![role])
            }
        }
    }

    pub async fn list_titles(&self, role_name: Option<&str>) -> Result<Vec<String>, StoreError> {
        let roles = self.roles_in_scope(role_name).await?;
        Ok(roles
            .iter()
            .flat_map(|r| r.descriptions.iter().map(|d| d.title.clone()))
            .collect())
    }

    pub async fn list_candidates(
        &self,
        role_name: Option<&str>,
    ) -> Result<Vec<CandidateSummary>, StoreError> {
        let roles = self.roles_in_scope(role_name).await?;
        Ok(roles
            .iter()
            .flat_map(|role| {
                role.descriptions.iter().flat_map(move |d| {
                    d.candidates
                        .iter()
                        .map(move |c| CandidateSummary::new(&role.role_name, &d.title, c))
                })
            })
            .collect())
    }

    /// First candidate with this name anywhere in the store. Absence is `None`.
    pub async fn get_candidate(&self, name: &str) -> Result<Option<CandidateRecord>, StoreError> {
        let roles = self.roles_in_scope(None).await?;
        for role in roles {
            for description in &role.descriptions {
                if let Some(candidate) = description.candidate(name) {
                    return Ok(Some(CandidateRecord {
                        role_name: role.role_name.clone(),
                        title: description.title.clone(),
                        candidate: candidate.clone(),
                    }));
                }
            }
        }
        Ok(None)
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.bounded("ping", async { self.backend.ping().await.map_err(StoreError::from) })
            .await
    }
}
