use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::orchestrator::UNKNOWN_TITLE;
use crate::embedding::embed_or_degrade;
use crate::errors::AppError;
use crate::models::{JobDescription, JobRole, RoleSummary};
use crate::routes::write_status_code;
use crate::state::AppState;
use crate::store::{NewDescription, NewRole, Outcome, WriteStatus};

#[derive(Deserialize)]
pub struct CreateDescriptionRequest {
    /// Extracted from `content` when absent.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: String,
    pub content: String,
}

#[derive(Serialize)]
pub struct DescriptionResponse {
    pub status: WriteStatus,
    pub role_name: String,
    pub description: JobDescription,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// POST /api/v1/roles
pub async fn handle_create_role(
    State(state): State<AppState>,
    Json(req): Json<NewRole>,
) -> Result<(StatusCode, Json<Outcome<JobRole>>), AppError> {
    let outcome = state.store.resolve_or_create_role(req).await?;
    Ok((write_status_code(&outcome), Json(outcome)))
}

/// GET /api/v1/roles
pub async fn handle_list_roles(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleSummary>>, AppError> {
    Ok(Json(state.store.list_roles().await?))
}

/// GET /api/v1/roles/:role
pub async fn handle_get_role(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Json<JobRole>, AppError> {
    let found = state.store.get_role(&role).await?;
    found
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job role not found: {}", role.trim())))
}

/// POST /api/v1/roles/:role/descriptions
pub async fn handle_create_description(
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(req): Json<CreateDescriptionRequest>,
) -> Result<(StatusCode, Json<DescriptionResponse>), AppError> {
    if req.content.trim().is_empty() {
        return Err(AppError::Validation(
            "job description content must not be empty".to_string(),
        ));
    }

    let mut warnings = Vec::new();
    let title = match req.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => title.to_string(),
        None => match state.analyzer.job_title(&req.content).await {
            Ok(title) => title,
            Err(e) => {
                warn!("Title extraction failed, using '{UNKNOWN_TITLE}': {e}");
                warnings.push(format!("title extraction failed: {e}"));
                UNKNOWN_TITLE.to_string()
            }
        },
    };

    let (embedding, embedding_warning) =
        embed_or_degrade(state.embedder.as_ref(), &req.content).await;
    if let Some(w) = embedding_warning {
        warnings.push(format!("stored without embedding: {w}"));
    }

    let outcome = state
        .store
        .resolve_or_create_description(
            &role,
            NewDescription {
                title,
                location: req.location,
                text: req.content,
                embedding,
            },
        )
        .await?;

    Ok((
        write_status_code(&outcome),
        Json(DescriptionResponse {
            status: outcome.status,
            role_name: role.trim().to_string(),
            description: outcome.record,
            warnings,
        }),
    ))
}

/// GET /api/v1/titles
pub async fn handle_list_all_titles(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.store.list_titles(None).await?))
}

/// GET /api/v1/roles/:role/titles
pub async fn handle_list_role_titles(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.store.list_titles(Some(&role)).await?))
}
