use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::orchestrator::UNKNOWN_CANDIDATE;
use crate::candidates::review::{analyze_and_attach, attach_and_archive, ReportStatus};
use crate::embedding::embed_or_degrade;
use crate::errors::AppError;
use crate::models::{Analysis, Candidate, CandidateRecord, CandidateSummary};
use crate::routes::write_status_code;
use crate::state::AppState;
use crate::store::{Entity, NewCandidate, StoreError, WriteStatus};

fn default_analyze() -> bool {
    true
}

#[derive(Deserialize)]
pub struct UploadCandidateRequest {
    pub job_title: String,
    pub resume_content: String,
    /// Extracted from the resume when absent; a resume with no recognizable name is rejected.
    #[serde(default)]
    pub candidate_name: Option<String>,
    #[serde(default = "default_analyze")]
    pub analyze: bool,
}

#[derive(Serialize)]
pub struct CandidateResponse {
    pub status: WriteStatus,
    pub role_name: String,
    pub title: String,
    pub candidate: Candidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_error: Option<String>,
    #[serde(flatten)]
    pub report: ReportStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Deserialize)]
pub struct RunAnalysisRequest {
    pub job_title: String,
}

#[derive(Deserialize)]
pub struct AttachAnalysisRequest {
    pub job_title: String,
    pub analysis: Analysis,
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub role_name: String,
    pub title: String,
    pub candidate: Candidate,
    #[serde(flatten)]
    pub report: ReportStatus,
}

/// POST /api/v1/roles/:role/candidates
pub async fn handle_upload_candidate(
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(req): Json<UploadCandidateRequest>,
) -> Result<(StatusCode, Json<CandidateResponse>), AppError> {
    if req.job_title.trim().is_empty() {
        return Err(AppError::Validation("job_title must not be empty".to_string()));
    }
    if req.resume_content.trim().is_empty() {
        return Err(AppError::Validation("resume_content must not be empty".to_string()));
    }
    // Resolve the posting first so an unknown title fails before any LLM call.
    let description = state.store.get_description(&role, &req.job_title).await?;

    let name = match req.candidate_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => extract_candidate_name(&state, &req.resume_content).await?,
    };

    let mut warnings = Vec::new();

    let (embedding, embedding_warning) =
        embed_or_degrade(state.embedder.as_ref(), &req.resume_content).await;
    if let Some(w) = embedding_warning {
        warnings.push(format!("stored without embedding: {w}"));
    }
    let github_links = state.links.extract(&req.resume_content);

    let outcome = state
        .store
        .resolve_or_create_candidate(
            &role,
            &description.title,
            NewCandidate {
                name,
                resume_text: req.resume_content,
                embedding,
                github_links,
            },
        )
        .await?;

    let status_code = write_status_code(&outcome);
    let status = outcome.status;
    let mut candidate = outcome.record;
    let mut report = ReportStatus::default();
    let mut analysis_error = None;
    if req.analyze {
        let title = &description.title;
        match analyze_and_attach(&state, &role, title, &candidate, &description.text).await {
            Ok((analysed, status)) => {
                candidate = analysed;
                report = status;
            }
            Err(e) => {
                warn!("Analysis failed for '{}', candidate kept without it: {e}", candidate.name);
                analysis_error = Some(e.to_string());
            }
        }
    }

    Ok((
        status_code,
        Json(CandidateResponse {
            status,
            role_name: role.trim().to_string(),
            title: description.title,
            candidate,
            analysis_error,
            report,
            warnings,
        }),
    ))
}

/// Every unnamed resume would otherwise share the "Unknown Candidate" record
/// and overwrite the previous upload, so the caller must name it instead.
async fn extract_candidate_name(state: &AppState, resume_text: &str) -> Result<String, AppError> {
    match state.analyzer.candidate_name(resume_text).await {
        Ok(name) if name != UNKNOWN_CANDIDATE => Ok(name),
        Ok(_) => Err(AppError::UnprocessableEntity(
            "no candidate name found in the resume; supply candidate_name".to_string(),
        )),
        Err(e) => {
            warn!("Name extraction failed: {e}");
            Err(AppError::UnprocessableEntity(format!(
                "name extraction failed ({e}); supply candidate_name"
            )))
        }
    }
}

/// GET /api/v1/roles/:role/candidates
pub async fn handle_list_role_candidates(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Json<Vec<CandidateSummary>>, AppError> {
    Ok(Json(state.store.list_candidates(Some(&role)).await?))
}

/// GET /api/v1/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<CandidateSummary>>, AppError> {
    Ok(Json(state.store.list_candidates(None).await?))
}

/// GET /api/v1/candidates/:name
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CandidateRecord>, AppError> {
    let found = state.store.get_candidate(&name).await?;
    found.map(Json).ok_or_else(|| {
        StoreError::NotFound {
            entity: Entity::Candidate,
            key: name.trim().to_string(),
        }
        .into()
    })
}

/// POST /api/v1/roles/:role/candidates/:name/analysis
pub async fn handle_run_analysis(
    State(state): State<AppState>,
    Path((role, name)): Path<(String, String)>,
    Json(req): Json<RunAnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let description = state.store.get_description(&role, &req.job_title).await?;
    let candidate = description
        .candidate(&name)
        .cloned()
        .ok_or_else(|| StoreError::NotFound {
            entity: Entity::Candidate,
            key: name.trim().to_string(),
        })?;

    let (candidate, report) =
        analyze_and_attach(&state, &role, &description.title, &candidate, &description.text).await?;

    Ok(Json(AnalysisResponse {
        role_name: role.trim().to_string(),
        title: description.title,
        candidate,
        report,
    }))
}

/// PUT /api/v1/roles/:role/candidates/:name/analysis
pub async fn handle_attach_analysis(
    State(state): State<AppState>,
    Path((role, name)): Path<(String, String)>,
    Json(req): Json<AttachAnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let description = state.store.get_description(&role, &req.job_title).await?;
    let (candidate, report) =
        attach_and_archive(&state, &role, &description.title, &name, req.analysis).await?;

    Ok(Json(AnalysisResponse {
        role_name: role.trim().to_string(),
        title: description.title,
        candidate,
        report,
    }))
}
