//! Runs the analysis orchestrator for a stored candidate, attaches the result and
//! archives the rendered report.

use serde::Serialize;
use tracing::warn;

use crate::analysis::AnalysisRequest;
use crate::errors::AppError;
use crate::models::{Analysis, Candidate};
use crate::state::AppState;

/// Where the archived report went, if anywhere.
#[derive(Debug, Default, Serialize)]
pub struct ReportStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_error: Option<String>,
}

/// Analyses `candidate` against `jd_text` and attaches the result. The candidate
/// record is untouched when the analysis itself fails.
pub async fn analyze_and_attach(
    state: &AppState,
    role_name: &str,
    title: &str,
    candidate: &Candidate,
    jd_text: &str,
) -> Result<(Candidate, ReportStatus), AppError> {
    let analysis = state
        .analyzer
        .analyze(AnalysisRequest {
            resume_text: &candidate.resume_text,
            jd_text,
            github_links: &candidate.github_links,
        })
        .await?;

    attach_and_archive(state, role_name, title, &candidate.name, analysis).await
}

pub async fn attach_and_archive(
    state: &AppState,
    role_name: &str,
    title: &str,
    candidate_name: &str,
    analysis: Analysis,
) -> Result<(Candidate, ReportStatus), AppError> {
    let candidate = state
        .store
        .attach_analysis(role_name, title, candidate_name, analysis)
        .await?;
    let report = archive(state, role_name, title, &candidate).await;
    Ok((candidate, report))
}

/// Report upload failures are surfaced, never fatal; the analysis is already stored.
async fn archive(
    state: &AppState,
    role_name: &str,
    title: &str,
    candidate: &Candidate,
) -> ReportStatus {
    let Some(reports) = &state.reports else {
        return ReportStatus::default();
    };

    match reports.upload(role_name, title, candidate).await {
        Ok(key) => ReportStatus {
            report_key: Some(key),
            report_error: None,
        },
        Err(e) => {
            warn!("Report upload failed for '{}': {e:#}", candidate.name);
            ReportStatus {
                report_key: None,
                report_error: Some(e.to_string()),
            }
        }
    }
}
