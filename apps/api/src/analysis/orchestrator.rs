//! Analysis orchestration — name/title extraction and candidate fit analysis.
//!
//! The store treats the produced [`Analysis`] as opaque. `AppState` carries an
//! `Arc<dyn AnalysisOrchestrator>`; `LlmAnalysisOrchestrator` is the production
//! implementation.

use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::analysis::github::fetch_readme;
use crate::analysis::prompts::{
    CANDIDATE_FIT_PROMPT, NAME_EXTRACTION_PROMPT, NAME_EXTRACTION_SYSTEM, PROJECT_ANALYST_SYSTEM,
    README_ANALYSIS_PROMPT, RECRUITER_SYSTEM, TITLE_EXTRACTION_PROMPT, TITLE_EXTRACTION_SYSTEM,
};
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, MARKDOWN_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::{Analysis, AnalysisSection, SectionKind};

pub const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Extraction answers are a name or a title; keep those calls short.
const EXTRACTION_MAX_TOKENS: u32 = 64;
/// READMEs beyond this many characters are truncated before analysis.
const MAX_README_CHARS: usize = 12_000;

pub struct AnalysisRequest<'a> {
    pub resume_text: &'a str,
    pub jd_text: &'a str,
    pub github_links: &'a BTreeSet<String>,
}

#[async_trait]
pub trait AnalysisOrchestrator: Send + Sync {
    /// Candidate's full name, or [`UNKNOWN_CANDIDATE`] when the resume has none.
    async fn candidate_name(&self, resume_text: &str) -> Result<String, LlmError>;

    /// Job title, or [`UNKNOWN_TITLE`] when the description has none.
    async fn job_title(&self, jd_text: &str) -> Result<String, LlmError>;

    /// One candidate-fit section plus one section per GitHub link. Failures on
    /// individual repositories become `GithubAnalysisError` sections; only a
    /// failed fit analysis fails the whole call.
    async fn analyze(&self, request: AnalysisRequest<'_>) -> Result<Analysis, LlmError>;
}

#[derive(Debug, Deserialize)]
struct ExtractedName {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractedTitle {
    title: Option<String>,
}

fn or_unknown(value: Option<String>, fallback: &str) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() && !v.eq_ignore_ascii_case(fallback) => v,
        _ => fallback.to_string(),
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub struct LlmAnalysisOrchestrator {
    extractor: LlmClient,
    analyst: LlmClient,
    http: Client,
}

impl LlmAnalysisOrchestrator {
    pub fn new(api_key: String) -> Self {
        Self {
            extractor: LlmClient::with_max_tokens(api_key.clone(), EXTRACTION_MAX_TOKENS),
            analyst: LlmClient::new(api_key),
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    async fn project_section(&self, link: &str, jd_text: &str) -> AnalysisSection {
        let readme = match fetch_readme(&self.http, link).await {
            Ok(readme) => readme,
            Err(e) => {
                warn!("README unavailable for {link}: {e}");
                return AnalysisSection::new(
                    SectionKind::GithubAnalysisError,
                    format!("README could not be retrieved: {e}"),
                )
                .with_source(link);
            }
        };

        let prompt = README_ANALYSIS_PROMPT
            .replace("{repo_url}", link)
            .replace("{jd_text}", jd_text)
            .replace("{readme}", truncate_chars(&readme, MAX_README_CHARS))
            .replace("{format_instruction}", MARKDOWN_INSTRUCTION);

        match self.analyst.call_text(&prompt, PROJECT_ANALYST_SYSTEM).await {
            Ok(text) => AnalysisSection::new(SectionKind::GithubProject, text).with_source(link),
            Err(e) => {
                warn!("README analysis failed for {link}: {e}");
                AnalysisSection::new(
                    SectionKind::GithubAnalysisError,
                    format!("README analysis failed: {e}"),
                )
                .with_source(link)
            }
        }
    }
}

#[async_trait]
impl AnalysisOrchestrator for LlmAnalysisOrchestrator {
    async fn candidate_name(&self, resume_text: &str) -> Result<String, LlmError> {
        let prompt = NAME_EXTRACTION_PROMPT.replace("{resume_text}", resume_text);
        let system = format!("{NAME_EXTRACTION_SYSTEM} {JSON_ONLY_SYSTEM}");
        let extracted: ExtractedName = self.extractor.call_json(&prompt, &system).await?;
        Ok(or_unknown(extracted.name, UNKNOWN_CANDIDATE))
    }

    async fn job_title(&self, jd_text: &str) -> Result<String, LlmError> {
        let prompt = TITLE_EXTRACTION_PROMPT.replace("{jd_text}", jd_text);
        let system = format!("{TITLE_EXTRACTION_SYSTEM} {JSON_ONLY_SYSTEM}");
        let extracted: ExtractedTitle = self.extractor.call_json(&prompt, &system).await?;
        Ok(or_unknown(extracted.title, UNKNOWN_TITLE))
    }

    async fn analyze(&self, request: AnalysisRequest<'_>) -> Result<Analysis, LlmError> {
        let prompt = CANDIDATE_FIT_PROMPT
            .replace("{jd_text}", request.jd_text)
            .replace("{resume_text}", request.resume_text)
            .replace("{format_instruction}", MARKDOWN_INSTRUCTION);
        let fit = self.analyst.call_text(&prompt, RECRUITER_SYSTEM).await?;

        let mut sections = vec![AnalysisSection::new(SectionKind::CandidateFit, fit)];
        for link in request.github_links {
            sections.push(self.project_section(link, request.jd_text).await);
        }

        let analysis = Analysis { sections };
        info!(
            "Analysis complete: {} repositories analysed, {} failed",
            analysis.sections_of(SectionKind::GithubProject).count(),
            analysis.sections_of(SectionKind::GithubAnalysisError).count()
        );
        Ok(analysis)
    }
}
