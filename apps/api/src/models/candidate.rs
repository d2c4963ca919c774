use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One resume submission under a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub resume_text: String,
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub github_links: BTreeSet<String>,
    /// Refreshed every time the record is replaced by a new upload.
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    CandidateFit,
    GithubProject,
    GithubAnalysisError,
}

impl SectionKind {
    pub fn heading(&self) -> &'static str {
        match self {
            SectionKind::CandidateFit => "Candidate Fit",
            SectionKind::GithubProject => "GitHub Project",
            SectionKind::GithubAnalysisError => "GitHub Analysis Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub kind: SectionKind,
    pub content: String,
    /// Repository URL for GitHub sections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl AnalysisSection {
    pub fn new(kind: SectionKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Opaque analysis payload. Always replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub sections: Vec<AnalysisSection>,
}

impl Analysis {
    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &AnalysisSection> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }
}

/// A candidate located in the role tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRecord {
    pub role_name: String,
    pub title: String,
    #[serde(flatten)]
    pub candidate: Candidate,
}

/// Listing row for candidates; carries the parent context but not the resume body.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub role_name: String,
    pub title: String,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
    pub github_links: BTreeSet<String>,
    pub analyzed: bool,
}

impl CandidateSummary {
    pub fn new(role_name: &str, title: &str, candidate: &Candidate) -> Self {
        Self {
            role_name: role_name.to_string(),
            title: title.to_string(),
            name: candidate.name.clone(),
            uploaded_at: candidate.uploaded_at,
            github_links: candidate.github_links.clone(),
            analyzed: candidate.analysis.is_some(),
        }
    }
}
