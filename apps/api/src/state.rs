use std::sync::Arc;

use crate::analysis::{AnalysisOrchestrator, GitHubLinkExtractor};
use crate::embedding::Embedder;
use crate::reports::ReportArchive;
use crate::store::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub embedder: Arc<dyn Embedder>,
    pub analyzer: Arc<dyn AnalysisOrchestrator>,
    pub links: GitHubLinkExtractor,
    /// Absent when S3 is not configured; analyses are then only kept in the store.
    pub reports: Option<ReportArchive>,
}
