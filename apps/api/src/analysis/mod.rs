pub mod github;
pub mod orchestrator;
pub mod prompts;

pub use github::GitHubLinkExtractor;
pub use orchestrator::{AnalysisOrchestrator, AnalysisRequest, LlmAnalysisOrchestrator};
