pub mod candidate;
pub mod job;

pub use candidate::{
    Analysis, AnalysisSection, Candidate, CandidateRecord, CandidateSummary, SectionKind,
};
pub use job::{JobDescription, JobRole, RoleSummary};

/// Case-insensitive natural-key comparison used at every level of the role tree.
pub fn same_key(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Normalized form of a natural key, as stored in the `role_key` column.
pub fn key_of(value: &str) -> String {
    value.trim().to_lowercase()
}
