use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::candidate::Candidate;
use crate::models::same_key;

/// A job position category. Owns every description posted under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRole {
    pub id: Uuid,
    pub role_name: String,
    pub department: String,
    pub worktype: String,
    pub salary: String,
    pub required_experience: String,
    pub created_at: DateTime<Utc>,
    /// Creation order.
    #[serde(default)]
    pub descriptions: Vec<JobDescription>,
}

impl JobRole {
    /// First description whose title matches case-insensitively.
    pub fn description(&self, title: &str) -> Option<&JobDescription> {
        self.descriptions.iter().find(|d| same_key(&d.title, title))
    }

    pub fn description_mut(&mut self, title: &str) -> Option<&mut JobDescription> {
        self.descriptions.iter_mut().find(|d| same_key(&d.title, title))
    }

    pub fn candidate_count(&self) -> usize {
        self.descriptions.iter().map(|d| d.candidates.len()).sum()
    }
}

/// One concrete posting under a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    pub title: String,
    pub location: String,
    pub text: String,
    /// Empty when the embedder was unavailable; such descriptions never deduplicate.
    #[serde(default)]
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl JobDescription {
    pub fn candidate(&self, name: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| same_key(&c.name, name))
    }

    pub fn candidate_mut(&mut self, name: &str) -> Option<&mut Candidate> {
        self.candidates.iter_mut().find(|c| same_key(&c.name, name))
    }
}

/// Flattened role listing without the nested descriptions.
#[derive(Debug, Clone, Serialize)]
pub struct RoleSummary {
    pub id: Uuid,
    pub role_name: String,
    pub department: String,
    pub worktype: String,
    pub salary: String,
    pub required_experience: String,
    pub description_count: usize,
    pub candidate_count: usize,
}

impl From<&JobRole> for RoleSummary {
    fn from(role: &JobRole) -> Self {
        Self {
            id: role.id,
            role_name: role.role_name.clone(),
            department: role.department.clone(),
            worktype: role.worktype.clone(),
            salary: role.salary.clone(),
            required_experience: role.required_experience.clone(),
            description_count: role.descriptions.len(),
            candidate_count: role.candidate_count(),
        }
    }
}
