use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::{key_of, JobRole};
use crate::store::backend::{BackendError, DocumentBackend, RoleTransaction};

/// Process-local backend. A single mutex serializes every write transaction;
/// used by tests and when no `DATABASE_URL` is configured.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    roles: Arc<Mutex<Vec<JobRole>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn position(roles: &[JobRole], role_key: &str) -> Option<usize> {
    roles.iter().position(|r| key_of(&r.role_name) == role_key)
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
    async fn begin(&self, role_key: &str) -> Result<Box<dyn RoleTransaction>, BackendError> {
        let guard = self.roles.clone().lock_owned().await;
        Ok(Box::new(InMemoryTransaction {
            guard,
            role_key: role_key.to_string(),
            staged: None,
        }))
    }

    async fn fetch_role(&self, role_key: &str) -> Result<Option<JobRole>, BackendError> {
        let roles = self.roles.lock().await;
        Ok(position(&roles, role_key).map(|i| roles[i].clone()))
    }

    async fn fetch_all(&self) -> Result<Vec<JobRole>, BackendError> {
        Ok(self.roles.lock().await.clone())
    }

    async fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<Vec<JobRole>>,
    role_key: String,
    staged: Option<JobRole>,
}

#[async_trait]
impl RoleTransaction for InMemoryTransaction {
    async fn current(&mut self) -> Result<Option<JobRole>, BackendError> {
        if let Some(staged) = &self.staged {
            return Ok(Some(staged.clone()));
        }
        Ok(position(&self.guard, &self.role_key).map(|i| self.guard[i].clone()))
    }

    async fn save(&mut self, role: &JobRole) -> Result<(), BackendError> {
        if key_of(&role.role_name) != self.role_key {
            return Err(BackendError::Query(format!(
                "transaction for '{}' cannot write role '{}'",
                self.role_key, role.role_name
            )));
        }
        self.staged = Some(role.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), BackendError> {
        let InMemoryTransaction {
            mut guard,
            role_key,
            staged,
        } = *self;
        if let Some(role) = staged {
            match position(&guard, &role_key) {
                Some(i) => guard[i] = role,
                None => guard.push(role),
            }
        }
        Ok(())
    }
}
