use async_trait::async_trait;
use thiserror::Error;

use crate::models::JobRole;

#[derive(Debug, Error)]
pub enum BackendError {
    /// Connectivity or pool exhaustion. Safe to retry.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt role document '{role_key}': {message}")]
    Corrupt { role_key: String, message: String },

    #[error("query failed: {0}")]
    Query(String),
}

/// Persistence for whole role documents.
///
/// Reads return the current committed state. Writes go through a
/// [`RoleTransaction`], which holds an exclusive lock on one role key from
/// `begin` until commit or drop, so resolve-or-create at any level of the
/// role tree is a single compare-and-swap.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Locks `role_key` (which need not exist yet) for a read-modify-write.
    async fn begin(&self, role_key: &str) -> Result<Box<dyn RoleTransaction>, BackendError>;

    async fn fetch_role(&self, role_key: &str) -> Result<Option<JobRole>, BackendError>;

    /// All roles in creation order.
    async fn fetch_all(&self) -> Result<Vec<JobRole>, BackendError>;

    async fn ping(&self) -> Result<(), BackendError>;
}

/// An open write on a single role document. Dropping it without `commit`
/// discards every staged write.
#[async_trait]
pub trait RoleTransaction: Send {
    /// The role as currently stored, re-read under the lock.
    async fn current(&mut self) -> Result<Option<JobRole>, BackendError>;

    /// Stages the full document for the locked key.
    async fn save(&mut self, role: &JobRole) -> Result<(), BackendError>;

    async fn commit(self: Box<Self>) -> Result<(), BackendError>;
}
