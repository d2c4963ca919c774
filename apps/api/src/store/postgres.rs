use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::JobRole;
use crate::store::backend::{BackendError, DocumentBackend, RoleTransaction};

/// Role documents stored as JSONB, one row per case-insensitive role key.
#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => BackendError::Unavailable(e.to_string()),
            other => BackendError::Query(other.to_string()),
        }
    }
}

fn decode(role_key: &str, raw: serde_json::Value) -> Result<JobRole, BackendError> {
    serde_json::from_value(raw).map_err(|e| BackendError::Corrupt {
        role_key: role_key.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl DocumentBackend for PgBackend {
    async fn begin(&self, role_key: &str) -> Result<Box<dyn RoleTransaction>, BackendError> {
        let mut tx = self.pool.begin().await?;
        // Serializes writers on the key even before the row exists.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(role_key)
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgRoleTransaction {
            tx,
            role_key: role_key.to_string(),
        }))
    }

    async fn fetch_role(&self, role_key: &str) -> Result<Option<JobRole>, BackendError> {
        let raw: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT document FROM job_roles WHERE role_key = $1")
                .bind(role_key)
                .fetch_optional(&self.pool)
                .await?;
        raw.map(|raw| decode(role_key, raw)).transpose()
    }

    async fn fetch_all(&self) -> Result<Vec<JobRole>, BackendError> {
        let rows: Vec<(String, serde_json::Value)> =
            sqlx::query_as("SELECT role_key, document FROM job_roles ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter()
            .map(|(key, raw)| decode(&key, raw))
            .collect()
    }

    async fn ping(&self) -> Result<(), BackendError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

struct PgRoleTransaction {
    tx: Transaction<'static, Postgres>,
    role_key: String,
}

#[async_trait]
impl RoleTransaction for PgRoleTransaction {
    async fn current(&mut self) -> Result<Option<JobRole>, BackendError> {
        let raw: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT document FROM job_roles WHERE role_key = $1 FOR UPDATE")
                .bind(&self.role_key)
                .fetch_optional(&mut *self.tx)
                .await?;
        raw.map(|raw| decode(&self.role_key, raw)).transpose()
    }

    async fn save(&mut self, role: &JobRole) -> Result<(), BackendError> {
        sqlx::query(
            r#"
            INSERT INTO job_roles (id, role_key, document)
            VALUES ($1, $2, $3)
            ON CONFLICT (role_key)
            DO UPDATE SET document = EXCLUDED.document, updated_at = now()
            "#,
        )
        .bind(role.id)
        .bind(&self.role_key)
        .bind(Json(role))
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), BackendError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use crate::db;
    use crate::models::key_of;
    use crate::store::{DocumentStore, NewCandidate, NewDescription, NewRole, StoreConfig};

    async fn pg_store() -> (DocumentStore, PgPool) {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = db::create_pool(&url).await.unwrap();
        db::migrate(&pool).await.unwrap();
        let store = DocumentStore::new(
            Arc::new(PgBackend::new(pool.clone())),
            StoreConfig::default(),
        );
        (store, pool)
    }

    fn new_role(name: &str) -> NewRole {
        NewRole {
            role_name: name.to_string(),
            department: "Platform".to_string(),
            worktype: "Remote".to_string(),
            salary: "120k".to_string(),
            required_experience: "5 years".to_string(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore = "Requires a PostgreSQL instance at DATABASE_URL"]
    async fn test_concurrent_writers_share_one_row() {
        let (store, pool) = pg_store().await;
        let role = format!("Engineer {}", uuid::Uuid::new_v4());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let name = if i % 2 == 0 { role.clone() } else { role.to_uppercase() };
                tokio::spawn(async move { store.resolve_or_create_role(new_role(&name)).await })
            })
            .collect();
        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().was_created() {
                created += 1;
            }
        }
        assert_eq!(created, 1);

        store
            .resolve_or_create_description(
                &role,
                NewDescription {
                    title: "Backend Engineer".to_string(),
                    location: "Berlin".to_string(),
                    text: "Build and run distributed systems in Rust.".to_string(),
                    embedding: vec![1.0, 0.0],
                },
            )
            .await
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                let role = role.clone();
                tokio::spawn(async move {
                    let candidate = NewCandidate {
                        name: "Jane Doe".to_string(),
                        resume_text: format!("Jane Doe, revision {i}"),
                        embedding: vec![0.1, 0.2],
                        github_links: BTreeSet::new(),
                    };
                    store
                        .resolve_or_create_candidate(&role, "backend engineer", candidate)
                        .await
                })
            })
            .collect();
        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().was_created() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.list_candidates(Some(&role)).await.unwrap().len(), 1);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_roles WHERE role_key = $1")
            .bind(key_of(&role))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        sqlx::query("DELETE FROM job_roles WHERE role_key = $1")
            .bind(key_of(&role))
            .execute(&pool)
            .await
            .unwrap();
    }
}
