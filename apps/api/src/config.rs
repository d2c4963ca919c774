use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::embedding::DEFAULT_MODEL;
use crate::store::{StoreConfig, DEFAULT_SIMILARITY_THRESHOLD};

/// S3 / MinIO settings for the report archive.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent → in-memory store.
    pub database_url: Option<String>,
    pub anthropic_api_key: String,
    pub embedding: Option<EmbeddingConfig>,
    pub s3: Option<S3Config>,
    pub similarity_threshold: f64,
    pub storage_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| {
            get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            optional(key)
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let similarity_threshold = match optional("SIMILARITY_THRESHOLD") {
            Some(raw) => raw
                .parse::<f64>()
                .context("SIMILARITY_THRESHOLD must be a number")?,
            None => DEFAULT_SIMILARITY_THRESHOLD,
        };
        if !(-1.0..=1.0).contains(&similarity_threshold) {
            bail!("SIMILARITY_THRESHOLD must lie in [-1, 1], got {similarity_threshold}");
        }

        let storage_timeout_ms = match optional("STORAGE_TIMEOUT_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("STORAGE_TIMEOUT_MS must be a whole number of milliseconds")?,
            None => 5000,
        };

        let embedding = optional("EMBEDDING_URL").map(|url| EmbeddingConfig {
            url,
            model: optional("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: optional("EMBEDDING_API_KEY"),
        });

        let s3 = match optional("S3_BUCKET") {
            Some(bucket) => Some(S3Config {
                bucket,
                endpoint: require("S3_ENDPOINT")?,
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            }),
            None => None,
        };

        Ok(Config {
            database_url: optional("DATABASE_URL"),
            anthropic_api_key: require("ANTHROPIC_API_KEY")?,
            embedding,
            s3,
            similarity_threshold,
            storage_timeout: Duration::from_millis(storage_timeout_ms),
            port: optional("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            similarity_threshold: self.similarity_threshold,
            storage_timeout: self.storage_timeout,
        }
    }
}
