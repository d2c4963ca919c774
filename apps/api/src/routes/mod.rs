pub mod health;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};

use crate::candidates::handlers as candidates;
use crate::jobs::handlers as jobs;
use crate::state::AppState;
use crate::store::Outcome;

/// 201 for a fresh record, 200 when an existing one was returned or replaced.
pub(crate) fn write_status_code<T>(outcome: &Outcome<T>) -> StatusCode {
    if outcome.was_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Roles and job descriptions
        .route(
            "/api/v1/roles",
            get(jobs::handle_list_roles).post(jobs::handle_create_role),
        )
        .route("/api/v1/roles/:role", get(jobs::handle_get_role))
        .route(
            "/api/v1/roles/:role/descriptions",
            post(jobs::handle_create_description),
        )
        .route("/api/v1/roles/:role/titles", get(jobs::handle_list_role_titles))
        .route("/api/v1/titles", get(jobs::handle_list_all_titles))
        // Candidates and analyses
        .route(
            "/api/v1/roles/:role/candidates",
            get(candidates::handle_list_role_candidates)
                .post(candidates::handle_upload_candidate),
        )
        .route(
            "/api/v1/roles/:role/candidates/:name/analysis",
            post(candidates::handle_run_analysis).put(candidates::handle_attach_analysis),
        )
        .route("/api/v1/candidates", get(candidates::handle_list_candidates))
        .route("/api/v1/candidates/:name", get(candidates::handle_get_candidate))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::analysis::orchestrator::UNKNOWN_CANDIDATE;
    use crate::analysis::{AnalysisOrchestrator, AnalysisRequest, GitHubLinkExtractor};
    use crate::embedding::{Embedder, EmbeddingError};
    use crate::llm_client::LlmError;
    use crate::models::{Analysis, AnalysisSection, SectionKind};
    use crate::store::DocumentStore;

    /// Every text embeds to the same direction, so descriptions always deduplicate.
    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }
    }

    struct StubAnalyzer {
        fail_analysis: bool,
    }

    #[async_trait]
    impl AnalysisOrchestrator for StubAnalyzer {
        async fn candidate_name(&self, resume_text: &str) -> Result<String, LlmError> {
            if resume_text.contains("Jane Doe") {
                Ok("Jane Doe".to_string())
            } else {
                Ok(UNKNOWN_CANDIDATE.to_string())
            }
        }

        async fn job_title(&self, _jd_text: &str) -> Result<String, LlmError> {
            Ok("Backend Engineer".to_string())
        }

        async fn analyze(&self, request: AnalysisRequest<'_>) -> Result<Analysis, LlmError> {
            if self.fail_analysis {
                return Err(LlmError::EmptyContent);
            }
            let mut sections = vec![AnalysisSection::new(SectionKind::CandidateFit, "Good fit")];
            for link in request.github_links {
                sections.push(
                    AnalysisSection::new(SectionKind::GithubProject, "Solid").with_source(link),
                );
            }
            Ok(Analysis { sections })
        }
    }

    fn app(fail_analysis: bool) -> Router {
        build_router(AppState {
            store: DocumentStore::in_memory(),
            embedder: Arc::new(FixedEmbedder),
            analyzer: Arc::new(StubAnalyzer { fail_analysis }),
            links: GitHubLinkExtractor::new(),
            reports: None,
        })
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Role "Engineer" with one "Backend Engineer" description.
    async fn seeded(fail_analysis: bool) -> Router {
        let app = app(fail_analysis);
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/roles",
            Some(json!({"role_name": "Engineer", "department": "Platform"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/roles/Engineer/descriptions",
            Some(json!({"location": "Remote", "content": "Build distributed systems in Rust."})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        app
    }

    #[tokio::test]
    async fn test_health_reports_storage() {
        let (status, body) = send(&app(false), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["storage"], "ok");
    }

    #[tokio::test]
    async fn test_role_create_is_idempotent_over_http() {
        let app = seeded(false).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/roles",
            Some(json!({"role_name": "engineer"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "duplicate");
        assert_eq!(body["record"]["role_name"], "Engineer");

        let (_, roles) = send(&app, Method::GET, "/api/v1/roles", None).await;
        assert_eq!(roles.as_array().unwrap().len(), 1);
        assert_eq!(roles[0]["description_count"], 1);
    }

    #[tokio::test]
    async fn test_missing_role_is_404() {
        let app = app(false);
        let (status, body) = send(&app, Method::GET, "/api/v1/roles/Ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = send(&app, Method::GET, "/api/v1/roles/Ghost/titles", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_similar_description_is_deduplicated() {
        let app = seeded(false).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/roles/Engineer/descriptions",
            Some(json!({"title": "Platform Engineer", "content": "Same posting, reworded."})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "duplicate");
        assert_eq!(body["description"]["title"], "Backend Engineer");

        let (_, titles) = send(&app, Method::GET, "/api/v1/titles", None).await;
        assert_eq!(titles, json!(["Backend Engineer"]));
    }

    #[tokio::test]
    async fn test_empty_description_content_is_400() {
        let app = seeded(false).await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/roles/Engineer/descriptions",
            Some(json!({"title": "X", "content": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_extracts_name_links_and_analysis() {
        let app = seeded(false).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/roles/engineer/candidates",
            Some(json!({
                "job_title": "backend engineer",
                "resume_content": "Jane Doe. See https://github.com/jane/raft for my Raft work."
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "created");
        assert_eq!(body["title"], "Backend Engineer");
        assert_eq!(body["candidate"]["name"], "Jane Doe");
        assert_eq!(body["candidate"]["github_links"], json!(["https://github.com/jane/raft"]));
        let sections = body["candidate"]["analysis"]["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1]["source"], "https://github.com/jane/raft");
        assert!(body.get("analysis_error").is_none());

        let (status, record) = send(&app, Method::GET, "/api/v1/candidates/jane%20doe", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["role_name"], "Engineer");
        assert_eq!(record["title"], "Backend Engineer");
        assert_eq!(record["name"], "Jane Doe");
    }

    #[tokio::test]
    async fn test_reupload_updates_in_place() {
        let app = seeded(false).await;
        let upload = json!({
            "job_title": "Backend Engineer",
            "candidate_name": "Jane Doe",
            "resume_content": "v1",
            "analyze": false
        });
        send(&app, Method::POST, "/api/v1/roles/Engineer/candidates", Some(upload)).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/roles/Engineer/candidates",
            Some(json!({
                "job_title": "Backend Engineer",
                "candidate_name": "JANE DOE",
                "resume_content": "v2",
                "analyze": false
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "updated");
        assert_eq!(body["candidate"]["resume_text"], "v2");
        let (_, listed) = send(&app, Method::GET, "/api/v1/candidates", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_analysis_failure_keeps_candidate() {
        let app = seeded(true).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/roles/Engineer/candidates",
            Some(json!({"job_title": "Backend Engineer", "resume_content": "Jane Doe, Rust"})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(body["analysis_error"].as_str().unwrap().contains("LLM"));
        assert!(body["candidate"].get("analysis").is_none());

        let (_, listed) = send(&app, Method::GET, "/api/v1/roles/Engineer/candidates", None).await;
        assert_eq!(listed[0]["name"], "Jane Doe");
        assert_eq!(listed[0]["analyzed"], false);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/roles/Engineer/candidates/Jane%20Doe/analysis",
            Some(json!({"job_title": "Backend Engineer"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
    }

    #[tokio::test]
    async fn test_upload_to_unknown_title_is_404() {
        let app = seeded(false).await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/roles/Engineer/candidates",
            Some(json!({"job_title": "Senior SWE", "resume_content": "Jane Doe"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"]["message"].as_str().unwrap().contains("Senior SWE"));
    }

    #[tokio::test]
    async fn test_put_attaches_supplied_analysis() {
        let app = seeded(false).await;
        send(
            &app,
            Method::POST,
            "/api/v1/roles/Engineer/candidates",
            Some(json!({
                "job_title": "Backend Engineer",
                "candidate_name": "Ken",
                "resume_content": "Ken, Go and Rust",
                "analyze": false
            })),
        )
        .await;

        let payload = json!({"sections": [{"kind": "candidate_fit", "content": "Manual review"}]});
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/v1/roles/Engineer/candidates/ken/analysis",
            Some(json!({"job_title": "backend engineer", "analysis": payload})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Backend Engineer");
        assert_eq!(body["candidate"]["analysis"], payload);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/v1/roles/Engineer/candidates/Nobody/analysis",
            Some(json!({"job_title": "Backend Engineer", "analysis": payload})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_without_recognizable_name_is_422() {
        let app = seeded(false).await;
        for resume in ["Rust, Go, ten years of distributed systems", "Kafka and Postgres"] {
            let (status, body) = send(
                &app,
                Method::POST,
                "/api/v1/roles/Engineer/candidates",
                Some(json!({"job_title": "Backend Engineer", "resume_content": resume})),
            )
            .await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert!(body["error"]["message"]
                .as_str()
                .unwrap()
                .contains("candidate_name"));
        }

        let (_, listed) = send(&app, Method::GET, "/api/v1/candidates", None).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn test_unknown_candidate_is_404() {
        let app = seeded(false).await;
        let (status, body) = send(&app, Method::GET, "/api/v1/candidates/Nobody", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Candidate not found: Nobody");
    }
}
