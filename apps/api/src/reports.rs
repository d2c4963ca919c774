//! Markdown analysis reports, archived to S3 / MinIO after each analysis attachment.

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use crate::config::S3Config;
use crate::models::Candidate;

#[derive(Clone)]
pub struct ReportArchive {
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl ReportArchive {
    /// Constructs an S3 client configured for MinIO (local) or AWS (production).
    pub async fn connect(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "aider-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        Self {
            s3: aws_sdk_s3::Client::new(&s3_config),
            bucket: config.bucket.clone(),
        }
    }

    /// Uploads the candidate's report and returns its object key.
    pub async fn upload(
        &self,
        role_name: &str,
        title: &str,
        candidate: &Candidate,
    ) -> Result<String> {
        let key = report_key(role_name, title, &candidate.name);
        let body = render_analysis_report(role_name, title, candidate);

        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body.into_bytes()))
            .content_type("text/markdown")
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Uploaded analysis report to s3://{}/{}", self.bucket, key);
        Ok(key)
    }
}

fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn report_key(role_name: &str, title: &str, candidate_name: &str) -> String {
    format!(
        "reports/{}/{}/{}.md",
        slug(role_name),
        slug(title),
        slug(candidate_name)
    )
}

/// Renders the candidate and its analysis sections as one markdown document.
pub fn render_analysis_report(role_name: &str, title: &str, candidate: &Candidate) -> String {
    let mut md = format!("# Candidate Report — {}\n\n", candidate.name);
    md.push_str(&format!("- **Role:** {role_name}\n"));
    md.push_str(&format!("- **Position:** {title}\n"));
    md.push_str(&format!(
        "- **Uploaded:** {}\n",
        candidate.uploaded_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if !candidate.github_links.is_empty() {
        let links: Vec<&str> = candidate.github_links.iter().map(String::as_str).collect();
        md.push_str(&format!("- **GitHub:** {}\n", links.join(", ")));
    }
    md.push('\n');

    let Some(analysis) = &candidate.analysis else {
        md.push_str("_No analysis available._\n");
        return md;
    };

    for section in &analysis.sections {
        match &section.source {
            Some(source) => md.push_str(&format!("## {}: {}\n\n", section.kind.heading(), source)),
            None => md.push_str(&format!("## {}\n\n", section.kind.heading())),
        }
        md.push_str(section.content.trim());
        md.push_str("\n\n");
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Analysis, AnalysisSection, SectionKind};
    use chrono::Utc;

    fn candidate(analysis: Option<Analysis>) -> Candidate {
        Candidate {
            name: "Jane Doe".to_string(),
            resume_text: "resume".to_string(),
            embedding: vec![],
            github_links: ["https://github.com/jane/raft".to_string()].into(),
            uploaded_at: Utc::now(),
            analysis,
        }
    }

    #[test]
    fn test_report_key_is_slugged() {
        assert_eq!(
            report_key("Software Engineer", "Sr. Backend / Infra", "Jane O'Neil"),
            "reports/software-engineer/sr-backend-infra/jane-o-neil.md"
        );
        assert_eq!(report_key("???", "t", "n"), "reports/unnamed/t/n.md");
    }

    #[test]
    fn test_report_renders_sections_in_order() {
        let analysis = Analysis {
            sections: vec![
                AnalysisSection::new(SectionKind::CandidateFit, "Strong fit.\n"),
                AnalysisSection::new(SectionKind::GithubAnalysisError, "README missing")
                    .with_source("https://github.com/jane/raft"),
            ],
        };
        let md = render_analysis_report("Engineer", "Backend Engineer", &candidate(Some(analysis)));

        let fit = md.find("## Candidate Fit").unwrap();
        let error = md
            .find("## GitHub Analysis Error: https://github.com/jane/raft")
            .unwrap();
        assert!(fit < error);
        assert!(md.contains("Strong fit.\n\n"));
        assert!(md.contains("- **GitHub:** https://github.com/jane/raft"));
    }

    #[test]
    fn test_report_without_analysis() {
        let md = render_analysis_report("Engineer", "Backend Engineer", &candidate(None));
        assert!(md.contains("_No analysis available._"));
    }
}
