//! HTTP client for the Clausia AI backend.

use chrono::NaiveDate;
use clausia_core::{ExtractedClause, ExtractedObligation, Extraction, RiskLevel};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {detail}")]
    Server { status: u16, detail: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A document the backend cited while answering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub contract_id: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// One PDF to hand to smart ingestion.
#[derive(Debug, Clone)]
pub struct IngestionJob {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub tenant_id: String,
    pub matter_id: String,
    /// Id of the already-stored document the results belong to.
    pub contract_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReportClause {
    pub clause_type: Option<String>,
    pub original_text: Option<String>,
    pub ai_summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReportObligation {
    pub description: Option<String>,
    pub due_date: Option<String>,
}

/// What the backend's analysis workflow produced for one document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngestionReport {
    #[serde(default)]
    pub contract_value: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub classified_clauses: Vec<ReportClause>,
    #[serde(default)]
    pub extracted_obligations: Vec<ReportObligation>,
}

impl IngestionReport {
    /// Normalise into the records the store persists.
    ///
    /// A missing score counts as zero (low risk). Due dates that are not
    /// `YYYY-MM-DD` are dropped; the obligation is kept undated.
    pub fn into_extraction(self) -> Extraction {
        Extraction {
            contract_value: self.contract_value.filter(|v| !v.trim().is_empty()),
            risk_level: Some(RiskLevel::from_score(self.risk_score.unwrap_or(0.0))),
            clauses: self
                .classified_clauses
                .into_iter()
                .map(|c| ExtractedClause {
                    clause_type: c.clause_type.unwrap_or_default(),
                    original_text: c.original_text.unwrap_or_default(),
                    summary: c.ai_summary,
                })
                .collect(),
            obligations: self
                .extracted_obligations
                .into_iter()
                .map(|o| ExtractedObligation {
                    description: o.description.unwrap_or_default(),
                    due_date: o.due_date.as_deref().and_then(parse_due_date),
                })
                .collect(),
        }
    }
}

fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            debug!(raw, error = %e, "ignoring unparseable due date");
            None
        }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    smart_metadata: IngestionReport,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Client for the backend's chat and upload endpoints.
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// `base_url` should be like `http://localhost:8000` (a trailing slash is trimmed).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask a question over the tenant's indexed contracts.
    pub async fn chat(&self, question: &str, tenant_id: &str) -> Result<ChatAnswer, BackendError> {
        let url = format!("{}/api/chat", self.base_url);
        let form = reqwest::multipart::Form::new()
            .text("question", question.to_string())
            .text("tenant_id", tenant_id.to_string());

        info!(url = %url, tenant_id, "asking backend");
        let resp = self.client.post(&url).multipart(form).send().await?;
        let answer: ChatAnswer = serde_json::from_str(&success_body(resp).await?)?;
        info!(citations = answer.citations.len(), "chat answered");
        Ok(answer)
    }

    /// Upload a PDF for smart ingestion and return what the backend extracted.
    pub async fn ingest(&self, job: &IngestionJob) -> Result<IngestionReport, BackendError> {
        let url = format!("{}/api/upload", self.base_url);
        let file = reqwest::multipart::Part::bytes(job.bytes.clone())
            .file_name(job.file_name.clone())
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("tenant_id", job.tenant_id.clone())
            .text("matter_id", job.matter_id.clone())
            .text("contract_id", job.contract_id.clone());

        info!(url = %url, contract_id = %job.contract_id, bytes = job.bytes.len(), "uploading for ingestion");
        let resp = self.client.post(&url).multipart(form).send().await?;
        let parsed: UploadResponse = serde_json::from_str(&success_body(resp).await?)?;
        let report = parsed.smart_metadata;
        info!(
            contract_id = %job.contract_id,
            clauses = report.classified_clauses.len(),
            obligations = report.extracted_obligations.len(),
            "ingestion complete"
        );
        Ok(report)
    }
}

/// Body of a 2xx response, or a `Server` error carrying the backend's `detail`.
async fn success_body(resp: reqwest::Response) -> Result<String, BackendError> {
    let status = resp.status();
    let body = resp.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    Err(BackendError::Server {
        status: status.as_u16(),
        detail: error_detail(&body),
    })
}

fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| body.to_string())
}
