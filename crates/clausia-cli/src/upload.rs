//! Document upload: store the file, record the document, optionally link it
//! to a parent, then hand PDFs to smart ingestion.
//!
//! Storage and linking are all-or-nothing. Ingestion runs afterwards and
//! its failure leaves the uploaded document in place.

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use clausia_ai::{IngestionJob, IngestionQueue, IngestionRunner, TaskStatus};
use clausia_core::upload::{looks_like_pdf, storage_path};
use clausia_core::{DEFAULT_CATEGORY, Document, Relationship, new_id};
use clausia_store::{DuckStore, FileVault};
use serde::Serialize;
use tracing::{error, info, warn};

pub struct UploadRequest<'a> {
    pub matter_id: &'a str,
    pub path: &'a Path,
    pub title: Option<String>,
    pub category: Option<String>,
    pub parent_id: Option<String>,
    pub relationship_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "ingestion", rename_all = "snake_case")]
pub enum IngestionResult {
    /// Not a PDF, or ingestion was not requested.
    Skipped,
    Applied { clauses: usize, obligations: usize },
    Failed { error: String },
}

#[derive(Debug, Serialize)]
pub struct UploadOutcome {
    pub document: Document,
    pub relationship: Option<Relationship>,
    pub ingestion: IngestionResult,
}

/// Upload one file into a matter.
///
/// Fails, leaving nothing behind, if the matter does not exist, the file
/// cannot be stored, or the parent link is rejected.
pub async fn upload<R: IngestionRunner>(
    store: &DuckStore,
    vault: &FileVault,
    queue: Option<&IngestionQueue<R>>,
    tenant_id: &str,
    req: UploadRequest<'_>,
) -> anyhow::Result<UploadOutcome> {
    store
        .get_matter(req.matter_id, tenant_id)
        .with_context(|| format!("matter {}", req.matter_id))?;
    let bytes = std::fs::read(req.path).with_context(|| format!("reading {}", req.path.display()))?;
    let file_name = req
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("upload path has no file name")?;

    let now = Utc::now();
    let relative = storage_path(tenant_id, req.matter_id, now.timestamp_millis(), &file_name);
    vault.put(&relative, &bytes).context("storing file")?;

    let mut document = Document::new(
        new_id(),
        req.matter_id,
        tenant_id,
        req.title.unwrap_or_else(|| file_name.clone()),
        req.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        now,
    );
    document.file_path = Some(relative.clone());
    document.file_type = file_type(req.path, &bytes);
    document.file_size = Some(bytes.len() as i64);

    if let Err(e) = store.insert_document(&document) {
        discard_file(vault, &relative);
        return Err(e).context("recording document");
    }

    let relationship = match &req.parent_id {
        Some(parent_id) => {
            match store.link_documents(tenant_id, parent_id, &document.id, &req.relationship_type) {
                Ok(rel) => Some(rel),
                Err(e) => {
                    warn!(document_id = %document.id, parent_id, error = %e, "parent link rejected; rolling back upload");
                    if let Err(cleanup) = store.delete_document(&document.id, tenant_id) {
                        error!(document_id = %document.id, error = %cleanup, "rollback left document behind");
                    }
                    discard_file(vault, &relative);
                    return Err(e).with_context(|| format!("linking to parent {parent_id}"));
                }
            }
        }
        None => None,
    };

    let ingestion = match queue {
        Some(queue) if looks_like_pdf(&bytes) => {
            let job = IngestionJob {
                file_name,
                bytes,
                tenant_id: tenant_id.to_string(),
                matter_id: req.matter_id.to_string(),
                contract_id: document.id.clone(),
            };
            let task = queue.submit(job);
            queue.wait(task).await;
            ingest_result(store, tenant_id, &document.id, queue.forget(task))
        }
        _ => IngestionResult::Skipped,
    };
    if let IngestionResult::Applied { .. } = ingestion {
        document = store.get_document(&document.id, tenant_id)?;
    }

    info!(document_id = %document.id, matter_id = req.matter_id, ?ingestion, "upload complete");
    Ok(UploadOutcome {
        document,
        relationship,
        ingestion,
    })
}

fn ingest_result(
    store: &DuckStore,
    tenant_id: &str,
    document_id: &str,
    status: Option<TaskStatus>,
) -> IngestionResult {
    match status {
        Some(TaskStatus::Succeeded(extraction)) => {
            match store.apply_ingestion(document_id, tenant_id, &extraction) {
                Ok((clauses, obligations)) => IngestionResult::Applied { clauses, obligations },
                Err(e) => {
                    error!(document_id, error = %e, "storing ingestion results failed");
                    IngestionResult::Failed { error: e.to_string() }
                }
            }
        }
        Some(TaskStatus::Failed(error)) => IngestionResult::Failed { error },
        other => IngestionResult::Failed {
            error: format!("ingestion did not finish: {other:?}"),
        },
    }
}

fn discard_file(vault: &FileVault, relative: &str) {
    if let Err(e) = vault.remove(relative) {
        error!(path = relative, error = %e, "could not remove stored file");
    }
}

fn file_type(path: &Path, bytes: &[u8]) -> Option<String> {
    if looks_like_pdf(bytes) {
        return Some("application/pdf".into());
    }
    path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase())
}
