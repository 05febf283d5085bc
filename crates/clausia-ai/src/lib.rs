//! AI backend integration: retrieval-augmented chat over a tenant's contracts
//! and smart ingestion of uploaded PDFs.

pub mod http;
pub mod ingest;

pub use http::{BackendClient, BackendError, ChatAnswer, Citation, IngestionJob, IngestionReport};
pub use ingest::{IngestionQueue, IngestionRunner, TaskId, TaskStatus};
