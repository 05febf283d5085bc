//! Storage layer: DuckDB for matters, documents and genealogy; a local
//! directory for uploaded files.

#[cfg(feature = "duckdb")]
mod decode;
mod error;
mod files;
pub use error::StoreError;
pub use files::FileVault;

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
mod practice;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
#[cfg(feature = "duckdb")]
pub use practice::CONFLICT_SEARCH_LIMIT;
