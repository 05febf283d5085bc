//! DuckDB storage for documents, genealogy relationships and clauses.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use clausia_core::{
    Clause, DEFAULT_RELATIONSHIP_TYPE, Document, Extraction, MatterClause, MatterSource,
    Relationship, new_id,
};
use duckdb::{Connection, params};
use tracing::{debug, info, warn};

use crate::{StoreError, decode};

/// Every table the store owns, in seed order.
pub(crate) const TABLES: &[&str] = &[
    "matters",
    "documents",
    "document_relationships",
    "clauses",
    "obligations",
    "notes",
];

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS matters (
    id VARCHAR NOT NULL,
    tenant_id VARCHAR NOT NULL,
    title VARCHAR NOT NULL,
    description VARCHAR,
    practice_area VARCHAR NOT NULL,
    client_name VARCHAR NOT NULL,
    status VARCHAR NOT NULL,
    created_at TIMESTAMP NOT NULL
);
CREATE TABLE IF NOT EXISTS documents (
    id VARCHAR NOT NULL,
    matter_id VARCHAR NOT NULL,
    tenant_id VARCHAR NOT NULL,
    title VARCHAR NOT NULL,
    category VARCHAR NOT NULL,
    created_at TIMESTAMP NOT NULL,
    contract_value VARCHAR,
    risk_level VARCHAR,
    file_path VARCHAR,
    file_type VARCHAR,
    file_size BIGINT
);
CREATE TABLE IF NOT EXISTS document_relationships (
    id VARCHAR NOT NULL,
    tenant_id VARCHAR NOT NULL,
    parent_id VARCHAR NOT NULL,
    child_id VARCHAR NOT NULL,
    relationship_type VARCHAR NOT NULL,
    created_at TIMESTAMP NOT NULL
);
CREATE TABLE IF NOT EXISTS clauses (
    id VARCHAR NOT NULL,
    document_id VARCHAR NOT NULL,
    tenant_id VARCHAR NOT NULL,
    clause_type VARCHAR NOT NULL,
    original_text VARCHAR NOT NULL,
    summary VARCHAR,
    extracted_at TIMESTAMP NOT NULL
);
CREATE TABLE IF NOT EXISTS obligations (
    id VARCHAR NOT NULL,
    tenant_id VARCHAR NOT NULL,
    document_id VARCHAR NOT NULL,
    description VARCHAR NOT NULL,
    due_date DATE,
    status VARCHAR NOT NULL,
    created_at TIMESTAMP NOT NULL
);
CREATE TABLE IF NOT EXISTS notes (
    id VARCHAR NOT NULL,
    tenant_id VARCHAR NOT NULL,
    document_id VARCHAR NOT NULL,
    quote VARCHAR NOT NULL,
    comment VARCHAR NOT NULL,
    position VARCHAR NOT NULL,
    created_at TIMESTAMP NOT NULL
);
";

const DOCUMENT_COLUMNS: &str = "id, matter_id, tenant_id, title, category, \
    epoch_ms(created_at) AS created_at_ms, contract_value, risk_level, \
    file_path, file_type, file_size";

const RELATIONSHIP_COLUMNS: &str = "id, tenant_id, parent_id, child_id, relationship_type, \
    epoch_ms(created_at) AS created_at_ms";

const CLAUSE_COLUMNS: &str = "c.id, c.document_id, c.tenant_id, c.clause_type, c.original_text, \
    c.summary, epoch_ms(c.extracted_at) AS extracted_at_ms";

/// Format a timestamp for `CAST(? AS TIMESTAMP)`; timestamps are stored as UTC.
pub(crate) fn sql_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// DuckDB store for a Clausia workspace.
///
/// Documents, relationships and clauses live here alongside matters,
/// obligations and notes (see `practice.rs`). Every read is issued through
/// `query_arrow` and decoded into typed records at the boundary.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// Call [`ensure_schema`](Self::ensure_schema) once after opening.
pub struct DuckStore {
    pub(crate) conn: Connection,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// A second handle on the same database, usable from another thread.
    pub fn try_clone(&self) -> Result<Self, StoreError> {
        Ok(Self {
            conn: self.conn.try_clone()?,
        })
    }

    /// Create any missing tables. Idempotent.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        debug!("schema ensured");
        Ok(())
    }

    /// Check whether every store table exists.
    pub fn has_tables(&self) -> bool {
        TABLES.iter().all(|t| self.table_count(t).is_ok())
    }

    // ── Counts ──

    /// Number of rows in one of the store's tables.
    pub fn table_count(&self, table: &str) -> Result<usize, StoreError> {
        let table = known_table(table)?;
        let sql = format!("SELECT count(*)::BIGINT AS cnt FROM {table}");
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([])?.collect();
        let batch = batches.first().ok_or(StoreError::NoResults)?;
        let col = batch
            .column(0)
            .as_any()
            .downcast_ref::<arrow::array::Int64Array>()
            .ok_or_else(|| StoreError::Other("count column not i64".into()))?;
        Ok(col.value(0) as usize)
    }

    /// Row counts for every table, in seed order.
    pub fn table_counts(&self) -> Result<Vec<(&'static str, usize)>, StoreError> {
        TABLES
            .iter()
            .map(|t| Ok((*t, self.table_count(t)?)))
            .collect()
    }

    // ── Parquet seed/export ──

    /// Replace `table` with the contents of a Parquet file.
    pub fn load_table_from_parquet(&self, table: &str, path: &Path) -> Result<usize, StoreError> {
        let table = known_table(table)?;
        if !path.exists() {
            return Err(StoreError::ParquetNotFound(path.to_path_buf()));
        }
        let sql = format!(
            "CREATE OR REPLACE TABLE {table} AS SELECT * FROM read_parquet('{}')",
            sql_path(path)
        );
        self.conn.execute_batch(&sql)?;
        let count = self.table_count(table)?;
        info!(table, count, "loaded table from parquet");
        Ok(count)
    }

    /// Load every table from `{table}.parquet` files in `data_dir`.
    pub fn load_all(&self, data_dir: &Path) -> Result<(), StoreError> {
        for table in TABLES {
            self.load_table_from_parquet(table, &data_dir.join(format!("{table}.parquet")))?;
        }
        Ok(())
    }

    /// Write every table to `{table}.parquet` in `data_dir`.
    pub fn export_all(&self, data_dir: &Path) -> Result<(), StoreError> {
        std::fs::create_dir_all(data_dir)?;
        for table in TABLES {
            let path = data_dir.join(format!("{table}.parquet"));
            let sql = format!("COPY {table} TO '{}' (FORMAT PARQUET)", sql_path(&path));
            self.conn.execute_batch(&sql)?;
            info!(table, path = %path.display(), "exported table");
        }
        Ok(())
    }

    // ── Documents ──

    pub fn insert_document(&self, doc: &Document) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO documents VALUES (?, ?, ?, ?, ?, CAST(? AS TIMESTAMP), ?, ?, ?, ?, ?)",
            params![
                doc.id,
                doc.matter_id,
                doc.tenant_id,
                doc.title,
                doc.category,
                sql_timestamp(&doc.created_at),
                doc.contract_value,
                doc.risk_level.map(|r| r.as_str()),
                doc.file_path,
                doc.file_type,
                doc.file_size,
            ],
        )?;
        info!(document_id = %doc.id, matter_id = %doc.matter_id, "inserted document");
        Ok(())
    }

    /// Fetch one document of a tenant.
    pub fn get_document(&self, id: &str, tenant_id: &str) -> Result<Document, StoreError> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ? AND tenant_id = ?");
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([id, tenant_id])?.collect();
        decode::documents(&batches)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("document", id))
    }

    /// Documents of a matter, oldest first; equal timestamps keep insertion order.
    pub fn list_documents(&self, matter_id: &str, tenant_id: &str) -> Result<Vec<Document>, StoreError> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE matter_id = ? AND tenant_id = ? ORDER BY created_at ASC, rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([matter_id, tenant_id])?.collect();
        decode::documents(&batches)
    }

    /// Delete a document with its clauses, obligations, notes and relationships.
    ///
    /// Returns the removed record so the caller can delete its stored file.
    pub fn delete_document(&self, id: &str, tenant_id: &str) -> Result<Document, StoreError> {
        let doc = self.get_document(id, tenant_id)?;
        self.transaction(|conn| delete_document_rows(conn, id, tenant_id))?;
        info!(document_id = id, "deleted document");
        Ok(doc)
    }

    /// Record what smart ingestion extracted for a document.
    ///
    /// Updates value and risk, then appends clauses and obligations. Clauses
    /// without text and obligations without a description are skipped.
    /// Returns `(clauses, obligations)` inserted.
    pub fn apply_ingestion(
        &self,
        document_id: &str,
        tenant_id: &str,
        extraction: &Extraction,
    ) -> Result<(usize, usize), StoreError> {
        self.get_document(document_id, tenant_id)?;
        let now = sql_timestamp(&Utc::now());
        let counts = self.transaction(|conn| {
            conn.execute(
                "UPDATE documents SET contract_value = ?, risk_level = ? WHERE id = ? AND tenant_id = ?",
                params![
                    extraction.contract_value,
                    extraction.risk_level.map(|r| r.as_str()),
                    document_id,
                    tenant_id,
                ],
            )?;

            let mut clauses = 0;
            for c in extraction.clauses.iter().filter(|c| !c.original_text.trim().is_empty()) {
                let clause_type = if c.clause_type.trim().is_empty() {
                    "Other"
                } else {
                    c.clause_type.as_str()
                };
                conn.execute(
                    "INSERT INTO clauses VALUES (?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))",
                    params![new_id(), document_id, tenant_id, clause_type, c.original_text, c.summary, now],
                )?;
                clauses += 1;
            }

            let mut obligations = 0;
            for o in extraction.obligations.iter().filter(|o| !o.description.trim().is_empty()) {
                conn.execute(
                    "INSERT INTO obligations VALUES (?, ?, ?, ?, CAST(? AS DATE), 'pending', CAST(? AS TIMESTAMP))",
                    params![
                        new_id(),
                        tenant_id,
                        document_id,
                        o.description,
                        o.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                        now,
                    ],
                )?;
                obligations += 1;
            }
            Ok((clauses, obligations))
        })?;
        info!(document_id, clauses = counts.0, obligations = counts.1, "applied ingestion");
        Ok(counts)
    }

    // ── Relationships ──

    /// Record `parent → child` within a tenant.
    ///
    /// Both documents must belong to the tenant, a document cannot be its own
    /// parent, a document may have at most one parent, and no link may close
    /// a cycle. A blank relationship type is stored as `related_to`.
    pub fn link_documents(
        &self,
        tenant_id: &str,
        parent_id: &str,
        child_id: &str,
        relationship_type: &str,
    ) -> Result<Relationship, StoreError> {
        if parent_id == child_id {
            return Err(StoreError::Validation(format!(
                "document {child_id} cannot be its own parent"
            )));
        }
        self.get_document(parent_id, tenant_id)?;
        self.get_document(child_id, tenant_id)?;

        let rels = self.list_relationships(tenant_id)?;
        if let Some(existing) = rels.iter().find(|r| r.child_id == child_id) {
            return Err(StoreError::Conflict(format!(
                "document {child_id} already has parent {}",
                existing.parent_id
            )));
        }

        // The new child must not already be an ancestor of the new parent.
        let parents: HashMap<&str, &str> = rels
            .iter()
            .map(|r| (r.child_id.as_str(), r.parent_id.as_str()))
            .collect();
        let mut seen = HashSet::new();
        let mut cursor = parent_id;
        while let Some(&up) = parents.get(cursor) {
            if up == child_id {
                return Err(StoreError::Conflict(format!(
                    "linking {parent_id} -> {child_id} would make {child_id} its own ancestor"
                )));
            }
            if !seen.insert(up) {
                break;
            }
            cursor = up;
        }

        let rel = Relationship {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            parent_id: parent_id.to_string(),
            child_id: child_id.to_string(),
            relationship_type: if relationship_type.trim().is_empty() {
                DEFAULT_RELATIONSHIP_TYPE.to_string()
            } else {
                relationship_type.to_string()
            },
            created_at: Utc::now(),
        };
        self.insert_relationship(&rel)?;
        Ok(rel)
    }

    /// Insert a relationship as-is, without the checks of [`link_documents`](Self::link_documents).
    pub fn insert_relationship(&self, rel: &Relationship) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO document_relationships VALUES (?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))",
            params![
                rel.id,
                rel.tenant_id,
                rel.parent_id,
                rel.child_id,
                rel.relationship_type,
                sql_timestamp(&rel.created_at),
            ],
        )?;
        info!(parent_id = %rel.parent_id, child_id = %rel.child_id, kind = %rel.relationship_type, "linked documents");
        Ok(())
    }

    /// Every relationship of a tenant, in creation order.
    pub fn list_relationships(&self, tenant_id: &str) -> Result<Vec<Relationship>, StoreError> {
        let sql = format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM document_relationships \
             WHERE tenant_id = ? ORDER BY created_at ASC, rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([tenant_id])?.collect();
        decode::relationships(&batches)
    }

    // ── Clauses ──

    pub fn insert_clause(&self, clause: &Clause) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO clauses VALUES (?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))",
            params![
                clause.id,
                clause.document_id,
                clause.tenant_id,
                clause.clause_type,
                clause.original_text,
                clause.summary,
                sql_timestamp(&clause.extracted_at),
            ],
        )?;
        Ok(())
    }

    /// Clauses of one document in extraction order.
    pub fn list_clauses(&self, document_id: &str) -> Result<Vec<Clause>, StoreError> {
        let sql = format!(
            "SELECT {CLAUSE_COLUMNS} FROM clauses c \
             WHERE c.document_id = ? ORDER BY c.extracted_at ASC, c.rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([document_id])?.collect();
        decode::clauses(&batches)
    }

    /// Clauses of a matter whose type contains `clause_type` (case-insensitive),
    /// ordered by owning-document creation time.
    pub fn list_clauses_by_type_for_matter(
        &self,
        matter_id: &str,
        tenant_id: &str,
        clause_type: &str,
    ) -> Result<Vec<MatterClause>, StoreError> {
        let sql = format!(
            "SELECT {CLAUSE_COLUMNS}, d.title AS document_title, \
                    epoch_ms(d.created_at) AS document_created_at_ms \
             FROM clauses c JOIN documents d ON d.id = c.document_id \
             WHERE d.matter_id = ? AND c.tenant_id = ? \
               AND c.clause_type ILIKE '%' || CAST(? AS VARCHAR) || '%' \
             ORDER BY d.created_at ASC, c.extracted_at ASC, c.rowid ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt
            .query_arrow([matter_id, tenant_id, clause_type])?
            .collect();
        decode::matter_clauses(&batches)
    }

    // ── Escape hatch ──

    /// Execute arbitrary SQL and return Arrow RecordBatches.
    pub fn query_arrow(&self, sql: &str) -> Result<Vec<RecordBatch>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([])?.collect();
        Ok(batches)
    }

    /// Access the underlying DuckDB connection for statements the typed API
    /// does not cover.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a transaction, rolling back if it fails.
    pub(crate) fn transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

/// Remove a document and everything hanging off it. Runs inside a transaction.
pub(crate) fn delete_document_rows(conn: &Connection, id: &str, tenant_id: &str) -> Result<(), StoreError> {
    for table in ["clauses", "obligations", "notes"] {
        conn.execute(
            &format!("DELETE FROM {table} WHERE document_id = ? AND tenant_id = ?"),
            [id, tenant_id],
        )?;
    }
    conn.execute(
        "DELETE FROM document_relationships WHERE tenant_id = ? AND (parent_id = ? OR child_id = ?)",
        [tenant_id, id, id],
    )?;
    conn.execute("DELETE FROM documents WHERE id = ? AND tenant_id = ?", [id, tenant_id])?;
    Ok(())
}

fn known_table(table: &str) -> Result<&'static str, StoreError> {
    TABLES
        .iter()
        .copied()
        .find(|t| *t == table)
        .ok_or_else(|| StoreError::Validation(format!("unknown table: {table}")))
}

fn sql_path(path: &Path) -> String {
    path.display().to_string().replace('\'', "''")
}

impl MatterSource for DuckStore {
    type Error = StoreError;

    fn list_documents(&self, matter_id: &str, tenant_id: &str) -> Result<Vec<Document>, StoreError> {
        DuckStore::list_documents(self, matter_id, tenant_id)
    }

    fn list_relationships(&self, tenant_id: &str) -> Result<Vec<Relationship>, StoreError> {
        DuckStore::list_relationships(self, tenant_id)
    }

    fn list_clauses(&self, document_id: &str) -> Result<Vec<Clause>, StoreError> {
        DuckStore::list_clauses(self, document_id)
    }

    fn list_clauses_by_type_for_matter(
        &self,
        matter_id: &str,
        tenant_id: &str,
        clause_type: &str,
    ) -> Result<Vec<MatterClause>, StoreError> {
        DuckStore::list_clauses_by_type_for_matter(self, matter_id, tenant_id, clause_type)
    }
}
