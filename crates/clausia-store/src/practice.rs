//! Matters, obligations and notes.

use arrow::record_batch::RecordBatch;
use chrono::Utc;
use clausia_core::{Document, MATTER_OPEN, Matter, NewMatter, Note, Obligation, new_id};
use duckdb::params;
use tracing::info;

use crate::duck::{DuckStore, delete_document_rows, sql_timestamp};
use crate::{StoreError, decode};

/// Matches returned by a client conflict search.
pub const CONFLICT_SEARCH_LIMIT: usize = 5;

const MATTER_COLUMNS: &str = "id, tenant_id, title, description, practice_area, client_name, \
    status, epoch_ms(created_at) AS created_at_ms";

const NOTE_COLUMNS: &str = "id, tenant_id, document_id, quote, comment, position, \
    epoch_ms(created_at) AS created_at_ms";

impl DuckStore {
    // ── Matters ──

    /// Open a matter for a tenant with status `Open`.
    pub fn create_matter(&self, tenant_id: &str, input: &NewMatter) -> Result<Matter, StoreError> {
        input.validate()?;
        let matter = Matter {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            practice_area: input.practice_area.trim().to_string(),
            client_name: input.client_name.trim().to_string(),
            status: MATTER_OPEN.to_string(),
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO matters VALUES (?, ?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))",
            params![
                matter.id,
                matter.tenant_id,
                matter.title,
                matter.description,
                matter.practice_area,
                matter.client_name,
                matter.status,
                sql_timestamp(&matter.created_at),
            ],
        )?;
        info!(matter_id = %matter.id, client = %matter.client_name, "created matter");
        Ok(matter)
    }

    pub fn get_matter(&self, id: &str, tenant_id: &str) -> Result<Matter, StoreError> {
        let sql = format!("SELECT {MATTER_COLUMNS} FROM matters WHERE id = ? AND tenant_id = ?");
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([id, tenant_id])?.collect();
        decode::matters(&batches)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("matter", id))
    }

    /// Matters of a tenant, newest first.
    pub fn list_matters(&self, tenant_id: &str) -> Result<Vec<Matter>, StoreError> {
        let sql = format!(
            "SELECT {MATTER_COLUMNS} FROM matters WHERE tenant_id = ? ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([tenant_id])?.collect();
        decode::matters(&batches)
    }

    /// Delete a matter and every document in it.
    ///
    /// Returns the removed documents so their stored files can be cleaned up.
    pub fn delete_matter(&self, id: &str, tenant_id: &str) -> Result<Vec<Document>, StoreError> {
        self.get_matter(id, tenant_id)?;
        let documents = self.list_documents(id, tenant_id)?;
        self.transaction(|conn| {
            for doc in &documents {
                delete_document_rows(conn, &doc.id, tenant_id)?;
            }
            conn.execute("DELETE FROM matters WHERE id = ? AND tenant_id = ?", [id, tenant_id])?;
            Ok(())
        })?;
        info!(matter_id = id, documents = documents.len(), "deleted matter");
        Ok(documents)
    }

    /// Existing matters whose client name contains `query`, case-insensitively.
    ///
    /// Queries shorter than two characters return nothing.
    pub fn search_client_conflicts(&self, tenant_id: &str, query: &str) -> Result<Vec<Matter>, StoreError> {
        let query = query.trim();
        if query.chars().count() < 2 {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {MATTER_COLUMNS} FROM matters \
             WHERE tenant_id = ? AND client_name ILIKE '%' || CAST(? AS VARCHAR) || '%' \
             ORDER BY created_at DESC LIMIT {CONFLICT_SEARCH_LIMIT}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([tenant_id, query])?.collect();
        decode::matters(&batches)
    }

    // ── Obligations ──

    pub fn insert_obligation(&self, obligation: &Obligation) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO obligations VALUES (?, ?, ?, ?, CAST(? AS DATE), ?, CAST(? AS TIMESTAMP))",
            params![
                obligation.id,
                obligation.tenant_id,
                obligation.document_id,
                obligation.description,
                obligation.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                obligation.status,
                sql_timestamp(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// Obligations across every document of a matter, soonest due first,
    /// undated last.
    pub fn list_obligations_by_matter(
        &self,
        matter_id: &str,
        tenant_id: &str,
    ) -> Result<Vec<Obligation>, StoreError> {
        let sql = "SELECT o.id, o.tenant_id, o.document_id, o.description, \
                    CAST(o.due_date AS VARCHAR) AS due_date, o.status, d.title AS document_title \
             FROM obligations o JOIN documents d ON d.id = o.document_id \
             WHERE d.matter_id = ? AND o.tenant_id = ? \
             ORDER BY o.due_date ASC NULLS LAST, o.rowid ASC";
        let mut stmt = self.conn.prepare(sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([matter_id, tenant_id])?.collect();
        decode::obligations(&batches)
    }

    // ── Notes ──

    /// Anchor a comment to a quote inside a document.
    pub fn create_note(
        &self,
        tenant_id: &str,
        document_id: &str,
        quote: &str,
        comment: &str,
        position: serde_json::Value,
    ) -> Result<Note, StoreError> {
        if comment.trim().is_empty() {
            return Err(StoreError::Validation("note comment is empty".into()));
        }
        self.get_document(document_id, tenant_id)?;
        let note = Note {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            document_id: document_id.to_string(),
            quote: quote.to_string(),
            comment: comment.to_string(),
            position,
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO notes VALUES (?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))",
            params![
                note.id,
                note.tenant_id,
                note.document_id,
                note.quote,
                note.comment,
                note.position.to_string(),
                sql_timestamp(&note.created_at),
            ],
        )?;
        Ok(note)
    }

    /// Notes on a document, newest first.
    pub fn list_notes(&self, document_id: &str, tenant_id: &str) -> Result<Vec<Note>, StoreError> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE document_id = ? AND tenant_id = ? \
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([document_id, tenant_id])?.collect();
        decode::notes(&batches)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;
    use crate::duck::tests::{add_doc, store};

    fn new_matter(title: &str, client: &str) -> NewMatter {
        NewMatter {
            title: title.into(),
            description: String::new(),
            practice_area: "Commercial".into(),
            client_name: client.into(),
        }
    }

    fn obligation(id: &str, doc: &str, due: Option<NaiveDate>) -> Obligation {
        Obligation {
            id: id.into(),
            tenant_id: "t1".into(),
            document_id: doc.into(),
            description: format!("duty {id}"),
            due_date: due,
            status: "pending".into(),
            document_title: None,
        }
    }

    #[test]
    fn create_matter_opens_and_trims() {
        let store = store();
        let m = store.create_matter("t1", &new_matter("  Acme renewal ", "Acme Corp")).unwrap();
        assert_eq!(m.status, "Open");
        assert_eq!(m.title, "Acme renewal");
        assert_eq!(store.get_matter(&m.id, "t1").unwrap(), m);
        assert!(store.get_matter(&m.id, "t2").is_err());
    }

    #[test]
    fn create_matter_rejects_missing_fields() {
        let store = store();
        let err = store.create_matter("t1", &new_matter("", "Acme")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(msg) if msg.contains("title")));
        assert_eq!(store.table_count("matters").unwrap(), 0);
    }

    #[test]
    fn conflict_search_is_tenant_scoped_and_limited() {
        let store = store();
        for i in 0..7 {
            store.create_matter("t1", &new_matter(&format!("M{i}"), "Globex Holdings")).unwrap();
        }
        store.create_matter("t1", &new_matter("Other", "Initech")).unwrap();
        store.create_matter("t2", &new_matter("Theirs", "Globex")).unwrap();

        let hits = store.search_client_conflicts("t1", "globex").unwrap();
        assert_eq!(hits.len(), CONFLICT_SEARCH_LIMIT);
        assert!(hits.iter().all(|m| m.tenant_id == "t1"));
        assert!(store.search_client_conflicts("t1", "g").unwrap().is_empty());
        assert!(store.search_client_conflicts("t1", "umbrella").unwrap().is_empty());
    }

    #[test]
    fn delete_matter_removes_its_documents() {
        let store = store();
        let m = store.create_matter("t1", &new_matter("Acme", "Acme")).unwrap();
        let doc = Document::new("d1", &m.id, "t1", "MSA", "MSA", Utc::now());
        store.insert_document(&doc).unwrap();
        add_doc(&store, "elsewhere", "NDA", "NDA", 0);

        let removed = store.delete_matter(&m.id, "t1").unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "d1");
        assert_eq!(store.table_count("matters").unwrap(), 0);
        assert_eq!(store.table_count("documents").unwrap(), 1);
        assert!(matches!(
            store.delete_matter(&m.id, "t1"),
            Err(StoreError::NotFound { kind: "matter", .. })
        ));
    }

    #[test]
    fn obligations_sorted_with_undated_last() {
        let store = store();
        add_doc(&store, "msa", "MSA", "MSA", 0);
        add_doc(&store, "sow", "SOW", "SOW", 1);
        store.insert_obligation(&obligation("o1", "msa", None)).unwrap();
        store
            .insert_obligation(&obligation("o2", "sow", NaiveDate::from_ymd_opt(2025, 9, 1)))
            .unwrap();
        store
            .insert_obligation(&obligation("o3", "msa", NaiveDate::from_ymd_opt(2025, 3, 1)))
            .unwrap();

        let rows = store.list_obligations_by_matter("m1", "t1").unwrap();
        let ids: Vec<&str> = rows.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o3", "o2", "o1"]);
        assert_eq!(rows[1].document_title.as_deref(), Some("SOW"));
        assert_eq!(rows[0].due_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert!(rows[2].due_date.is_none());
        assert!(rows.iter().all(Obligation::is_pending));
    }

    #[test]
    fn notes_keep_position_and_list_newest_first() {
        let store = store();
        add_doc(&store, "msa", "MSA", "MSA", 0);
        let first = store
            .create_note("t1", "msa", "shall indemnify", "too broad", json!({"page": 3, "x": 0.4}))
            .unwrap();
        let second = store.create_note("t1", "msa", "net 90", "push for net 30", json!(null)).unwrap();

        let notes = store.list_notes("msa", "t1").unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, second.id);
        assert_eq!(notes[1].position, json!({"page": 3, "x": 0.4}));
        assert_eq!(notes[1].id, first.id);
        assert!(store.list_notes("msa", "t2").unwrap().is_empty());
    }

    #[test]
    fn note_requires_comment_and_document() {
        let store = store();
        add_doc(&store, "msa", "MSA", "MSA", 0);
        assert!(matches!(
            store.create_note("t1", "msa", "q", "  ", json!({})),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            store.create_note("t1", "ghost", "q", "c", json!({})),
            Err(StoreError::NotFound { .. })
        ));
    }
}
