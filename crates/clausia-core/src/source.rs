//! Read contract the genealogy engine consumes from storage.

use crate::{Clause, Document, MatterClause, Relationship};

/// Storage reads needed by the prevailing-terms resolver and the clause timeline.
///
/// Implementations are expected to scope by tenant themselves; the engine
/// never checks tenant ids on returned records.
pub trait MatterSource {
    type Error: std::error::Error;

    /// Documents of a matter ordered by creation time, oldest first.
    fn list_documents(&self, matter_id: &str, tenant_id: &str) -> Result<Vec<Document>, Self::Error>;

    /// Every relationship of the tenant (not matter-scoped at the source).
    fn list_relationships(&self, tenant_id: &str) -> Result<Vec<Relationship>, Self::Error>;

    /// Clauses of a single document.
    fn list_clauses(&self, document_id: &str) -> Result<Vec<Clause>, Self::Error>;

    /// Clauses of a matter whose type contains `clause_type` (case-insensitive),
    /// ordered by owning-document creation time, oldest first.
    fn list_clauses_by_type_for_matter(
        &self,
        matter_id: &str,
        tenant_id: &str,
        clause_type: &str,
    ) -> Result<Vec<MatterClause>, Self::Error>;
}

#[cfg(test)]
pub(crate) mod memory {
    use std::cell::Cell;
    use std::collections::HashMap;

    use thiserror::Error;

    use super::MatterSource;
    use crate::{Clause, Document, MatterClause, Relationship};

    #[derive(Debug, Error)]
    #[error("storage unavailable: {0}")]
    pub struct Unavailable(pub String);

    /// In-memory source for engine tests.
    #[derive(Default)]
    pub struct MemorySource {
        pub documents: Vec<Document>,
        pub relationships: Vec<Relationship>,
        pub clauses: HashMap<String, Vec<Clause>>,
        pub fail_clauses: bool,
        pub clause_reads: Cell<usize>,
    }

    impl MatterSource for MemorySource {
        type Error = Unavailable;

        fn list_documents(&self, matter_id: &str, tenant_id: &str) -> Result<Vec<Document>, Unavailable> {
            let mut docs: Vec<Document> = self
                .documents
                .iter()
                .filter(|d| d.matter_id == matter_id && d.tenant_id == tenant_id)
                .cloned()
                .collect();
            docs.sort_by_key(|d| d.created_at);
            Ok(docs)
        }

        fn list_relationships(&self, tenant_id: &str) -> Result<Vec<Relationship>, Unavailable> {
            Ok(self
                .relationships
                .iter()
                .filter(|r| r.tenant_id == tenant_id)
                .cloned()
                .collect())
        }

        fn list_clauses(&self, document_id: &str) -> Result<Vec<Clause>, Unavailable> {
            self.clause_reads.set(self.clause_reads.get() + 1);
            if self.fail_clauses {
                return Err(Unavailable("connection reset".into()));
            }
            Ok(self.clauses.get(document_id).cloned().unwrap_or_default())
        }

        fn list_clauses_by_type_for_matter(
            &self,
            matter_id: &str,
            tenant_id: &str,
            clause_type: &str,
        ) -> Result<Vec<MatterClause>, Unavailable> {
            let needle = clause_type.to_lowercase();
            let mut out = Vec::new();
            for doc in self.list_documents(matter_id, tenant_id)? {
                for clause in self.clauses.get(&doc.id).into_iter().flatten() {
                    if clause.clause_type.to_lowercase().contains(&needle) {
                        out.push(MatterClause {
                            clause: clause.clone(),
                            document_title: doc.title.clone(),
                            document_created_at: doc.created_at,
                        });
                    }
                }
            }
            Ok(out)
        }
    }
}
