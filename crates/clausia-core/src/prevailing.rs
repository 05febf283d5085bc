//! Prevailing-terms resolution between a parent document and its most recent
//! descendant.
//!
//! The resolver picks one parent and one child from a matter's
//! classification, walks the child's clauses in order and reports the first
//! clause type whose text differs from the parent's. It surfaces a single
//! illustrative override, not an exhaustive diff.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::genealogy::{Classification, RelationshipScope, classify};
use crate::source::MatterSource;
use crate::{Clause, Document};

/// Number of characters of original text quoted when a clause has no summary.
pub const EXCERPT_CHARS: usize = 100;

/// One clause type on which the child's terms override the parent's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub clause_type: String,
    /// Short heading, e.g. "Indemnity Terms".
    pub issue: String,
    pub description: String,
    pub parent_title: String,
    pub parent_text: String,
    pub child_title: String,
    pub child_text: String,
    /// Title of the document whose terms control; always the child.
    pub prevailing_title: String,
}

/// Result of a prevailing-terms query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PrevailingOutcome {
    /// Fewer than two documents, or no parent/child pair to compare.
    InsufficientData,
    /// Every clause type shared by parent and child has identical text.
    Harmonized,
    Conflict(ConflictReport),
}

impl PrevailingOutcome {
    pub fn conflict(&self) -> Option<&ConflictReport> {
        match self {
            Self::Conflict(report) => Some(report),
            _ => None,
        }
    }
}

/// Choose the parent and child to compare.
///
/// Parent is the earliest-created root and child the latest-created non-root.
/// Equal timestamps fall back to input order: the first root and the last
/// non-root win.
pub fn select_pair(classification: &Classification) -> Option<(&Document, &Document)> {
    let parent = classification.roots.iter().min_by_key(|d| d.created_at)?;
    let child = classification.non_roots.iter().max_by_key(|d| d.created_at)?;
    Some((parent, child))
}

/// Compare clause lists and report the first overriding clause type.
pub fn find_conflict(
    parent: &Document,
    parent_clauses: &[Clause],
    child: &Document,
    child_clauses: &[Clause],
) -> Option<ConflictReport> {
    child_clauses.iter().find_map(|child_clause| {
        let parent_clause = parent_clauses
            .iter()
            .find(|pc| pc.clause_type == child_clause.clause_type)?;
        if parent_clause.original_text == child_clause.original_text {
            return None;
        }
        Some(ConflictReport {
            clause_type: child_clause.clause_type.clone(),
            issue: format!("{} Terms", child_clause.clause_type),
            description: format!(
                "Specific terms in {} override general terms in {}.",
                child.title, parent.title
            ),
            parent_title: parent.title.clone(),
            parent_text: excerpt(parent_clause),
            child_title: child.title.clone(),
            child_text: excerpt(child_clause),
            prevailing_title: child.title.clone(),
        })
    })
}

/// The clause summary if it has one, else the first [`EXCERPT_CHARS`]
/// characters of the original text followed by "...".
pub fn excerpt(clause: &Clause) -> String {
    match clause.summary.as_deref() {
        Some(summary) if !summary.is_empty() => summary.to_string(),
        _ => {
            let head: String = clause.original_text.chars().take(EXCERPT_CHARS).collect();
            format!("{head}...")
        }
    }
}

/// Fetch a matter's genealogy and clauses and resolve its prevailing terms.
///
/// Storage failures are returned as-is; nothing is retried and no partial
/// outcome is produced.
pub fn resolve_prevailing_terms<S: MatterSource>(
    source: &S,
    matter_id: &str,
    tenant_id: &str,
    scope: RelationshipScope,
) -> Result<PrevailingOutcome, S::Error> {
    let documents = source.list_documents(matter_id, tenant_id)?;
    if documents.len() < 2 {
        debug!(matter_id, count = documents.len(), "too few documents to compare");
        return Ok(PrevailingOutcome::InsufficientData);
    }

    let relationships = scope.apply(&documents, source.list_relationships(tenant_id)?);
    let classification = classify(&documents, &relationships);
    let Some((parent, child)) = select_pair(&classification) else {
        debug!(
            matter_id,
            roots = classification.roots.len(),
            non_roots = classification.non_roots.len(),
            "no parent/child pair"
        );
        return Ok(PrevailingOutcome::InsufficientData);
    };

    let parent_clauses = source.list_clauses(&parent.id)?;
    let child_clauses = source.list_clauses(&child.id)?;

    Ok(match find_conflict(parent, &parent_clauses, child, &child_clauses) {
        Some(report) => {
            debug!(matter_id, clause_type = %report.clause_type, "prevailing-terms conflict");
            PrevailingOutcome::Conflict(report)
        }
        None => PrevailingOutcome::Harmonized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genealogy::fixtures::{at, doc, rel};
    use crate::source::memory::MemorySource;

    fn clause(doc_id: &str, kind: &str, text: &str) -> Clause {
        Clause {
            id: format!("{doc_id}-{kind}"),
            document_id: doc_id.into(),
            tenant_id: "t1".into(),
            clause_type: kind.into(),
            original_text: text.into(),
            summary: None,
            extracted_at: at(0),
        }
    }

    fn source(parent: Vec<Clause>, child: Vec<Clause>) -> MemorySource {
        let mut s = MemorySource {
            documents: vec![doc("msa", "Master Agreement", "MSA", 0), doc("sow", "SOW 2", "SOW", 5)],
            relationships: vec![rel("r1", "msa", "sow")],
            ..Default::default()
        };
        s.clauses.insert("msa".into(), parent);
        s.clauses.insert("sow".into(), child);
        s
    }

    fn resolve(s: &MemorySource) -> PrevailingOutcome {
        resolve_prevailing_terms(s, "m1", "t1", RelationshipScope::Matter).unwrap()
    }

    #[test]
    fn first_mismatch_in_child_order_wins() {
        let s = source(
            vec![clause("msa", "Liability", "L-parent"), clause("msa", "Indemnity", "Z")],
            vec![clause("sow", "Indemnity", "A"), clause("sow", "Liability", "L-child")],
        );
        let report = resolve(&s).conflict().cloned().expect("conflict");
        assert_eq!(report.clause_type, "Indemnity");
        assert_eq!(report.issue, "Indemnity Terms");
        assert_eq!(report.parent_text, "Z...");
        assert_eq!(report.child_text, "A...");
        assert_eq!(report.prevailing_title, "SOW 2");
        assert_eq!(
            report.description,
            "Specific terms in SOW 2 override general terms in Master Agreement."
        );
    }

    #[test]
    fn equal_text_is_skipped() {
        let s = source(
            vec![clause("msa", "Indemnity", "same"), clause("msa", "Liability", "cap 1x")],
            vec![clause("sow", "Indemnity", "same"), clause("sow", "Liability", "cap 2x")],
        );
        assert_eq!(resolve(&s).conflict().unwrap().clause_type, "Liability");
    }

    #[test]
    fn identical_shared_clauses_are_harmonized() {
        let s = source(
            vec![clause("msa", "Indemnity", "A"), clause("msa", "Termination", "T")],
            vec![clause("sow", "Indemnity", "A"), clause("sow", "Payment", "net 30")],
        );
        assert_eq!(resolve(&s), PrevailingOutcome::Harmonized);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let s = source(
            vec![clause("msa", "Indemnity", "Supplier shall indemnify")],
            vec![clause("sow", "Indemnity", "supplier shall indemnify")],
        );
        assert!(resolve(&s).conflict().is_some());
    }

    #[test]
    fn single_document_is_insufficient_without_reading_clauses() {
        let mut s = source(vec![], vec![]);
        s.documents.truncate(1);
        assert_eq!(resolve(&s), PrevailingOutcome::InsufficientData);
        assert_eq!(s.clause_reads.get(), 0);
    }

    #[test]
    fn no_relationships_is_insufficient() {
        let mut s = source(vec![clause("msa", "Indemnity", "A")], vec![clause("sow", "Indemnity", "B")]);
        s.relationships.clear();
        assert_eq!(resolve(&s), PrevailingOutcome::InsufficientData);
    }

    #[test]
    fn cycle_without_roots_is_insufficient_without_reading_clauses() {
        let mut s = source(vec![clause("msa", "Indemnity", "A")], vec![clause("sow", "Indemnity", "B")]);
        s.relationships.push(rel("r2", "sow", "msa"));
        assert_eq!(resolve(&s), PrevailingOutcome::InsufficientData);
        assert_eq!(s.clause_reads.get(), 0);
    }

    #[test]
    fn storage_failure_propagates() {
        let mut s = source(vec![], vec![]);
        s.fail_clauses = true;
        let err = resolve_prevailing_terms(&s, "m1", "t1", RelationshipScope::Matter).unwrap_err();
        assert_eq!(err.to_string(), "storage unavailable: connection reset");
    }

    #[test]
    fn latest_child_is_compared() {
        let mut s = source(vec![clause("msa", "Indemnity", "A")], vec![clause("sow", "Indemnity", "A")]);
        s.documents.push(doc("amend", "Amendment 3", "Amendment", 9));
        s.relationships.push(rel("r2", "msa", "amend"));
        s.clauses.insert("amend".into(), vec![clause("amend", "Indemnity", "B")]);
        let report = resolve(&s).conflict().cloned().unwrap();
        assert_eq!(report.child_title, "Amendment 3");
    }

    #[test]
    fn select_pair_ties_follow_input_order() {
        let c = Classification {
            roots: vec![doc("r1", "R1", "MSA", 0), doc("r2", "R2", "MSA", 0)],
            non_roots: vec![doc("c1", "C1", "SOW", 3), doc("c2", "C2", "SOW", 3)],
        };
        let (parent, child) = select_pair(&c).unwrap();
        assert_eq!(parent.id, "r1");
        assert_eq!(child.id, "c2");
    }

    #[test]
    fn excerpt_prefers_summary_and_truncates_by_chars() {
        let mut c = clause("d", "Indemnity", &"é".repeat(150));
        let text = excerpt(&c);
        assert_eq!(text.chars().count(), EXCERPT_CHARS + 3);
        assert!(text.ends_with("..."));

        c.summary = Some("Mutual indemnity, capped".into());
        assert_eq!(excerpt(&c), "Mutual indemnity, capped");

        c.summary = Some("  ".into());
        assert_eq!(excerpt(&c), "  ");

        c.summary = Some(String::new());
        assert!(excerpt(&c).ends_with("..."));
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(PrevailingOutcome::Harmonized).unwrap();
        assert_eq!(json["outcome"], "harmonized");
    }
}
