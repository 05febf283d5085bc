//! Genealogy classification: which documents of a matter are roots and which
//! descend from another document.
//!
//! A root is a document whose id never appears as the child of a
//! relationship. Classification is purely positional over the supplied
//! lists; it does not look at relationship types and tolerates relationships
//! that point outside the document set.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Document, Relationship};

/// A matter's documents split into roots and non-roots.
///
/// Both lists keep the order of the input documents; they are disjoint and
/// together contain every input document exactly once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub roots: Vec<Document>,
    pub non_roots: Vec<Document>,
}

/// Partition `documents` into roots and non-roots using `relationships`.
pub fn classify(documents: &[Document], relationships: &[Relationship]) -> Classification {
    let child_ids = child_ids(relationships);
    let (non_roots, roots) = documents
        .iter()
        .cloned()
        .partition(|doc| child_ids.contains(doc.id.as_str()));
    Classification { roots, non_roots }
}

pub(crate) fn child_ids(relationships: &[Relationship]) -> HashSet<&str> {
    relationships.iter().map(|r| r.child_id.as_str()).collect()
}

/// Which of a tenant's relationships a matter-level query takes into account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipScope {
    /// Every relationship of the tenant, unfiltered.
    Tenant,
    /// Relationships with at least one endpoint among the matter's documents.
    Touching,
    /// Relationships with both endpoints among the matter's documents.
    #[default]
    Matter,
}

impl RelationshipScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Touching => "touching",
            Self::Matter => "matter",
        }
    }

    /// Filter `relationships` against the ids of `documents`, preserving order.
    pub fn apply(&self, documents: &[Document], relationships: Vec<Relationship>) -> Vec<Relationship> {
        if *self == Self::Tenant {
            return relationships;
        }
        let ids: HashSet<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        let before = relationships.len();
        let kept: Vec<Relationship> = relationships
            .into_iter()
            .filter(|r| {
                let parent = ids.contains(r.parent_id.as_str());
                let child = ids.contains(r.child_id.as_str());
                match self {
                    Self::Touching => parent || child,
                    _ => parent && child,
                }
            })
            .collect();
        tracing::debug!(scope = self.as_str(), before, after = kept.len(), "scoped relationships");
        kept
    }
}

impl fmt::Display for RelationshipScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tenant" => Ok(Self::Tenant),
            "touching" => Ok(Self::Touching),
            "matter" => Ok(Self::Matter),
            other => Err(CoreError::InvalidScope(other.to_string())),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::{Document, Relationship};

    pub fn at(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap() + Duration::days(day)
    }

    pub fn doc(id: &str, title: &str, category: &str, day: i64) -> Document {
        Document::new(id, "m1", "t1", title, category, at(day))
    }

    pub fn rel(id: &str, parent: &str, child: &str) -> Relationship {
        Relationship {
            id: id.into(),
            tenant_id: "t1".into(),
            parent_id: parent.into(),
            child_id: child.into(),
            relationship_type: "amends".into(),
            created_at: at(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{doc, rel};
    use super::*;

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn partitions_roots_and_children_in_input_order() {
        let docs = vec![
            doc("msa", "MSA", "MSA", 0),
            doc("sow1", "SOW 1", "SOW", 1),
            doc("nda", "NDA", "NDA", 2),
            doc("amend", "Amendment 1", "Amendment", 3),
        ];
        let rels = vec![rel("r1", "msa", "amend"), rel("r2", "msa", "sow1")];
        let c = classify(&docs, &rels);
        assert_eq!(ids(&c.roots), vec!["msa", "nda"]);
        assert_eq!(ids(&c.non_roots), vec!["sow1", "amend"]);
    }

    #[test]
    fn partition_covers_input_and_is_disjoint() {
        let docs = vec![
            doc("a", "A", "MSA", 0),
            doc("b", "B", "SOW", 1),
            doc("c", "C", "SOW", 2),
        ];
        let rels = vec![rel("r1", "a", "b"), rel("r2", "x", "c"), rel("r3", "b", "zz")];
        let c = classify(&docs, &rels);
        assert_eq!(c.roots.len() + c.non_roots.len(), docs.len());
        for d in &docs {
            let in_roots = c.roots.contains(d);
            let in_children = c.non_roots.contains(d);
            assert!(in_roots ^ in_children, "{} must be in exactly one list", d.id);
        }
    }

    #[test]
    fn classification_is_deterministic() {
        let docs = vec![doc("a", "A", "MSA", 0), doc("b", "B", "SOW", 1)];
        let rels = vec![rel("r1", "a", "b")];
        assert_eq!(classify(&docs, &rels), classify(&docs, &rels));
    }

    #[test]
    fn cycle_leaves_no_roots() {
        let docs = vec![doc("a", "A", "MSA", 0), doc("b", "B", "SOW", 1)];
        let rels = vec![rel("r1", "a", "b"), rel("r2", "b", "a")];
        let c = classify(&docs, &rels);
        assert!(c.roots.is_empty());
        assert_eq!(c.non_roots.len(), 2);
    }

    #[test]
    fn empty_inputs() {
        let c = classify(&[], &[rel("r1", "a", "b")]);
        assert!(c.roots.is_empty() && c.non_roots.is_empty());
    }

    #[test]
    fn scope_filters_relationships() {
        let docs = vec![doc("a", "A", "MSA", 0), doc("b", "B", "SOW", 1)];
        let rels = vec![
            rel("inside", "a", "b"),
            rel("half", "a", "other-matter"),
            rel("outside", "x", "y"),
        ];
        let names = |rs: Vec<Relationship>| rs.into_iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(
            names(RelationshipScope::Tenant.apply(&docs, rels.clone())),
            vec!["inside", "half", "outside"]
        );
        assert_eq!(
            names(RelationshipScope::Touching.apply(&docs, rels.clone())),
            vec!["inside", "half"]
        );
        assert_eq!(names(RelationshipScope::Matter.apply(&docs, rels)), vec!["inside"]);
    }

    #[test]
    fn scope_parses() {
        assert_eq!("Touching".parse::<RelationshipScope>().unwrap(), RelationshipScope::Touching);
        assert_eq!(RelationshipScope::default(), RelationshipScope::Matter);
        assert!("galaxy".parse::<RelationshipScope>().is_err());
    }
}
