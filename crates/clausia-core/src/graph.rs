//! Genealogy graph layout for visual rendering.
//!
//! Roots sit on one row and descendants on a second row, spaced by index.
//! The layout is a static grid; it does not try to align a child under its
//! parent.

use serde::{Deserialize, Serialize};

use crate::genealogy::classify;
use crate::{Document, Relationship, RiskLevel};

const ROOT_ROW_Y: f64 = 50.0;
const ROOT_ORIGIN_X: f64 = 250.0;
const ROOT_SPACING_X: f64 = 400.0;
const CHILD_ROW_Y: f64 = 300.0;
const CHILD_SPACING_X: f64 = 300.0;
const ACTIVE_PROGRESS: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Display status of a descendant document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildStatus {
    Active,
    Completed,
    Pending,
}

impl ChildStatus {
    /// `Complete` category or low risk reads as completed; an `Amendment`
    /// category then overrides to pending.
    pub fn for_document(doc: &Document) -> Self {
        let mut status = Self::Active;
        if doc.category == "Complete" || doc.risk_level == Some(RiskLevel::Low) {
            status = Self::Completed;
        }
        if doc.category == "Amendment" {
            status = Self::Pending;
        }
        status
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeData {
    Parent {
        category: String,
        title: String,
        deal_value: String,
        /// Risk level stands in for the liability cap until one is extracted.
        liability_cap: String,
    },
    Child {
        category: String,
        title: String,
        status: ChildStatus,
        value: String,
        progress: Option<u8>,
        warning: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub position: Position,
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relationship_type: String,
}

/// A matter's genealogy graph; `Empty` when the matter has no documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum GenealogyGraph {
    Empty,
    Populated {
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
    },
}

impl GenealogyGraph {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        match self {
            Self::Empty => &[],
            Self::Populated { nodes, .. } => nodes,
        }
    }

    pub fn edges(&self) -> &[GraphEdge] {
        match self {
            Self::Empty => &[],
            Self::Populated { edges, .. } => edges,
        }
    }
}

/// Lay out documents and relationships as nodes and edges.
///
/// When every document is someone's child the first document is promoted to
/// the sole root so a non-empty matter always renders. Every relationship
/// becomes an edge, including ones whose endpoints are not in `documents`.
pub fn build_graph(documents: &[Document], relationships: &[Relationship]) -> GenealogyGraph {
    let Some(first) = documents.first() else {
        return GenealogyGraph::Empty;
    };

    let mut classification = classify(documents, relationships);
    let roots = if classification.roots.is_empty() {
        tracing::debug!(document_id = %first.id, "no roots; promoting first document");
        // Node ids stay unique: the promoted document leaves the child row.
        classification.non_roots.retain(|d| d.id != first.id);
        vec![first.clone()]
    } else {
        classification.roots
    };

    let mut nodes = Vec::with_capacity(roots.len() + classification.non_roots.len());
    nodes.extend(roots.iter().enumerate().map(|(i, doc)| root_node(i, doc)));
    nodes.extend(
        classification
            .non_roots
            .iter()
            .enumerate()
            .map(|(i, doc)| child_node(i, doc)),
    );

    let edges = relationships
        .iter()
        .map(|r| GraphEdge {
            id: r.id.clone(),
            source: r.parent_id.clone(),
            target: r.child_id.clone(),
            relationship_type: r.relationship_type.clone(),
        })
        .collect();

    GenealogyGraph::Populated { nodes, edges }
}

fn root_node(index: usize, doc: &Document) -> GraphNode {
    GraphNode {
        id: doc.id.clone(),
        position: Position {
            x: ROOT_ORIGIN_X + index as f64 * ROOT_SPACING_X,
            y: ROOT_ROW_Y,
        },
        data: NodeData::Parent {
            category: or_default(&doc.category, "Parent Contract"),
            title: doc.title.clone(),
            deal_value: doc
                .contract_value
                .clone()
                .unwrap_or_else(|| "Not analyzed".into()),
            liability_cap: doc
                .risk_level
                .map(|r| r.as_str().to_string())
                .unwrap_or_else(|| "Unknown".into()),
        },
    }
}

fn child_node(index: usize, doc: &Document) -> GraphNode {
    let status = ChildStatus::for_document(doc);
    GraphNode {
        id: doc.id.clone(),
        position: Position {
            x: index as f64 * CHILD_SPACING_X,
            y: CHILD_ROW_Y,
        },
        data: NodeData::Child {
            category: or_default(&doc.category, "Document"),
            title: or_default(&doc.title, "Untitled Document"),
            status,
            value: doc.contract_value.clone().unwrap_or_default(),
            progress: (status == ChildStatus::Active).then_some(ACTIVE_PROGRESS),
            warning: doc.risk_level == Some(RiskLevel::High),
        },
    }
}

fn or_default(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
