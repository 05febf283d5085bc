//! Typed records shared between the store, the AI backend client and the CLI.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Category assigned to uploads that arrive without one.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Relationship type used when the uploader designates a parent without a type.
pub const DEFAULT_RELATIONSHIP_TYPE: &str = "related_to";

/// Status given to freshly created matters.
pub const MATTER_OPEN: &str = "Open";

/// Categorical risk assigned to a document by smart ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Map a 0–100 risk score onto a level: `>= 75` High, `>= 40` Medium.
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            Self::High
        } else if score >= 40.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(CoreError::InvalidRiskLevel(other.to_string())),
        }
    }
}

/// A legal case or engagement; the top-level grouping for documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matter {
    pub id: String,
    pub tenant_id: String,
    pub title: String,
    pub description: String,
    pub practice_area: String,
    pub client_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Fields a user supplies when opening a matter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMatter {
    pub title: String,
    pub description: String,
    pub practice_area: String,
    pub client_name: String,
}

impl NewMatter {
    /// Title, practice area and client name are mandatory; description may be blank.
    pub fn validate(&self) -> Result<(), CoreError> {
        let missing: Vec<&str> = [
            ("title", &self.title),
            ("practice_area", &self.practice_area),
            ("client_name", &self.client_name),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MissingFields(missing.join(", ")))
        }
    }
}

/// One uploaded file belonging to exactly one matter and tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub matter_id: String,
    pub tenant_id: String,
    pub title: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub contract_value: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
}

impl Document {
    /// A bare document with no file or ingestion metadata attached.
    pub fn new(
        id: impl Into<String>,
        matter_id: impl Into<String>,
        tenant_id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            matter_id: matter_id.into(),
            tenant_id: tenant_id.into(),
            title: title.into(),
            category: category.into(),
            created_at,
            contract_value: None,
            risk_level: None,
            file_path: None,
            file_type: None,
            file_size: None,
        }
    }
}

/// A directed parent → child genealogy edge between two documents of one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub tenant_id: String,
    pub parent_id: String,
    pub child_id: String,
    pub relationship_type: String,
    pub created_at: DateTime<Utc>,
}

/// An extracted contractual clause, owned by one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub id: String,
    pub document_id: String,
    pub tenant_id: String,
    pub clause_type: String,
    pub original_text: String,
    pub summary: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

/// A clause joined with the title and creation time of its owning document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatterClause {
    pub clause: Clause,
    pub document_title: String,
    pub document_created_at: DateTime<Utc>,
}

/// A dated duty extracted from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: String,
    pub tenant_id: String,
    pub document_id: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    /// Owning document title, filled when listed per matter.
    pub document_title: Option<String>,
}

impl Obligation {
    pub fn is_pending(&self) -> bool {
        self.status == "pending"
    }
}

/// A reviewer annotation anchored to a quote inside a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub tenant_id: String,
    pub document_id: String,
    pub quote: String,
    pub comment: String,
    pub position: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Clause produced by smart ingestion, before it is attached to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedClause {
    pub clause_type: String,
    pub original_text: String,
    pub summary: Option<String>,
}

/// Obligation produced by smart ingestion, before it is attached to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedObligation {
    pub description: String,
    pub due_date: Option<NaiveDate>,
}

/// Everything smart ingestion learned about one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub contract_value: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub clauses: Vec<ExtractedClause>,
    pub obligations: Vec<ExtractedObligation>,
}

/// Fresh opaque record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
