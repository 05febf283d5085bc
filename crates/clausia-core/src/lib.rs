//! Core types, genealogy engine, and record schemas for Clausia.

mod error;
pub mod genealogy;
pub mod graph;
pub mod obligation;
pub mod prevailing;
mod record;
pub mod schema;
pub mod source;
pub mod tenant;
pub mod timeline;
pub mod upload;

pub use error::CoreError;
pub use genealogy::{Classification, RelationshipScope, classify};
pub use graph::{GenealogyGraph, build_graph};
pub use obligation::DueDisplay;
pub use prevailing::{ConflictReport, PrevailingOutcome, resolve_prevailing_terms};
pub use record::*;
pub use schema::tables;
pub use source::MatterSource;
pub use tenant::Principal;
pub use timeline::{TimelineEntry, build_timeline, clause_evolution};
