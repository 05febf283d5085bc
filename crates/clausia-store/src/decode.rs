//! Decoding of Arrow record batches into typed records.
//!
//! Every query projects the columns named by the matching schema in
//! [`clausia_core::tables`]; a batch missing one of them is rejected before
//! any row is read.

use arrow::array::{Array, ArrayRef, Int64Array, LargeStringArray, StringArray, StringViewArray};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, Utc};
use clausia_core::{
    Clause, Document, Matter, MatterClause, Note, Obligation, Relationship, RiskLevel, tables,
};

use crate::StoreError;

/// Name-addressed view over one batch.
struct Columns<'a> {
    batch: &'a RecordBatch,
}

impl<'a> Columns<'a> {
    fn new(batch: &'a RecordBatch, schema: &Schema) -> Result<Self, StoreError> {
        for field in schema.fields() {
            if batch.column_by_name(field.name()).is_none() {
                return Err(StoreError::Decode(format!("missing column '{}'", field.name())));
            }
        }
        Ok(Self { batch })
    }

    fn col(&self, name: &str) -> Result<&ArrayRef, StoreError> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| StoreError::Decode(format!("missing column '{name}'")))
    }

    fn opt_string(&self, name: &str, row: usize) -> Result<Option<String>, StoreError> {
        let col = self.col(name)?;
        if col.is_null(row) {
            return Ok(None);
        }
        get_string(col.as_ref(), row)
            .map(Some)
            .ok_or_else(|| StoreError::Decode(format!("column '{name}' is not a string")))
    }

    fn string(&self, name: &str, row: usize) -> Result<String, StoreError> {
        self.opt_string(name, row)?
            .ok_or_else(|| StoreError::Decode(format!("null '{name}' at row {row}")))
    }

    fn opt_i64(&self, name: &str, row: usize) -> Result<Option<i64>, StoreError> {
        let col = self.col(name)?;
        if col.is_null(row) {
            return Ok(None);
        }
        col.as_any()
            .downcast_ref::<Int64Array>()
            .map(|a| Some(a.value(row)))
            .ok_or_else(|| StoreError::Decode(format!("column '{name}' is not i64")))
    }

    fn timestamp(&self, name: &str, row: usize) -> Result<DateTime<Utc>, StoreError> {
        let ms = self
            .opt_i64(name, row)?
            .ok_or_else(|| StoreError::Decode(format!("null '{name}' at row {row}")))?;
        DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| StoreError::Decode(format!("'{name}' out of range: {ms}")))
    }

    fn opt_date(&self, name: &str, row: usize) -> Result<Option<NaiveDate>, StoreError> {
        self.opt_string(name, row)?
            .map(|s| {
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|e| StoreError::Decode(format!("'{name}' = {s:?}: {e}")))
            })
            .transpose()
    }

    fn opt_risk(&self, name: &str, row: usize) -> Result<Option<RiskLevel>, StoreError> {
        match self.opt_string(name, row)? {
            Some(s) if !s.trim().is_empty() => Ok(Some(s.parse()?)),
            _ => Ok(None),
        }
    }
}

/// Read a string cell from any of DuckDB's string encodings.
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        Some(arr.value(row).to_string())
    } else if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        Some(arr.value(row).to_string())
    } else {
        col.as_any()
            .downcast_ref::<StringViewArray>()
            .map(|arr| arr.value(row).to_string())
    }
}

/// Apply `decode_row` to every row of every batch, checking columns against `schema`.
fn rows<T>(
    batches: &[RecordBatch],
    schema: Schema,
    mut decode_row: impl FnMut(&Columns<'_>, usize) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError> {
    let total = batches.iter().map(|b| b.num_rows()).sum();
    let mut out = Vec::with_capacity(total);
    for batch in batches {
        let cols = Columns::new(batch, &schema)?;
        for row in 0..batch.num_rows() {
            out.push(decode_row(&cols, row)?);
        }
    }
    Ok(out)
}

pub(crate) fn matters(batches: &[RecordBatch]) -> Result<Vec<Matter>, StoreError> {
    rows(batches, tables::matters_schema(), |c, row| {
        Ok(Matter {
            id: c.string("id", row)?,
            tenant_id: c.string("tenant_id", row)?,
            title: c.string("title", row)?,
            description: c.opt_string("description", row)?.unwrap_or_default(),
            practice_area: c.string("practice_area", row)?,
            client_name: c.string("client_name", row)?,
            status: c.string("status", row)?,
            created_at: c.timestamp("created_at_ms", row)?,
        })
    })
}

pub(crate) fn documents(batches: &[RecordBatch]) -> Result<Vec<Document>, StoreError> {
    rows(batches, tables::documents_schema(), |c, row| {
        Ok(Document {
            id: c.string("id", row)?,
            matter_id: c.string("matter_id", row)?,
            tenant_id: c.string("tenant_id", row)?,
            title: c.string("title", row)?,
            category: c.string("category", row)?,
            created_at: c.timestamp("created_at_ms", row)?,
            contract_value: c.opt_string("contract_value", row)?,
            risk_level: c.opt_risk("risk_level", row)?,
            file_path: c.opt_string("file_path", row)?,
            file_type: c.opt_string("file_type", row)?,
            file_size: c.opt_i64("file_size", row)?,
        })
    })
}

pub(crate) fn relationships(batches: &[RecordBatch]) -> Result<Vec<Relationship>, StoreError> {
    rows(batches, tables::relationships_schema(), |c, row| {
        Ok(Relationship {
            id: c.string("id", row)?,
            tenant_id: c.string("tenant_id", row)?,
            parent_id: c.string("parent_id", row)?,
            child_id: c.string("child_id", row)?,
            relationship_type: c.string("relationship_type", row)?,
            created_at: c.timestamp("created_at_ms", row)?,
        })
    })
}

fn clause(c: &Columns<'_>, row: usize) -> Result<Clause, StoreError> {
    Ok(Clause {
        id: c.string("id", row)?,
        document_id: c.string("document_id", row)?,
        tenant_id: c.string("tenant_id", row)?,
        clause_type: c.string("clause_type", row)?,
        original_text: c.string("original_text", row)?,
        summary: c.opt_string("summary", row)?,
        extracted_at: c.timestamp("extracted_at_ms", row)?,
    })
}

pub(crate) fn clauses(batches: &[RecordBatch]) -> Result<Vec<Clause>, StoreError> {
    rows(batches, tables::clauses_schema(), clause)
}

pub(crate) fn matter_clauses(batches: &[RecordBatch]) -> Result<Vec<MatterClause>, StoreError> {
    rows(batches, tables::matter_clauses_schema(), |c, row| {
        Ok(MatterClause {
            clause: clause(c, row)?,
            document_title: c.string("document_title", row)?,
            document_created_at: c.timestamp("document_created_at_ms", row)?,
        })
    })
}

pub(crate) fn obligations(batches: &[RecordBatch]) -> Result<Vec<Obligation>, StoreError> {
    rows(batches, tables::obligations_schema(), |c, row| {
        Ok(Obligation {
            id: c.string("id", row)?,
            tenant_id: c.string("tenant_id", row)?,
            document_id: c.string("document_id", row)?,
            description: c.string("description", row)?,
            due_date: c.opt_date("due_date", row)?,
            status: c.string("status", row)?,
            document_title: c.opt_string("document_title", row)?,
        })
    })
}

pub(crate) fn notes(batches: &[RecordBatch]) -> Result<Vec<Note>, StoreError> {
    rows(batches, tables::notes_schema(), |c, row| {
        let raw = c.string("position", row)?;
        let position = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Decode(format!("note position: {e}")))?;
        Ok(Note {
            id: c.string("id", row)?,
            tenant_id: c.string("tenant_id", row)?,
            document_id: c.string("document_id", row)?,
            quote: c.string("quote", row)?,
            comment: c.string("comment", row)?,
            position,
            created_at: c.timestamp("created_at_ms", row)?,
        })
    })
}
