/// Arrow schemas of the record batches the store returns for each record type.
///
/// Timestamps travel as epoch milliseconds (`*_ms`) and dates as ISO strings,
/// so decoding never depends on the database's timestamp unit.
pub mod tables {
    use arrow::datatypes::{DataType, Field, Schema};

    fn utf8(name: &str, nullable: bool) -> Field {
        Field::new(name, DataType::Utf8, nullable)
    }

    fn millis(name: &str) -> Field {
        Field::new(name, DataType::Int64, false)
    }

    pub fn matters_schema() -> Schema {
        Schema::new(vec![
            utf8("id", false),
            utf8("tenant_id", false),
            utf8("title", false),
            utf8("description", true),
            utf8("practice_area", false),
            utf8("client_name", false),
            utf8("status", false),
            millis("created_at_ms"),
        ])
    }

    pub fn documents_schema() -> Schema {
        Schema::new(vec![
            utf8("id", false),
            utf8("matter_id", false),
            utf8("tenant_id", false),
            utf8("title", false),
            utf8("category", false),
            millis("created_at_ms"),
            utf8("contract_value", true),
            utf8("risk_level", true),
            utf8("file_path", true),
            utf8("file_type", true),
            Field::new("file_size", DataType::Int64, true),
        ])
    }

    pub fn relationships_schema() -> Schema {
        Schema::new(vec![
            utf8("id", false),
            utf8("tenant_id", false),
            utf8("parent_id", false),
            utf8("child_id", false),
            utf8("relationship_type", false),
            millis("created_at_ms"),
        ])
    }

    pub fn clauses_schema() -> Schema {
        Schema::new(vec![
            utf8("id", false),
            utf8("document_id", false),
            utf8("tenant_id", false),
            utf8("clause_type", false),
            utf8("original_text", false),
            utf8("summary", true),
            millis("extracted_at_ms"),
        ])
    }

    /// Clauses joined with their owning document's title and creation time.
    pub fn matter_clauses_schema() -> Schema {
        let mut fields: Vec<Field> = clauses_schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        fields.push(utf8("document_title", false));
        fields.push(millis("document_created_at_ms"));
        Schema::new(fields)
    }

    pub fn obligations_schema() -> Schema {
        Schema::new(vec![
            utf8("id", false),
            utf8("tenant_id", false),
            utf8("document_id", false),
            utf8("description", false),
            utf8("due_date", true),
            utf8("status", false),
            utf8("document_title", true),
        ])
    }

    pub fn notes_schema() -> Schema {
        Schema::new(vec![
            utf8("id", false),
            utf8("tenant_id", false),
            utf8("document_id", false),
            utf8("quote", false),
            utf8("comment", false),
            utf8("position", false),
            millis("created_at_ms"),
        ])
    }
}
