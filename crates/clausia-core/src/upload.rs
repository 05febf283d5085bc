//! Naming and sniffing helpers for uploaded files.
//!
//! Files are stored under `{tenant}/{matter}/{millis}_{safe_name}` so that
//! two uploads of the same file never collide and a tenant's files share a
//! prefix.

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Relative storage path for an upload.
pub fn storage_path(tenant_id: &str, matter_id: &str, millis: i64, file_name: &str) -> String {
    format!("{tenant_id}/{matter_id}/{millis}_{}", safe_file_name(file_name))
}

/// True when `bytes` start with the PDF signature.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}
