//! Collects an axum multipart body into the form parts the submission decoder reads.

use axum::extract::Multipart;
use crate::editor::submission::unescape_header_value;
use crate::editor::{FormPart, ImageFile, ValidationError};

fn malformed(reason: impl ToString) -> ValidationError {
    ValidationError::Malformed { field: "multipart".into(), reason: reason.to_string() }
}

pub async fn read_parts(mut multipart: Multipart) -> Result<Vec<FormPart>, ValidationError> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(unescape_header_value) else { continue };
        match field.file_name().map(unescape_header_value) {
            Some(file_name) => {
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                let bytes = field.bytes().await.map_err(malformed)?;
                parts.push(FormPart::File { name, file: ImageFile::new(file_name, content_type, bytes.to_vec()) });
            }
            None => {
                let value = field.text().await.map_err(malformed)?;
                parts.push(FormPart::Text { name, value });
            }
        }
    }
    tracing::debug!(parts = parts.len(), "Read multipart submission");
    Ok(parts)
}
