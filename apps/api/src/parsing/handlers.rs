use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ParseResultRow;
use crate::parsing::batch::process_batch;
use crate::parsing::{ParsingMethod, UploadedFile};
use crate::state::AppState;

/// Per-file size cap. Oversized files are rejected before any remote call.
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
/// Upper bound on files per batch request.
pub const MAX_BATCH_FILES: usize = 10;
/// Request body limit: a full batch of maximum-size files plus form overhead.
pub const MAX_BODY_BYTES: usize = MAX_BATCH_FILES * MAX_FILE_BYTES + 1024 * 1024;

const RESULTS_PAGE_SIZE: i64 = 100;

/// POST /api/resume/parse
pub async fn handle_parse(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let (files, method) = read_upload(multipart, "file", 1).await?;
    let file = files
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    let summary = process_batch(
        state.parser.as_ref(),
        state.files.as_ref(),
        state.results.as_ref(),
        &[file],
        method,
    )
    .await;

    // A failed record has already been persisted; the caller still gets a 500.
    if let Some(failure) = summary.failed.into_iter().next() {
        return Err(AppError::Processing(failure.error));
    }

    let result = summary
        .successful
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Processing("No result produced".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Resume parsed successfully",
        "data": result
    })))
}

/// POST /api/resume/parse-multiple
pub async fn handle_parse_multiple(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let (files, method) = read_upload(multipart, "files", MAX_BATCH_FILES).await?;
    if files.is_empty() {
        return Err(AppError::Validation("No files provided".to_string()));
    }

    let summary = process_batch(
        state.parser.as_ref(),
        state.files.as_ref(),
        state.results.as_ref(),
        &files,
        method,
    )
    .await;

    // Always 200: per-file outcomes are in the summary.
    Ok(Json(json!({
        "success": true,
        "message": format!("Processed {} resumes", summary.total_processed),
        "data": summary
    })))
}

/// GET /api/resume/results
pub async fn handle_list_results(
    State(state): State<AppState>,
) -> Result<Json<Vec<ParseResultRow>>, AppError> {
    let rows = state
        .results
        .list_recent(RESULTS_PAGE_SIZE)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(rows))
}

/// GET /api/resume/results/:id
pub async fn handle_get_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ParseResultRow>, AppError> {
    let row = state
        .results
        .get(id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("Result {id} not found")))?;
    Ok(Json(row))
}

/// Walks the multipart payload, collecting PDF uploads from `file_field`
/// fields and an optional `method` selector. Every rejection here happens
/// before any staging or remote call, so no records are created.
async fn read_upload(
    mut multipart: Multipart,
    file_field: &str,
    max_files: usize,
) -> Result<(Vec<UploadedFile>, ParsingMethod), AppError> {
    let mut files = Vec::new();
    let mut method = ParsingMethod::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "method" {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Invalid method field: {e}")))?;
            method = ParsingMethod::parse(&text)
                .ok_or_else(|| AppError::Validation(format!("Unknown parsing method '{text}'")))?;
            continue;
        }

        if name != file_field {
            continue;
        }

        let filename = field.file_name().unwrap_or("resume.pdf").to_string();
        let content_type = field.content_type().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read '{filename}': {e}")))?;

        validate_upload(&filename, &content_type, bytes.len())?;

        if files.len() == max_files {
            return Err(AppError::Validation(format!(
                "Too many files (max {max_files})"
            )));
        }

        files.push(UploadedFile {
            filename,
            content_type,
            bytes,
        });
    }

    Ok((files, method))
}

/// Only PDFs within the size cap are accepted.
fn validate_upload(filename: &str, content_type: &str, len: usize) -> Result<(), AppError> {
    if content_type != "application/pdf" {
        return Err(AppError::Validation(
            "Only PDF files are allowed".to_string(),
        ));
    }
    if len == 0 {
        return Err(AppError::Validation(format!("'{filename}' is empty")));
    }
    if len > MAX_FILE_BYTES {
        return Err(AppError::Validation(format!(
            "'{filename}' exceeds the {} MB file size limit",
            MAX_FILE_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload_accepts_pdf_within_limit() {
        assert!(validate_upload("cv.pdf", "application/pdf", 1024).is_ok());
    }

    #[test]
    fn test_validate_upload_rejects_non_pdf() {
        let err = validate_upload("cv.docx", "application/msword", 1024).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_validate_upload_rejects_empty_file() {
        let err = validate_upload("cv.pdf", "application/pdf", 0).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_validate_upload_rejects_oversized_file() {
        let err = validate_upload("cv.pdf", "application/pdf", MAX_FILE_BYTES + 1).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_validate_upload_accepts_file_at_exact_limit() {
        assert!(validate_upload("cv.pdf", "application/pdf", MAX_FILE_BYTES).is_ok());
    }
}
