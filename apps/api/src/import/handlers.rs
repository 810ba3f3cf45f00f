//! Axum route handlers for the bulk import API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::handlers::{publish_stats, try_start_batch};
use crate::errors::AppError;
use crate::import::{
    confirm_import, parse_raw_applicants, BulkImportConfirmRequest, BulkImportConfirmResponse,
    BulkImportParseResponse, BulkImportRequest,
};
use crate::state::AppState;
use crate::store;

const MAX_RAW_TEXT_LEN: usize = 100_000;

/// POST /api/import/parse
///
/// Parses pasted text into applicant candidates for review. Persists nothing.
pub async fn parse_import(
    State(state): State<AppState>,
    Json(request): Json<BulkImportRequest>,
) -> Result<Json<BulkImportParseResponse>, AppError> {
    let raw_text = request.raw_text.trim();
    if raw_text.len() < 10 {
        return Err(AppError::Validation(
            "raw_text is too short to contain applicant data".to_string(),
        ));
    }
    if raw_text.len() > MAX_RAW_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "raw_text exceeds the {MAX_RAW_TEXT_LEN} character limit"
        )));
    }

    let job = store::jobs::get(&state.db, request.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", request.job_id)))?;

    let provider = state.providers.current().await?;
    let response = parse_raw_applicants(
        &provider,
        raw_text,
        &job.description,
        request.input_format_hint.as_deref(),
    )
    .await?;

    Ok(Json(response))
}

/// POST /api/import/upload
///
/// Multipart variant: extracts text from an uploaded file (PDF via
/// pdf-extract, anything else treated as UTF-8 text) and runs the same parse.
/// Expects fields `job_id` and `file`, plus optional `format_hint`.
pub async fn upload_import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BulkImportParseResponse>, AppError> {
    let mut job_id: Option<Uuid> = None;
    let mut format_hint: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("job_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid job_id field: {e}")))?;
                job_id = Some(text.trim().parse().map_err(|_| {
                    AppError::Validation(format!("job_id '{text}' is not a valid UUID"))
                })?);
            }
            Some("format_hint") => {
                format_hint = field.text().await.ok().filter(|s| !s.trim().is_empty());
            }
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                file = Some((name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let job_id =
        job_id.ok_or_else(|| AppError::Validation("Missing 'job_id' field".to_string()))?;
    let (file_name, bytes) =
        file.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;

    let job = store::jobs::get(&state.db, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let raw_text = extract_text(&file_name, &bytes)?;
    if raw_text.trim().len() < 10 {
        return Err(AppError::Validation(format!(
            "No usable text could be extracted from '{file_name}'"
        )));
    }
    info!(
        "Extracted {} characters from upload '{file_name}'",
        raw_text.len()
    );

    let provider = state.providers.current().await?;
    let response = parse_raw_applicants(
        &provider,
        raw_text.trim(),
        &job.description,
        format_hint.as_deref(),
    )
    .await?;

    Ok(Json(response))
}

/// POST /api/import/confirm
///
/// The explicit human-reviewed commit step. Optionally kicks off batch
/// analysis of the job afterwards.
pub async fn confirm_import_handler(
    State(state): State<AppState>,
    Json(request): Json<BulkImportConfirmRequest>,
) -> Result<Json<BulkImportConfirmResponse>, AppError> {
    let response = confirm_import(&state.db, state.events.as_ref(), &request).await?;
    publish_stats(&state).await;

    if request.auto_analyze && response.imported_count > 0 {
        if !try_start_batch(&state, request.job_id, false).await? {
            warn!(
                "Skipping auto-analyze: a batch is already running for job {}",
                request.job_id
            );
        }
    }

    Ok(Json(response))
}

/// Uploaded file → text. PDFs go through pdf-extract; everything else is
/// treated as UTF-8 with lossy conversion.
fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String, AppError> {
    let is_pdf = file_name.to_ascii_lowercase().ends_with(".pdf") || bytes.starts_with(b"%PDF");
    if is_pdf {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            AppError::Validation(format!("Could not extract text from PDF '{file_name}': {e}"))
        })
    } else {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_extraction() {
        let text = extract_text("notes.txt", b"Jane Doe, Rust developer").unwrap();
        assert_eq!(text, "Jane Doe, Rust developer");
    }

    #[test]
    fn test_lossy_utf8_does_not_fail() {
        let text = extract_text("notes.txt", &[0x4a, 0x61, 0xff, 0x6e, 0x65]).unwrap();
        assert!(text.contains('J'));
    }
}
