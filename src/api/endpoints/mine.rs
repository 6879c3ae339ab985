//! PDF upload + mining endpoint.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::mining::{process_pdf, MiningOutcome};

#[derive(Serialize)]
pub struct MineResponse {
    pub processed: usize,
    pub failed: usize,
    pub results: Vec<MiningOutcome>,
    pub errors: Vec<FileError>,
}

#[derive(Serialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

/// `POST /api/mine` — multipart upload of one or more PDF reports.
///
/// Each `file` part is mined independently; a report that fails (no text
/// layer, corrupt PDF) lands in `errors` without aborting the batch.
pub async fn upload(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<MineResponse>, ApiError> {
    let conn = ctx.open_or_create()?;

    let mut results = Vec::new();
    let mut errors = Vec::new();
    let mut saw_file = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart payload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        saw_file = true;
        let filename = field.file_name().unwrap_or("laudo.pdf").to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                errors.push(FileError {
                    file: filename,
                    error: format!("failed to read upload: {e}"),
                });
                continue;
            }
        };

        match process_pdf(&conn, &bytes, &filename) {
            Ok(outcome) => results.push(outcome),
            Err(e) => {
                tracing::warn!(file = %filename, error = %e, "report mining failed");
                errors.push(FileError {
                    file: filename,
                    error: e.to_string(),
                });
            }
        }
    }

    if !saw_file {
        return Err(ApiError::BadRequest(
            "no 'file' field in multipart upload".into(),
        ));
    }

    Ok(Json(MineResponse {
        processed: results.len(),
        failed: errors.len(),
        results,
        errors,
    }))
}
