//! Database file replacement endpoint.

use std::io::Write;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::{self, validate_patients_table};

#[derive(Serialize)]
pub struct ReplaceResponse {
    pub status: &'static str,
    pub patients: u32,
}

/// `POST /api/database` — replace the whole database with an uploaded
/// SQLite file.
///
/// The upload is staged to a temp file next to the live database and
/// validated before an atomic rename; a rejected upload leaves the current
/// database untouched.
pub async fn replace(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<ReplaceResponse>, ApiError> {
    let mut uploaded: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart payload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
        uploaded = Some(bytes.to_vec());
    }

    let bytes = uploaded.ok_or_else(|| ApiError::BadRequest("no 'file' field in multipart upload".into()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("uploaded database file is empty".into()));
    }

    let dir = ctx
        .db_path
        .parent()
        .ok_or_else(|| ApiError::Internal("database path has no parent directory".into()))?;
    std::fs::create_dir_all(dir)?;

    // Stage in the same directory so the final persist is a rename, not a
    // cross-device copy.
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(&bytes)?;
    staged.flush()?;

    // Any failure here (not SQLite at all, or missing table) rejects the
    // upload before it can touch the live file.
    validate_patients_table(staged.path())
        .map_err(|e| ApiError::BadRequest(format!("invalid database upload: {e}")))?;

    staged
        .persist(ctx.db_path.as_ref())
        .map_err(|e| ApiError::Internal(format!("failed to replace database: {e}")))?;

    let conn = db::open_database_readonly_schema(&ctx.db_path)?;
    let patients = db::repository::count_patients(&conn)?;

    tracing::info!(patients, path = %ctx.db_path.display(), "database replaced");

    Ok(Json(ReplaceResponse {
        status: "replaced",
        patients,
    }))
}
