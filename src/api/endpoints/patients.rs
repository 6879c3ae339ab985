//! Normalized patient listing endpoint.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::dashboard::{list_patient_samples, NormalizedRecord};

const DEFAULT_LIMIT: usize = 100;

#[derive(Deserialize)]
pub struct PatientsQuery {
    #[serde(default)]
    pub only_eligible: bool,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct PatientsResponse {
    pub total: usize,
    pub patients: Vec<NormalizedRecord>,
}

/// `GET /api/patients?only_eligible=&limit=` — normalized rows, highest
/// malignancy score first. The limit is clamped server-side.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<PatientsQuery>,
) -> Result<Json<PatientsResponse>, ApiError> {
    let conn = ctx.open_existing()?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let patients = list_patient_samples(&conn, query.only_eligible, limit)?;
    Ok(Json(PatientsResponse {
        total: patients.len(),
        patients,
    }))
}
