//! Dashboard aggregation endpoint.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::dashboard::{build_dashboard, DashboardData};

#[derive(Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub only_eligible: bool,
}

/// `GET /api/dashboard?only_eligible=` — summary metrics plus every chart
/// dataset in one response.
pub async fn summary(
    State(ctx): State<ApiContext>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardData>, ApiError> {
    let conn = ctx.open_existing()?;
    let data = build_dashboard(&conn, query.only_eligible)?;
    Ok(Json(data))
}
