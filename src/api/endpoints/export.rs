//! CSV export of the normalized patient view.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::dashboard::{fetch_normalized_records, NormalizedRecord};

const CSV_HEADER: &str = "same_id,patient_name,convenio,setor,exam_modality,\
medical_specialty,urgency_level,malignancy_score,is_eligible,last_exam_date,\
last_file,tumor_findings";

/// `GET /api/export.csv` — every visible row as a CSV attachment.
pub async fn download(State(ctx): State<ApiContext>) -> Result<Response, ApiError> {
    let conn = ctx.open_existing()?;
    let records = fetch_normalized_records(&conn)?;
    let csv = render_csv(&records);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"pacientes_oncologia.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

fn render_csv(records: &[NormalizedRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push_str("\r\n");
    for r in records {
        // Score-less rows export an empty cell, not a fabricated 0
        let score = r.malignancy_score.map_or(String::new(), |s| s.to_string());
        let fields = [
            r.same_id.as_str(),
            r.patient_name.as_str(),
            r.convenio.as_str(),
            r.setor.as_str(),
            r.exam_modality.as_str(),
            r.medical_specialty.as_str(),
            r.urgency_level.as_str(),
            score.as_str(),
            if r.is_eligible { "1" } else { "0" },
            r.last_exam_date.as_str(),
            r.last_file.as_str(),
            r.tumor_findings.as_str(),
        ]
        .map(csv_field);
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }
    out
}

/// RFC 4180 quoting: quote when the value carries a comma, quote, or line
/// break; embedded quotes are doubled.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
