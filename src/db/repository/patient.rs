use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{ExamModality, MedicalSpecialty, PatientFinding, UrgencyLevel};

/// Insert or overwrite the row for `finding.same_id`.
///
/// Re-processing an id replaces every derived field; the `updated_at`
/// trigger refreshes the timestamp on the UPDATE path. `created_at` and the
/// externally-maintained columns (convenio, setor, ...) are left alone.
pub fn upsert_patient(conn: &Connection, finding: &PatientFinding) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (
            same_id, patient_name, last_exam_date, last_file, context,
            full_text, ai_analysis, ai_model, is_eligible, exam_title,
            exam_modality, medical_specialty, tumor_findings, tumor_location,
            tumor_characteristics, malignancy_score, urgency_level, urgency_reason
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        ON CONFLICT(same_id) DO UPDATE SET
            patient_name = excluded.patient_name,
            last_exam_date = excluded.last_exam_date,
            last_file = excluded.last_file,
            context = excluded.context,
            full_text = excluded.full_text,
            ai_analysis = excluded.ai_analysis,
            ai_model = excluded.ai_model,
            is_eligible = excluded.is_eligible,
            exam_title = excluded.exam_title,
            exam_modality = excluded.exam_modality,
            medical_specialty = excluded.medical_specialty,
            tumor_findings = excluded.tumor_findings,
            tumor_location = excluded.tumor_location,
            tumor_characteristics = excluded.tumor_characteristics,
            malignancy_score = excluded.malignancy_score,
            urgency_level = excluded.urgency_level,
            urgency_reason = excluded.urgency_reason,
            updated_at = CURRENT_TIMESTAMP",
        params![
            finding.same_id,
            finding.patient_name,
            finding.last_exam_date,
            finding.last_file,
            finding.context,
            finding.full_text,
            finding.ai_analysis,
            finding.ai_model,
            finding.is_eligible as i32,
            finding.exam_title,
            finding.exam_modality.as_str(),
            finding.medical_specialty.as_str(),
            finding.tumor_findings,
            finding.tumor_location,
            finding.tumor_characteristics,
            finding.malignancy_score,
            finding.urgency_level.as_str(),
            finding.urgency_reason,
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, same_id: &str) -> Result<Option<PatientFinding>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT same_id, patient_name, last_exam_date, last_file, context,
         full_text, ai_analysis, ai_model, is_eligible, exam_title,
         exam_modality, medical_specialty, tumor_findings, tumor_location,
         tumor_characteristics, malignancy_score, urgency_level, urgency_reason,
         created_at, updated_at
         FROM patients WHERE same_id = ?1",
    )?;

    let result = stmt.query_row(params![same_id], |row| {
        Ok(PatientRow {
            same_id: row.get(0)?,
            patient_name: row.get::<_, Option<String>>(1)?,
            last_exam_date: row.get::<_, Option<String>>(2)?,
            last_file: row.get::<_, Option<String>>(3)?,
            context: row.get::<_, Option<String>>(4)?,
            full_text: row.get::<_, Option<String>>(5)?,
            ai_analysis: row.get::<_, Option<String>>(6)?,
            ai_model: row.get::<_, Option<String>>(7)?,
            is_eligible: row.get::<_, Option<i32>>(8)?,
            exam_title: row.get::<_, Option<String>>(9)?,
            exam_modality: row.get::<_, Option<String>>(10)?,
            medical_specialty: row.get::<_, Option<String>>(11)?,
            tumor_findings: row.get::<_, Option<String>>(12)?,
            tumor_location: row.get::<_, Option<String>>(13)?,
            tumor_characteristics: row.get::<_, Option<String>>(14)?,
            malignancy_score: row.get::<_, Option<i32>>(15)?,
            urgency_level: row.get::<_, Option<String>>(16)?,
            urgency_reason: row.get::<_, Option<String>>(17)?,
            created_at: row.get::<_, Option<String>>(18)?,
            updated_at: row.get::<_, Option<String>>(19)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(patient_from_row(row))),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn count_patients(conn: &Connection) -> Result<u32, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count)
}

// Internal row type for PatientFinding mapping. Every non-key column is
// nullable in the schema (rows can originate from other site tooling).
struct PatientRow {
    same_id: String,
    patient_name: Option<String>,
    last_exam_date: Option<String>,
    last_file: Option<String>,
    context: Option<String>,
    full_text: Option<String>,
    ai_analysis: Option<String>,
    ai_model: Option<String>,
    is_eligible: Option<i32>,
    exam_title: Option<String>,
    exam_modality: Option<String>,
    medical_specialty: Option<String>,
    tumor_findings: Option<String>,
    tumor_location: Option<String>,
    tumor_characteristics: Option<String>,
    malignancy_score: Option<i32>,
    urgency_level: Option<String>,
    urgency_reason: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

fn patient_from_row(row: PatientRow) -> PatientFinding {
    let exam_modality = row
        .exam_modality
        .as_deref()
        .and_then(|s| ExamModality::from_str(s).ok())
        .unwrap_or(ExamModality::Radiologia);
    let medical_specialty = row
        .medical_specialty
        .as_deref()
        .and_then(|s| MedicalSpecialty::from_str(s).ok())
        .unwrap_or(MedicalSpecialty::Radiologica);
    let urgency_level = row
        .urgency_level
        .as_deref()
        .and_then(|s| UrgencyLevel::from_str(s).ok())
        .unwrap_or(UrgencyLevel::Baixa);

    PatientFinding {
        same_id: row.same_id,
        patient_name: row.patient_name.unwrap_or_default(),
        last_exam_date: row.last_exam_date.unwrap_or_default(),
        last_file: row.last_file.unwrap_or_default(),
        context: row.context.unwrap_or_default(),
        full_text: row.full_text.unwrap_or_default(),
        ai_analysis: row.ai_analysis.unwrap_or_default(),
        ai_model: row.ai_model.unwrap_or_default(),
        is_eligible: row.is_eligible.unwrap_or(0) != 0,
        exam_title: row.exam_title.unwrap_or_default(),
        exam_modality,
        medical_specialty,
        tumor_findings: row.tumor_findings.unwrap_or_default(),
        tumor_location: row.tumor_location.unwrap_or_default(),
        tumor_characteristics: row.tumor_characteristics.unwrap_or_default(),
        malignancy_score: row.malignancy_score.unwrap_or(0),
        urgency_level,
        urgency_reason: row.urgency_reason.unwrap_or_default(),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}
