use serde::{Deserialize, Serialize};

use super::enums::{ExamModality, MedicalSpecialty, UrgencyLevel};

/// One mined exam record, keyed by the site-assigned `same_id`.
///
/// The miner writes every derived field on each (re)processing; `convenio`,
/// `setor` and the demographic columns are maintained by other site tooling
/// and only surface on the dashboard read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientFinding {
    pub same_id: String,
    pub patient_name: String,
    pub last_exam_date: String,
    pub last_file: String,
    pub context: String,
    pub full_text: String,
    pub ai_analysis: String,
    pub ai_model: String,
    pub is_eligible: bool,
    pub exam_title: String,
    pub exam_modality: ExamModality,
    pub medical_specialty: MedicalSpecialty,
    pub tumor_findings: String,
    pub tumor_location: String,
    pub tumor_characteristics: String,
    pub malignancy_score: i32,
    pub urgency_level: UrgencyLevel,
    pub urgency_reason: String,
    /// DB-managed; None until the row has been read back.
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
