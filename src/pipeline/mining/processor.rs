//! End-to-end mining of a single PDF report: extract text, parse fields,
//! classify, score, and upsert the `patients` row.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::db::repository::upsert_patient;
use crate::models::PatientFinding;
use crate::pipeline::extraction::{extract_full_text, PdfExtractor, PdfTextExtractor};

use super::classify::{infer_location, infer_modality, infer_specialty};
use super::fields::{parse_exam_date, parse_patient_name, parse_same_id};
use super::risk::evaluate_oncology_risk;
use super::MiningError;

/// Persisted full text is capped; reports far beyond this are concatenation
/// artifacts, not exams.
const FULL_TEXT_LIMIT_BYTES: usize = 250_000;

/// Value of the `context` column for rows produced by this pipeline.
const INGEST_CONTEXT: &str = r#"{"source":"miner_api"}"#;

const NO_FINDINGS: &str = "sem achados relevantes";

/// Per-file summary returned to the caller after a successful upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningOutcome {
    pub file: String,
    pub same_id: String,
    pub patient_name: String,
    pub modality: String,
    pub specialty: String,
    pub score: i32,
    pub urgency: String,
    pub eligible: bool,
    pub findings: String,
}

/// Mine one PDF and upsert its row. The default extractor reads the PDF's
/// embedded text layer.
pub fn process_pdf(
    conn: &Connection,
    pdf_bytes: &[u8],
    filename: &str,
) -> Result<MiningOutcome, MiningError> {
    process_with_extractor(conn, &PdfTextExtractor, pdf_bytes, filename)
}

/// Mine one PDF with a caller-supplied extractor (tests inject mocks here).
pub fn process_with_extractor(
    conn: &Connection,
    extractor: &dyn PdfExtractor,
    pdf_bytes: &[u8],
    filename: &str,
) -> Result<MiningOutcome, MiningError> {
    let text = extract_full_text(extractor, pdf_bytes)?;
    let text_upper = text.to_uppercase();

    let same_id = parse_same_id(&text);
    let patient_name = parse_patient_name(&text);
    let exam_date = parse_exam_date(&text);
    let modality = infer_modality(&text_upper);
    let specialty = infer_specialty(&text_upper);
    let location = infer_location(&text_upper);
    let risk = evaluate_oncology_risk(&text);

    let ai_analysis = build_analysis_text(
        modality.as_str(),
        specialty.as_str(),
        risk.score,
        risk.urgency.as_str(),
        &risk.reason,
    );
    let tumor_findings = if risk.terms.is_empty() {
        NO_FINDINGS.to_string()
    } else {
        risk.terms
            .iter()
            .take(10)
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    };

    let finding = PatientFinding {
        same_id: same_id.clone(),
        patient_name: patient_name.clone(),
        last_exam_date: exam_date,
        last_file: filename.to_string(),
        context: INGEST_CONTEXT.to_string(),
        full_text: truncate_to_boundary(&text, FULL_TEXT_LIMIT_BYTES).to_string(),
        ai_analysis,
        ai_model: config::MINER_TAG.to_string(),
        is_eligible: risk.eligible,
        exam_title: filename.to_string(),
        exam_modality: modality,
        medical_specialty: specialty,
        tumor_findings: tumor_findings.clone(),
        tumor_location: location,
        tumor_characteristics: risk.reason.clone(),
        malignancy_score: risk.score,
        urgency_level: risk.urgency,
        urgency_reason: risk.reason,
        created_at: None,
        updated_at: None,
    };
    upsert_patient(conn, &finding)?;

    tracing::info!(
        same_id = %same_id,
        file = %filename,
        score = risk.score,
        urgency = risk.urgency.as_str(),
        "report mined"
    );

    Ok(MiningOutcome {
        file: filename.to_string(),
        same_id,
        patient_name,
        modality: finding.exam_modality.as_str().to_string(),
        specialty: finding.medical_specialty.as_str().to_string(),
        score: risk.score,
        urgency: finding.urgency_level.as_str().to_string(),
        eligible: risk.eligible,
        findings: tumor_findings,
    })
}

/// Markdown-ish summary persisted to `ai_analysis`. The dashboard re-mines
/// this blob when the structured columns are empty, so the field labels are
/// part of the contract.
pub fn build_analysis_text(
    modality: &str,
    specialty: &str,
    score: i32,
    urgency: &str,
    reason: &str,
) -> String {
    let conclusion = if score >= 2 { "ELEGIVEL" } else { "NAO ELEGIVEL" };
    format!(
        "**MODALIDADE DO EXAME**: {modality}\n\
         **ESPECIALIDADE MEDICA**: {specialty}\n\
         **ACHADOS**: Mineracao automatica por regras.\n\
         **ESCORE DE MALIGNIDADE**: {score}\n\
         URGENCIA: {urgency}\n\
         MOTIVO DA URGENCIA: {reason}\n\
         CONCLUSAO: {conclusion}"
    )
}

fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::get_patient;
    use crate::models::{ExamModality, MedicalSpecialty, UrgencyLevel};
    use crate::pipeline::extraction::test_fixtures::make_test_pdf;
    use crate::pipeline::extraction::{ExtractionError, PageExtraction};

    struct BlankExtractor;

    impl PdfExtractor for BlankExtractor {
        fn extract_text(&self, _: &[u8]) -> Result<Vec<PageExtraction>, ExtractionError> {
            Ok(vec![PageExtraction {
                page_number: 1,
                text: "   ".to_string(),
                confidence: 0.0,
            }])
        }

        fn page_count(&self, _: &[u8]) -> Result<usize, ExtractionError> {
            Ok(1)
        }
    }

    struct FixedTextExtractor(&'static str);

    impl PdfExtractor for FixedTextExtractor {
        fn extract_text(&self, _: &[u8]) -> Result<Vec<PageExtraction>, ExtractionError> {
            Ok(vec![PageExtraction {
                page_number: 1,
                text: self.0.to_string(),
                confidence: 0.95,
            }])
        }

        fn page_count(&self, _: &[u8]) -> Result<usize, ExtractionError> {
            Ok(1)
        }
    }

    #[test]
    fn mines_real_pdf_end_to_end() {
        let conn = open_memory_database().unwrap();
        let pdf = make_test_pdf(
            "SAME: 77001, PACIENTE: MARIA DA SILVA, TOMOGRAFIA DO TORAX, NODULO NO PULMAO, 10/02/2024",
        );

        let outcome = process_pdf(&conn, &pdf, "exame_torax.pdf").unwrap();
        assert_eq!(outcome.same_id, "77001");
        assert_eq!(outcome.patient_name, "Maria Da Silva");
        assert_eq!(outcome.modality, "TOMOGRAFIA COMPUTADORIZADA");
        assert_eq!(outcome.specialty, "ONCOLOGIA TORACICA");
        assert_eq!(outcome.score, 2);
        assert!(outcome.eligible);

        let row = get_patient(&conn, "77001").unwrap().unwrap();
        assert_eq!(row.last_file, "exame_torax.pdf");
        assert_eq!(row.last_exam_date, "10/02/2024");
        assert_eq!(row.exam_modality, ExamModality::TomografiaComputadorizada);
        assert_eq!(row.medical_specialty, MedicalSpecialty::Toracica);
        assert_eq!(row.urgency_level, UrgencyLevel::Moderada);
        assert!(row.tumor_location.contains("pulmao"));
        assert_eq!(row.ai_model, config::MINER_TAG);
        assert!(row.ai_analysis.contains("**ESCORE DE MALIGNIDADE**: 2"));
        assert!(row.context.contains("miner_api"));
    }

    #[test]
    fn blank_pdf_is_rejected() {
        let conn = open_memory_database().unwrap();
        let err = process_with_extractor(&conn, &BlankExtractor, b"ignored", "vazio.pdf")
            .unwrap_err();
        assert!(matches!(
            err,
            MiningError::Extraction(ExtractionError::NoTextLayer)
        ));
        assert_eq!(crate::db::repository::count_patients(&conn).unwrap(), 0);
    }

    #[test]
    fn reprocessing_same_id_overwrites_row() {
        let conn = open_memory_database().unwrap();
        let first = FixedTextExtractor("SAME: 55002. Nodulo pulmonar.");
        let second = FixedTextExtractor("SAME: 55002. Carcinoma com metastase, biopsia.");

        process_with_extractor(&conn, &first, b"x", "primeiro.pdf").unwrap();
        process_with_extractor(&conn, &second, b"x", "segundo.pdf").unwrap();

        assert_eq!(crate::db::repository::count_patients(&conn).unwrap(), 1);
        let row = get_patient(&conn, "55002").unwrap().unwrap();
        assert_eq!(row.last_file, "segundo.pdf");
        assert_eq!(row.malignancy_score, 5);
        assert_eq!(row.urgency_level, UrgencyLevel::Critica);
    }

    #[test]
    fn report_without_id_gets_auto_id() {
        let conn = open_memory_database().unwrap();
        let extractor = FixedTextExtractor("Laudo sem identificador. Massa hepatica.");
        let outcome = process_with_extractor(&conn, &extractor, b"x", "laudo.pdf").unwrap();
        assert!(outcome.same_id.starts_with("AUTO-"));
        assert!(get_patient(&conn, &outcome.same_id).unwrap().is_some());
    }

    #[test]
    fn analysis_text_carries_dashboard_labels() {
        let text = build_analysis_text("PET-CT", "ONCOLOGIA TORACICA", 4, "MUITO ALTA", "CARCINOMA");
        assert!(text.contains("**MODALIDADE DO EXAME**: PET-CT"));
        assert!(text.contains("**ESPECIALIDADE MEDICA**: ONCOLOGIA TORACICA"));
        assert!(text.contains("URGENCIA: MUITO ALTA"));
        assert!(text.contains("CONCLUSAO: ELEGIVEL"));

        let not_eligible = build_analysis_text("RADIOLOGIA", "ONCOLOGIA RADIOLOGICA", 1, "BAIXA", "BIOPSIA");
        assert!(not_eligible.contains("CONCLUSAO: NAO ELEGIVEL"));
    }

    #[test]
    fn full_text_truncated_on_char_boundary() {
        assert_eq!(truncate_to_boundary("abcdef", 4), "abcd");
        // "é" is 2 bytes; cutting at byte 1 must back up to the boundary
        assert_eq!(truncate_to_boundary("é", 1), "");
        assert_eq!(truncate_to_boundary("abc", 10), "abc");
    }
}
