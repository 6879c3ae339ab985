//! Keyword classification of exam modality, medical specialty and tumor
//! location. All functions take the report text already uppercased.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ExamModality, MedicalSpecialty};

static RM_ABBREV: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bRM\b").expect("invalid RM pattern"));
static TC_ABBREV: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bTC\b").expect("invalid TC pattern"));

/// Ordered (token, label) table for tumor location detection.
const LOCATIONS: [(&str, &str); 8] = [
    ("PULMAO", "pulmao"),
    ("MAMA", "mama"),
    ("FIGADO", "figado"),
    ("PROSTATA", "prostata"),
    ("RIM", "rim"),
    ("PANCREAS", "pancreas"),
    ("CEREBRO", "cerebro"),
    ("OSSO", "osso"),
];

pub fn infer_modality(text_upper: &str) -> ExamModality {
    if text_upper.contains("RESSON") || RM_ABBREV.is_match(text_upper) {
        return ExamModality::RessonanciaMagnetica;
    }
    if text_upper.contains("TOMOGRAF") || TC_ABBREV.is_match(text_upper) {
        return ExamModality::TomografiaComputadorizada;
    }
    if text_upper.contains("PET") {
        return ExamModality::PetCt;
    }
    if text_upper.contains("MAMOGRAF") {
        return ExamModality::Mamografia;
    }
    ExamModality::Radiologia
}

pub fn infer_specialty(text_upper: &str) -> MedicalSpecialty {
    if ["MAMA", "MAMARIO", "BIRADS"].iter().any(|t| text_upper.contains(t)) {
        return MedicalSpecialty::Mamaria;
    }
    if ["PULMAO", "TORAX", "NODULO PULMONAR"].iter().any(|t| text_upper.contains(t)) {
        return MedicalSpecialty::Toracica;
    }
    if ["FIGADO", "HEPATIC", "LIRADS"].iter().any(|t| text_upper.contains(t)) {
        return MedicalSpecialty::Abdominal;
    }
    if ["PROSTATA", "PIRADS"].iter().any(|t| text_upper.contains(t)) {
        return MedicalSpecialty::Urologica;
    }
    if ["CEREBRO", "ENCEFALO", "CRANIO"].iter().any(|t| text_upper.contains(t)) {
        return MedicalSpecialty::Neuro;
    }
    MedicalSpecialty::Radiologica
}

/// Comma-joined location labels, table order. "nao especificado" when no
/// token matches.
pub fn infer_location(text_upper: &str) -> String {
    let found: Vec<&str> = LOCATIONS
        .iter()
        .filter(|(token, _)| text_upper.contains(token))
        .map(|(_, label)| *label)
        .collect();
    if found.is_empty() {
        "nao especificado".to_string()
    } else {
        found.join(", ")
    }
}
