//! Weighted keyword scoring of oncology risk.
//!
//! A fixed term→weight table is scanned against the uppercased report text;
//! the summed weight maps onto a 0–5 malignancy score and one of five
//! urgency levels. Table order is meaningful: matched terms are reported in
//! this order in `tumor_findings` and the urgency reason.

use crate::models::UrgencyLevel;

/// Term weights. Substring match against the uppercased report, so "MALIGN"
/// also covers MALIGNA/MALIGNIDADE.
const WEIGHTED_TERMS: [(&str, u32); 17] = [
    ("METASTASE", 4),
    ("METASTATICO", 4),
    ("CARCINOMA", 4),
    ("ADENOCARCINOMA", 4),
    ("LINFOMA", 4),
    ("NEOPLASIA", 3),
    ("MALIGN", 3),
    ("NODULO", 2),
    ("MASSA", 2),
    ("LESAO", 2),
    ("BIRADS 4", 2),
    ("BIRADS 5", 3),
    ("PIRADS 4", 2),
    ("PIRADS 5", 3),
    ("LIRADS 4", 2),
    ("LIRADS 5", 3),
    ("BIOPSIA", 1),
];

/// Reason string when nothing in the table matched.
pub const NO_RELEVANT_TERMS: &str = "sem termos oncologicos relevantes";

/// Outcome of the risk scoring pass.
#[derive(Debug, Clone)]
pub struct RiskAssessment {
    pub score: i32,
    pub urgency: UrgencyLevel,
    pub eligible: bool,
    pub reason: String,
    pub terms: Vec<&'static str>,
}

/// Single pass over the report: collect matched terms, sum weights, map to
/// score/urgency. Eligibility is score >= 2.
pub fn evaluate_oncology_risk(text: &str) -> RiskAssessment {
    let text_upper = text.to_uppercase();

    let mut terms = Vec::new();
    let mut total_weight = 0u32;
    for (term, weight) in WEIGHTED_TERMS {
        if text_upper.contains(term) {
            terms.push(term);
            total_weight += weight;
        }
    }

    let (score, urgency) = match total_weight {
        w if w >= 9 => (5, UrgencyLevel::Critica),
        w if w >= 6 => (4, UrgencyLevel::MuitoAlta),
        w if w >= 4 => (3, UrgencyLevel::Alta),
        w if w >= 2 => (2, UrgencyLevel::Moderada),
        w if w >= 1 => (1, UrgencyLevel::Baixa),
        _ => (0, UrgencyLevel::Baixa),
    };

    let reason = if terms.is_empty() {
        NO_RELEVANT_TERMS.to_string()
    } else {
        terms
            .iter()
            .take(8)
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    };

    RiskAssessment {
        score,
        urgency,
        eligible: score >= 2,
        reason,
        terms,
    }
}
