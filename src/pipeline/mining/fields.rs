//! Regex field parsers for the semi-structured header of exam reports.
//!
//! Reports are scanned PDFs re-exported with a text layer; the header lines
//! (SAME id, patient name, exam date) follow a handful of site formats.
//! Every parser has a deterministic fallback so mining never fails on a
//! report with a mangled header.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

static SAME_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bSAME\s*[:\-]?\s*([A-Z0-9]{4,})",
        r"(?i)\bID\s*PACIENTE\s*[:\-]?\s*([A-Z0-9]{4,})",
        r"(?i)\bPRONTUARIO\s*[:\-]?\s*([A-Z0-9]{4,})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid same_id pattern"))
    .collect()
});

static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)PACIENTE\s*[:\-]\s*([A-Za-z\s]{6,})",
        r"(?i)NOME\s*[:\-]\s*([A-Za-z\s]{6,})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid name pattern"))
    .collect()
});

static EXAM_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{2}[/\-]\d{2}[/\-]\d{4})\b").expect("invalid date pattern"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("invalid ws pattern"));

/// Fallback patient name when no header line matches.
pub const UNIDENTIFIED_PATIENT: &str = "Paciente nao identificado";

/// Parse the site-assigned SAME identifier. Reports without one get a
/// generated `AUTO-` id, which means re-mining the same file creates a new
/// row.
pub fn parse_same_id(text: &str) -> String {
    for pattern in SAME_ID_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            return caps[1].trim().to_string();
        }
    }
    let hex: String = Uuid::new_v4().simple().to_string();
    format!("AUTO-{}", hex[..12].to_uppercase())
}

/// Parse the patient name from a PACIENTE/NOME header line, collapsed and
/// title-cased.
pub fn parse_patient_name(text: &str) -> String {
    for pattern in NAME_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let collapsed = WHITESPACE.replace_all(&caps[1], " ");
            let name = collapsed.trim_matches(|c| c == ' ' || c == '-' || c == ':');
            if name.len() >= 3 {
                return title_case(name);
            }
        }
    }
    UNIDENTIFIED_PATIENT.to_string()
}

/// First dd/mm/yyyy-looking date in the report; today (UTC) when absent.
pub fn parse_exam_date(text: &str) -> String {
    match EXAM_DATE.captures(text) {
        Some(caps) => caps[1].to_string(),
        None => Utc::now().format("%d/%m/%Y").to_string(),
    }
}

fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
