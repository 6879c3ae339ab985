//! Read-path normalization for dashboard rows.
//!
//! Structured columns win; when a column is empty the value is re-mined
//! from the `ai_analysis` annotation blob (whose field labels are written by
//! `pipeline::mining::build_analysis_text`, but historical rows carry
//! accented variants from earlier site tooling, hence the ascii folding).

use std::sync::LazyLock;

use regex::Regex;
use rusqlite::types::Value;

static SPECIALTY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\*\*ESPECIALIDADE\s+MEDICA\*\*:?\s*([^\n*]+)",
        r"(?i)ESPECIALIDADE\s+MEDICA:\s*([^\n]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid specialty pattern"))
    .collect()
});

static MODALITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\*\*MODALIDADE\s+DO\s+EXAME\*\*:?\s*([^\n*]+)",
        r"(?i)MODALIDADE\s+DO\s+EXAME:\s*([^\n]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid modality pattern"))
    .collect()
});

static URGENCY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)URGENCIA:\s*(CRITICA|MUITO ALTA|ALTA|MODERADA|BAIXA)")
        .expect("invalid urgency pattern")
});

static SCORE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)ESCORE DE MALIGNIDADE:\s*([0-5])",
        r"(?i)MALIGNANCY SCORE:\s*([0-5])",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid score pattern"))
    .collect()
});

/// Trim; never None — empty string is the "missing" sentinel, as in the
/// database itself.
pub fn normalize_text(value: &str) -> String {
    value.trim().to_string()
}

/// Strip accents from the Latin ranges that occur in Portuguese reports and
/// drop combining diacritical marks. Everything else passes through.
pub fn ascii_fold(value: &str) -> String {
    value
        .chars()
        .filter_map(|c| match c {
            '\u{0300}'..='\u{036f}' => None,
            'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => Some('a'),
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => Some('A'),
            'é' | 'è' | 'ê' | 'ë' => Some('e'),
            'É' | 'È' | 'Ê' | 'Ë' => Some('E'),
            'í' | 'ì' | 'î' | 'ï' => Some('i'),
            'Í' | 'Ì' | 'Î' | 'Ï' => Some('I'),
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => Some('o'),
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => Some('O'),
            'ú' | 'ù' | 'û' | 'ü' => Some('u'),
            'Ú' | 'Ù' | 'Û' | 'Ü' => Some('U'),
            'ç' => Some('c'),
            'Ç' => Some('C'),
            'ñ' => Some('n'),
            'Ñ' => Some('N'),
            'ý' | 'ÿ' => Some('y'),
            'Ý' => Some('Y'),
            other => Some(other),
        })
        .collect()
}

/// Truthiness of the `is_eligible` column across the value shapes found in
/// replaced database files (INTEGER from the miner, TEXT from older tooling).
pub fn is_true_value(value: &Value) -> bool {
    match value {
        Value::Integer(i) => *i == 1,
        Value::Real(f) => *f as i64 == 1,
        Value::Text(s) => {
            let t = s.trim().to_lowercase();
            matches!(t.as_str(), "1" | "true" | "t" | "yes" | "y" | "sim")
        }
        _ => false,
    }
}

/// Values that should be skipped when counting a category column.
pub fn is_empty_like(value: &str) -> bool {
    let t = value.trim();
    t.is_empty() || matches!(t.to_uppercase().as_str(), "NULL" | "NONE" | "N/A")
}

pub fn extract_specialty(analysis: &str) -> Option<String> {
    extract_first(&SPECIALTY_PATTERNS, analysis)
}

pub fn extract_modality(analysis: &str) -> Option<String> {
    extract_first(&MODALITY_PATTERNS, analysis)
}

fn extract_first(patterns: &[Regex], analysis: &str) -> Option<String> {
    if analysis.is_empty() {
        return None;
    }
    let folded = ascii_fold(analysis);
    for pattern in patterns {
        if let Some(caps) = pattern.captures(&folded) {
            let value = normalize_text(&caps[1]);
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Mine `URGENCIA: <level>` out of the annotation blob.
pub fn extract_urgency(analysis: &str) -> Option<String> {
    if analysis.is_empty() {
        return None;
    }
    let folded = ascii_fold(analysis);
    URGENCY_PATTERN
        .captures(&folded)
        .map(|caps| normalize_urgency(&caps[1]))
}

/// Mine the 0–5 malignancy score out of the annotation blob.
pub fn extract_malignancy_score(analysis: &str) -> Option<i32> {
    if analysis.is_empty() {
        return None;
    }
    let folded = ascii_fold(analysis);
    for pattern in SCORE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&folded) {
            return caps[1].parse().ok();
        }
    }
    None
}

/// Fold and uppercase an urgency value. Unknown values pass through folded,
/// so charts can still group them without inventing levels.
pub fn normalize_urgency(value: &str) -> String {
    ascii_fold(value).trim().to_uppercase()
}
