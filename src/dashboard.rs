//! Dashboard aggregation over the `patients` table.
//!
//! Rows are normalized first (structured column wins, `ai_analysis` blob as
//! fallback, see `normalize`), then rolled up into the summary metrics and
//! chart datasets the dashboard page renders. Rows whose `setor` mentions
//! auditoria are internal review copies and never shown.

use std::collections::HashMap;

use rusqlite::types::Value;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;
use crate::models::UrgencyLevel;
use crate::normalize::{
    ascii_fold, extract_malignancy_score, extract_modality, extract_specialty, extract_urgency,
    is_empty_like, is_true_value, normalize_text, normalize_urgency,
};

/// Chart categories are capped to the busiest entries.
const TOP_CATEGORIES: usize = 8;

/// Hard ceiling on sample rows returned by the patients listing.
pub const MAX_SAMPLE_ROWS: usize = 500;

/// One `patients` row after column/annotation reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub same_id: String,
    pub patient_name: String,
    pub convenio: String,
    pub setor: String,
    pub exam_modality: String,
    pub medical_specialty: String,
    pub urgency_level: String,
    /// None when neither the column nor the annotation blob carries a score.
    pub malignancy_score: Option<i32>,
    pub is_eligible: bool,
    pub last_exam_date: String,
    pub last_file: String,
    pub tumor_findings: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_patients: usize,
    pub total_eligible: usize,
    pub eligible_rate: f64,
    pub avg_score: f64,
    pub high_risk: usize,
    pub visible_records: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountEntry {
    pub label: String,
    pub count: usize,
}

/// Urgency counts of one convenio, for the stacked chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvenioUrgency {
    pub convenio: String,
    pub levels: Vec<CountEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    pub summary: DashboardSummary,
    pub by_urgency: Vec<CountEntry>,
    pub by_specialty: Vec<CountEntry>,
    pub by_modality: Vec<CountEntry>,
    pub by_convenio: Vec<CountEntry>,
    pub by_setor: Vec<CountEntry>,
    pub urgency_by_convenio: Vec<ConvenioUrgency>,
}

/// Load and normalize every visible row. Auditoria rows are dropped here so
/// every consumer (charts, samples, CSV export) sees the same population.
pub fn fetch_normalized_records(conn: &Connection) -> Result<Vec<NormalizedRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT same_id, patient_name, convenio, setor, exam_modality,
                medical_specialty, urgency_level, malignancy_score, is_eligible,
                last_exam_date, last_file, tumor_findings, ai_analysis
         FROM patients
         ORDER BY malignancy_score DESC, updated_at DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<i64>>(7)?,
            row.get::<_, Value>(8)?,
            row.get::<_, Option<String>>(9)?,
            row.get::<_, Option<String>>(10)?,
            row.get::<_, Option<String>>(11)?,
            row.get::<_, Option<String>>(12)?,
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (
            same_id,
            patient_name,
            convenio,
            setor,
            modality_col,
            specialty_col,
            urgency_col,
            score_col,
            eligible_val,
            last_exam_date,
            last_file,
            tumor_findings,
            ai_analysis,
        ) = row?;

        let setor = normalize_text(&setor.unwrap_or_default());
        if ascii_fold(&setor).to_uppercase().contains("AUDITORIA") {
            continue;
        }

        let analysis = ai_analysis.unwrap_or_default();

        let exam_modality = column_or_mined(modality_col, || extract_modality(&analysis));
        let medical_specialty = column_or_mined(specialty_col, || extract_specialty(&analysis));

        // Rows with no urgency at all keep an empty level; the chart
        // builders drop those instead of inventing a BAIXA.
        let urgency_raw = column_or_mined(urgency_col, || extract_urgency(&analysis));
        let urgency_level = normalize_urgency(&urgency_raw);

        let malignancy_score = match score_col {
            Some(s) => Some(s as i32),
            None => extract_malignancy_score(&analysis),
        };

        records.push(NormalizedRecord {
            same_id: same_id.unwrap_or_default(),
            patient_name: normalize_text(&patient_name.unwrap_or_default()),
            convenio: normalize_text(&convenio.unwrap_or_default()),
            setor,
            exam_modality,
            medical_specialty,
            urgency_level,
            malignancy_score,
            is_eligible: is_true_value(&eligible_val),
            last_exam_date: normalize_text(&last_exam_date.unwrap_or_default()),
            last_file: normalize_text(&last_file.unwrap_or_default()),
            tumor_findings: normalize_text(&tumor_findings.unwrap_or_default()),
        });
    }
    Ok(records)
}

fn column_or_mined<F>(column: Option<String>, mine: F) -> String
where
    F: FnOnce() -> Option<String>,
{
    let value = normalize_text(&column.unwrap_or_default());
    if !is_empty_like(&value) {
        return value;
    }
    mine().unwrap_or_default()
}

/// All dashboard datasets in one pass. `only_eligible` narrows the charts
/// and per-view metrics; the total/eligible counters always cover every
/// visible row.
pub fn build_dashboard(
    conn: &Connection,
    only_eligible: bool,
) -> Result<DashboardData, DatabaseError> {
    let all = fetch_normalized_records(conn)?;

    let total_patients = all.len();
    let total_eligible = all.iter().filter(|r| r.is_eligible).count();
    let eligible_rate = if total_patients == 0 {
        0.0
    } else {
        round1(total_eligible as f64 / total_patients as f64 * 100.0)
    };

    let visible: Vec<&NormalizedRecord> = all
        .iter()
        .filter(|r| !only_eligible || r.is_eligible)
        .collect();

    // Mean over the rows that actually carry a score; score-less rows from
    // replaced database files must not drag the metric down.
    let scored: Vec<i32> = visible.iter().filter_map(|r| r.malignancy_score).collect();
    let avg_score = if scored.is_empty() {
        0.0
    } else {
        round1(scored.iter().sum::<i32>() as f64 / scored.len() as f64)
    };
    let high_risk = visible
        .iter()
        .filter(|r| r.malignancy_score.is_some_and(|s| s >= 4))
        .count();

    let summary = DashboardSummary {
        total_patients,
        total_eligible,
        eligible_rate,
        avg_score,
        high_risk,
        visible_records: visible.len(),
    };

    Ok(DashboardData {
        summary,
        by_urgency: count_urgency(visible.iter().map(|r| r.urgency_level.as_str())),
        by_specialty: count_top(
            visible.iter().map(|r| r.medical_specialty.as_str()),
            Some(TOP_CATEGORIES),
        ),
        by_modality: count_top(
            visible.iter().map(|r| r.exam_modality.as_str()),
            Some(TOP_CATEGORIES),
        ),
        by_convenio: count_top(
            visible.iter().map(|r| r.convenio.as_str()),
            Some(TOP_CATEGORIES),
        ),
        by_setor: count_top(
            visible.iter().map(|r| r.setor.as_str()),
            Some(TOP_CATEGORIES),
        ),
        urgency_by_convenio: cross_tab_convenio(&visible),
    })
}

/// Normalized sample rows for the listing endpoint, highest score first (the
/// fetch already orders that way). `limit` is clamped to [`MAX_SAMPLE_ROWS`].
pub fn list_patient_samples(
    conn: &Connection,
    only_eligible: bool,
    limit: usize,
) -> Result<Vec<NormalizedRecord>, DatabaseError> {
    let records = fetch_normalized_records(conn)?;
    Ok(records
        .into_iter()
        .filter(|r| !only_eligible || r.is_eligible)
        .take(limit.min(MAX_SAMPLE_ROWS))
        .collect())
}

/// Count non-empty labels, busiest first; ties break alphabetically so the
/// charts are stable across reloads.
fn count_top<'a, I>(labels: I, cap: Option<usize>) -> Vec<CountEntry>
where
    I: Iterator<Item = &'a str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in labels {
        if is_empty_like(label) {
            continue;
        }
        *counts.entry(label.to_string()).or_default() += 1;
    }
    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(label, count)| CountEntry { label, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.label.cmp(&b.label)));
    if let Some(cap) = cap {
        entries.truncate(cap);
    }
    entries
}

/// Urgency counts in severity order (CRITICA first), zero levels dropped.
/// Off-scale values from replaced database files are appended after the
/// known levels.
fn count_urgency<'a, I>(levels: I) -> Vec<CountEntry>
where
    I: Iterator<Item = &'a str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for level in levels {
        if is_empty_like(level) {
            continue;
        }
        *counts.entry(level.to_string()).or_default() += 1;
    }

    let mut entries = Vec::new();
    for level in UrgencyLevel::ORDERED {
        if let Some(count) = counts.remove(level.as_str()) {
            entries.push(CountEntry {
                label: level.as_str().to_string(),
                count,
            });
        }
    }
    let mut leftover: Vec<CountEntry> = counts
        .into_iter()
        .map(|(label, count)| CountEntry { label, count })
        .collect();
    leftover.sort_by(|a, b| b.count.cmp(&a.count).then(a.label.cmp(&b.label)));
    entries.extend(leftover);
    entries
}

/// Urgency breakdown per convenio, limited to the top convenios by volume.
fn cross_tab_convenio(records: &[&NormalizedRecord]) -> Vec<ConvenioUrgency> {
    let top: Vec<String> = count_top(
        records.iter().map(|r| r.convenio.as_str()),
        Some(TOP_CATEGORIES),
    )
    .into_iter()
    .map(|e| e.label)
    .collect();

    top.into_iter()
        .map(|convenio| {
            let levels = count_urgency(
                records
                    .iter()
                    .filter(|r| r.convenio == convenio)
                    .map(|r| r.urgency_level.as_str()),
            );
            ConvenioUrgency { convenio, levels }
        })
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
