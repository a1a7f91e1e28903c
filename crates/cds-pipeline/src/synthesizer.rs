//! Scenario synthesizer.
//!
//! Builds scenario records from classified decision statements, guided by the
//! resolved coverage policy. Statements are ranked per category by a
//! deterministic specificity score and the top candidates are synthesized,
//! clamped to the category tier's bounds.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use cds_types::policy::CoveragePolicy;
use cds_types::{
    ApplyReadiness, CdsCategory, ClassificationResult, DecisionStatement, EvidenceAnchor,
    GenerationMode, ScenarioId, ScenarioRecord, ScenarioStatus,
};

fn numeric_threshold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:\u{2265}|\u{2264}|>=|<=|>|<|=)\s*\d|\d+(?:\.\d+)?\s*(?:mmhg|mg|g|mcg|mmol|ml|kg|%|bpm|units?)\b",
        )
        .expect("valid built-in regex")
    })
}

fn named_entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b\w+(?:pril|sartan|olol|statin|formin|azole|cillin|mycin|prazole|parin|zide)\b|\b(?:diabetes|hypertension|asthma|copd|pneumonia|sepsis|stroke|embolism|fibrillation|nephropathy|retinopathy|heart failure|kidney disease)\b",
        )
        .expect("valid built-in regex")
    })
}

fn timing_window_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:within|after|every|for)\s+\d+\s*(?:minutes?|hours?|days?|weeks?|months?|years?)\b|\b(?:annually|daily|weekly|monthly|immediately)\b",
        )
        .expect("valid built-in regex")
    })
}

/// Returns true if the statement carries an explicit numeric threshold.
pub fn has_numeric_threshold(statement: &DecisionStatement) -> bool {
    numeric_threshold_re().is_match(&statement.condition_text)
        || numeric_threshold_re().is_match(&statement.action_text)
}

/// Deterministic specificity score in `[0, 1]`.
///
/// Richer statements rank higher: explicit numeric thresholds, named
/// conditions or medications, and explicit timing windows each contribute,
/// plus a small length component.
pub fn specificity_score(statement: &DecisionStatement) -> f64 {
    let text = format!("{} {}", statement.condition_text, statement.action_text);

    let mut score = 0.1;
    if numeric_threshold_re().is_match(&text) {
        score += 0.35;
    }
    if named_entity_re().is_match(&text) {
        score += 0.25;
    }
    if timing_window_re().is_match(&text) {
        score += 0.2;
    }

    let tokens = text.split_whitespace().count().min(20);
    score += 0.1 * (tokens as f64 / 20.0);

    score
}

/// The scenario records and skip notes produced by one synthesis pass.
#[derive(Debug, Clone, Default)]
pub struct SynthesisOutcome {
    /// Synthesized scenario records.
    pub records: Vec<ScenarioRecord>,
    /// Categories deliberately skipped because their tier resolved to `none`.
    pub skipped_categories: Vec<CdsCategory>,
}

/// Synthesizes scenario records for one generation mode.
///
/// For each category present in the classified set, statements meeting the
/// tier's quality threshold are ranked and the top candidates up to the
/// tier's `max_per_category` are synthesized. Categories with the `none`
/// tier synthesize nothing and are recorded as intentionally skipped, not as
/// a gap. `next_id` supplies monotonic scenario ids for the run.
pub fn synthesize(
    classified: &[(DecisionStatement, ClassificationResult)],
    policy: &CoveragePolicy,
    mode: GenerationMode,
    next_id: &mut ScenarioId,
) -> SynthesisOutcome {
    let mut by_category: BTreeMap<CdsCategory, Vec<&DecisionStatement>> = BTreeMap::new();
    for (statement, classification) in classified {
        for category in &classification.categories {
            by_category.entry(*category).or_default().push(statement);
        }
    }

    let mut outcome = SynthesisOutcome::default();

    for (category, statements) in by_category {
        if policy.is_excluded(category) {
            outcome.skipped_categories.push(category);
            continue;
        }
        // The resolver guarantees every referenced tier is defined.
        let Some(definition) = policy.definition_for(category) else {
            continue;
        };

        let mut scored: Vec<(f64, &DecisionStatement)> = statements
            .iter()
            .map(|s| (specificity_score(s), *s))
            .filter(|(score, _)| *score >= definition.quality_threshold)
            .collect();

        match mode {
            GenerationMode::Holistic => {
                // Rank across the whole document.
                scored.sort_by(|a, b| {
                    b.0.partial_cmp(&a.0)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.1.id.cmp(&b.1.id))
                });
            }
            GenerationMode::PerSection => {
                // Rank within each section, sections in order.
                scored.sort_by(|a, b| {
                    a.1.section_id
                        .cmp(&b.1.section_id)
                        .then_with(|| {
                            b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal)
                        })
                        .then_with(|| a.1.id.cmp(&b.1.id))
                });
            }
        }

        for (score, statement) in scored.into_iter().take(definition.max_per_category) {
            outcome
                .records
                .push(build_record(*next_id, category, statement, mode, score));
            *next_id += 1;
        }
    }

    outcome
}

fn build_record(
    scenario_id: ScenarioId,
    category: CdsCategory,
    statement: &DecisionStatement,
    mode: GenerationMode,
    specificity: f64,
) -> ScenarioRecord {
    let condition = statement.condition_text.as_str();

    let apply_readiness = if has_numeric_threshold(statement) {
        ApplyReadiness::Ready
    } else {
        ApplyReadiness::NeedsFixture
    };

    ScenarioRecord {
        scenario_id,
        category,
        decision_statement_id: statement.id.clone(),
        generation_mode: mode,
        patient_fixture: format!("Patient presenting with {}", condition),
        preconditions: vec![format!("{} is documented in the patient record", condition)],
        triggers: vec![condition.to_string()],
        expected_actions: vec![statement.action_text.clone()],
        evidence_anchor: EvidenceAnchor {
            section_id: statement.section_id.clone(),
            span: statement.source_span,
        },
        apply_readiness,
        status: ScenarioStatus::Draft,
        specificity,
    }
}
