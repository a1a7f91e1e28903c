//! Deduplicator and coverage reconciler.
//!
//! Merges the scenario batches produced by each generation mode (plus any
//! prior inventory) into one deduplicated set, enforces per-scenario policy
//! overrides, and recomputes the coverage report. Reconciliation is
//! idempotent: reconciling an already-reconciled inventory changes nothing.

use std::collections::{BTreeMap, BTreeSet};

use cds_types::policy::CoveragePolicy;
use cds_types::{
    CategoryCoverage, CdsCategory, CoverageReport, CoverageStatus, ScenarioRecord, ScenarioStatus,
};

use crate::types::ReconcilerConfig;

/// Soft-gap counters carried into the coverage report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileContext {
    /// Statements that classified into zero categories.
    pub unclassified_count: usize,
    /// Sentences the extractor skipped as unparseable.
    pub unparsed_sentences: usize,
}

/// The merged inventory and coverage report of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// Surviving scenario records, sorted by category then scenario id.
    pub records: Vec<ScenarioRecord>,
    /// Recomputed coverage report.
    pub report: CoverageReport,
}

/// Reconciles scenario batches into one deduplicated inventory.
///
/// Within each category, records are ranked by specificity (ties broken by
/// scenario id) and a later record is dropped as a near-duplicate when its
/// token overlap with any kept record reaches the configured threshold.
/// Scenarios excluded by a per-scenario `none` override are dropped before
/// deduplication. Coverage shortfalls are reported, never raised as errors.
pub fn reconcile(
    batches: Vec<Vec<ScenarioRecord>>,
    policy: &CoveragePolicy,
    config: &ReconcilerConfig,
    context: &ReconcileContext,
) -> ReconcileOutcome {
    let mut by_category: BTreeMap<CdsCategory, Vec<ScenarioRecord>> = BTreeMap::new();
    let mut seen_ids: BTreeSet<u64> = BTreeSet::new();
    let mut duplicates_removed = 0usize;

    for batch in batches {
        for record in batch {
            // A record re-submitted under the same id (prior inventory fed
            // back in) is the same scenario, not a near-duplicate.
            if !seen_ids.insert(record.scenario_id) {
                continue;
            }
            if policy
                .tier_for_scenario(record.scenario_id, record.category)
                .is_none()
            {
                continue;
            }
            by_category.entry(record.category).or_default().push(record);
        }
    }

    let mut records = Vec::new();
    let mut per_category = BTreeMap::new();

    for (category, mut candidates) in by_category {
        candidates.sort_by(|a, b| {
            b.specificity
                .partial_cmp(&a.specificity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.scenario_id.cmp(&b.scenario_id))
        });

        let mut kept: Vec<ScenarioRecord> = Vec::new();
        let mut kept_tokens: Vec<BTreeSet<String>> = Vec::new();

        for candidate in candidates {
            let tokens = similarity_tokens(&candidate);
            let duplicate = kept_tokens
                .iter()
                .any(|existing| token_overlap(existing, &tokens) >= config.similarity_threshold);
            if duplicate {
                duplicates_removed += 1;
                continue;
            }
            kept_tokens.push(tokens);
            kept.push(candidate);
        }

        // Merged batches may overshoot the tier cap even after deduplication;
        // keep the most specific records up to max.
        if let Some(definition) = policy.definition_for(category) {
            kept.truncate(definition.max_per_category);
        }

        kept.sort_by_key(|r| r.scenario_id);
        for record in &mut kept {
            record.status = ScenarioStatus::Ready;
        }

        let required = policy
            .definition_for(category)
            .map(|d| d.min_per_category)
            .unwrap_or(0);
        per_category.insert(
            category,
            CategoryCoverage {
                generated: kept.len(),
                required,
                status: coverage_status(kept.len(), required),
            },
        );

        records.extend(kept);
    }

    // The report spans the whole taxonomy: a category absent from every
    // batch still appears, with its resolved tier's minimum as the
    // requirement. A none-tier category is trivially achieved (its minimum
    // is zero) and additionally listed as a deliberate skip.
    let mut skipped_categories = Vec::new();
    for category in CdsCategory::ALL {
        if policy.is_excluded(category) {
            skipped_categories.push(category);
        }
        if !per_category.contains_key(&category) {
            let required = policy
                .definition_for(category)
                .map(|d| d.min_per_category)
                .unwrap_or(0);
            per_category.insert(
                category,
                CategoryCoverage {
                    generated: 0,
                    required,
                    status: coverage_status(0, required),
                },
            );
        }
    }

    records.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.scenario_id.cmp(&b.scenario_id))
    });

    ReconcileOutcome {
        records,
        report: CoverageReport {
            per_category,
            duplicates_removed,
            unclassified_count: context.unclassified_count,
            unparsed_sentences: context.unparsed_sentences,
            skipped_categories,
        },
    }
}

fn coverage_status(generated: usize, required: usize) -> CoverageStatus {
    if generated >= required {
        CoverageStatus::Achieved
    } else if generated > 0 {
        CoverageStatus::Partial
    } else {
        CoverageStatus::Failed
    }
}

fn similarity_tokens(record: &ScenarioRecord) -> BTreeSet<String> {
    record
        .similarity_text()
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Jaccard overlap of two token sets, in `[0, 1]`.
fn token_overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}
