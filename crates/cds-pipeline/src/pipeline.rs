//! Pipeline orchestration.
//!
//! Runs the full extract → classify → synthesize → reconcile sequence for one
//! request. Sections are independent until the reconciliation barrier, so
//! extraction and classification run per section (in parallel with the
//! `parallel` feature). A run is deterministic: the same sections, rules, and
//! policy always produce the same inventory.

use std::collections::BTreeSet;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use cds_types::policy::PolicySource;
use cds_types::{
    ClassificationResult, DecisionStatement, GenerationMode, GuidelineSection, RunId,
    ScenarioRecord,
};

use crate::classifier::classify;
use crate::extractor::extract;
use crate::inventory::ScenarioInventory;
use crate::policy::{resolve, system_default};
use crate::reconciler::{reconcile, ReconcileContext};
use crate::rules::RuleSet;
use crate::synthesizer::synthesize;
use crate::types::{CancelToken, ExtractionStats, PipelineConfig, PipelineError, PipelineResult};

/// One scenario-generation request.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// Normalized guideline sections to process.
    pub sections: Vec<GuidelineSection>,
    /// Generation modes to run; each enabled mode produces one batch.
    pub enabled_modes: BTreeSet<GenerationMode>,
    /// Run-level policy overrides, merged on top of the project layer.
    pub coverage_overrides: Option<PolicySource>,
    /// Prior inventory to merge against; read-only, its scenario id sequence
    /// is continued.
    pub prior_inventory: Option<ScenarioInventory>,
}

impl PipelineRequest {
    /// Creates a request with both generation modes enabled and no overrides.
    pub fn new(sections: Vec<GuidelineSection>) -> Self {
        Self {
            sections,
            enabled_modes: BTreeSet::from(GenerationMode::ALL),
            coverage_overrides: None,
            prior_inventory: None,
        }
    }
}

/// Per-section extraction and classification output.
struct SectionOutcome {
    classified: Vec<(DecisionStatement, ClassificationResult)>,
    stats: ExtractionStats,
    unclassified: usize,
}

/// The scenario-generation pipeline.
///
/// Holds the rule set and configuration for repeated runs; project-level
/// policy is attached once, run-level overrides arrive per request.
#[derive(Debug, Clone)]
pub struct Pipeline {
    rules: RuleSet,
    config: PipelineConfig,
    project_policy: PolicySource,
}

impl Pipeline {
    /// Creates a pipeline over a rule set with the given configuration.
    pub fn new(rules: RuleSet, config: PipelineConfig) -> Self {
        Self {
            rules,
            config,
            project_policy: PolicySource::default(),
        }
    }

    /// Creates a pipeline with built-in rules and default configuration.
    pub fn builtin() -> PipelineResult<Self> {
        Ok(Self::new(RuleSet::builtin()?, PipelineConfig::default()))
    }

    /// Attaches a project-level policy layer.
    pub fn with_project_policy(mut self, source: PolicySource) -> Self {
        self.project_policy = source;
        self
    }

    /// Runs the pipeline for one request.
    ///
    /// Cancellation is cooperative and checked between stages; a cancelled
    /// run discards all partial work and returns [`PipelineError::Cancelled`].
    /// Nothing is ever partially merged into an inventory.
    pub fn run(
        &self,
        run_id: impl Into<RunId>,
        request: &PipelineRequest,
        cancel: &CancelToken,
    ) -> PipelineResult<ScenarioInventory> {
        self.validate(request)?;

        let empty = PolicySource::default();
        let overrides = request.coverage_overrides.as_ref().unwrap_or(&empty);
        let policy = resolve(&system_default(), &self.project_policy, overrides)?;

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let outcomes = self.process_sections(&request.sections)?;

        let mut classified = Vec::new();
        let mut stats = ExtractionStats::default();
        let mut unclassified_count = 0usize;
        for outcome in outcomes {
            classified.extend(outcome.classified);
            stats.merge(&outcome.stats);
            unclassified_count += outcome.unclassified;
        }

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let mut next_id = request
            .prior_inventory
            .as_ref()
            .and_then(|inventory| inventory.max_scenario_id())
            .map_or(1, |max| max + 1);

        let mut batches: Vec<Vec<ScenarioRecord>> = Vec::new();
        if let Some(prior) = &request.prior_inventory {
            batches.push(prior.records.clone());
        }
        for mode in &request.enabled_modes {
            batches.push(synthesize(&classified, &policy, *mode, &mut next_id).records);
        }

        // Last cancellation point; past the barrier the run completes.
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let context = ReconcileContext {
            unclassified_count,
            unparsed_sentences: stats.unparsed_sentences,
        };
        let outcome = reconcile(batches, &policy, &self.config.reconciler, &context);

        Ok(ScenarioInventory::new(run_id, outcome.records, outcome.report))
    }

    fn validate(&self, request: &PipelineRequest) -> PipelineResult<()> {
        if request.enabled_modes.is_empty() {
            return Err(PipelineError::NoModesEnabled);
        }
        if request.sections.len() < self.config.min_sections {
            return Err(PipelineError::TooFewSections {
                found: request.sections.len(),
                required: self.config.min_sections,
            });
        }

        let mut seen = BTreeSet::new();
        for section in &request.sections {
            if !seen.insert(section.id.as_str()) {
                return Err(PipelineError::DuplicateSectionId {
                    section_id: section.id.clone(),
                });
            }
            let length = section.body_text.chars().count();
            if length < self.config.min_section_chars {
                return Err(PipelineError::SectionTooShort {
                    section_id: section.id.clone(),
                    length,
                    required: self.config.min_section_chars,
                });
            }
        }
        Ok(())
    }

    #[cfg(feature = "parallel")]
    fn process_sections(
        &self,
        sections: &[GuidelineSection],
    ) -> PipelineResult<Vec<SectionOutcome>> {
        sections
            .par_iter()
            .map(|section| self.process_section(section))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn process_sections(
        &self,
        sections: &[GuidelineSection],
    ) -> PipelineResult<Vec<SectionOutcome>> {
        sections
            .iter()
            .map(|section| self.process_section(section))
            .collect()
    }

    fn process_section(&self, section: &GuidelineSection) -> PipelineResult<SectionOutcome> {
        let extraction = extract(section, &self.rules, &self.config.extractor);

        // Every statement must point back into its section's body text; a
        // dangling span means the inventory's provenance cannot be trusted.
        for statement in &extraction.statements {
            if !section.contains_span(&statement.source_span) {
                return Err(PipelineError::Invariant {
                    detail: format!(
                        "statement '{}' span {}..{} falls outside section '{}'",
                        statement.id,
                        statement.source_span.start,
                        statement.source_span.end,
                        section.id
                    ),
                });
            }
        }

        let mut classified = Vec::new();
        let mut unclassified = 0usize;
        for statement in extraction.statements {
            let result = classify(&statement, &self.rules, &self.config.classifier);
            if result.is_unclassified() {
                unclassified += 1;
            }
            classified.push((statement, result));
        }

        Ok(SectionOutcome {
            classified,
            stats: extraction.stats,
            unclassified,
        })
    }
}
