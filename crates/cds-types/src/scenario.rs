//! Scenario record types.

use crate::{CdsCategory, ScenarioId, SectionId, SourceSpan, StatementId};

/// Which generation strategy produced a scenario.
///
/// Modes run as independent passes over the same classified statements;
/// provenance is preserved through reconciliation so merged inventories can
/// still say which strategy contributed each scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum GenerationMode {
    /// Statements ranked per category across the whole document.
    Holistic,
    /// Statements ranked within each section independently.
    PerSection,
}

impl GenerationMode {
    /// All modes in deterministic order.
    pub const ALL: [GenerationMode; 2] = [GenerationMode::Holistic, GenerationMode::PerSection];

    /// Returns the snake_case code for this mode.
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Holistic => "holistic",
            Self::PerSection => "per_section",
        }
    }
}

/// Whether a scenario can be applied as-is by downstream renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum ApplyReadiness {
    /// Scenario is complete and applicable.
    Ready,
    /// Scenario is blocked on an unresolved dependency.
    Blocked,
    /// Scenario needs a patient fixture before it can run.
    NeedsFixture,
    /// Scenario needs supporting data before it can run.
    NeedsData,
}

/// Lifecycle status of a scenario record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ScenarioStatus {
    /// Freshly synthesized, not yet reconciled.
    Draft,
    /// Survived reconciliation.
    Ready,
    /// Held back pending external input.
    Pending,
}

/// Pointer from a scenario back to the exact source text that justified it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvidenceAnchor {
    /// The section the evidence lives in.
    pub section_id: SectionId,
    /// Byte span of the evidence within that section's body text.
    pub span: SourceSpan,
}

/// One synthesized behavior-style test case.
///
/// Created by the synthesizer; mutated only by the reconciler (status and
/// merge annotations); append-only after reconciliation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioRecord {
    /// Unique, monotonic-per-run scenario identifier.
    pub scenario_id: ScenarioId,
    /// The CDS category this scenario exercises.
    pub category: CdsCategory,
    /// The decision statement the scenario was synthesized from.
    pub decision_statement_id: StatementId,
    /// Which generation strategy produced this scenario.
    pub generation_mode: GenerationMode,
    /// Description of the patient context the scenario assumes.
    pub patient_fixture: String,
    /// Preconditions that must hold before the trigger fires.
    pub preconditions: Vec<String>,
    /// Events or findings that trigger the decision.
    pub triggers: Vec<String>,
    /// Actions the system under test is expected to take.
    pub expected_actions: Vec<String>,
    /// Provenance pointer into the source guideline text.
    pub evidence_anchor: EvidenceAnchor,
    /// Whether the scenario can be applied as-is.
    pub apply_readiness: ApplyReadiness,
    /// Lifecycle status.
    pub status: ScenarioStatus,
    /// Deterministic specificity score assigned at synthesis, in `[0, 1]`.
    pub specificity: f64,
}

impl ScenarioRecord {
    /// Returns the text the deduplicator compares: triggers plus expected
    /// actions, joined in order.
    pub fn similarity_text(&self) -> String {
        let mut parts = self.triggers.clone();
        parts.extend(self.expected_actions.iter().cloned());
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_codes() {
        assert_eq!(GenerationMode::Holistic.as_code(), "holistic");
        assert_eq!(GenerationMode::PerSection.as_code(), "per_section");
    }

    #[test]
    fn test_similarity_text_joins_triggers_and_actions() {
        let record = ScenarioRecord {
            scenario_id: 1,
            category: CdsCategory::TreatmentRecommendation,
            decision_statement_id: "s1:0".to_string(),
            generation_mode: GenerationMode::Holistic,
            patient_fixture: "adult with hypertension".to_string(),
            preconditions: vec!["no prior ACE inhibitor".to_string()],
            triggers: vec!["systolic BP >= 140 mmHg".to_string()],
            expected_actions: vec!["initiate ACE inhibitor therapy".to_string()],
            evidence_anchor: EvidenceAnchor {
                section_id: "s1".to_string(),
                span: SourceSpan::new(0, 10),
            },
            apply_readiness: ApplyReadiness::Ready,
            status: ScenarioStatus::Draft,
            specificity: 0.8,
        };

        assert_eq!(
            record.similarity_text(),
            "systolic BP >= 140 mmHg initiate ACE inhibitor therapy"
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_readiness_serializes_kebab_case() {
        let json = serde_json::to_string(&ApplyReadiness::NeedsFixture).unwrap();
        assert_eq!(json, "\"needs-fixture\"");
    }
}
