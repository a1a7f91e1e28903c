//! # cds-types
//!
//! Type definitions for clinical decision support (CDS) scenario generation.
//!
//! This crate provides the data model shared by the extraction, classification,
//! synthesis, and reconciliation stages: guideline sections, decision
//! statements, the fixed CDS category taxonomy, coverage policies, scenario
//! records, and coverage reports.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde.
//!   Disable this feature for zero-dependency usage.
//!
//! ## Usage
//!
//! ```rust
//! use cds_types::{CdsCategory, CategoryGroup, GuidelineSection, SourceSpan};
//!
//! let section = GuidelineSection {
//!     id: "htn-4.2".to_string(),
//!     title: "Pharmacologic treatment".to_string(),
//!     body_text: "For patients with systolic BP >= 140 mmHg, initiate ACE inhibitor therapy.".to_string(),
//!     source_document_id: "guideline-htn-2024".to_string(),
//! };
//!
//! let span = SourceSpan::new(17, 41);
//! assert!(span.is_within(&section.body_text));
//!
//! let category = CdsCategory::from_code("treatment_recommendation").unwrap();
//! assert_eq!(category.group(), CategoryGroup::WorkflowSupport);
//! ```
//!
//! ## Without Serde
//!
//! To use this crate without serde (zero dependencies):
//!
//! ```toml
//! [dependencies]
//! cds-types = { version = "0.1", default-features = false }
//! ```

#![warn(missing_docs)]

mod category;
mod classification;
mod ids;
pub mod policy;
mod report;
mod scenario;
mod section;
mod span;
mod statement;

// Re-export all public types at crate root
pub use category::{CategoryGroup, CdsCategory, UnknownCategoryError};
pub use classification::{ClassificationResult, DEFAULT_RULE_ID};
pub use ids::{RuleId, RunId, ScenarioId, SectionId, StatementId};
pub use policy::{CoveragePolicy, PolicySource, TierDefinition, TierName};
pub use report::{CategoryCoverage, CoverageReport, CoverageStatus};
pub use scenario::{
    ApplyReadiness, EvidenceAnchor, GenerationMode, ScenarioRecord, ScenarioStatus,
};
pub use section::GuidelineSection;
pub use span::SourceSpan;
pub use statement::DecisionStatement;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_exported() {
        // Verify all types are accessible from crate root
        let _span = SourceSpan::new(0, 4);
        let _category = CdsCategory::TreatmentRecommendation;
        let _group = CategoryGroup::WorkflowSupport;
        let _readiness = ApplyReadiness::Ready;
        let _status = ScenarioStatus::Draft;
        let _mode = GenerationMode::Holistic;
        let _coverage = CoverageStatus::Achieved;
        let _tier = TierName::new("medium");
    }

    #[test]
    fn test_taxonomy_cardinality() {
        assert_eq!(CdsCategory::ALL.len(), 23);
        assert_eq!(CategoryGroup::ALL.len(), 5);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let statement = DecisionStatement {
            id: "htn-4.2:0".to_string(),
            section_id: "htn-4.2".to_string(),
            condition_text: "systolic BP >= 140 mmHg".to_string(),
            action_text: "initiate ACE inhibitor therapy".to_string(),
            source_span: SourceSpan::new(0, 75),
        };

        let json = serde_json::to_string(&statement).unwrap();
        let parsed: DecisionStatement = serde_json::from_str(&json).unwrap();
        assert_eq!(statement, parsed);
    }
}
