//! # cds-pipeline
//!
//! Scenario-generation pipeline for clinical decision support (CDS) testing.
//!
//! Turns normalized clinical-guideline sections into behavior-style test
//! scenarios in five stages:
//!
//! 1. **Extraction** — sentence segmentation and pattern rules pull
//!    condition-action [`DecisionStatement`](cds_types::DecisionStatement)s
//!    out of section text, with byte-span provenance.
//! 2. **Classification** — keyword rules assign each statement to one or
//!    more CDS categories, multi-label, fully traceable to rule ids.
//! 3. **Policy resolution** — layered coverage policy sources merge into one
//!    per-category tier assignment.
//! 4. **Synthesis** — statements are ranked by specificity per category and
//!    turned into scenario records, clamped to tier bounds.
//! 5. **Reconciliation** — batches from all generation modes (and any prior
//!    inventory) merge into one deduplicated inventory plus coverage report.
//!
//! Every stage is deterministic; [`Pipeline::run`] is a pure function of its
//! request, rules, and policy.
//!
//! ## Features
//!
//! - `parallel` (default): per-section extraction and classification run on
//!   a rayon thread pool.
//! - `serde` (default): serialization for inventories and policy sources.
//!
//! ## Usage
//!
//! ```rust
//! use cds_pipeline::{CancelToken, Pipeline, PipelineRequest};
//! use cds_types::GuidelineSection;
//!
//! # fn main() -> Result<(), cds_pipeline::PipelineError> {
//! let body = "For patients with systolic BP >= 140 mmHg, initiate ACE \
//!             inhibitor therapy. ".repeat(15);
//! let sections = (1..=3)
//!     .map(|i| GuidelineSection {
//!         id: format!("s{i}"),
//!         title: format!("Section {i}"),
//!         body_text: body.clone(),
//!         source_document_id: "guideline-htn-2024".to_string(),
//!     })
//!     .collect();
//!
//! let pipeline = Pipeline::builtin()?;
//! let inventory = pipeline.run("run-1", &PipelineRequest::new(sections), &CancelToken::new())?;
//! assert!(!inventory.is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod classifier;
pub mod extractor;
pub mod inventory;
pub mod pipeline;
pub mod policy;
pub mod reconciler;
pub mod rules;
pub mod synthesizer;
pub mod types;

pub use classifier::classify;
pub use extractor::{extract, ExtractionOutcome};
pub use inventory::ScenarioInventory;
pub use pipeline::{Pipeline, PipelineRequest};
pub use policy::{resolve, system_default};
pub use reconciler::{reconcile, ReconcileContext, ReconcileOutcome};
pub use rules::RuleSet;
pub use synthesizer::{specificity_score, synthesize, SynthesisOutcome};
pub use types::{
    CancelToken, ClassifierConfig, ExtractionStats, ExtractorConfig, PipelineConfig,
    PipelineError, PipelineResult, PolicyError, ReconcilerConfig, RuleTableError,
};

// Re-export the data model for convenience.
pub use cds_types;
