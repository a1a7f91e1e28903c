//! Identifier type aliases.
//!
//! Identifiers are deliberately plain aliases rather than newtypes: section
//! and statement ids originate outside this crate (ingestion assigns section
//! ids, the extractor derives statement ids from them), and scenario ids are
//! monotonic integers assigned per run.

/// Identifier of a guideline section, assigned by ingestion.
pub type SectionId = String;

/// Identifier of an extracted decision statement.
///
/// Derived deterministically from the originating section id and the
/// statement's ordinal within that section, e.g. `"htn-4.2:0"`.
pub type StatementId = String;

/// Identifier of a synthesized scenario, unique and monotonic within a run.
pub type ScenarioId = u64;

/// Identifier of a pipeline run.
pub type RunId = String;

/// Identifier of a rule in an extraction or classification rule table.
pub type RuleId = String;
