//! Decision statement type.

use crate::{SectionId, SourceSpan, StatementId};

/// A condition-action pair extracted from guideline prose.
///
/// Produced only by the decision extractor. One section yields zero or more
/// statements. Invariant: `source_span` must fall within the bounds of the
/// originating section's body text; the span is the evidence anchor for every
/// scenario synthesized from this statement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecisionStatement {
    /// Statement identifier, derived from the section id and ordinal.
    pub id: StatementId,
    /// Identifier of the originating section.
    pub section_id: SectionId,
    /// The triggering condition, e.g. `"systolic BP >= 140 mmHg"`.
    pub condition_text: String,
    /// The recommended action, e.g. `"initiate ACE inhibitor therapy"`.
    pub action_text: String,
    /// Byte span of the source sentence within the section body.
    pub source_span: SourceSpan,
}

impl DecisionStatement {
    /// Builds the deterministic statement id for the `ordinal`-th statement
    /// of a section.
    pub fn make_id(section_id: &str, ordinal: usize) -> StatementId {
        format!("{}:{}", section_id, ordinal)
    }
}
