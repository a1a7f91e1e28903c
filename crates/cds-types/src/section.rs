//! Guideline section type.

use crate::{SectionId, SourceSpan};

/// A normalized section of guideline prose, produced by ingestion.
///
/// Sections are immutable: created once per ingestion, never mutated, and
/// owned by the run that created them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GuidelineSection {
    /// Section identifier assigned by ingestion.
    pub id: SectionId,
    /// Section title.
    pub title: String,
    /// Plain prose body of the section.
    pub body_text: String,
    /// Identifier of the source document this section came from.
    pub source_document_id: String,
}

impl GuidelineSection {
    /// Returns true if `span` falls entirely within this section's body text.
    pub fn contains_span(&self, span: &SourceSpan) -> bool {
        span.is_within(&self.body_text)
    }

    /// Returns the body text length in bytes.
    pub fn body_len(&self) -> usize {
        self.body_text.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_span() {
        let section = GuidelineSection {
            id: "s1".to_string(),
            title: "Treatment".to_string(),
            body_text: "Initiate therapy.".to_string(),
            source_document_id: "doc1".to_string(),
        };

        assert!(section.contains_span(&SourceSpan::new(0, 8)));
        assert!(!section.contains_span(&SourceSpan::new(0, 100)));
        assert_eq!(section.body_len(), 17);
    }
}
