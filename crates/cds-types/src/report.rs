//! Coverage report types.

use std::collections::BTreeMap;

use crate::CdsCategory;

/// Coverage outcome for one category after reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum CoverageStatus {
    /// Generated count meets or exceeds the tier minimum.
    Achieved,
    /// Some scenarios generated, but fewer than the tier minimum.
    Partial,
    /// No scenarios generated although the tier minimum is above zero.
    Failed,
}

/// Generated-versus-required counts for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoryCoverage {
    /// Scenarios kept for this category after deduplication.
    pub generated: usize,
    /// The resolved tier's minimum for this category.
    pub required: usize,
    /// Coverage outcome.
    pub status: CoverageStatus,
}

/// Per-run coverage report, recomputed by every reconciliation.
///
/// Soft gaps live here: unclassified statements, unparsed sentences, and
/// sub-minimum coverage are reported, never raised as errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoverageReport {
    /// Coverage outcome for every category of the taxonomy. A `none`-tier
    /// category is trivially achieved (its minimum is zero).
    pub per_category: BTreeMap<CdsCategory, CategoryCoverage>,
    /// Number of near-duplicate scenarios dropped during reconciliation.
    pub duplicates_removed: usize,
    /// Statements that classified into zero categories.
    pub unclassified_count: usize,
    /// Sentences the extractor skipped as unparseable.
    pub unparsed_sentences: usize,
    /// Categories deliberately excluded by a `none` tier.
    pub skipped_categories: Vec<CdsCategory>,
}

impl CoverageReport {
    /// Returns true if every reported category achieved its minimum.
    pub fn is_fully_achieved(&self) -> bool {
        self.per_category
            .values()
            .all(|c| c.status == CoverageStatus::Achieved)
    }

    /// Returns the categories that fell short of their minimum, in
    /// deterministic order.
    pub fn gaps(&self) -> Vec<CdsCategory> {
        self.per_category
            .iter()
            .filter(|(_, c)| c.status != CoverageStatus::Achieved)
            .map(|(category, _)| *category)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaps_and_fully_achieved() {
        let mut report = CoverageReport::default();
        report.per_category.insert(
            CdsCategory::DrugInteraction,
            CategoryCoverage {
                generated: 3,
                required: 2,
                status: CoverageStatus::Achieved,
            },
        );
        report.per_category.insert(
            CdsCategory::Screening,
            CategoryCoverage {
                generated: 1,
                required: 2,
                status: CoverageStatus::Partial,
            },
        );

        assert!(!report.is_fully_achieved());
        assert_eq!(report.gaps(), vec![CdsCategory::Screening]);

        report
            .per_category
            .get_mut(&CdsCategory::Screening)
            .unwrap()
            .status = CoverageStatus::Achieved;
        assert!(report.is_fully_achieved());
        assert!(report.gaps().is_empty());
    }
}
