//! Run-scoped scenario inventory.
//!
//! An inventory is the immutable output of one pipeline run: the surviving
//! scenario records plus the coverage report. Incremental runs read a prior
//! inventory as one more reconciliation batch and continue its scenario id
//! sequence; the prior inventory itself is never mutated.

use std::collections::BTreeMap;

use cds_types::{CdsCategory, CoverageReport, RunId, ScenarioId, ScenarioRecord};

/// The scenario records and coverage report of one run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioInventory {
    /// The run that produced this inventory.
    pub run_id: RunId,
    /// Surviving scenario records, sorted by category then scenario id.
    pub records: Vec<ScenarioRecord>,
    /// Coverage report recomputed at the end of the run.
    pub report: CoverageReport,
}

impl ScenarioInventory {
    /// Creates an inventory for a run.
    pub fn new(run_id: impl Into<RunId>, records: Vec<ScenarioRecord>, report: CoverageReport) -> Self {
        Self {
            run_id: run_id.into(),
            records,
            report,
        }
    }

    /// Number of scenario records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the inventory holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The highest scenario id in this inventory, if any.
    ///
    /// An incremental run continues the sequence from `max_scenario_id() + 1`
    /// so ids stay unique across the merged inventories.
    pub fn max_scenario_id(&self) -> Option<ScenarioId> {
        self.records.iter().map(|r| r.scenario_id).max()
    }

    /// Groups records by category, in category order.
    pub fn by_category(&self) -> BTreeMap<CdsCategory, Vec<&ScenarioRecord>> {
        let mut grouped: BTreeMap<CdsCategory, Vec<&ScenarioRecord>> = BTreeMap::new();
        for record in &self.records {
            grouped.entry(record.category).or_default().push(record);
        }
        grouped
    }
}
