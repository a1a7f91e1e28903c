//! Request and response payloads.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use cds_pipeline::ScenarioInventory;
use cds_types::policy::PolicySource;
use cds_types::{CoverageReport, GenerationMode, GuidelineSection, RunId, ScenarioRecord};

/// One scenario-generation request as submitted by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRequest {
    /// Normalized guideline sections to process.
    pub sections: Vec<GuidelineSection>,
    /// Generation modes to run. Defaults to all modes when omitted.
    #[serde(default = "all_modes")]
    pub enabled_modes: BTreeSet<GenerationMode>,
    /// Run-level coverage policy overrides.
    #[serde(default)]
    pub coverage_overrides: Option<PolicySource>,
    /// Prior run whose inventory this run extends.
    #[serde(default)]
    pub prior_inventory_run: Option<RunId>,
}

fn all_modes() -> BTreeSet<GenerationMode> {
    BTreeSet::from(GenerationMode::ALL)
}

impl ScenarioRequest {
    /// Creates a request with all generation modes enabled and no overrides.
    pub fn new(sections: Vec<GuidelineSection>) -> Self {
        Self {
            sections,
            enabled_modes: all_modes(),
            coverage_overrides: None,
            prior_inventory_run: None,
        }
    }
}

/// The result of one completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResponse {
    /// The run that produced this inventory.
    pub run_id: RunId,
    /// Surviving scenario records.
    pub inventory: Vec<ScenarioRecord>,
    /// Coverage report for the run.
    pub report: CoverageReport,
}

impl From<&ScenarioInventory> for ScenarioResponse {
    fn from(inventory: &ScenarioInventory) -> Self {
        Self {
            run_id: inventory.run_id.clone(),
            inventory: inventory.records.clone(),
            report: inventory.report.clone(),
        }
    }
}
