//! CDS scenario-generation server binary.
//!
//! Reads a scenario request from a JSON file, runs it through the pipeline,
//! and writes the resulting inventory and coverage report as JSON.

use std::path::Path;

use cds_pipeline::{Pipeline, PipelineConfig, RuleSet};
use cds_service::{ScenarioRequest, ScenarioService};
use cds_types::policy::PolicySource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_RUN_ID: &str = "run-1";
const DEFAULT_OUTPUT_PATH: &str = "inventory.json";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let request_path = std::env::var("CDS_REQUEST_PATH")
        .map_err(|_| "CDS_REQUEST_PATH must point to a scenario request JSON file")?;
    let output_path =
        std::env::var("CDS_OUTPUT_PATH").unwrap_or_else(|_| DEFAULT_OUTPUT_PATH.to_string());
    let run_id = std::env::var("CDS_RUN_ID").unwrap_or_else(|_| DEFAULT_RUN_ID.to_string());

    tracing::info!("Loading scenario request from: {}", request_path);
    let request: ScenarioRequest =
        serde_json::from_reader(std::io::BufReader::new(std::fs::File::open(&request_path)?))?;
    tracing::info!(
        "Request has {} sections, {} generation modes",
        request.sections.len(),
        request.enabled_modes.len()
    );

    // External rule tables replace the embedded defaults when both paths are set
    let rules = match (
        std::env::var("CDS_EXTRACTION_RULES"),
        std::env::var("CDS_CLASSIFICATION_RULES"),
    ) {
        (Ok(extraction), Ok(classification)) => {
            tracing::info!(
                "Loading rule tables from {} and {}",
                extraction,
                classification
            );
            RuleSet::from_paths(&extraction, &classification)?
        }
        _ => {
            tracing::info!("Using embedded default rule tables");
            RuleSet::builtin()?
        }
    };

    let mut pipeline = Pipeline::new(rules, PipelineConfig::default());
    if let Ok(policy_path) = std::env::var("CDS_PROJECT_POLICY") {
        tracing::info!("Loading project policy layer from: {}", policy_path);
        let source: PolicySource =
            serde_json::from_reader(std::io::BufReader::new(std::fs::File::open(&policy_path)?))?;
        pipeline = pipeline.with_project_policy(source);
    }

    let service = ScenarioService::new(pipeline);
    let response = service.submit(run_id.clone(), request).await?;

    tracing::info!(
        "Run {} complete: {} scenarios, {} duplicates removed, {} categories with gaps",
        run_id,
        response.inventory.len(),
        response.report.duplicates_removed,
        response.report.gaps().len()
    );

    serde_json::to_writer_pretty(
        std::io::BufWriter::new(std::fs::File::create(Path::new(&output_path))?),
        &response,
    )?;
    tracing::info!("Inventory written to: {}", output_path);

    Ok(())
}
