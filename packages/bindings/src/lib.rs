use napi::Result as NapiResult;
use napi_derive::napi;

use waterfall_core::allocation::{self, AllocationInput};
use waterfall_core::analytics::{self, Scenario, StructureAnalysisInput};
use waterfall_core::config::EngineConfig;
use waterfall_core::datasets::{self, PortfolioSummaryInput};
use waterfall_core::structuring::TrancheStructure;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Engine config from an optional JSON document; defaults when absent.
fn engine_config(config_json: Option<String>) -> NapiResult<EngineConfig> {
    match config_json {
        Some(json) => EngineConfig::from_json_str(&json).map_err(to_napi_error),
        None => Ok(EngineConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Structuring
// ---------------------------------------------------------------------------

#[napi]
pub fn validate_structure(structure_json: String, config_json: Option<String>) -> NapiResult<String> {
    let structure: TrancheStructure =
        serde_json::from_str(&structure_json).map_err(to_napi_error)?;
    let config = engine_config(config_json)?;
    let report = structure.validation_with(config.thickness_tolerance);
    serde_json::to_string(&report).map_err(to_napi_error)
}

#[napi]
pub fn allocate_structure(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: AllocationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = engine_config(config_json)?;
    let output = allocation::analyze_allocation_with(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[napi]
pub fn investor_concentration(input_json: String) -> NapiResult<String> {
    let input: StructureAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = analytics::analyze_concentration(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_scenarios(
    input_json: String,
    scenario: Option<String>,
    config_json: Option<String>,
) -> NapiResult<String> {
    let input: AllocationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let scenario = scenario
        .map(|s| s.parse::<Scenario>())
        .transpose()
        .map_err(to_napi_error)?;
    let config = engine_config(config_json)?;
    let output = analytics::analyze_scenarios(&input, scenario, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_structure(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: StructureAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = engine_config(config_json)?;
    let output = analytics::analyze_structure_with(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

#[napi]
pub fn summarize_portfolio(input_json: String) -> NapiResult<String> {
    let input: PortfolioSummaryInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = datasets::summarize_portfolio(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
