use clap::Args;
use serde_json::Value;

use waterfall_core::allocation::AllocationInput;
use waterfall_core::analytics::{self, Scenario, StructureAnalysisInput};
use waterfall_core::config::EngineConfig;

use crate::input;

/// Arguments for investor concentration
#[derive(Args)]
pub struct ConcentrationArgs {
    /// Path to JSON input file ({ structure, aggregate, assignments })
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for scenario projections
#[derive(Args)]
pub struct ScenariosArgs {
    /// Path to JSON input file ({ structure, aggregate })
    #[arg(long)]
    pub input: Option<String>,

    /// Run a single scenario (current, postHedge, futureUpsize); default all
    #[arg(long)]
    pub scenario: Option<Scenario>,
}

/// Arguments for the full structure analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON input file ({ structure, aggregate, assignments? })
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_concentration(args: ConcentrationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let conc_input: StructureAnalysisInput =
        input::read_input(args.input.as_deref(), "concentration analysis")?;
    let result = analytics::analyze_concentration(&conc_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_scenarios(
    args: ScenariosArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sc_input: AllocationInput = input::read_input(args.input.as_deref(), "scenario analysis")?;
    let result = analytics::analyze_scenarios(&sc_input, args.scenario, config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_analyze(
    args: AnalyzeArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let an_input: StructureAnalysisInput =
        input::read_input(args.input.as_deref(), "structure analysis")?;
    let result = analytics::analyze_structure_with(&an_input, config)?;
    Ok(serde_json::to_value(result)?)
}
