use clap::Args;
use serde_json::Value;

use waterfall_core::allocation::{self, AllocationInput};
use waterfall_core::config::EngineConfig;
use waterfall_core::structuring::TrancheStructure;

use crate::input;

/// Arguments for structure validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to JSON structure file
    #[arg(long)]
    pub input: Option<String>,

    /// Exit non-zero when the structure fails validation
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for tranche allocation
#[derive(Args)]
pub struct AllocateArgs {
    /// Path to JSON input file ({ structure, aggregate })
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_validate(
    args: ValidateArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let structure: TrancheStructure = input::read_input(args.input.as_deref(), "validation")?;
    if args.strict {
        structure.validate_with(config.thickness_tolerance)?;
    }
    let report = structure.validation_with(config.thickness_tolerance);
    Ok(serde_json::to_value(report)?)
}

pub fn run_allocate(
    args: AllocateArgs,
    config: &EngineConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let alloc_input: AllocationInput = input::read_input(args.input.as_deref(), "allocation")?;
    let result = allocation::analyze_allocation_with(&alloc_input, config)?;
    Ok(serde_json::to_value(result)?)
}
