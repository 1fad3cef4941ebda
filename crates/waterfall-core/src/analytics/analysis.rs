use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::allocation::{allocate, Allocation, StructureMetrics};
use crate::analytics::concentration::{
    concentration, investor_rollup, ConcentrationSummary, InvestorAssignments, InvestorRollup,
};
use crate::analytics::scenario::{all_scenarios, ScenarioAnalytics};
use crate::config::EngineConfig;
use crate::portfolio::PortfolioAggregate;
use crate::structuring::{StructureValidation, TrancheStructure};
use crate::types::{with_metadata, ComputationOutput};
use crate::WaterfallResult;

/// Everything needed for a full structure run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureAnalysisInput {
    pub structure: TrancheStructure,
    pub aggregate: PortfolioAggregate,
    #[serde(default)]
    pub assignments: InvestorAssignments,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureAnalysis {
    pub validation: StructureValidation,
    pub allocations: Vec<Allocation>,
    pub metrics: StructureMetrics,
    pub investor_rollup: Vec<InvestorRollup>,
    pub concentration: ConcentrationSummary,
    pub scenarios: Vec<ScenarioAnalytics>,
}

/// Investor-side view of a structure: the allocations with holders filled in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcentrationReport {
    pub allocations: Vec<Allocation>,
    pub investor_rollup: Vec<InvestorRollup>,
    pub concentration: ConcentrationSummary,
}

/// Allocate, apply assignments, then roll up by investor.
pub fn analyze_concentration(
    input: &StructureAnalysisInput,
) -> WaterfallResult<ComputationOutput<ConcentrationReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let allocations = input
        .assignments
        .apply(&allocate(&input.structure, &input.aggregate)?.allocations);
    let investor_rollup = investor_rollup(&allocations)?;
    let concentration = concentration(&allocations)?;
    if concentration.num_investors == 0 {
        warnings.push("No tranches are assigned to investors".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Investor concentration: HHI over shares of assigned exposure",
        &serde_json::json!({
            "structure": input.structure.name,
            "total_value": input.aggregate.total_value.to_string(),
            "num_assignments": input.assignments.len(),
            "share_basis": "assigned exposure",
        }),
        warnings,
        elapsed,
        ConcentrationReport {
            allocations,
            investor_rollup,
            concentration,
        },
    ))
}

/// Run allocation, investor analytics and all scenarios with default config.
pub fn analyze_structure(
    input: &StructureAnalysisInput,
) -> WaterfallResult<ComputationOutput<StructureAnalysis>> {
    analyze_structure_with(input, &EngineConfig::default())
}

/// Full run. A structure that would fail save validation is still analysed;
/// the failures come back as warnings.
pub fn analyze_structure_with(
    input: &StructureAnalysisInput,
    config: &EngineConfig,
) -> WaterfallResult<ComputationOutput<StructureAnalysis>> {
    let start = Instant::now();
    config.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    let validation = input.structure.validation_with(config.thickness_tolerance);
    warnings.extend(validation.reasons.iter().cloned());

    if input.aggregate.total_value <= Decimal::ZERO {
        warnings.push("Portfolio value is not positive; sizes and ratios are zero".into());
    }
    if input.aggregate.total_value < Decimal::ZERO {
        warnings.push("Portfolio value is negative; treated as zero for sizing".into());
    }

    let allocation = allocate(&input.structure, &input.aggregate)?;
    let allocations = input.assignments.apply(&allocation.allocations);

    let orphaned = input
        .assignments
        .tranche_ids()
        .filter(|id| input.structure.tranche(id).is_none())
        .count();
    if orphaned > 0 {
        warnings.push(format!(
            "{orphaned} assignment(s) reference tranches not in the structure"
        ));
    }

    let rollup = investor_rollup(&allocations)?;
    let concentration = concentration(&allocations)?;
    if concentration.num_investors == 0 {
        warnings.push("No tranches are assigned to investors".into());
    }

    let scenarios = all_scenarios(&input.aggregate, &allocation.metrics, &config.scenarios)?;

    if !warnings.is_empty() {
        warn!(
            structure = %input.structure.id,
            count = warnings.len(),
            "structure analysed with warnings"
        );
    }

    let output = StructureAnalysis {
        validation,
        allocations,
        metrics: allocation.metrics,
        investor_rollup: rollup,
        concentration,
        scenarios,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Tranche structure analysis: allocation, investor concentration (HHI) and fixed-multiplier scenarios",
        &serde_json::json!({
            "structure": input.structure.name,
            "dataset": input.structure.dataset_name,
            "total_value": input.aggregate.total_value.to_string(),
            "avg_interest_rate": input.aggregate.avg_interest_rate.to_string(),
            "num_tranches": input.structure.tranches.len(),
            "num_assignments": input.assignments.len(),
            "risk_ratio": config.scenarios.risk_ratio.to_string(),
            "risk_weighting_factor": config.scenarios.risk_weighting_factor.to_string(),
            "capital_ratio": config.scenarios.capital_ratio.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
