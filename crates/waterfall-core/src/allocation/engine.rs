use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::portfolio::PortfolioAggregate;
use crate::structuring::{parse_rating, Rating, TrancheDefinition, TrancheStructure};
use crate::types::{
    checked_add, checked_mul, checked_sum, mul_div, ratio_or_zero, with_metadata, Bps,
    ComputationOutput, InvestorId, Money, Percent, TrancheId,
};
use crate::WaterfallResult;

const HUNDRED: Decimal = dec!(100);
const BPS_PER_UNIT: Decimal = dec!(10000);

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// A structure together with the aggregate it is sized against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    pub structure: TrancheStructure,
    pub aggregate: PortfolioAggregate,
}

/// One tranche placed in the capital stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Same id as the tranche definition it was derived from.
    pub tranche_id: TrancheId,
    pub name: String,
    pub rating: Rating,
    /// Position in the stack, 0 = most senior.
    pub seniority: usize,
    pub thickness_percent: Percent,
    pub cost_bps: Bps,
    pub hedged_percent: Percent,
    pub size: Money,
    pub attachment_point: Percent,
    pub detachment_point: Percent,
    /// size * cost_bps / 10000
    pub annual_cost: Money,
    /// size * hedged_percent / 100
    pub hedged_notional: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_investor: Option<InvestorId>,
}

/// Whole-structure figures derived from the allocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureMetrics {
    pub total_value: Money,
    pub total_allocated: Money,
    pub tranche_count: usize,
    /// Size-weighted mean cost across the stack.
    pub weighted_avg_cost_bps: Bps,
    /// Annual cost of the whole stack.
    pub total_cost: Money,
    /// total_cost as a percentage of portfolio value.
    pub cost_percentage: Percent,
    pub total_hedged_notional: Money,
    pub hedged_percentage: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationOutput {
    pub allocations: Vec<Allocation>,
    pub metrics: StructureMetrics,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Place a structure's tranches in the capital stack and size them.
///
/// Pure and deterministic. The structure is not validated; an empty tranche
/// list gives an empty allocation and a non-positive portfolio value gives
/// zero sizes with attachment points still computed. Figures that would leave
/// the Decimal range come back as `InvalidInput` rather than panicking.
pub fn allocate(
    structure: &TrancheStructure,
    aggregate: &PortfolioAggregate,
) -> WaterfallResult<AllocationOutput> {
    let allocations = allocate_tranches(&structure.tranches, aggregate.total_value)?;
    let metrics = structure_metrics(&allocations, aggregate.total_value)?;
    Ok(AllocationOutput {
        allocations,
        metrics,
    })
}

/// Sort tranches by thickness (thickest = most senior) and walk the stack
/// from the top, accumulating attachment points.
///
/// Equal thicknesses keep their input order.
pub fn allocate_tranches(
    tranches: &[TrancheDefinition],
    total_value: Money,
) -> WaterfallResult<Vec<Allocation>> {
    let mut sorted: Vec<&TrancheDefinition> = tranches.iter().collect();
    // sort_by is stable
    sorted.sort_by(|a, b| b.thickness_percent.cmp(&a.thickness_percent));

    let base_value = total_value.max(Decimal::ZERO);
    let mut cumulative_attachment = Decimal::ZERO;
    let mut allocations = Vec::with_capacity(sorted.len());

    for (seniority, t) in sorted.into_iter().enumerate() {
        let attachment_point = cumulative_attachment;
        let detachment_point =
            checked_add("detachment_point", attachment_point, t.thickness_percent)?;
        cumulative_attachment = detachment_point;

        let size = mul_div("size", base_value, t.thickness_percent, HUNDRED)?;
        allocations.push(Allocation {
            tranche_id: t.id.clone(),
            name: t.name.clone(),
            rating: parse_rating(&t.name),
            seniority,
            thickness_percent: t.thickness_percent,
            cost_bps: t.cost_bps,
            hedged_percent: t.hedged_percent,
            size,
            attachment_point,
            detachment_point,
            annual_cost: mul_div("annual_cost", size, t.cost_bps, BPS_PER_UNIT)?,
            hedged_notional: mul_div("hedged_notional", size, t.hedged_percent, HUNDRED)?,
            assigned_investor: None,
        });
    }
    Ok(allocations)
}

/// Aggregate cost and hedge figures across allocations.
///
/// Ratios against `total_value` are zero when the value is not positive.
pub fn structure_metrics(
    allocations: &[Allocation],
    total_value: Money,
) -> WaterfallResult<StructureMetrics> {
    let denominator = if total_value > Decimal::ZERO {
        total_value
    } else {
        Decimal::ZERO
    };

    let total_allocated = checked_sum("total_allocated", allocations.iter().map(|a| a.size))?;
    let cost_weighted = allocations.iter().try_fold(Decimal::ZERO, |acc, a| {
        let term = checked_mul("weighted_avg_cost_bps", a.size, a.cost_bps)?;
        checked_add("weighted_avg_cost_bps", acc, term)
    })?;
    let total_cost = checked_sum("total_cost", allocations.iter().map(|a| a.annual_cost))?;
    let total_hedged_notional = checked_sum(
        "total_hedged_notional",
        allocations.iter().map(|a| a.hedged_notional),
    )?;

    let cost_ratio = ratio_or_zero("cost_percentage", total_cost, denominator)?;
    let hedged_ratio = ratio_or_zero("hedged_percentage", total_hedged_notional, denominator)?;

    Ok(StructureMetrics {
        total_value,
        total_allocated,
        tranche_count: allocations.len(),
        weighted_avg_cost_bps: ratio_or_zero("weighted_avg_cost_bps", cost_weighted, denominator)?,
        total_cost,
        cost_percentage: checked_mul("cost_percentage", cost_ratio, HUNDRED)?,
        total_hedged_notional,
        hedged_percentage: checked_mul("hedged_percentage", hedged_ratio, HUNDRED)?,
    })
}

/// Allocation wrapped in the standard output envelope, with warnings for
/// structures that would not pass save validation. Uses the default engine
/// configuration.
pub fn analyze_allocation(
    input: &AllocationInput,
) -> WaterfallResult<ComputationOutput<AllocationOutput>> {
    analyze_allocation_with(input, &EngineConfig::default())
}

/// [`analyze_allocation`] with the thickness tolerance taken from `config`.
pub fn analyze_allocation_with(
    input: &AllocationInput,
    config: &EngineConfig,
) -> WaterfallResult<ComputationOutput<AllocationOutput>> {
    let start = Instant::now();
    config.validate()?;
    let mut warnings = Vec::new();

    let validation = input.structure.validation_with(config.thickness_tolerance);
    warnings.extend(validation.reasons.iter().cloned());
    if input.aggregate.total_value <= Decimal::ZERO {
        warnings.push("Portfolio value is not positive; tranche sizes are zero".into());
    }

    let output = allocate(&input.structure, &input.aggregate)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Tranche allocation: thickness-ordered seniority with contiguous attachment points",
        &serde_json::json!({
            "structure": input.structure.name,
            "dataset": input.structure.dataset_name,
            "total_value": input.aggregate.total_value.to_string(),
            "num_tranches": input.structure.tranches.len(),
            "seniority_rule": "descending thickness, stable on ties",
            "thickness_tolerance": config.thickness_tolerance.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
