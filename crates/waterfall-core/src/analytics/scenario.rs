//! Fixed-multiplier scenario projections.
//!
//! A deliberately simple sensitivity model: each scenario scales notional,
//! trade cost and yield by constants, then derives capital and return
//! figures from fixed risk/capital ratios held in [`ScenarioParameters`].
//!
//! RWA = notional * risk_ratio * risk_weighting_factor
//! capital = RWA * capital_ratio
//! ROE = (revenue - trade costs) / capital * 100

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::allocation::{allocate, AllocationInput, StructureMetrics};
use crate::config::{EngineConfig, ScenarioMultipliers, ScenarioParameters};
use crate::error::WaterfallError;
use crate::portfolio::PortfolioAggregate;
use crate::types::{
    checked_mul, checked_sub, mul_div, ratio_or_zero, with_metadata, ComputationOutput, Money,
    Percent,
};
use crate::WaterfallResult;

const HUNDRED: Decimal = dec!(100);

/// Named sensitivity scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scenario {
    Current,
    PostHedge,
    FutureUpsize,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Current, Scenario::PostHedge, Scenario::FutureUpsize];

    pub fn multipliers(&self, params: &ScenarioParameters) -> ScenarioMultipliers {
        match self {
            Scenario::Current => params.current,
            Scenario::PostHedge => params.post_hedge,
            Scenario::FutureUpsize => params.future_upsize,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Current => "current",
            Scenario::PostHedge => "postHedge",
            Scenario::FutureUpsize => "futureUpsize",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = WaterfallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "current" => Ok(Scenario::Current),
            "posthedge" => Ok(Scenario::PostHedge),
            "futureupsize" => Ok(Scenario::FutureUpsize),
            other => Err(WaterfallError::InvalidInput {
                field: "scenario".into(),
                reason: format!("Unknown scenario '{other}'. Use: current, postHedge, futureUpsize"),
            }),
        }
    }
}

/// Capital and earnings figures for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAnalytics {
    pub scenario: Scenario,
    pub notional_multiplier: Decimal,
    pub cost_multiplier: Decimal,
    pub yield_multiplier: Decimal,
    pub adjusted_notional: Money,
    pub adjusted_yield: Percent,
    pub risk_weighted_assets: Money,
    pub internal_capital_required: Money,
    pub revenue: Money,
    pub adjusted_trade_costs: Money,
    pub net_earnings: Money,
    /// Return on internal capital, percent. Zero when no capital is required.
    pub roe: Percent,
}

/// Project one scenario from the portfolio aggregate and the structure's total cost.
///
/// A negative portfolio value is treated as zero, as in allocation sizing.
pub fn scenario_analytics(
    scenario: Scenario,
    aggregate: &PortfolioAggregate,
    metrics: &StructureMetrics,
    params: &ScenarioParameters,
) -> WaterfallResult<ScenarioAnalytics> {
    let m = scenario.multipliers(params);
    let notional = aggregate.total_value.max(Decimal::ZERO);

    let adjusted_notional = checked_mul("adjusted_notional", notional, m.notional)?;
    let adjusted_yield = checked_mul("adjusted_yield", aggregate.avg_interest_rate, m.yield_mult)?;
    let risk_weight = checked_mul(
        "risk_weighted_assets",
        params.risk_ratio,
        params.risk_weighting_factor,
    )?;
    let risk_weighted_assets = checked_mul("risk_weighted_assets", adjusted_notional, risk_weight)?;
    let internal_capital_required = checked_mul(
        "internal_capital_required",
        risk_weighted_assets,
        params.capital_ratio,
    )?;
    let revenue = mul_div("revenue", adjusted_notional, adjusted_yield, HUNDRED)?;
    let adjusted_trade_costs = checked_mul("adjusted_trade_costs", metrics.total_cost, m.cost)?;
    let net_earnings = checked_sub("net_earnings", revenue, adjusted_trade_costs)?;
    let roe = if internal_capital_required > Decimal::ZERO {
        let ratio = ratio_or_zero("roe", net_earnings, internal_capital_required)?;
        checked_mul("roe", ratio, HUNDRED)?
    } else {
        Decimal::ZERO
    };

    Ok(ScenarioAnalytics {
        scenario,
        notional_multiplier: m.notional,
        cost_multiplier: m.cost,
        yield_multiplier: m.yield_mult,
        adjusted_notional,
        adjusted_yield,
        risk_weighted_assets,
        internal_capital_required,
        revenue,
        adjusted_trade_costs,
        net_earnings,
        roe,
    })
}

/// All three scenarios in `Scenario::ALL` order.
pub fn all_scenarios(
    aggregate: &PortfolioAggregate,
    metrics: &StructureMetrics,
    params: &ScenarioParameters,
) -> WaterfallResult<Vec<ScenarioAnalytics>> {
    Scenario::ALL
        .iter()
        .map(|s| scenario_analytics(*s, aggregate, metrics, params))
        .collect()
}

/// Allocate the structure, then project one scenario or all of them.
pub fn analyze_scenarios(
    input: &AllocationInput,
    scenario: Option<Scenario>,
    config: &EngineConfig,
) -> WaterfallResult<ComputationOutput<Vec<ScenarioAnalytics>>> {
    let start = Instant::now();
    config.validate()?;
    let params = &config.scenarios;
    let mut warnings = Vec::new();

    let metrics = allocate(&input.structure, &input.aggregate)?.metrics;
    let results = match scenario {
        Some(s) => vec![scenario_analytics(s, &input.aggregate, &metrics, params)?],
        None => all_scenarios(&input.aggregate, &metrics, params)?,
    };
    if input.aggregate.total_value < Decimal::ZERO {
        warnings.push("Portfolio value is negative; treated as zero for scenarios".into());
    }
    if results
        .iter()
        .any(|r| r.internal_capital_required <= Decimal::ZERO)
    {
        warnings.push("Internal capital is zero; ROE reported as 0".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-multiplier scenarios: RWA = notional x risk ratio x weighting, capital = RWA x capital ratio",
        &serde_json::json!({
            "total_value": input.aggregate.total_value.to_string(),
            "avg_interest_rate": input.aggregate.avg_interest_rate.to_string(),
            "total_cost": metrics.total_cost.to_string(),
            "risk_ratio": params.risk_ratio.to_string(),
            "risk_weighting_factor": params.risk_weighting_factor.to_string(),
            "capital_ratio": params.capital_ratio.to_string(),
        }),
        warnings,
        elapsed,
        results,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocate;
    use crate::structuring::{TrancheDefinition, TrancheStructure};

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    fn reference() -> (PortfolioAggregate, StructureMetrics) {
        let s = TrancheStructure::with_tranches(
            "Deal",
            "loans",
            vec![
                TrancheDefinition::new("Senior", dec!(70), dec!(150)),
                TrancheDefinition::new("Mezz", dec!(20), dec!(250)),
                TrancheDefinition::new("Sub", dec!(10), dec!(450)),
            ],
        );
        let agg = PortfolioAggregate::new(dec!(1000000), dec!(6.0));
        let metrics = allocate(&s, &agg).unwrap().metrics;
        (agg, metrics)
    }

    // -----------------------------------------------------------------------
    // Test 1: Current scenario, reference deal
    // -----------------------------------------------------------------------
    #[test]
    fn test_current_scenario_reference() {
        let (agg, metrics) = reference();
        let r = scenario_analytics(
            Scenario::Current,
            &agg,
            &metrics,
            &ScenarioParameters::default(),
        ).unwrap();
        assert_eq!(r.adjusted_notional, dec!(1000000));
        assert_eq!(r.risk_weighted_assets, dec!(96000));
        assert_eq!(r.internal_capital_required, dec!(7680));
        assert_eq!(r.revenue, dec!(60000));
        assert_eq!(r.adjusted_trade_costs, dec!(20000));
        assert_eq!(r.net_earnings, dec!(40000));
        assert!(approx_eq(r.roe, dec!(520.8333), dec!(0.0001)), "roe {}", r.roe);
    }

    // -----------------------------------------------------------------------
    // Test 2: Post-hedge scenario
    // -----------------------------------------------------------------------
    #[test]
    fn test_post_hedge_scenario() {
        let (agg, metrics) = reference();
        let r = scenario_analytics(
            Scenario::PostHedge,
            &agg,
            &metrics,
            &ScenarioParameters::default(),
        ).unwrap();
        assert_eq!(r.adjusted_notional, dec!(1000000));
        assert_eq!(r.adjusted_yield, dec!(5.7));
        assert_eq!(r.revenue, dec!(57000));
        assert_eq!(r.adjusted_trade_costs, dec!(23000));
        assert_eq!(r.net_earnings, dec!(34000));
    }

    // -----------------------------------------------------------------------
    // Test 3: Future upsize scenario
    // -----------------------------------------------------------------------
    #[test]
    fn test_future_upsize_scenario() {
        let (agg, metrics) = reference();
        let r = scenario_analytics(
            Scenario::FutureUpsize,
            &agg,
            &metrics,
            &ScenarioParameters::default(),
        ).unwrap();
        assert_eq!(r.adjusted_notional, dec!(1500000));
        assert_eq!(r.adjusted_yield, dec!(6.6));
        assert_eq!(r.risk_weighted_assets, dec!(144000));
        assert_eq!(r.internal_capital_required, dec!(11520));
        assert_eq!(r.revenue, dec!(99000));
        assert_eq!(r.adjusted_trade_costs, dec!(18000));
        assert_eq!(r.net_earnings, dec!(81000));
    }

    // -----------------------------------------------------------------------
    // Test 4: Zero notional gives zero ROE, not a division error
    // -----------------------------------------------------------------------
    #[test]
    fn test_zero_capital_roe_zero() {
        let (_, metrics) = reference();
        let agg = PortfolioAggregate::default();
        let r = scenario_analytics(
            Scenario::Current,
            &agg,
            &metrics,
            &ScenarioParameters::default(),
        ).unwrap();
        assert_eq!(r.internal_capital_required, Decimal::ZERO);
        assert_eq!(r.roe, Decimal::ZERO);
    }

    #[test]
    fn test_all_scenarios_order() {
        let (agg, metrics) = reference();
        let all = all_scenarios(&agg, &metrics, &ScenarioParameters::default()).unwrap();
        let names: Vec<Scenario> = all.iter().map(|s| s.scenario).collect();
        assert_eq!(names, Scenario::ALL.to_vec());
    }

    #[test]
    fn test_custom_parameters() {
        let (agg, metrics) = reference();
        let params = ScenarioParameters {
            capital_ratio: dec!(0.16),
            ..Default::default()
        };
        let r = scenario_analytics(Scenario::Current, &agg, &metrics, &params).unwrap();
        assert_eq!(r.internal_capital_required, dec!(15360));
    }

    #[test]
    fn test_analyze_single_scenario() {
        let (agg, _) = reference();
        let input = AllocationInput {
            structure: TrancheStructure::with_tranches(
                "Deal",
                "loans",
                vec![
                    TrancheDefinition::new("Senior", dec!(70), dec!(150)),
                    TrancheDefinition::new("Mezz", dec!(20), dec!(250)),
                    TrancheDefinition::new("Sub", dec!(10), dec!(450)),
                ],
            ),
            aggregate: agg,
        };
        let out =
            analyze_scenarios(&input, Some(Scenario::PostHedge), &EngineConfig::default()).unwrap();
        assert_eq!(out.result.len(), 1);
        assert_eq!(out.result[0].net_earnings, dec!(34000));
        assert!(out.warnings.is_empty());

        let all = analyze_scenarios(&input, None, &EngineConfig::default()).unwrap();
        assert_eq!(all.result.len(), 3);
    }

    #[test]
    fn test_scenario_parsing() {
        assert_eq!("current".parse::<Scenario>().unwrap(), Scenario::Current);
        assert_eq!("postHedge".parse::<Scenario>().unwrap(), Scenario::PostHedge);
        assert_eq!("post-hedge".parse::<Scenario>().unwrap(), Scenario::PostHedge);
        assert_eq!("future_upsize".parse::<Scenario>().unwrap(), Scenario::FutureUpsize);
        assert!("stress".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_scenario_serializes_camel_case() {
        assert_eq!(serde_json::to_string(&Scenario::PostHedge).unwrap(), "\"postHedge\"");
    }

    // -----------------------------------------------------------------------
    // Test 5: Negative portfolio value is clamped like allocation sizing
    // -----------------------------------------------------------------------
    #[test]
    fn test_negative_value_clamped_to_zero() {
        let (_, metrics) = reference();
        let agg = PortfolioAggregate::new(dec!(-250000), dec!(6));
        for r in all_scenarios(&agg, &metrics, &ScenarioParameters::default()).unwrap() {
            assert_eq!(r.adjusted_notional, Decimal::ZERO);
            assert_eq!(r.internal_capital_required, Decimal::ZERO);
            assert_eq!(r.revenue, Decimal::ZERO);
            assert_eq!(r.roe, Decimal::ZERO);
        }
    }

    #[test]
    fn test_negative_value_warns_zero_capital() {
        let input = AllocationInput {
            structure: TrancheStructure::with_tranches(
                "Deal",
                "loans",
                vec![
                    TrancheDefinition::new("Senior", dec!(70), dec!(150)),
                    TrancheDefinition::new("Mezz", dec!(20), dec!(250)),
                    TrancheDefinition::new("Sub", dec!(10), dec!(450)),
                ],
            ),
            aggregate: PortfolioAggregate::new(dec!(-1), dec!(6)),
        };
        let out = analyze_scenarios(&input, None, &EngineConfig::default()).unwrap();
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("Internal capital is zero")));
        assert!(out.warnings.iter().any(|w| w.contains("negative")));
        assert!(out.result.iter().all(|r| r.internal_capital_required.is_zero()));
    }

    // -----------------------------------------------------------------------
    // Test 6: Overflowing projections are errors
    // -----------------------------------------------------------------------
    #[test]
    fn test_scenario_overflow_is_an_error() {
        let (agg, metrics) = reference();
        let params = ScenarioParameters {
            current: ScenarioMultipliers::new(Decimal::MAX, dec!(1), dec!(1)),
            ..Default::default()
        };
        let err = scenario_analytics(Scenario::Current, &agg, &metrics, &params).unwrap_err();
        assert!(err.to_string().contains("adjusted_notional"), "{err}");

        let config = EngineConfig {
            scenarios: params,
            ..Default::default()
        };
        let input = AllocationInput {
            structure: TrancheStructure::new("Deal", "loans"),
            aggregate: agg,
        };
        assert!(analyze_scenarios(&input, Some(Scenario::Current), &config).is_err());
    }
}
