//! Engine configuration.
//!
//! The scenario constants are policy parameters rather than derived values.
//! `Default` reproduces the figures the structuring desk has always used so
//! outputs stay comparable with the existing tool; a config file can
//! override any of them.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::WaterfallError;
use crate::WaterfallResult;

/// Notional / cost / yield multipliers for one named scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioMultipliers {
    pub notional: Decimal,
    pub cost: Decimal,
    #[serde(rename = "yield")]
    pub yield_mult: Decimal,
}

impl ScenarioMultipliers {
    pub const fn new(notional: Decimal, cost: Decimal, yield_mult: Decimal) -> Self {
        Self {
            notional,
            cost,
            yield_mult,
        }
    }
}

/// Capital and sensitivity constants for scenario analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParameters {
    /// Share of notional treated as risk exposure (0.08 = 8%).
    pub risk_ratio: Decimal,
    /// Multiplier applied on top of the risk ratio.
    pub risk_weighting_factor: Decimal,
    /// Internal capital held against risk-weighted assets (0.08 = 8%).
    pub capital_ratio: Decimal,
    pub current: ScenarioMultipliers,
    pub post_hedge: ScenarioMultipliers,
    pub future_upsize: ScenarioMultipliers,
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self {
            risk_ratio: dec!(0.08),
            risk_weighting_factor: dec!(1.2),
            capital_ratio: dec!(0.08),
            current: ScenarioMultipliers::new(dec!(1.0), dec!(1.0), dec!(1.0)),
            post_hedge: ScenarioMultipliers::new(dec!(1.0), dec!(1.15), dec!(0.95)),
            future_upsize: ScenarioMultipliers::new(dec!(1.5), dec!(0.9), dec!(1.1)),
        }
    }
}

/// Top-level configuration for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scenarios: ScenarioParameters,
    /// Allowed distance between the thickness sum and 100.
    pub thickness_tolerance: Decimal,
}

/// Tolerance on the 100% thickness check. Decimal arithmetic is exact for
/// typed-in values, but imported structures may carry long fractions.
pub const DEFAULT_THICKNESS_TOLERANCE: Decimal = dec!(0.000001);

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scenarios: ScenarioParameters::default(),
            thickness_tolerance: DEFAULT_THICKNESS_TOLERANCE,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config document. Missing fields fall back to defaults.
    pub fn from_json_str(s: &str) -> WaterfallResult<Self> {
        let config: EngineConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WaterfallResult<()> {
        if self.thickness_tolerance < Decimal::ZERO {
            return Err(WaterfallError::InvalidInput {
                field: "thickness_tolerance".into(),
                reason: "Tolerance cannot be negative".into(),
            });
        }
        let p = &self.scenarios;
        for (field, value) in [
            ("scenarios.risk_ratio", p.risk_ratio),
            ("scenarios.risk_weighting_factor", p.risk_weighting_factor),
            ("scenarios.capital_ratio", p.capital_ratio),
        ] {
            if value < Decimal::ZERO {
                return Err(WaterfallError::InvalidInput {
                    field: field.into(),
                    reason: "Must be non-negative".into(),
                });
            }
        }
        for (name, m) in [
            ("current", p.current),
            ("post_hedge", p.post_hedge),
            ("future_upsize", p.future_upsize),
        ] {
            if m.notional < Decimal::ZERO || m.cost < Decimal::ZERO || m.yield_mult < Decimal::ZERO
            {
                return Err(WaterfallError::InvalidInput {
                    field: format!("scenarios.{name}"),
                    reason: "Multipliers must be non-negative".into(),
                });
            }
        }
        Ok(())
    }
}
