use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::WaterfallError;
use crate::types::{Money, Percent};
use crate::WaterfallResult;

/// Reduced view of a loan dataset. The allocation engine only ever sees this
/// shape, never individual loan records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAggregate {
    /// Sum of opening balances across the dataset (or filtered subset).
    pub total_value: Money,
    #[serde(default)]
    pub record_count: u64,
    /// Mean interest rate on a 0-100 scale (5.5 = 5.5%).
    pub avg_interest_rate: Percent,
    /// Records whose probability of default exceeds the high-risk threshold.
    #[serde(default)]
    pub high_risk_count: u64,
}

impl PortfolioAggregate {
    pub fn new(total_value: Money, avg_interest_rate: Percent) -> Self {
        Self {
            total_value,
            avg_interest_rate,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> WaterfallResult<()> {
        if self.total_value < Decimal::ZERO {
            return Err(WaterfallError::InvalidInput {
                field: "total_value".into(),
                reason: "Portfolio value cannot be negative".into(),
            });
        }
        if self.high_risk_count > self.record_count {
            return Err(WaterfallError::InvalidInput {
                field: "high_risk_count".into(),
                reason: "High-risk count exceeds record count".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valid_aggregate() {
        let agg = PortfolioAggregate {
            total_value: dec!(1000000),
            record_count: 120,
            avg_interest_rate: dec!(6.0),
            high_risk_count: 7,
        };
        assert!(agg.validate().is_ok());
    }

    #[test]
    fn test_negative_value_rejected() {
        let agg = PortfolioAggregate::new(dec!(-1), dec!(5));
        assert!(agg.validate().is_err());
    }

    #[test]
    fn test_high_risk_above_count_rejected() {
        let agg = PortfolioAggregate {
            record_count: 2,
            high_risk_count: 3,
            ..Default::default()
        };
        assert!(agg.validate().is_err());
    }

    #[test]
    fn test_deserialize_counts_default_to_zero() {
        let agg: PortfolioAggregate =
            serde_json::from_str(r#"{"total_value": 500, "avg_interest_rate": 4.25}"#).unwrap();
        assert_eq!(agg.total_value, dec!(500));
        assert_eq!(agg.record_count, 0);
        assert_eq!(agg.high_risk_count, 0);
    }
}
