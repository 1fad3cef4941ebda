//! Loan records and their reduction to a [`PortfolioAggregate`].
//!
//! Product families carry different field sets, so each is its own variant
//! rather than one record with a pile of optional columns. Only the shared
//! accessors feed the aggregate.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::portfolio::PortfolioAggregate;
use crate::types::{checked_add, with_metadata, ComputationOutput, Money, Percent};
use crate::WaterfallResult;

/// Probability of default above which a record counts as high risk.
pub const HIGH_RISK_PD_THRESHOLD: Decimal = dec!(0.05);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanKind {
    Consumer,
    Corporate,
    Mortgage,
}

/// One row of an uploaded loan portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoanRecord {
    Consumer {
        loan_id: String,
        opening_balance: Money,
        /// Percent, 0-100
        interest_rate: Percent,
        /// Fraction, 0-1
        probability_of_default: Decimal,
        term_months: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        credit_score: Option<u32>,
    },
    Corporate {
        loan_id: String,
        opening_balance: Money,
        interest_rate: Percent,
        probability_of_default: Decimal,
        borrower: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sector: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        facility_type: Option<String>,
    },
    Mortgage {
        loan_id: String,
        opening_balance: Money,
        interest_rate: Percent,
        probability_of_default: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loan_to_value: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        property_type: Option<String>,
    },
}

impl LoanRecord {
    pub fn kind(&self) -> LoanKind {
        match self {
            LoanRecord::Consumer { .. } => LoanKind::Consumer,
            LoanRecord::Corporate { .. } => LoanKind::Corporate,
            LoanRecord::Mortgage { .. } => LoanKind::Mortgage,
        }
    }

    pub fn loan_id(&self) -> &str {
        match self {
            LoanRecord::Consumer { loan_id, .. }
            | LoanRecord::Corporate { loan_id, .. }
            | LoanRecord::Mortgage { loan_id, .. } => loan_id,
        }
    }

    pub fn opening_balance(&self) -> Money {
        match self {
            LoanRecord::Consumer {
                opening_balance, ..
            }
            | LoanRecord::Corporate {
                opening_balance, ..
            }
            | LoanRecord::Mortgage {
                opening_balance, ..
            } => *opening_balance,
        }
    }

    pub fn interest_rate(&self) -> Percent {
        match self {
            LoanRecord::Consumer { interest_rate, .. }
            | LoanRecord::Corporate { interest_rate, .. }
            | LoanRecord::Mortgage { interest_rate, .. } => *interest_rate,
        }
    }

    pub fn probability_of_default(&self) -> Decimal {
        match self {
            LoanRecord::Consumer {
                probability_of_default,
                ..
            }
            | LoanRecord::Corporate {
                probability_of_default,
                ..
            }
            | LoanRecord::Mortgage {
                probability_of_default,
                ..
            } => *probability_of_default,
        }
    }

    pub fn is_high_risk(&self) -> bool {
        self.probability_of_default() > HIGH_RISK_PD_THRESHOLD
    }
}

/// Optional narrowing applied before aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateFilter {
    pub kind: Option<LoanKind>,
    pub min_balance: Option<Money>,
    pub max_balance: Option<Money>,
    pub high_risk_only: bool,
}

impl AggregateFilter {
    pub fn matches(&self, record: &LoanRecord) -> bool {
        if self.kind.is_some_and(|k| k != record.kind()) {
            return false;
        }
        let balance = record.opening_balance();
        if self.min_balance.is_some_and(|min| balance < min) {
            return false;
        }
        if self.max_balance.is_some_and(|max| balance > max) {
            return false;
        }
        !self.high_risk_only || record.is_high_risk()
    }
}

/// Reduce records to the aggregate the allocation engine consumes.
///
/// `avg_interest_rate` is the simple mean across matching records, zero when
/// none match. Balances whose total leaves the Decimal range are an error.
pub fn summarize_records(
    records: &[LoanRecord],
    filter: &AggregateFilter,
) -> WaterfallResult<PortfolioAggregate> {
    let mut total_value = Decimal::ZERO;
    let mut rate_sum = Decimal::ZERO;
    let mut record_count: u64 = 0;
    let mut high_risk_count: u64 = 0;

    for record in records.iter().filter(|r| filter.matches(r)) {
        total_value = checked_add("total_value", total_value, record.opening_balance())?;
        rate_sum = checked_add("avg_interest_rate", rate_sum, record.interest_rate())?;
        record_count += 1;
        if record.is_high_risk() {
            high_risk_count += 1;
        }
    }

    let avg_interest_rate = if record_count == 0 {
        Decimal::ZERO
    } else {
        rate_sum / Decimal::from(record_count)
    };

    Ok(PortfolioAggregate {
        total_value,
        record_count,
        avg_interest_rate,
        high_risk_count,
    })
}

/// A raw record set plus the filter to reduce it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSummaryInput {
    pub records: Vec<LoanRecord>,
    #[serde(default)]
    pub filter: AggregateFilter,
}

/// [`summarize_records`] in the standard output envelope.
pub fn summarize_portfolio(
    input: &PortfolioSummaryInput,
) -> WaterfallResult<ComputationOutput<PortfolioAggregate>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let aggregate = summarize_records(&input.records, &input.filter)?;
    aggregate.validate()?;
    if aggregate.record_count == 0 {
        warnings.push(format!(
            "No records matched the filter ({} supplied)",
            input.records.len()
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Portfolio summary: balance total, simple mean rate, PD above threshold counted as high risk",
        &serde_json::json!({
            "records_supplied": input.records.len(),
            "high_risk_pd_threshold": HIGH_RISK_PD_THRESHOLD.to_string(),
            "filter": input.filter,
        }),
        warnings,
        elapsed,
        aggregate,
    ))
}
