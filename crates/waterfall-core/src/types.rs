use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WaterfallError;
use crate::WaterfallResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages expressed on a 0-100 scale (5.5 = 5.5%). Never as fractions.
pub type Percent = Decimal;

/// Basis points (150 = 1.50%).
pub type Bps = Decimal;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a tranche, unique within its structure. Allocations reuse it.
    TrancheId
);

string_id!(
    /// Identifier of a persisted tranche structure.
    StructureId
);

string_id!(
    /// Identifier of an investor that can hold tranches.
    InvestorId
);

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Overflow-checked arithmetic
// ---------------------------------------------------------------------------
//
// Decimal operators panic once a result leaves the ~7.9e28 range. Engine
// figures go through these instead and report the figure that overflowed.

pub(crate) fn overflow(field: &str) -> WaterfallError {
    WaterfallError::InvalidInput {
        field: field.into(),
        reason: "Arithmetic overflow; value out of range".into(),
    }
}

pub(crate) fn checked_add(field: &str, a: Decimal, b: Decimal) -> WaterfallResult<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow(field))
}

pub(crate) fn checked_sub(field: &str, a: Decimal, b: Decimal) -> WaterfallResult<Decimal> {
    a.checked_sub(b).ok_or_else(|| overflow(field))
}

pub(crate) fn checked_mul(field: &str, a: Decimal, b: Decimal) -> WaterfallResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(field))
}

/// a * b / c. `c` must be non-zero.
pub(crate) fn mul_div(field: &str, a: Decimal, b: Decimal, c: Decimal) -> WaterfallResult<Decimal> {
    a.checked_mul(b)
        .and_then(|v| v.checked_div(c))
        .ok_or_else(|| overflow(field))
}

pub(crate) fn checked_sum<I>(field: &str, values: I) -> WaterfallResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| checked_add(field, acc, v))
}

/// Divide, returning zero instead of failing when the denominator is zero.
pub(crate) fn ratio_or_zero(
    field: &str,
    numerator: Decimal,
    denominator: Decimal,
) -> WaterfallResult<Decimal> {
    if denominator.is_zero() {
        Ok(Decimal::ZERO)
    } else {
        numerator
            .checked_div(denominator)
            .ok_or_else(|| overflow(field))
    }
}
