use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::config::DEFAULT_THICKNESS_TOLERANCE;
use crate::error::WaterfallError;
use crate::structuring::store::StructureStore;
use crate::types::{checked_sum, Bps, Percent, StructureId, TrancheId};
use crate::WaterfallResult;

/// Fewest tranches a savable structure may hold.
pub const MIN_TRANCHES: usize = 3;
/// Most tranches a structure may hold.
pub const MAX_TRANCHES: usize = 10;

const FULL_STACK: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single tranche as entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrancheDefinition {
    #[serde(default = "TrancheId::generate")]
    pub id: TrancheId,
    /// Free-text name; may embed a rating token such as "AAA".
    pub name: String,
    /// Share of the capital stack (0-100).
    pub thickness_percent: Percent,
    /// Annual cost in basis points.
    pub cost_bps: Bps,
    /// Share of the tranche that is hedged (0-100).
    #[serde(default)]
    pub hedged_percent: Percent,
}

impl TrancheDefinition {
    pub fn new(name: impl Into<String>, thickness_percent: Percent, cost_bps: Bps) -> Self {
        Self {
            id: TrancheId::generate(),
            name: name.into(),
            thickness_percent,
            cost_bps,
            hedged_percent: Decimal::ZERO,
        }
    }

    pub fn with_id(mut self, id: impl Into<TrancheId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_hedge(mut self, hedged_percent: Percent) -> Self {
        self.hedged_percent = hedged_percent;
        self
    }
}

/// Single-field edit applied by [`TrancheStructure::update_tranche`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum TrancheUpdate {
    Name(String),
    ThicknessPercent(Percent),
    CostBps(Bps),
    HedgedPercent(Percent),
}

/// A named tranche stack over one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrancheStructure {
    #[serde(default = "StructureId::generate")]
    pub id: StructureId,
    pub name: String,
    /// Dataset whose portfolio aggregate the structure is sized against.
    pub dataset_name: String,
    pub tranches: Vec<TrancheDefinition>,
}

/// Outcome of checking a structure against the save rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureValidation {
    pub valid: bool,
    pub thickness_sum: Percent,
    pub tranche_count: usize,
    pub reasons: Vec<String>,
}

// ---------------------------------------------------------------------------
// Structure editing
// ---------------------------------------------------------------------------

impl TrancheStructure {
    /// Start a structure for `dataset_name` with the minimum number of empty tranches.
    pub fn new(name: impl Into<String>, dataset_name: impl Into<String>) -> Self {
        let tranches = (1..=MIN_TRANCHES)
            .map(|n| TrancheDefinition::new(format!("Tranche {n}"), Decimal::ZERO, Decimal::ZERO))
            .collect();
        Self {
            id: StructureId::generate(),
            name: name.into(),
            dataset_name: dataset_name.into(),
            tranches,
        }
    }

    /// Build a structure from an existing tranche list. Nothing is validated here.
    pub fn with_tranches(
        name: impl Into<String>,
        dataset_name: impl Into<String>,
        tranches: Vec<TrancheDefinition>,
    ) -> Self {
        Self {
            id: StructureId::generate(),
            name: name.into(),
            dataset_name: dataset_name.into(),
            tranches,
        }
    }

    pub fn tranche(&self, id: &TrancheId) -> Option<&TrancheDefinition> {
        self.tranches.iter().find(|t| &t.id == id)
    }

    /// Append a default tranche (zero thickness, cost and hedge).
    pub fn add_tranche(&mut self) -> WaterfallResult<TrancheId> {
        if self.tranches.len() >= MAX_TRANCHES {
            warn!(structure = %self.id, "add_tranche rejected: structure is full");
            return Err(WaterfallError::TooManyTranches { max: MAX_TRANCHES });
        }
        let tranche = TrancheDefinition::new(
            format!("Tranche {}", self.tranches.len() + 1),
            Decimal::ZERO,
            Decimal::ZERO,
        );
        let id = tranche.id.clone();
        self.tranches.push(tranche);
        debug!(structure = %self.id, tranche = %id, count = self.tranches.len(), "tranche added");
        Ok(id)
    }

    /// Remove a tranche. The structure is left untouched on error.
    pub fn remove_tranche(&mut self, id: &TrancheId) -> WaterfallResult<TrancheDefinition> {
        let idx = self
            .tranches
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| WaterfallError::TrancheNotFound(id.to_string()))?;
        if self.tranches.len() <= MIN_TRANCHES {
            warn!(structure = %self.id, tranche = %id, "remove_tranche rejected: at minimum size");
            return Err(WaterfallError::TooFewTranches { min: MIN_TRANCHES });
        }
        let removed = self.tranches.remove(idx);
        debug!(structure = %self.id, tranche = %id, count = self.tranches.len(), "tranche removed");
        Ok(removed)
    }

    /// Change one field of one tranche. Cross-field rules wait until save.
    pub fn update_tranche(&mut self, id: &TrancheId, update: TrancheUpdate) -> WaterfallResult<()> {
        let tranche = self
            .tranches
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| WaterfallError::TrancheNotFound(id.to_string()))?;
        match update {
            TrancheUpdate::Name(name) => tranche.name = name,
            TrancheUpdate::ThicknessPercent(v) => tranche.thickness_percent = v,
            TrancheUpdate::CostBps(v) => tranche.cost_bps = v,
            TrancheUpdate::HedgedPercent(v) => tranche.hedged_percent = v,
        }
        Ok(())
    }

    /// Swap in a whole new tranche list.
    pub fn replace_tranches(&mut self, tranches: Vec<TrancheDefinition>) {
        self.tranches = tranches;
    }

    /// Sum of tranche thicknesses. Errors if the sum leaves the Decimal range.
    pub fn thickness_sum(&self) -> WaterfallResult<Percent> {
        checked_sum(
            "thickness_sum",
            self.tranches.iter().map(|t| t.thickness_percent),
        )
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Check the save rules using an explicit tolerance on the 100% sum.
    pub fn validation_with(&self, tolerance: Decimal) -> StructureValidation {
        let tranche_count = self.tranches.len();
        let mut reasons = Vec::new();

        let thickness_sum = match self.thickness_sum() {
            Ok(sum) => {
                let off_by = sum.checked_sub(FULL_STACK).map(|d| d.abs());
                if off_by.map_or(true, |d| d > tolerance) {
                    reasons.push(format!(
                        "Tranche thicknesses sum to {}%, expected 100%",
                        sum.normalize()
                    ));
                }
                sum
            }
            Err(_) => {
                reasons.push("Tranche thicknesses are out of range".to_string());
                Decimal::MAX
            }
        };
        if !(MIN_TRANCHES..=MAX_TRANCHES).contains(&tranche_count) {
            reasons.push(format!(
                "Structure has {tranche_count} tranches, expected between {MIN_TRANCHES} and {MAX_TRANCHES}"
            ));
        }
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for t in &self.tranches {
            if !seen.insert(&t.id) {
                duplicates.insert(&t.id);
            }
        }
        for id in duplicates {
            reasons.push(format!("Tranche id '{id}' is used more than once"));
        }

        StructureValidation {
            valid: reasons.is_empty(),
            thickness_sum,
            tranche_count,
            reasons,
        }
    }

    pub fn validation(&self) -> StructureValidation {
        self.validation_with(DEFAULT_THICKNESS_TOLERANCE)
    }

    /// True iff thicknesses sum to 100, the tranche count is within bounds and
    /// every tranche id is unique.
    pub fn is_valid(&self) -> bool {
        self.validation().valid
    }

    pub fn validate_with(&self, tolerance: Decimal) -> WaterfallResult<()> {
        let report = self.validation_with(tolerance);
        if report.valid {
            Ok(())
        } else {
            Err(WaterfallError::InvalidStructure {
                reasons: report.reasons,
            })
        }
    }

    pub fn validate(&self) -> WaterfallResult<()> {
        self.validate_with(DEFAULT_THICKNESS_TOLERANCE)
    }

    /// Validate, then hand the structure to the store.
    pub fn save<S: StructureStore + ?Sized>(&self, store: &mut S) -> WaterfallResult<StructureId> {
        if let Err(e) = self.validate() {
            warn!(structure = %self.id, error = %e, "save rejected");
            return Err(e);
        }
        let id = store.save(self)?;
        debug!(structure = %id, dataset = %self.dataset_name, "structure saved");
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
