//! Investor assignment, per-investor rollups and concentration.
//!
//! Covers:
//! 1. **Assignments** -- tranche -> investor map, last assignment wins
//! 2. **Rollup** -- exposure, stack share and weighted cost per investor
//! 3. **HHI** -- sum of squared investor market shares (0-10,000)
//!
//! Market shares are shares of *assigned* exposure, not of the whole stack.
//! With nothing assigned every figure is zero.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::allocation::Allocation;
use crate::types::{
    checked_add, checked_mul, checked_sub, checked_sum, ratio_or_zero, Bps, InvestorId, Money,
    Percent, TrancheId,
};
use crate::WaterfallResult;

const HUNDRED: Decimal = dec!(100);
const HHI_MAX: Decimal = dec!(10000);

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

/// Current tranche-to-investor assignments. No history is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvestorAssignments {
    by_tranche: BTreeMap<TrancheId, InvestorId>,
}

impl InvestorAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a tranche to an investor, or clear it with `None`.
    /// Returns the investor previously holding the tranche.
    pub fn assign_investor(
        &mut self,
        allocation_id: &TrancheId,
        investor: Option<InvestorId>,
    ) -> Option<InvestorId> {
        match investor {
            Some(inv) => self.by_tranche.insert(allocation_id.clone(), inv),
            None => self.by_tranche.remove(allocation_id),
        }
    }

    pub fn investor_for(&self, allocation_id: &TrancheId) -> Option<&InvestorId> {
        self.by_tranche.get(allocation_id)
    }

    /// Tranches that currently have a holder, in id order.
    pub fn tranche_ids(&self) -> impl Iterator<Item = &TrancheId> {
        self.by_tranche.keys()
    }

    pub fn len(&self) -> usize {
        self.by_tranche.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tranche.is_empty()
    }

    /// Write the current assignments onto allocations. Tranches without an
    /// entry are cleared.
    pub fn apply_to(&self, allocations: &mut [Allocation]) {
        for a in allocations.iter_mut() {
            a.assigned_investor = self.by_tranche.get(&a.tranche_id).cloned();
        }
    }

    /// Copying variant of [`apply_to`](Self::apply_to).
    pub fn apply(&self, allocations: &[Allocation]) -> Vec<Allocation> {
        let mut out = allocations.to_vec();
        self.apply_to(&mut out);
        out
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Everything one investor holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorRollup {
    pub investor_id: InvestorId,
    pub total_exposure: Money,
    /// Sum of held tranche thicknesses.
    pub total_percent: Percent,
    /// Exposure-weighted cost of the held tranches.
    pub weighted_cost_bps: Bps,
    pub tranche_count: usize,
    pub tranche_ids: Vec<TrancheId>,
}

/// One investor's share of assigned exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorShare {
    pub investor_id: InvestorId,
    pub exposure: Money,
    pub market_share_percent: Percent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationSummary {
    /// Herfindahl-Hirschman Index over investor shares, 0-10,000.
    pub hhi: Decimal,
    /// Largest single investor's share of assigned exposure.
    pub max_concentration_percent: Percent,
    pub num_investors: usize,
    pub total_assigned_exposure: Money,
    pub unassigned_exposure: Money,
    /// 10,000 / HHI, zero when HHI is zero.
    pub effective_investors: Decimal,
    pub investor_shares: Vec<InvestorShare>,
}

// ---------------------------------------------------------------------------
// Calculations
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Holding {
    exposure: Money,
    percent: Percent,
    cost_weighted: Decimal,
    tranche_ids: Vec<TrancheId>,
}

fn holdings(allocations: &[Allocation]) -> WaterfallResult<BTreeMap<&InvestorId, Holding>> {
    let mut map: BTreeMap<&InvestorId, Holding> = BTreeMap::new();
    for a in allocations {
        if let Some(inv) = &a.assigned_investor {
            let h = map.entry(inv).or_default();
            h.exposure = checked_add("total_exposure", h.exposure, a.size)?;
            h.percent = checked_add("total_percent", h.percent, a.thickness_percent)?;
            let term = checked_mul("weighted_cost_bps", a.size, a.cost_bps)?;
            h.cost_weighted = checked_add("weighted_cost_bps", h.cost_weighted, term)?;
            h.tranche_ids.push(a.tranche_id.clone());
        }
    }
    Ok(map)
}

/// Per-investor totals, largest exposure first (ties by investor id).
pub fn investor_rollup(allocations: &[Allocation]) -> WaterfallResult<Vec<InvestorRollup>> {
    let mut rollups = holdings(allocations)?
        .into_iter()
        .map(|(inv, h)| {
            Ok(InvestorRollup {
                investor_id: inv.clone(),
                total_exposure: h.exposure,
                total_percent: h.percent,
                weighted_cost_bps: ratio_or_zero("weighted_cost_bps", h.cost_weighted, h.exposure)?,
                tranche_count: h.tranche_ids.len(),
                tranche_ids: h.tranche_ids,
            })
        })
        .collect::<WaterfallResult<Vec<InvestorRollup>>>()?;
    // BTreeMap order is by id, so a stable sort leaves ties id-ordered
    rollups.sort_by(|a, b| b.total_exposure.cmp(&a.total_exposure));
    Ok(rollups)
}

/// HHI and max single-holder share over assigned exposure.
pub fn concentration(allocations: &[Allocation]) -> WaterfallResult<ConcentrationSummary> {
    let holdings = holdings(allocations)?;
    let total_exposure = checked_sum("total_exposure", allocations.iter().map(|a| a.size))?;
    let total_assigned = checked_sum(
        "total_assigned_exposure",
        holdings.values().map(|h| h.exposure),
    )?;

    let mut investor_shares = holdings
        .iter()
        .map(|(inv, h)| {
            let share = ratio_or_zero("market_share_percent", h.exposure, total_assigned)?;
            Ok(InvestorShare {
                investor_id: (*inv).clone(),
                exposure: h.exposure,
                market_share_percent: checked_mul("market_share_percent", share, HUNDRED)?,
            })
        })
        .collect::<WaterfallResult<Vec<InvestorShare>>>()?;
    investor_shares.sort_by(|a, b| b.market_share_percent.cmp(&a.market_share_percent));

    let hhi = investor_shares.iter().try_fold(Decimal::ZERO, |acc, s| {
        let square = checked_mul("hhi", s.market_share_percent, s.market_share_percent)?;
        checked_add("hhi", acc, square)
    })?;
    let max_concentration_percent = investor_shares
        .first()
        .map(|s| s.market_share_percent)
        .unwrap_or(Decimal::ZERO);

    Ok(ConcentrationSummary {
        hhi,
        max_concentration_percent,
        num_investors: investor_shares.len(),
        total_assigned_exposure: total_assigned,
        unassigned_exposure: checked_sub("unassigned_exposure", total_exposure, total_assigned)?,
        effective_investors: ratio_or_zero("effective_investors", HHI_MAX, hhi)?,
        investor_shares,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
