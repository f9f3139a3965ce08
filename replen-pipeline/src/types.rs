//! Core data types flowing through the replenishment pipeline.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use replen_policy::{AllocationMode, PackRounding, RuleTag, SkuSnapshot};

/// One allocation request: how much capital, and what kind of run.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct OrderQuery {
    pub budget: f64,
    pub mode: AllocationMode,
}

impl OrderQuery {
    pub fn new(budget: f64, mode: AllocationMode) -> Self {
        OrderQuery { budget, mode }
    }
}

/// A product flowing through the pipeline.
///
/// `sku` holds the demand signals the decision engine reads; the rest is
/// what the allocator needs on top: identity, money, and the planning
/// fields filled in stage by stage (`planned_qty`, `decision_tags`,
/// `rounding`, `desirability`).
#[derive(Clone, Debug, Default)]
pub struct ProductCandidate {
    pub name: String,
    pub department: String,
    pub supplier: String,
    pub price: f64,
    pub margin_pct: f64,
    pub is_consignment: bool,
    /// Staples pinned above the tier price ceiling (anchor assortment).
    pub anchor_override: bool,
    pub sku: SkuSnapshot,

    // Planning fields, populated by the pipeline.
    pub planned_qty: u32,
    pub decision_tags: Vec<RuleTag>,
    pub rounding: Option<PackRounding>,
    pub desirability: Option<f64>,
}

impl ProductCandidate {
    /// Estimated cash cost of one unit. Selling price discounted by margin;
    /// implausible margins fall back to an assumed 25% markup.
    pub fn unit_cost(&self) -> f64 {
        if self.margin_pct > 0.0 && self.margin_pct < 100.0 {
            self.price * (1.0 - self.margin_pct / 100.0)
        } else {
            self.price * 0.75
        }
    }

    /// Candidates without a valid selling price can never be costed.
    pub fn has_valid_price(&self) -> bool {
        self.price > 0.0
    }
}

/// Which allocation pass accepted the item, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AllocationPass {
    Pass1,
    Pass2,
    Rejected,
}

/// Allocator-side events appended to the reasoning trail after the
/// decision-engine tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AllocationTag {
    Pass1Width,
    Pass2Depth,
    Consignment,
    AnchorOverride,
    PackRoundUp,
    PackRoundDown,
    Ineligible,
    PriceCeiling,
    ClassRestricted,
    WalletCap,
    BudgetExhausted,
}

impl fmt::Display for AllocationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AllocationTag::Pass1Width => "PASS1_WIDTH",
            AllocationTag::Pass2Depth => "PASS2_DEPTH",
            AllocationTag::Consignment => "CONSIGNMENT",
            AllocationTag::AnchorOverride => "ANCHOR_OVERRIDE",
            AllocationTag::PackRoundUp => "PACK_ROUND_UP",
            AllocationTag::PackRoundDown => "PACK_ROUND_DOWN",
            AllocationTag::Ineligible => "INELIGIBLE",
            AllocationTag::PriceCeiling => "PRICE_CEILING",
            AllocationTag::ClassRestricted => "CLASS_RESTRICTED",
            AllocationTag::WalletCap => "WALLET_CAP",
            AllocationTag::BudgetExhausted => "BUDGET_EXHAUSTED",
        };
        write!(f, "{}", s)
    }
}

/// Final verdict for one candidate.
#[derive(Clone, Debug, Serialize)]
pub struct AllocationResult {
    pub name: String,
    pub department: String,
    pub recommended_quantity: u32,
    /// Ordered rule trail, e.g. `BASELINE_FORECAST+MOQ_FLOOR+PASS2_DEPTH`.
    pub reasoning: String,
    pub estimated_cost: f64,
    pub is_consignment: bool,
    pub pass: AllocationPass,
}

/// How many candidates each blocking constraint turned away.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct SkipCounts {
    /// No valid price; never entered the money passes.
    pub ineligible: usize,
    /// Decision engine planned zero units.
    pub zero_quantity: usize,
    pub price_ceiling: usize,
    /// C-class discretionary items the tier does not range.
    pub class_restricted: usize,
    pub wallet_cap: usize,
    pub budget_exhausted: usize,
}

/// Aggregate accounting for one allocation run.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub budget: f64,
    pub tier: String,
    pub pass1_cash: f64,
    pub pass2_cash: f64,
    /// Always `pass1_cash + pass2_cash`, and never exceeds `budget`.
    pub total_cash_used: f64,
    pub total_consignment_value: f64,
    /// `budget - total_cash_used`, never negative.
    pub unused_budget: f64,
    pub items_stocked: usize,
    pub skip_counts: SkipCounts,
    /// Percent of each department wallet's allocation actually spent.
    pub department_utilization: BTreeMap<String, f64>,
}

/// Everything one allocation run produces.
#[derive(Clone, Debug, Serialize)]
pub struct RunOutcome {
    pub results: Vec<AllocationResult>,
    pub summary: RunSummary,
}
