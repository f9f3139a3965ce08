//! Store tier profiles.
//!
//! A run's capital budget selects exactly one tier. Every downstream knob
//! (price ceiling, coverage depth, pack caps, wallet buffer) comes from the
//! selected profile, so selection must be pure and idempotent: same budget,
//! same profile, always.

use serde::Serialize;

/// Operating parameters for one store size class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TierProfile {
    pub name: &'static str,
    /// Smallest budget that lands in this tier.
    pub budget_floor: f64,
    /// Max unit selling price a discretionary item may carry.
    pub price_ceiling: f64,
    /// Target days of cover for a standard replenishment.
    pub depth_days: f64,
    /// Hard cap on packs per SKU per order.
    pub max_packs: u32,
    /// Smallest presentable quantity for a stocked item.
    pub min_display_qty: u32,
    /// Departments may overshoot their wallet by this fraction.
    pub wallet_buffer_pct: f64,
    /// Whether C-class items are worth shelf space at this scale.
    pub allow_c_class: bool,
}

/// Tiers ordered by ascending budget floor. Selection walks this table from
/// the top; ceilings, depth, and caps all widen monotonically with budget.
const TIERS: [TierProfile; 5] = [
    TierProfile {
        name: "micro",
        budget_floor: 0.0,
        price_ceiling: 300.0,
        depth_days: 7.0,
        max_packs: 12,
        min_display_qty: 3,
        wallet_buffer_pct: 0.10,
        allow_c_class: false,
    },
    TierProfile {
        name: "small",
        budget_floor: 200_000.0,
        price_ceiling: 500.0,
        depth_days: 10.0,
        max_packs: 18,
        min_display_qty: 3,
        wallet_buffer_pct: 0.15,
        allow_c_class: false,
    },
    TierProfile {
        name: "mid",
        budget_floor: 1_000_000.0,
        price_ceiling: 2_500.0,
        depth_days: 14.0,
        max_packs: 24,
        min_display_qty: 6,
        wallet_buffer_pct: 0.25,
        allow_c_class: true,
    },
    TierProfile {
        name: "large",
        budget_floor: 10_000_000.0,
        price_ceiling: 20_000.0,
        depth_days: 21.0,
        max_packs: 48,
        min_display_qty: 12,
        wallet_buffer_pct: 0.50,
        allow_c_class: true,
    },
    TierProfile {
        name: "mega",
        budget_floor: 50_000_000.0,
        price_ceiling: 100_000.0,
        depth_days: 30.0,
        max_packs: 999,
        min_display_qty: 24,
        wallet_buffer_pct: 1.00,
        allow_c_class: true,
    },
];

/// Select the tier whose budget floor is the highest one at or below `budget`.
/// Negative or NaN budgets fall back to the smallest tier.
pub fn profile_for_budget(budget: f64) -> &'static TierProfile {
    let mut selected = &TIERS[0];
    for tier in TIERS.iter() {
        if budget >= tier.budget_floor {
            selected = tier;
        }
    }
    selected
}
