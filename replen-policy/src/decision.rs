//! Staged rule engine producing an ideal order quantity per product.
//!
//! The engine is an ordered list of stages. Each stage either passes an
//! adjusted quantity to the next stage (`Continue`) or ends the run with a
//! final answer (`Terminal`), and records the rules it fired. Stages only
//! see the snapshot, the tier profile, and the running quantity; there is
//! no cross-product state, so deciding the same snapshot twice always gives
//! the same answer.
//!
//! Stage order: dead-stock guard, baseline, demand adjustment, strategic
//! coverage, replenishment gate, logistics bounds.

use crate::coverage::{coverage_days, SUNSET_COVERAGE_DAYS};
use crate::profile::TierProfile;
use crate::types::{AllocationMode, RuleTag, SkuSnapshot, Trend};

// ---------------------------------------------------------------------------
// Rule thresholds
// ---------------------------------------------------------------------------

/// Fresh goods count as dead stock after this many days without a sale.
const FRESH_STALENESS_DAYS: f64 = 120.0;
/// Non-fresh goods get a longer leash before the dead-stock guard fires.
const DRY_STALENESS_DAYS: f64 = 200.0;
/// Width of the pre-dead-stock window where orders are trimmed, not blocked.
const BUFFER_ZONE_DAYS: f64 = 40.0;
/// Trim factor applied inside the buffer zone.
const BUFFER_ZONE_FACTOR: f64 = 0.8;

/// Look-alike demand never seeds more than this many days of cover (fresh).
const LOOKALIKE_COVER_CAP_FRESH: f64 = 7.0;
/// Look-alike cover cap for non-fresh goods.
const LOOKALIKE_COVER_CAP_DRY: f64 = 21.0;

/// Growth beyond this percent earns the minor uplift.
const TREND_UP_MINOR_PCT: f64 = 10.0;
const TREND_UP_MINOR_FACTOR: f64 = 1.15;
/// Growth beyond this percent earns the major uplift instead.
const TREND_UP_MAJOR_PCT: f64 = 25.0;
const TREND_UP_MAJOR_FACTOR: f64 = 1.20;
/// Decline beyond this percent trims the order.
const TREND_DOWN_PCT: f64 = 10.0;
const TREND_DOWN_FACTOR: f64 = 0.85;

/// Expiry-return count above which the supplier is a quality risk.
const QUALITY_RISK_RETURNS: u32 = 20;
const QUALITY_RISK_FACTOR: f64 = 0.90;

/// Safety buffer added to lead time when computing the reorder point.
const LEAD_BUFFER_LONG: f64 = 3.0;
const LEAD_BUFFER_SHORT: f64 = 1.0;
/// Lead times at or above this many days use the long buffer.
const LONG_LEAD_DAYS: f64 = 4.0;
/// Non-key items reorder only below this fraction of the reorder point.
const REORDER_TRIGGER_FRACTION: f64 = 0.5;

/// Demand-CV split between the calm and volatile key-SKU safety bumps.
const KEY_CV_SPLIT: f64 = 0.5;
const KEY_BUMP_LOW_CV: f64 = 1.10;
const KEY_BUMP_HIGH_CV: f64 = 1.25;

/// Days of cover beyond which on-hand stock blocks any further order.
const OVERSTOCK_COVER_FRESH: f64 = 10.0;
const OVERSTOCK_COVER_DRY: f64 = 45.0;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Final verdict for one product: ideal (un-rounded) quantity plus the rules
/// that produced it, in firing order.
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub quantity: f64,
    pub tags: Vec<RuleTag>,
}

enum StageOutcome {
    /// Stop here; this is the final quantity.
    Terminal(f64),
    /// Pass the adjusted quantity to the next stage.
    Continue(f64),
}

struct Ctx<'a> {
    sku: &'a SkuSnapshot,
    profile: &'a TierProfile,
    mode: AllocationMode,
}

impl Ctx<'_> {
    /// On-hand stock as the rules see it; an initial load starts empty.
    fn effective_stock(&self) -> f64 {
        match self.mode {
            AllocationMode::InitialLoad => 0.0,
            AllocationMode::Replenishment => self.sku.current_stock,
        }
    }

    /// Best available daily velocity: own forecast, else look-alike, else 0.
    fn velocity(&self) -> f64 {
        if self.sku.avg_daily_sales > 0.0 {
            self.sku.avg_daily_sales
        } else if self.sku.lookalike_daily_sales > 0.0 {
            self.sku.lookalike_daily_sales
        } else {
            0.0
        }
    }

    fn staleness_days(&self) -> f64 {
        if self.sku.is_fresh {
            FRESH_STALENESS_DAYS
        } else {
            DRY_STALENESS_DAYS
        }
    }
}

type Stage = fn(&Ctx, f64, &mut Vec<RuleTag>) -> StageOutcome;

const STAGES: [Stage; 6] = [
    dead_stock_guard,
    baseline,
    demand_adjustment,
    strategic_coverage,
    replenishment_gate,
    logistics_bounds,
];

/// Decide the ideal order quantity for one product.
pub fn decide(sku: &SkuSnapshot, profile: &TierProfile, mode: AllocationMode) -> Decision {
    let ctx = Ctx { sku, profile, mode };
    let mut tags = Vec::new();
    let mut qty = 0.0;

    for stage in STAGES {
        match stage(&ctx, qty, &mut tags) {
            StageOutcome::Terminal(q) => {
                return Decision {
                    quantity: q.max(0.0),
                    tags,
                }
            }
            StageOutcome::Continue(q) => qty = q,
        }
    }

    Decision {
        quantity: qty.max(0.0),
        tags,
    }
}

// --- Stage 0: Dead-Stock Guard ---
// Stock on hand, zero sales in 90 days, delivery older than the staleness
// threshold: ordering more only deepens the write-off. Promo items bypass
// the guard (a promotion is a deliberate attempt to move exactly this kind
// of stock), and an initial load has no aging history to judge.
fn dead_stock_guard(ctx: &Ctx, qty: f64, tags: &mut Vec<RuleTag>) -> StageOutcome {
    if ctx.mode == AllocationMode::InitialLoad {
        return StageOutcome::Continue(qty);
    }
    let sku = ctx.sku;
    if sku.current_stock > 0.0
        && sku.units_sold_last_90d <= 0.0
        && sku.days_since_delivery > ctx.staleness_days()
    {
        if sku.is_promo {
            tags.push(RuleTag::PromoOverride);
            return StageOutcome::Continue(qty);
        }
        tags.push(RuleTag::DeadStockGuard);
        return StageOutcome::Terminal(0.0);
    }
    StageOutcome::Continue(qty)
}

// --- Stage 1: Baseline ---
// Seed the quantity from the strongest demand signal available. Look-alike
// demand is capped so a single neighboring product cannot commit weeks of
// cover to an unproven item.
fn baseline(ctx: &Ctx, _qty: f64, tags: &mut Vec<RuleTag>) -> StageOutcome {
    let sku = ctx.sku;
    let depth = ctx.profile.depth_days;

    if sku.avg_daily_sales > 0.0 {
        tags.push(RuleTag::BaselineForecast);
        return StageOutcome::Continue(sku.avg_daily_sales * depth);
    }
    if sku.lookalike_daily_sales > 0.0 {
        let cap = if sku.is_fresh {
            LOOKALIKE_COVER_CAP_FRESH
        } else {
            LOOKALIKE_COVER_CAP_DRY
        };
        tags.push(RuleTag::BaselineLookalike);
        return StageOutcome::Continue(sku.lookalike_daily_sales * depth.min(cap));
    }
    if sku.historical_avg_order_qty > 0.0 {
        tags.push(RuleTag::BaselineHistory);
        return StageOutcome::Continue(sku.historical_avg_order_qty);
    }
    if sku.is_promo {
        // A promoted item must be on the shelf even with no demand signal.
        tags.push(RuleTag::PromoBaseline);
        return StageOutcome::Continue(sku.pack_size.max(1) as f64);
    }
    tags.push(RuleTag::NoDemandSignal);
    StageOutcome::Terminal(0.0)
}

// --- Stage 2: Demand Adjustment ---
// Multiplicative, independent corrections applied in sequence.
fn demand_adjustment(ctx: &Ctx, qty: f64, tags: &mut Vec<RuleTag>) -> StageOutcome {
    let sku = ctx.sku;
    let mut qty = qty;

    match sku.trend {
        Trend::Growing if sku.trend_pct >= TREND_UP_MAJOR_PCT => {
            qty *= TREND_UP_MAJOR_FACTOR;
            tags.push(RuleTag::TrendUp);
        }
        Trend::Growing if sku.trend_pct >= TREND_UP_MINOR_PCT => {
            qty *= TREND_UP_MINOR_FACTOR;
            tags.push(RuleTag::TrendUp);
        }
        Trend::Declining if sku.trend_pct >= TREND_DOWN_PCT => {
            qty *= TREND_DOWN_FACTOR;
            tags.push(RuleTag::TrendDown);
        }
        _ => {}
    }

    if sku.expiry_returns > QUALITY_RISK_RETURNS {
        qty *= QUALITY_RISK_FACTOR;
        tags.push(RuleTag::QualityRisk);
    }

    // Approaching the dead-stock threshold without a sale: keep the item
    // alive but stop feeding it at full depth.
    if ctx.mode == AllocationMode::Replenishment && sku.current_stock > 0.0 {
        let staleness = ctx.staleness_days();
        if sku.units_sold_last_90d <= 0.0
            && sku.days_since_delivery > staleness - BUFFER_ZONE_DAYS
            && sku.days_since_delivery <= staleness
        {
            qty *= BUFFER_ZONE_FACTOR;
            tags.push(RuleTag::BufferZone);
        }
    }

    StageOutcome::Continue(qty)
}

// --- Stage 3: Strategic Coverage ---
// Rescale the baseline to the coverage depth its ABC x XYZ class deserves,
// then net out what is already on the shelf. The rescale is a ratio against
// the tier depth so stage-2 adjustments survive it.
fn strategic_coverage(ctx: &Ctx, qty: f64, tags: &mut Vec<RuleTag>) -> StageOutcome {
    let sku = ctx.sku;
    let mut qty = qty;

    if ctx.velocity() > 0.0 && ctx.profile.depth_days > 0.0 {
        let mut cover = coverage_days(sku.abc, sku.xyz, ctx.profile.depth_days);
        tags.push(RuleTag::Coverage(sku.abc, sku.xyz));
        if sku.is_sunset && cover > SUNSET_COVERAGE_DAYS {
            cover = SUNSET_COVERAGE_DAYS;
            tags.push(RuleTag::SunsetClamp);
        }
        qty *= cover / ctx.profile.depth_days;
    } else if sku.is_sunset {
        tags.push(RuleTag::SunsetClamp);
        qty = qty.min(ctx.sku.pack_size.max(1) as f64);
    }

    // Net requirement: the shelf already holds part of the target. Promo
    // quantities stay gross; a promotion buys display volume on purpose.
    if !sku.is_promo {
        qty = (qty - ctx.effective_stock()).max(0.0);
    }

    // A delisting item with an empty shelf still gets a token presence so
    // the facing is not blank before the range change lands.
    if sku.is_sunset && ctx.effective_stock() <= 0.0 {
        let floor = sku.pack_size.max(1) as f64;
        if qty < floor {
            qty = floor;
            tags.push(RuleTag::SunsetFloor);
        }
    }

    StageOutcome::Continue(qty)
}

// --- Stage 4: Replenishment Gate ---
// Only order when the shelf is actually approaching its reorder point.
// Key SKUs are held to the full reorder point with a volatility-scaled
// safety bump; everything else waits until stock falls below half of it.
fn replenishment_gate(ctx: &Ctx, qty: f64, tags: &mut Vec<RuleTag>) -> StageOutcome {
    if ctx.mode == AllocationMode::InitialLoad || ctx.sku.is_promo {
        return StageOutcome::Continue(qty);
    }
    if qty <= 0.0 {
        return StageOutcome::Continue(qty);
    }
    let sku = ctx.sku;

    // An order younger than the supplier's lead time is still in transit.
    if sku.lead_time_days > 0.0 && sku.days_since_order < sku.lead_time_days {
        tags.push(RuleTag::RecentOrder);
        return StageOutcome::Terminal(0.0);
    }

    let rate = ctx.velocity();
    let stock = ctx.effective_stock();
    if rate <= 0.0 {
        // No safe ratio. With stock on hand there is no urgency; with an
        // empty shelf let the history-derived baseline through.
        if stock > 0.0 {
            tags.push(RuleTag::AboveReorderPoint);
            return StageOutcome::Terminal(0.0);
        }
        return StageOutcome::Continue(qty);
    }

    let lead_buffer = if sku.lead_time_days >= LONG_LEAD_DAYS {
        LEAD_BUFFER_LONG
    } else {
        LEAD_BUFFER_SHORT
    };
    let reorder_point = rate * (sku.lead_time_days.max(0.0) + lead_buffer);

    if sku.is_key_sku {
        if stock < reorder_point {
            let bump = if sku.demand_cv < KEY_CV_SPLIT {
                KEY_BUMP_LOW_CV
            } else {
                KEY_BUMP_HIGH_CV
            };
            tags.push(RuleTag::KeySkuBump);
            return StageOutcome::Continue(qty * bump);
        }
        tags.push(RuleTag::AboveReorderPoint);
        return StageOutcome::Terminal(0.0);
    }

    if stock < reorder_point * REORDER_TRIGGER_FRACTION {
        StageOutcome::Continue(qty)
    } else {
        tags.push(RuleTag::AboveReorderPoint);
        StageOutcome::Terminal(0.0)
    }
}

// --- Stage 5: Logistics Bounds ---
// Supplier MOQ floor, anti-overstock cap, and the initial-load display floor.
fn logistics_bounds(ctx: &Ctx, qty: f64, tags: &mut Vec<RuleTag>) -> StageOutcome {
    let sku = ctx.sku;
    let mut qty = qty;

    if ctx.mode == AllocationMode::Replenishment && !sku.is_promo && !sku.is_key_sku {
        let rate = ctx.velocity();
        if rate > 0.0 {
            let upper = if sku.is_fresh {
                OVERSTOCK_COVER_FRESH
            } else {
                OVERSTOCK_COVER_DRY
            };
            if ctx.effective_stock() / rate > upper {
                tags.push(RuleTag::OverstockCap);
                return StageOutcome::Terminal(0.0);
            }
        }
    }

    if qty > 0.0 && qty < sku.moq_floor as f64 {
        qty = sku.moq_floor as f64;
        tags.push(RuleTag::MoqFloor);
    }

    if ctx.mode == AllocationMode::InitialLoad && qty > 0.0 {
        let floor = ctx.profile.min_display_qty.max(sku.pack_size).max(1) as f64;
        if qty < floor {
            qty = floor;
            tags.push(RuleTag::MinDisplayQty);
        }
    }

    StageOutcome::Continue(qty)
}
