//! Shared value types for the policy engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Demand trend direction as classified upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Trend {
    Growing,
    #[default]
    Stable,
    Declining,
}

/// ABC revenue-importance rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum AbcRank {
    A,
    #[default]
    B,
    C,
}

/// XYZ demand-stability rank (X = steady, Z = erratic).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum XyzRank {
    X,
    #[default]
    Y,
    Z,
}

/// Stockout risk level driving the pack rounding bias.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockoutRisk {
    High,
    Medium,
    Low,
}

/// What kind of run this is.
///
/// `InitialLoad` is the greenfield case: an empty store being stocked for the
/// first time. Starting stock is treated as zero, aging guards are skipped,
/// and every stocked item gets at least a displayable quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AllocationMode {
    #[default]
    Replenishment,
    InitialLoad,
}

/// Per-product view the decision engine reads.
///
/// The pipeline owns the full candidate record (names, departments, costs);
/// this is the slice of it the quantity rules actually consume. All numeric
/// fields use tolerant zero defaults upstream, so the rules must treat zero
/// as "unknown" where that matters (velocity, lead time).
#[derive(Clone, Debug, Default)]
pub struct SkuSnapshot {
    pub price: f64,
    pub pack_size: u32,
    pub current_stock: f64,
    pub avg_daily_sales: f64,
    /// Coefficient of variation of daily demand (0 = perfectly steady).
    pub demand_cv: f64,
    pub trend: Trend,
    /// Magnitude of the trend in percent (always >= 0; direction is `trend`).
    pub trend_pct: f64,
    pub days_since_delivery: f64,
    /// Days since the last order to this supplier; unknown = large.
    pub days_since_order: f64,
    pub lead_time_days: f64,
    pub historical_avg_order_qty: f64,
    /// Daily demand of the closest look-alike product, for no-history items.
    pub lookalike_daily_sales: f64,
    /// Units returned to the supplier for expiry/quality in the last period.
    pub expiry_returns: u32,
    pub moq_floor: u32,
    pub units_sold_last_90d: f64,
    pub is_staple: bool,
    pub is_fresh: bool,
    pub is_key_sku: bool,
    pub is_sunset: bool,
    pub is_promo: bool,
    pub abc: AbcRank,
    pub xyz: XyzRank,
}

/// One rule that fired while deciding a quantity.
///
/// Tags accumulate in firing order and render to the `SCREAMING_SNAKE`
/// strings the order report shows, e.g. `BASELINE_FORECAST+TREND_UP+MOQ_FLOOR`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleTag {
    DeadStockGuard,
    PromoOverride,
    BufferZone,
    BaselineForecast,
    BaselineLookalike,
    BaselineHistory,
    PromoBaseline,
    NoDemandSignal,
    TrendUp,
    TrendDown,
    QualityRisk,
    Coverage(AbcRank, XyzRank),
    SunsetClamp,
    SunsetFloor,
    RecentOrder,
    AboveReorderPoint,
    KeySkuBump,
    MoqFloor,
    OverstockCap,
    MinDisplayQty,
}

impl fmt::Display for RuleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleTag::DeadStockGuard => write!(f, "DEAD_STOCK_GUARD"),
            RuleTag::PromoOverride => write!(f, "PROMO_OVERRIDE"),
            RuleTag::BufferZone => write!(f, "BUFFER_ZONE"),
            RuleTag::BaselineForecast => write!(f, "BASELINE_FORECAST"),
            RuleTag::BaselineLookalike => write!(f, "BASELINE_LOOKALIKE"),
            RuleTag::BaselineHistory => write!(f, "BASELINE_HISTORY"),
            RuleTag::PromoBaseline => write!(f, "PROMO_BASELINE"),
            RuleTag::NoDemandSignal => write!(f, "NO_DEMAND_SIGNAL"),
            RuleTag::TrendUp => write!(f, "TREND_UP"),
            RuleTag::TrendDown => write!(f, "TREND_DOWN"),
            RuleTag::QualityRisk => write!(f, "QUALITY_RISK"),
            RuleTag::Coverage(abc, xyz) => write!(f, "COVERAGE_{:?}{:?}", abc, xyz),
            RuleTag::SunsetClamp => write!(f, "SUNSET_CLAMP"),
            RuleTag::SunsetFloor => write!(f, "SUNSET_FLOOR"),
            RuleTag::RecentOrder => write!(f, "RECENT_ORDER"),
            RuleTag::AboveReorderPoint => write!(f, "ABOVE_REORDER_POINT"),
            RuleTag::KeySkuBump => write!(f, "KEY_SKU_BUMP"),
            RuleTag::MoqFloor => write!(f, "MOQ_FLOOR"),
            RuleTag::OverstockCap => write!(f, "OVERSTOCK_CAP"),
            RuleTag::MinDisplayQty => write!(f, "MIN_DISPLAY_QTY"),
        }
    }
}

/// Render an ordered tag list as the report reasoning string.
pub fn render_tags(tags: &[RuleTag]) -> String {
    tags.iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_tags_render_screaming_snake() {
        assert_eq!(RuleTag::DeadStockGuard.to_string(), "DEAD_STOCK_GUARD");
        assert_eq!(
            RuleTag::Coverage(AbcRank::A, XyzRank::X).to_string(),
            "COVERAGE_AX"
        );
        assert_eq!(
            render_tags(&[RuleTag::BaselineForecast, RuleTag::MoqFloor]),
            "BASELINE_FORECAST+MOQ_FLOOR"
        );
    }

    #[test]
    fn render_empty_tags_is_empty_string() {
        assert_eq!(render_tags(&[]), "");
    }
}
