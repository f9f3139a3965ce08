//! Pack quantizer: snap an ideal order quantity onto a supplier pack multiple.
//!
//! The bias depends on stockout risk. High-risk items round up as long as
//! the overage stays within tolerance; low-risk items round down unless that
//! leaves a real hole; medium risk takes whichever multiple is closer in
//! relative terms. Key SKUs are always treated as high risk.

use crate::types::StockoutRisk;

/// Default cap on extra units (as a fraction of the ideal qty) tolerated
/// when rounding up.
pub const DEFAULT_MAX_OVERAGE_RATIO: f64 = 0.25;

/// Low-risk items accept at most this relative shortage from rounding down.
const LOW_RISK_SHORTAGE_TOLERANCE: f64 = 0.10;

/// Which way the quantizer moved the quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum RoundDirection {
    Up,
    Down,
    None,
}

/// Outcome of quantizing one quantity.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct PackRounding {
    pub rounded_qty: u32,
    pub direction: RoundDirection,
    /// Units above the ideal quantity (0 when rounding down).
    pub overage_units: f64,
    /// Units below the ideal quantity (0 when rounding up).
    pub shortage_units: f64,
}

impl PackRounding {
    fn new(rounded_qty: u32, direction: RoundDirection, base_qty: f64) -> Self {
        let rounded = rounded_qty as f64;
        PackRounding {
            rounded_qty,
            direction,
            overage_units: (rounded - base_qty).max(0.0),
            shortage_units: (base_qty - rounded).max(0.0),
        }
    }
}

/// Quantize `base_qty` onto a multiple of `pack_size`.
///
/// `pack_size == 0` means the supplier has no pack constraint: the quantity
/// is rounded to the nearest whole unit and reported as unrounded. A
/// non-positive base orders nothing, except for key SKUs which are floored
/// at exactly one pack so they never disappear from the shelf.
pub fn round_to_pack(
    base_qty: f64,
    pack_size: u32,
    stockout_risk: StockoutRisk,
    is_key_sku: bool,
    max_overage_ratio: f64,
) -> PackRounding {
    if pack_size == 0 {
        let rounded = base_qty.round().max(0.0) as u32;
        return PackRounding::new(rounded, RoundDirection::None, base_qty);
    }

    let risk = if is_key_sku {
        StockoutRisk::High
    } else {
        stockout_risk
    };

    if base_qty <= 0.0 {
        if is_key_sku {
            // Never let a key SKU drop to zero on the order sheet.
            return PackRounding::new(pack_size, RoundDirection::Up, base_qty.max(0.0));
        }
        return PackRounding::new(0, RoundDirection::Down, 0.0);
    }

    let pack = pack_size as f64;
    let packs_exact = base_qty / pack;
    if (packs_exact - packs_exact.round()).abs() < 1e-9 {
        return PackRounding::new(base_qty.round() as u32, RoundDirection::None, base_qty);
    }

    let qty_down = packs_exact.floor() * pack;
    let qty_up = packs_exact.ceil() * pack;
    let overage_ratio_up = (qty_up - base_qty) / base_qty;
    let shortage_ratio_down = (base_qty - qty_down) / base_qty;

    let (rounded, direction) = match risk {
        StockoutRisk::High => {
            if overage_ratio_up <= max_overage_ratio {
                (qty_up, RoundDirection::Up)
            } else {
                (qty_down, RoundDirection::Down)
            }
        }
        StockoutRisk::Low => {
            if shortage_ratio_down <= LOW_RISK_SHORTAGE_TOLERANCE {
                (qty_down, RoundDirection::Down)
            } else {
                (qty_up, RoundDirection::Up)
            }
        }
        StockoutRisk::Medium => {
            // Closer multiple wins; an exact tie settles down to avoid
            // systematically overbuying the whole assortment.
            if overage_ratio_up < shortage_ratio_down {
                (qty_up, RoundDirection::Up)
            } else {
                (qty_down, RoundDirection::Down)
            }
        }
    };

    PackRounding::new(rounded as u32, direction, base_qty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_risk_rounds_down_when_overage_exceeds_tolerance() {
        // base 14, pack 12: up = 24 would be +71% overage
        let r = round_to_pack(14.0, 12, StockoutRisk::High, false, 0.25);
        assert_eq!(r.rounded_qty, 12);
        assert_eq!(r.direction, RoundDirection::Down);
        assert!((r.shortage_units - 2.0).abs() < 1e-9);
        assert_eq!(r.overage_units, 0.0);
    }

    #[test]
    fn high_risk_rounds_up_within_tolerance() {
        // base 11, pack 12: up = 12 is +9% overage
        let r = round_to_pack(11.0, 12, StockoutRisk::High, false, 0.25);
        assert_eq!(r.rounded_qty, 12);
        assert_eq!(r.direction, RoundDirection::Up);
        assert!((r.overage_units - 1.0).abs() < 1e-9);
    }

    #[test]
    fn low_risk_rounds_up_rather_than_drop_to_zero() {
        // base 11, pack 12: rounding down means a 100% shortage
        let r = round_to_pack(11.0, 12, StockoutRisk::Low, false, 0.25);
        assert_eq!(r.rounded_qty, 12);
        assert_eq!(r.direction, RoundDirection::Up);
    }

    #[test]
    fn low_risk_accepts_small_shortage() {
        // base 25, pack 12: down to 24 is a 4% shortage
        let r = round_to_pack(25.0, 12, StockoutRisk::Low, false, 0.25);
        assert_eq!(r.rounded_qty, 24);
        assert_eq!(r.direction, RoundDirection::Down);
    }

    #[test]
    fn medium_risk_picks_closer_multiple() {
        // base 20, pack 12: up to 24 (+20%) beats down to 12 (-40%)
        let r = round_to_pack(20.0, 12, StockoutRisk::Medium, false, 0.25);
        assert_eq!(r.rounded_qty, 24);
        assert_eq!(r.direction, RoundDirection::Up);

        // base 16, pack 12: down to 12 (-25%) beats up to 24 (+50%)
        let r = round_to_pack(16.0, 12, StockoutRisk::Medium, false, 0.25);
        assert_eq!(r.rounded_qty, 12);
        assert_eq!(r.direction, RoundDirection::Down);
    }

    #[test]
    fn medium_risk_tie_settles_down() {
        // base 6, pack 12: up and down are both 100% away
        let r = round_to_pack(6.0, 12, StockoutRisk::Medium, false, 0.25);
        assert_eq!(r.rounded_qty, 0);
        assert_eq!(r.direction, RoundDirection::Down);
    }

    #[test]
    fn key_sku_is_forced_high_risk() {
        let r = round_to_pack(11.0, 12, StockoutRisk::Low, true, 0.25);
        assert_eq!(r.rounded_qty, 12);
        assert_eq!(r.direction, RoundDirection::Up);
    }

    #[test]
    fn zero_base_orders_nothing_unless_key() {
        let r = round_to_pack(0.0, 12, StockoutRisk::High, false, 0.25);
        assert_eq!(r.rounded_qty, 0);

        let r = round_to_pack(0.0, 12, StockoutRisk::Low, true, 0.25);
        assert_eq!(r.rounded_qty, 12);
        assert_eq!(r.direction, RoundDirection::Up);
    }

    #[test]
    fn aligned_quantity_is_untouched() {
        let r = round_to_pack(24.0, 12, StockoutRisk::High, false, 0.25);
        assert_eq!(r.rounded_qty, 24);
        assert_eq!(r.direction, RoundDirection::None);
        assert_eq!(r.overage_units, 0.0);
        assert_eq!(r.shortage_units, 0.0);
    }

    #[test]
    fn missing_pack_size_rounds_to_nearest_unit() {
        let r = round_to_pack(14.6, 0, StockoutRisk::Medium, false, 0.25);
        assert_eq!(r.rounded_qty, 15);
        assert_eq!(r.direction, RoundDirection::None);
    }

    #[test]
    fn result_is_always_a_pack_multiple() {
        for base in [1.0, 5.5, 13.0, 47.9, 120.0] {
            for pack in [1u32, 6, 12, 24] {
                for risk in [StockoutRisk::High, StockoutRisk::Medium, StockoutRisk::Low] {
                    let r = round_to_pack(base, pack, risk, false, 0.25);
                    assert_eq!(r.rounded_qty % pack, 0, "base={base} pack={pack}");
                }
            }
        }
    }
}
