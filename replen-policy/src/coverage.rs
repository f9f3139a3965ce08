//! Strategic coverage policy: how many days of stock each ABC x XYZ class
//! deserves, as a multiple of the tier's base depth.
//!
//! Important-and-steady items (AX) get the deepest cover because the
//! forecast is trustworthy and a stockout is expensive. Erratic tail items
//! (CZ) get shallow cover: the forecast is noise and the capital is better
//! spent elsewhere.

use crate::types::{AbcRank, XyzRank};

/// Depth multiplier applied to the tier's base `depth_days`.
const COVERAGE_MATRIX: [[f64; 3]; 3] = [
    // X     Y     Z
    [1.50, 1.25, 1.00], // A
    [1.25, 1.00, 0.75], // B
    [1.00, 0.60, 0.40], // C
];

/// Sunset items never carry more than this many days regardless of class.
pub const SUNSET_COVERAGE_DAYS: f64 = 3.0;

/// Target coverage days for a class at a given tier depth.
pub fn coverage_days(abc: AbcRank, xyz: XyzRank, depth_days: f64) -> f64 {
    let row = match abc {
        AbcRank::A => 0,
        AbcRank::B => 1,
        AbcRank::C => 2,
    };
    let col = match xyz {
        XyzRank::X => 0,
        XyzRank::Y => 1,
        XyzRank::Z => 2,
    };
    depth_days * COVERAGE_MATRIX[row][col]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ax_is_deepest_cz_is_shallowest() {
        let deep = coverage_days(AbcRank::A, XyzRank::X, 14.0);
        let shallow = coverage_days(AbcRank::C, XyzRank::Z, 14.0);
        assert!((deep - 21.0).abs() < 1e-9);
        assert!((shallow - 5.6).abs() < 1e-9);
    }

    #[test]
    fn coverage_is_monotone_along_both_axes() {
        let ranks_abc = [AbcRank::A, AbcRank::B, AbcRank::C];
        let ranks_xyz = [XyzRank::X, XyzRank::Y, XyzRank::Z];
        for (i, abc) in ranks_abc.iter().enumerate() {
            for (j, xyz) in ranks_xyz.iter().enumerate() {
                let here = coverage_days(*abc, *xyz, 10.0);
                if i + 1 < 3 {
                    assert!(here >= coverage_days(ranks_abc[i + 1], *xyz, 10.0));
                }
                if j + 1 < 3 {
                    assert!(here >= coverage_days(*abc, ranks_xyz[j + 1], 10.0));
                }
            }
        }
    }
}
