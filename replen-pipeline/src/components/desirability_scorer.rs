use replen_policy::AbcRank;

use crate::scorer::Scorer;
use crate::types::{OrderQuery, ProductCandidate};

/// Scores candidates by revenue rate on a log scale, weighted by ABC class
/// and margin. The allocator spends budget in descending score order, so
/// this ranking is what "desirable" means for the whole run.
pub struct DesirabilityScorer;

/// Margin contributes at half weight, capped so freak margins cannot
/// dominate the revenue signal.
const MARGIN_WEIGHT_CAP_PCT: f64 = 60.0;
/// Key SKUs get a small edge over equally attractive neighbors.
const KEY_SKU_BONUS: f64 = 1.1;

fn abc_multiplier(rank: AbcRank) -> f64 {
    match rank {
        AbcRank::A => 1.3,
        AbcRank::B => 1.0,
        AbcRank::C => 0.7,
    }
}

impl Scorer<OrderQuery, ProductCandidate> for DesirabilityScorer {
    fn score(
        &self,
        _query: &OrderQuery,
        candidates: &[ProductCandidate],
    ) -> Result<Vec<ProductCandidate>, String> {
        let scored = candidates
            .iter()
            .map(|c| {
                let rate = if c.sku.avg_daily_sales > 0.0 {
                    c.sku.avg_daily_sales
                } else {
                    c.sku.lookalike_daily_sales
                };
                let revenue_rate = (c.price * rate).max(0.0);
                let base = (revenue_rate + 1.0).ln(); // log scale, +1 to handle $0
                let margin_factor =
                    1.0 + c.margin_pct.clamp(0.0, MARGIN_WEIGHT_CAP_PCT) / 200.0;
                let key_factor = if c.sku.is_key_sku { KEY_SKU_BONUS } else { 1.0 };

                ProductCandidate {
                    desirability: Some(
                        base * abc_multiplier(c.sku.abc) * margin_factor * key_factor,
                    ),
                    ..ProductCandidate::default()
                }
            })
            .collect();

        Ok(scored)
    }

    fn update(&self, candidate: &mut ProductCandidate, scored: ProductCandidate) {
        candidate.desirability = scored.desirability;
    }
}
