use log::debug;

use crate::filter::{Filter, FilterResult};
use crate::types::{OrderQuery, ProductCandidate};

/// Drops candidates that can never be costed: no valid selling price means
/// no cost estimate, no wallet charge, no order line.
pub struct EligibilityFilter;

impl Filter<OrderQuery, ProductCandidate> for EligibilityFilter {
    fn filter(
        &self,
        _query: &OrderQuery,
        candidates: Vec<ProductCandidate>,
    ) -> Result<FilterResult<ProductCandidate>, String> {
        let (kept, removed): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| c.has_valid_price());
        if !removed.is_empty() {
            debug!("{} candidates dropped for missing price", removed.len());
        }
        Ok(FilterResult { kept, removed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replen_policy::AllocationMode;

    fn candidate(name: &str, price: f64) -> ProductCandidate {
        ProductCandidate {
            name: name.into(),
            price,
            ..ProductCandidate::default()
        }
    }

    #[test]
    fn zero_price_is_removed() {
        let query = OrderQuery::new(100_000.0, AllocationMode::Replenishment);
        let result = EligibilityFilter
            .filter(
                &query,
                vec![
                    candidate("priced", 4.5),
                    candidate("free?", 0.0),
                    candidate("negative", -2.0),
                ],
            )
            .unwrap();
        assert_eq!(result.kept.len(), 1);
        assert_eq!(result.kept[0].name, "priced");
        assert_eq!(result.removed.len(), 2);
    }

    #[test]
    fn name_is_short_type_name() {
        assert_eq!(
            Filter::<OrderQuery, ProductCandidate>::name(&EligibilityFilter),
            "EligibilityFilter"
        );
    }
}
