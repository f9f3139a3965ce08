//! Budget sweep: the same candidate file allocated at a ladder of budgets.
//!
//! Runs are independent, so they fan out across a rayon pool. Used for
//! sizing studies ("what does another 50k of capital buy?") and for the
//! monotonicity property in tests.

use rayon::prelude::*;
use serde::Serialize;

use replen_policy::AllocationMode;

use crate::candidate_loader::CandidateRecord;
use crate::pipelines::ReplenishmentPipeline;
use crate::types::OrderQuery;

/// One point on the budget/outcome curve.
#[derive(Clone, Debug, Serialize)]
pub struct SweepPoint {
    pub budget: f64,
    pub tier: String,
    pub items_stocked: usize,
    pub total_cash_used: f64,
    pub unused_budget: f64,
}

/// Allocate `records` at every budget in the ladder, in parallel.
/// Points come back in ladder order.
pub fn budget_sweep(
    pipeline: &ReplenishmentPipeline,
    records: &[CandidateRecord],
    mode: AllocationMode,
    budgets: &[f64],
) -> Result<Vec<SweepPoint>, String> {
    budgets
        .par_iter()
        .map(|&budget| {
            let query = OrderQuery::new(budget, mode);
            let outcome = pipeline.run(&query, records)?;
            Ok(SweepPoint {
                budget,
                tier: outcome.summary.tier,
                items_stocked: outcome.summary.items_stocked,
                total_cash_used: outcome.summary.total_cash_used,
                unused_budget: outcome.summary.unused_budget,
            })
        })
        .collect()
}
