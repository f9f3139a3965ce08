//! The end-to-end replenishment pipeline.
//!
//! Wires the standard stages together: plan quantities per candidate, run
//! the filters, run the scorers, then hand the survivors to the two-pass
//! allocator. Stage lists are plain trait-object vectors so deployments can
//! swap components without touching the driver.

use log::{debug, info};

use replen_policy::profile_for_budget;
use replen_policy::types::render_tags;

use crate::allocator;
use crate::candidate_loader::CandidateRecord;
use crate::components::{DesirabilityScorer, EligibilityFilter};
use crate::filter::Filter;
use crate::planner;
use crate::reference::ReferenceData;
use crate::scorer::Scorer;
use crate::types::{
    AllocationPass, AllocationResult, AllocationTag, OrderQuery, ProductCandidate, RunOutcome,
};

pub struct ReplenishmentPipeline {
    reference: ReferenceData,
    filters: Vec<Box<dyn Filter<OrderQuery, ProductCandidate>>>,
    scorers: Vec<Box<dyn Scorer<OrderQuery, ProductCandidate>>>,
}

impl ReplenishmentPipeline {
    /// Standard stage wiring.
    pub fn new(reference: ReferenceData) -> Self {
        ReplenishmentPipeline {
            reference,
            filters: vec![Box::new(EligibilityFilter)],
            scorers: vec![Box::new(DesirabilityScorer)],
        }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Run one allocation over the loaded candidate records.
    pub fn run(&self, query: &OrderQuery, records: &[CandidateRecord]) -> Result<RunOutcome, String> {
        let profile = profile_for_budget(query.budget);
        info!(
            "replenishment run: budget {:.2}, tier '{}', {} candidates, mode {:?}",
            query.budget,
            profile.name,
            records.len(),
            query.mode
        );

        let mut candidates: Vec<ProductCandidate> = records
            .iter()
            .map(|record| {
                let mut candidate = record.to_candidate(&self.reference);
                planner::plan(&mut candidate, profile, query.mode);
                candidate
            })
            .collect();

        let mut ineligible_results: Vec<AllocationResult> = Vec::new();
        for filter in &self.filters {
            if !filter.enable(query) {
                continue;
            }
            let result = filter.filter(query, candidates)?;
            debug!("{}: removed {} candidates", filter.name(), result.removed.len());
            ineligible_results.extend(result.removed.into_iter().map(ineligible_result));
            candidates = result.kept;
        }

        for scorer in &self.scorers {
            if !scorer.enable(query) {
                continue;
            }
            let scored = scorer.score(query, &candidates)?;
            for (candidate, scored) in candidates.iter_mut().zip(scored) {
                scorer.update(candidate, scored);
            }
            debug!("{}: scored {} candidates", scorer.name(), candidates.len());
        }

        let mut outcome = allocator::allocate(query, profile, &self.reference, candidates);
        outcome.summary.skip_counts.ineligible = ineligible_results.len();
        outcome.results.extend(ineligible_results);
        Ok(outcome)
    }
}

fn ineligible_result(candidate: ProductCandidate) -> AllocationResult {
    let mut reasoning = render_tags(&candidate.decision_tags);
    if !reasoning.is_empty() {
        reasoning.push('+');
    }
    reasoning.push_str(&AllocationTag::Ineligible.to_string());

    AllocationResult {
        name: candidate.name,
        department: candidate.department,
        recommended_quantity: 0,
        reasoning,
        estimated_cost: 0.0,
        is_consignment: candidate.is_consignment,
        pass: AllocationPass::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate_loader::load_candidates;
    use replen_policy::AllocationMode;

    const CSV: &str = "\
name,department,supplier,price,margin_pct,pack_size,stock,avg_daily_sales,days_since_order,lead_time_days,is_staple,abc_rank,xyz_rank
Milk 1L,DAIRY,NordFood,1.20,22,12,4,14,999,2,1,A,X
Broken Row Item,DAIRY,NordFood,0,22,12,4,3,999,2,0,B,Y
";

    #[test]
    fn unpriced_candidates_surface_as_ineligible() {
        let records = load_candidates(CSV.as_bytes()).unwrap();
        let pipeline = ReplenishmentPipeline::new(ReferenceData::default());
        let query = OrderQuery::new(50_000.0, AllocationMode::Replenishment);
        let outcome = pipeline.run(&query, &records).unwrap();

        assert_eq!(outcome.results.len(), 2);
        let broken = outcome
            .results
            .iter()
            .find(|r| r.name == "Broken Row Item")
            .unwrap();
        assert_eq!(broken.pass, AllocationPass::Rejected);
        assert!(broken.reasoning.ends_with("INELIGIBLE"));
        assert_eq!(outcome.summary.skip_counts.ineligible, 1);

        let milk = outcome.results.iter().find(|r| r.name == "Milk 1L").unwrap();
        assert!(milk.recommended_quantity > 0);
    }
}
