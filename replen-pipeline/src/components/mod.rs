pub mod desirability_scorer;
pub mod eligibility_filter;

pub use desirability_scorer::DesirabilityScorer;
pub use eligibility_filter::EligibilityFilter;
