//! Replenishment batch pipeline.
//!
//! Takes a per-product candidate CSV plus three small reference tables,
//! plans an ideal quantity for every product with the pure policy crate,
//! scores and ranks the candidates, and allocates a capital budget across
//! them in two passes with per-department wallets. A single run is strictly
//! sequential and deterministic; only the multi-budget sweep fans out.

pub mod allocator;
pub mod candidate_loader;
pub mod components;
pub mod error;
pub mod filter;
pub mod pipelines;
pub mod planner;
pub mod reference;
pub mod scorer;
pub mod simulation;
pub mod types;
pub mod util;
pub mod wallet;

pub use candidate_loader::{load_candidates, load_candidates_file, CandidateRecord};
pub use error::{LoadError, LoadResult};
pub use pipelines::ReplenishmentPipeline;
pub use reference::ReferenceData;
pub use simulation::{budget_sweep, SweepPoint};
pub use types::{AllocationPass, AllocationResult, OrderQuery, RunOutcome, RunSummary};
