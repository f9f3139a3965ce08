//! Pure replenishment policy: no I/O, no clocks, no global state.
//!
//! Everything in this crate is a deterministic function of its inputs so the
//! pipeline crate can call it per product without coordination. The three
//! building blocks are:
//!
//! - [`profile`]: store tier profiles selected from the capital budget.
//! - [`decision`]: the staged rule engine that turns a product's demand
//!   signals into an ideal (un-rounded) order quantity plus the rule tags
//!   that explain it.
//! - [`rounding`]: the pack quantizer that snaps an ideal quantity onto a
//!   supplier pack multiple under a stockout-risk policy.

pub mod coverage;
pub mod decision;
pub mod profile;
pub mod rounding;
pub mod types;

pub use decision::{decide, Decision};
pub use profile::{profile_for_budget, TierProfile};
pub use rounding::{round_to_pack, PackRounding, RoundDirection, DEFAULT_MAX_OVERAGE_RATIO};
pub use types::{AbcRank, AllocationMode, RuleTag, SkuSnapshot, StockoutRisk, Trend, XyzRank};
