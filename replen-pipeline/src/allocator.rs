//! Two-pass budget allocator.
//!
//! Pass 1 fills every affordable staple pack by pack up to its display
//! width, breadth before depth, so the core assortment is never hollowed
//! out by a few expensive winners or by a tier with a wider display target.
//! Pass 2 then deepens staples and fills discretionary items pack by pack,
//! in descending desirability order, until the department wallets or the
//! run budget give out. Consignment goods flow through the same quantity
//! logic but never draw cash.
//!
//! The allocator owns the money invariants: total cash spent never exceeds
//! the budget, and every rejected candidate carries the constraint that
//! blocked it.

use log::{debug, info};

use replen_policy::types::render_tags;
use replen_policy::{AbcRank, RoundDirection, TierProfile};

use crate::reference::ReferenceData;
use crate::types::{
    AllocationPass, AllocationResult, AllocationTag, OrderQuery, ProductCandidate, RunOutcome,
    RunSummary, SkipCounts,
};
use crate::wallet::DepartmentWallets;

/// Float slack when comparing costs against remaining budget.
const EPSILON: f64 = 1e-6;

/// Sort by desirability, best first. NaN and unscored candidates go to the
/// end; equal scores settle by ascending product name so runs over the same
/// data are byte-for-byte reproducible.
pub fn sort_by_desirability(candidates: Vec<ProductCandidate>) -> Vec<ProductCandidate> {
    let mut sorted = candidates;
    sorted.sort_by(|a, b| {
        let sa = a.desirability.unwrap_or(f64::NAN);
        let sb = b.desirability.unwrap_or(f64::NAN);
        match (sa.is_nan(), sb.is_nan()) {
            (true, true) => a.name.cmp(&b.name),
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => sb
                .partial_cmp(&sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name)),
        }
    });
    sorted
}

struct Slot {
    cand: ProductCandidate,
    qty: u32,
    width_cost: f64,
    depth_cost: f64,
    consignment_value: f64,
    pass: Option<AllocationPass>,
    tags: Vec<AllocationTag>,
    blocked: Option<AllocationTag>,
    settled: bool,
}

impl Slot {
    fn new(cand: ProductCandidate) -> Self {
        Slot {
            cand,
            qty: 0,
            width_cost: 0.0,
            depth_cost: 0.0,
            consignment_value: 0.0,
            pass: None,
            tags: Vec::new(),
            blocked: None,
            settled: false,
        }
    }

    /// One pack in units; packless suppliers step a single unit at a time.
    fn pack_step(&self) -> u32 {
        self.cand.sku.pack_size.max(1)
    }

    /// Most units this slot may ever receive: the planned quantity, capped
    /// by the tier's max-packs rule.
    fn qty_cap(&self, profile: &TierProfile) -> u32 {
        self.cand
            .planned_qty
            .min(profile.max_packs.saturating_mul(self.pack_step()))
    }

    /// Smallest presentable quantity: whole packs up to the display minimum.
    fn width_target(&self, profile: &TierProfile) -> u32 {
        let step = self.pack_step();
        let packs = profile.min_display_qty.div_ceil(step).max(1);
        (packs * step).min(self.qty_cap(profile))
    }
}

/// Run both allocation passes over planned, scored candidates.
///
/// Candidates must already carry `planned_qty` and `desirability`; the
/// ineligible (unpriced) ones are expected to have been filtered out and
/// are accounted for by the caller.
pub fn allocate(
    query: &OrderQuery,
    profile: &TierProfile,
    reference: &ReferenceData,
    candidates: Vec<ProductCandidate>,
) -> RunOutcome {
    let budget = query.budget.max(0.0);
    let mut wallets =
        DepartmentWallets::new(budget, profile.wallet_buffer_pct, reference.department_weights());
    let mut budget_remaining = budget;
    let mut skip = SkipCounts::default();
    let mut pass1_cash = 0.0;
    let mut pass2_cash = 0.0;
    let mut consignment_total = 0.0;

    let mut slots: Vec<Slot> = sort_by_desirability(candidates)
        .into_iter()
        .map(Slot::new)
        .collect();

    // Settle everything that never competes for cash: zero plans, tail
    // items the tier does not range, consignment goods, and items priced
    // out of the tier.
    for slot in &mut slots {
        if slot.cand.planned_qty == 0 {
            skip.zero_quantity += 1;
            slot.settled = true;
            continue;
        }
        // Small tiers do not range the C-class tail; the shelf space is
        // worth more than the trickle of revenue. Staples stay regardless.
        if !profile.allow_c_class
            && slot.cand.sku.abc == AbcRank::C
            && !slot.cand.sku.is_staple
        {
            slot.blocked = Some(AllocationTag::ClassRestricted);
            skip.class_restricted += 1;
            slot.settled = true;
            continue;
        }
        if slot.cand.is_consignment {
            slot.qty = slot.qty_cap(profile);
            slot.consignment_value = slot.qty as f64 * slot.cand.unit_cost();
            consignment_total += slot.consignment_value;
            slot.pass = Some(if slot.cand.sku.is_staple {
                AllocationPass::Pass1
            } else {
                AllocationPass::Pass2
            });
            slot.tags.push(AllocationTag::Consignment);
            slot.settled = true;
            continue;
        }
        if slot.cand.price > profile.price_ceiling {
            if slot.cand.anchor_override && slot.cand.sku.is_staple {
                slot.tags.push(AllocationTag::AnchorOverride);
            } else {
                slot.blocked = Some(AllocationTag::PriceCeiling);
                skip.price_ceiling += 1;
                slot.settled = true;
            }
        }
    }

    // --- Pass 1: staple width ---
    // Round-robin one pack at a time toward each staple's display minimum.
    // Breadth before width: every staple gets its first pack before any
    // staple gets its second, so a tier with a wider display target never
    // prices the tail of the core assortment off the shelf.
    let staple_order: Vec<usize> = (0..slots.len())
        .filter(|&i| !slots[i].settled && slots[i].cand.sku.is_staple)
        .collect();
    loop {
        let mut progressed = false;
        for &i in &staple_order {
            let slot = &mut slots[i];
            let width = slot.width_target(profile);
            if slot.qty >= width {
                continue;
            }
            let add = slot.pack_step().min(width - slot.qty);
            let cost = add as f64 * slot.cand.unit_cost();
            if cost > budget_remaining + EPSILON {
                slot.blocked = Some(AllocationTag::BudgetExhausted);
                continue;
            }
            if !wallets.can_spend(&slot.cand.department, cost) {
                slot.blocked = Some(AllocationTag::WalletCap);
                continue;
            }
            wallets.spend(&slot.cand.department, cost);
            budget_remaining -= cost;
            slot.qty += add;
            slot.width_cost += cost;
            pass1_cash += cost;
            slot.blocked = None;
            if slot.pass.is_none() {
                slot.pass = Some(AllocationPass::Pass1);
                slot.tags.push(AllocationTag::Pass1Width);
            }
            progressed = true;
        }
        if !progressed {
            break;
        }
    }
    info!(
        "pass 1 placed {} staples for {:.2}",
        slots.iter().filter(|s| s.pass == Some(AllocationPass::Pass1) && !s.cand.is_consignment).count(),
        pass1_cash
    );

    // --- Pass 2: depth fill ---
    // Round-robin one pack at a time, staples before discretionary, so
    // depth spreads across the assortment instead of piling onto the top
    // scorer until the money runs out.
    let mut order: Vec<usize> = (0..slots.len()).filter(|&i| !slots[i].settled).collect();
    order.sort_by_key(|&i| !slots[i].cand.sku.is_staple); // stable: keeps score order

    loop {
        let mut progressed = false;
        for &i in &order {
            let slot = &mut slots[i];
            let cap = slot.qty_cap(profile);
            if slot.qty >= cap {
                continue;
            }
            let add = slot.pack_step().min(cap - slot.qty);
            let cost = add as f64 * slot.cand.unit_cost();
            if cost > budget_remaining + EPSILON {
                slot.blocked = Some(AllocationTag::BudgetExhausted);
                continue;
            }
            if !wallets.can_spend(&slot.cand.department, cost) {
                slot.blocked = Some(AllocationTag::WalletCap);
                continue;
            }
            wallets.spend(&slot.cand.department, cost);
            budget_remaining -= cost;
            slot.qty += add;
            slot.depth_cost += cost;
            pass2_cash += cost;
            slot.blocked = None;
            if slot.pass.is_none() {
                slot.pass = Some(AllocationPass::Pass2);
            }
            if !slot.tags.contains(&AllocationTag::Pass2Depth) {
                slot.tags.push(AllocationTag::Pass2Depth);
            }
            progressed = true;
        }
        if !progressed {
            break;
        }
    }
    debug!("pass 2 spent {:.2}, {:.2} budget left", pass2_cash, budget_remaining);

    // --- Finalize ---
    let mut results = Vec::with_capacity(slots.len());
    for slot in slots {
        let rejected = slot.qty == 0;
        if rejected && !slot.cand.is_consignment && slot.cand.planned_qty > 0 {
            match slot.blocked {
                // counted at settle time
                Some(AllocationTag::PriceCeiling) | Some(AllocationTag::ClassRestricted) => {}
                Some(AllocationTag::WalletCap) => skip.wallet_cap += 1,
                _ => skip.budget_exhausted += 1,
            }
        }

        let mut parts: Vec<String> = Vec::new();
        parts.push(render_tags(&slot.cand.decision_tags));
        parts.retain(|p| !p.is_empty());
        if let Some(rounding) = &slot.cand.rounding {
            match rounding.direction {
                RoundDirection::Up => parts.push(AllocationTag::PackRoundUp.to_string()),
                RoundDirection::Down => parts.push(AllocationTag::PackRoundDown.to_string()),
                RoundDirection::None => {}
            }
        }
        parts.extend(slot.tags.iter().map(|t| t.to_string()));
        if rejected {
            if let Some(blocked) = slot.blocked {
                parts.push(blocked.to_string());
            }
        }

        results.push(AllocationResult {
            name: slot.cand.name.clone(),
            department: slot.cand.department.clone(),
            recommended_quantity: slot.qty,
            reasoning: parts.join("+"),
            estimated_cost: if slot.cand.is_consignment {
                slot.consignment_value
            } else {
                slot.width_cost + slot.depth_cost
            },
            is_consignment: slot.cand.is_consignment,
            pass: if rejected {
                AllocationPass::Rejected
            } else {
                slot.pass.unwrap_or(AllocationPass::Pass2)
            },
        });
    }

    let total_cash_used = pass1_cash + pass2_cash;
    let items_stocked = results.iter().filter(|r| r.recommended_quantity > 0).count();
    info!(
        "allocation done: {} items stocked, {:.2} cash of {:.2} budget, {:.2} consignment",
        items_stocked, total_cash_used, budget, consignment_total
    );

    RunOutcome {
        results,
        summary: RunSummary {
            budget: query.budget,
            tier: profile.name.to_string(),
            pass1_cash,
            pass2_cash,
            total_cash_used,
            total_consignment_value: consignment_total,
            unused_budget: (budget - total_cash_used).max(0.0),
            items_stocked,
            skip_counts: skip,
            department_utilization: wallets.utilization(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replen_policy::{profile_for_budget, AllocationMode};

    fn cash_item(name: &str, price: f64, planned: u32, staple: bool, score: f64) -> ProductCandidate {
        let mut c = ProductCandidate {
            name: name.into(),
            department: "GROCERY".into(),
            price,
            margin_pct: 20.0, // unit cost = 0.8 x price
            planned_qty: planned,
            desirability: Some(score),
            ..ProductCandidate::default()
        };
        c.sku.pack_size = 12;
        c.sku.is_staple = staple;
        c
    }

    fn run(budget: f64, candidates: Vec<ProductCandidate>) -> RunOutcome {
        let query = OrderQuery::new(budget, AllocationMode::Replenishment);
        allocate(
            &query,
            profile_for_budget(budget),
            &ReferenceData::default(),
            candidates,
        )
    }

    #[test]
    fn staples_get_width_in_pass_one() {
        let outcome = run(10_000.0, vec![cash_item("Rice 1kg", 2.0, 48, true, 5.0)]);
        let r = &outcome.results[0];
        assert_eq!(r.pass, AllocationPass::Pass1);
        assert!(r.reasoning.contains("PASS1_WIDTH"));
        assert_eq!(r.recommended_quantity, 48); // deepened in pass 2
        assert!(outcome.summary.pass1_cash > 0.0);
        assert!(outcome.summary.pass2_cash > 0.0);
    }

    #[test]
    fn discretionary_items_only_fill_in_pass_two() {
        let outcome = run(10_000.0, vec![cash_item("Gadget", 20.0, 24, false, 3.0)]);
        let r = &outcome.results[0];
        assert_eq!(r.pass, AllocationPass::Pass2);
        assert_eq!(r.recommended_quantity, 24);
        assert_eq!(outcome.summary.pass1_cash, 0.0);
    }

    #[test]
    fn price_ceiling_rejects_unless_anchored_staple() {
        // micro tier ceiling is 300
        let pricey = cash_item("Espresso Machine", 450.0, 12, false, 9.0);
        let mut anchor = cash_item("House Cheese Wheel", 450.0, 12, true, 8.0);
        anchor.anchor_override = true;
        let outcome = run(100_000.0, vec![pricey, anchor]);

        let machine = outcome.results.iter().find(|r| r.name == "Espresso Machine").unwrap();
        assert_eq!(machine.pass, AllocationPass::Rejected);
        assert!(machine.reasoning.contains("PRICE_CEILING"));

        let cheese = outcome.results.iter().find(|r| r.name == "House Cheese Wheel").unwrap();
        assert!(cheese.recommended_quantity > 0);
        assert!(cheese.reasoning.contains("ANCHOR_OVERRIDE"));
        assert_eq!(outcome.summary.skip_counts.price_ceiling, 1);
    }

    #[test]
    fn consignment_never_draws_cash() {
        let mut consigned = cash_item("Local Honey", 8.0, 24, false, 4.0);
        consigned.is_consignment = true;
        let outcome = run(1_000.0, vec![consigned]);
        let r = &outcome.results[0];
        assert!(r.recommended_quantity > 0);
        assert!(r.is_consignment);
        assert_eq!(outcome.summary.total_cash_used, 0.0);
        assert!(outcome.summary.total_consignment_value > 0.0);
    }

    #[test]
    fn budget_is_never_exceeded() {
        let items: Vec<_> = (0..20)
            .map(|i| cash_item(&format!("Item {i:02}"), 50.0, 48, i % 2 == 0, 10.0 - i as f64))
            .collect();
        let outcome = run(2_000.0, items);
        assert!(outcome.summary.total_cash_used <= 2_000.0 + 1e-6);
        assert!(outcome.summary.unused_budget >= 0.0);
        assert!(
            (outcome.summary.total_cash_used
                - (outcome.summary.pass1_cash + outcome.summary.pass2_cash))
                .abs()
                < 1e-6
        );
    }

    #[test]
    fn exhausted_budget_tags_the_rejects() {
        // budget covers the first item's width only
        let a = cash_item("Alpha", 10.0, 12, true, 9.0);
        let b = cash_item("Beta", 10.0, 12, true, 1.0);
        // width = 3 -> 1 pack of 12 at 8.0 = 96; budget fits one
        let outcome = run(100.0, vec![a, b]);
        let beta = outcome.results.iter().find(|r| r.name == "Beta").unwrap();
        assert_eq!(beta.pass, AllocationPass::Rejected);
        assert!(beta.reasoning.contains("BUDGET_EXHAUSTED"));
        assert_eq!(outcome.summary.skip_counts.budget_exhausted, 1);
    }

    #[test]
    fn zero_plans_are_counted_not_charged() {
        let mut dead = cash_item("Dusty Jar", 5.0, 0, false, 0.5);
        dead.decision_tags = vec![replen_policy::RuleTag::DeadStockGuard];
        let outcome = run(1_000.0, vec![dead]);
        let r = &outcome.results[0];
        assert_eq!(r.pass, AllocationPass::Rejected);
        assert_eq!(r.reasoning, "DEAD_STOCK_GUARD");
        assert_eq!(outcome.summary.skip_counts.zero_quantity, 1);
        assert_eq!(outcome.summary.total_cash_used, 0.0);
    }

    #[test]
    fn breadth_survives_a_tier_boundary() {
        // 1200 identical single-unit staples. The mid tier doubles the
        // display width, so funding widths greedily would let two more
        // dollars of budget halve the assortment. Pack-by-pack pass 1
        // keeps every staple on the shelf on both sides of the boundary.
        let build = || -> Vec<ProductCandidate> {
            (0..1200)
                .map(|i| {
                    let mut c = cash_item(&format!("Staple {i:04}"), 400.0, 12, true, 5.0);
                    c.sku.pack_size = 1;
                    c
                })
                .collect()
        };
        let small = run(999_999.0, build());
        let mid = run(1_000_001.0, build());

        assert_eq!(small.summary.tier, "small");
        assert_eq!(mid.summary.tier, "mid");
        assert_eq!(small.summary.items_stocked, 1200);
        assert!(
            mid.summary.items_stocked >= small.summary.items_stocked,
            "items fell from {} to {} across the tier boundary",
            small.summary.items_stocked,
            mid.summary.items_stocked
        );
        assert!(mid.summary.total_cash_used >= small.summary.total_cash_used - 1e-6);
        assert!(mid.summary.total_cash_used <= 1_000_001.0 + 1e-6);
    }

    #[test]
    fn small_tiers_skip_the_c_class_tail() {
        let mut tail = cash_item("Novelty Gizmo", 20.0, 12, false, 5.0);
        tail.sku.abc = AbcRank::C;
        let mut staple_tail = cash_item("House Matches", 2.0, 12, true, 4.0);
        staple_tail.sku.abc = AbcRank::C;

        // micro tier does not range discretionary C items...
        let outcome = run(10_000.0, vec![tail.clone(), staple_tail]);
        let gizmo = outcome.results.iter().find(|r| r.name == "Novelty Gizmo").unwrap();
        assert_eq!(gizmo.pass, AllocationPass::Rejected);
        assert!(gizmo.reasoning.contains("CLASS_RESTRICTED"));
        assert_eq!(outcome.summary.skip_counts.class_restricted, 1);

        // ...but C staples stay on the shelf.
        let matches = outcome.results.iter().find(|r| r.name == "House Matches").unwrap();
        assert!(matches.recommended_quantity > 0);

        // The mid tier ranges the tail again.
        let outcome = run(2_000_000.0, vec![tail]);
        assert!(outcome.results[0].recommended_quantity > 0);
        assert_eq!(outcome.summary.skip_counts.class_restricted, 0);
    }

    #[test]
    fn equal_scores_settle_by_name() {
        let sorted = sort_by_desirability(vec![
            cash_item("Zebra", 1.0, 12, false, 2.0),
            cash_item("Apple", 1.0, 12, false, 2.0),
            cash_item("Mango", 1.0, 12, false, 7.0),
        ]);
        let names: Vec<_> = sorted.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Mango", "Apple", "Zebra"]);
    }

    #[test]
    fn unscored_candidates_sort_last() {
        let mut unscored = cash_item("Mystery", 1.0, 12, false, 0.0);
        unscored.desirability = None;
        let sorted = sort_by_desirability(vec![unscored, cash_item("Known", 1.0, 12, false, 0.1)]);
        assert_eq!(sorted[0].name, "Known");
    }
}
