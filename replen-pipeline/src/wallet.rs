//! Department wallets: per-department slices of the run budget.
//!
//! Each department gets `weight x budget` allocated, with headroom up to
//! `allocated x (1 + buffer)` so a strong department can overshoot its plan
//! a little. Departments without a weight draw from the GENERAL fallback
//! wallet. The ledger lives for exactly one allocation run.

use std::collections::{BTreeMap, HashMap};

use log::warn;

/// Fallback wallet for departments with no configured weight.
pub const GENERAL_WALLET: &str = "GENERAL";

/// GENERAL gets this fraction of the budget allocated...
const GENERAL_ALLOCATED_FRACTION: f64 = 0.05;
/// ...and may stretch to this fraction at most.
const GENERAL_MAX_FRACTION: f64 = 0.10;

/// Float slack when comparing spend against caps.
const EPSILON: f64 = 1e-6;

#[derive(Clone, Debug)]
pub struct Wallet {
    pub allocated: f64,
    pub max: f64,
    pub spent: f64,
}

impl Wallet {
    fn new(allocated: f64, max: f64) -> Self {
        Wallet {
            allocated,
            max,
            spent: 0.0,
        }
    }

    pub fn remaining(&self) -> f64 {
        (self.max - self.spent).max(0.0)
    }
}

#[derive(Clone, Debug)]
pub struct DepartmentWallets {
    wallets: BTreeMap<String, Wallet>,
}

impl DepartmentWallets {
    /// Split `budget` across departments by weight. With no weights at all,
    /// the GENERAL wallet covers the whole budget so small deployments can
    /// run without a weights file.
    pub fn new(budget: f64, buffer_pct: f64, weights: &HashMap<String, f64>) -> Self {
        let mut wallets = BTreeMap::new();

        for (department, weight) in weights {
            if *weight <= 0.0 {
                warn!("ignoring non-positive weight for department '{}'", department);
                continue;
            }
            let allocated = weight * budget;
            wallets.insert(
                department.trim().to_uppercase(),
                Wallet::new(allocated, allocated * (1.0 + buffer_pct)),
            );
        }

        let general = if wallets.is_empty() {
            Wallet::new(budget, budget)
        } else {
            Wallet::new(
                budget * GENERAL_ALLOCATED_FRACTION,
                budget * GENERAL_MAX_FRACTION,
            )
        };
        wallets.insert(GENERAL_WALLET.to_string(), general);

        DepartmentWallets { wallets }
    }

    fn resolve(&self, department: &str) -> String {
        let key = department.trim().to_uppercase();
        if self.wallets.contains_key(&key) {
            key
        } else {
            GENERAL_WALLET.to_string()
        }
    }

    /// Whether `cost` fits in the department's wallet (or GENERAL).
    pub fn can_spend(&self, department: &str, cost: f64) -> bool {
        let key = self.resolve(department);
        let wallet = &self.wallets[&key];
        wallet.spent + cost <= wallet.max + EPSILON
    }

    /// Headroom left for a department before its cap.
    pub fn remaining(&self, department: &str) -> f64 {
        self.wallets[&self.resolve(department)].remaining()
    }

    /// Record spend against the department's wallet. Callers check
    /// `can_spend` first; overspend is clamped and logged, not a panic.
    pub fn spend(&mut self, department: &str, cost: f64) {
        let key = self.resolve(department);
        let wallet = self.wallets.get_mut(&key).unwrap();
        wallet.spent += cost;
        if wallet.spent > wallet.max + EPSILON {
            warn!(
                "wallet '{}' overspent: {:.2} of max {:.2}",
                key, wallet.spent, wallet.max
            );
            wallet.spent = wallet.max;
        }
    }

    /// Percent of each wallet's base allocation actually spent.
    pub fn utilization(&self) -> BTreeMap<String, f64> {
        self.wallets
            .iter()
            .filter(|(_, w)| w.allocated > 0.0)
            .map(|(name, w)| (name.clone(), w.spent / w.allocated * 100.0))
            .collect()
    }
}
