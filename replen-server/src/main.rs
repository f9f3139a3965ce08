use std::env;
use std::process;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use replen_pipeline::simulation::{budget_sweep, SweepPoint};
use replen_pipeline::types::{AllocationPass, OrderQuery, RunOutcome};
use replen_pipeline::{load_candidates_file, ReferenceData, ReplenishmentPipeline};
use replen_policy::AllocationMode;

// ---------------------------------------------------------------------------
// JSON output contract
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RunJson {
    generated_at: String,
    mode: String,
    pipeline_ms: u128,
    #[serde(flatten)]
    outcome: RunOutcome,
}

#[derive(Serialize)]
struct SweepJson {
    generated_at: String,
    mode: String,
    pipeline_ms: u128,
    points: Vec<SweepPoint>,
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

/// Format a number with comma thousands separators.
fn format_dollars(amount: f64) -> String {
    let whole = amount.abs() as u64;
    let sign = if amount < 0.0 { "-" } else { "" };

    if whole < 1_000 {
        return format!("{}{}", sign, whole);
    }

    let s = whole.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    format!("{}{}", sign, result.chars().rev().collect::<String>())
}

/// How many order lines the human digest prints before truncating.
const MAX_DISPLAY_LINES: usize = 25;

fn print_human(outcome: &RunOutcome, load_ms: u128, pipeline_ms: u128) {
    let s = &outcome.summary;

    println!();
    println!("  \u{2554}{}\u{2557}", "\u{2550}".repeat(62));
    println!("  \u{2551}               REPLEN \u{2014} Order Proposal                       \u{2551}");
    println!("  \u{255a}{}\u{255d}", "\u{2550}".repeat(62));
    println!();

    println!(
        "  Budget ${}  \u{00b7}  tier '{}'  \u{00b7}  {} candidates evaluated",
        format_dollars(s.budget),
        s.tier,
        outcome.results.len()
    );
    println!(
        "  {} items stocked  \u{00b7}  ${} cash used (pass 1: ${} / pass 2: ${})",
        s.items_stocked,
        format_dollars(s.total_cash_used),
        format_dollars(s.pass1_cash),
        format_dollars(s.pass2_cash)
    );
    println!(
        "  ${} consignment value  \u{00b7}  ${} budget unused",
        format_dollars(s.total_consignment_value),
        format_dollars(s.unused_budget)
    );
    println!();

    let stocked: Vec<_> = outcome
        .results
        .iter()
        .filter(|r| r.recommended_quantity > 0)
        .collect();

    if stocked.is_empty() {
        println!("  Nothing to order. Shelves are covered or the budget is zero.");
    } else {
        println!("  {:\u{2500}<64}", "");
        for (i, r) in stocked.iter().take(MAX_DISPLAY_LINES).enumerate() {
            let pass_icon = match r.pass {
                AllocationPass::Pass1 => "P1",
                AllocationPass::Pass2 => "P2",
                AllocationPass::Rejected => "--",
            };
            let cost_str = if r.is_consignment {
                format!("(${} consign)", format_dollars(r.estimated_cost))
            } else {
                format!("${}", format_dollars(r.estimated_cost))
            };
            println!(
                "  {} {:3}. {:28} {:12} x{:<5} {:>16}",
                pass_icon,
                i + 1,
                r.name,
                r.department,
                r.recommended_quantity,
                cost_str,
            );
            println!("         {}", r.reasoning);
        }
        if stocked.len() > MAX_DISPLAY_LINES {
            println!("  ... +{} more order lines", stocked.len() - MAX_DISPLAY_LINES);
        }
        println!("  {:\u{2500}<64}", "");
    }

    println!();
    let sk = &s.skip_counts;
    println!(
        "  Skipped: {} no-order \u{00b7} {} ineligible \u{00b7} {} over ceiling \u{00b7} {} class-gated \u{00b7} {} wallet-capped \u{00b7} {} out of budget",
        sk.zero_quantity, sk.ineligible, sk.price_ceiling, sk.class_restricted, sk.wallet_cap, sk.budget_exhausted
    );

    if !s.department_utilization.is_empty() {
        let line = s
            .department_utilization
            .iter()
            .map(|(dept, pct)| format!("{} {:.0}%", dept, pct))
            .collect::<Vec<_>>()
            .join("  \u{00b7}  ");
        println!("  Wallets: {}", line);
    }

    println!();
    println!(
        "  \u{23f1}  CSV loaded in {}ms \u{00b7} Allocation ran in {}ms \u{00b7} Total {}ms",
        load_ms,
        pipeline_ms,
        load_ms + pipeline_ms
    );
    println!();
}

fn print_sweep_human(points: &[SweepPoint], pipeline_ms: u128) {
    println!();
    println!(
        "  {:>14}  {:8}  {:>8}  {:>14}  {:>14}",
        "budget", "tier", "items", "cash used", "unused"
    );
    println!("  {:\u{2500}<64}", "");
    for p in points {
        println!(
            "  {:>14}  {:8}  {:>8}  {:>14}  {:>14}",
            format!("${}", format_dollars(p.budget)),
            p.tier,
            p.items_stocked,
            format!("${}", format_dollars(p.total_cash_used)),
            format!("${}", format_dollars(p.unused_budget)),
        );
    }
    println!();
    println!("  \u{23f1}  {} runs in {}ms", points.len(), pipeline_ms);
    println!();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn usage() -> ! {
    eprintln!("Usage: replen-server <candidates.csv> --budget N [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --budget      Capital budget for this run (required unless --sweep)");
    eprintln!("  --sweep       Comma-separated budget ladder; runs each in parallel");
    eprintln!("  --mode        'replenishment' (default) or 'initial-load'");
    eprintln!("  --weights     Department weights CSV (department,weight)");
    eprintln!("  --staples     Staple product list JSON");
    eprintln!("  --no-capital  No-capital (consignment) supplier list JSON");
    eprintln!("  --json        Output as JSON instead of formatted text");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  replen-server fixtures/candidates.csv --budget 250000");
    eprintln!("  replen-server fixtures/candidates.csv --budget 250000 --weights weights.csv --json");
    eprintln!("  replen-server fixtures/candidates.csv --sweep 50000,100000,250000");
    process::exit(1);
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let csv_path = &args[1];

    let mut budget: Option<f64> = None;
    let mut sweep: Option<Vec<f64>> = None;
    let mut mode = AllocationMode::Replenishment;
    let mut weights_path: Option<String> = None;
    let mut staples_path: Option<String> = None;
    let mut no_capital_path: Option<String> = None;
    let mut json_output = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--budget" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --budget requires a number");
                    process::exit(1);
                }
                budget = Some(args[i + 1].parse().unwrap_or_else(|_| {
                    eprintln!("Error: --budget requires a number");
                    process::exit(1);
                }));
                i += 2;
            }
            "--sweep" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --sweep requires a comma-separated budget list");
                    process::exit(1);
                }
                let parsed: Result<Vec<f64>, _> =
                    args[i + 1].split(',').map(|s| s.trim().parse()).collect();
                sweep = Some(parsed.unwrap_or_else(|_| {
                    eprintln!("Error: --sweep requires a comma-separated budget list");
                    process::exit(1);
                }));
                i += 2;
            }
            "--mode" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --mode requires a value");
                    process::exit(1);
                }
                mode = match args[i + 1].as_str() {
                    "replenishment" => AllocationMode::Replenishment,
                    "initial-load" => AllocationMode::InitialLoad,
                    other => {
                        eprintln!("Error: unknown mode '{}'", other);
                        process::exit(1);
                    }
                };
                i += 2;
            }
            "--weights" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --weights requires a file path");
                    process::exit(1);
                }
                weights_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--staples" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --staples requires a file path");
                    process::exit(1);
                }
                staples_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--no-capital" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --no-capital requires a file path");
                    process::exit(1);
                }
                no_capital_path = Some(args[i + 1].clone());
                i += 2;
            }
            "--json" => {
                json_output = true;
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
    }

    if budget.is_none() && sweep.is_none() {
        eprintln!("Error: either --budget or --sweep is required");
        usage();
    }

    let load_start = Instant::now();
    let records = match load_candidates_file(csv_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error loading CSV: {}", e);
            process::exit(1);
        }
    };
    let reference = match ReferenceData::from_files(
        weights_path.as_deref(),
        staples_path.as_deref(),
        no_capital_path.as_deref(),
    ) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error loading reference data: {}", e);
            process::exit(1);
        }
    };
    let load_ms = load_start.elapsed().as_millis();

    let pipeline = ReplenishmentPipeline::new(reference);
    let mode_str = match mode {
        AllocationMode::Replenishment => "replenishment",
        AllocationMode::InitialLoad => "initial-load",
    };

    if let Some(budgets) = sweep {
        let sweep_start = Instant::now();
        let points = match budget_sweep(&pipeline, &records, mode, &budgets) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Sweep failed: {}", e);
                process::exit(1);
            }
        };
        let pipeline_ms = sweep_start.elapsed().as_millis();

        if json_output {
            let out = SweepJson {
                generated_at: Utc::now().to_rfc3339(),
                mode: mode_str.to_string(),
                pipeline_ms,
                points,
            };
            println!("{}", serde_json::to_string_pretty(&out).unwrap());
        } else {
            print_sweep_human(&points, pipeline_ms);
        }
        return;
    }

    let query = OrderQuery::new(budget.unwrap_or(0.0), mode);
    let run_start = Instant::now();
    let outcome = match pipeline.run(&query, &records) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Allocation failed: {}", e);
            process::exit(1);
        }
    };
    let pipeline_ms = run_start.elapsed().as_millis();

    if json_output {
        let out = RunJson {
            generated_at: Utc::now().to_rfc3339(),
            mode: mode_str.to_string(),
            pipeline_ms,
            outcome,
        };
        println!("{}", serde_json::to_string_pretty(&out).unwrap());
    } else {
        print_human(&outcome, load_ms, pipeline_ms);
    }
}
