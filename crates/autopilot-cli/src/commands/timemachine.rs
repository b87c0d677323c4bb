//! Time machine command implementations

use std::path::Path;

use anyhow::{Context, Result};
use autopilot_core::timemachine::BranchComparison;
use autopilot_core::{OperationSet, RegretCandidate, TimeMachine};
use chrono::NaiveDate;

use super::{print_json, read_json, truncate, RunContext};

fn machine(ctx: &RunContext, range: Option<(NaiveDate, NaiveDate)>) -> TimeMachine {
    TimeMachine::new(
        &ctx.records.transactions,
        &ctx.records.income,
        range,
        ctx.settings.timemachine.clone(),
    )
}

pub fn build_branch(
    ctx: &RunContext,
    ops: &Path,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<BranchComparison> {
    let ops: OperationSet = read_json(ops)?;
    machine(ctx, range)
        .compare(&ops)
        .context("Invalid operation")
}

pub fn cmd_branch(
    ctx: &RunContext,
    ops: &Path,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<()> {
    let comparison = build_branch(ctx, ops, range)?;
    if ctx.json {
        return print_json(&comparison);
    }

    let base = &comparison.baseline;
    let branch = &comparison.branch;
    let delta = &comparison.delta;
    println!();
    println!("⏪ Alternate Timeline");
    println!("   ─────────────────────────────────────────────");
    println!("   {:18} │ {:>12} │ {:>12}", "", "Actual", "Branch");
    println!("   ───────────────────┼──────────────┼─────────────");
    println!(
        "   {:18} │ {:>12.2} │ {:>12.2}",
        "Net worth today", base.net_worth_today, branch.net_worth_today
    );
    println!(
        "   {:18} │ {:>12.2} │ {:>12.2}",
        "Total expenses", base.total_expenses, branch.total_expenses
    );
    println!(
        "   {:18} │ {:>12.2} │ {:>12.2}",
        "Total savings", base.total_savings, branch.total_savings
    );
    println!(
        "   {:18} │ {:>11.0}% │ {:>11.0}%",
        "Risk", base.risk_score, branch.risk_score
    );
    println!();
    println!("   {}", delta.description);
    if let Some(months) = delta.goal_time_delta {
        println!("   Goal reached {:.1} months sooner", months);
    }

    Ok(())
}

pub fn build_regrets(
    ctx: &RunContext,
    limit: Option<usize>,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Vec<RegretCandidate> {
    let machine = machine(ctx, range);
    match limit {
        Some(limit) => autopilot_core::timemachine::find_top_regrets(&machine, limit),
        None => machine.top_regrets(),
    }
}

pub fn cmd_regrets(
    ctx: &RunContext,
    limit: Option<usize>,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<()> {
    let regrets = build_regrets(ctx, limit, range);
    if ctx.json {
        return print_json(&regrets);
    }

    println!();
    println!("😬 Regret Leaderboard");
    println!("   ─────────────────────────────────────────────");
    if regrets.is_empty() {
        println!("   Nothing to regret. Nice.");
        return Ok(());
    }

    for regret in &regrets {
        let sooner = regret
            .goal_time_reduction
            .map(|m| format!(" (goal {:.1} mo sooner)", m))
            .unwrap_or_default();
        println!(
            "   {:>2}. {:40} +${:.2}{}",
            regret.rank,
            truncate(&regret.description, 40),
            regret.potential_savings,
            sooner
        );
    }

    Ok(())
}
