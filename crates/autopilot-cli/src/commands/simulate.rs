//! Simulation command implementation

use std::path::Path;

use anyhow::{Context, Result};
use autopilot_core::events::impacts_from_news;
use autopilot_core::{run_simulation, AnalyzedNewsEvent, SimulationInput, SimulationResult};

use super::{print_json, read_json, truncate, RunContext};

/// Run a scenario, folding any analyzed news into its impacts
pub fn build_simulation(
    ctx: &RunContext,
    mut input: SimulationInput,
    news: Option<&Path>,
) -> Result<SimulationResult> {
    if let Some(path) = news {
        let news: Vec<AnalyzedNewsEvent> = read_json(path)?;
        input
            .news_impacts
            .extend(impacts_from_news(&news, ctx.today));
    }

    run_simulation(
        &input,
        &ctx.records.transactions,
        &ctx.records.income,
        &ctx.settings.simulation,
        ctx.today,
    )
    .context("Simulation failed")
}

pub fn cmd_simulate(ctx: &RunContext, input: SimulationInput, news: Option<&Path>) -> Result<()> {
    let result = build_simulation(ctx, input, news)?;
    if ctx.json {
        return print_json(&result);
    }

    println!();
    println!("🔮 Simulation");
    println!("   ─────────────────────────────────────────────");
    if !result.connected {
        println!("   No income or spending history to project from.");
        return Ok(());
    }

    println!(
        "   {:10} │ {:>10} │ {:>10} │ {:>10} │ {:>11}",
        "Month", "Income", "Expenses", "Savings", "Balance"
    );
    println!("   ───────────┼────────────┼────────────┼────────────┼────────────");
    for p in &result.projections {
        println!(
            "   {:10} │ {:>10.2} │ {:>10.2} │ {:>10.2} │ {:>11.2}",
            truncate(&p.month_name, 10),
            p.income,
            p.expenses,
            p.savings,
            p.balance
        );
    }

    println!();
    println!("   End balance:   ${:.2}", result.end_balance);
    println!("   Goal progress: {:.0}%", result.goal_progress);
    println!("   Risk score:    {:.0}/100", result.risk_score);

    if !result.insights.is_empty() {
        println!();
        for insight in &result.insights {
            println!("   💡 {}", insight.headline());
        }
    }

    Ok(())
}
