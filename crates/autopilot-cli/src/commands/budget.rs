//! Budget command implementations

use std::path::Path;

use anyhow::Result;
use autopilot_core::{
    evaluate_goal, initialize_budget, month_to_date, BudgetInitialization, Category,
    GoalEvaluation, GoalStatus, MonthToDate, SavingsGoal,
};

use super::{print_json, read_json, resolve_priority, truncate, RunContext};

/// Derive allocations from history
pub fn build_budget(
    ctx: &RunContext,
    priority: Option<&str>,
    protect: &[String],
) -> Result<BudgetInitialization> {
    let priority = resolve_priority(priority, &ctx.settings)?;
    let protect = protect
        .iter()
        .map(|c| Category::parse(c))
        .collect::<autopilot_core::Result<Vec<_>>>()?;
    Ok(initialize_budget(
        &ctx.records.transactions,
        &ctx.records.income,
        priority,
        &protect,
    ))
}

pub fn cmd_budget(ctx: &RunContext, priority: Option<&str>, protect: &[String]) -> Result<()> {
    let init = build_budget(ctx, priority, protect)?;
    if ctx.json {
        return print_json(&init);
    }

    let plan = &init.plan;
    println!();
    println!("💰 Budget ({} priority)", init.config.priority);
    println!("   ─────────────────────────────────────────────");
    println!("   Monthly income:     ${:>10.2}", plan.monthly_income);
    println!("   Fixed costs:        ${:>10.2}", plan.fixed_costs);
    println!("   Discretionary pool: ${:>10.2}", plan.discretionary_pool);
    println!(
        "   Savings target:     ${:>10.2} ({:.0}%)",
        plan.savings_target, init.config.savings_target_percentage
    );

    if plan.over_committed {
        println!();
        println!("   ⚠️  Fixed costs exceed income. Discretionary budgets are zero.");
    }

    if plan.budgets.is_empty() {
        println!();
        println!("   No spending history to budget from.");
        return Ok(());
    }

    println!();
    println!("   {:22} │ {:>10} │ {:5}", "Category", "Allocated", "Kind");
    println!("   ───────────────────────┼────────────┼──────");
    for budget in &plan.budgets {
        let kind = if init.config.non_negotiable_categories.contains(&budget.category) {
            "🔒"
        } else if budget.is_fixed {
            "fixed"
        } else {
            ""
        };
        println!(
            "   {:22} │ {:>10.2} │ {}",
            truncate(budget.category.as_str(), 22),
            budget.allocated,
            kind
        );
    }

    Ok(())
}

/// Month-to-date view as of the context date
pub fn build_summary(ctx: &RunContext, balance: f64, priority: Option<&str>) -> Result<MonthToDate> {
    let priority = resolve_priority(priority, &ctx.settings)?;
    Ok(month_to_date(
        &ctx.records.transactions,
        &ctx.records.income,
        priority,
        &[],
        balance,
        ctx.today,
    ))
}

pub fn cmd_summary(ctx: &RunContext, balance: f64, priority: Option<&str>) -> Result<()> {
    let mtd = build_summary(ctx, balance, priority)?;
    if ctx.json {
        return print_json(&mtd);
    }

    let summary = &mtd.summary;
    println!();
    println!("📅 {} ({} days left)", summary.month, summary.days_remaining);
    println!("   ─────────────────────────────────────────────");
    println!(
        "   Spent ${:.2} of ${:.2} budgeted",
        summary.total_spent, summary.total_budget
    );
    println!(
        "   Savings: ${:.2} on track vs ${:.2} target",
        summary.savings_actual, summary.savings_target
    );
    println!();
    println!(
        "   {:22} │ {:>9} │ {:>9} │ {:>6} │ {}",
        "Category", "Spent", "Left", "Used", "Status"
    );
    println!("   ───────────────────────┼───────────┼───────────┼────────┼────────");
    for budget in &summary.category_budgets {
        println!(
            "   {:22} │ {:>9.2} │ {:>9.2} │ {:>5.0}% │ {}",
            truncate(budget.category.as_str(), 22),
            budget.spent,
            budget.remaining,
            budget.percent_used,
            budget.status
        );
    }

    let safe = &mtd.safe_to_spend;
    println!();
    println!("   Safe to spend today: ${:.2}", safe.amount);
    println!(
        "   Daily budget for the rest of the month: ${:.2}",
        safe.daily_budget_remaining
    );
    if safe.upcoming_bills_count > 0 {
        println!(
            "   Bills due this week: {} (${:.2})",
            safe.upcoming_bill_names.join(", "),
            safe.upcoming_bills_total
        );
    }
    if let Some(warning) = &safe.warning {
        println!("   ⚠️  {}", warning);
    }

    Ok(())
}

pub fn build_goal_evaluations(ctx: &RunContext, file: &Path) -> Result<Vec<GoalEvaluation>> {
    let goals: Vec<SavingsGoal> = read_json(file)?;
    Ok(goals.iter().map(|g| evaluate_goal(g, ctx.today)).collect())
}

pub fn cmd_goals(ctx: &RunContext, file: &Path) -> Result<()> {
    let evaluations = build_goal_evaluations(ctx, file)?;
    if ctx.json {
        return print_json(&evaluations);
    }

    println!();
    println!("🎯 Savings Goals");
    println!("   ─────────────────────────────────────────────");
    if evaluations.is_empty() {
        println!("   No goals.");
        return Ok(());
    }

    for eval in &evaluations {
        let icon = match eval.status {
            GoalStatus::Completed => "✅",
            GoalStatus::Ahead => "🚀",
            GoalStatus::OnTrack => "👍",
            GoalStatus::Behind => "⚠️ ",
        };
        println!(
            "   {} {:24} {:>5.1}%  ${:.2} to go ({})",
            icon,
            truncate(&eval.name, 24),
            eval.percent_complete,
            eval.remaining_amount,
            eval.status
        );
        if let Some(weekly) = eval.required_weekly {
            println!("      Save ${:.2}/week to finish on time", weekly);
        }
    }

    Ok(())
}
