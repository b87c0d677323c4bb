//! Pattern and event command implementations

use std::path::Path;

use anyhow::Result;
use autopilot_core::{
    analyze_all_patterns, get_all_upcoming_events, top_spending_insights, AnalyzedNewsEvent,
    DetectedEvent, SpendingPattern, Urgency,
};

use super::{print_json, read_json, truncate, RunContext};

pub fn build_patterns(ctx: &RunContext, limit: usize) -> Vec<SpendingPattern> {
    let patterns = analyze_all_patterns(&ctx.records.transactions);
    top_spending_insights(&patterns, limit)
}

pub fn cmd_patterns(ctx: &RunContext, limit: usize) -> Result<()> {
    let patterns = build_patterns(ctx, limit);
    if ctx.json {
        return print_json(&patterns);
    }

    println!();
    println!("🔎 Spending Patterns");
    println!("   ─────────────────────────────────────────────");
    if patterns.is_empty() {
        println!("   Not enough history to find patterns.");
        return Ok(());
    }

    for (i, pattern) in patterns.iter().enumerate() {
        println!("   {}. [{}] {}", i + 1, pattern.pattern_type, pattern.description);
        println!("      {}", pattern.insight);
        if pattern.savings_opportunity > 0.0 {
            println!(
                "      Potential savings: ${:.0}/month",
                pattern.savings_opportunity
            );
        }
    }

    Ok(())
}

pub fn build_events(
    ctx: &RunContext,
    days: Option<u32>,
    news: Option<&Path>,
) -> Result<Vec<DetectedEvent>> {
    let news: Vec<AnalyzedNewsEvent> = match news {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let days = days.unwrap_or(ctx.settings.events.days_ahead);
    Ok(get_all_upcoming_events(
        &ctx.records.transactions,
        &news,
        days,
        ctx.today,
    ))
}

pub fn cmd_events(ctx: &RunContext, days: Option<u32>, news: Option<&Path>) -> Result<()> {
    let events = build_events(ctx, days, news)?;
    if ctx.json {
        return print_json(&events);
    }

    println!();
    println!("📆 Upcoming Events");
    println!("   ─────────────────────────────────────────────");
    if events.is_empty() {
        println!("   Nothing coming up.");
        return Ok(());
    }

    println!(
        "   {:10} │ {:28} │ {:>9} │ {:8} │ {}",
        "Date", "Event", "Cost", "Source", "Urgency"
    );
    println!("   ───────────┼──────────────────────────────┼───────────┼──────────┼─────────");
    for event in &events {
        let urgency = match event.urgency {
            Urgency::High => "🔴 high",
            Urgency::Medium => "🟡 medium",
            Urgency::Low => "🟢 low",
        };
        println!(
            "   {:10} │ {:28} │ {:>9.2} │ {:8} │ {}",
            event.event_date,
            truncate(&event.event_name, 28),
            event.estimated_cost,
            event.source,
            urgency
        );
    }

    Ok(())
}
