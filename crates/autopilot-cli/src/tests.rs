//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;
use std::path::PathBuf;

use autopilot_core::{EngineSettings, GoalStatus, SimulationInput};
use chrono::NaiveDate;
use tempfile::{NamedTempFile, TempDir};

use crate::commands::{self, truncate, RecordSources, RunContext};

const TRANSACTIONS: &str = "id,date,name,category,amount
rent-1,2024-07-01,Landlord LLC,Rent,1500
rent-2,2024-08-01,Landlord LLC,Rent,1500
rent-3,2024-09-01,Landlord LLC,Rent,1500
net-1,2024-07-15,Netflix,Subscriptions,15.99
net-2,2024-08-15,Netflix,Subscriptions,15.99
net-3,2024-09-15,Netflix,Subscriptions,15.99
din-1,2024-07-12,Bistro,Dining,48
din-2,2024-08-09,Bistro,Dining,52
din-3,2024-09-13,Bistro,Dining,46.50
shop-1,2024-08-24,Electronics Hub,Shopping,700
gro-1,2024-09-07,Market,Groceries,121.75
bad,not-a-date,Market,Groceries,10
";

const INCOME: &str = "date,amount
2024-07-01,4000
2024-08-01,4000
2024-09-01,4000
";

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn setup_context(dir: &TempDir) -> RunContext {
    let sources = RecordSources {
        transactions: Some(write_file(dir, "transactions.csv", TRANSACTIONS)),
        income: Some(write_file(dir, "income.csv", INCOME)),
        dataset: None,
    };
    RunContext {
        records: commands::load_records(&sources).unwrap(),
        today: NaiveDate::from_ymd_opt(2024, 9, 20).unwrap(),
        settings: EngineSettings::embedded(),
        json: false,
    }
}

// ========== Loading Tests ==========

#[test]
fn test_load_records_skips_bad_rows() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);
    assert_eq!(ctx.records.transactions.len(), 11);
    assert_eq!(ctx.records.income.len(), 3);
}

#[test]
fn test_load_records_requires_a_source() {
    let result = commands::load_records(&RecordSources::default());
    assert!(result.is_err());
}

#[test]
fn test_load_records_dataset_wins() {
    let dir = TempDir::new().unwrap();
    let dataset = write_file(
        &dir,
        "data.json",
        r#"{"transactions": [{"amount": 12, "category": "Coffee", "date": "2024-09-01", "name": "Cafe"}],
            "income": []}"#,
    );
    let sources = RecordSources {
        transactions: Some(write_file(&dir, "transactions.csv", TRANSACTIONS)),
        income: None,
        dataset: Some(dataset),
    };

    let records = commands::load_records(&sources).unwrap();
    assert_eq!(records.transactions.len(), 1);
    assert!(records.income.is_empty());
}

#[test]
fn test_load_records_missing_file() {
    let sources = RecordSources {
        transactions: Some(PathBuf::from("/nonexistent/transactions.csv")),
        ..Default::default()
    };
    assert!(commands::load_records(&sources).is_err());
}

#[test]
fn test_load_settings_from_file() {
    let file = temp_file(
        "[budget]\ndefault_priority = \"aggressive\"\n\n[events]\ndays_ahead = 30\n\n\
         [simulation]\nstarting_balance = 100.0\nsavings_goal = 1000.0\nhistory_months = 3\n\n\
         [timemachine]\nstarting_balance = 0.0\nsavings_goal = 1000.0\nregret_limit = 3\n\
         min_event_amount = 50.0\ncategory_scale_factor = 0.5\n",
    );
    let settings = commands::load_settings(Some(file.path())).unwrap();
    assert_eq!(settings.events.days_ahead, 30);
    assert_eq!(settings.timemachine.regret_limit, 3);
}

#[test]
fn test_load_settings_missing_file() {
    let result = commands::load_settings(Some(std::path::Path::new("/nonexistent/autopilot.toml")));
    assert!(result.is_err());
}

// ========== Date Tests ==========

#[test]
fn test_resolve_today() {
    assert_eq!(
        commands::resolve_today(Some("2024-02-29")).unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    );
    assert!(commands::resolve_today(Some("02/29/2024")).is_err());
    assert!(commands::resolve_today(None).is_ok());
}

#[test]
fn test_resolve_range() {
    assert_eq!(commands::resolve_range(None, None).unwrap(), None);
    assert!(commands::resolve_range(Some("2024-01-01"), None).is_err());
    assert!(commands::resolve_range(Some("2024-03-01"), Some("2024-01-01")).is_err());

    let range = commands::resolve_range(Some("2024-01-01"), Some("2024-03-31"))
        .unwrap()
        .unwrap();
    assert_eq!(range.0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
}

#[test]
fn test_resolve_priority() {
    let settings = EngineSettings::embedded();
    assert_eq!(
        commands::resolve_priority(Some("Aggressive"), &settings).unwrap(),
        autopilot_core::Priority::Aggressive
    );
    assert_eq!(
        commands::resolve_priority(None, &settings).unwrap(),
        settings.budget.default_priority
    );
    assert!(commands::resolve_priority(Some("yolo"), &settings).is_err());
}

// ========== Budget Command Tests ==========

#[test]
fn test_cmd_budget() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);
    assert!(commands::cmd_budget(&ctx, None, &[]).is_ok());
    assert!(commands::cmd_budget(&ctx, Some("lifestyle"), &["Dining".to_string()]).is_ok());
}

#[test]
fn test_build_budget_protects_extra_categories() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);

    let init = commands::build_budget(&ctx, Some("balanced"), &["dining".to_string()]).unwrap();

    assert_eq!(init.config.monthly_income, 4000.0);
    assert!(init
        .config
        .non_negotiable_categories
        .iter()
        .any(|c| c.as_str() == "Dining"));
}

#[test]
fn test_build_budget_rejects_empty_category() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);
    assert!(commands::build_budget(&ctx, None, &["  ".to_string()]).is_err());
}

#[test]
fn test_cmd_summary() {
    let dir = TempDir::new().unwrap();
    let mut ctx = setup_context(&dir);

    let mtd = commands::build_summary(&ctx, 2500.0, None).unwrap();
    assert_eq!(mtd.summary.month, "2024-09");
    assert_eq!(mtd.summary.days_remaining, 10);

    assert!(commands::cmd_summary(&ctx, 2500.0, None).is_ok());
    ctx.json = true;
    assert!(commands::cmd_summary(&ctx, 2500.0, None).is_ok());
}

#[test]
fn test_cmd_goals() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);
    let goals = temp_file(
        r#"[
            {"name": "Vacation", "targetAmount": 1000, "currentAmount": 1000, "createdAt": "2024-01-01"},
            {"name": "Car", "targetAmount": 10000, "currentAmount": 500,
             "deadline": "2025-01-01", "createdAt": "2024-01-01"}
        ]"#,
    );

    let evaluations = commands::build_goal_evaluations(&ctx, goals.path()).unwrap();
    assert_eq!(evaluations.len(), 2);
    assert_eq!(evaluations[0].status, GoalStatus::Completed);
    assert_eq!(evaluations[1].status, GoalStatus::Behind);

    assert!(commands::cmd_goals(&ctx, goals.path()).is_ok());
}

#[test]
fn test_cmd_goals_invalid_json() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);
    let goals = temp_file("{not json");
    assert!(commands::cmd_goals(&ctx, goals.path()).is_err());
}

// ========== Insight Command Tests ==========

#[test]
fn test_cmd_patterns() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);
    assert!(commands::build_patterns(&ctx, 2).len() <= 2);
    assert!(commands::cmd_patterns(&ctx, 5).is_ok());
}

#[test]
fn test_cmd_events_with_news() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);
    let news = temp_file(
        r#"[{
            "eventName": "Rent increase",
            "timeframe": "next week",
            "affectedCategory": "Rent",
            "impactType": "increase",
            "impactPercentage": 5,
            "reasoning": "Local vacancy is low",
            "actionableAdvice": "Negotiate a longer lease"
        }]"#,
    );

    let events = commands::build_events(&ctx, Some(30), Some(news.path())).unwrap();
    assert!(events.iter().all(|e| e.days_away <= 30));
    assert!(events.iter().any(|e| e.event_name == "Rent increase"));

    assert!(commands::cmd_events(&ctx, None, Some(news.path())).is_ok());
}

// ========== Simulation Command Tests ==========

#[test]
fn test_cmd_simulate() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);

    let result = commands::build_simulation(&ctx, SimulationInput::new(6, 20.0), None).unwrap();
    assert!(result.connected);
    assert_eq!(result.projections.len(), 6);

    assert!(commands::cmd_simulate(&ctx, SimulationInput::new(3, 10.0), None).is_ok());
}

#[test]
fn test_cmd_simulate_rejects_bad_months() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);
    assert!(commands::cmd_simulate(&ctx, SimulationInput::new(0, 20.0), None).is_err());
}

// ========== Time Machine Command Tests ==========

#[test]
fn test_cmd_branch() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);
    let ops = temp_file(r#"[{"type": "REMOVE", "eventId": "shop-1"}]"#);

    let comparison = commands::build_branch(&ctx, ops.path(), None).unwrap();
    assert!((comparison.delta.net_worth_delta - 700.0).abs() < 0.01);

    assert!(commands::cmd_branch(&ctx, ops.path(), None).is_ok());
}

#[test]
fn test_cmd_branch_invalid_operation() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);
    let ops = temp_file(r#"[{"type": "SCALE", "eventId": "shop-1", "factor": -1}]"#);
    assert!(commands::cmd_branch(&ctx, ops.path(), None).is_err());
}

#[test]
fn test_cmd_regrets() {
    let dir = TempDir::new().unwrap();
    let ctx = setup_context(&dir);

    let regrets = commands::build_regrets(&ctx, Some(1), None);
    assert_eq!(regrets.len(), 1);
    assert_eq!(regrets[0].id, "shop-1");

    assert!(commands::cmd_regrets(&ctx, None, None).is_ok());
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("Groceries", 20), "Groceries");
    assert_eq!(truncate("Electronics Hub Superstore", 10), "Electro...");
    assert_eq!(truncate("Café au lait", 6), "Caf...");
}
