//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup_test_app() -> Router {
    create_router(EngineSettings::embedded(), ServerConfig::default())
}

async fn get_body_json(response: axum::response::Response) -> Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_json(uri: &str, body: Value) -> axum::response::Response {
    setup_test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Three months of rent, streaming, dining and one large purchase
fn records() -> Value {
    json!({
        "transactions": [
            {"id": "rent-1", "amount": 1500, "category": "Rent", "date": "2024-07-01", "name": "Landlord LLC"},
            {"id": "rent-2", "amount": 1500, "category": "Rent", "date": "2024-08-01", "name": "Landlord LLC"},
            {"id": "rent-3", "amount": 1500, "category": "Rent", "date": "2024-09-01", "name": "Landlord LLC"},
            {"id": "net-1", "amount": 15.99, "category": "Subscriptions", "date": "2024-07-15", "name": "Netflix"},
            {"id": "net-2", "amount": 15.99, "category": "Subscriptions", "date": "2024-08-15", "name": "Netflix"},
            {"id": "net-3", "amount": 15.99, "category": "Subscriptions", "date": "2024-09-15", "name": "Netflix"},
            {"id": "din-1", "amount": 48, "category": "Dining", "date": "2024-07-12", "name": "Bistro"},
            {"id": "din-2", "amount": 52, "category": "Dining", "date": "2024-08-09", "name": "Bistro"},
            {"id": "din-3", "amount": 46.5, "category": "Dining", "date": "2024-09-13", "name": "Bistro"},
            {"id": "shop-1", "amount": 700, "category": "Shopping", "date": "2024-08-24", "name": "Electronics Hub"}
        ],
        "income": [
            {"amount": 4000, "date": "2024-07-01"},
            {"amount": 4000, "date": "2024-08-01"},
            {"amount": 4000, "date": "2024-09-01"}
        ],
        "today": "2024-09-20"
    })
}

/// Merge extra fields into the shared records body
fn with_records(extra: Value) -> Value {
    let mut body = records();
    if let (Some(target), Some(fields)) = (body.as_object_mut(), extra.as_object()) {
        for (k, v) in fields {
            target.insert(k.clone(), v.clone());
        }
    }
    body
}

// ========== Health Tests ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route() {
    let response = post_json("/api/nope", json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Budget API Tests ==========

#[tokio::test]
async fn test_initialize_budget() {
    let response = post_json(
        "/api/budget/initialize",
        with_records(json!({"priority": "aggressive", "nonNegotiableCategories": ["Dining"]})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["config"]["priority"], "aggressive");
    assert_eq!(json["config"]["monthlyIncome"], 4000.0);
    assert_eq!(json["config"]["savingsTargetPercentage"], 30.0);
    let protected = json["config"]["nonNegotiableCategories"].as_array().unwrap();
    assert!(protected.contains(&json!("Rent")));
    assert!(protected.contains(&json!("Dining")));
    assert!(json["plan"]["budgets"].as_array().unwrap().len() >= 4);
}

#[tokio::test]
async fn test_initialize_rejects_negative_amount() {
    let body = json!({
        "transactions": [
            {"amount": -5, "category": "Dining", "date": "2024-07-01", "name": "Refund"}
        ]
    });

    let response = post_json("/api/budget/initialize", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().starts_with("transactions[0]"));
}

#[tokio::test]
async fn test_initialize_empty_records() {
    let response = post_json("/api/budget/initialize", json!({})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["config"]["monthlyIncome"], 0.0);
    assert!(json["plan"]["budgets"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_budget_summary() {
    let response = post_json(
        "/api/budget/summary",
        with_records(json!({"accountBalance": 2500})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["summary"]["month"], "2024-09");
    assert_eq!(json["summary"]["daysRemaining"], 10);
    assert_eq!(json["summary"]["totalIncome"], 4000.0);
    assert_eq!(json["safeToSpend"]["daysRemaining"], 10);
    let bills = json["upcomingBills"].as_array().unwrap();
    assert!(bills.iter().any(|b| b["name"] == "Landlord LLC"));
}

#[tokio::test]
async fn test_safe_to_spend() {
    let body = json!({
        "transactions": [
            {"amount": 15.99, "category": "Subscriptions", "date": "2024-07-22", "name": "Netflix"},
            {"amount": 15.99, "category": "Subscriptions", "date": "2024-08-22", "name": "Netflix"}
        ],
        "accountBalance": 1000,
        "monthlyBudget": 600,
        "spentSoFar": 300,
        "today": "2024-09-20"
    });

    let response = post_json("/api/budget/safe-to-spend", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["upcomingBillsCount"], 1);
    assert_eq!(json["upcomingBillNames"][0], "Netflix");
    assert_eq!(json["dailyBudgetRemaining"], 30.0);
    assert_eq!(json["daysRemaining"], 10);
    assert_eq!(json["isNegative"], false);
}

#[tokio::test]
async fn test_safe_to_spend_rejects_negative_window() {
    let body = json!({
        "accountBalance": 1000,
        "monthlyBudget": 600,
        "lookAheadDays": -1
    });

    let response = post_json("/api/budget/safe-to-spend", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ========== Insight API Tests ==========

#[tokio::test]
async fn test_patterns() {
    let response = post_json("/api/insights/patterns", with_records(json!({"limit": 2}))).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let patterns = json["patterns"].as_array().unwrap();
    let insights = json["insights"].as_array().unwrap();
    assert!(insights.len() <= 2);
    assert!(insights.len() <= patterns.len());
    for insight in insights {
        assert_eq!(insight["kind"], "statistical");
    }
}

#[tokio::test]
async fn test_events_merges_news_and_user_events() {
    let body = with_records(json!({
        "daysAhead": 30,
        "news": [{
            "eventName": "Streaming price hike",
            "timeframe": "next week",
            "affectedCategory": "Subscriptions",
            "impactType": "increase",
            "impactPercentage": 20,
            "reasoning": "Providers announced new tiers",
            "actionableAdvice": "Review plans"
        }],
        "userEvents": [{
            "eventName": "Wedding",
            "eventDate": "2024-10-05",
            "category": "Travel",
            "estimatedCost": 800
        }]
    }));

    let response = post_json("/api/events", body).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let events = json.as_array().unwrap();
    let news = events
        .iter()
        .find(|e| e["eventName"] == "Streaming price hike")
        .unwrap();
    assert_eq!(news["source"], "news");
    let wedding = events.iter().find(|e| e["eventName"] == "Wedding").unwrap();
    assert_eq!(wedding["source"], "user");
    assert_eq!(wedding["daysAway"], 15);

    let dates: Vec<&str> = events
        .iter()
        .map(|e| e["eventDate"].as_str().unwrap())
        .collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
}

// ========== Simulation API Tests ==========

#[tokio::test]
async fn test_simulate() {
    let body = with_records(json!({
        "scenario": {"months": 6, "savingsRatePercent": 20}
    }));

    let response = post_json("/api/simulate", body).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["connected"], true);
    assert_eq!(json["projections"].as_array().unwrap().len(), 6);
    assert_eq!(json["projections"][0]["monthName"], "Sep 2024");
}

#[tokio::test]
async fn test_simulate_invalid_months() {
    let body = with_records(json!({
        "scenario": {"months": 0, "savingsRatePercent": 20}
    }));

    let response = post_json("/api/simulate", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_simulate_without_history() {
    let body = json!({"scenario": {"months": 3, "savingsRatePercent": 10}});

    let response = post_json("/api/simulate", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["connected"], false);
}

// ========== Time Machine API Tests ==========

#[tokio::test]
async fn test_branch_remove_purchase() {
    let body = with_records(json!({
        "operations": [{"type": "REMOVE", "eventId": "shop-1"}]
    }));

    let response = post_json("/api/timemachine/branch", body).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let delta = json["delta"]["netWorthDelta"].as_f64().unwrap();
    assert!((delta - 700.0).abs() < 0.01);
    assert_eq!(json["baseline"]["months"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_branch_invalid_operation() {
    let body = with_records(json!({
        "operations": [{"type": "CAP", "category": "Dining", "monthlyLimit": -10}]
    }));

    let response = post_json("/api/timemachine/branch", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_branch_extreme_delay() {
    let body = with_records(json!({
        "operations": [{"type": "DELAY", "eventId": "shop-1", "months": 2147483647}]
    }));

    let response = post_json("/api/timemachine/branch", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("DELAY"));
}

#[tokio::test]
async fn test_branch_half_open_window() {
    let body = with_records(json!({
        "startDate": "2024-07-01",
        "operations": []
    }));

    let response = post_json("/api/timemachine/branch", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_regrets() {
    let response = post_json("/api/timemachine/regrets", with_records(json!({"limit": 2}))).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let regrets = json.as_array().unwrap();
    assert!(!regrets.is_empty() && regrets.len() <= 2);
    assert_eq!(regrets[0]["rank"], 1);
    assert_eq!(regrets[0]["id"], "shop-1");
    assert_eq!(regrets[0]["operation"]["type"], "REMOVE");
}

// ========== Goal API Tests ==========

#[tokio::test]
async fn test_evaluate_goals() {
    let body = json!({
        "today": "2024-09-20",
        "goals": [
            {"name": "Emergency fund", "targetAmount": 1000, "currentAmount": 1200, "createdAt": "2024-01-01"},
            {"name": "Car", "targetAmount": 10000, "currentAmount": 500,
             "deadline": "2025-01-01", "createdAt": "2024-01-01"}
        ]
    });

    let response = post_json("/api/goals/evaluate", body).await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json[0]["status"], "completed");
    assert_eq!(json[1]["status"], "behind");
    assert_eq!(json[1]["daysRemaining"], 103);
}

#[tokio::test]
async fn test_evaluate_goals_malformed_body() {
    let response = post_json("/api/goals/evaluate", json!({"goals": "nope"})).await;
    assert!(response.status().is_client_error());
}
