use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use engine::{Engine, Identity};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database};
use serde_json::{Value, json};
use server::StaticTokenProvider;
use tower::ServiceExt;

const ALICE: &str = "alice-token";
const BOB: &str = "bob-token";
const ROOT: &str = "root-token";

async fn app() -> (Router, Arc<Engine>) {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Arc::new(Engine::builder().database(db).build().await.unwrap());

    let tokens = [(ALICE, "alice"), (BOB, "bob"), (ROOT, "root")].map(|(token, subject)| {
        (
            token.to_string(),
            Identity {
                subject: subject.to_string(),
                email: Some(format!("{subject}@example.com")),
                ..Identity::default()
            },
        )
    });
    let identity = Arc::new(StaticTokenProvider::new(tokens));
    (server::router(engine.clone(), identity), engine)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn missing_or_unknown_tokens_are_unauthorized() {
    let (app, _) = app().await;

    let (status, _) = call(&app, Method::GET, "/summary/kpis", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(&app, Method::GET, "/summary/kpis", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = call(&app, Method::POST, "/auth/sync", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn sync_then_profile() {
    let (app, _) = app().await;

    let (status, synced) = call(&app, Method::POST, "/auth/sync", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(synced["email"], "alice@example.com");
    assert_eq!(synced["currency"], "USD");

    let (status, updated) = call(
        &app,
        Method::PATCH,
        "/me",
        Some(ALICE),
        Some(json!({"currency": "VND", "monthly_budget": "1500,50"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], synced["id"]);
    assert_eq!(updated["currency"], "VND");
    assert_eq!(updated["monthly_budget"], 1500.5);

    let (_, me) = call(&app, Method::GET, "/me", Some(ALICE), None).await;
    assert_eq!(me["monthly_budget"], 1500.5);
}

#[tokio::test]
async fn ledger_round_trip_through_http() {
    let (app, _) = app().await;

    let (status, income) = call(
        &app,
        Method::POST,
        "/incomes",
        Some(ALICE),
        Some(json!({"amount": 5000000, "date": "2024-01-10", "category_name": "Salary"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(income["kind"], "income");

    for (amount, date, name) in [
        (150000, "2024-01-10", "Food & Drink"),
        (50000, "2024-01-11", "food & drink"),
    ] {
        let (status, _) = call(
            &app,
            Method::POST,
            "/expenses",
            Some(ALICE),
            Some(json!({"amount": amount, "date": date, "category_name": name})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, breakdown) = call(&app, Method::GET, "/expenses/summary", Some(ALICE), None).await;
    assert_eq!(
        breakdown,
        json!([{"category_name": "Food & Drink", "total": 200000.0}])
    );

    let (_, kpis) = call(&app, Method::GET, "/summary/kpis", Some(ALICE), None).await;
    assert_eq!(kpis["balance"], 4800000.0);

    let income_id = income["id"].as_str().unwrap();
    // An income cannot be removed through the expense routes.
    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/expenses/{income_id}"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/incomes/{income_id}"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, kpis) = call(&app, Method::GET, "/summary/kpis", Some(ALICE), None).await;
    assert_eq!(kpis["total_income"], 0.0);
    assert_eq!(kpis["balance"], -200000.0);

    let (_, period) = call(
        &app,
        Method::GET,
        "/summary/period?start_date=2024-01-10&end_date=2024-01-10",
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(period["total_expense"], 150000.0);

    let (_, dashboard) = call(&app, Method::GET, "/dashboard", Some(ALICE), None).await;
    assert_eq!(dashboard["recent_transactions"][0]["date"], "2024-01-11");

    let (status, _) = call(
        &app,
        Method::GET,
        "/summary/period?start_date=2024-02-01&end_date=2024-01-01",
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn other_users_entries_are_not_found() {
    let (app, _) = app().await;
    let (_, expense) = call(
        &app,
        Method::POST,
        "/expenses",
        Some(ALICE),
        Some(json!({"amount": 10, "category_name": "Coffee"})),
    )
    .await;
    let id = expense["id"].as_str().unwrap();

    let (status, _) = call(
        &app,
        Method::PATCH,
        &format!("/expenses/{id}"),
        Some(BOB),
        Some(json!({"amount": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = call(&app, Method::GET, "/expenses", Some(BOB), None).await;
    assert_eq!(listed["entries"], json!([]));
}

#[tokio::test]
async fn category_kind_change_is_reported() {
    let (app, _) = app().await;
    let (status, category) = call(
        &app,
        Method::POST,
        "/categories",
        Some(ALICE),
        Some(json!({"name": "Rent", "kind": "expense"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = category["id"].as_str().unwrap();

    let (status, _) = call(
        &app,
        Method::PATCH,
        &format!("/categories/{id}"),
        Some(ALICE),
        Some(json!({"kind": "income"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, updated) = call(
        &app,
        Method::PATCH,
        &format!("/categories/{id}"),
        Some(ALICE),
        Some(json!({"kind": "income", "name": "Housing"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["category"]["name"], "Housing");
    assert_eq!(updated["category"]["kind"], "expense");
    assert_eq!(updated["rejected"], json!(["kind"]));

    let (status, _) = call(
        &app,
        Method::POST,
        "/categories",
        Some(ALICE),
        Some(json!({"name": "housing", "kind": "expense"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/categories/{id}"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn assistant_tools_are_dispatched() {
    let (app, _) = app().await;
    let (status, created) = call(
        &app,
        Method::POST,
        "/assistant/tools",
        Some(ALICE),
        Some(json!({
            "name": "create_transaction",
            "arguments": {"type": "expense", "amount": 42.5, "category_name": "Books"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["tool"], "created");
    assert_eq!(created["entries"][0]["amount"], 42.5);

    let (_, balance) = call(
        &app,
        Method::POST,
        "/assistant/tools",
        Some(ALICE),
        Some(json!({"name": "get_balance"})),
    )
    .await;
    assert_eq!(balance["tool"], "balance");
    assert_eq!(balance["balance"], -42.5);

    let (status, _) = call(
        &app,
        Method::POST,
        "/assistant/tools",
        Some(ALICE),
        Some(json!({"name": "unknown_tool", "arguments": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn admin_routes_require_the_flag() {
    let (app, engine) = app().await;

    let (status, _) = call(&app, Method::GET, "/admin/kpis", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, root) = call(&app, Method::POST, "/auth/sync", Some(ROOT), None).await;
    let root_id = root["id"].as_str().unwrap().parse().unwrap();
    engine.set_admin(root_id, true).await.unwrap();

    let (status, seeded) = call(
        &app,
        Method::POST,
        "/admin/categories/seed",
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seeded["inserted"], 17);

    let (_, categories) = call(
        &app,
        Method::GET,
        "/categories?kind=income",
        Some(ALICE),
        None,
    )
    .await;
    let categories = categories["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 8);
    assert!(categories.iter().all(|c| c["is_default"] == true));

    let (_, kpis) = call(&app, Method::GET, "/admin/kpis", Some(ROOT), None).await;
    assert_eq!(kpis["total_users"], 2);

    let (_, users) = call(&app, Method::GET, "/admin/users?limit=10", Some(ROOT), None).await;
    let alice_id = users["users"]
        .as_array()
        .unwrap()
        .iter()
        .find(|user| user["email"] == "alice@example.com")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/admin/users/{alice_id}"),
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/admin/users/{alice_id}"),
        Some(ROOT),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
