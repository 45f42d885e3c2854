use chrono::NaiveDate;
use sea_orm::{ConnectOptions, Database};
use serde_json::json;
use uuid::Uuid;

use engine::{
    AnalyticsFilter, DEFAULT_HISTORY_LIMIT, Engine, EngineError, EntryKind, Identity, Money,
    NewEntry, ToolCall, ToolOutput, UserSettingsPatch,
};
use migration::MigratorTrait;

async fn engine() -> Engine {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

async fn user(engine: &Engine, subject: &str) -> Uuid {
    engine
        .sync_user(&Identity {
            subject: subject.to_string(),
            ..Identity::default()
        })
        .await
        .unwrap()
        .id
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

async fn record(
    engine: &Engine,
    user_id: Uuid,
    kind: EntryKind,
    major: i64,
    date: NaiveDate,
    category: &str,
) {
    engine
        .create_entry(
            user_id,
            NewEntry::new(kind, Money::from_major(major))
                .on(date)
                .category(category),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_ledger_reports_zeroes() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;

    let summary = engine.financial_summary(alice).await.unwrap();
    assert_eq!(summary.total_income, Money::ZERO);
    assert_eq!(summary.total_expense, Money::ZERO);
    assert_eq!(summary.balance, Money::ZERO);

    let dashboard = engine.dashboard(alice).await.unwrap();
    assert!(dashboard.recent.is_empty());
    assert!(dashboard.income_chart.is_empty());
    assert!(dashboard.expense_chart.is_empty());
    assert!(
        engine
            .category_breakdown(alice, EntryKind::Expense)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn period_summary_is_inclusive_and_validated() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    record(&engine, alice, EntryKind::Income, 5_000_000, day(2024, 1, 9), "Salary").await;
    record(&engine, alice, EntryKind::Expense, 150_000, day(2024, 1, 10), "Food & Drink").await;
    record(&engine, alice, EntryKind::Expense, 50_000, day(2024, 1, 11), "Food & Drink").await;

    let one_day = engine
        .period_summary(alice, day(2024, 1, 10), day(2024, 1, 10))
        .await
        .unwrap();
    assert_eq!(one_day.total_income, Money::ZERO);
    assert_eq!(one_day.total_expense, Money::from_major(150_000));
    assert_eq!(one_day.net_balance, Money::from_major(-150_000));

    let all = engine
        .period_summary(alice, day(2024, 1, 9), day(2024, 1, 11))
        .await
        .unwrap();
    assert_eq!(all.total_income, Money::from_major(5_000_000));
    assert_eq!(all.total_expense, Money::from_major(200_000));

    let inverted = engine
        .period_summary(alice, day(2024, 1, 11), day(2024, 1, 10))
        .await;
    assert!(matches!(inverted, Err(EngineError::InvalidRange(_))));

    let breakdown = engine
        .period_breakdown(alice, EntryKind::Expense, day(2024, 1, 11), day(2024, 1, 31))
        .await
        .unwrap();
    assert_eq!(breakdown.len(), 1);
    assert_eq!(breakdown[0].total, Money::from_major(50_000));
}

#[tokio::test]
async fn breakdown_groups_uncategorized_and_orders_by_total() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    record(&engine, alice, EntryKind::Expense, 10, day(2024, 2, 1), "Books").await;
    record(&engine, alice, EntryKind::Expense, 30, day(2024, 2, 1), "Rent").await;
    engine
        .create_entry(
            alice,
            NewEntry::new(EntryKind::Expense, Money::from_major(20)).on(day(2024, 2, 2)),
        )
        .await
        .unwrap();
    // Income never leaks into an expense breakdown.
    record(&engine, alice, EntryKind::Income, 999, day(2024, 2, 2), "Books").await;

    let breakdown = engine
        .summary_by_category(alice, EntryKind::Expense)
        .await
        .unwrap();
    let rows: Vec<(&str, Money)> = breakdown
        .iter()
        .map(|row| (row.category_name.as_str(), row.total))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Rent", Money::from_major(30)),
            ("Uncategorized", Money::from_major(20)),
            ("Books", Money::from_major(10)),
        ]
    );
}

#[tokio::test]
async fn dashboard_lists_newest_first_and_caps_recent() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    for offset in 0..12u32 {
        record(
            &engine,
            alice,
            EntryKind::Expense,
            i64::from(offset) + 1,
            day(2024, 1, 1 + offset),
            "Food & Drink",
        )
        .await;
    }
    record(&engine, alice, EntryKind::Income, 1000, day(2024, 1, 5), "Salary").await;

    let dashboard = engine.dashboard(alice).await.unwrap();
    assert_eq!(dashboard.recent.len(), 10);
    assert_eq!(dashboard.recent[0].occurred_on, day(2024, 1, 12));
    assert!(
        dashboard
            .recent
            .windows(2)
            .all(|pair| pair[0].occurred_on >= pair[1].occurred_on)
    );
    assert_eq!(dashboard.expense_chart.len(), 12);
    assert_eq!(dashboard.expense_chart[0].date, day(2024, 1, 1));
    assert_eq!(dashboard.income_chart.len(), 1);
    assert_eq!(dashboard.summary.total_expense, Money::from_major(78));
}

#[tokio::test]
async fn same_day_entries_break_ties_by_creation() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    record(&engine, alice, EntryKind::Expense, 1, day(2024, 1, 10), "First").await;
    record(&engine, alice, EntryKind::Expense, 2, day(2024, 1, 10), "Second").await;
    record(&engine, alice, EntryKind::Expense, 3, day(2024, 1, 9), "Earlier day").await;

    let recent = engine.recent_entries(alice, 5).await.unwrap();
    let names: Vec<&str> = recent
        .iter()
        .filter_map(|entry| entry.category_name.as_deref())
        .collect();
    assert_eq!(names, vec!["Second", "First", "Earlier day"]);
}

#[tokio::test]
async fn daily_trend_covers_the_window_only() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    let today = day(2024, 3, 31);
    record(&engine, alice, EntryKind::Expense, 5, day(2024, 3, 1), "Old").await;
    record(&engine, alice, EntryKind::Expense, 7, day(2024, 3, 2), "Edge").await;
    record(&engine, alice, EntryKind::Expense, 3, day(2024, 3, 31), "Today").await;
    record(&engine, alice, EntryKind::Expense, 4, day(2024, 3, 31), "Today").await;

    let trend = engine
        .daily_trend(alice, EntryKind::Expense, 30, today)
        .await
        .unwrap();
    assert_eq!(trend.len(), 2);
    assert_eq!(trend[0].date, day(2024, 3, 2));
    assert_eq!(trend[1].total, Money::from_major(7));

    let empty = engine
        .daily_trend(alice, EntryKind::Expense, 0, today)
        .await;
    assert!(matches!(empty, Err(EngineError::InvalidRange(_))));
}

#[tokio::test]
async fn monthly_summary_filters_by_year() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    record(&engine, alice, EntryKind::Income, 100, day(2023, 12, 31), "Salary").await;
    record(&engine, alice, EntryKind::Income, 200, day(2024, 1, 15), "Salary").await;
    record(&engine, alice, EntryKind::Expense, 50, day(2024, 1, 20), "Rent").await;
    record(&engine, alice, EntryKind::Expense, 70, day(2024, 3, 1), "Rent").await;

    let months = engine.monthly_summary(alice, 2024).await.unwrap();
    assert_eq!(months.len(), 2);
    assert_eq!(months[0].month, "2024-01");
    assert_eq!(months[0].income, Money::from_major(200));
    assert_eq!(months[0].expense, Money::from_major(50));
    assert_eq!(months[1].month, "2024-03");
    assert_eq!(months[1].income, Money::ZERO);
}

#[tokio::test]
async fn trends_keep_the_latest_points() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    for offset in 0..5u32 {
        record(&engine, alice, EntryKind::Income, 10, day(2024, 5, 1 + offset), "Salary").await;
    }

    let trends = engine.trends(alice, 3).await.unwrap();
    let dates: Vec<NaiveDate> = trends.income.iter().map(|point| point.date).collect();
    assert_eq!(dates, vec![day(2024, 5, 3), day(2024, 5, 4), day(2024, 5, 5)]);
    assert!(trends.expense.is_empty());
    assert!(matches!(
        engine.trends(alice, 0).await,
        Err(EngineError::InvalidRange(_))
    ));
}

#[tokio::test]
async fn analytics_applies_every_filter() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    record(&engine, alice, EntryKind::Expense, 10, day(2024, 4, 1), "Rent").await;
    record(&engine, alice, EntryKind::Expense, 20, day(2024, 4, 15), "Food").await;
    record(&engine, alice, EntryKind::Income, 40, day(2024, 4, 15), "Salary").await;
    record(&engine, alice, EntryKind::Expense, 80, day(2024, 5, 1), "Food").await;

    let april = engine
        .analytics(
            alice,
            AnalyticsFilter {
                start: Some(day(2024, 4, 1)),
                end: Some(day(2024, 4, 30)),
                ..AnalyticsFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(april.entries.len(), 3);
    assert_eq!(april.totals.total_income, Money::from_major(40));
    assert_eq!(april.totals.total_expense, Money::from_major(30));
    assert_eq!(april.distribution[0].category_name, "Salary");
    assert_eq!(april.distribution[0].kind, EntryKind::Income);

    let food = engine
        .resolve_or_create_category(alice, "food", EntryKind::Expense)
        .await
        .unwrap();
    let by_category = engine
        .analytics(
            alice,
            AnalyticsFilter {
                kind: Some(EntryKind::Expense),
                category_id: Some(food.id),
                ..AnalyticsFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_category.entries.len(), 2);
    assert_eq!(by_category.totals.total_expense, Money::from_major(100));
    assert_eq!(by_category.distribution.len(), 1);
}

#[tokio::test]
async fn budget_status_tracks_the_month() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    record(&engine, alice, EntryKind::Expense, 60, day(2024, 6, 3), "Rent").await;
    record(&engine, alice, EntryKind::Expense, 60, day(2024, 6, 30), "Food").await;
    record(&engine, alice, EntryKind::Expense, 500, day(2024, 7, 1), "Food").await;

    let without = engine.budget_status(alice, 2024, 6).await.unwrap();
    assert_eq!(without.budget, None);
    assert_eq!(without.spent, Money::from_major(120));
    assert!(!without.over_budget);

    engine
        .update_user_settings(
            alice,
            UserSettingsPatch {
                monthly_budget: Some(Some(Money::from_major(100))),
                ..UserSettingsPatch::default()
            },
        )
        .await
        .unwrap();
    let status = engine.budget_status(alice, 2024, 6).await.unwrap();
    assert_eq!(status.month, "2024-06");
    assert_eq!(status.remaining, Some(Money::from_major(-20)));
    assert!(status.over_budget);

    assert!(matches!(
        engine.budget_status(alice, 2024, 13).await,
        Err(EngineError::InvalidDate(_))
    ));
}

#[tokio::test]
async fn global_kpis_sum_every_user() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    let bob = user(&engine, "bob").await;
    record(&engine, alice, EntryKind::Income, 100, day(2024, 1, 1), "Salary").await;
    record(&engine, bob, EntryKind::Expense, 30, day(2024, 1, 1), "Food").await;

    let kpis = engine.global_kpis().await.unwrap();
    assert_eq!(kpis.total_users, 2);
    assert_eq!(kpis.total_income, Money::from_major(100));
    assert_eq!(kpis.total_expense, Money::from_major(30));
    assert_eq!(kpis.net_balance, Money::from_major(70));

    let today = chrono::Utc::now().date_naive();
    let growth = engine.user_growth(7, today).await.unwrap();
    assert_eq!(growth.iter().map(|g| g.count).sum::<u64>(), 2);

    // Each user still only sees its own ledger.
    let bob_summary = engine.financial_summary(bob).await.unwrap();
    assert_eq!(bob_summary.total_income, Money::ZERO);
}

#[tokio::test]
async fn growth_window_cannot_start_before_year_zero() {
    let engine = engine().await;
    user(&engine, "alice").await;

    assert!(matches!(
        engine.user_growth(u32::MAX, day(2026, 1, 1)).await,
        Err(EngineError::InvalidDate(_))
    ));
    assert!(matches!(
        engine.user_growth(0, day(2026, 1, 1)).await,
        Err(EngineError::InvalidRange(_))
    ));
}

#[tokio::test]
async fn amounts_are_capped_and_reports_stay_consistent() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;

    let too_large = Money::new(Money::MAX.minor() + 1);
    assert!(matches!(
        engine
            .create_entry(alice, NewEntry::new(EntryKind::Income, too_large))
            .await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine
            .create_entry(alice, NewEntry::new(EntryKind::Income, Money::new(i64::MAX / 2 + 1)))
            .await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert!(matches!(
        engine
            .update_user_settings(
                alice,
                UserSettingsPatch {
                    monthly_budget: Some(Some(too_large)),
                    ..UserSettingsPatch::default()
                },
            )
            .await,
        Err(EngineError::InvalidAmount(_))
    ));

    for date in [day(2024, 1, 10), day(2024, 2, 10)] {
        engine
            .create_entry(alice, NewEntry::new(EntryKind::Income, Money::MAX).on(date))
            .await
            .unwrap();
    }
    engine
        .create_entry(
            alice,
            NewEntry::new(EntryKind::Expense, Money::MAX).on(day(2024, 2, 11)),
        )
        .await
        .unwrap();

    let twice = Money::MAX.checked_add(Money::MAX).unwrap();
    let summary = engine.financial_summary(alice).await.unwrap();
    assert_eq!(summary.total_income, twice);
    assert_eq!(summary.balance, Money::MAX);

    let months = engine.monthly_summary(alice, 2024).await.unwrap();
    let income = Money::try_sum(months.iter().map(|row| row.income)).unwrap();
    let expense = Money::try_sum(months.iter().map(|row| row.expense)).unwrap();
    assert_eq!(income, summary.total_income);
    assert_eq!(expense, summary.total_expense);
}

#[tokio::test]
async fn assistant_tools_drive_the_ledger() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    let today = day(2024, 8, 20);

    let call = ToolCall::from_parts(
        "create_transactions",
        Some(json!({
            "items": [
                {"type": "expense", "amount": 12.5, "category_name": "Coffee", "emoji": "☕"},
                {"type": "income", "amount": 100, "category_name": "Gift", "date": "2024-08-01"},
            ]
        })),
    )
    .unwrap();
    let ToolOutput::Created { entries } = engine.run_tool(alice, call, today).await.unwrap()
    else {
        panic!("expected created entries");
    };
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].amount, Money::new(1250));
    assert_eq!(entries[0].occurred_on, today);
    assert_eq!(entries[0].icon.as_deref(), Some("☕"));
    assert_eq!(entries[1].occurred_on, day(2024, 8, 1));

    let balance = ToolCall::from_parts("get_balance", None).unwrap();
    let ToolOutput::Balance(summary) = engine.run_tool(alice, balance, today).await.unwrap() else {
        panic!("expected balance");
    };
    assert_eq!(summary.balance, Money::new(8750));

    let spending = ToolCall::from_parts(
        "analyze_spending",
        Some(json!({"start_date": "2024-08-01", "end_date": "2024-08-31"})),
    )
    .unwrap();
    let ToolOutput::Spending { total, breakdown, .. } =
        engine.run_tool(alice, spending, today).await.unwrap()
    else {
        panic!("expected spending");
    };
    assert_eq!(total, Money::new(1250));
    assert_eq!(breakdown[0].category_name, "Coffee");

    let budget = ToolCall::from_parts("set_budget", Some(json!({"amount": 300}))).unwrap();
    let ToolOutput::BudgetSet { monthly_budget, .. } =
        engine.run_tool(alice, budget, today).await.unwrap()
    else {
        panic!("expected budget");
    };
    assert_eq!(monthly_budget, Money::from_major(300));

    let history = ToolCall::from_parts("get_history", Some(json!(null))).unwrap();
    assert_eq!(history, ToolCall::GetHistory { limit: None });
    let ToolOutput::History { entries } = engine.run_tool(alice, history, today).await.unwrap()
    else {
        panic!("expected history");
    };
    assert!(entries.len() <= DEFAULT_HISTORY_LIMIT as usize);
    assert_eq!(entries.len(), 2);

    let ToolOutput::Deleted { entry } = engine
        .run_tool(alice, ToolCall::DeleteLast {}, today)
        .await
        .unwrap()
    else {
        panic!("expected deletion");
    };
    assert_eq!(entry.unwrap().category_name.as_deref(), Some("Gift"));
    assert_eq!(engine.list_entries(alice, None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_tool_calls_are_rejected() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;

    assert!(matches!(
        ToolCall::from_parts("launch_rocket", None),
        Err(EngineError::InvalidName(_))
    ));
    assert!(matches!(
        ToolCall::from_parts("create_transaction", Some(json!({"amount": 5}))),
        Err(EngineError::InvalidName(_))
    ));

    let negative = ToolCall::from_parts(
        "create_transaction",
        Some(json!({"type": "expense", "amount": -5, "category_name": "Food"})),
    )
    .unwrap();
    assert!(matches!(
        engine.run_tool(alice, negative, day(2024, 1, 1)).await,
        Err(EngineError::InvalidAmount(_))
    ));

    let empty = ToolCall::from_parts("create_transactions", Some(json!({"items": []}))).unwrap();
    assert!(engine.run_tool(alice, empty, day(2024, 1, 1)).await.is_err());
    assert!(engine.list_entries(alice, None).await.unwrap().is_empty());
}
