//! Aggregation endpoints: KPIs, period and monthly summaries, dashboard,
//! trends, analytics and budget.

use api_types::{
    entry::CategoryTotalView,
    summary::{
        AnalyticsRequest, AnalyticsView, BreakdownQuery, BudgetQuery, BudgetView,
        CategoryShareView, DashboardView, Kpis, MonthlyQuery, MonthlyRow, PeriodQuery,
        PeriodSummaryView, TrendsQuery, TrendsView,
    },
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::{Datelike, Utc};
use engine::{AnalyticsFilter, User};

use crate::{
    ServerError,
    convert::{
        kind_from_api, kind_to_api, map_category_totals, map_daily, map_entries, map_kpis,
    },
    server::ServerState,
};

const DEFAULT_TREND_POINTS: u64 = 60;

pub async fn kpis(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<Kpis>, ServerError> {
    let summary = state.engine.financial_summary(user.id).await?;
    Ok(Json(map_kpis(summary)))
}

pub async fn period(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PeriodSummaryView>, ServerError> {
    let summary = state
        .engine
        .period_summary(user.id, query.start_date, query.end_date)
        .await?;
    Ok(Json(PeriodSummaryView {
        start_date: summary.start_date,
        end_date: summary.end_date,
        total_income: summary.total_income.to_f64(),
        total_expense: summary.total_expense.to_f64(),
        net_balance: summary.net_balance.to_f64(),
    }))
}

/// Monthly totals of `year`, the current year when omitted.
pub async fn monthly(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<Vec<MonthlyRow>>, ServerError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let rows = state
        .engine
        .monthly_summary(user.id, year)
        .await?
        .into_iter()
        .map(|row| MonthlyRow {
            month: row.month,
            income: row.income.to_f64(),
            expense: row.expense.to_f64(),
        })
        .collect();
    Ok(Json(rows))
}

pub async fn breakdown(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<BreakdownQuery>,
) -> Result<Json<Vec<CategoryTotalView>>, ServerError> {
    let kind = kind_from_api(query.kind);
    let rows = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => {
            state
                .engine
                .period_breakdown(user.id, kind, start, end)
                .await?
        }
        (None, None) => state.engine.category_breakdown(user.id, kind).await?,
        _ => {
            return Err(ServerError::Generic(
                "provide both start_date and end_date or neither".to_string(),
            ));
        }
    };
    Ok(Json(map_category_totals(rows)))
}

pub async fn dashboard(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
) -> Result<Json<DashboardView>, ServerError> {
    let dashboard = state.engine.dashboard(user.id).await?;
    Ok(Json(DashboardView {
        summary: map_kpis(dashboard.summary),
        recent_transactions: map_entries(dashboard.recent),
        income_chart: map_daily(dashboard.income_chart),
        expense_chart: map_daily(dashboard.expense_chart),
    }))
}

pub async fn trends(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<TrendsQuery>,
) -> Result<Json<TrendsView>, ServerError> {
    let points = query.points.unwrap_or(DEFAULT_TREND_POINTS);
    let trends = state.engine.trends(user.id, points).await?;
    Ok(Json(TrendsView {
        income_trend: map_daily(trends.income),
        expense_trend: map_daily(trends.expense),
    }))
}

pub async fn analytics(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<AnalyticsRequest>,
) -> Result<Json<AnalyticsView>, ServerError> {
    let filter = AnalyticsFilter {
        kind: payload.kind.map(kind_from_api),
        start: payload.start_date,
        end: payload.end_date,
        category_id: payload.category_id,
    };
    let summary = state.engine.analytics(user.id, filter).await?;
    Ok(Json(AnalyticsView {
        totals: map_kpis(summary.totals),
        category_distribution: summary
            .distribution
            .into_iter()
            .map(|share| CategoryShareView {
                category_name: share.category_name,
                kind: kind_to_api(share.kind),
                total: share.total.to_f64(),
            })
            .collect(),
        entries: map_entries(summary.entries),
    }))
}

/// Budget status of the given month, the current one when omitted.
pub async fn budget(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<BudgetQuery>,
) -> Result<Json<BudgetView>, ServerError> {
    let status = match (query.year, query.month) {
        (Some(year), Some(month)) => state.engine.budget_status(user.id, year, month).await?,
        (None, None) => state.engine.current_budget_status(user.id).await?,
        _ => {
            return Err(ServerError::Generic(
                "provide both year and month or neither".to_string(),
            ));
        }
    };
    Ok(Json(BudgetView {
        month: status.month,
        budget: status.budget.map(|budget| budget.to_f64()),
        spent: status.spent.to_f64(),
        remaining: status.remaining.map(|remaining| remaining.to_f64()),
        over_budget: status.over_budget,
    }))
}
