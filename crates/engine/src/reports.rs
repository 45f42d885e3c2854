//! Read-only report shapes produced by the aggregation queries.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{Entry, EntryKind, Money, ResultEngine, money::total_out_of_range};

/// Lifetime totals of one user. `balance` is always `total_income - total_expense`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FinancialSummary {
    pub total_income: Money,
    pub total_expense: Money,
    pub balance: Money,
}

impl FinancialSummary {
    pub(crate) fn new(total_income: Money, total_expense: Money) -> ResultEngine<Self> {
        let balance = total_income
            .checked_sub(total_expense)
            .ok_or_else(total_out_of_range)?;
        Ok(Self {
            total_income,
            total_expense,
            balance,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category_name: String,
    pub total: Money,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: Money,
}

/// Totals over an inclusive date range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PeriodSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_income: Money,
    pub total_expense: Money,
    pub net_balance: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub summary: FinancialSummary,
    /// Merged ledger, newest first, at most `DASHBOARD_RECENT_LIMIT` rows.
    pub recent: Vec<Entry>,
    pub income_chart: Vec<DailyTotal>,
    pub expense_chart: Vec<DailyTotal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MonthlyTotals {
    /// `YYYY-MM`
    pub month: String,
    pub income: Money,
    pub expense: Money,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Trends {
    pub income: Vec<DailyTotal>,
    pub expense: Vec<DailyTotal>,
}

/// Filters for [`Engine::analytics`](crate::Engine::analytics). Every field is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalyticsFilter {
    pub kind: Option<EntryKind>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    pub category_name: String,
    pub kind: EntryKind,
    pub total: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    pub totals: FinancialSummary,
    pub distribution: Vec<CategoryShare>,
    pub entries: Vec<Entry>,
}

/// Spending of one calendar month against the user's monthly budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub month: String,
    pub budget: Option<Money>,
    pub spent: Money,
    pub remaining: Option<Money>,
    pub over_budget: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GlobalKpis {
    pub total_users: u64,
    pub total_income: Money,
    pub total_expense: Money,
    pub net_balance: Money,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UserGrowth {
    pub date: NaiveDate,
    pub count: u64,
}
