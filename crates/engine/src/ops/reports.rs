use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait, Value,
    prelude::*,
};
use uuid::Uuid;

use crate::{
    AnalyticsFilter, AnalyticsSummary, BudgetStatus, CategoryShare, CategoryTotal, DailyTotal,
    Dashboard, EngineError, Entry, EntryKind, FinancialSummary, GlobalKpis, Money, MonthlyTotals,
    PeriodSummary, ResultEngine, Trends, User, categories, entries,
    money::total_out_of_range,
    util::{ensure_range, month_bounds, month_label, year_bounds},
};

use super::{Engine, query_all, query_sum, with_tx};

/// Label used for entries recorded without any category name.
pub(crate) const UNCATEGORIZED_NAME: &str = "Uncategorized";

pub(super) const DASHBOARD_RECENT_LIMIT: u64 = 10;
pub(super) const DASHBOARD_CHART_POINTS: u64 = 30;

/// Which slice of the ledger a query looks at.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct Scope {
    pub(super) user_id: Option<Uuid>,
    pub(super) kind: Option<EntryKind>,
    pub(super) start: Option<NaiveDate>,
    pub(super) end: Option<NaiveDate>,
    pub(super) category_id: Option<Uuid>,
}

impl Scope {
    pub(super) fn user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub(super) fn kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub(super) fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// `WHERE` clause (possibly empty) and its bound values, in order.
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(user_id) = self.user_id {
            conditions.push("user_id = ?");
            values.push(user_id.into());
        }
        if let Some(kind) = self.kind {
            conditions.push("kind = ?");
            values.push(kind.as_str().into());
        }
        if let Some(start) = self.start {
            conditions.push("occurred_on >= ?");
            values.push(start.into());
        }
        if let Some(end) = self.end {
            conditions.push("occurred_on <= ?");
            values.push(end.into());
        }
        if let Some(category_id) = self.category_id {
            conditions.push("category_id = ?");
            values.push(category_id.into());
        }
        if conditions.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), values)
        }
    }

    /// Entity query for the scoped entries, newest first.
    pub(super) fn select(&self) -> Select<entries::Entity> {
        let mut query = entries::Entity::find();
        if let Some(user_id) = self.user_id {
            query = query.filter(entries::Column::UserId.eq(user_id));
        }
        if let Some(kind) = self.kind {
            query = query.filter(entries::Column::Kind.eq(kind.as_str()));
        }
        if let Some(start) = self.start {
            query = query.filter(entries::Column::OccurredOn.gte(start));
        }
        if let Some(end) = self.end {
            query = query.filter(entries::Column::OccurredOn.lte(end));
        }
        if let Some(category_id) = self.category_id {
            query = query.filter(entries::Column::CategoryId.eq(category_id));
        }
        query
            .order_by_desc(entries::Column::OccurredOn)
            .order_by_desc(entries::Column::CreatedAt)
            .order_by_desc(entries::Column::Id)
    }

    pub(super) async fn entries(
        &self,
        db_tx: &DatabaseTransaction,
        limit: Option<u64>,
    ) -> ResultEngine<Vec<Entry>> {
        let mut query = self.select();
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        query
            .find_also_related(categories::Entity)
            .all(db_tx)
            .await?
            .into_iter()
            .map(Entry::try_from)
            .collect()
    }

    pub(super) async fn total(&self, db_tx: &DatabaseTransaction) -> ResultEngine<Money> {
        let (clause, values) = self.where_clause();
        let sql = format!("SELECT COALESCE(SUM(amount_minor), 0) AS total FROM entries {clause}");
        query_sum(db_tx, &sql, values).await.map(Money::new)
    }

    pub(super) async fn summary(&self, db_tx: &DatabaseTransaction) -> ResultEngine<FinancialSummary> {
        let income = self.kind(EntryKind::Income).total(db_tx).await?;
        let expense = self.kind(EntryKind::Expense).total(db_tx).await?;
        FinancialSummary::new(income, expense)
    }

    /// Sums grouped by kind and recorded category name, largest first.
    pub(super) async fn category_shares(
        &self,
        db_tx: &DatabaseTransaction,
    ) -> ResultEngine<Vec<CategoryShare>> {
        let (clause, where_values) = self.where_clause();
        let sql = format!(
            "SELECT kind, COALESCE(category_name, ?) AS label, \
             COALESCE(SUM(amount_minor), 0) AS total \
             FROM entries {clause} \
             GROUP BY kind, label \
             ORDER BY total DESC, label ASC"
        );
        let mut values: Vec<Value> = vec![UNCATEGORIZED_NAME.into()];
        values.extend(where_values);

        query_all(db_tx, &sql, values)
            .await?
            .into_iter()
            .map(|row| -> ResultEngine<CategoryShare> {
                let kind: String = row.try_get("", "kind")?;
                Ok(CategoryShare {
                    kind: EntryKind::try_from(kind.as_str())?,
                    category_name: row.try_get("", "label")?,
                    total: Money::new(row.try_get("", "total")?),
                })
            })
            .collect()
    }

    pub(super) async fn category_totals(
        &self,
        db_tx: &DatabaseTransaction,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        Ok(self
            .category_shares(db_tx)
            .await?
            .into_iter()
            .map(|share| CategoryTotal {
                category_name: share.category_name,
                total: share.total,
            })
            .collect())
    }

    /// Per-date sums ascending. With `latest`, only the most recent
    /// `latest` active dates are kept.
    pub(super) async fn daily_totals(
        &self,
        db_tx: &DatabaseTransaction,
        latest: Option<u64>,
    ) -> ResultEngine<Vec<DailyTotal>> {
        let (clause, mut values) = self.where_clause();
        let limit = match latest {
            Some(points) => {
                values.push(i64::try_from(points).unwrap_or(i64::MAX).into());
                " LIMIT ?"
            }
            None => "",
        };
        let sql = format!(
            "SELECT occurred_on, COALESCE(SUM(amount_minor), 0) AS total \
             FROM entries {clause} \
             GROUP BY occurred_on \
             ORDER BY occurred_on DESC{limit}"
        );

        let mut totals = query_all(db_tx, &sql, values)
            .await?
            .into_iter()
            .map(|row| -> ResultEngine<DailyTotal> {
                Ok(DailyTotal {
                    date: row.try_get("", "occurred_on")?,
                    total: Money::new(row.try_get("", "total")?),
                })
            })
            .collect::<ResultEngine<Vec<_>>>()?;
        totals.reverse();
        Ok(totals)
    }
}

impl Engine {
    /// Lifetime totals; zeroes for an empty ledger.
    pub async fn financial_summary(&self, user_id: Uuid) -> ResultEngine<FinancialSummary> {
        with_tx!(self, |db_tx| Scope::user(user_id).summary(&db_tx).await)
    }

    /// Same as [`Engine::summary_by_category`].
    pub async fn category_breakdown(
        &self,
        user_id: Uuid,
        kind: EntryKind,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        self.summary_by_category(user_id, kind).await
    }

    /// Totals between `start` and `end`, both inclusive.
    pub async fn period_summary(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ResultEngine<PeriodSummary> {
        ensure_range(start, end)?;
        with_tx!(self, |db_tx| {
            let summary = Scope::user(user_id).between(start, end).summary(&db_tx).await?;
            Ok::<_, EngineError>(PeriodSummary {
                start_date: start,
                end_date: end,
                total_income: summary.total_income,
                total_expense: summary.total_expense,
                net_balance: summary.balance,
            })
        })
    }

    /// Category totals of one kind restricted to an inclusive date range.
    pub async fn period_breakdown(
        &self,
        user_id: Uuid,
        kind: EntryKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        ensure_range(start, end)?;
        with_tx!(self, |db_tx| {
            Scope::user(user_id)
                .kind(kind)
                .between(start, end)
                .category_totals(&db_tx)
                .await
        })
    }

    /// Home screen payload: totals, the ten latest entries of either kind and
    /// the last 30 active days of each kind.
    pub async fn dashboard(&self, user_id: Uuid) -> ResultEngine<Dashboard> {
        with_tx!(self, |db_tx| {
            let scope = Scope::user(user_id);
            let summary = scope.summary(&db_tx).await?;
            let recent = scope.entries(&db_tx, Some(DASHBOARD_RECENT_LIMIT)).await?;
            let income_chart = scope
                .kind(EntryKind::Income)
                .daily_totals(&db_tx, Some(DASHBOARD_CHART_POINTS))
                .await?;
            let expense_chart = scope
                .kind(EntryKind::Expense)
                .daily_totals(&db_tx, Some(DASHBOARD_CHART_POINTS))
                .await?;
            Ok::<_, EngineError>(Dashboard {
                summary,
                recent,
                income_chart,
                expense_chart,
            })
        })
    }

    /// Income and expense per month of `year`; months without entries are omitted.
    pub async fn monthly_summary(&self, user_id: Uuid, year: i32) -> ResultEngine<Vec<MonthlyTotals>> {
        let (start, end) = year_bounds(year)?;
        with_tx!(self, |db_tx| {
            let scope = Scope::user(user_id).between(start, end);
            let mut months: BTreeMap<String, MonthlyTotals> = BTreeMap::new();
            for kind in [EntryKind::Income, EntryKind::Expense] {
                for day in scope.kind(kind).daily_totals(&db_tx, None).await? {
                    let month = month_label(day.date);
                    let row = months.entry(month.clone()).or_insert(MonthlyTotals {
                        month,
                        income: Money::ZERO,
                        expense: Money::ZERO,
                    });
                    let slot = match kind {
                        EntryKind::Income => &mut row.income,
                        EntryKind::Expense => &mut row.expense,
                    };
                    *slot = slot.checked_add(day.total).ok_or_else(total_out_of_range)?;
                }
            }
            Ok::<_, EngineError>(months.into_values().collect())
        })
    }

    /// Per-date totals of each kind over the latest `points` active days.
    pub async fn trends(&self, user_id: Uuid, points: u64) -> ResultEngine<Trends> {
        if points == 0 {
            return Err(EngineError::InvalidRange("points must be > 0".to_string()));
        }
        with_tx!(self, |db_tx| {
            let scope = Scope::user(user_id);
            Ok::<_, EngineError>(Trends {
                income: scope
                    .kind(EntryKind::Income)
                    .daily_totals(&db_tx, Some(points))
                    .await?,
                expense: scope
                    .kind(EntryKind::Expense)
                    .daily_totals(&db_tx, Some(points))
                    .await?,
            })
        })
    }

    /// Totals, category distribution and matching entries for an optional
    /// kind / date range / category filter.
    pub async fn analytics(
        &self,
        user_id: Uuid,
        filter: AnalyticsFilter,
    ) -> ResultEngine<AnalyticsSummary> {
        if let (Some(start), Some(end)) = (filter.start, filter.end) {
            ensure_range(start, end)?;
        }
        let scope = Scope {
            user_id: Some(user_id),
            kind: filter.kind,
            start: filter.start,
            end: filter.end,
            category_id: filter.category_id,
        };

        with_tx!(self, |db_tx| {
            let totals = match filter.kind {
                Some(EntryKind::Income) => {
                    FinancialSummary::new(scope.total(&db_tx).await?, Money::ZERO)?
                }
                Some(EntryKind::Expense) => {
                    FinancialSummary::new(Money::ZERO, scope.total(&db_tx).await?)?
                }
                None => scope.summary(&db_tx).await?,
            };
            Ok::<_, EngineError>(AnalyticsSummary {
                totals,
                distribution: scope.category_shares(&db_tx).await?,
                entries: scope.entries(&db_tx, None).await?,
            })
        })
    }

    /// Expense of a calendar month against the user's monthly budget.
    pub async fn budget_status(
        &self,
        user_id: Uuid,
        year: i32,
        month: u32,
    ) -> ResultEngine<BudgetStatus> {
        let (start, end) = month_bounds(year, month)?;
        with_tx!(self, |db_tx| {
            let user = User::try_from(Self::require_user(&db_tx, user_id).await?)?;
            let spent = Scope::user(user_id)
                .kind(EntryKind::Expense)
                .between(start, end)
                .total(&db_tx)
                .await?;
            let remaining = user
                .monthly_budget
                .map(|budget| budget.checked_sub(spent).ok_or_else(total_out_of_range))
                .transpose()?;
            Ok::<_, EngineError>(BudgetStatus {
                month: month_label(start),
                budget: user.monthly_budget,
                spent,
                remaining,
                over_budget: remaining.is_some_and(Money::is_negative),
            })
        })
    }

    /// Budget status of the current UTC month.
    pub async fn current_budget_status(&self, user_id: Uuid) -> ResultEngine<BudgetStatus> {
        let today = Utc::now().date_naive();
        self.budget_status(user_id, today.year(), today.month()).await
    }

    /// Platform-wide totals for administrators.
    pub async fn global_kpis(&self) -> ResultEngine<GlobalKpis> {
        with_tx!(self, |db_tx| {
            let summary = Scope::default().summary(&db_tx).await?;
            Ok::<_, EngineError>(GlobalKpis {
                total_users: Self::count_users(&db_tx).await?,
                total_income: summary.total_income,
                total_expense: summary.total_expense,
                net_balance: summary.balance,
            })
        })
    }
}
