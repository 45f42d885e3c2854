use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Vnd,
}

/// Which side of the ledger an entry or category belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Income,
    Expense,
}

/// A monetary amount as sent by clients.
///
/// Numbers are taken as major units (`12.5`); strings are parsed as decimals and
/// accept `,` as separator (`"12,50"`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub email: Option<String>,
        pub display_name: Option<String>,
        pub avatar_url: Option<String>,
        pub currency: Currency,
        pub monthly_budget: Option<f64>,
        pub is_admin: bool,
        pub created_at: DateTime<Utc>,
    }

    /// Partial update of the caller's settings. Absent fields are left untouched;
    /// `monthly_budget: null` clears the budget.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserSettingsUpdate {
        pub display_name: Option<String>,
        pub avatar_url: Option<String>,
        pub currency: Option<Currency>,
        #[serde(default, with = "double_option")]
        pub monthly_budget: Option<Option<AmountInput>>,
    }

    mod double_option {
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<T: Serialize, S: Serializer>(
            value: &Option<Option<T>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(inner) => inner.serialize(serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, T: Deserialize<'de>, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Option<T>>, D::Error> {
            Option::<T>::deserialize(deserializer).map(Some)
        }
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub kind: Kind,
        pub color: Option<String>,
        pub icon: Option<String>,
        /// `true` for the global defaults shared by every user.
        pub is_default: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryQuery {
        pub kind: Option<Kind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryCreate {
        pub name: String,
        pub kind: Kind,
        pub color: Option<String>,
        pub icon: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        pub color: Option<String>,
        pub icon: Option<String>,
        /// Accepted for compatibility but never applied.
        pub kind: Option<Kind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryUpdated {
        pub category: CategoryView,
        /// Fields present in the request that were ignored.
        pub rejected: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SeedResult {
        pub inserted: usize,
    }
}

pub mod entry {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryView {
        pub id: Uuid,
        pub kind: Kind,
        pub amount: f64,
        pub currency: Currency,
        pub date: NaiveDate,
        pub category_id: Option<Uuid>,
        pub category_name: Option<String>,
        pub icon: Option<String>,
        pub note: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    /// New income or expense; the kind comes from the route.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryCreate {
        pub amount: AmountInput,
        pub date: Option<NaiveDate>,
        pub category_id: Option<Uuid>,
        pub category_name: Option<String>,
        pub currency: Option<Currency>,
        pub icon: Option<String>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryBatch {
        pub items: Vec<EntryCreate>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EntryUpdate {
        pub amount: Option<AmountInput>,
        pub date: Option<NaiveDate>,
        pub category_id: Option<Uuid>,
        /// An empty string removes the category.
        pub category_name: Option<String>,
        pub currency: Option<Currency>,
        pub icon: Option<String>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryListResponse {
        pub entries: Vec<EntryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryTotalView {
        pub category_name: String,
        pub total: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DailyTotalView {
        pub date: NaiveDate,
        pub total: f64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TrendQuery {
        pub days: Option<u32>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecentQuery {
        pub limit: Option<u64>,
    }
}

pub mod summary {
    use super::*;
    use crate::entry::{DailyTotalView, EntryView};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Kpis {
        pub total_income: f64,
        pub total_expense: f64,
        pub balance: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PeriodQuery {
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PeriodSummaryView {
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        pub total_income: f64,
        pub total_expense: f64,
        pub net_balance: f64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MonthlyQuery {
        pub year: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyRow {
        pub month: String,
        pub income: f64,
        pub expense: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BreakdownQuery {
        pub kind: Kind,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DashboardView {
        pub summary: Kpis,
        pub recent_transactions: Vec<EntryView>,
        pub income_chart: Vec<DailyTotalView>,
        pub expense_chart: Vec<DailyTotalView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TrendsQuery {
        pub points: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TrendsView {
        pub income_trend: Vec<DailyTotalView>,
        pub expense_trend: Vec<DailyTotalView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AnalyticsRequest {
        #[serde(rename = "type")]
        pub kind: Option<Kind>,
        pub start_date: Option<NaiveDate>,
        pub end_date: Option<NaiveDate>,
        pub category_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryShareView {
        pub category_name: String,
        #[serde(rename = "type")]
        pub kind: Kind,
        pub total: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AnalyticsView {
        pub totals: Kpis,
        pub category_distribution: Vec<CategoryShareView>,
        pub entries: Vec<EntryView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BudgetQuery {
        pub year: Option<i32>,
        pub month: Option<u32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub month: String,
        pub budget: Option<f64>,
        pub spent: f64,
        pub remaining: Option<f64>,
        pub over_budget: bool,
    }
}

pub mod assistant {
    use super::*;

    /// One tool call as emitted by the assistant model.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ToolRequest {
        pub name: String,
        #[serde(default)]
        pub arguments: Option<serde_json::Value>,
    }
}

pub mod admin {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GlobalKpisView {
        pub total_users: u64,
        pub total_income: f64,
        pub total_expense: f64,
        pub net_balance: f64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GrowthQuery {
        pub days: Option<u32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GrowthPoint {
        pub date: NaiveDate,
        pub count: u64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserListQuery {
        pub offset: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserListResponse {
        pub users: Vec<crate::user::UserView>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_accepts_numbers_and_strings() {
        let number: AmountInput = serde_json::from_str("12.5").unwrap();
        assert_eq!(number, AmountInput::Number(12.5));
        let text: AmountInput = serde_json::from_str("\"12,50\"").unwrap();
        assert_eq!(text, AmountInput::Text("12,50".to_string()));
    }

    #[test]
    fn budget_null_differs_from_absent() {
        let absent: user::UserSettingsUpdate = serde_json::from_str("{}").unwrap();
        assert!(absent.monthly_budget.is_none());
        let cleared: user::UserSettingsUpdate =
            serde_json::from_str(r#"{"monthly_budget": null}"#).unwrap();
        assert_eq!(cleared.monthly_budget, Some(None));
        let set: user::UserSettingsUpdate =
            serde_json::from_str(r#"{"monthly_budget": 300}"#).unwrap();
        assert_eq!(set.monthly_budget, Some(Some(AmountInput::Number(300.0))));
    }
}
