//! Personal finance engine.
//!
//! The engine owns the category registry, the income/expense ledger and the
//! reports computed over it. Everything is scoped by user: a record owned by
//! someone else is indistinguishable from a missing one.

pub use assistant::{DEFAULT_HISTORY_LIMIT, ToolCall, ToolEntry, ToolOutput};
pub use categories::{Category, CategoryOwner, CategoryPatch, CategoryUpdate, NewCategory};
pub use currency::Currency;
pub use entries::{Entry, EntryKind, EntryPatch, NewEntry};
pub use error::EngineError;
pub use money::Money;
pub use ops::{DEFAULT_CATEGORY_CATALOG, DefaultCategory, Engine, EngineBuilder};
pub use reports::{
    AnalyticsFilter, AnalyticsSummary, BudgetStatus, CategoryShare, CategoryTotal, DailyTotal,
    Dashboard, FinancialSummary, GlobalKpis, MonthlyTotals, PeriodSummary, Trends, UserGrowth,
};
pub use users::{Identity, User, UserSettingsPatch};

mod assistant;
mod categories;
mod currency;
mod entries;
mod error;
mod money;
mod ops;
mod reports;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
