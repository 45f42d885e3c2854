//! Conversions between engine values and their transport shapes.

use api_types::{
    AmountInput, Currency as ApiCurrency, Kind,
    category::CategoryView,
    entry::{CategoryTotalView, DailyTotalView, EntryView},
    summary::Kpis,
    user::UserView,
};
use engine::{
    Category, CategoryTotal, Currency, DailyTotal, EngineError, Entry, EntryKind,
    FinancialSummary, Money, User,
};

pub(crate) fn kind_from_api(kind: Kind) -> EntryKind {
    match kind {
        Kind::Income => EntryKind::Income,
        Kind::Expense => EntryKind::Expense,
    }
}

pub(crate) fn kind_to_api(kind: EntryKind) -> Kind {
    match kind {
        EntryKind::Income => Kind::Income,
        EntryKind::Expense => Kind::Expense,
    }
}

pub(crate) fn currency_from_api(currency: ApiCurrency) -> Currency {
    match currency {
        ApiCurrency::Usd => Currency::Usd,
        ApiCurrency::Eur => Currency::Eur,
        ApiCurrency::Vnd => Currency::Vnd,
    }
}

pub(crate) fn currency_to_api(currency: Currency) -> ApiCurrency {
    match currency {
        Currency::Usd => ApiCurrency::Usd,
        Currency::Eur => ApiCurrency::Eur,
        Currency::Vnd => ApiCurrency::Vnd,
    }
}

pub(crate) fn parse_amount(input: AmountInput) -> Result<Money, EngineError> {
    match input {
        AmountInput::Number(value) => Money::from_major_f64(value),
        AmountInput::Text(raw) => raw.parse(),
    }
}

pub(crate) fn map_user(user: User) -> UserView {
    UserView {
        id: user.id,
        email: user.email,
        display_name: user.display_name,
        avatar_url: user.avatar_url,
        currency: currency_to_api(user.currency),
        monthly_budget: user.monthly_budget.map(Money::to_f64),
        is_admin: user.is_admin,
        created_at: user.created_at,
    }
}

pub(crate) fn map_category(category: Category) -> CategoryView {
    CategoryView {
        id: category.id,
        is_default: category.owner.is_global(),
        name: category.name,
        kind: kind_to_api(category.kind),
        color: category.color,
        icon: category.icon,
    }
}

pub(crate) fn map_entry(entry: Entry) -> EntryView {
    EntryView {
        id: entry.id,
        kind: kind_to_api(entry.kind),
        amount: entry.amount.to_f64(),
        currency: currency_to_api(entry.currency),
        date: entry.occurred_on,
        category_id: entry.category_id,
        category_name: entry.category_name,
        icon: entry.icon,
        note: entry.note,
        created_at: entry.created_at,
    }
}

pub(crate) fn map_entries(entries: Vec<Entry>) -> Vec<EntryView> {
    entries.into_iter().map(map_entry).collect()
}

pub(crate) fn map_category_totals(rows: Vec<CategoryTotal>) -> Vec<CategoryTotalView> {
    rows.into_iter()
        .map(|row| CategoryTotalView {
            category_name: row.category_name,
            total: row.total.to_f64(),
        })
        .collect()
}

pub(crate) fn map_daily(rows: Vec<DailyTotal>) -> Vec<DailyTotalView> {
    rows.into_iter()
        .map(|row| DailyTotalView {
            date: row.date,
            total: row.total.to_f64(),
        })
        .collect()
}

pub(crate) fn map_kpis(summary: FinancialSummary) -> Kpis {
    Kpis {
        total_income: summary.total_income.to_f64(),
        total_expense: summary.total_expense.to_f64(),
        balance: summary.balance.to_f64(),
    }
}
