//! Tool calls an assistant can issue against the ledger.
//!
//! A call arrives as `{"name": "...", "arguments": {...}}` and maps onto
//! exactly one engine operation. Calls are not idempotent: repeating
//! `create_transaction` records the entry twice, and `delete_last` is the only
//! way back.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    CategoryTotal, Currency, EngineError, Entry, EntryKind, FinancialSummary, Money,
    PeriodSummary, ResultEngine,
};

/// Entries returned by `get_history` when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: u64 = 5;
pub(crate) const MAX_HISTORY_LIMIT: u64 = 50;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    CreateTransaction(ToolEntry),
    CreateTransactions {
        items: Vec<ToolEntry>,
    },
    SetBudget {
        amount: f64,
    },
    GetBalance {},
    GetStatistics {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    AnalyzeSpending {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    GetHistory {
        #[serde(default)]
        limit: Option<u64>,
    },
    DeleteLast {},
}

/// One transaction as described by the assistant.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ToolEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub amount: f64,
    pub category_name: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl ToolCall {
    /// Build a call from a tool name and its raw JSON arguments. Missing or
    /// `null` arguments are treated as an empty object.
    pub fn from_parts(name: &str, arguments: Option<serde_json::Value>) -> ResultEngine<Self> {
        let arguments = match arguments {
            None | Some(serde_json::Value::Null) => serde_json::Value::Object(Default::default()),
            Some(value) => value,
        };
        serde_json::from_value(serde_json::json!({ "name": name, "arguments": arguments }))
            .map_err(|err| EngineError::InvalidName(format!("invalid tool call {name}: {err}")))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateTransaction(_) => "create_transaction",
            Self::CreateTransactions { .. } => "create_transactions",
            Self::SetBudget { .. } => "set_budget",
            Self::GetBalance {} => "get_balance",
            Self::GetStatistics { .. } => "get_statistics",
            Self::AnalyzeSpending { .. } => "analyze_spending",
            Self::GetHistory { .. } => "get_history",
            Self::DeleteLast {} => "delete_last",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolOutput {
    Created {
        entries: Vec<Entry>,
    },
    BudgetSet {
        monthly_budget: Money,
        currency: Currency,
    },
    Balance(FinancialSummary),
    Statistics(PeriodSummary),
    /// Expense breakdown ready to be drawn as a pie chart.
    Spending {
        start_date: NaiveDate,
        end_date: NaiveDate,
        total: Money,
        breakdown: Vec<CategoryTotal>,
    },
    History {
        entries: Vec<Entry>,
    },
    Deleted {
        entry: Option<Entry>,
    },
}
