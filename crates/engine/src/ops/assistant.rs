use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    EngineError, EntryKind, Money, NewEntry, ResultEngine, ToolCall, ToolEntry, ToolOutput,
    UserSettingsPatch,
    assistant::{DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT},
};

use super::Engine;

impl Engine {
    /// Execute one assistant tool call on behalf of `user_id`.
    ///
    /// `today` is the date given to transactions the assistant did not date.
    pub async fn run_tool(
        &self,
        user_id: Uuid,
        call: ToolCall,
        today: NaiveDate,
    ) -> ResultEngine<ToolOutput> {
        tracing::debug!(%user_id, tool = call.name(), "running assistant tool");
        match call {
            ToolCall::CreateTransaction(item) => {
                let entry = self.create_entry(user_id, tool_entry(item, today)?).await?;
                Ok(ToolOutput::Created {
                    entries: vec![entry],
                })
            }
            ToolCall::CreateTransactions { items } => {
                if items.is_empty() {
                    return Err(EngineError::InvalidAmount(
                        "create_transactions needs at least one item".to_string(),
                    ));
                }
                let batch = items
                    .into_iter()
                    .map(|item| tool_entry(item, today))
                    .collect::<ResultEngine<Vec<_>>>()?;
                Ok(ToolOutput::Created {
                    entries: self.create_entries(user_id, batch).await?,
                })
            }
            ToolCall::SetBudget { amount } => {
                let budget = Money::from_major_f64(amount)?;
                let user = self
                    .update_user_settings(
                        user_id,
                        UserSettingsPatch {
                            monthly_budget: Some(Some(budget)),
                            ..UserSettingsPatch::default()
                        },
                    )
                    .await?;
                Ok(ToolOutput::BudgetSet {
                    monthly_budget: budget,
                    currency: user.currency,
                })
            }
            ToolCall::GetBalance {} => Ok(ToolOutput::Balance(
                self.financial_summary(user_id).await?,
            )),
            ToolCall::GetStatistics {
                start_date,
                end_date,
            } => Ok(ToolOutput::Statistics(
                self.period_summary(user_id, start_date, end_date).await?,
            )),
            ToolCall::AnalyzeSpending {
                start_date,
                end_date,
            } => {
                let breakdown = self
                    .period_breakdown(user_id, EntryKind::Expense, start_date, end_date)
                    .await?;
                Ok(ToolOutput::Spending {
                    start_date,
                    end_date,
                    total: Money::try_sum(breakdown.iter().map(|row| row.total))?,
                    breakdown,
                })
            }
            ToolCall::GetHistory { limit } => {
                let limit = limit
                    .unwrap_or(DEFAULT_HISTORY_LIMIT)
                    .clamp(1, MAX_HISTORY_LIMIT);
                Ok(ToolOutput::History {
                    entries: self.recent_entries(user_id, limit).await?,
                })
            }
            ToolCall::DeleteLast {} => Ok(ToolOutput::Deleted {
                entry: self.delete_last_entry(user_id).await?,
            }),
        }
    }
}

fn tool_entry(item: ToolEntry, today: NaiveDate) -> ResultEngine<NewEntry> {
    Ok(NewEntry {
        kind: item.kind,
        amount: Money::from_major_f64(item.amount)?,
        occurred_on: Some(item.date.unwrap_or(today)),
        category_id: None,
        category_name: Some(item.category_name),
        currency: None,
        icon: item.emoji,
        note: item.note,
    })
}
