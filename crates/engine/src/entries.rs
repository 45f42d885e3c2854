//! Ledger entries.
//!
//! Income and expense records share one table and one shape; `EntryKind`
//! tells them apart. Every kind-specific operation is the same operation
//! filtered by kind.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Category, Currency, EngineError, Money, util::model_currency};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl core::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidKind(format!(
                "invalid entry kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: EntryKind,
    pub category_id: Option<Uuid>,
    /// Name of the category when the entry was recorded (or last re-categorised).
    pub category_name: Option<String>,
    pub amount: Money,
    pub currency: Currency,
    pub occurred_on: NaiveDate,
    pub icon: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Resolved category, attached on reads when it still exists.
    pub category: Option<Category>,
}

/// Input for entry creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewEntry {
    pub kind: EntryKind,
    pub amount: Money,
    /// Defaults to today (UTC).
    pub occurred_on: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    /// Defaults to the owner's currency.
    pub currency: Option<Currency>,
    pub icon: Option<String>,
    pub note: Option<String>,
}

impl NewEntry {
    pub fn new(kind: EntryKind, amount: Money) -> Self {
        Self {
            kind,
            amount,
            occurred_on: None,
            category_id: None,
            category_name: None,
            currency: None,
            icon: None,
            note: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.occurred_on = Some(date);
        self
    }

    pub fn category(mut self, name: impl Into<String>) -> Self {
        self.category_name = Some(name.into());
        self
    }

    pub fn category_id(mut self, id: Uuid) -> Self {
        self.category_id = Some(id);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Partial entry update. Only supplied fields are written; an empty
/// `note`/`icon` clears the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub amount: Option<Money>,
    pub occurred_on: Option<NaiveDate>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub currency: Option<Currency>,
    pub icon: Option<String>,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub occurred_on: Date,
    pub icon: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Entry> for ActiveModel {
    fn from(entry: &Entry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id),
            user_id: ActiveValue::Set(entry.user_id),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            category_id: ActiveValue::Set(entry.category_id),
            category_name: ActiveValue::Set(entry.category_name.clone()),
            amount_minor: ActiveValue::Set(entry.amount.minor()),
            currency: ActiveValue::Set(entry.currency.code().to_string()),
            occurred_on: ActiveValue::Set(entry.occurred_on),
            icon: ActiveValue::Set(entry.icon.clone()),
            note: ActiveValue::Set(entry.note.clone()),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<(Model, Option<super::categories::Model>)> for Entry {
    type Error = EngineError;

    fn try_from(
        (model, category): (Model, Option<super::categories::Model>),
    ) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            kind: EntryKind::try_from(model.kind.as_str())?,
            category_id: model.category_id,
            category_name: model.category_name,
            amount: Money::new(model.amount_minor),
            currency: model_currency(&model.currency)?,
            occurred_on: model.occurred_on,
            icon: model.icon,
            note: model.note,
            created_at: model.created_at,
            category: category.map(Category::try_from).transpose()?,
        })
    }
}

impl TryFrom<Model> for Entry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Self::try_from((model, None))
    }
}
