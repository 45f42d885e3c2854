//! Users and the identity claims they are synced from.
//!
//! A user row is created (or refreshed) from the claims an external identity
//! provider vouches for; `external_id` is the provider's stable subject.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, Money, util::model_currency};

/// Claims handed over by the identity provider once a token is verified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub external_id: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub currency: Currency,
    pub monthly_budget: Option<Money>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields a user may change on their own profile. `None` leaves a field alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserSettingsPatch {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub currency: Option<Currency>,
    /// `Some(None)` clears the budget.
    pub monthly_budget: Option<Option<Money>>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub external_id: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub currency: String,
    pub monthly_budget_minor: Option<i64>,
    pub is_admin: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::categories::Entity")]
    Categories,
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        Self {
            id: ActiveValue::Set(user.id),
            external_id: ActiveValue::Set(user.external_id.clone()),
            email: ActiveValue::Set(user.email.clone()),
            display_name: ActiveValue::Set(user.display_name.clone()),
            avatar_url: ActiveValue::Set(user.avatar_url.clone()),
            currency: ActiveValue::Set(user.currency.code().to_string()),
            monthly_budget_minor: ActiveValue::Set(user.monthly_budget.map(Money::minor)),
            is_admin: ActiveValue::Set(user.is_admin),
            created_at: ActiveValue::Set(user.created_at),
        }
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            external_id: model.external_id,
            email: model.email,
            display_name: model.display_name,
            avatar_url: model.avatar_url,
            currency: model_currency(&model.currency)?,
            monthly_budget: model.monthly_budget_minor.map(Money::new),
            is_admin: model.is_admin,
            created_at: model.created_at,
        })
    }
}
