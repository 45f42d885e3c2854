//! Category registry: per-user private categories plus global defaults.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, EntryKind};

/// `owner_key` value shared by every global default category.
pub(crate) const GLOBAL_OWNER_KEY: &str = "global";

/// Who a category belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "user_id", rename_all = "snake_case")]
pub enum CategoryOwner {
    User(Uuid),
    GlobalDefault,
}

impl CategoryOwner {
    pub fn is_global(self) -> bool {
        matches!(self, Self::GlobalDefault)
    }

    pub fn user_id(self) -> Option<Uuid> {
        match self {
            Self::User(id) => Some(id),
            Self::GlobalDefault => None,
        }
    }

    /// Non-null discriminator used by the `(owner_key, kind, name_norm)`
    /// unique index; SQL treats NULL owners as distinct otherwise.
    pub(crate) fn key(self) -> String {
        match self {
            Self::User(id) => id.to_string(),
            Self::GlobalDefault => GLOBAL_OWNER_KEY.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub owner: CategoryOwner,
    pub name: String,
    pub kind: EntryKind,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) name_norm: String,
}

/// Input for explicit category creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub kind: EntryKind,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Partial category update. `kind` is accepted so that callers can forward
/// whatever the client sent, but it is never applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub kind: Option<EntryKind>,
}

impl CategoryPatch {
    pub(crate) fn touches_mutable_fields(&self) -> bool {
        self.name.is_some() || self.color.is_some() || self.icon.is_some()
    }
}

/// Result of an update: the stored category and the requested fields that
/// were refused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryUpdate {
    pub category: Category,
    pub rejected: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub owner_key: String,
    pub name: String,
    pub name_norm: String,
    pub kind: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Category> for ActiveModel {
    fn from(category: &Category) -> Self {
        Self {
            id: ActiveValue::Set(category.id),
            owner_id: ActiveValue::Set(category.owner.user_id()),
            owner_key: ActiveValue::Set(category.owner.key()),
            name: ActiveValue::Set(category.name.clone()),
            name_norm: ActiveValue::Set(category.name_norm.clone()),
            kind: ActiveValue::Set(category.kind.as_str().to_string()),
            color: ActiveValue::Set(category.color.clone()),
            icon: ActiveValue::Set(category.icon.clone()),
            created_at: ActiveValue::Set(category.created_at),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let owner = match model.owner_id {
            Some(id) => CategoryOwner::User(id),
            None => CategoryOwner::GlobalDefault,
        };
        Ok(Self {
            id: model.id,
            owner,
            name: model.name,
            kind: EntryKind::try_from(model.kind.as_str())?,
            color: model.color,
            icon: model.icon,
            created_at: model.created_at,
            name_norm: model.name_norm,
        })
    }
}
