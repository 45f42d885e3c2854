use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Category, CategoryTotal, DailyTotal, EngineError, Entry, EntryKind, EntryPatch, NewEntry,
    ResultEngine, User, categories, entries,
    util::{ensure_amount, normalize_optional_text},
};

use super::{
    Engine,
    reports::{Scope, UNCATEGORIZED_NAME},
    with_tx,
};

impl Engine {
    /// Record an income or expense.
    ///
    /// - `category_id` must point at a category visible to the user and of
    ///   the same kind.
    /// - otherwise a `category_name` is resolved through the registry,
    ///   creating a private category on first use.
    /// - date defaults to today (UTC), currency to the user's.
    pub async fn create_entry(&self, user_id: Uuid, new: NewEntry) -> ResultEngine<Entry> {
        with_tx!(self, |db_tx| {
            let user = User::try_from(Self::require_user(&db_tx, user_id).await?)?;
            Self::insert_entry(&db_tx, &user, new).await
        })
    }

    /// Record several entries at once; nothing is stored if any of them fails.
    pub async fn create_entries(
        &self,
        user_id: Uuid,
        batch: Vec<NewEntry>,
    ) -> ResultEngine<Vec<Entry>> {
        with_tx!(self, |db_tx| {
            let user = User::try_from(Self::require_user(&db_tx, user_id).await?)?;
            let mut created = Vec::with_capacity(batch.len());
            for new in batch {
                created.push(Self::insert_entry(&db_tx, &user, new).await?);
            }
            Ok::<_, EngineError>(created)
        })
    }

    /// The user's entries, newest date first, optionally restricted to one kind.
    pub async fn list_entries(
        &self,
        user_id: Uuid,
        kind: Option<EntryKind>,
    ) -> ResultEngine<Vec<Entry>> {
        let scope = Scope {
            kind,
            ..Scope::user(user_id)
        };
        with_tx!(self, |db_tx| scope.entries(&db_tx, None).await)
    }

    /// The latest `limit` entries of either kind.
    pub async fn recent_entries(&self, user_id: Uuid, limit: u64) -> ResultEngine<Vec<Entry>> {
        with_tx!(self, |db_tx| {
            Scope::user(user_id).entries(&db_tx, Some(limit)).await
        })
    }

    pub async fn entry(&self, user_id: Uuid, entry_id: Uuid) -> ResultEngine<Entry> {
        with_tx!(self, |db_tx| Self::require_entry(&db_tx, user_id, entry_id).await)
    }

    /// Apply the supplied fields of `patch` to an entry owned by the user.
    pub async fn update_entry(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        patch: EntryPatch,
    ) -> ResultEngine<Entry> {
        if let Some(amount) = patch.amount {
            ensure_amount(amount)?;
        }

        with_tx!(self, |db_tx| {
            let current = Self::require_entry(&db_tx, user_id, entry_id).await?;
            if patch == EntryPatch::default() {
                return Ok(current);
            }

            let mut active: entries::ActiveModel = (&current).into();
            let mut category_icon: Option<String> = None;
            if let Some(category_id) = patch.category_id {
                let category =
                    Self::category_for_entry(&db_tx, user_id, category_id, current.kind).await?;
                active.category_id = ActiveValue::Set(Some(category.id));
                active.category_name = ActiveValue::Set(Some(category.name));
                category_icon = category.icon;
            } else if let Some(name) = patch.category_name.as_deref() {
                if name.trim().is_empty() {
                    active.category_id = ActiveValue::Set(None);
                    active.category_name = ActiveValue::Set(None);
                } else {
                    let category =
                        Self::resolve_category(&db_tx, user_id, name, current.kind).await?;
                    active.category_id = ActiveValue::Set(Some(category.id));
                    active.category_name = ActiveValue::Set(Some(category.name));
                    category_icon = category.icon;
                }
            }
            if let Some(amount) = patch.amount {
                active.amount_minor = ActiveValue::Set(amount.minor());
            }
            if let Some(date) = patch.occurred_on {
                active.occurred_on = ActiveValue::Set(date);
            }
            if let Some(currency) = patch.currency {
                active.currency = ActiveValue::Set(currency.code().to_string());
            }
            match patch.icon.as_deref() {
                Some(icon) => active.icon = ActiveValue::Set(normalize_optional_text(Some(icon))),
                None if category_icon.is_some() => active.icon = ActiveValue::Set(category_icon),
                None => {}
            }
            if let Some(note) = patch.note.as_deref() {
                active.note = ActiveValue::Set(normalize_optional_text(Some(note)));
            }

            active.update(&db_tx).await?;
            Self::require_entry(&db_tx, user_id, entry_id).await
        })
    }

    /// Delete an entry owned by the user and return it.
    pub async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> ResultEngine<Entry> {
        with_tx!(self, |db_tx| {
            let entry = Self::require_entry(&db_tx, user_id, entry_id).await?;
            entries::Entity::delete_by_id(entry.id).exec(&db_tx).await?;
            Ok::<_, EngineError>(entry)
        })
    }

    /// Delete the most recently recorded entry, if any.
    pub async fn delete_last_entry(&self, user_id: Uuid) -> ResultEngine<Option<Entry>> {
        with_tx!(self, |db_tx| {
            let last = entries::Entity::find()
                .filter(entries::Column::UserId.eq(user_id))
                .order_by_desc(entries::Column::CreatedAt)
                .order_by_desc(entries::Column::Id)
                .find_also_related(categories::Entity)
                .one(&db_tx)
                .await?
                .map(Entry::try_from)
                .transpose()?;
            if let Some(entry) = &last {
                entries::Entity::delete_by_id(entry.id).exec(&db_tx).await?;
                tracing::info!(%user_id, entry_id = %entry.id, "last entry deleted");
            }
            Ok::<_, EngineError>(last)
        })
    }

    /// Totals of one kind grouped by recorded category name, largest first.
    /// Entries without a category name are grouped under `Uncategorized`.
    pub async fn summary_by_category(
        &self,
        user_id: Uuid,
        kind: EntryKind,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        with_tx!(self, |db_tx| {
            Scope::user(user_id).kind(kind).category_totals(&db_tx).await
        })
    }

    /// Totals of one kind per date over `[today - window_days + 1, today]`,
    /// ascending. Dates without entries are omitted.
    pub async fn daily_trend(
        &self,
        user_id: Uuid,
        kind: EntryKind,
        window_days: u32,
        today: NaiveDate,
    ) -> ResultEngine<Vec<DailyTotal>> {
        if window_days == 0 {
            return Err(EngineError::InvalidRange(
                "window must cover at least one day".to_string(),
            ));
        }
        let start = today
            .checked_sub_days(chrono::Days::new(u64::from(window_days) - 1))
            .ok_or_else(|| EngineError::InvalidDate("window starts before year 0".to_string()))?;
        with_tx!(self, |db_tx| {
            Scope::user(user_id)
                .kind(kind)
                .between(start, today)
                .daily_totals(&db_tx, None)
                .await
        })
    }

    async fn insert_entry(
        db_tx: &DatabaseTransaction,
        user: &User,
        new: NewEntry,
    ) -> ResultEngine<Entry> {
        ensure_amount(new.amount)?;

        let category = match (new.category_id, new.category_name.as_deref()) {
            (Some(category_id), _) => {
                Some(Self::category_for_entry(db_tx, user.id, category_id, new.kind).await?)
            }
            (None, Some(name)) if !name.trim().is_empty() => {
                Some(Self::resolve_category(db_tx, user.id, name, new.kind).await?)
            }
            _ => None,
        };

        let entry = Entry {
            id: Uuid::new_v4(),
            user_id: user.id,
            kind: new.kind,
            category_id: category.as_ref().map(|c| c.id),
            category_name: category.as_ref().map(|c| c.name.clone()),
            amount: new.amount,
            currency: new.currency.unwrap_or(user.currency),
            occurred_on: new.occurred_on.unwrap_or_else(|| Utc::now().date_naive()),
            icon: normalize_optional_text(new.icon.as_deref())
                .or_else(|| category.as_ref().and_then(|c| c.icon.clone())),
            note: normalize_optional_text(new.note.as_deref()),
            created_at: Utc::now(),
            category,
        };
        entries::ActiveModel::from(&entry).insert(db_tx).await?;
        tracing::debug!(
            user_id = %user.id,
            kind = %entry.kind,
            category = entry.category_name.as_deref().unwrap_or(UNCATEGORIZED_NAME),
            "entry recorded"
        );
        Ok(entry)
    }

    /// A category an entry of `kind` may reference.
    async fn category_for_entry(
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        category_id: Uuid,
        kind: EntryKind,
    ) -> ResultEngine<Category> {
        let category = Self::visible_category(db_tx, user_id, category_id).await?;
        if category.kind != kind {
            return Err(EngineError::InvalidKind(format!(
                "category {} is for {} entries, not {kind}",
                category.name, category.kind
            )));
        }
        Ok(category)
    }

    async fn require_entry(
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> ResultEngine<Entry> {
        let row = entries::Entity::find_by_id(entry_id)
            .filter(entries::Column::UserId.eq(user_id))
            .find_also_related(categories::Entity)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("entry not exists".to_string()))?;
        Entry::try_from(row)
    }
}
