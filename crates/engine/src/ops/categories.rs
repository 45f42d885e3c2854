use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Category, CategoryOwner, CategoryPatch, CategoryUpdate, EngineError, EntryKind, NewCategory,
    ResultEngine, categories, entries,
    util::{normalize_category_display, normalize_category_key, normalize_optional_text},
};

use super::{Engine, is_unique_violation, with_tx};

/// One global default category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultCategory {
    pub kind: EntryKind,
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

const fn default_category(
    kind: EntryKind,
    name: &'static str,
    icon: &'static str,
    color: &'static str,
) -> DefaultCategory {
    DefaultCategory {
        kind,
        name,
        icon,
        color,
    }
}

/// Global defaults installed by [`Engine::seed_default_categories`].
pub const DEFAULT_CATEGORY_CATALOG: &[DefaultCategory] = &[
    default_category(EntryKind::Income, "Salary", "💵", "#22C55E"),
    default_category(EntryKind::Income, "Business", "💼", "#F59E0B"),
    default_category(EntryKind::Income, "Gift", "🎁", "#10B981"),
    default_category(EntryKind::Income, "Loan", "🏦", "#EF4444"),
    default_category(EntryKind::Income, "Insurance Payout", "🛡️", "#3B82F6"),
    default_category(EntryKind::Income, "Extra Income", "💸", "#22C55E"),
    default_category(EntryKind::Income, "Inheritance", "👨‍👩‍👧‍👦", "#EC4899"),
    default_category(EntryKind::Income, "Other", "❓", "#9CA3AF"),
    default_category(EntryKind::Expense, "Health Care", "💊", "#EF4444"),
    default_category(EntryKind::Expense, "Work", "💼", "#3B82F6"),
    default_category(EntryKind::Expense, "Transportation", "🚌", "#FACC15"),
    default_category(EntryKind::Expense, "Food & Drink", "🍽️", "#F97316"),
    default_category(EntryKind::Expense, "Travel", "✈️", "#EC4899"),
    default_category(EntryKind::Expense, "Entertainment", "🎭", "#F59E0B"),
    default_category(EntryKind::Expense, "Education", "🎓", "#3B82F6"),
    default_category(EntryKind::Expense, "Bills & Fees", "💰", "#10B981"),
    default_category(EntryKind::Expense, "Other", "❓", "#9CA3AF"),
];

/// Icon and colour given to categories created implicitly from a name.
fn implicit_style(kind: EntryKind) -> (&'static str, &'static str) {
    match kind {
        EntryKind::Income => ("💰", "#4CAF50"),
        EntryKind::Expense => ("🏷️", "#F97316"),
    }
}

impl Engine {
    /// Return the category `name` of `kind` visible to the user, creating a
    /// private one when neither the user nor the global defaults have it.
    ///
    /// Matching is case-insensitive and ignores surrounding/repeated
    /// whitespace. Private categories shadow global defaults.
    pub async fn resolve_or_create_category(
        &self,
        user_id: Uuid,
        name: &str,
        kind: EntryKind,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            Self::require_user(&db_tx, user_id).await?;
            Self::resolve_category(&db_tx, user_id, name, kind).await
        })
    }

    /// Create a private category. Fails with `ExistingKey` when the user
    /// already owns a category with the same name and kind.
    pub async fn create_category(
        &self,
        user_id: Uuid,
        category: NewCategory,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            Self::require_user(&db_tx, user_id).await?;
            Self::insert_new_category(&db_tx, CategoryOwner::User(user_id), category).await
        })
    }

    /// Private categories first, then global defaults; alphabetical inside each group.
    pub async fn list_categories(
        &self,
        user_id: Uuid,
        kind: Option<EntryKind>,
    ) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let mut query = categories::Entity::find().filter(
                Condition::any()
                    .add(categories::Column::OwnerId.eq(user_id))
                    .add(categories::Column::OwnerId.is_null()),
            );
            if let Some(kind) = kind {
                query = query.filter(categories::Column::Kind.eq(kind.as_str()));
            }
            let mut categories = query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Category::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            sort_categories(&mut categories);
            Ok::<_, EngineError>(categories)
        })
    }

    /// Return a category owned by the user. Global defaults and other users'
    /// categories are reported as absent.
    pub async fn find_owned_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<Option<Category>> {
        with_tx!(self, |db_tx| {
            Self::owned_category(&db_tx, category_id, CategoryOwner::User(user_id))
                .await?
                .map(Category::try_from)
                .transpose()
        })
    }

    /// Partially update a private category.
    ///
    /// `kind` is immutable: a patch that only asks for a kind change fails with
    /// `ImmutableField`, otherwise the other fields are applied and `kind` is
    /// listed in [`CategoryUpdate::rejected`].
    pub async fn update_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        patch: CategoryPatch,
    ) -> ResultEngine<CategoryUpdate> {
        with_tx!(self, |db_tx| {
            let model = Self::owned_category(&db_tx, category_id, CategoryOwner::User(user_id))
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
            Self::apply_category_patch(&db_tx, model, patch).await
        })
    }

    /// Delete a private category. Entries pointing at it keep their recorded
    /// category name and lose the reference.
    pub async fn delete_category(&self, user_id: Uuid, category_id: Uuid) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            match Self::owned_category(&db_tx, category_id, CategoryOwner::User(user_id)).await? {
                Some(model) => Self::remove_category(&db_tx, model).await.map(|()| true),
                None => Ok(false),
            }
        })
    }

    /// Install the missing entries of [`DEFAULT_CATEGORY_CATALOG`]. Returns how
    /// many were inserted; running it again inserts nothing.
    pub async fn seed_default_categories(&self) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let mut inserted = 0;
            for default in DEFAULT_CATEGORY_CATALOG {
                let key = normalize_category_key(default.name)?;
                if Self::category_by_key(&db_tx, CategoryOwner::GlobalDefault, default.kind, &key)
                    .await?
                    .is_some()
                {
                    continue;
                }
                let category = Category {
                    id: Uuid::new_v4(),
                    owner: CategoryOwner::GlobalDefault,
                    name: default.name.to_string(),
                    kind: default.kind,
                    color: Some(default.color.to_string()),
                    icon: Some(default.icon.to_string()),
                    created_at: Utc::now(),
                    name_norm: key,
                };
                categories::ActiveModel::from(&category).insert(&db_tx).await?;
                inserted += 1;
            }
            tracing::info!(inserted, "default categories seeded");
            Ok::<_, EngineError>(inserted)
        })
    }

    pub async fn list_default_categories(
        &self,
        kind: Option<EntryKind>,
    ) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let mut query = categories::Entity::find().filter(categories::Column::OwnerId.is_null());
            if let Some(kind) = kind {
                query = query.filter(categories::Column::Kind.eq(kind.as_str()));
            }
            let mut categories = query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Category::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            sort_categories(&mut categories);
            Ok::<_, EngineError>(categories)
        })
    }

    pub async fn create_default_category(&self, category: NewCategory) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            Self::insert_new_category(&db_tx, CategoryOwner::GlobalDefault, category).await
        })
    }

    pub async fn update_default_category(
        &self,
        category_id: Uuid,
        patch: CategoryPatch,
    ) -> ResultEngine<CategoryUpdate> {
        with_tx!(self, |db_tx| {
            let model = Self::owned_category(&db_tx, category_id, CategoryOwner::GlobalDefault)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
            Self::apply_category_patch(&db_tx, model, patch).await
        })
    }

    pub async fn delete_default_category(&self, category_id: Uuid) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            match Self::owned_category(&db_tx, category_id, CategoryOwner::GlobalDefault).await? {
                Some(model) => Self::remove_category(&db_tx, model).await.map(|()| true),
                None => Ok(false),
            }
        })
    }

    pub(super) async fn resolve_category(
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        name: &str,
        kind: EntryKind,
    ) -> ResultEngine<Category> {
        let display = normalize_category_display(name)?;
        let key = normalize_category_key(&display)?;

        for owner in [CategoryOwner::User(user_id), CategoryOwner::GlobalDefault] {
            if let Some(model) = Self::category_by_key(db_tx, owner, kind, &key).await? {
                return Category::try_from(model);
            }
        }

        let (icon, color) = implicit_style(kind);
        let category = Category {
            id: Uuid::new_v4(),
            owner: CategoryOwner::User(user_id),
            name: display,
            kind,
            color: Some(color.to_string()),
            icon: Some(icon.to_string()),
            created_at: Utc::now(),
            name_norm: key,
        };

        Self::insert_or_reread(db_tx, category).await
    }

    /// Insert inside a savepoint. A concurrent request may create the same
    /// category between the lookup and the insert; the unique index turns
    /// that into a re-read of the stored row.
    async fn insert_or_reread(
        db_tx: &DatabaseTransaction,
        category: Category,
    ) -> ResultEngine<Category> {
        let savepoint = db_tx.begin().await?;
        match categories::ActiveModel::from(&category).insert(&savepoint).await {
            Ok(_) => {
                savepoint.commit().await?;
                tracing::debug!(owner = %category.owner.key(), name = %category.name, kind = %category.kind, "category created implicitly");
                Ok(category)
            }
            Err(err) if is_unique_violation(&err) => {
                savepoint.rollback().await?;
                tracing::debug!(name = %category.name, "category created concurrently, reusing it");
                let model = Self::category_by_key(
                    db_tx,
                    category.owner,
                    category.kind,
                    &category.name_norm,
                )
                .await?
                .ok_or(EngineError::Database(err))?;
                Category::try_from(model)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Category usable by the user's entries: private or global default.
    pub(super) async fn visible_category(
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id)
            .filter(
                Condition::any()
                    .add(categories::Column::OwnerId.eq(user_id))
                    .add(categories::Column::OwnerId.is_null()),
            )
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        Category::try_from(model)
    }

    /// Null out the category reference of every entry pointing at `category_ids`.
    pub(super) async fn detach_entries_from(
        db_tx: &DatabaseTransaction,
        category_ids: &[Uuid],
    ) -> ResultEngine<u64> {
        if category_ids.is_empty() {
            return Ok(0);
        }
        let result = entries::Entity::update_many()
            .col_expr(entries::Column::CategoryId, Expr::value(Option::<Uuid>::None))
            .filter(entries::Column::CategoryId.is_in(category_ids.iter().copied()))
            .exec(db_tx)
            .await?;
        Ok(result.rows_affected)
    }

    async fn owned_category(
        db_tx: &DatabaseTransaction,
        category_id: Uuid,
        owner: CategoryOwner,
    ) -> ResultEngine<Option<categories::Model>> {
        Ok(categories::Entity::find_by_id(category_id)
            .filter(categories::Column::OwnerKey.eq(owner.key()))
            .one(db_tx)
            .await?)
    }

    async fn category_by_key(
        db_tx: &DatabaseTransaction,
        owner: CategoryOwner,
        kind: EntryKind,
        key: &str,
    ) -> ResultEngine<Option<categories::Model>> {
        Ok(categories::Entity::find()
            .filter(categories::Column::OwnerKey.eq(owner.key()))
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::NameNorm.eq(key))
            .one(db_tx)
            .await?)
    }

    async fn insert_new_category(
        db_tx: &DatabaseTransaction,
        owner: CategoryOwner,
        new: NewCategory,
    ) -> ResultEngine<Category> {
        let display = normalize_category_display(&new.name)?;
        let key = normalize_category_key(&display)?;
        if Self::category_by_key(db_tx, owner, new.kind, &key)
            .await?
            .is_some()
        {
            return Err(EngineError::ExistingKey(format!("category {display}")));
        }

        let (icon, color) = implicit_style(new.kind);
        let category = Category {
            id: Uuid::new_v4(),
            owner,
            name: display,
            kind: new.kind,
            color: normalize_optional_text(new.color.as_deref()).or(Some(color.to_string())),
            icon: normalize_optional_text(new.icon.as_deref()).or(Some(icon.to_string())),
            created_at: Utc::now(),
            name_norm: key,
        };
        match categories::ActiveModel::from(&category).insert(db_tx).await {
            Ok(_) => Ok(category),
            Err(err) if is_unique_violation(&err) => {
                Err(EngineError::ExistingKey(format!("category {}", category.name)))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn apply_category_patch(
        db_tx: &DatabaseTransaction,
        model: categories::Model,
        patch: CategoryPatch,
    ) -> ResultEngine<CategoryUpdate> {
        let current = Category::try_from(model.clone())?;
        let kind_change = patch.kind.filter(|kind| *kind != current.kind);
        if kind_change.is_some() && !patch.touches_mutable_fields() {
            return Err(EngineError::ImmutableField("kind".to_string()));
        }
        let rejected = if kind_change.is_some() {
            vec!["kind"]
        } else {
            Vec::new()
        };
        if !patch.touches_mutable_fields() {
            return Ok(CategoryUpdate {
                category: current,
                rejected,
            });
        }

        let mut active: categories::ActiveModel = model.into();
        if let Some(name) = patch.name.as_deref() {
            let display = normalize_category_display(name)?;
            let key = normalize_category_key(&display)?;
            if key != current.name_norm
                && Self::category_by_key(db_tx, current.owner, current.kind, &key)
                    .await?
                    .is_some()
            {
                return Err(EngineError::ExistingKey(format!("category {display}")));
            }
            active.name = ActiveValue::Set(display);
            active.name_norm = ActiveValue::Set(key);
        }
        if let Some(color) = patch.color.as_deref() {
            active.color = ActiveValue::Set(normalize_optional_text(Some(color)));
        }
        if let Some(icon) = patch.icon.as_deref() {
            active.icon = ActiveValue::Set(normalize_optional_text(Some(icon)));
        }

        let updated = match active.update(db_tx).await {
            Ok(model) => model,
            Err(err) if is_unique_violation(&err) => {
                return Err(EngineError::ExistingKey(format!(
                    "category {}",
                    patch.name.unwrap_or_default()
                )));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(CategoryUpdate {
            category: Category::try_from(updated)?,
            rejected,
        })
    }

    async fn remove_category(
        db_tx: &DatabaseTransaction,
        model: categories::Model,
    ) -> ResultEngine<()> {
        let detached = Self::detach_entries_from(db_tx, &[model.id]).await?;
        categories::Entity::delete_by_id(model.id).exec(db_tx).await?;
        tracing::info!(category_id = %model.id, detached, "category deleted");
        Ok(())
    }
}

fn sort_categories(categories: &mut [Category]) {
    categories.sort_by(|a, b| {
        a.owner
            .is_global()
            .cmp(&b.owner.is_global())
            .then_with(|| a.name_norm.cmp(&b.name_norm))
            .then_with(|| a.kind.cmp(&b.kind))
    });
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectOptions, Database};

    use super::*;
    use crate::Identity;
    use migration::MigratorTrait;

    async fn engine() -> Engine {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        Engine::builder().database(db).build().await.unwrap()
    }

    #[tokio::test]
    async fn losing_an_insert_race_reuses_the_stored_category() {
        let engine = engine().await;
        let user_id = engine
            .sync_user(&Identity {
                subject: "alice".to_string(),
                ..Identity::default()
            })
            .await
            .unwrap()
            .id;
        let winner = engine
            .resolve_or_create_category(user_id, "Coffee", EntryKind::Expense)
            .await
            .unwrap();

        // Same key under a fresh id, as a second request racing the first would build.
        let loser = Category {
            id: Uuid::new_v4(),
            name: "COFFEE".to_string(),
            ..winner.clone()
        };

        let db_tx = engine.database.begin().await.unwrap();
        let resolved = Engine::insert_or_reread(&db_tx, loser).await.unwrap();
        assert_eq!(resolved.id, winner.id);
        assert_eq!(resolved.name, "Coffee");

        // Only the savepoint was rolled back: the outer transaction still works.
        let fresh = Engine::resolve_category(&db_tx, user_id, "Tea", EntryKind::Expense)
            .await
            .unwrap();
        db_tx.commit().await.unwrap();

        let names: Vec<String> = engine
            .list_categories(user_id, Some(EntryKind::Expense))
            .await
            .unwrap()
            .into_iter()
            .filter(|category| !category.owner.is_global())
            .map(|category| category.name)
            .collect();
        assert_eq!(names, vec!["Coffee".to_string(), fresh.name]);
    }
}
