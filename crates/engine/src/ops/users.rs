use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Identity, ResultEngine, User, UserGrowth, UserSettingsPatch,
    categories, entries, users,
    util::{ensure_amount, normalize_optional_text},
};

use super::{Engine, is_unique_violation, with_tx};

impl Engine {
    /// Create or refresh the user vouched for by `identity`.
    ///
    /// Profile claims that are present overwrite the stored ones; absent claims
    /// keep what is already there. Currency, budget and admin flag are never
    /// touched by a sync.
    pub async fn sync_user(&self, identity: &Identity) -> ResultEngine<User> {
        let subject = identity.subject.trim();
        if subject.is_empty() {
            return Err(EngineError::InvalidId("empty identity subject".to_string()));
        }

        with_tx!(self, |db_tx| {
            if let Some(model) = Self::user_by_subject(&db_tx, subject).await? {
                Self::refresh_profile(&db_tx, model, identity).await
            } else {
                let user = User {
                    id: Uuid::new_v4(),
                    external_id: Some(subject.to_string()),
                    email: normalize_optional_text(identity.email.as_deref()),
                    display_name: normalize_optional_text(identity.display_name.as_deref()),
                    avatar_url: normalize_optional_text(identity.avatar_url.as_deref()),
                    currency: Currency::default(),
                    monthly_budget: None,
                    is_admin: false,
                    created_at: Utc::now(),
                };

                let savepoint = db_tx.begin().await?;
                match users::ActiveModel::from(&user).insert(&savepoint).await {
                    Ok(_) => {
                        savepoint.commit().await?;
                        tracing::info!(user_id = %user.id, "user created from identity");
                        Ok(user)
                    }
                    Err(err) if is_unique_violation(&err) => {
                        savepoint.rollback().await?;
                        let model = Self::user_by_subject(&db_tx, subject)
                            .await?
                            .ok_or(EngineError::Database(err))?;
                        Self::refresh_profile(&db_tx, model, identity).await
                    }
                    Err(err) => Err(err.into()),
                }
            }
        })
    }

    /// Return the user with the given id.
    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            User::try_from(Self::require_user(&db_tx, user_id).await?)
        })
    }

    /// Look a user up by the identity provider subject.
    pub async fn user_by_external_id(&self, subject: &str) -> ResultEngine<Option<User>> {
        with_tx!(self, |db_tx| {
            Self::user_by_subject(&db_tx, subject)
                .await?
                .map(User::try_from)
                .transpose()
        })
    }

    pub async fn update_user_settings(
        &self,
        user_id: Uuid,
        patch: UserSettingsPatch,
    ) -> ResultEngine<User> {
        if let Some(Some(budget)) = patch.monthly_budget {
            ensure_amount(budget)?;
        }

        with_tx!(self, |db_tx| {
            let model = Self::require_user(&db_tx, user_id).await?;
            if patch == UserSettingsPatch::default() {
                return User::try_from(model);
            }
            let mut active: users::ActiveModel = model.into();
            if let Some(name) = patch.display_name.as_deref() {
                active.display_name = ActiveValue::Set(normalize_optional_text(Some(name)));
            }
            if let Some(avatar) = patch.avatar_url.as_deref() {
                active.avatar_url = ActiveValue::Set(normalize_optional_text(Some(avatar)));
            }
            if let Some(currency) = patch.currency {
                active.currency = ActiveValue::Set(currency.code().to_string());
            }
            if let Some(budget) = patch.monthly_budget {
                active.monthly_budget_minor = ActiveValue::Set(budget.map(|b| b.minor()));
            }
            User::try_from(active.update(&db_tx).await?)
        })
    }

    /// Grant or revoke the admin flag.
    pub async fn set_admin(&self, user_id: Uuid, is_admin: bool) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = Self::require_user(&db_tx, user_id).await?;
            let mut active: users::ActiveModel = model.into();
            active.is_admin = ActiveValue::Set(is_admin);
            User::try_from(active.update(&db_tx).await?)
        })
    }

    /// Users ordered by newest first.
    pub async fn list_users(&self, offset: u64, limit: u64) -> ResultEngine<Vec<User>> {
        with_tx!(self, |db_tx| {
            users::Entity::find()
                .order_by_desc(users::Column::CreatedAt)
                .order_by_asc(users::Column::Id)
                .offset(offset)
                .limit(limit)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(User::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Delete a user together with every category and entry it owns.
    ///
    /// Returns `false` when the user does not exist.
    pub async fn delete_user(&self, user_id: Uuid) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(user_id).one(&db_tx).await?.is_none() {
                Ok(false)
            } else {
                let removed_entries = entries::Entity::delete_many()
                    .filter(entries::Column::UserId.eq(user_id))
                    .exec(&db_tx)
                    .await?
                    .rows_affected;
                let private_categories: Vec<Uuid> = categories::Entity::find()
                    .filter(categories::Column::OwnerId.eq(user_id))
                    .all(&db_tx)
                    .await?
                    .into_iter()
                    .map(|model| model.id)
                    .collect();
                Self::detach_entries_from(&db_tx, &private_categories).await?;
                categories::Entity::delete_many()
                    .filter(categories::Column::OwnerId.eq(user_id))
                    .exec(&db_tx)
                    .await?;
                users::Entity::delete_by_id(user_id).exec(&db_tx).await?;
                tracing::info!(%user_id, removed_entries, "user deleted");
                Ok(true)
            }
        })
    }

    /// New users per day over `[today - days + 1, today]`, days without sign-ups omitted.
    pub async fn user_growth(&self, days: u32, today: NaiveDate) -> ResultEngine<Vec<UserGrowth>> {
        if days == 0 {
            return Err(EngineError::InvalidRange("days must be > 0".to_string()));
        }
        let start = today
            .checked_sub_days(chrono::Days::new(u64::from(days) - 1))
            .ok_or_else(|| EngineError::InvalidDate("growth window starts before year 0".to_string()))?;
        let since: DateTime<Utc> = start.and_time(chrono::NaiveTime::MIN).and_utc();

        with_tx!(self, |db_tx| {
            let created: Vec<DateTime<Utc>> = users::Entity::find()
                .filter(users::Column::CreatedAt.gte(since))
                .order_by_asc(users::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| model.created_at)
                .collect();

            let mut growth: Vec<UserGrowth> = Vec::new();
            for date in created.into_iter().map(|at| at.date_naive()) {
                if date > today {
                    continue;
                }
                match growth.last_mut() {
                    Some(last) if last.date == date => last.count += 1,
                    _ => growth.push(UserGrowth { date, count: 1 }),
                }
            }
            Ok::<_, EngineError>(growth)
        })
    }

    pub(super) async fn count_users(db_tx: &DatabaseTransaction) -> ResultEngine<u64> {
        Ok(users::Entity::find().count(db_tx).await?)
    }

    pub(super) async fn require_user(
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    async fn user_by_subject(
        db_tx: &DatabaseTransaction,
        subject: &str,
    ) -> ResultEngine<Option<users::Model>> {
        Ok(users::Entity::find()
            .filter(users::Column::ExternalId.eq(subject))
            .one(db_tx)
            .await?)
    }

    async fn refresh_profile(
        db_tx: &DatabaseTransaction,
        model: users::Model,
        identity: &Identity,
    ) -> ResultEngine<User> {
        let email = normalize_optional_text(identity.email.as_deref());
        let display_name = normalize_optional_text(identity.display_name.as_deref());
        let avatar_url = normalize_optional_text(identity.avatar_url.as_deref());
        if email.is_none() && display_name.is_none() && avatar_url.is_none() {
            return User::try_from(model);
        }

        let mut active: users::ActiveModel = model.into();
        if email.is_some() {
            active.email = ActiveValue::Set(email);
        }
        if display_name.is_some() {
            active.display_name = ActiveValue::Set(display_name);
        }
        if avatar_url.is_some() {
            active.avatar_url = ActiveValue::Set(avatar_url);
        }
        User::try_from(active.update(db_tx).await?)
    }
}
