//! Income and expense endpoints.
//!
//! The same handlers serve `/incomes` and `/expenses`; the router attaches the
//! [`EntryKind`] of the prefix as a request extension.

use api_types::entry::{
    CategoryTotalView, DailyTotalView, EntryBatch, EntryCreate, EntryListResponse, EntryUpdate,
    EntryView, RecentQuery, TrendQuery,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{EngineError, EntryKind, EntryPatch, NewEntry, User};
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{
        currency_from_api, map_category_totals, map_daily, map_entries, map_entry, parse_amount,
    },
    server::ServerState,
};

const DEFAULT_TREND_DAYS: u32 = 30;
const DEFAULT_RECENT_LIMIT: u64 = 10;
const MAX_RECENT_LIMIT: u64 = 100;

fn new_entry(kind: EntryKind, payload: EntryCreate) -> Result<NewEntry, ServerError> {
    Ok(NewEntry {
        kind,
        amount: parse_amount(payload.amount)?,
        occurred_on: payload.date,
        category_id: payload.category_id,
        category_name: payload.category_name,
        currency: payload.currency.map(currency_from_api),
        icon: payload.icon,
        note: payload.note,
    })
}

/// Entries reached through the wrong prefix are reported as missing.
async fn ensure_kind(
    state: &ServerState,
    user: &User,
    entry_id: Uuid,
    kind: EntryKind,
) -> Result<(), ServerError> {
    let entry = state.engine.entry(user.id, entry_id).await?;
    if entry.kind != kind {
        return Err(EngineError::KeyNotFound("entry not exists".to_string()).into());
    }
    Ok(())
}

pub async fn list(
    Extension(user): Extension<User>,
    Extension(kind): Extension<EntryKind>,
    State(state): State<ServerState>,
) -> Result<Json<EntryListResponse>, ServerError> {
    let entries = state.engine.list_entries(user.id, Some(kind)).await?;
    Ok(Json(EntryListResponse {
        entries: map_entries(entries),
    }))
}

pub async fn create(
    Extension(user): Extension<User>,
    Extension(kind): Extension<EntryKind>,
    State(state): State<ServerState>,
    Json(payload): Json<EntryCreate>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let entry = state
        .engine
        .create_entry(user.id, new_entry(kind, payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(map_entry(entry))))
}

/// All-or-nothing creation of several entries of the same kind.
pub async fn create_batch(
    Extension(user): Extension<User>,
    Extension(kind): Extension<EntryKind>,
    State(state): State<ServerState>,
    Json(payload): Json<EntryBatch>,
) -> Result<(StatusCode, Json<EntryListResponse>), ServerError> {
    if payload.items.is_empty() {
        return Err(ServerError::Generic("items must not be empty".to_string()));
    }
    let batch = payload
        .items
        .into_iter()
        .map(|item| new_entry(kind, item))
        .collect::<Result<Vec<_>, _>>()?;
    let entries = state.engine.create_entries(user.id, batch).await?;
    Ok((
        StatusCode::CREATED,
        Json(EntryListResponse {
            entries: map_entries(entries),
        }),
    ))
}

pub async fn update(
    Extension(user): Extension<User>,
    Extension(kind): Extension<EntryKind>,
    State(state): State<ServerState>,
    Path(entry_id): Path<Uuid>,
    Json(payload): Json<EntryUpdate>,
) -> Result<Json<EntryView>, ServerError> {
    ensure_kind(&state, &user, entry_id, kind).await?;
    let patch = EntryPatch {
        amount: payload.amount.map(parse_amount).transpose()?,
        occurred_on: payload.date,
        category_id: payload.category_id,
        category_name: payload.category_name,
        currency: payload.currency.map(currency_from_api),
        icon: payload.icon,
        note: payload.note,
    };
    let entry = state.engine.update_entry(user.id, entry_id, patch).await?;
    Ok(Json(map_entry(entry)))
}

pub async fn remove(
    Extension(user): Extension<User>,
    Extension(kind): Extension<EntryKind>,
    State(state): State<ServerState>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<EntryView>, ServerError> {
    ensure_kind(&state, &user, entry_id, kind).await?;
    let entry = state.engine.delete_entry(user.id, entry_id).await?;
    Ok(Json(map_entry(entry)))
}

pub async fn summary(
    Extension(user): Extension<User>,
    Extension(kind): Extension<EntryKind>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<CategoryTotalView>>, ServerError> {
    let rows = state.engine.summary_by_category(user.id, kind).await?;
    Ok(Json(map_category_totals(rows)))
}

pub async fn daily_trend(
    Extension(user): Extension<User>,
    Extension(kind): Extension<EntryKind>,
    State(state): State<ServerState>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<Vec<DailyTotalView>>, ServerError> {
    let days = query.days.unwrap_or(DEFAULT_TREND_DAYS);
    let today = Utc::now().date_naive();
    let rows = state
        .engine
        .daily_trend(user.id, kind, days, today)
        .await?;
    Ok(Json(map_daily(rows)))
}

/// Merged ledger of both kinds, newest first.
pub async fn recent(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<EntryListResponse>, ServerError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    let entries = state.engine.recent_entries(user.id, limit).await?;
    Ok(Json(EntryListResponse {
        entries: map_entries(entries),
    }))
}
