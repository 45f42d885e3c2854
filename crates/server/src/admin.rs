//! Administrator endpoints. The router only lets `is_admin` users through.

use api_types::{
    admin::{GlobalKpisView, GrowthPoint, GrowthQuery, UserListQuery, UserListResponse},
    category::{
        CategoryCreate, CategoryListResponse, CategoryQuery, CategoryUpdate, CategoryUpdated,
        CategoryView, SeedResult,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{EngineError, User};
use uuid::Uuid;

use crate::{
    ServerError,
    categories::{category_patch, map_update, new_category},
    convert::{kind_from_api, map_category, map_user},
    server::ServerState,
};

const DEFAULT_GROWTH_DAYS: u32 = 30;
const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;

pub async fn kpis(State(state): State<ServerState>) -> Result<Json<GlobalKpisView>, ServerError> {
    let kpis = state.engine.global_kpis().await?;
    Ok(Json(GlobalKpisView {
        total_users: kpis.total_users,
        total_income: kpis.total_income.to_f64(),
        total_expense: kpis.total_expense.to_f64(),
        net_balance: kpis.net_balance.to_f64(),
    }))
}

pub async fn growth(
    State(state): State<ServerState>,
    Query(query): Query<GrowthQuery>,
) -> Result<Json<Vec<GrowthPoint>>, ServerError> {
    let days = query.days.unwrap_or(DEFAULT_GROWTH_DAYS);
    let points = state
        .engine
        .user_growth(days, Utc::now().date_naive())
        .await?
        .into_iter()
        .map(|point| GrowthPoint {
            date: point.date,
            count: point.count,
        })
        .collect();
    Ok(Json(points))
}

pub async fn users(
    State(state): State<ServerState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserListResponse>, ServerError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let users = state
        .engine
        .list_users(query.offset.unwrap_or(0), limit)
        .await?
        .into_iter()
        .map(map_user)
        .collect();
    Ok(Json(UserListResponse { users }))
}

pub async fn delete_user(
    Extension(admin): Extension<User>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    if admin.id == user_id {
        return Err(ServerError::Generic(
            "administrators cannot delete themselves".to_string(),
        ));
    }
    if state.engine.delete_user(user_id).await? {
        tracing::info!(admin_id = %admin.id, %user_id, "user removed by admin");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(EngineError::KeyNotFound("user not exists".to_string()).into())
    }
}

pub async fn list_categories(
    State(state): State<ServerState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state
        .engine
        .list_default_categories(query.kind.map(kind_from_api))
        .await?
        .into_iter()
        .map(map_category)
        .collect();
    Ok(Json(CategoryListResponse { categories }))
}

pub async fn create_category(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_default_category(new_category(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn update_category(
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryUpdated>, ServerError> {
    let update = state
        .engine
        .update_default_category(category_id, category_patch(payload))
        .await?;
    Ok(Json(map_update(update)))
}

pub async fn delete_category(
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    if state.engine.delete_default_category(category_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(EngineError::KeyNotFound("category not exists".to_string()).into())
    }
}

pub async fn seed_categories(
    State(state): State<ServerState>,
) -> Result<Json<SeedResult>, ServerError> {
    let inserted = state.engine.seed_default_categories().await?;
    Ok(Json(SeedResult { inserted }))
}
