//! Categories API endpoints.

use api_types::category::{
    CategoryCreate, CategoryListResponse, CategoryQuery, CategoryUpdate, CategoryUpdated,
    CategoryView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CategoryPatch, EngineError, NewCategory, User};
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{kind_from_api, map_category},
    server::ServerState,
};

pub(crate) fn new_category(payload: CategoryCreate) -> NewCategory {
    NewCategory {
        name: payload.name,
        kind: kind_from_api(payload.kind),
        color: payload.color,
        icon: payload.icon,
    }
}

pub(crate) fn category_patch(payload: CategoryUpdate) -> CategoryPatch {
    CategoryPatch {
        name: payload.name,
        color: payload.color,
        icon: payload.icon,
        kind: payload.kind.map(kind_from_api),
    }
}

pub(crate) fn map_update(update: engine::CategoryUpdate) -> CategoryUpdated {
    CategoryUpdated {
        category: map_category(update.category),
        rejected: update.rejected.into_iter().map(str::to_string).collect(),
    }
}

/// Private categories first, then the global defaults.
pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state
        .engine
        .list_categories(user.id, query.kind.map(kind_from_api))
        .await?
        .into_iter()
        .map(map_category)
        .collect();

    Ok(Json(CategoryListResponse { categories }))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(user.id, new_category(payload))
        .await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryUpdated>, ServerError> {
    let update = state
        .engine
        .update_category(user.id, category_id, category_patch(payload))
        .await?;
    Ok(Json(map_update(update)))
}

pub async fn remove(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    if state.engine.delete_category(user.id, category_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(EngineError::KeyNotFound("category not exists".to_string()).into())
    }
}
