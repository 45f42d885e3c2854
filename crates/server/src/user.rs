//! Identity sync and the caller's own profile.

use api_types::user::{UserSettingsUpdate, UserView};
use axum::{Extension, Json, extract::State};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use engine::{User, UserSettingsPatch};

use crate::{
    ServerError,
    convert::{currency_from_api, map_user, parse_amount},
    server::ServerState,
};

/// Verify the bearer token and create or refresh the matching user.
pub async fn sync(
    State(state): State<ServerState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Json<UserView>, ServerError> {
    let Some(TypedHeader(bearer)) = bearer else {
        return Err(ServerError::Unauthorized("missing bearer token".to_string()));
    };
    let identity = state
        .identity
        .verify(bearer.token())
        .map_err(|err| ServerError::Unauthorized(err.to_string()))?;
    let user = state.engine.sync_user(&identity).await?;
    Ok(Json(map_user(user)))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserView> {
    Json(map_user(user))
}

pub async fn update_me(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<UserSettingsUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let monthly_budget = match payload.monthly_budget {
        Some(Some(amount)) => Some(Some(parse_amount(amount)?)),
        Some(None) => Some(None),
        None => None,
    };
    let patch = UserSettingsPatch {
        display_name: payload.display_name,
        avatar_url: payload.avatar_url,
        currency: payload.currency.map(currency_from_api),
        monthly_budget,
    };
    let user = state.engine.update_user_settings(user.id, patch).await?;
    Ok(Json(map_user(user)))
}
