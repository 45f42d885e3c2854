use axum::{
    Extension, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;

use crate::{
    admin, assistant, categories, entries,
    identity::IdentityProvider,
    summary, user,
};
use engine::{Engine, EntryKind, User};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub identity: Arc<dyn IdentityProvider>,
}

/// Resolve the bearer token to a user and store it in the request extensions.
///
/// Users seen for the first time are created on the fly.
async fn auth(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(bearer)) = bearer else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    let identity = state.identity.verify(bearer.token()).map_err(|err| {
        tracing::debug!("rejected bearer token: {err}");
        StatusCode::UNAUTHORIZED
    })?;

    let known = state
        .engine
        .user_by_external_id(&identity.subject)
        .await
        .map_err(|err| {
            tracing::error!("failed to load user: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let user = match known {
        Some(user) => user,
        None => state.engine.sync_user(&identity).await.map_err(|err| {
            tracing::error!("failed to create user: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?,
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

async fn require_admin(
    Extension(user): Extension<User>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !user.is_admin {
        tracing::warn!(user_id = %user.id, "admin route refused");
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(next.run(request).await)
}

/// Routes shared by `/incomes` and `/expenses`; the kind travels as an extension.
fn ledger(prefix: &str, kind: EntryKind) -> Router<ServerState> {
    let mut router = Router::new()
        .route(prefix, get(entries::list).post(entries::create))
        .route(&format!("{prefix}/batch"), post(entries::create_batch))
        .route(&format!("{prefix}/summary"), get(entries::summary))
        .route(
            &format!("{prefix}/{{id}}"),
            patch(entries::update).delete(entries::remove),
        );
    if kind == EntryKind::Expense {
        router = router.route(&format!("{prefix}/trend/daily"), get(entries::daily_trend));
    }
    router.layer(Extension(kind))
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/admin/kpis", get(admin::kpis))
        .route("/admin/users", get(admin::users))
        .route("/admin/users/growth", get(admin::growth))
        .route("/admin/users/{id}", delete(admin::delete_user))
        .route(
            "/admin/categories",
            get(admin::list_categories).post(admin::create_category),
        )
        .route("/admin/categories/seed", post(admin::seed_categories))
        .route(
            "/admin/categories/{id}",
            patch(admin::update_category).delete(admin::delete_category),
        )
        .route_layer(middleware::from_fn(require_admin))
}

/// Build the HTTP application around an engine and an identity provider.
pub fn router(engine: Arc<Engine>, identity: Arc<dyn IdentityProvider>) -> Router {
    let state = ServerState { engine, identity };

    let authenticated = Router::new()
        .route("/me", get(user::me).patch(user::update_me))
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            patch(categories::update).delete(categories::remove),
        )
        .merge(ledger("/incomes", EntryKind::Income))
        .merge(ledger("/expenses", EntryKind::Expense))
        .route("/transactions", get(entries::recent))
        .route("/summary/kpis", get(summary::kpis))
        .route("/summary/period", get(summary::period))
        .route("/summary/monthly", get(summary::monthly))
        .route("/summary/breakdown", get(summary::breakdown))
        .route("/dashboard", get(summary::dashboard))
        .route("/analytics", post(summary::analytics))
        .route("/analytics/trends", get(summary::trends))
        .route("/budget", get(summary::budget))
        .route("/assistant/tools", post(assistant::run_tool))
        .merge(admin_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/auth/sync", post(user::sync))
        .merge(authenticated)
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    identity: Arc<dyn IdentityProvider>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine), identity)).await
}
