use crate::auth::AdminSession;
use crate::impl_from_service_err;
use crate::routes::proxy::{proxy_err, proxy_val, Proxied};
use crate::serve::AppState;
use axum::extract::{Query, State};
use axum::Json;
use billboard_rs::api::config::{
    get::{Query as GCQuery, Response as GCResponse},
    update::{Request as UCRequest, Response as UCResponse},
};

/// Route read when a config query names none.
const DEFAULT_ROUTE: &str = "default";

// -- get

impl_from_service_err!(GCResponse, Invalid => Invalid);
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<GCQuery>,
) -> Proxied<GCResponse> {
    let route = query.route.unwrap_or_else(|| DEFAULT_ROUTE.to_string());
    let config = state
        .service()
        .route_config(&route)
        .await
        .map_err(proxy_err)?;
    proxy_val(GCResponse::Ok { route, config })
}

// -- update

impl_from_service_err!(UCResponse, Invalid => Invalid);
#[tracing::instrument(skip(state, _session))]
pub async fn update(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(request): Json<UCRequest>,
) -> Proxied<UCResponse> {
    let config = state
        .service()
        .update_route_config(&request.route, request.duration, &request.selected_folders)
        .await
        .map_err(proxy_err)?;
    proxy_val(UCResponse::Ok { config })
}
