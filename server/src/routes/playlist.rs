use crate::impl_from_service_err;
use crate::routes::proxy::{proxy_err, proxy_val, Proxied};
use crate::serve::AppState;
use axum::extract::{Path, State};
use billboard_rs::api::playlist::Response as PResponse;

impl_from_service_err!(PResponse, Invalid => Invalid);
#[tracing::instrument(skip(state))]
pub async fn get(State(state): State<AppState>, Path(route): Path<String>) -> Proxied<PResponse> {
    let (duration, slides) = state.service().playlist(&route).await.map_err(proxy_err)?;
    proxy_val(PResponse::Ok {
        route,
        duration,
        slides,
    })
}
