use crate::auth::{AdminSession, AuthError};
use crate::routes::proxy::{proxy_err, proxy_val, Proxied};
use crate::serve::AppState;
use crate::{impl_from_auth_err, impl_from_service_err};
use axum::extract::{Path, Query, State};
use axum::Json;
use billboard_rs::api::images::{
    delete::Response as DIResponse,
    list::{Query as LIQuery, Response as LIResponse},
    meta::{Request as MIRequest, Response as MIResponse},
};
use uuid::Uuid;

// -- list

impl_from_auth_err!(LIResponse, Internal => Internal, Unauthorized => Unauthorized);
impl_from_service_err!(LIResponse, Invalid => Invalid);
#[tracing::instrument(skip(state, session))]
pub async fn list(
    State(state): State<AppState>,
    session: Result<AdminSession, AuthError>,
    Query(query): Query<LIQuery>,
) -> Proxied<LIResponse> {
    let Some(folder) = query.folder.filter(|f| !f.trim().is_empty()) else {
        return Err(proxy_err(LIResponse::Invalid {
            reason: "`folder` is required".to_string(),
        }));
    };
    let all = query.all.unwrap_or(false);
    if all {
        // unfiltered listings are for the admin pages only
        session.map_err(proxy_err)?;
    }
    let images = state
        .service()
        .list_images(&folder, query.route.as_deref(), all)
        .await
        .map_err(proxy_err)?;
    proxy_val(LIResponse::Ok { images })
}

// -- meta

impl_from_service_err!(MIResponse, Invalid => Invalid);
#[tracing::instrument(skip(state, _session))]
pub async fn meta(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(request): Json<MIRequest>,
) -> Proxied<MIResponse> {
    let image = state
        .service()
        .upsert_meta(
            request.url.as_deref(),
            request.scheduled_at.as_deref(),
            request.expires_at.as_deref(),
        )
        .await
        .map_err(proxy_err)?;
    proxy_val(MIResponse::Ok { image })
}

// -- delete

impl_from_service_err!(DIResponse, NotFound => NotFound);
#[tracing::instrument(skip(state, _session))]
pub async fn delete(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(image_id): Path<Uuid>,
) -> Proxied<DIResponse> {
    state
        .service()
        .delete_image(image_id)
        .await
        .map_err(proxy_err)?;
    proxy_val(DIResponse::Ok)
}
