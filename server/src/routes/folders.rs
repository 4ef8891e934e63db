use crate::auth::AdminSession;
use crate::impl_from_service_err;
use crate::routes::proxy::{proxy_err, proxy_val, Proxied};
use crate::serve::AppState;
use axum::extract::{Query, State};
use billboard_rs::api::folders::list::{Query as LFQuery, Response as LFResponse};

// -- list

impl_from_service_err!(LFResponse, Invalid => Invalid, NotFound => NotFound);
#[tracing::instrument(skip(state, _session))]
pub async fn list(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(query): Query<LFQuery>,
) -> Proxied<LFResponse> {
    let present = |v: Option<String>| v.filter(|v| !v.trim().is_empty());
    let (Some(year), Some(route)) = (present(query.year), present(query.route)) else {
        return Err(proxy_err(LFResponse::Invalid {
            reason: "both `year` and `route` are required".to_string(),
        }));
    };
    let folders = state
        .service()
        .folder_tree(&year, &route)
        .await
        .map_err(proxy_err)?;
    proxy_val(LFResponse::Ok { folders })
}
