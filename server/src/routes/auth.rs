use crate::auth::{AdminSession, AuthError};
use crate::impl_from_auth_err;
use crate::routes::proxy::{proxy_err, proxy_val, Proxied};
use crate::serve::AppState;
use crate::service::ServiceError;
use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use billboard_rs::api::auth::{
    check::Response as CResponse,
    login::{Request as LRequest, Response as LResponse},
    logout::Response as LOResponse,
};
use billboard_rs::api::SESSION_COOKIE;

fn session_cookie(state: &AppState, value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .path("/")
        .secure(state.config().service.secure_cookies)
        .max_age(max_age)
        .build()
}

// -- login

impl From<ServiceError> for LResponse {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::WrongPassword => LResponse::Unauthorized,
            e => {
                tracing::error!("login failed: {e}");
                LResponse::Internal
            }
        }
    }
}
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LRequest>,
) -> (CookieJar, Proxied<LResponse>) {
    match state.service().login(&request.password).await {
        Ok((token, expires_at)) => {
            let lifetime = state.service().config().session_lifetime;
            let max_age = time::Duration::try_from(lifetime).unwrap_or(time::Duration::MAX);
            let jar = jar.add(session_cookie(&state, token.encode_for_http(), max_age));
            (jar, proxy_val(LResponse::Ok { token, expires_at }))
        }
        Err(e) => (jar, Err(proxy_err(e))),
    }
}

// -- check

impl_from_auth_err!(CResponse, Internal => Internal, Unauthorized => Unauthorized);
#[tracing::instrument(skip_all)]
pub async fn check(session: Result<AdminSession, AuthError>) -> Proxied<CResponse> {
    let session = session.map_err(proxy_err)?;
    proxy_val(CResponse::Ok {
        expires_at: session.expires_at(),
    })
}

// -- logout

impl_from_auth_err!(LOResponse, Internal => Internal, Unauthorized => Unauthorized);
#[tracing::instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    session: Result<AdminSession, AuthError>,
) -> (CookieJar, Proxied<LOResponse>) {
    let removal = session_cookie(&state, String::new(), time::Duration::ZERO);
    let jar = jar.remove(removal);
    let session = match session {
        Ok(session) => session,
        Err(e) => return (jar, Err(proxy_err(e))),
    };
    match state.service().logout(session.token()).await {
        Ok(_) => {
            tracing::info!("admin session {} closed", session.token());
            (jar, proxy_val(LOResponse::Ok))
        }
        Err(e) => {
            tracing::error!("failed to close session {}: {e}", session.token());
            (jar, Err(proxy_err(AuthError::Service(e))))
        }
    }
}
