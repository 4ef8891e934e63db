use super::{AdminSession, AuthError};
use crate::serve::AppState;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::RequestPartsExt;
use axum_extra::extract::CookieJar;
use axum_extra::typed_header::TypedHeaderRejectionReason;
use axum_extra::TypedHeader;
use billboard_rs::api::{SessionToken, SESSION_COOKIE};
use headers::authorization::Bearer;
use headers::Authorization;
use http::request::Parts;

/// The session token a request presents. A bearer token takes precedence over the cookie.
async fn presented_token(parts: &mut Parts) -> Result<Option<SessionToken>, AuthError> {
    let maybe_bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(x) => Some(x.0 .0.token().to_string()),
        Err(rejection) => match rejection.reason() {
            TypedHeaderRejectionReason::Missing => None,
            TypedHeaderRejectionReason::Error(e) => {
                tracing::warn!("failed to extract Authorization<Bearer>: {e:?}");
                return Err(AuthError::Unauthorized("malformed authorization header"));
            }
            _ => return Err(AuthError::Unauthorized("malformed authorization header")),
        },
    };
    let raw = match maybe_bearer {
        Some(bearer) => Some(bearer),
        None => {
            let jar = CookieJar::from_headers(&parts.headers);
            jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
        }
    };
    raw.map(|raw| {
        raw.parse::<SessionToken>().map_err(|e| {
            tracing::warn!("failed to decode session token: {e}");
            AuthError::Unauthorized("malformed session token")
        })
    })
    .transpose()
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = presented_token(parts).await? else {
            tracing::debug!("no session token present for request");
            return Err(AuthError::Unauthorized("no session"));
        };
        match state.service().live_session(token).await {
            Ok(Some(expires_at)) => Ok(AdminSession { token, expires_at }),
            Ok(None) => {
                tracing::warn!("rejected unknown or expired session {token}");
                Err(AuthError::Unauthorized("unknown or expired session"))
            }
            Err(e) => {
                tracing::error!("failed to look up session {token}: {e}");
                Err(AuthError::Service(e))
            }
        }
    }
}
