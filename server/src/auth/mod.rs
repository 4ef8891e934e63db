//! Per-request authentication.
//!
//! There is a single admin, identified by password. A successful login opens a session whose
//! token the client presents either as the `bb_session` cookie or as an
//! `Authorization: Bearer` header. Handlers that need an admin take an [`AdminSession`]; the
//! extractor for it lives in the `extract` module.

use crate::service::ServiceError;
use axum::response::{IntoResponse, Response};
use axum::Json;
use billboard_rs::api::SessionToken;
use chrono::{DateTime, Utc};
use http::StatusCode;
use thiserror::Error;

pub mod extract;
pub mod password;

/// Proof that the request carries a live admin session. Can only be obtained through the
/// extractor.
#[derive(Debug, Clone)]
pub struct AdminSession {
    token: SessionToken,
    expires_at: DateTime<Utc>,
}
impl AdminSession {
    pub fn token(&self) -> SessionToken {
        self.token
    }
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Things that may go wrong while establishing an [`AdminSession`].
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to look up session: {0}")]
    Service(#[from] ServiceError),
    #[error("not authorized: {0}")]
    Unauthorized(&'static str),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Unauthorized(_) => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "type": "unauthorized" })),
            )
                .into_response(),
            AuthError::Service(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "type": "internal" })),
            )
                .into_response(),
        }
    }
}

/// Helper macro for adding a [`From`] impl for [`AuthError`] to a given type.
///
/// Syntax:
/// ```rs
/// enum MyResponseTy {
///     Internal,
///     CustomUnauthorized,
/// }
/// impl_from_auth_err!(MyResponseTy, Internal => Internal, Unauthorized => CustomUnauthorized);
/// ```
#[macro_export]
macro_rules! impl_from_auth_err {
    ($t:ident, Internal => $internal:ident, Unauthorized => $unauth:ident) => {
        impl ::core::convert::From<$crate::auth::AuthError> for $t {
            fn from(value: $crate::auth::AuthError) -> Self {
                match value {
                    $crate::auth::AuthError::Service(_) => $t::$internal,
                    $crate::auth::AuthError::Unauthorized(_) => $t::$unauth,
                }
            }
        }
    };
}
pub use impl_from_auth_err;
