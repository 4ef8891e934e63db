use axum::extract;
use axum::response::{IntoResponse, Response};
pub use bb_server_traits::JsonProxiedStatus;
use std::fmt::{Debug, Formatter};

pub trait IntoProxiedResponse {
    fn into_proxied_response(self) -> Response;
}
impl<T: JsonProxiedStatus> IntoProxiedResponse for T {
    fn into_proxied_response(self) -> Response {
        let status_code = self.status_code();
        (status_code, extract::Json(self)).into_response()
    }
}

#[repr(transparent)]
pub struct ResponseProxy<R: IntoProxiedResponse>(R);
impl<T: IntoProxiedResponse> IntoResponse for ResponseProxy<T> {
    fn into_response(self) -> Response {
        self.0.into_proxied_response()
    }
}
impl<T: IntoProxiedResponse + Debug> Debug for ResponseProxy<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

pub fn proxy_err<E, T: IntoProxiedResponse + From<E>>(err: E) -> ResponseProxy<T> {
    ResponseProxy(T::from(err))
}

pub type Proxied<T> = Result<ResponseProxy<T>, ResponseProxy<T>>;
pub fn proxy_val<T: IntoProxiedResponse>(val: T) -> Proxied<T> {
    Ok(ResponseProxy(val))
}

/// Helper macro for adding a [`From`] impl for [`ServiceError`](crate::service::ServiceError)
/// to a response enum, which must have an `Internal` variant. Errors without a mapping are
/// logged and become `Internal`.
///
/// Syntax:
/// ```rs
/// impl_from_service_err!(MyResponseTy);
/// impl_from_service_err!(MyResponseTy, Invalid => Invalid);
/// impl_from_service_err!(MyResponseTy, Invalid => Invalid, NotFound => NotFound);
/// ```
/// `Invalid` maps onto a struct variant with a `reason: String` field.
#[macro_export]
macro_rules! impl_from_service_err {
    ($t:ident $(, Invalid => $invalid:ident)? $(, NotFound => $not_found:ident)? $(,)?) => {
        impl ::core::convert::From<$crate::service::ServiceError> for $t {
            fn from(value: $crate::service::ServiceError) -> Self {
                match value {
                    $($crate::service::ServiceError::Invalid(reason) => $t::$invalid { reason },)?
                    $(
                        $crate::service::ServiceError::NoSuchImage
                        | $crate::service::ServiceError::NoMediaRoot => $t::$not_found,
                    )?
                    e => {
                        ::tracing::error!("request failed: {e}");
                        $t::Internal
                    }
                }
            }
        }
    };
}
pub use impl_from_service_err;
