//! Traits shared between the billboard server and the types it serves.

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// A JSON response body that knows which HTTP status it should be sent with.
///
/// Usually implemented through `#[derive(HttpStatusCode)]` from `bb-server-macros`.
pub trait JsonProxiedStatus: Serialize + for<'de> Deserialize<'de> {
    fn status_code(&self) -> StatusCode;

    /// Whether this response reports success (any 2xx status).
    fn is_ok(&self) -> bool {
        self.status_code().is_success()
    }
}
