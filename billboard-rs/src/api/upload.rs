//! `POST /upload` takes a `multipart/form-data` body with the fields below, so there is no
//! request struct here.
//!
//!   - `file`: the media file (required)
//!   - `path`: destination path relative to the media root, including the file name (required)
//!   - `scheduled_at`, `expires_at`: optional, same formats as `images/meta`

use crate::api::Image;
use bb_server_macros::HttpStatusCode;
use serde::{Deserialize, Serialize};

pub const FIELD_FILE: &str = "file";
pub const FIELD_PATH: &str = "path";
pub const FIELD_SCHEDULED_AT: &str = "scheduled_at";
pub const FIELD_EXPIRES_AT: &str = "expires_at";

#[derive(Debug, Clone, HttpStatusCode, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    #[http(status = 200)]
    Ok { url: String, image: Image },
    #[http(status = 400)]
    Invalid { reason: String },
    #[http(status = 401)]
    Unauthorized,
    #[http(status = 413)]
    TooLarge,
    #[http(status = 500)]
    Internal,
}
