use crate::api::Slide;
use bb_server_macros::HttpStatusCode;
use serde::{Deserialize, Serialize};

/// What a display for one route should rotate through right now.
#[derive(Debug, Clone, HttpStatusCode, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    #[http(status = 200)]
    Ok {
        route: String,
        /// Seconds per image.
        duration: u32,
        slides: Vec<Slide>,
    },
    #[http(status = 400)]
    Invalid { reason: String },
    #[http(status = 500)]
    Internal,
}
