//! Types exchanged over the billboard HTTP API (`/api/v1`).
//!
//! Each endpoint has its own submodule holding its request/query type and a response enum. Every
//! response enum is internally tagged with `"type"` and derives
//! [`HttpStatusCode`](bb_server_macros::HttpStatusCode), so a variant determines the status code
//! it is sent with.

pub mod auth;
pub mod config;
pub mod folders;
pub mod images;
pub mod playlist;
pub mod upload;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};
use std::fmt::{Display, Formatter};
use subtle::{Choice, ConstantTimeEq};
use uuid::Uuid;

/// Duration (in seconds) a slide is shown when a route has no stored configuration.
pub const DEFAULT_SLIDE_DURATION: u32 = 20;

/// Longest slide duration a route can be configured with, in seconds.
pub const MAX_SLIDE_DURATION: u32 = i32::MAX as u32;

/// Name of the cookie carrying an admin session.
pub const SESSION_COOKIE: &str = "bb_session";

/// Secret identifying an admin session. Sent as a cookie by browsers and as an
/// `Authorization: Bearer` token by the CLI.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Eq, Copy, Clone)]
pub struct SessionToken(#[serde_as(as = "Base64")] pub [u8; 32]);
impl SessionToken {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn encode_for_http(self) -> String {
        BASE64_STANDARD.encode(self.0)
    }
}
impl ConstantTimeEq for SessionToken {
    fn ct_eq(&self, other: &Self) -> Choice {
        ConstantTimeEq::ct_eq(&self.0[..], &other.0[..])
    }
}
impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}
impl Display for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Only a prefix, these end up in logs.
        let encoded = BASE64_STANDARD.encode(self.0);
        write!(f, "{}…", &encoded[..8])
    }
}
impl TryFrom<&[u8]> for SessionToken {
    type Error = InvalidSessionToken;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self(value.try_into().map_err(|_| InvalidSessionToken)?))
    }
}
impl std::str::FromStr for SessionToken {
    type Err = InvalidSessionToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = BASE64_STANDARD
            .decode(s.trim())
            .map_err(|_| InvalidSessionToken)?;
        Self::try_from(bytes.as_slice())
    }
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("malformed session token")]
pub struct InvalidSessionToken;

/// Per-route display configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Seconds each image stays on screen.
    pub duration: u32,
    /// Enabled folders, in display order.
    pub selected_folders: Vec<String>,
    pub last_updated: DateTime<Utc>,
}
impl RouteConfig {
    /// Configuration reported for a route that was never saved.
    pub fn unconfigured(now: DateTime<Utc>) -> Self {
        Self {
            duration: DEFAULT_SLIDE_DURATION,
            selected_folders: Vec::new(),
            last_updated: now,
        }
    }

    pub fn is_selected(&self, folder: &str) -> bool {
        self.selected_folders.iter().any(|f| f == folder)
    }
}

/// A stored media file and its display schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    /// Public URL, unique across all images.
    pub url: String,
    /// File name (last URL segment).
    pub name: String,
    /// Folder path relative to the media root.
    pub folder: String,
    pub scheduled_at: DateTime<Utc>,
    /// `None` means the image never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Playing length of a video in milliseconds, when it could be determined.
    #[serde(default)]
    pub length_ms: Option<u64>,
}
impl Image {
    /// Whether the image should be on screen at `now`: `scheduled_at <= now < expires_at`.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_at <= now && self.expires_at.map_or(true, |expires| now < expires)
    }
}

/// A directory under the media root, with the subdirectories that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    pub name: String,
    /// Path relative to the media root.
    pub path: String,
    pub subfolders: Vec<FolderNode>,
}
impl FolderNode {
    /// Only leaf folders can be enabled for display.
    pub fn is_leaf(&self) -> bool {
        self.subfolders.is_empty()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// One entry of a route's playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub id: Uuid,
    pub url: String,
    pub name: String,
    pub kind: MediaKind,
    /// Playing length of a video in milliseconds. Absent for images and unprobed videos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_ms: Option<u64>,
}
