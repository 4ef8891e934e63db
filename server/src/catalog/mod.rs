//! Persistent state of the billboard: route configurations, image metadata, the admin password
//! and admin sessions.
//!
//! [`Catalog`] is implemented by [`pg::PgCatalog`] (PostgreSQL) and [`memory::MemoryCatalog`]
//! (process memory, for development and tests).

use async_trait::async_trait;
use billboard_rs::api::{Image, RouteConfig, SessionToken};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod pg;

/// Errors that may occur while talking to the catalog. A row that does not exist is not an
/// error; lookups return `Option` instead.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// An error occurred in the database.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A stored row violates an invariant the schema cannot express.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// The stored configuration of `route`, if it was ever saved.
    async fn route_config(&self, route: &str) -> Result<Option<RouteConfig>, CatalogError>;

    /// Insert or replace the configuration of `route`.
    async fn put_route_config(&self, route: &str, config: &RouteConfig)
        -> Result<(), CatalogError>;

    /// Images in `folder` or any folder below it, ordered by folder then name.
    async fn images_within(&self, folder: &str) -> Result<Vec<Image>, CatalogError>;

    async fn image_by_id(&self, id: Uuid) -> Result<Option<Image>, CatalogError>;

    async fn image_by_url(&self, url: &str) -> Result<Option<Image>, CatalogError>;

    /// Insert `image`, or, if an image with the same URL exists, overwrite everything but its ID.
    /// Returns the stored row.
    async fn upsert_image(&self, image: &Image) -> Result<Image, CatalogError>;

    /// Returns whether a row was deleted.
    async fn delete_image(&self, id: Uuid) -> Result<bool, CatalogError>;

    async fn admin_password_hash(&self) -> Result<Option<String>, CatalogError>;

    async fn set_admin_password_hash(&self, hash: &str) -> Result<(), CatalogError>;

    async fn insert_session(
        &self,
        token: SessionToken,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), CatalogError>;

    /// Expiry of the session identified by `token`, if it exists (expired or not).
    async fn session_expiry(
        &self,
        token: SessionToken,
    ) -> Result<Option<DateTime<Utc>>, CatalogError>;

    /// Returns whether a session was deleted.
    async fn delete_session(&self, token: SessionToken) -> Result<bool, CatalogError>;

    /// Drop every session that expired before `now`. Returns how many were dropped.
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, CatalogError>;
}

/// `LIKE` pattern matching every path strictly below `folder`.
pub(crate) fn descendants_pattern(folder: &str) -> String {
    let mut pattern = String::with_capacity(folder.len() + 2);
    for c in folder.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push_str("/%");
    pattern
}
