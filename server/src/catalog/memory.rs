use super::{Catalog, CatalogError};
use async_trait::async_trait;
use billboard_rs::api::{Image, RouteConfig, SessionToken};
use billboard_rs::paths;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// [`Catalog`] kept in process memory. Everything is lost when the process exits.
#[derive(Default)]
pub struct MemoryCatalog {
    configs: DashMap<String, RouteConfig>,
    /// Keyed by URL, which is unique.
    images: DashMap<String, Image>,
    admin_password_hash: RwLock<Option<String>>,
    sessions: DashMap<[u8; 32], (DateTime<Utc>, DateTime<Utc>)>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn route_config(&self, route: &str) -> Result<Option<RouteConfig>, CatalogError> {
        Ok(self.configs.get(route).map(|c| c.value().clone()))
    }

    async fn put_route_config(
        &self,
        route: &str,
        config: &RouteConfig,
    ) -> Result<(), CatalogError> {
        self.configs.insert(route.to_string(), config.clone());
        Ok(())
    }

    async fn images_within(&self, folder: &str) -> Result<Vec<Image>, CatalogError> {
        let mut images: Vec<Image> = self
            .images
            .iter()
            .filter(|entry| paths::is_within(&entry.folder, folder))
            .map(|entry| entry.value().clone())
            .collect();
        images.sort_by(|a, b| a.folder.cmp(&b.folder).then_with(|| a.name.cmp(&b.name)));
        Ok(images)
    }

    async fn image_by_id(&self, id: Uuid) -> Result<Option<Image>, CatalogError> {
        Ok(self
            .images
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.value().clone()))
    }

    async fn image_by_url(&self, url: &str) -> Result<Option<Image>, CatalogError> {
        Ok(self.images.get(url).map(|i| i.value().clone()))
    }

    async fn upsert_image(&self, image: &Image) -> Result<Image, CatalogError> {
        let mut entry = self
            .images
            .entry(image.url.clone())
            .or_insert_with(|| image.clone());
        let id = entry.id;
        *entry = Image {
            id,
            ..image.clone()
        };
        Ok(entry.value().clone())
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, CatalogError> {
        let mut removed = false;
        self.images.retain(|_, image| {
            let keep = image.id != id;
            removed |= !keep;
            keep
        });
        Ok(removed)
    }

    async fn admin_password_hash(&self) -> Result<Option<String>, CatalogError> {
        Ok(self.admin_password_hash.read().await.clone())
    }

    async fn set_admin_password_hash(&self, hash: &str) -> Result<(), CatalogError> {
        *self.admin_password_hash.write().await = Some(hash.to_string());
        Ok(())
    }

    async fn insert_session(
        &self,
        token: SessionToken,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        self.sessions.insert(token.0, (created_at, expires_at));
        Ok(())
    }

    async fn session_expiry(
        &self,
        token: SessionToken,
    ) -> Result<Option<DateTime<Utc>>, CatalogError> {
        Ok(self.sessions.get(&token.0).map(|s| s.1))
    }

    async fn delete_session(&self, token: SessionToken) -> Result<bool, CatalogError> {
        Ok(self.sessions.remove(&token.0).is_some())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, CatalogError> {
        let mut purged = 0;
        self.sessions.retain(|_, (_, expires_at)| {
            let live = *expires_at >= now;
            if !live {
                purged += 1;
            }
            live
        });
        Ok(purged)
    }
}
