use crate::auth::password;
use crate::catalog::{Catalog, CatalogError};
use crate::config::ServiceConfig;
use crate::media::{MediaError, MediaStore};
use billboard_rs::api::{FolderNode, Image, RouteConfig, SessionToken, Slide, MAX_SLIDE_DURATION};
use billboard_rs::paths::{self, PathError};
use billboard_rs::util::chrono::{parse_optional_schedule_time, InvalidScheduleTime};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("media error: {0}")]
    Media(#[from] MediaError),
    #[error("password hashing failed: {0}")]
    PasswordHash(argon2::password_hash::Error),
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    /// The request is malformed; the message is safe to show to the client.
    #[error("{0}")]
    Invalid(String),
    #[error("wrong password")]
    WrongPassword,
    #[error("no such image")]
    NoSuchImage,
    #[error("media root does not exist")]
    NoMediaRoot,
}

impl From<PathError> for ServiceError {
    fn from(value: PathError) -> Self {
        Self::Invalid(value.to_string())
    }
}

impl From<InvalidScheduleTime> for ServiceError {
    fn from(value: InvalidScheduleTime) -> Self {
        Self::Invalid(value.to_string())
    }
}

pub struct Service {
    catalog: Arc<dyn Catalog>,
    media: MediaStore,
    config: ServiceConfig,
}

// -------------------------------------------------------------------------------------------------
// === GROUPING: ADMIN SESSIONS
// -------------------------------------------------------------------------------------------------

impl Service {
    pub fn new(catalog: Arc<dyn Catalog>, media: MediaStore, config: ServiceConfig) -> Self {
        Self {
            catalog,
            media,
            config,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn media(&self) -> &MediaStore {
        &self.media
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn session_lifetime(&self) -> TimeDelta {
        TimeDelta::from_std(self.config.session_lifetime).unwrap_or_else(|_| TimeDelta::weeks(52))
    }

    /// Store `password` as the admin password unless one is stored already.
    #[instrument(skip_all)]
    pub async fn bootstrap_admin(&self, password: Option<&str>) -> Result<(), ServiceError> {
        if self.catalog.admin_password_hash().await?.is_some() {
            return Ok(());
        }
        match password {
            Some(password) => {
                self.set_admin_password(password).await?;
                tracing::info!("stored admin password from configuration");
            }
            None => {
                tracing::warn!("no admin password stored or configured; admin login is disabled");
            }
        }
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn set_admin_password(&self, password: &str) -> Result<(), ServiceError> {
        if password.is_empty() {
            return Err(ServiceError::Invalid("password may not be empty".to_string()));
        }
        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await?
            .map_err(ServiceError::PasswordHash)?;
        self.catalog.set_admin_password_hash(&hash).await?;
        Ok(())
    }

    /// Open an admin session if `password` is right.
    #[instrument(skip_all)]
    pub async fn login(
        &self,
        password: &str,
    ) -> Result<(SessionToken, DateTime<Utc>), ServiceError> {
        let stored = self.catalog.admin_password_hash().await?;
        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || match stored {
            Some(hash) => password::verify_password(&password, &hash),
            None => {
                password::burn_verification(&password);
                Ok(false)
            }
        })
        .await?
        .map_err(ServiceError::PasswordHash)?;
        if !verified {
            tracing::info!("failed admin login attempt: wrong password");
            return Err(ServiceError::WrongPassword);
        }

        let now = Utc::now();
        let purged = self.catalog.purge_expired_sessions(now).await?;
        if purged > 0 {
            tracing::debug!("purged {purged} expired sessions");
        }

        let token = SessionToken(rand::random());
        let expires_at = now + self.session_lifetime();
        self.catalog.insert_session(token, now, expires_at).await?;
        tracing::info!("admin logged in, session {token} expires at {expires_at}");
        Ok((token, expires_at))
    }

    /// Expiry of the session `token`, if it exists and has not expired yet.
    pub async fn live_session(
        &self,
        token: SessionToken,
    ) -> Result<Option<DateTime<Utc>>, ServiceError> {
        Ok(self
            .catalog
            .session_expiry(token)
            .await?
            .filter(|expires_at| Utc::now() < *expires_at))
    }

    #[instrument(skip(self))]
    pub async fn logout(&self, token: SessionToken) -> Result<bool, ServiceError> {
        Ok(self.catalog.delete_session(token).await?)
    }
}

// -------------------------------------------------------------------------------------------------
// === GROUPING: ROUTE CONFIGURATION
// -------------------------------------------------------------------------------------------------

impl Service {
    fn check_route(route: &str) -> Result<(), ServiceError> {
        if paths::is_valid_route(route) {
            Ok(())
        } else {
            Err(ServiceError::Invalid(format!("invalid route `{route}`")))
        }
    }

    /// The stored configuration of `route`, or the defaults if none was ever saved.
    pub async fn route_config(&self, route: &str) -> Result<RouteConfig, ServiceError> {
        Self::check_route(route)?;
        Ok(self
            .catalog
            .route_config(route)
            .await?
            .unwrap_or_else(|| RouteConfig::unconfigured(Utc::now())))
    }

    /// Replace the enabled folders of `route` and, if given, its slide duration.
    #[instrument(skip(self))]
    pub async fn update_route_config(
        &self,
        route: &str,
        duration: Option<u32>,
        selected_folders: &[String],
    ) -> Result<RouteConfig, ServiceError> {
        Self::check_route(route)?;
        match duration {
            Some(0) => {
                return Err(ServiceError::Invalid(
                    "duration must be at least one second".to_string(),
                ))
            }
            Some(d) if d > MAX_SLIDE_DURATION => {
                return Err(ServiceError::Invalid(format!(
                    "duration may not exceed {MAX_SLIDE_DURATION} seconds"
                )))
            }
            _ => {}
        }

        let mut seen = HashSet::new();
        let mut folders = Vec::with_capacity(selected_folders.len());
        for folder in selected_folders {
            let folder = paths::normalize(folder)?;
            if seen.insert(folder.clone()) {
                folders.push(folder);
            }
        }

        let current = self.route_config(route).await?;
        let config = RouteConfig {
            duration: duration.unwrap_or(current.duration),
            selected_folders: folders,
            last_updated: Utc::now(),
        };
        self.catalog.put_route_config(route, &config).await?;
        tracing::info!(
            "route {route}: duration {}s, {} folders enabled",
            config.duration,
            config.selected_folders.len()
        );
        Ok(config)
    }
}

// -------------------------------------------------------------------------------------------------
// === GROUPING: FOLDERS & IMAGES
// -------------------------------------------------------------------------------------------------

/// Whether an image in `image_folder` is shown when listing `folder` for a route configured as
/// `config`: it must sit in `folder` itself, or in a descendant reached only through enabled
/// folders.
fn reachable_through_selected(image_folder: &str, folder: &str, config: &RouteConfig) -> bool {
    if image_folder == folder {
        return true;
    }
    let Some(rest) = image_folder
        .strip_prefix(folder)
        .and_then(|r| r.strip_prefix('/'))
    else {
        return false;
    };
    let mut current = folder.to_string();
    for segment in rest.split('/') {
        current.push('/');
        current.push_str(segment);
        if !config.is_selected(&current) {
            return false;
        }
    }
    true
}

impl Service {
    pub async fn folder_tree(&self, year: &str, route: &str) -> Result<Vec<FolderNode>, ServiceError> {
        match self.media.folder_tree(year, route).await {
            Ok(tree) => Ok(tree),
            Err(MediaError::RootMissing(root)) => {
                tracing::warn!("media root {} does not exist", root.display());
                Err(ServiceError::NoMediaRoot)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Images of `folder` for display on `route` (inferred from `folder` when `None`).
    ///
    /// With `all`, every image in `folder` and below, regardless of schedule or enabled folders.
    #[instrument(skip(self))]
    pub async fn list_images(
        &self,
        folder: &str,
        route: Option<&str>,
        all: bool,
    ) -> Result<Vec<Image>, ServiceError> {
        let folder = paths::normalize(folder)?;
        if all {
            return Ok(self.catalog.images_within(&folder).await?);
        }

        let route = match route {
            Some(route) => route.to_string(),
            None => paths::infer_route(&folder, &self.config.routes)
                .ok_or_else(|| {
                    ServiceError::Invalid(format!(
                        "cannot infer route from folder `{folder}`; pass `route`"
                    ))
                })?
                .to_string(),
        };
        let config = self.route_config(&route).await?;
        if !config.is_selected(&folder) {
            tracing::debug!("folder {folder} is not enabled for route {route}");
            return Ok(Vec::new());
        }

        let now = Utc::now();
        Ok(self
            .catalog
            .images_within(&folder)
            .await?
            .into_iter()
            .filter(|image| reachable_through_selected(&image.folder, &folder, &config))
            .filter(|image| image.is_visible_at(now))
            .collect())
    }

    /// Store an uploaded file at `path` and record it. Uploading to a path that is already taken
    /// replaces the file; the image keeps its ID, and its schedule unless a new one is given.
    #[instrument(skip(self, contents), fields(bytes = contents.len()))]
    pub async fn upload(
        &self,
        path: &str,
        contents: &[u8],
        scheduled_at: Option<DateTime<Utc>>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Image, ServiceError> {
        let path = paths::normalize(path)?;
        let (folder, name) = paths::split_file(&path).ok_or_else(|| {
            ServiceError::Invalid("uploads must go into a folder".to_string())
        })?;
        if paths::media_kind(name).is_none() {
            return Err(ServiceError::Invalid(format!(
                "unsupported file type `{name}`; allowed: {}, {}",
                paths::IMAGE_EXTENSIONS.join(", "),
                paths::VIDEO_EXTENSIONS.join(", ")
            )));
        }
        let url = self.media.url_for(&path);
        let existing = self.catalog.image_by_url(&url).await?;
        let schedule_given = scheduled_at.is_some() || expires_at.is_some();
        let scheduled_at = scheduled_at
            .or(existing.as_ref().map(|i| i.scheduled_at))
            .unwrap_or_else(Utc::now);
        let expires_at = if schedule_given {
            expires_at
        } else {
            existing.as_ref().and_then(|i| i.expires_at)
        };
        if let Some(expires_at) = expires_at {
            check_window(scheduled_at, expires_at)?;
        }

        self.media.write(&path, contents).await?;
        let length_ms = self.probe_length_ms(&path).await;

        let image = Image {
            id: existing.as_ref().map_or_else(Uuid::new_v4, |i| i.id),
            name: name.to_string(),
            folder: folder.to_string(),
            scheduled_at,
            expires_at,
            length_ms,
            url,
        };
        let image = self.catalog.upsert_image(&image).await?;
        tracing::info!("stored {} ({})", image.url, image.id);
        Ok(image)
    }

    /// Set the schedule of the image at `url`, creating its record if it has none yet.
    #[instrument(skip(self))]
    pub async fn upsert_meta(
        &self,
        url: Option<&str>,
        scheduled_at: Option<&str>,
        expires_at: Option<&str>,
    ) -> Result<Image, ServiceError> {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ServiceError::Invalid("missing url".to_string()))?;
        let scheduled_at = parse_optional_schedule_time(scheduled_at)?
            .ok_or_else(|| ServiceError::Invalid("missing scheduled_at".to_string()))?;
        let expires_at = parse_optional_schedule_time(expires_at)?;
        if let Some(expires_at) = expires_at {
            check_window(scheduled_at, expires_at)?;
        }

        let path = self.media.path_of_url(url).ok_or_else(|| {
            ServiceError::Invalid(format!(
                "url must point below {}",
                self.media.public_prefix()
            ))
        })?;
        let (folder, name) = paths::split_file(&path)
            .ok_or_else(|| ServiceError::Invalid("url does not name a file in a folder".into()))?;
        let url = self.media.url_for(&path);
        let (id, length_ms) = match self.catalog.image_by_url(&url).await? {
            Some(existing) => (existing.id, existing.length_ms),
            None => (Uuid::new_v4(), self.probe_length_ms(&path).await),
        };

        Ok(self
            .catalog
            .upsert_image(&Image {
                id,
                url,
                name: name.to_string(),
                folder: folder.to_string(),
                scheduled_at,
                expires_at,
                length_ms,
            })
            .await?)
    }

    async fn probe_length_ms(&self, path: &str) -> Option<u64> {
        let length = self.media.video_length(path).await?;
        Some(u64::try_from(length.as_millis()).unwrap_or(u64::MAX))
    }

    /// Remove an image: first its file (which may already be gone), then its record.
    #[instrument(skip(self))]
    pub async fn delete_image(&self, id: Uuid) -> Result<Image, ServiceError> {
        let image = self
            .catalog
            .image_by_id(id)
            .await?
            .ok_or(ServiceError::NoSuchImage)?;
        match self.media.path_of_url(&image.url) {
            Some(path) => {
                if !self.media.remove(&path).await? {
                    tracing::warn!("file for {} was already gone", image.url);
                }
            }
            None => tracing::warn!("image {} has a URL outside the media tree", image.url),
        }
        if !self.catalog.delete_image(id).await? {
            return Err(ServiceError::NoSuchImage);
        }
        tracing::info!("deleted {} ({id})", image.url);
        Ok(image)
    }
}

fn check_window(scheduled_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Result<(), ServiceError> {
    if expires_at <= scheduled_at {
        Err(ServiceError::Invalid(
            "expires_at must be after scheduled_at".to_string(),
        ))
    } else {
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
// === GROUPING: PLAYLIST
// -------------------------------------------------------------------------------------------------

impl Service {
    /// Slide duration and currently visible slides of `route`: every enabled folder in order,
    /// each folder's own images by name.
    #[instrument(skip(self))]
    pub async fn playlist(&self, route: &str) -> Result<(u32, Vec<Slide>), ServiceError> {
        let config = self.route_config(route).await?;
        let now = Utc::now();
        let mut seen = HashSet::new();
        let mut slides = Vec::new();
        for folder in &config.selected_folders {
            for image in self.catalog.images_within(folder).await? {
                if image.folder != *folder || !image.is_visible_at(now) {
                    continue;
                }
                let Some(kind) = paths::media_kind(&image.name) else {
                    continue;
                };
                if seen.insert(image.id) {
                    slides.push(Slide {
                        id: image.id,
                        url: image.url,
                        name: image.name,
                        kind,
                        length_ms: image.length_ms,
                    });
                }
            }
        }
        Ok((config.duration, slides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(folders: &[&str]) -> RouteConfig {
        RouteConfig {
            duration: 20,
            selected_folders: folders.iter().map(|f| f.to_string()).collect(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn descendants_need_an_enabled_chain() {
        let cfg = config(&["2025/internal", "2025/internal/March"]);
        assert!(reachable_through_selected("2025/internal", "2025/internal", &cfg));
        assert!(reachable_through_selected(
            "2025/internal/March",
            "2025/internal",
            &cfg
        ));
        assert!(!reachable_through_selected(
            "2025/internal/April",
            "2025/internal",
            &cfg
        ));
        assert!(!reachable_through_selected(
            "2025/internal/April/week1",
            "2025/internal",
            &config(&["2025/internal", "2025/internal/April/week1"])
        ));
        assert!(!reachable_through_selected(
            "2025/internals",
            "2025/internal",
            &cfg
        ));
    }
}
