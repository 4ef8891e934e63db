use super::{descendants_pattern, Catalog, CatalogError};
use crate::config::{DatabaseCredentials, PostgresConfig};
use async_trait::async_trait;
use billboard_rs::api::{Image, RouteConfig, SessionToken};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgConnectOptions;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn pg_pool_from_config(db_config: &PostgresConfig) -> Result<PgPool, sqlx::Error> {
    // TODO: .ssl_mode(PgSslMode::VerifyFull)
    let pg_options = PgConnectOptions::new()
        .host(&db_config.host)
        .database(&db_config.database)
        .username(&db_config.user);
    let pg_options = match db_config.port {
        None => pg_options,
        Some(port) => pg_options.port(port),
    };
    let pg_options = match &db_config.auth {
        None => pg_options,
        Some(DatabaseCredentials::Password(password)) => pg_options.password(password),
    };
    PgPool::connect_with(pg_options).await
}

#[derive(Debug, sqlx::FromRow)]
struct SqlRouteConfig {
    duration: i32,
    selected_folders: Vec<String>,
    last_updated: DateTime<Utc>,
}

impl TryFrom<SqlRouteConfig> for RouteConfig {
    type Error = CatalogError;

    fn try_from(row: SqlRouteConfig) -> Result<Self, Self::Error> {
        let duration = u32::try_from(row.duration)
            .map_err(|_| CatalogError::Corrupt(format!("negative duration {}", row.duration)))?;
        Ok(RouteConfig {
            duration,
            selected_folders: row.selected_folders,
            last_updated: row.last_updated,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqlImage {
    id: Uuid,
    url: String,
    name: String,
    folder: String,
    scheduled_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    length_ms: Option<i64>,
}

impl From<SqlImage> for Image {
    fn from(row: SqlImage) -> Self {
        Image {
            id: row.id,
            url: row.url,
            name: row.name,
            folder: row.folder,
            scheduled_at: row.scheduled_at,
            expires_at: row.expires_at,
            length_ms: row.length_ms.and_then(|ms| u64::try_from(ms).ok()),
        }
    }
}

/// [`Catalog`] backed by PostgreSQL.
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Wrap `pool`, applying any pending migrations first.
    pub async fn new(pool: PgPool) -> Result<Self, sqlx::migrate::MigrateError> {
        // The migrations are embedded in this binary from ./migrations (relative to this crate).
        sqlx::migrate!().run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn route_config(&self, route: &str) -> Result<Option<RouteConfig>, CatalogError> {
        sqlx::query_as::<_, SqlRouteConfig>(
            r#"select duration, selected_folders, last_updated
               from billboard.route_configs where route = $1 limit 1;"#,
        )
        .bind(route)
        .fetch_optional(&self.pool)
        .await?
        .map(RouteConfig::try_from)
        .transpose()
    }

    async fn put_route_config(
        &self,
        route: &str,
        config: &RouteConfig,
    ) -> Result<(), CatalogError> {
        let duration = i32::try_from(config.duration)
            .map_err(|_| CatalogError::Corrupt(format!("duration {} too large", config.duration)))?;
        sqlx::query(
            r#"
            insert into billboard.route_configs (route, duration, selected_folders, last_updated)
            values ($1, $2, $3, $4)
            on conflict (route) do update
                set duration = excluded.duration,
                    selected_folders = excluded.selected_folders,
                    last_updated = excluded.last_updated;
            "#,
        )
        .bind(route)
        .bind(duration)
        .bind(config.selected_folders.as_slice())
        .bind(config.last_updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn images_within(&self, folder: &str) -> Result<Vec<Image>, CatalogError> {
        let rows = sqlx::query_as::<_, SqlImage>(
            r#"select id, url, name, folder, scheduled_at, expires_at, length_ms
               from billboard.images
               where folder = $1 or folder like $2 escape '\'
               order by folder collate "C", name collate "C";"#,
        )
        .bind(folder)
        .bind(descendants_pattern(folder))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Image::from).collect())
    }

    async fn image_by_id(&self, id: Uuid) -> Result<Option<Image>, CatalogError> {
        Ok(sqlx::query_as::<_, SqlImage>(
            r#"select id, url, name, folder, scheduled_at, expires_at, length_ms
               from billboard.images where id = $1 limit 1;"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Image::from))
    }

    async fn image_by_url(&self, url: &str) -> Result<Option<Image>, CatalogError> {
        Ok(sqlx::query_as::<_, SqlImage>(
            r#"select id, url, name, folder, scheduled_at, expires_at, length_ms
               from billboard.images where url = $1 limit 1;"#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?
        .map(Image::from))
    }

    async fn upsert_image(&self, image: &Image) -> Result<Image, CatalogError> {
        Ok(sqlx::query_as::<_, SqlImage>(
            r#"
            insert into billboard.images
                (id, url, name, folder, scheduled_at, expires_at, length_ms)
            values ($1, $2, $3, $4, $5, $6, $7)
            on conflict (url) do update
                set name = excluded.name,
                    folder = excluded.folder,
                    scheduled_at = excluded.scheduled_at,
                    expires_at = excluded.expires_at,
                    length_ms = excluded.length_ms
            returning id, url, name, folder, scheduled_at, expires_at, length_ms;
            "#,
        )
        .bind(image.id)
        .bind(&image.url)
        .bind(&image.name)
        .bind(&image.folder)
        .bind(image.scheduled_at)
        .bind(image.expires_at)
        .bind(image.length_ms.map(|ms| i64::try_from(ms).unwrap_or(i64::MAX)))
        .fetch_one(&self.pool)
        .await?
        .into())
    }

    async fn delete_image(&self, id: Uuid) -> Result<bool, CatalogError> {
        let result = sqlx::query("delete from billboard.images where id = $1;")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn admin_password_hash(&self) -> Result<Option<String>, CatalogError> {
        Ok(
            sqlx::query_scalar::<_, String>("select password_hash from billboard.admin limit 1;")
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn set_admin_password_hash(&self, hash: &str) -> Result<(), CatalogError> {
        sqlx::query(
            r#"
            insert into billboard.admin (singleton, password_hash) values (true, $1)
            on conflict (singleton) do update set password_hash = excluded.password_hash;
            "#,
        )
        .bind(hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_session(
        &self,
        token: SessionToken,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), CatalogError> {
        sqlx::query("insert into billboard.sessions values ($1, $2, $3);")
            .bind(token.as_bytes())
            .bind(created_at)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn session_expiry(
        &self,
        token: SessionToken,
    ) -> Result<Option<DateTime<Utc>>, CatalogError> {
        Ok(sqlx::query_scalar::<_, DateTime<Utc>>(
            "select expires_at from billboard.sessions where token = $1 limit 1;",
        )
        .bind(token.as_bytes())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_session(&self, token: SessionToken) -> Result<bool, CatalogError> {
        let result = sqlx::query("delete from billboard.sessions where token = $1;")
            .bind(token.as_bytes())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, CatalogError> {
        let result = sqlx::query("delete from billboard.sessions where expires_at < $1;")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
