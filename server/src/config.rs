use miette::{IntoDiagnostic, WrapErr};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use xdg::BaseDirectories;

#[derive(Debug, Clone, Deserialize)]
pub struct BillboardConfig {
    /// Where route configuration, image metadata and sessions are kept.
    pub database: DatabaseConfig,
    /// Configuration of the HTTP server.
    pub server: ServerConfig,
    /// Where media files live and how they are exposed.
    pub media: MediaConfig,
    /// Behaviour of the billboard service.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Admin account bootstrap.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Configuration of billboard logging.
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum DatabaseConfig {
    /// PostgreSQL, the only persistent backend.
    Postgres(PostgresConfig),
    /// Keep everything in process memory. Nothing survives a restart; meant for development.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    /// IP address of database server, OR path to Unix socket.
    ///
    /// **NOTE**: if this is a path to a unix socket, `port` MUST be set to `None`.
    pub host: String,
    /// Port of the database server, or `None` if using a Unix socket.
    pub port: Option<u16>,
    /// Name of the database to connect to.
    pub database: String,
    /// Name of the user to connect with.
    pub user: String,
    /// Authentication credentials, if necessary.
    pub auth: Option<DatabaseCredentials>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseCredentials {
    /// Use a password to connect to the database.
    Password(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind to.
    pub bind_address: SocketAddr,
    /// Optional TLS mode for testing only.
    pub testing_only_tls_config: Option<TestingOnlyTlsConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestingOnlyTlsConfig {
    /// Public key (for TLS).
    pub cert: PathBuf,
    /// Private key (for TLS).
    pub key: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory holding the media tree (`<year>/<route>/<folder>/...` by convention).
    pub root: PathBuf,
    /// URL path under which the media tree is served.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Largest accepted request body, which bounds uploads.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_public_prefix() -> String {
    "/media".to_string()
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Lifetime of an admin session.
    #[serde(with = "humantime_serde", default = "default_session_lifetime")]
    pub session_lifetime: Duration,
    /// Route names recognised when a route has to be inferred from a folder path.
    #[serde(default = "default_routes")]
    pub routes: Vec<String>,
    /// Mark the session cookie `Secure`. Enable whenever the server sits behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            session_lifetime: default_session_lifetime(),
            routes: default_routes(),
            secure_cookies: false,
        }
    }
}

fn default_session_lifetime() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_routes() -> Vec<String> {
    ["internal", "external", "public"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Password stored for the admin on first start, when no admin exists yet.
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info,tower_http=debug".to_string(),
        }
    }
}

/// Load the billboard configuration.
///
/// Reads `path` if given and present, otherwise `billboard/config.toml` from the XDG config
/// directories, then applies `BB_`-prefixed environment overrides (`BB_MEDIA__ROOT=...`).
pub fn load_configuration(path: Option<&Path>) -> miette::Result<BillboardConfig> {
    let path = path
        .and_then(|p| {
            if p.exists() {
                Some(p.to_path_buf())
            } else {
                tracing::warn!(
                    "Specified configuration file '{}' does not exist",
                    p.display()
                );
                None
            }
        })
        .ok_or(())
        .or_else(|()| {
            tracing::warn!("Searching for billboard/config.toml in XDG configuration directories.");
            BaseDirectories::with_prefix("billboard")
                .into_diagnostic()?
                .find_config_file("config.toml")
                .ok_or(miette::miette!(
                    "couldn't find path to 'config.toml' in XDG config dirs"
                ))
        })?;

    use figment::providers::{self, Format};
    extract(
        figment::Figment::new()
            .merge(providers::Toml::file(&path))
            .merge(providers::Env::prefixed("BB_").split("__")),
    )
}

/// Extract and check a configuration from an assembled figment.
pub fn extract(figment: figment::Figment) -> miette::Result<BillboardConfig> {
    let config: BillboardConfig = figment
        .extract()
        .into_diagnostic()
        .wrap_err("Failed to extract billboard configuration")?;
    if config.service.session_lifetime.is_zero() {
        miette::bail!("service.session_lifetime must be greater than zero");
    }
    if let Some(route) = config
        .service
        .routes
        .iter()
        .find(|r| !billboard_rs::paths::is_valid_route(r))
    {
        miette::bail!("service.routes: invalid route name `{route}`");
    }
    Ok(config)
}
