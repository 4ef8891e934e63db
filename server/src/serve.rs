use crate::catalog::memory::MemoryCatalog;
use crate::catalog::pg::{pg_pool_from_config, PgCatalog};
use crate::catalog::Catalog;
use crate::config::{BillboardConfig, DatabaseConfig};
use crate::media::MediaStore;
use crate::service::Service;
use miette::{IntoDiagnostic, WrapErr};
use std::net::SocketAddr;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub struct AppStateInner {
    config: BillboardConfig,
    service: Arc<Service>,
}
impl AppStateInner {
    pub fn config(&self) -> &BillboardConfig {
        &self.config
    }
    pub fn service(&self) -> &Arc<Service> {
        &self.service
    }
}

#[derive(Clone)]
pub struct AppState(Arc<AppStateInner>);
impl AppState {
    pub fn new(config: BillboardConfig, service: Arc<Service>) -> Self {
        Self(Arc::new(AppStateInner { config, service }))
    }
}
impl Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(clap::Args, Debug)]
pub struct ServeCommand {
    #[arg(short = 'c', long = "config", env = "BB_CFG_FILE")]
    config: Option<PathBuf>,
}

/// Install the global `tracing` subscriber. `RUST_LOG` wins over the configured filter.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // Note: this is DIFFERENT from `tracing_subscriber::fmt().init()`
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Open the configured catalog, migrating the database if there is one.
pub async fn catalog_from_config(config: &DatabaseConfig) -> miette::Result<Arc<dyn Catalog>> {
    match config {
        DatabaseConfig::Postgres(pg_config) => {
            let pg_pool = pg_pool_from_config(pg_config)
                .await
                .into_diagnostic()
                .wrap_err("failed to connect to database")?;
            let catalog = PgCatalog::new(pg_pool)
                .await
                .into_diagnostic()
                .wrap_err("failed to migrate database")?;
            Ok(Arc::new(catalog))
        }
        DatabaseConfig::Memory => {
            tracing::warn!("using the in-memory catalog; nothing will survive a restart");
            Ok(Arc::new(MemoryCatalog::new()))
        }
    }
}

/// Assemble the service described by `config` on top of `catalog`.
pub fn service_from_config(config: &BillboardConfig, catalog: Arc<dyn Catalog>) -> Arc<Service> {
    let media = MediaStore::new(&config.media.root, &config.media.public_prefix);
    Arc::new(Service::new(catalog, media, config.service.clone()))
}

pub async fn serve(serve_command: ServeCommand) -> miette::Result<()> {
    let config = super::config::load_configuration(serve_command.config.as_deref())?;

    init_tracing(&config.log.filter);

    if !config.media.root.is_dir() {
        tracing::warn!(
            "media root {} does not exist yet; it will be created on the first upload",
            config.media.root.display()
        );
    }

    let catalog = catalog_from_config(&config.database).await?;
    let service = service_from_config(&config, catalog);
    service
        .bootstrap_admin(config.admin.password.as_deref())
        .await
        .into_diagnostic()
        .wrap_err("failed to bootstrap admin account")?;

    let bind_address = config.server.bind_address;
    let tls_config = config.server.testing_only_tls_config.clone();

    let app_state = AppState::new(config, service);
    let router = super::routes::build_router(app_state);

    enum Server {
        PlainHttp(axum_server::Server),
        Tls(axum_server::Server<axum_server::tls_rustls::RustlsAcceptor>),
    }

    let server = match tls_config {
        None => Server::PlainHttp(axum_server::bind(bind_address)),
        Some(tls) => {
            let rustls_config =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                    .await
                    .into_diagnostic()
                    .wrap_err("Failed to load RusTls configuration for public server")?;
            let server = axum_server::bind_rustls(bind_address, rustls_config);

            tracing::warn!(
                "-- WARNING -- DEVELOPMENT-ONLY TLS MODE IS ENABLED. PLEASE DO NOT USE THIS IN PRODUCTION."
            );

            Server::Tls(server)
        }
    };
    tracing::info!("Bound server to {bind_address}");

    match server {
        Server::PlainHttp(server) => {
            server
                .serve(router.into_make_service_with_connect_info::<SocketAddr>())
                .await
        }
        Server::Tls(server) => {
            server
                .serve(router.into_make_service_with_connect_info::<SocketAddr>())
                .await
        }
    }
    .into_diagnostic()
    .wrap_err("(server exited)")
}
