use anyhow::{bail, Context, Result};
use billboard_rs::api::auth::{
    check::Response as CheckResponse,
    login::{Request as LoginRequest, Response as LoginResponse},
    logout::Response as LogoutResponse,
};
use billboard_rs::api::config::{
    get::Response as GetConfigResponse,
    update::{Request as UpdateConfigRequest, Response as UpdateConfigResponse},
};
use billboard_rs::api::folders::list::Response as ListFoldersResponse;
use billboard_rs::api::images::{
    delete::Response as DeleteImageResponse, list::Response as ListImagesResponse,
    meta::Request as MetaRequest, meta::Response as MetaResponse,
};
use billboard_rs::api::upload::{self, Response as UploadResponse};
use billboard_rs::api::{FolderNode, Image, RouteConfig};
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;
use log::{debug, error, info};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use uuid::Uuid;

mod auth;
mod config;
mod view;

#[derive(Parser, Debug)]
#[command(
    name = "bb",
    version,
    author = "Billboard Project Developers <billboard@example.org>",
    about = "Billboard CLI",
    long_about = "A command-line interface for administering a Billboard digital-signage server and watching its displays."
)]
struct Cli {
    /// Sets a custom config file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<String>,

    /// Sets the API URL directly
    #[arg(short = 'u', long = "api-url", value_name = "URL")]
    api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open an admin session
    Login {
        /// Admin password; prompted for when absent
        #[arg(long, env = "BB_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Close the admin session
    Logout,
    /// Show whether the stored session is still valid
    Whoami,
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
    /// Show the folder tree of a year and route, marking enabled folders
    Folders {
        year: String,
        route: String,
    },
    /// Enable a folder for display on a route
    Enable {
        route: String,
        folder: String,
    },
    /// Stop displaying a folder on a route
    Disable {
        route: String,
        folder: String,
    },
    Images {
        #[command(subcommand)]
        images_command: ImagesCommands,
    },
    /// Rotate through a route's playlist in the terminal
    View {
        route: String,
        /// Show each slide once and exit
        #[arg(long)]
        once: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the configuration of a route
    Get { route: String },
    /// Replace the enabled folders (and optionally the slide duration) of a route
    Set {
        route: String,
        /// Seconds per image
        #[arg(long = "duration", value_name = "SECONDS")]
        duration: Option<u32>,
        /// Enabled folders, in display order
        folders: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ImagesCommands {
    /// List the images of a folder
    List {
        folder: String,
        /// Route whose enabled folders apply; inferred from the folder by default
        #[arg(long)]
        route: Option<String>,
        /// Everything in the folder, ignoring schedules and enabled folders (admin)
        #[arg(long)]
        all: bool,
    },
    /// Upload a file into a folder
    Upload {
        file: PathBuf,
        folder: String,
        /// Name to store the file under; defaults to the local file name
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "scheduled-at", value_name = "TIME")]
        scheduled_at: Option<String>,
        #[arg(long = "expires-at", value_name = "TIME")]
        expires_at: Option<String>,
    },
    /// Set when an image is shown
    Schedule {
        url: String,
        /// RFC 3339, or YYYY-MM-DDTHH:MM[:SS] in the server's time zone
        scheduled_at: String,
        #[arg(long = "expires-at", value_name = "TIME")]
        expires_at: Option<String>,
    },
    /// Delete an image and its file
    Delete { image_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        Builder::new().filter(None, LevelFilter::Debug).init();
    } else {
        Builder::new().filter(None, LevelFilter::Info).init();
    }

    // Determine config from CLI flags or XDG paths
    let config = match (cli.config.as_deref(), cli.api_url.as_deref()) {
        (Some(config_path), None) => config::load_config(Some(config_path))?,
        (None, Some(api_url)) => config::Config::with_url(api_url),
        (Some(config_path), Some(api_url)) => {
            let mut cfg = config::load_config(Some(config_path))?;
            cfg.api.url = api_url.to_string();
            cfg
        }
        (None, None) => config::load_config(None)?,
    };

    let client = Client::new();

    match cli.command {
        // bb login [--password ...]
        Commands::Login { password } => {
            let password = match password {
                Some(password) => password,
                None => rpassword::prompt_password("Admin password: ")?,
            };
            login(&client, &config, &password).await?;
        }
        // bb logout
        Commands::Logout => logout(&client, &config).await?,
        // bb whoami
        Commands::Whoami => whoami(&client, &config).await?,

        // bb config ...
        Commands::Config { config_command } => match config_command {
            // bb config get <ROUTE>
            ConfigCommands::Get { route } => {
                let config = get_config(&client, &config, &route).await?;
                print_config(&route, &config);
            }
            // bb config set <ROUTE> [--duration N] [FOLDERS...]
            ConfigCommands::Set {
                route,
                duration,
                folders,
            } => {
                info!("Updating configuration of route {route}");
                let stored = set_config(&client, &config, &route, duration, folders).await?;
                print_config(&route, &stored);
            }
        },

        // bb folders <YEAR> <ROUTE>
        Commands::Folders { year, route } => folders(&client, &config, &year, &route).await?,
        // bb enable <ROUTE> <FOLDER>
        Commands::Enable { route, folder } => {
            toggle_folder(&client, &config, &route, &folder, true).await?
        }
        // bb disable <ROUTE> <FOLDER>
        Commands::Disable { route, folder } => {
            toggle_folder(&client, &config, &route, &folder, false).await?
        }

        // bb images ...
        Commands::Images { images_command } => match images_command {
            ImagesCommands::List { folder, route, all } => {
                list_images(&client, &config, &folder, route.as_deref(), all).await?
            }
            ImagesCommands::Upload {
                file,
                folder,
                name,
                scheduled_at,
                expires_at,
            } => {
                upload_file(
                    &client,
                    &config,
                    &file,
                    &folder,
                    name.as_deref(),
                    scheduled_at,
                    expires_at,
                )
                .await?
            }
            ImagesCommands::Schedule {
                url,
                scheduled_at,
                expires_at,
            } => schedule(&client, &config, url, scheduled_at, expires_at).await?,
            ImagesCommands::Delete { image_id } => {
                let image_id = Uuid::parse_str(&image_id).context("Invalid image ID")?;
                delete_image(&client, &config, image_id).await?
            }
        },

        // bb view <ROUTE> [--once]
        Commands::View { route, once } => view::view(&client, &config, &route, once).await?,
    }

    Ok(())
}

/// Send `request` and decode the tagged JSON body, whatever the status code.
async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    debug!("response ({status}): {text}");
    serde_json::from_str(&text).with_context(|| format!("Unexpected response ({status}): {text}"))
}

fn authed(request: RequestBuilder) -> Result<RequestBuilder> {
    Ok(request.bearer_auth(auth::get_token()?))
}

async fn login(client: &Client, config: &config::Config, password: &str) -> Result<()> {
    debug!("Sending login request to url: {}", config.api.url);
    let request = client.post(config.api_url("auth/login")).json(&LoginRequest {
        password: password.to_string(),
    });
    match send(request).await? {
        LoginResponse::Ok { token, expires_at } => {
            auth::save_token(&token)?;
            println!("Login successful. Session expires at: {expires_at}");
        }
        LoginResponse::Unauthorized => bail!("Login failed: wrong password"),
        LoginResponse::Internal => bail!("Login failed: internal server error"),
    }
    Ok(())
}

async fn logout(client: &Client, config: &config::Config) -> Result<()> {
    let token = match auth::get_token() {
        Ok(token) => token,
        Err(_) => {
            println!("Not logged in.");
            return Ok(());
        }
    };
    let request = client.post(config.api_url("auth/logout")).bearer_auth(token);
    match send(request).await? {
        LogoutResponse::Ok | LogoutResponse::Unauthorized => {}
        LogoutResponse::Internal => error!("Server failed to close the session"),
    }
    auth::clear_token()?;
    println!("Logged out.");
    Ok(())
}

async fn whoami(client: &Client, config: &config::Config) -> Result<()> {
    let request = authed(client.get(config.api_url("auth/check")))?;
    match send(request).await? {
        CheckResponse::Ok { expires_at } => println!("Logged in as admin until {expires_at}"),
        CheckResponse::Unauthorized => println!("Session expired; run `bb login`"),
        CheckResponse::Internal => bail!("Failed to check session: internal server error"),
    }
    Ok(())
}

fn print_config(route: &str, config: &RouteConfig) {
    println!("Route: {route}");
    println!("  Duration: {}s", config.duration);
    println!("  Last updated: {}", config.last_updated);
    if config.selected_folders.is_empty() {
        println!("  Enabled folders: (none)");
    } else {
        println!("  Enabled folders:");
        for (index, folder) in config.selected_folders.iter().enumerate() {
            println!("    {}. {folder}", index + 1);
        }
    }
}

async fn get_config(client: &Client, config: &config::Config, route: &str) -> Result<RouteConfig> {
    let request = client.get(config.api_url("config")).query(&[("route", route)]);
    match send(request).await? {
        GetConfigResponse::Ok { config, .. } => Ok(config),
        GetConfigResponse::Invalid { reason } => bail!("Invalid request: {reason}"),
        GetConfigResponse::Internal => bail!("Failed to read configuration: internal server error"),
    }
}

async fn set_config(
    client: &Client,
    config: &config::Config,
    route: &str,
    duration: Option<u32>,
    selected_folders: Vec<String>,
) -> Result<RouteConfig> {
    let request = authed(client.post(config.api_url("config")))?.json(&UpdateConfigRequest {
        route: route.to_string(),
        duration,
        selected_folders,
    });
    match send(request).await? {
        UpdateConfigResponse::Ok { config } => Ok(config),
        UpdateConfigResponse::Invalid { reason } => bail!("Invalid configuration: {reason}"),
        UpdateConfigResponse::Unauthorized => bail!("Not logged in; run `bb login`"),
        UpdateConfigResponse::Internal => {
            bail!("Failed to store configuration: internal server error")
        }
    }
}

async fn toggle_folder(
    client: &Client,
    config: &config::Config,
    route: &str,
    folder: &str,
    enable: bool,
) -> Result<()> {
    let folder = billboard_rs::paths::normalize(folder)?;
    let current = get_config(client, config, route).await?;
    let mut folders = current.selected_folders;
    if enable {
        if !folders.contains(&folder) {
            folders.push(folder.clone());
        }
    } else {
        folders.retain(|f| *f != folder);
    }
    set_config(client, config, route, None, folders).await?;
    println!(
        "{folder} {} on {route}",
        if enable { "enabled" } else { "disabled" }
    );
    Ok(())
}

fn print_tree(nodes: &[FolderNode], enabled: &RouteConfig, depth: usize) {
    for node in nodes {
        let mark = if enabled.is_selected(&node.path) {
            "[x]"
        } else if node.is_leaf() {
            "[ ]"
        } else {
            "   "
        };
        println!("{mark} {}{}", "  ".repeat(depth), node.name);
        print_tree(&node.subfolders, enabled, depth + 1);
    }
}

async fn folders(client: &Client, config: &config::Config, year: &str, route: &str) -> Result<()> {
    let request = authed(client.get(config.api_url("folders")))?
        .query(&[("year", year), ("route", route)]);
    let tree = match send(request).await? {
        ListFoldersResponse::Ok { folders } => folders,
        ListFoldersResponse::Invalid { reason } => bail!("Invalid request: {reason}"),
        ListFoldersResponse::Unauthorized => bail!("Not logged in; run `bb login`"),
        ListFoldersResponse::NotFound => bail!("The server's media directory does not exist"),
        ListFoldersResponse::Internal => bail!("Failed to list folders: internal server error"),
    };
    if tree.is_empty() {
        println!("No folders for {year}/{route}.");
        return Ok(());
    }
    let enabled = get_config(client, config, route).await?;
    print_tree(&tree, &enabled, 0);
    Ok(())
}

fn print_image(image: &Image) {
    let expires = image
        .expires_at
        .map(|t| t.to_string())
        .unwrap_or_else(|| "never".to_string());
    println!(
        "{} {} (from {}, expires {expires})",
        image.id, image.url, image.scheduled_at
    );
}

async fn list_images(
    client: &Client,
    config: &config::Config,
    folder: &str,
    route: Option<&str>,
    all: bool,
) -> Result<()> {
    let mut request = client
        .get(config.api_url("images"))
        .query(&[("folder", folder)]);
    if let Some(route) = route {
        request = request.query(&[("route", route)]);
    }
    if all {
        request = authed(request)?.query(&[("all", "true")]);
    }
    match send(request).await? {
        ListImagesResponse::Ok { images } => {
            if images.is_empty() {
                println!("No images to show in {folder}.");
            }
            images.iter().for_each(print_image);
        }
        ListImagesResponse::Invalid { reason } => bail!("Invalid request: {reason}"),
        ListImagesResponse::Unauthorized => bail!("Not logged in; run `bb login`"),
        ListImagesResponse::Internal => bail!("Failed to list images: internal server error"),
    }
    Ok(())
}

async fn upload_file(
    client: &Client,
    config: &config::Config,
    file: &Path,
    folder: &str,
    name: Option<&str>,
    scheduled_at: Option<String>,
    expires_at: Option<String>,
) -> Result<()> {
    let name = match name {
        Some(name) => name.to_string(),
        None => file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("Cannot derive a file name from {:?}", file))?,
    };
    let contents = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {:?}", file))?;
    info!("Uploading {} bytes to {folder}/{name}", contents.len());

    let mut form = reqwest::multipart::Form::new()
        .text(upload::FIELD_PATH, format!("{folder}/{name}"))
        .part(
            upload::FIELD_FILE,
            reqwest::multipart::Part::bytes(contents).file_name(name),
        );
    if let Some(scheduled_at) = scheduled_at {
        form = form.text(upload::FIELD_SCHEDULED_AT, scheduled_at);
    }
    if let Some(expires_at) = expires_at {
        form = form.text(upload::FIELD_EXPIRES_AT, expires_at);
    }

    let request = authed(client.post(config.api_url("upload")))?.multipart(form);
    match send(request).await? {
        UploadResponse::Ok { image, .. } => {
            println!("Uploaded:");
            print_image(&image);
        }
        UploadResponse::Invalid { reason } => bail!("Upload rejected: {reason}"),
        UploadResponse::Unauthorized => bail!("Not logged in; run `bb login`"),
        UploadResponse::TooLarge => bail!("Upload rejected: file too large"),
        UploadResponse::Internal => bail!("Upload failed: internal server error"),
    }
    Ok(())
}

async fn schedule(
    client: &Client,
    config: &config::Config,
    url: String,
    scheduled_at: String,
    expires_at: Option<String>,
) -> Result<()> {
    let request = authed(client.post(config.api_url("images/meta")))?.json(&MetaRequest {
        url: Some(url),
        scheduled_at: Some(scheduled_at),
        expires_at,
    });
    match send(request).await? {
        MetaResponse::Ok { image } => print_image(&image),
        MetaResponse::Invalid { reason } => bail!("Invalid schedule: {reason}"),
        MetaResponse::Unauthorized => bail!("Not logged in; run `bb login`"),
        MetaResponse::Internal => bail!("Failed to schedule image: internal server error"),
    }
    Ok(())
}

async fn delete_image(client: &Client, config: &config::Config, image_id: Uuid) -> Result<()> {
    let request = authed(client.delete(config.api_url(&format!("images/{image_id}"))))?;
    match send(request).await? {
        DeleteImageResponse::Ok => println!("Deleted image {image_id}"),
        DeleteImageResponse::NotFound => bail!("No image with ID {image_id}"),
        DeleteImageResponse::Unauthorized => bail!("Not logged in; run `bb login`"),
        DeleteImageResponse::Internal => bail!("Failed to delete image: internal server error"),
    }
    Ok(())
}
