use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use xdg::BaseDirectories;

const CONFIG_FILE: &str = "cli.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: Api,
    #[serde(default)]
    pub viewer: Viewer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    /// Base URL of the billboard server, without the `/api/v1` suffix.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Viewer {
    /// How often `bb view` re-fetches the playlist.
    #[serde(with = "humantime_serde", default = "default_refresh")]
    pub refresh: Duration,
}

impl Default for Viewer {
    fn default() -> Self {
        Self {
            refresh: default_refresh(),
        }
    }
}

fn default_refresh() -> Duration {
    Duration::from_secs(60)
}

impl Config {
    pub fn with_url(url: &str) -> Self {
        Self {
            api: Api {
                url: url.to_string(),
            },
            viewer: Viewer::default(),
        }
    }

    pub fn api_url(&self, endpoint: &str) -> String {
        format!("{}/api/v1/{endpoint}", self.api.url.trim_end_matches('/'))
    }
}

/// Read `path`, or `billboard/cli.toml` from the XDG config directories.
pub fn load_config(path: Option<&str>) -> Result<Config> {
    let path = match path {
        Some(path) => PathBuf::from(path),
        None => BaseDirectories::with_prefix("billboard")
            .context("Failed to initialize XDG base directories")?
            .find_config_file(CONFIG_FILE)
            .with_context(|| {
                format!("No {CONFIG_FILE} found in XDG config dirs; pass --config or --api-url")
            })?,
    };
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    parse_config(&contents).with_context(|| format!("Failed to parse config file {:?}", path))
}

fn parse_config(contents: &str) -> Result<Config> {
    Ok(toml::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_defaults_to_a_minute() {
        let config = parse_config("[api]\nurl = \"http://localhost:8080\"\n").unwrap();
        assert_eq!(config.viewer.refresh, Duration::from_secs(60));
        assert_eq!(
            config.api_url("config"),
            "http://localhost:8080/api/v1/config"
        );
    }

    #[test]
    fn refresh_is_humantime() {
        let config = parse_config(
            "[api]\nurl = \"http://signs.example.org/\"\n[viewer]\nrefresh = \"5m\"\n",
        )
        .unwrap();
        assert_eq!(config.viewer.refresh, Duration::from_secs(300));
        assert_eq!(
            config.api_url("auth/check"),
            "http://signs.example.org/api/v1/auth/check"
        );
    }
}
