use anyhow::{Context, Result};
use billboard_rs::api::SessionToken;
use std::fs;
use std::io;
use std::path::PathBuf;
use xdg::BaseDirectories;

const TOKEN_FILE: &str = "session.json";

pub fn save_token(token: &SessionToken) -> Result<()> {
    let token_path = get_token_path()?;
    fs::write(&token_path, serde_json::to_string(token)?)
        .with_context(|| format!("Failed to write token to {:?}", token_path))?;
    Ok(())
}

pub fn get_token() -> Result<String> {
    let token_path = get_token_path()?;
    let token_str = fs::read_to_string(&token_path)
        .with_context(|| format!("Failed to read token from {:?}; run `bb login`", token_path))?;
    let token: SessionToken =
        serde_json::from_str(&token_str).with_context(|| "Failed to parse token JSON")?;
    Ok(token.encode_for_http())
}

/// Forget the stored session. Returns whether there was one.
pub fn clear_token() -> Result<bool> {
    let token_path = get_token_path()?;
    match fs::remove_file(&token_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to remove token file {:?}", token_path))
        }
    }
}

fn get_token_path() -> Result<PathBuf> {
    let xdg_dirs = BaseDirectories::with_prefix("billboard")
        .context("Failed to initialize XDG base directories")?;

    let token_path = xdg_dirs
        .place_data_file(TOKEN_FILE)
        .context("Failed to determine token file path")?;

    Ok(token_path)
}
