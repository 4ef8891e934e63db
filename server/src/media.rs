//! The media tree on the local file system.

use billboard_rs::api::FolderNode;
use billboard_rs::paths;
use billboard_rs::util::month::compare_folder_names;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media root {0} does not exist")]
    RootMissing(PathBuf),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to walk media tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> MediaError + '_ {
    move |source| MediaError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Media files under a root directory, published under a URL prefix.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    public_prefix: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: &str) -> Self {
        let trimmed = public_prefix.trim().trim_matches('/');
        let public_prefix = if trimmed.is_empty() {
            "/media".to_string()
        } else {
            format!("/{trimmed}")
        };
        Self {
            root: root.into(),
            public_prefix,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Always starts with `/` and never ends with one.
    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    /// Public URL of the media-root-relative, normalized `path`.
    pub fn url_for(&self, path: &str) -> String {
        paths::media_url(&self.public_prefix, path)
    }

    /// Media-root-relative path a public URL points at, if it points into the media tree.
    pub fn path_of_url(&self, url: &str) -> Option<String> {
        paths::path_of_url(&self.public_prefix, url)
    }

    fn fs_path(&self, path: &str) -> PathBuf {
        path.split('/')
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    /// Store `contents` at the normalized `path`, creating parent directories and replacing any
    /// existing file. The file appears atomically.
    pub async fn write(&self, path: &str, contents: &[u8]) -> Result<(), MediaError> {
        let target = self.fs_path(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_err(parent))?;
        }
        let mut staging = target.clone().into_os_string();
        staging.push(".upload");
        let staging = PathBuf::from(staging);
        tokio::fs::write(&staging, contents)
            .await
            .map_err(io_err(&staging))?;
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(io_err(&target)(e));
        }
        Ok(())
    }

    /// Delete the file at the normalized `path`. Returns whether a file was there.
    pub async fn remove(&self, path: &str) -> Result<bool, MediaError> {
        let target = self.fs_path(path);
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_err(&target)(e)),
        }
    }

    /// Playing length of the video at the normalized `path`, as reported by `ffprobe`. `None`
    /// for images, and whenever the length cannot be determined.
    pub async fn video_length(&self, path: &str) -> Option<Duration> {
        let name = paths::split_file(path).map_or(path, |(_, name)| name);
        if !paths::is_video(name) {
            return None;
        }
        let target = self.fs_path(path);
        let output = Command::new("ffprobe")
            .args(["-v", "error", "-show_entries", "format=duration"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(&target)
            .kill_on_drop(true)
            .output()
            .await;
        let output = match output {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("could not run ffprobe on {}: {e}", target.display());
                return None;
            }
        };
        if !output.status.success() {
            tracing::warn!(
                "ffprobe failed on {}: {}",
                target.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }
        parse_probed_length(&String::from_utf8_lossy(&output.stdout))
    }

    /// Folders of the media tree that belong to `year` and `route`, with their ancestors, as a
    /// tree sorted month-aware at every level.
    pub async fn folder_tree(&self, year: &str, route: &str) -> Result<Vec<FolderNode>, MediaError> {
        let root = self.root.clone();
        let year = year.to_string();
        let route = route.to_string();
        tokio::task::spawn_blocking(move || folder_tree_blocking(&root, &year, &route)).await?
    }
}

/// `ffprobe` prints the container duration as fractional seconds, or `N/A`.
fn parse_probed_length(output: &str) -> Option<Duration> {
    let secs: f64 = output.lines().next()?.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|length| !length.is_zero())
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    (!segments.is_empty()).then(|| segments.join("/"))
}

fn folder_tree_blocking(root: &Path, year: &str, route: &str) -> Result<Vec<FolderNode>, MediaError> {
    if !root.is_dir() {
        return Err(MediaError::RootMissing(root.to_path_buf()));
    }

    let mut kept = BTreeSet::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            entry.file_type().is_dir()
                && relative_path(root, entry.path()).is_some_and(|p| {
                    paths::has_segment(&p, year) || paths::has_segment(&p, route)
                })
        });
    for entry in walker {
        let entry = entry?;
        let Some(path) = relative_path(root, entry.path()) else {
            continue;
        };
        if paths::has_segment(&path, year) && paths::has_segment(&path, route) {
            let mut ancestor = path.as_str();
            while let Some((parent, _)) = ancestor.rsplit_once('/') {
                kept.insert(parent.to_string());
                ancestor = parent;
            }
            kept.insert(path);
        }
    }

    Ok(build_tree(&kept, ""))
}

fn build_tree(kept: &BTreeSet<String>, parent: &str) -> Vec<FolderNode> {
    let mut nodes: Vec<FolderNode> = kept
        .iter()
        .filter_map(|path| {
            let (path_parent, name) = path.rsplit_once('/').unwrap_or(("", path));
            (path_parent == parent).then(|| FolderNode {
                name: name.to_string(),
                path: path.clone(),
                subfolders: build_tree(kept, path),
            })
        })
        .collect();
    nodes.sort_by(|a, b| compare_folder_names(&a.name, &b.name));
    nodes
}
