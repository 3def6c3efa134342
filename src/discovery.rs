//! Folder browsing.
//!
//! Helpers used when the user points at a folder rather than a file:
//! [`find_videos`] lists the supported videos in it, and [`render_tree`]
//! prints its readable, non-hidden subdirectories for navigation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SplitError;

/// Extensions picked up by [`find_videos`], in listing order.
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

fn ensure_directory(folder: &Path) -> Result<(), SplitError> {
    if !folder.exists() {
        return Err(SplitError::invalid_path(folder, "does not exist"));
    }
    if !folder.is_dir() {
        return Err(SplitError::invalid_path(folder, "not a directory"));
    }
    Ok(())
}

/// Videos directly inside `folder`, grouped by extension in
/// [`VIDEO_EXTENSIONS`] order and sorted by name within a group.
///
/// Extensions match case-insensitively. Subdirectories are not searched.
///
/// # Errors
///
/// [`SplitError::InvalidPath`] if `folder` is missing or not a directory.
pub fn find_videos(folder: &Path) -> Result<Vec<PathBuf>, SplitError> {
    ensure_directory(folder)?;

    let mut videos: Vec<(usize, PathBuf)> = Vec::new();
    for entry in fs::read_dir(folder)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let rank = path
            .extension()
            .map(|extension| extension.to_string_lossy().to_ascii_lowercase())
            .and_then(|extension| VIDEO_EXTENSIONS.iter().position(|known| *known == extension));
        if let Some(rank) = rank {
            videos.push((rank, path));
        }
    }

    videos.sort();
    Ok(videos.into_iter().map(|(_, path)| path).collect())
}

/// Names of the readable, non-hidden subdirectories of `folder`, sorted.
///
/// # Errors
///
/// [`SplitError::InvalidPath`] if `folder` is missing or not a directory.
pub fn subdirectories(folder: &Path) -> Result<Vec<String>, SplitError> {
    ensure_directory(folder)?;

    let mut names = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() && fs::read_dir(&path).is_ok() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// A one-level text tree of `folder` and its subdirectories.
///
/// ```text
/// /home/me/videos
/// ├── 📁 holidays
/// └── 📁 talks
/// ```
pub fn render_tree(folder: &Path) -> Result<String, SplitError> {
    let names = subdirectories(folder)?;
    let mut tree = folder.display().to_string();
    for (position, name) in names.iter().enumerate() {
        let branch = if position + 1 == names.len() { "└──" } else { "├──" };
        tree.push('\n');
        tree.push_str(&format!("{branch} 📁 {name}"));
    }
    Ok(tree)
}
