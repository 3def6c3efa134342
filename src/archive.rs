//! Output packaging.
//!
//! [`Archiver`] bundles everything under a video's output directory into a
//! single deflate-compressed zip.
//!
//! The directory is walked top-down: at each level the files are visited in
//! name order, then the subdirectories in name order. With the default
//! [`ArchiveLayout::Flatten`] each file is stored under its base name only.
//! Two parts that both contain `frame_10.jpg` therefore collide, and the one
//! visited later replaces the earlier one. [`ArchiveLayout::Preserve`] keeps
//! relative paths instead.
//!
//! # Example
//!
//! ```no_run
//! use vidsplit::{ArchiveLayout, Archiver, SplitError};
//!
//! let summary = Archiver::new(ArchiveLayout::Flatten)
//!     .archive("output/talk".as_ref(), "output/talk.zip".as_ref())?;
//! println!("{} entries in {}", summary.entries.len(), summary.path.display());
//! # Ok::<(), SplitError>(())
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::SplitError;

/// How files are named inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArchiveLayout {
    /// Store each file under its base name. Later duplicates replace earlier
    /// ones.
    #[default]
    Flatten,
    /// Store each file under its path relative to the archived directory.
    Preserve,
}

/// Result of writing an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Path of the written archive.
    pub path: PathBuf,
    /// Entry names, in the order they were written.
    pub entries: Vec<String>,
    /// Files dropped because a later file had the same entry name.
    pub replaced: Vec<PathBuf>,
}

/// Writes zip archives of output directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct Archiver {
    layout: ArchiveLayout,
}

impl Archiver {
    /// Create an archiver with the given entry layout.
    pub fn new(layout: ArchiveLayout) -> Self {
        Self { layout }
    }

    /// Archive every file under `source_dir` into `archive_path`.
    ///
    /// An existing archive at `archive_path` is replaced.
    ///
    /// # Errors
    ///
    /// - [`SplitError::InvalidPath`] if `source_dir` is not a directory.
    /// - [`SplitError::IoError`] / [`SplitError::ArchiveError`] on write failure.
    pub fn archive(&self, source_dir: &Path, archive_path: &Path) -> Result<ArchiveSummary, SplitError> {
        if !source_dir.is_dir() {
            return Err(SplitError::invalid_path(source_dir, "not a directory"));
        }

        let mut files = Vec::new();
        walk_files(source_dir, &mut files)?;
        files.retain(|file| file != archive_path);

        let (entries, replaced) = self.plan_entries(source_dir, files);
        for path in &replaced {
            log::debug!("Archive entry replaced by a later file: {}", path.display());
        }

        if let Some(parent) = archive_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut zip = ZipWriter::new(File::create(archive_path)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, path) in &entries {
            zip.start_file(name.as_str(), options)?;
            io::copy(&mut File::open(path)?, &mut zip)?;
        }
        zip.finish()?;

        log::info!(
            "Archived {} file(s) from {} into {}",
            entries.len(),
            source_dir.display(),
            archive_path.display()
        );

        Ok(ArchiveSummary {
            path: archive_path.to_path_buf(),
            entries: entries.into_iter().map(|(name, _)| name).collect(),
            replaced,
        })
    }

    /// Pair each file with its entry name, resolving name collisions in
    /// favour of the later file.
    fn plan_entries(
        &self,
        source_dir: &Path,
        files: Vec<PathBuf>,
    ) -> (Vec<(String, PathBuf)>, Vec<PathBuf>) {
        let mut entries: Vec<(String, PathBuf)> = Vec::with_capacity(files.len());
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut replaced = Vec::new();

        for file in files {
            let name = self.entry_name(source_dir, &file);
            match positions.get(&name) {
                Some(&position) => {
                    let previous = std::mem::replace(&mut entries[position].1, file);
                    replaced.push(previous);
                }
                None => {
                    positions.insert(name.clone(), entries.len());
                    entries.push((name, file));
                }
            }
        }

        (entries, replaced)
    }

    fn entry_name(&self, source_dir: &Path, file: &Path) -> String {
        match self.layout {
            ArchiveLayout::Flatten => file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ArchiveLayout::Preserve => file
                .strip_prefix(source_dir)
                .unwrap_or(file)
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/"),
        }
    }
}

/// Archive `source_dir` into `archive_path` with flat entry names.
pub fn archive_directory(source_dir: &Path, archive_path: &Path) -> Result<PathBuf, SplitError> {
    Archiver::new(ArchiveLayout::Flatten)
        .archive(source_dir, archive_path)
        .map(|summary| summary.path)
}

/// Top-down walk: files of a directory in name order, then its
/// subdirectories in name order.
fn walk_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut subdirectories = Vec::new();
    for entry in entries {
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            subdirectories.push(entry.path());
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }

    for subdirectory in subdirectories {
        walk_files(&subdirectory, files)?;
    }
    Ok(())
}
