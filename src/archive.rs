//! Zip archive of the export folder.
//!
//! The archive is written next to the folder it packs (`jira_export/` becomes
//! `jira_export.zip`). Entries are added in sorted order with a fixed
//! timestamp, so packing the same files twice gives the same archive.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::export::MARKER_FILE;

/// Errors that can occur while writing the archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Reading a source file or writing the archive failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The export folder could not be traversed.
    #[error("could not walk export folder: {0}")]
    Walk(#[from] walkdir::Error),

    /// The zip writer failed.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The folder has no name to derive the archive name from.
    #[error("'{0}' does not name a folder")]
    NoFolderName(PathBuf),
}

/// Path of the archive for `source_dir`: a sibling named `<dir-name>.zip`.
pub fn archive_path_for(source_dir: &Path) -> PathBuf {
    let name = source_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let zip_name = format!("{}.zip", name);

    match source_dir.parent() {
        Some(parent) => parent.join(zip_name),
        None => PathBuf::from(zip_name),
    }
}

/// Pack every file under `source_dir` into `<parent>/<dir-name>.zip`.
///
/// An existing archive at that path is replaced. Directories are not stored
/// as entries; entry names are `/`-separated paths relative to `source_dir`.
/// The export marker at the top of the folder is left out.
///
/// # Errors
///
/// Returns an error if the folder cannot be read or the archive cannot be
/// written. The partial archive is removed in that case.
#[instrument(skip_all, fields(source = %source_dir.display()))]
pub fn archive(source_dir: &Path) -> Result<PathBuf, ArchiveError> {
    if source_dir.file_name().is_none() {
        return Err(ArchiveError::NoFolderName(source_dir.to_path_buf()));
    }

    let target = archive_path_for(source_dir);
    match write_archive(source_dir, &target) {
        Ok(entries) => {
            info!(path = %target.display(), entries, "Archive written");
            Ok(target)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&target) {
                debug!(error = %cleanup, "Could not remove partial archive");
            }
            Err(e)
        }
    }
}

/// Write the entries of `source_dir` to `target`, returning how many were added.
fn write_archive(source_dir: &Path, target: &Path) -> Result<usize, ArchiveError> {
    let mut zip = ZipWriter::new(File::create(target)?);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut entries = 0usize;
    let walker = WalkDir::new(source_dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && e.file_name() == MARKER_FILE));
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry_name(entry.path().strip_prefix(source_dir).unwrap_or(entry.path()));
        debug!(entry = %name, "Adding file to archive");

        zip.start_file(name, options)?;
        io::copy(&mut File::open(entry.path())?, &mut zip)?;
        entries += 1;
    }

    zip.finish()?;
    Ok(entries)
}

/// Zip entry name for a relative path: components joined with `/`.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
