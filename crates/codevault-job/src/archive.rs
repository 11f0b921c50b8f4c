//! Packages a working tree into a single zip archive.
//!
//! Everything under the root is included, `.git` too, so the archive can be
//! unpacked into a usable repository. Entries are written in sorted order.
//! Unix permission bits are kept, and symbolic links are stored as links
//! rather than followed.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveError;

const DEFAULT_FILE_MODE: u32 = 0o644;
const DEFAULT_DIR_MODE: u32 = 0o755;

/// Counts gathered while packaging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveSummary {
    pub files: u64,
    pub directories: u64,
    pub symlinks: u64,
    /// Sum of the packaged file sizes before compression.
    pub uncompressed_bytes: u64,
    /// Size of the finished archive.
    pub archive_bytes: u64,
}

/// Builds a zip archive from a directory tree.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    root: PathBuf,
    compression: CompressionMethod,
}

impl ArchiveBuilder {
    /// Creates a builder for the tree under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            compression: CompressionMethod::Deflated,
        }
    }

    /// Stores entries without compression.
    pub fn stored(mut self) -> Self {
        self.compression = CompressionMethod::Stored;
        self
    }

    /// Writes the archive to `dest`, which must lie outside the tree.
    ///
    /// # Errors
    ///
    /// Zip entry names are UTF-8, so a file name or symlink target that is
    /// not valid UTF-8 fails the whole build with
    /// [`ArchiveError::NonUtf8Path`] instead of being renamed or left out.
    pub fn build(&self, dest: &Path) -> Result<ArchiveSummary, ArchiveError> {
        if !self.root.is_dir() {
            return Err(ArchiveError::TreeNotFound(self.root.clone()));
        }

        let file = File::create(dest)?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let mut summary = ArchiveSummary::default();

        self.add_dir(&mut zip, &self.root, &mut summary)?;

        let mut writer = zip.finish()?;
        io::Write::flush(&mut writer)?;
        drop(writer);

        summary.archive_bytes = fs::metadata(dest)?.len();
        info!(
            "Packaged {} files, {} directories, {} symlinks into {:?} ({} bytes)",
            summary.files, summary.directories, summary.symlinks, dest, summary.archive_bytes
        );

        Ok(summary)
    }

    fn add_dir<W: io::Write + io::Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        dir: &Path,
        summary: &mut ArchiveSummary,
    ) -> Result<(), ArchiveError> {
        let mut entries = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort();

        for path in entries {
            let name = self.entry_name(&path)?;
            let metadata = fs::symlink_metadata(&path)?;
            let file_type = metadata.file_type();

            if file_type.is_symlink() {
                let target = fs::read_link(&path)?;
                let target = target
                    .to_str()
                    .ok_or_else(|| ArchiveError::NonUtf8Path(path.clone()))?;
                debug!("symlink {} -> {}", name, target);
                zip.add_symlink(name, target, self.options(mode_of(&metadata, 0o777)))?;
                summary.symlinks += 1;
            } else if file_type.is_dir() {
                zip.add_directory(
                    format!("{}/", name),
                    self.options(mode_of(&metadata, DEFAULT_DIR_MODE)),
                )?;
                summary.directories += 1;
                self.add_dir(zip, &path, summary)?;
            } else {
                let len = metadata.len();
                let options = self
                    .options(mode_of(&metadata, DEFAULT_FILE_MODE))
                    .large_file(len >= u32::MAX as u64);
                zip.start_file(name, options)?;
                let mut source = File::open(&path)?;
                io::copy(&mut source, zip)?;
                summary.files += 1;
                summary.uncompressed_bytes += len;
            }
        }

        Ok(())
    }

    fn options(&self, mode: u32) -> FileOptions {
        FileOptions::default()
            .compression_method(self.compression)
            .unix_permissions(mode)
    }

    /// Relative, `/`-separated entry name for a path inside the tree.
    fn entry_name(&self, path: &Path) -> Result<String, ArchiveError> {
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| ArchiveError::NonUtf8Path(path.to_path_buf()))?;

        let mut parts = Vec::new();
        for component in relative.components() {
            let part = component
                .as_os_str()
                .to_str()
                .ok_or_else(|| ArchiveError::NonUtf8Path(path.to_path_buf()))?;
            parts.push(part);
        }
        Ok(parts.join("/"))
    }
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata, _fallback: u32) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_of(_metadata: &fs::Metadata, fallback: u32) -> u32 {
    fallback
}
