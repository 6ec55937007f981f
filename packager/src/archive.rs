//! Zip archive creation for the CTAN upload.
//!
//! The archive mirrors the staging root: one directory entry for the package
//! folder followed by its files, deflate-compressed, in sorted order. It is
//! written to a temporary file beside the destination and persisted over the
//! destination only once complete, so a failed run never leaves a truncated
//! archive behind.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// What was written by [`create_archive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Where the archive was written.
    pub path: Utf8PathBuf,
    /// Entry names in archive order.
    pub entries: Vec<String>,
    /// Lowercase hex SHA-256 of the archive file.
    pub sha256: String,
}

/// Zip `root/folder` into `dest`, keeping `folder` as the top-level entry.
///
/// Missing parent directories of `dest` are created and an existing file at
/// `dest` is replaced, keeping its permissions. A new archive gets mode
/// `0o644` on Unix.
///
/// # Errors
///
/// Returns [`PackagerError::ArchiveFailed`] if the staging tree cannot be
/// read or the archive cannot be written.
pub fn create_archive(root: &Utf8Path, folder: &str, dest: &Utf8Path) -> Result<ArchiveSummary> {
    let fail = |reason: String| PackagerError::ArchiveFailed {
        path: dest.to_owned(),
        reason,
    };

    let parent = match dest.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| fail(format!("cannot create {parent}: {e}")))?;

    let files = collect_files(&root.join(folder), folder).map_err(|e| fail(e.to_string()))?;

    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| fail(format!("cannot create temporary file in {parent}: {e}")))?;
    let entries = write_entries(temp.as_file_mut(), folder, &files).map_err(fail)?;
    if let Some(permissions) = archive_permissions(dest)
        .map_err(|e| fail(format!("cannot read permissions of {dest}: {e}")))?
    {
        temp.as_file()
            .set_permissions(permissions)
            .map_err(|e| fail(format!("cannot set archive permissions: {e}")))?;
    }
    temp.as_file().sync_all().map_err(|e| fail(e.to_string()))?;
    temp.persist(dest).map_err(|e| fail(e.error.to_string()))?;
    debug!("wrote {} entries to {dest}", entries.len());

    let sha256 = compute_sha256(dest)?;
    Ok(ArchiveSummary {
        path: dest.to_owned(),
        entries,
        sha256,
    })
}

/// Permissions for the finished archive: those of the file it replaces, or
/// the usual mode for a new file. Temporary files start out owner-only.
fn archive_permissions(dest: &Utf8Path) -> io::Result<Option<fs::Permissions>> {
    match fs::metadata(dest) {
        Ok(metadata) => Ok(Some(metadata.permissions())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;

    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

/// An entry to add: its path on disk (`None` for directories) and its name
/// inside the archive.
type StagedEntry = (Option<Utf8PathBuf>, String);

/// Walk `dir` recursively, returning files sorted by archive name.
///
/// Directories below `dir` contribute their own entries, suffixed with `/`
/// and carrying no source path.
fn collect_files(dir: &Utf8Path, prefix: &str) -> io::Result<Vec<StagedEntry>> {
    let mut found = Vec::new();
    let mut pending: Vec<(Utf8PathBuf, String)> = vec![(dir.to_owned(), prefix.to_owned())];

    while let Some((current, name)) = pending.pop() {
        for entry in current.read_dir_utf8()? {
            let entry = entry?;
            let entry_name = format!("{name}/{}", entry.file_name());
            if entry.file_type()?.is_dir() {
                found.push((None, format!("{entry_name}/")));
                pending.push((entry.path().to_owned(), entry_name));
            } else {
                found.push((Some(entry.path().to_owned()), entry_name));
            }
        }
    }

    found.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(found)
}

fn write_entries(
    file: &mut fs::File,
    folder: &str,
    files: &[StagedEntry],
) -> std::result::Result<Vec<String>, String> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let mut writer = ZipWriter::new(file);
    let mut entries = Vec::with_capacity(files.len() + 1);

    let folder_entry = format!("{folder}/");
    writer
        .add_directory(folder_entry.as_str(), options.unix_permissions(0o755))
        .map_err(|e| e.to_string())?;
    entries.push(folder_entry);

    for (source, name) in files {
        match source {
            None => {
                writer
                    .add_directory(name.as_str(), options.unix_permissions(0o755))
                    .map_err(|e| e.to_string())?;
            }
            Some(path) => {
                trace!("adding {path} as {name}");
                writer
                    .start_file(name.as_str(), options)
                    .map_err(|e| e.to_string())?;
                let mut source_file =
                    fs::File::open(path).map_err(|e| format!("cannot read {path}: {e}"))?;
                io::copy(&mut source_file, &mut writer).map_err(|e| e.to_string())?;
            }
        }
        entries.push(name.clone());
    }

    writer.finish().map_err(|e| e.to_string())?;
    Ok(entries)
}

/// List the entry names of the zip archive at `path`, in archive order.
///
/// # Errors
///
/// Returns [`PackagerError::ArchiveFailed`] if the archive cannot be opened
/// or read.
pub fn list_entries(path: &Utf8Path) -> Result<Vec<String>> {
    let fail = |reason: String| PackagerError::ArchiveFailed {
        path: path.to_owned(),
        reason,
    };
    let file = fs::File::open(path).map_err(|e| fail(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| fail(e.to_string()))?;
    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(|e| fail(e.to_string()))?;
        names.push(entry.name().to_owned());
    }
    Ok(names)
}

/// Compute the SHA-256 digest of a file as lowercase hex.
///
/// # Errors
///
/// Returns [`PackagerError::Io`] if the file cannot be read.
pub fn compute_sha256(path: &Utf8Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(format!("{:x}", hasher.finalize()))
}
