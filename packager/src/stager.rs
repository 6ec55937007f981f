//! Staging of the package folder before compression.
//!
//! The staging root is a [`TempDir`] owned by the [`Stager`]; it holds exactly
//! one folder named after the package, which becomes the archive's only
//! top-level entry. Dropping the stager removes the whole tree.

use crate::error::{PackagerError, Result};
use crate::layout::PackageLayout;
use crate::readme::{ReadmeFilter, ReadmeMode, write_readme};
use crate::sources::SourceFiles;
use camino::{Utf8Path, Utf8PathBuf};
use log::{trace, warn};
use std::fs;
use std::io::ErrorKind;
use tempfile::TempDir;

/// Assembles the package folder inside a scoped temporary directory.
pub struct Stager {
    root: TempDir,
    root_path: Utf8PathBuf,
    package_dir: Utf8PathBuf,
}

impl Stager {
    /// Create a fresh staging root containing an empty `package_name` folder.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::StagingFailed`] if the directories cannot be
    /// created or the temporary path is not valid UTF-8.
    pub fn new(package_name: &str) -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("ctan-staging-")
            .tempdir()
            .map_err(|e| PackagerError::StagingFailed {
                reason: format!("failed to create staging directory: {e}"),
            })?;
        let root_path = utf8_path(root.path())?;
        let package_dir = root_path.join(package_name);
        fs::create_dir(&package_dir).map_err(|e| PackagerError::StagingFailed {
            reason: format!("failed to create {package_dir}: {e}"),
        })?;

        Ok(Self {
            root,
            root_path,
            package_dir,
        })
    }

    /// Directory the archive is built from (parent of the package folder).
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root_path
    }

    /// The package folder inside the staging root.
    #[must_use]
    pub fn package_dir(&self) -> &Utf8Path {
        &self.package_dir
    }

    /// Move the compiled PDF into the package folder as `name`, replacing any
    /// file already there.
    ///
    /// Falls back to copy-and-remove when a rename is not possible, which is
    /// the case when the compiler output directory is on another filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::StagingFailed`] if the PDF cannot be moved.
    pub fn stage_pdf(&self, pdf: &Utf8Path, name: &str) -> Result<Utf8PathBuf> {
        let dest = self.package_dir.join(name);
        if dest.exists() {
            warn!("replacing existing {dest}");
        }

        match fs::rename(pdf, &dest) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PackagerError::PdfNotProduced {
                    path: pdf.to_owned(),
                });
            }
            Err(e) => {
                trace!("rename of {pdf} failed ({e}); copying instead");
                fs::copy(pdf, &dest).map_err(|e| staging_error(pdf, &dest, &e))?;
                fs::remove_file(pdf).map_err(|e| PackagerError::StagingFailed {
                    reason: format!("failed to remove {pdf} after copying: {e}"),
                })?;
            }
        }

        trace!("staged {dest}");
        Ok(dest)
    }

    /// Copy a file byte-for-byte into the package folder as `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::SourceFileNotFound`] if `source` is missing,
    /// or [`PackagerError::StagingFailed`] for any other copy failure.
    pub fn stage_copy(&self, source: &Utf8Path, name: &str) -> Result<Utf8PathBuf> {
        let dest = self.package_dir.join(name);
        fs::copy(source, &dest).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PackagerError::SourceFileNotFound {
                    path: source.to_owned(),
                }
            } else {
                staging_error(source, &dest, &e)
            }
        })?;

        trace!("staged {dest}");
        Ok(dest)
    }

    /// Write the readme into the package folder, filtered or verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::SourceFileNotFound`] if the readme is missing,
    /// or an I/O error if it cannot be read or written.
    pub fn stage_readme(
        &self,
        source: &Utf8Path,
        layout: &PackageLayout,
        mode: ReadmeMode,
    ) -> Result<Utf8PathBuf> {
        let dest = self.package_dir.join(&layout.readme);
        let filter = ReadmeFilter::new(&layout.start_marker, &layout.end_marker);
        write_readme(source, &dest, mode, &filter).map_err(|e| match e {
            PackagerError::Io(io) if io.kind() == ErrorKind::NotFound => {
                PackagerError::SourceFileNotFound {
                    path: source.to_owned(),
                }
            }
            other => other,
        })?;

        trace!("staged {dest}");
        Ok(dest)
    }

    /// Copy the license and style file and write the readme.
    ///
    /// # Errors
    ///
    /// Propagates the first failure from [`Self::stage_copy`] or
    /// [`Self::stage_readme`].
    pub fn stage_static_files(
        &self,
        sources: &SourceFiles,
        layout: &PackageLayout,
        mode: ReadmeMode,
    ) -> Result<()> {
        self.stage_copy(&sources.license, &layout.license)?;
        self.stage_copy(&sources.style, &layout.style)?;
        self.stage_readme(&sources.readme, layout, mode)?;
        Ok(())
    }

    /// Remove the staging tree now, reporting any failure.
    ///
    /// Dropping the stager also removes the tree, but silently.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the tree cannot be removed.
    pub fn close(self) -> Result<()> {
        self.root.close()?;
        Ok(())
    }
}

/// Create the scoped directory the compiler writes into.
///
/// # Errors
///
/// Returns [`PackagerError::StagingFailed`] if the directory cannot be
/// created or its path is not valid UTF-8.
pub fn compiler_output_dir() -> Result<(TempDir, Utf8PathBuf)> {
    let dir = tempfile::Builder::new()
        .prefix("ctan-latex-")
        .tempdir()
        .map_err(|e| PackagerError::StagingFailed {
            reason: format!("failed to create compiler output directory: {e}"),
        })?;
    let path = utf8_path(dir.path())?;
    Ok((dir, path))
}

fn utf8_path(path: &std::path::Path) -> Result<Utf8PathBuf> {
    Utf8PathBuf::try_from(path.to_path_buf()).map_err(|e| PackagerError::StagingFailed {
        reason: format!("temporary directory path is not valid UTF-8: {e}"),
    })
}

fn staging_error(source: &Utf8Path, dest: &Utf8Path, e: &std::io::Error) -> PackagerError {
    PackagerError::StagingFailed {
        reason: format!("failed to copy {source} to {dest}: {e}"),
    }
}
