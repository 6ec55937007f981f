//! The four input files of a package.

use crate::error::{PackagerError, Result};
use crate::layout::PackageLayout;
use camino::{Utf8Path, Utf8PathBuf};
use log::trace;

/// Absolute paths of the package inputs inside the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFiles {
    /// The readme.
    pub readme: Utf8PathBuf,
    /// The license file.
    pub license: Utf8PathBuf,
    /// The LaTeX style file.
    pub style: Utf8PathBuf,
    /// The document compiled into the PDF.
    pub document: Utf8PathBuf,
}

impl SourceFiles {
    /// Join the layout's file names onto `source_dir`.
    #[must_use]
    pub fn resolve(source_dir: &Utf8Path, layout: &PackageLayout) -> Self {
        Self {
            readme: source_dir.join(&layout.readme),
            license: source_dir.join(&layout.license),
            style: source_dir.join(&layout.style),
            document: source_dir.join(&layout.document),
        }
    }

    /// Iterate over the four paths in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = &Utf8Path> {
        [&self.readme, &self.license, &self.style, &self.document]
            .into_iter()
            .map(Utf8PathBuf::as_path)
    }

    /// Check that every input exists as a regular file.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::SourceFileNotFound`] for the first missing
    /// file.
    pub fn verify(&self) -> Result<()> {
        for path in self.iter() {
            trace!("checking source file {path}");
            if !path.is_file() {
                return Err(PackagerError::SourceFileNotFound {
                    path: path.to_owned(),
                });
            }
        }
        Ok(())
    }
}
