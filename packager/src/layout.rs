//! Package layout: the fixed names that describe one CTAN package.
//!
//! The defaults describe the `twoxtwogame` package. A source directory may
//! carry a `ctan-package.toml` to override any of them; omitted keys fall back
//! to the defaults, unknown keys are rejected.
//!
//! ```toml
//! package_name = "twoxtwogame"
//! style = "twoxtwogame.sty"
//! document = "twoxtwogame_doc.tex"
//! start_marker = "## Example Functionality"
//! end_marker = "## Installation"
//! ```

use crate::error::{PackagerError, Result};
use camino::Utf8Path;
use log::debug;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::ErrorKind;

/// Name of the optional layout override file inside the source directory.
pub const LAYOUT_FILE_NAME: &str = "ctan-package.toml";

/// Names of the package folder, its four files, and the readme markers.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackageLayout {
    /// Top-level folder name inside the archive and default archive stem.
    pub package_name: String,
    /// Readme file name.
    pub readme: String,
    /// License file name.
    pub license: String,
    /// LaTeX style file name.
    pub style: String,
    /// Document source compiled into the PDF.
    pub document: String,
    /// Readme line that opens the stripped region (the line itself is dropped).
    pub start_marker: String,
    /// Readme line that closes the stripped region (the line itself is kept).
    pub end_marker: String,
    /// Program used to compile the document.
    pub compiler: String,
}

impl Default for PackageLayout {
    fn default() -> Self {
        Self {
            package_name: "twoxtwogame".to_owned(),
            readme: "README.md".to_owned(),
            license: "LICENSE".to_owned(),
            style: "twoxtwogame.sty".to_owned(),
            document: "twoxtwogame_doc.tex".to_owned(),
            start_marker: "## Example Functionality".to_owned(),
            end_marker: "## Installation".to_owned(),
            compiler: "pdflatex".to_owned(),
        }
    }
}

impl PackageLayout {
    /// Load the layout for `source_dir`.
    ///
    /// Returns the defaults when no `ctan-package.toml` is present.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::LayoutFile`] when the file exists but cannot
    /// be read or parsed, and [`PackagerError::InvalidLayout`] when a parsed
    /// value fails validation.
    pub fn load(source_dir: &Utf8Path) -> Result<Self> {
        let path = source_dir.join(LAYOUT_FILE_NAME);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no {LAYOUT_FILE_NAME} in {source_dir}; using default layout");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(PackagerError::LayoutFile {
                    path,
                    reason: e.to_string(),
                });
            }
        };

        let layout = Self::parse(&contents).map_err(|e| match e {
            PackagerError::LayoutFile { reason, .. } => PackagerError::LayoutFile {
                path: path.clone(),
                reason,
            },
            other => other,
        })?;
        debug!("loaded package layout from {path}");
        Ok(layout)
    }

    /// Parse and validate a layout from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidLayout`] for values that fail
    /// validation, or a [`PackagerError::LayoutFile`] without a path for
    /// malformed TOML.
    pub fn parse(contents: &str) -> Result<Self> {
        let layout: Self = toml::from_str(contents).map_err(|e| PackagerError::LayoutFile {
            path: Utf8Path::new(LAYOUT_FILE_NAME).to_owned(),
            reason: e.message().to_owned(),
        })?;
        layout.validate()?;
        Ok(layout)
    }

    /// Check that every name is usable as a bare file name and the markers
    /// are single, non-empty lines.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidLayout`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("package_name", &self.package_name),
            ("readme", &self.readme),
            ("license", &self.license),
            ("style", &self.style),
            ("document", &self.document),
        ];
        for (field, value) in names {
            validate_file_name(field, value)?;
        }

        let pdf = self.pdf_name();
        let mut seen = HashSet::new();
        for name in [&self.readme, &self.license, &self.style, &pdf] {
            if !seen.insert(name.as_str()) {
                return Err(PackagerError::InvalidLayout {
                    reason: format!("file name {name} is used for more than one package file"),
                });
            }
        }

        for (field, value) in [
            ("start_marker", &self.start_marker),
            ("end_marker", &self.end_marker),
        ] {
            if value.is_empty() || value.contains(['\n', '\r']) {
                return Err(PackagerError::InvalidLayout {
                    reason: format!("{field} must be a single non-empty line"),
                });
            }
        }

        if self.start_marker == self.end_marker {
            return Err(PackagerError::InvalidLayout {
                reason: "start_marker and end_marker must differ".to_owned(),
            });
        }

        if self.compiler.trim().is_empty() {
            return Err(PackagerError::InvalidLayout {
                reason: "compiler must not be empty".to_owned(),
            });
        }

        Ok(())
    }

    /// File name of the compiled PDF: the document's stem with `.pdf`.
    #[must_use]
    pub fn pdf_name(&self) -> String {
        let stem = Utf8Path::new(&self.document)
            .file_stem()
            .unwrap_or(&self.document);
        format!("{stem}.pdf")
    }

    /// The four file names staged into the archive folder, PDF first.
    #[must_use]
    pub fn staged_names(&self) -> [String; 4] {
        [
            self.pdf_name(),
            self.license.clone(),
            self.style.clone(),
            self.readme.clone(),
        ]
    }
}

fn validate_file_name(field: &str, value: &str) -> Result<()> {
    let is_bare = !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\']);
    if is_bare {
        Ok(())
    } else {
        Err(PackagerError::InvalidLayout {
            reason: format!("{field} must be a bare file name, got {value:?}"),
        })
    }
}
