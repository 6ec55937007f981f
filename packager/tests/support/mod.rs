//! Test support utilities for packager behavioural tests.
//!
//! Builds throwaway package source trees and reads entries back out of the
//! archives the packager writes.

use camino::{Utf8Path, Utf8PathBuf};
use ctan_packager::config::PackagerConfig;
use ctan_packager::layout::PackageLayout;
use ctan_packager::readme::ReadmeMode;
use std::io::Read;
use tempfile::TempDir;

/// License text written to the source tree.
pub const LICENSE_TEXT: &str = "Apache License\nVersion 2.0, January 2004\n";
/// Style file written to the source tree.
pub const STYLE_TEXT: &str = "\\NeedsTeXFormat{LaTeX2e}\n\\ProvidesPackage{twoxtwogame}\n";
/// Readme written to the source tree; carries both default markers.
pub const README_TEXT: &str = "# twoxtwogame\n\nDraw 2x2 games.\n\n## Example Functionality\n\n![example](example.png)\n\n## Installation\n\nCopy the style file.\n";

/// A populated package source directory inside a scoped temporary root.
pub struct SourceTree {
    _temp: TempDir,
    /// Temporary root holding the source directory.
    pub root: Utf8PathBuf,
    /// The package source directory.
    pub source_dir: Utf8PathBuf,
}

impl SourceTree {
    /// Write the four package inputs with their default names.
    pub fn complete() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root =
            Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("temp dir path not UTF-8");
        let source_dir = root.join("twoxtwogame");
        std::fs::create_dir(&source_dir).expect("failed to create source dir");

        let layout = PackageLayout::default();
        write(&source_dir, &layout.license, LICENSE_TEXT);
        write(&source_dir, &layout.style, STYLE_TEXT);
        write(&source_dir, &layout.readme, README_TEXT);
        write(
            &source_dir,
            &layout.document,
            "\\documentclass{article}\n\\begin{document}\nx\n\\end{document}\n",
        );

        Self {
            _temp: temp,
            root,
            source_dir,
        }
    }

    /// Resolved settings that write `<root>/upload/twoxtwogame.zip`.
    pub fn config(&self) -> PackagerConfig {
        self.config_with_archive(self.root.join("upload").join("twoxtwogame.zip"))
    }

    /// Resolved settings that write the archive to `archive_path`.
    pub fn config_with_archive(&self, archive_path: Utf8PathBuf) -> PackagerConfig {
        PackagerConfig {
            source_dir: self.source_dir.clone(),
            layout: PackageLayout::default(),
            archive_path,
            readme_mode: ReadmeMode::Filtered,
            compile_timeout: None,
            show_compiler_output: false,
            quiet: true,
        }
    }
}

fn write(dir: &Utf8Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).expect("failed to write source file");
}

/// Read one archive entry as bytes.
pub fn read_entry(archive: &Utf8Path, name: &str) -> Vec<u8> {
    let file = std::fs::File::open(archive).expect("failed to open archive");
    let mut zip = zip::ZipArchive::new(file).expect("failed to read archive");
    let mut entry = zip.by_name(name).expect("entry missing from archive");
    let mut contents = Vec::new();
    entry
        .read_to_end(&mut contents)
        .expect("failed to read archive entry");
    contents
}
