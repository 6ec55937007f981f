//! Readme filtering for the uploaded package.
//!
//! The repository readme carries sections (usage examples rendered from the
//! repository) that make no sense on CTAN. They are fenced by two marker
//! lines; everything from the start marker up to, but not including, the end
//! marker is removed.

use crate::error::Result;
use camino::Utf8Path;
use log::{debug, warn};

/// How the readme is carried into the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadmeMode {
    /// Strip the marker-delimited region.
    #[default]
    Filtered,
    /// Copy the readme byte-for-byte.
    Verbatim,
}

/// Strips the region between two exact marker lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeFilter<'a> {
    start_marker: &'a str,
    end_marker: &'a str,
}

impl<'a> ReadmeFilter<'a> {
    /// Create a filter for the given marker lines (without line terminators).
    #[must_use]
    pub const fn new(start_marker: &'a str, end_marker: &'a str) -> Self {
        Self {
            start_marker,
            end_marker,
        }
    }

    /// Apply the filter to `contents`.
    ///
    /// A line equal to the start marker switches output off and is itself
    /// dropped; a line equal to the end marker switches output back on and is
    /// itself kept. Comparison ignores the line terminator only. A start
    /// marker without a matching end marker drops the rest of the input.
    ///
    /// # Examples
    ///
    /// ```
    /// use ctan_packager::readme::ReadmeFilter;
    ///
    /// let filter = ReadmeFilter::new("## Example Functionality", "## Installation");
    /// let input = "A\n## Example Functionality\nB\n## Installation\nC\n";
    /// assert_eq!(filter.apply(input), "A\n## Installation\nC\n");
    /// ```
    #[must_use]
    pub fn apply(&self, contents: &str) -> String {
        let mut output = String::with_capacity(contents.len());
        let mut include = true;

        for line in contents.split_inclusive('\n') {
            let text = strip_line_ending(line);
            if text == self.start_marker {
                include = false;
            }
            if text == self.end_marker {
                include = true;
            }
            if include {
                output.push_str(line);
            }
        }

        if !include {
            warn!(
                "readme has {:?} without a closing {:?}; dropped everything after it",
                self.start_marker, self.end_marker
            );
        }

        output
    }
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Write the readme at `source` to `dest`, filtered or verbatim per `mode`.
///
/// # Errors
///
/// Returns an I/O error if the source cannot be read (including invalid UTF-8
/// in filtered mode) or the destination cannot be written.
pub fn write_readme(
    source: &Utf8Path,
    dest: &Utf8Path,
    mode: ReadmeMode,
    filter: &ReadmeFilter<'_>,
) -> Result<()> {
    match mode {
        ReadmeMode::Verbatim => {
            std::fs::copy(source, dest)?;
        }
        ReadmeMode::Filtered => {
            let contents = std::fs::read_to_string(source)?;
            let filtered = filter.apply(&contents);
            debug!(
                "filtered readme from {} to {} bytes",
                contents.len(),
                filtered.len()
            );
            std::fs::write(dest, filtered)?;
        }
    }
    Ok(())
}
