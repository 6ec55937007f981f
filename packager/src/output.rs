//! Console output for the packager CLI.
//!
//! Progress lines go to a caller-supplied writer (stderr in the binary, a
//! buffer in tests) rather than straight to the terminal.

use crate::archive::ArchiveSummary;
use crate::compiler::CompilerInvocation;
use crate::config::PackagerConfig;
use crate::readme::ReadmeMode;
use crate::sources::SourceFiles;
use std::fmt::Display;
use std::io::Write;

/// Writes progress lines unless quiet.
pub struct Progress<'a> {
    out: &'a mut dyn Write,
    quiet: bool,
}

impl<'a> Progress<'a> {
    /// Create a reporter writing to `out`.
    #[must_use]
    pub fn new(out: &'a mut dyn Write, quiet: bool) -> Self {
        Self { out, quiet }
    }

    /// Write one progress line.
    pub fn line(&mut self, message: impl Display) {
        if !self.quiet {
            write_line(self.out, message);
        }
    }
}

/// Write one line, ignoring write failures.
pub fn write_line(out: &mut dyn Write, message: impl Display) {
    if writeln!(out, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Summary printed after a successful run.
///
/// # Example
///
/// ```
/// use camino::Utf8PathBuf;
/// use ctan_packager::archive::ArchiveSummary;
/// use ctan_packager::output::success_message;
///
/// let summary = ArchiveSummary {
///     path: Utf8PathBuf::from("/home/tex/twoxtwogame.zip"),
///     entries: vec!["twoxtwogame/".to_owned(), "twoxtwogame/LICENSE".to_owned()],
///     sha256: "ab".repeat(32),
/// };
/// let message = success_message(&summary);
/// assert!(message.contains("/home/tex/twoxtwogame.zip"));
/// assert!(message.contains("twoxtwogame/LICENSE"));
/// ```
#[must_use]
pub fn success_message(summary: &ArchiveSummary) -> String {
    let mut message = format!("Created {}\n", summary.path);
    for entry in &summary.entries {
        message.push_str(&format!("  {entry}\n"));
    }
    message.push_str(&format!("SHA-256: {}", summary.sha256));
    message
}

/// Lines describing what a run would do, for `--dry-run`.
#[must_use]
pub fn dry_run_lines(config: &PackagerConfig, sources: &SourceFiles) -> Vec<String> {
    let mut lines = vec![
        "Dry run - no files will be written".to_owned(),
        String::new(),
        format!("Source directory: {}", config.source_dir),
    ];

    for path in sources.iter() {
        let state = if path.is_file() { "found" } else { "MISSING" };
        lines.push(format!("  {path} ({state})"));
    }

    let invocation = CompilerInvocation::new(
        config.layout.compiler.as_str(),
        sources.document.as_path(),
        "<temporary directory>",
    );
    lines.push(format!("Compiler (run twice): {invocation}"));
    if let Some(timeout) = config.compile_timeout {
        lines.push(format!("Compiler timeout: {}s per pass", timeout.as_secs()));
    }

    let readme = match config.readme_mode {
        ReadmeMode::Filtered => format!(
            "filtered (drop {:?} up to {:?})",
            config.layout.start_marker, config.layout.end_marker
        ),
        ReadmeMode::Verbatim => "copied verbatim".to_owned(),
    };
    lines.push(format!("Readme: {readme}"));
    lines.push(format!("Archive: {}", config.archive_path));
    lines.push(String::new());
    lines.push(format!("Archive contents ({}/):", config.layout.package_name));
    for name in config.layout.staged_names() {
        lines.push(format!("  {name}"));
    }
    lines
}
