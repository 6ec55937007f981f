//! Error types for the CTAN packager.
//!
//! This module defines semantic error variants that tell the user which step
//! of the packaging run failed and, where possible, what to do about it.

use camino::Utf8PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur while preparing the CTAN archive.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// The directory holding the package sources could not be determined.
    #[error("source directory unavailable: {reason}")]
    SourceDirUnavailable {
        /// Description of why the directory could not be resolved.
        reason: String,
    },

    /// The archive destination could not be determined.
    #[error("output path unavailable: {reason}")]
    OutputPathUnavailable {
        /// Description of why the destination could not be resolved.
        reason: String,
    },

    /// The package layout contains a value that cannot be used.
    #[error("invalid package layout: {reason}")]
    InvalidLayout {
        /// Description of the offending value.
        reason: String,
    },

    /// The layout override file exists but could not be read or parsed.
    #[error("failed to load layout file {path}: {reason}")]
    LayoutFile {
        /// Path to the layout file.
        path: Utf8PathBuf,
        /// Description of the read or parse failure.
        reason: String,
    },

    /// One of the package's input files is missing.
    #[error("source file not found: {path}")]
    SourceFileNotFound {
        /// Path where the file was expected.
        path: Utf8PathBuf,
    },

    /// The document compiler could not be started.
    #[error("could not run {program}; is it installed and on PATH?")]
    CompilerUnavailable {
        /// The compiler program that failed to spawn.
        program: String,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// A compiler pass exited unsuccessfully.
    #[error("compiler pass {pass} failed ({status}){}", format_log_tail(.log_tail.as_deref()))]
    CompileFailed {
        /// Which pass failed (1 or 2).
        pass: u8,
        /// Exit status reported by the compiler.
        status: ExitStatus,
        /// Trailing lines of the compiler log, when one was written.
        log_tail: Option<String>,
    },

    /// A compiler pass exceeded the configured timeout and was killed.
    #[error("compiler pass {pass} timed out after {seconds} seconds")]
    CompileTimedOut {
        /// Which pass timed out (1 or 2).
        pass: u8,
        /// The timeout that was exceeded.
        seconds: u64,
    },

    /// The compiler reported success but left no PDF behind.
    #[error("compiler finished but produced no PDF at {path}")]
    PdfNotProduced {
        /// Where the PDF was expected.
        path: Utf8PathBuf,
    },

    /// Failed to assemble the staging directory.
    #[error("staging failed: {reason}")]
    StagingFailed {
        /// Description of the staging failure.
        reason: String,
    },

    /// Failed to write the zip archive.
    #[error("failed to write archive {path}: {reason}")]
    ArchiveFailed {
        /// Destination of the archive.
        path: Utf8PathBuf,
        /// Description of the underlying failure.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched compiler invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

fn format_log_tail(log_tail: Option<&str>) -> String {
    match log_tail {
        Some(tail) if !tail.trim().is_empty() => format!("\n{tail}"),
        _ => String::new(),
    }
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
