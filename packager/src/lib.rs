//! CTAN packager library.
//!
//! This crate prepares the twoxtwogame LaTeX package for upload to CTAN: it
//! compiles the documentation to PDF, stages the PDF with the license, style
//! file and a trimmed readme, and zips the result. It is used by the
//! `prepare-ctan-upload` binary and can be driven programmatically with a
//! stub compiler for testing.
//!
//! # Modules
//!
//! - [`archive`] - Zip archive creation and inspection
//! - [`cli`] - Command-line argument definitions
//! - [`compiler`] - External LaTeX compiler invocation
//! - [`config`] - Resolution of run settings before any I/O
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Semantic error types
//! - [`layout`] - Package file names and readme markers
//! - [`output`] - Progress and summary output
//! - [`pipeline`] - The compile, stage, archive run
//! - [`readme`] - Readme marker filtering
//! - [`sources`] - The package's input files
//! - [`stager`] - Scoped staging directories

pub mod archive;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod dirs;
pub mod error;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod readme;
pub mod sources;
pub mod stager;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
