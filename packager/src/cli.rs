//! CLI argument definitions for the CTAN packager.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::Utf8PathBuf;
use clap::Parser;

/// Prepare the twoxtwogame package for upload to CTAN.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "prepare-ctan-upload")]
#[command(version, about)]
#[command(long_about = concat!(
    "Prepare the twoxtwogame package for upload to CTAN.\n\n",
    "Compiles the documentation with pdflatex (twice, so cross-references ",
    "resolve), then zips the PDF, LICENSE, style file and readme into a ",
    "single folder inside <DIR>.zip.\n\n",
    "The readme section between \"## Example Functionality\" and ",
    "\"## Installation\" is removed unless --keep-readme is given. File names ",
    "and markers can be overridden with a ctan-package.toml in the source ",
    "directory.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Write ~/twoxtwogame.zip:\n",
    "    $ prepare-ctan-upload\n\n",
    "  Write the archive elsewhere:\n",
    "    $ prepare-ctan-upload --dir /tmp/upload/twoxtwogame\n\n",
    "  Preview without compiling:\n",
    "    $ prepare-ctan-upload --source-dir . --dry-run\n",
))]
pub struct Cli {
    /// Archive path without the .zip extension; a leading ~ means the home
    /// directory [default: ~/<package>].
    #[arg(long, value_name = "PATH")]
    pub dir: Option<Utf8PathBuf>,

    /// Directory holding the package sources [default: the executable's directory].
    #[arg(long, value_name = "DIR")]
    pub source_dir: Option<Utf8PathBuf>,

    /// LaTeX compiler to run instead of the configured one.
    #[arg(long, value_name = "PROGRAM")]
    pub compiler: Option<String>,

    /// Copy the readme unchanged instead of stripping the example section.
    #[arg(long)]
    pub keep_readme: bool,

    /// Abort a compiler pass that runs longer than this many seconds.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Show the resolved plan and exit without compiling or writing.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity and show compiler output (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
