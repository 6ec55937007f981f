//! CTAN packager CLI entrypoint.
//!
//! This binary compiles the twoxtwogame documentation and bundles it with the
//! package's static files into a zip archive ready for upload to CTAN.

use clap::Parser;
use ctan_packager::cli::Cli;
use ctan_packager::compiler::SystemCompilerRunner;
use ctan_packager::config::PackagerConfig;
use ctan_packager::dirs::SystemBaseDirs;
use ctan_packager::error::Result;
use ctan_packager::output::{Progress, dry_run_lines, success_message, write_line};
use ctan_packager::pipeline::Packager;
use ctan_packager::sources::SourceFiles;
use log::LevelFilter;
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity, cli.quiet);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let config = PackagerConfig::resolve(cli, &SystemBaseDirs)?;

    if cli.dry_run {
        let sources = SourceFiles::resolve(&config.source_dir, &config.layout);
        for line in dry_run_lines(&config, &sources) {
            write_line(stderr, line);
        }
        return Ok(());
    }

    let runner = SystemCompilerRunner::new(config.compile_timeout, config.show_compiler_output);
    let mut progress = Progress::new(stderr, config.quiet);
    let summary = Packager::new(&config, &runner).run(&mut progress)?;

    progress.line("");
    progress.line(success_message(&summary));
    Ok(())
}

/// Install the logger; `RUST_LOG` still overrides the level chosen here.
fn init_logging(verbosity: u8, quiet: bool) {
    let level = level_for_verbosity(verbosity, quiet);
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env();
    if builder.try_init().is_err() {
        // A logger is already installed; keep it.
    }
}

const fn level_for_verbosity(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_line(stderr, format_args!("error: {err}"));
            1
        }
    }
}
