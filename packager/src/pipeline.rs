//! The packaging run: compile, stage, archive.
//!
//! Steps run strictly in sequence and stop at the first error. Both temporary
//! directories are scoped values, so they are removed however the run ends.

use crate::archive::{ArchiveSummary, create_archive};
use crate::compiler::{COMPILE_PASSES, CompilerRunner, DocumentCompiler};
use crate::config::PackagerConfig;
use crate::error::Result;
use crate::output::Progress;
use crate::sources::SourceFiles;
use crate::stager::{Stager, compiler_output_dir};
use log::{debug, warn};

/// Runs one packaging pass over a resolved [`PackagerConfig`].
pub struct Packager<'a> {
    config: &'a PackagerConfig,
    runner: &'a dyn CompilerRunner,
}

impl<'a> Packager<'a> {
    /// Create a packager that compiles through `runner`.
    #[must_use]
    pub fn new(config: &'a PackagerConfig, runner: &'a dyn CompilerRunner) -> Self {
        Self { config, runner }
    }

    /// The package's input files.
    #[must_use]
    pub fn sources(&self) -> SourceFiles {
        SourceFiles::resolve(&self.config.source_dir, &self.config.layout)
    }

    /// Build the archive.
    ///
    /// # Errors
    ///
    /// Fails on the first missing input, compiler failure, staging error or
    /// archive write error. No archive is written unless every earlier step
    /// succeeded.
    pub fn run(&self, progress: &mut Progress<'_>) -> Result<ArchiveSummary> {
        let layout = &self.config.layout;
        let sources = self.sources();
        sources.verify()?;

        let stager = Stager::new(&layout.package_name)?;
        progress.line(format!("Made temp directory at {}", stager.root()));

        self.compile_into(&stager, &sources, progress)?;
        stager.stage_static_files(&sources, layout, self.config.readme_mode)?;

        progress.line(format!("Saving archive at {}", self.config.archive_path));
        let summary = create_archive(
            stager.root(),
            &layout.package_name,
            &self.config.archive_path,
        )?;
        release_staging(stager);
        Ok(summary)
    }

    /// Run every compiler pass and move the resulting PDF into the stager.
    fn compile_into(
        &self,
        stager: &Stager,
        sources: &SourceFiles,
        progress: &mut Progress<'_>,
    ) -> Result<()> {
        let (_output_dir, output_path) = compiler_output_dir()?;
        let compiler = DocumentCompiler::new(self.runner, &self.config.layout.compiler);
        let invocation = compiler.invocation(&sources.document, &output_path);
        debug!("compiler command: {invocation}");

        for pass in 1..=COMPILE_PASSES {
            progress.line(format!("Building PDF (pass {pass} of {COMPILE_PASSES})..."));
            compiler.run_pass(&invocation, pass)?;
        }

        let pdf = DocumentCompiler::produced_pdf(&invocation)?;
        stager.stage_pdf(&pdf, &self.config.layout.pdf_name())?;
        Ok(())
    }
}

/// Remove the staging tree once the archive is written.
///
/// The archive already exists at this point, so a cleanup failure is logged
/// rather than failing the run.
fn release_staging(stager: Stager) {
    let root = stager.root().to_owned();
    if let Err(e) = stager.close() {
        warn!("failed to remove staging directory {root}: {e}");
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
