//! LaTeX compilation of the package documentation.
//!
//! The compiler is an external process. It runs twice so that the table of
//! contents and cross-references written to the `.aux` file on the first pass
//! are resolved on the second. Each pass's exit status is checked; the run
//! stops at the first failing pass.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fmt;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Number of compiler passes needed to settle cross-references.
pub const COMPILE_PASSES: u8 = 2;

/// Number of trailing compiler log lines carried in a failure report.
const LOG_TAIL_LINES: usize = 20;

/// One compiler process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerInvocation {
    /// Program to run (for example `pdflatex`).
    pub program: String,
    /// Document source passed as the final argument.
    pub document: Utf8PathBuf,
    /// Directory the compiler writes its PDF, log and aux files into.
    pub output_dir: Utf8PathBuf,
}

impl CompilerInvocation {
    /// Create an invocation compiling `document` into `output_dir`.
    #[must_use]
    pub fn new(
        program: impl Into<String>,
        document: impl Into<Utf8PathBuf>,
        output_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            document: document.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Arguments passed to the compiler, in order.
    ///
    /// The documentation needs shell escape. `nonstopmode` keeps a broken
    /// source from waiting on stdin.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        vec![
            "--shell-escape".to_owned(),
            format!("-output-directory={}", self.output_dir),
            "-halt-on-error".to_owned(),
            "-interaction=nonstopmode".to_owned(),
            self.document.to_string(),
        ]
    }

    /// Directory the compiler runs in: the document's own directory, so
    /// relative `\input` paths resolve.
    #[must_use]
    pub fn working_dir(&self) -> &Utf8Path {
        self.document
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."))
    }

    /// File stem shared by the document and everything the compiler writes.
    #[must_use]
    pub fn job_name(&self) -> &str {
        self.document.file_stem().unwrap_or(self.document.as_str())
    }

    /// Where the compiler writes the PDF.
    #[must_use]
    pub fn pdf_path(&self) -> Utf8PathBuf {
        self.output_dir.join(format!("{}.pdf", self.job_name()))
    }

    /// Where the compiler writes its transcript.
    #[must_use]
    pub fn log_path(&self) -> Utf8PathBuf {
        self.output_dir.join(format!("{}.log", self.job_name()))
    }
}

impl fmt::Display for CompilerInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.args() {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How a single compiler pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The process exited with the given status.
    Exited(ExitStatus),
    /// The process exceeded the timeout and was killed.
    TimedOut(Duration),
}

/// Abstraction for running the compiler, enabling test doubles.
pub trait CompilerRunner {
    /// Run one compiler pass to completion.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::CompilerUnavailable`] when the process cannot
    /// be spawned, or an I/O error while waiting on it.
    fn run(&self, invocation: &CompilerInvocation) -> Result<PassOutcome>;
}

/// Runs the compiler as a child process of this one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCompilerRunner {
    timeout: Option<Duration>,
    show_output: bool,
}

impl SystemCompilerRunner {
    /// Create a runner.
    ///
    /// `show_output` forwards the compiler's stdout and stderr to this
    /// process's; otherwise they are discarded (the `.log` file keeps the full
    /// transcript).
    #[must_use]
    pub const fn new(timeout: Option<Duration>, show_output: bool) -> Self {
        Self {
            timeout,
            show_output,
        }
    }

    fn output_stdio(&self) -> Stdio {
        if self.show_output {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }
}

impl CompilerRunner for SystemCompilerRunner {
    fn run(&self, invocation: &CompilerInvocation) -> Result<PassOutcome> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(invocation.args())
            .current_dir(invocation.working_dir())
            .stdin(Stdio::null())
            .stdout(self.output_stdio())
            .stderr(self.output_stdio());

        debug!("running {invocation}");
        let mut child = cmd
            .spawn()
            .map_err(|source| PackagerError::CompilerUnavailable {
                program: invocation.program.clone(),
                source,
            })?;

        let Some(timeout) = self.timeout else {
            return Ok(PassOutcome::Exited(child.wait()?));
        };

        match child.wait_timeout(timeout)? {
            Some(status) => Ok(PassOutcome::Exited(status)),
            None => {
                // The child may have exited between the two checks.
                if let Err(e) = child.kill() {
                    debug!("failed to kill timed-out compiler: {e}");
                }
                child.wait()?;
                Ok(PassOutcome::TimedOut(timeout))
            }
        }
    }
}

/// Compiles the package documentation with a [`CompilerRunner`].
pub struct DocumentCompiler<'a> {
    runner: &'a dyn CompilerRunner,
    program: &'a str,
}

impl<'a> DocumentCompiler<'a> {
    /// Create a compiler that runs `program` through `runner`.
    #[must_use]
    pub fn new(runner: &'a dyn CompilerRunner, program: &'a str) -> Self {
        Self { runner, program }
    }

    /// The invocation used for every pass.
    #[must_use]
    pub fn invocation(&self, document: &Utf8Path, output_dir: &Utf8Path) -> CompilerInvocation {
        CompilerInvocation::new(self.program, document, output_dir)
    }

    /// Run pass number `pass` (1-based).
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::CompileFailed`] when the compiler exits
    /// unsuccessfully, [`PackagerError::CompileTimedOut`] when it is killed
    /// for exceeding the timeout, or any error from the runner.
    pub fn run_pass(&self, invocation: &CompilerInvocation, pass: u8) -> Result<()> {
        match self.runner.run(invocation)? {
            PassOutcome::Exited(status) if status.success() => {
                info!("compiler pass {pass} finished");
                Ok(())
            }
            PassOutcome::Exited(status) => Err(PackagerError::CompileFailed {
                pass,
                status,
                log_tail: read_log_tail(&invocation.log_path()),
            }),
            PassOutcome::TimedOut(after) => Err(PackagerError::CompileTimedOut {
                pass,
                seconds: after.as_secs(),
            }),
        }
    }

    /// Locate the PDF left by the final pass.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::PdfNotProduced`] when no PDF exists.
    pub fn produced_pdf(invocation: &CompilerInvocation) -> Result<Utf8PathBuf> {
        let pdf = invocation.pdf_path();
        if pdf.is_file() {
            Ok(pdf)
        } else {
            Err(PackagerError::PdfNotProduced { path: pdf })
        }
    }
}

/// Return the last lines of the compiler log, if the log can be read.
///
/// TeX logs are not guaranteed to be UTF-8, so invalid bytes are replaced.
#[must_use]
pub fn read_log_tail(path: &Utf8Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(LOG_TAIL_LINES);
    let tail = lines.get(start..).unwrap_or_default().join("\n");
    Some(tail)
}
