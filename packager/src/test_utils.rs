//! Test doubles for the document compiler.
//!
//! [`StubCompiler`] stands in for LaTeX: each scripted [`StubPass`] decides
//! what the "compiler" leaves in its output directory and how it exits.

use crate::compiler::{CompilerInvocation, CompilerRunner, PassOutcome};
use crate::error::{PackagerError, Result};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::ExitStatus;
use std::time::Duration;

/// Bytes written as the stub's PDF.
pub const STUB_PDF: &[u8] = b"%PDF-1.5\n% stub output\n%%EOF\n";

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Scripted behaviour for one compiler pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubPass {
    /// Write [`STUB_PDF`] and a log, then exit 0.
    Succeed,
    /// Exit 0 without writing a PDF.
    SucceedWithoutPdf,
    /// Write a log ending in `message`, then exit 1.
    Fail {
        /// Final line of the written log.
        message: String,
    },
    /// Report that the pass was killed after the given duration.
    TimeOut(Duration),
}

/// A `CompilerRunner` that plays back scripted passes and records every
/// invocation it receives.
#[derive(Debug)]
pub struct StubCompiler {
    passes: RefCell<VecDeque<StubPass>>,
    invocations: RefCell<Vec<CompilerInvocation>>,
}

impl StubCompiler {
    /// Creates a stub that plays back `passes` in order.
    #[must_use]
    pub fn new(passes: Vec<StubPass>) -> Self {
        Self {
            passes: RefCell::new(passes.into()),
            invocations: RefCell::new(Vec::new()),
        }
    }

    /// A stub whose two passes both succeed.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::new(vec![StubPass::Succeed, StubPass::Succeed])
    }

    /// A stub whose every pass fails with a LaTeX error.
    #[must_use]
    pub fn failing() -> Self {
        let fail = StubPass::Fail {
            message: "! LaTeX Error: File `missing.sty' not found.".to_owned(),
        };
        Self::new(vec![fail.clone(), fail])
    }

    /// Invocations received so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CompilerInvocation> {
        self.invocations.borrow().clone()
    }

    /// Asserts that every scripted pass has been consumed.
    ///
    /// # Panics
    ///
    /// Panics if scripted passes remain.
    pub fn assert_finished(&self) {
        assert!(
            self.passes.borrow().is_empty(),
            "expected no further compiler passes"
        );
    }
}

impl CompilerRunner for StubCompiler {
    fn run(&self, invocation: &CompilerInvocation) -> Result<PassOutcome> {
        self.invocations.borrow_mut().push(invocation.clone());
        let pass = self
            .passes
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| PackagerError::StubMismatch {
                message: format!("unexpected compiler invocation: {invocation}"),
            })?;

        let log = invocation.log_path();
        match pass {
            StubPass::Succeed => {
                std::fs::write(invocation.pdf_path(), STUB_PDF)?;
                std::fs::write(log, "Output written.\n")?;
                Ok(PassOutcome::Exited(exit_status(0)))
            }
            StubPass::SucceedWithoutPdf => Ok(PassOutcome::Exited(exit_status(0))),
            StubPass::Fail { message } => {
                std::fs::write(log, format!("This is a stub TeX.\n{message}\n"))?;
                Ok(PassOutcome::Exited(exit_status(1)))
            }
            StubPass::TimeOut(after) => Ok(PassOutcome::TimedOut(after)),
        }
    }
}
