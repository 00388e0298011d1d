//! Scoped finalizer for one job run.
//!
//! A [`RunSession`] writes exactly one terminal line (SUCCESS or FAILED) and
//! picks the process exit status. A session dropped without concluding, for
//! example while a panic unwinds, still writes a FAILED line.
//! [`RunSession::guard`] also catches that panic so the process exits with 1.

use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;

use storehours_core::Reporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::FAILURE,
        }
    }
}

pub struct RunSession<'a> {
    reporter: &'a dyn Reporter,
    concluded: bool,
}

impl<'a> RunSession<'a> {
    pub fn open(reporter: &'a dyn Reporter) -> Self {
        Self {
            reporter,
            concluded: false,
        }
    }

    /// Run `body` inside a fresh session. A panic in `body` is caught after
    /// the session has written its FAILED line and yields
    /// [`Outcome::Failure`].
    pub fn guard(
        reporter: &'a dyn Reporter,
        body: impl FnOnce(RunSession<'a>) -> Outcome,
    ) -> Outcome {
        let session = Self::open(reporter);
        match panic::catch_unwind(AssertUnwindSafe(|| body(session))) {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!("job run panicked");
                Outcome::Failure
            }
        }
    }

    pub fn succeed(mut self, msg: &str) -> Outcome {
        self.concluded = true;
        self.reporter.succeed(msg);
        Outcome::Success
    }

    pub fn fail(mut self, msg: &str) -> Outcome {
        self.concluded = true;
        self.reporter.fail(msg);
        Outcome::Failure
    }

    /// Conclude from a result: `Ok` renders the success message, `Err` is
    /// written with its full context chain.
    pub fn conclude<T>(
        self,
        result: anyhow::Result<T>,
        success_message: impl FnOnce(&T) -> String,
    ) -> (Outcome, Option<T>) {
        match result {
            Ok(value) => {
                let outcome = self.succeed(&success_message(&value));
                (outcome, Some(value))
            }
            Err(err) => (self.fail(&format!("{err:#}")), None),
        }
    }
}

impl Drop for RunSession<'_> {
    fn drop(&mut self) {
        if !self.concluded {
            self.reporter
                .fail("The job stopped on an error it could not handle!");
        }
    }
}
