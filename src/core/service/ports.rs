//! Ports for presentation layers.
//!
//! The service never does UI work itself. A front end implements
//! [`ProgressReporter`] and [`ResultsDisplay`], wraps the reporter in a
//! [`ReporterRelay`] and passes that as the operation handler.

use super::handler::OperationHandler;
use crate::core::operation::{CancellationToken, OperationResult, OperationSummary};
use crate::events::HashProgress;
use std::path::Path;

/// Receives progress and can ask for the operation to stop
pub trait ProgressReporter: Send + 'static {
    fn report_progress(&mut self, current: usize, total: usize, message: &str);

    /// Polled after every progress report
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shows the final results; called once by the front end, never by workers
pub trait ResultsDisplay {
    fn show_hash_results(&mut self, results: &OperationResult, was_cancelled: bool);
}

/// Adapts a [`ProgressReporter`] into an [`OperationHandler`].
///
/// A reporter answering `true` from `is_cancelled` cancels the operation.
/// The result and summary are kept for the front end to display.
pub struct ReporterRelay<R> {
    reporter: R,
    token: Option<CancellationToken>,
    result: Option<OperationResult>,
    summary: Option<OperationSummary>,
    errors: Vec<String>,
}

impl<R: ProgressReporter> ReporterRelay<R> {
    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            token: None,
            result: None,
            summary: None,
            errors: Vec::new(),
        }
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn result(&self) -> Option<&OperationResult> {
        self.result.as_ref()
    }

    pub fn summary(&self) -> Option<&OperationSummary> {
        self.summary.as_ref()
    }

    /// Operation-level errors (the operation could not run)
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Hand the result to a display; returns false if there was none
    pub fn show<D: ResultsDisplay + ?Sized>(&self, display: &mut D) -> bool {
        let Some(result) = &self.result else {
            return false;
        };
        let cancelled = self.summary.as_ref().is_some_and(|s| s.cancelled);
        display.show_hash_results(result, cancelled);
        true
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }
}

impl<R: ProgressReporter> OperationHandler for ReporterRelay<R> {
    fn attach(&mut self, token: CancellationToken) {
        self.token = Some(token);
    }

    fn on_progress(&mut self, progress: &HashProgress) {
        self.reporter
            .report_progress(progress.current, progress.total, &progress.current_name);
        if self.reporter.is_cancelled() {
            if let Some(token) = &self.token {
                token.cancel();
            }
        }
    }

    fn on_file_error(&mut self, path: &Path, message: &str) {
        tracing::debug!(path = %path.display(), error = message, "File skipped");
    }

    fn on_result(&mut self, result: OperationResult) {
        self.result = Some(result);
    }

    fn on_finished(&mut self, _success: bool, summary: &OperationSummary) {
        self.reporter.report_progress(summary.total, summary.total, &summary.message);
        self.summary = Some(summary.clone());
    }

    fn on_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}
