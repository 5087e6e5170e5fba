use std::process::ExitCode;

use crate::core::orchestrator::RunSummary;

/// Exit status for CLI commands.
///
/// - `Success` (0): every file was processed (wrapped or left unchanged)
/// - `Failure` (1): the run finished but some files could not be processed
/// - `Error` (2): the run could not start (bad config, unreadable root)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    Error,
}

impl ExitStatus {
    pub fn from_summary(summary: &RunSummary) -> Self {
        if summary.has_errors() {
            ExitStatus::Failure
        } else {
            ExitStatus::Success
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}
