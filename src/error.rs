//! Error taxonomy for the judging pipeline

use thiserror::Error;

/// Failures that abort a whole execution request.
///
/// Failures local to one test case (compile error, runtime error, timeout,
/// wrong answer) are recorded in that test case's [`TestResult`] and never
/// surface here.
///
/// [`TestResult`]: crate::judger::TestResult
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Unknown language identifier
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Could not create the per-request workspace directory
    #[error("failed to create workspace: {0}")]
    Workspace(#[source] std::io::Error),

    /// Could not write the submitted source into the workspace
    #[error("failed to write source file: {0}")]
    SourceWrite(#[source] std::io::Error),
}
