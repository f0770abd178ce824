//! Submission judging
//!
//! Orchestrates the full pipeline for one execution request: workspace
//! acquisition, source materialization, compilation, then run + output
//! check per test case. A failing test case never aborts the batch; the
//! workspace is removed exactly once on every path out of the request.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::checker::CheckerRegistry;
use crate::error::JudgeError;
use crate::languages::{LanguageProfile, LanguageRegistry};
use crate::runner::{self, RunStatus};
use crate::source;
use crate::workspace::Workspace;

/// One (input, expected output) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Fed to the program's standard input
    pub input: String,
    /// Expected output
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One submission of source code plus its test cases
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    /// Opaque key selecting a problem-specific output handler
    #[serde(default)]
    pub problem_id: String,
    /// Per-test wall-clock override in milliseconds; the language
    /// profile's default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,
}

/// Outcome of one test case, in input order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub passed: bool,
    pub test_case_index: usize,
    pub input: String,
    pub expected: String,
    /// Program output on success; the error text otherwise
    pub actual: String,
    pub execution_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Terminal artifact returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    /// Whether the pipeline ran at all
    pub success: bool,
    pub results: Vec<TestResult>,
    pub total_tests: usize,
    pub passed_tests: usize,
    pub all_passed: bool,
}

/// The judging engine: language table plus output handlers, both
/// read-only after construction, so one instance serves concurrent
/// requests without shared mutable state.
pub struct Judge {
    languages: LanguageRegistry,
    checkers: CheckerRegistry,
}

impl Judge {
    pub fn new(languages: LanguageRegistry, checkers: CheckerRegistry) -> Self {
        Self {
            languages,
            checkers,
        }
    }

    /// Judge with the embedded language table and built-in handlers
    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(
            LanguageRegistry::builtin()?,
            CheckerRegistry::with_builtins(),
        ))
    }

    /// Judge one submission. Returns a fully-populated report, or a
    /// single error when the request cannot start (unknown language,
    /// workspace or source-write failure).
    pub async fn run(&self, request: &ExecutionRequest) -> Result<ExecutionReport, JudgeError> {
        let profile = self.languages.get(&request.language)?;

        info!(
            "Judging submission: language={}, problem={}, testcases={}",
            request.language,
            request.problem_id,
            request.test_cases.len()
        );

        let workspace = Workspace::create()?;
        // The workspace is dropped (and its directory removed) on every
        // path out of judge_in, including the early `?` returns.
        let report = self.judge_in(&workspace, profile, request).await;
        workspace.close();
        report
    }

    /// JSON-string entry point covering the wire contract: a report on
    /// success, `{"success": false, "error": ...}` for malformed requests
    /// and request-fatal failures.
    pub async fn run_json(&self, request_json: &str) -> String {
        let value = match serde_json::from_str::<ExecutionRequest>(request_json) {
            Ok(request) => match self.run(&request).await {
                Ok(report) => serde_json::to_value(&report)
                    .unwrap_or_else(|e| error_value(&format!("failed to encode report: {}", e))),
                Err(e) => error_value(&e.to_string()),
            },
            Err(e) => error_value(&format!("invalid request: {}", e)),
        };
        value.to_string()
    }

    async fn judge_in(
        &self,
        workspace: &Workspace,
        profile: &LanguageProfile,
        request: &ExecutionRequest,
    ) -> Result<ExecutionReport, JudgeError> {
        source::materialize(workspace, profile, &request.code).await?;

        // Compile once per request; a compile failure is deterministic
        // for fixed source, so its diagnostics are recorded against every
        // test case instead of aborting the batch.
        let compile_error = match runner::compile(profile, workspace.path()).await {
            Ok(outcome) if outcome.success => None,
            Ok(outcome) => Some(
                outcome
                    .message
                    .unwrap_or_else(|| "compilation failed".to_string()),
            ),
            Err(e) => Some(format!("{:#}", e)),
        };

        let time_limit_ms = request.time_limit_ms.unwrap_or(profile.time_limit_ms);

        let mut results = Vec::with_capacity(request.test_cases.len());
        for (index, test_case) in request.test_cases.iter().enumerate() {
            let result = match &compile_error {
                Some(message) => TestResult {
                    passed: false,
                    test_case_index: index,
                    input: test_case.input.clone(),
                    expected: test_case.output.clone(),
                    actual: message.clone(),
                    execution_time_ms: 0,
                    error: Some(message.clone()),
                },
                None => {
                    self.run_test_case(workspace, profile, request, index, test_case, time_limit_ms)
                        .await
                }
            };

            debug!("Test case {}: passed={}", index, result.passed);
            results.push(result);
        }

        let total_tests = results.len();
        let passed_tests = results.iter().filter(|r| r.passed).count();

        info!(
            "Judged submission: language={}, problem={}, passed={}/{}",
            request.language, request.problem_id, passed_tests, total_tests
        );

        Ok(ExecutionReport {
            success: true,
            all_passed: passed_tests == total_tests,
            results,
            total_tests,
            passed_tests,
        })
    }

    async fn run_test_case(
        &self,
        workspace: &Workspace,
        profile: &LanguageProfile,
        request: &ExecutionRequest,
        index: usize,
        test_case: &TestCase,
        time_limit_ms: u64,
    ) -> TestResult {
        let failure = |actual: String, time_ms: u64| TestResult {
            passed: false,
            test_case_index: index,
            input: test_case.input.clone(),
            expected: test_case.output.clone(),
            error: Some(actual.clone()),
            actual,
            execution_time_ms: time_ms,
        };

        match runner::run_test(profile, workspace.path(), &test_case.input, time_limit_ms).await {
            Ok(outcome) => match outcome.status {
                RunStatus::Exited(0) => {
                    let actual = outcome.stdout.trim_end().to_string();
                    let passed = self
                        .checkers
                        .check(&actual, &test_case.output, &request.problem_id);
                    TestResult {
                        passed,
                        test_case_index: index,
                        input: test_case.input.clone(),
                        expected: test_case.output.clone(),
                        actual,
                        execution_time_ms: outcome.time_ms,
                        error: None,
                    }
                }
                RunStatus::Exited(code) => {
                    let stderr = outcome.stderr.trim();
                    let message = if stderr.is_empty() {
                        format!("process exited with code {}", code)
                    } else {
                        stderr.to_string()
                    };
                    failure(message, outcome.time_ms)
                }
                RunStatus::TimedOut => {
                    failure(format!("time limit exceeded ({} ms)", time_limit_ms), outcome.time_ms)
                }
            },
            Err(e) => {
                warn!("Failed to run test case {}: {:#}", index, e);
                failure(format!("{:#}", e), 0)
            }
        }
    }
}

fn error_value(message: &str) -> serde_json::Value {
    serde_json::json!({ "success": false, "error": message })
}
