//! Multi-language code execution and judging engine
//!
//! Given submitted source code, a target language, and a set of
//! input/expected-output test cases, this crate compiles the code where
//! the language needs it, runs it once per test case inside a throwaway
//! workspace under a wall-clock timeout, and decides pass/fail with a
//! layered output comparison (exact, problem-specific handler,
//! structural, case-insensitive).
//!
//! ```no_run
//! use code_judge::{ExecutionRequest, Judge, TestCase};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let judge = Judge::with_defaults()?;
//! let report = judge
//!     .run(&ExecutionRequest {
//!         code: "print(input())".to_string(),
//!         language: "python".to_string(),
//!         test_cases: vec![TestCase {
//!             input: "hello".to_string(),
//!             output: "hello".to_string(),
//!             description: None,
//!         }],
//!         problem_id: String::new(),
//!         time_limit_ms: None,
//!     })
//!     .await?;
//! assert!(report.all_passed);
//! # Ok(())
//! # }
//! ```

pub mod checker;
pub mod error;
pub mod judger;
pub mod languages;
pub mod runner;
pub mod source;
pub mod workspace;

pub use checker::CheckerRegistry;
pub use error::JudgeError;
pub use judger::{ExecutionReport, ExecutionRequest, Judge, TestCase, TestResult};
pub use languages::{LanguageProfile, LanguageRegistry};
pub use workspace::Workspace;
