use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::question::TestCase;
use crate::models::submission::{RunnerResult, TestCaseResult};

/// Resource limits for one sandboxed run. Injected at construction so
/// deployments can tighten them without touching call sites.
#[derive(Debug, Clone)]
pub struct ExecutionLimits {
    /// Wall-clock budget per test case; the child is killed on expiry.
    pub test_timeout: Duration,
    /// Cap on captured stdout/stderr bytes per test case.
    pub max_output_bytes: usize,
    /// Optional isolation wrapper prepended to the interpreter command,
    /// e.g. a container invocation that mounts the scratch dir read-only.
    pub isolation_prefix: Vec<String>,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            test_timeout: Duration::from_secs(5),
            max_output_bytes: 20_000,
            isolation_prefix: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct RunnerService {
    limits: ExecutionLimits,
}

impl RunnerService {
    pub fn new(limits: ExecutionLimits) -> Self {
        Self { limits }
    }

    fn interpreter(language: &str) -> Result<&'static str> {
        match language.to_ascii_lowercase().as_str() {
            "python" | "python3" => Ok("python3"),
            "javascript" | "node" => Ok("node"),
            other => Err(Error::ExecutionFailure(format!(
                "unsupported language: {}",
                other
            ))),
        }
    }

    fn source_name(language: &str) -> &'static str {
        match language.to_ascii_lowercase().as_str() {
            "javascript" | "node" => "main.js",
            _ => "main.py",
        }
    }

    /// Runs `code` against every declared test case, one child process per
    /// test with the input piped to stdin. A test passes when trimmed stdout
    /// equals the trimmed expectation. Never hangs: each child lives under a
    /// hard wall-clock timeout.
    pub async fn execute(
        &self,
        submission_id: Uuid,
        language: &str,
        code: &str,
        tests: &[TestCase],
    ) -> Result<RunnerResult> {
        let interpreter = Self::interpreter(language)?;

        let scratch = tempfile::tempdir()?;
        let source_path = scratch.path().join(Self::source_name(language));
        tokio::fs::write(&source_path, code).await?;

        let mut results = Vec::with_capacity(tests.len());
        let mut total_passed = 0usize;
        let mut runtime_ms = 0u64;
        let mut last_stdout = None;
        let mut last_stderr = None;
        let mut last_exit = None;

        for (idx, test) in tests.iter().enumerate() {
            let case = self
                .run_one(interpreter, &source_path, test)
                .await
                .unwrap_or_else(|e| TestCaseResult {
                    test_case_id: Some(format!("t{}", idx + 1)),
                    passed: false,
                    output: String::new(),
                    expected: Some(test.expected.clone()),
                    duration_ms: None,
                    stderr: Some(e.to_string()),
                });
            let case = TestCaseResult {
                test_case_id: Some(format!("t{}", idx + 1)),
                ..case
            };
            if case.passed {
                total_passed += 1;
            }
            runtime_ms += case.duration_ms.unwrap_or(0);
            last_stdout = Some(case.output.clone());
            last_stderr = case.stderr.clone();
            results.push(case);
        }

        if let Some(last) = results.last() {
            last_exit = if last.passed { Some(0) } else { None };
        }

        Ok(RunnerResult {
            submission_id,
            results,
            total_passed,
            total_tests: tests.len(),
            runtime_ms: Some(runtime_ms),
            memory_kb: None,
            stdout: last_stdout,
            stderr: last_stderr,
            exit_code: last_exit,
        })
    }

    async fn run_one(
        &self,
        interpreter: &str,
        source_path: &std::path::Path,
        test: &TestCase,
    ) -> Result<TestCaseResult> {
        let mut argv: Vec<String> = self.limits.isolation_prefix.clone();
        argv.push(interpreter.to_string());
        argv.push(source_path.display().to_string());

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| Error::ExecutionFailure(format!("failed to spawn sandbox: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(test.input.as_bytes()).await?;
            drop(stdin);
        }

        let output = match timeout(self.limits.test_timeout, child.wait_with_output()).await {
            Ok(out) => out?,
            Err(_) => {
                // wait_with_output consumed the child; kill_on_drop reaps it.
                return Ok(TestCaseResult {
                    test_case_id: None,
                    passed: false,
                    output: String::new(),
                    expected: Some(test.expected.clone()),
                    duration_ms: Some(self.limits.test_timeout.as_millis() as u64),
                    stderr: Some("timeout".to_string()),
                });
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let stdout = truncate(
            String::from_utf8_lossy(&output.stdout).into_owned(),
            self.limits.max_output_bytes,
        );
        let stderr = truncate(
            String::from_utf8_lossy(&output.stderr).into_owned(),
            self.limits.max_output_bytes,
        );
        let passed = output.status.success() && stdout.trim() == test.expected.trim();

        Ok(TestCaseResult {
            test_case_id: None,
            passed,
            output: stdout,
            expected: Some(test.expected.clone()),
            duration_ms: Some(duration_ms),
            stderr: if stderr.is_empty() {
                None
            } else {
                Some(stderr)
            },
        })
    }
}

fn truncate(mut s: String, max_bytes: usize) -> String {
    if s.len() > max_bytes {
        let mut cut = max_bytes;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push_str("\n...[truncated]");
    }
    s
}
