use std::os::unix::process::ExitStatusExt;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use uuid::Uuid;

use crate::constants::{
    MEMCHECK_TIMEOUT_MSG, NO_EXE_MSG, OUTPUT_LOG, SEG_FAULT_MSG, TIMEOUT_MSG,
    TOOL_UNAVAILABLE_MSG, VALGRIND_ERRORS_MSG, VALGRIND_LEAK_MSG, VALGRIND_LOG,
};
use crate::domain::{ErrorKind, ErrorReport, RunRequest};
use crate::memcheck::{MemcheckError, MemoryChecker, ValgrindChecker};
use crate::runner::traits::{Runner, RunnerError};
use crate::signal::TerminationSignal;

/// Executes the compiled assignment directly and classifies the outcome into
/// an `ErrorReport`.
#[derive(Debug)]
pub struct BinaryRunner {
    checker: Arc<dyn MemoryChecker>,
}

impl BinaryRunner {
    pub fn new() -> Self {
        Self {
            checker: Arc::new(ValgrindChecker::new()),
        }
    }

    pub fn with_checker(checker: Arc<dyn MemoryChecker>) -> Self {
        Self { checker }
    }

    async fn emit_stdout(&self, request: &RunRequest, stdout: &str) -> Result<(), RunnerError> {
        if request.log_to_files {
            tokio::fs::write(request.dir.join(OUTPUT_LOG), stdout).await?;
        } else {
            print!("{stdout}");
        }
        Ok(())
    }

    async fn run_memcheck(
        &self,
        request: &RunRequest,
        errors: &mut ErrorReport,
    ) -> Result<(), RunnerError> {
        let findings = match self.checker.analyze(&request.executable_path()).await {
            Ok(findings) => findings,
            Err(MemcheckError::ToolUnavailable { tool, .. }) => {
                tracing::warn!(%tool, "memory checker unavailable");
                errors.record(ErrorKind::ToolUnavailable, TOOL_UNAVAILABLE_MSG);
                return Ok(());
            }
            Err(MemcheckError::Timeout(limit)) => {
                tracing::warn!(?limit, "memory checker timed out");
                errors.record(ErrorKind::Timeout, MEMCHECK_TIMEOUT_MSG);
                return Ok(());
            }
            Err(MemcheckError::Io(e)) => return Err(RunnerError::Io(e)),
        };

        if findings.reported_errors() {
            errors.record(ErrorKind::ValgrindErrors, VALGRIND_ERRORS_MSG);
        }
        if !findings.no_leaks_confirmed() {
            errors.record(ErrorKind::ValgrindMemoryLeak, VALGRIND_LEAK_MSG);
        }

        // The persisted text is the checker's own report, not the primary
        // run's stderr.
        if request.log_to_files {
            tokio::fs::write(request.dir.join(VALGRIND_LOG), findings.raw()).await?;
        } else {
            print!("{}", findings.raw());
        }
        Ok(())
    }
}

impl Default for BinaryRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runner for BinaryRunner {
    #[tracing::instrument(skip(self))]
    async fn run(&self, request: &RunRequest) -> Result<ErrorReport, RunnerError> {
        let run_id = Uuid::new_v4();
        let mut errors = ErrorReport::default();
        let executable_path = request.executable_path();

        if !executable_path.is_file() {
            errors.record(ErrorKind::NoExecutable, NO_EXE_MSG);
            return Ok(errors);
        }

        tracing::info!(%run_id, executable = %executable_path.display(), "running executable");

        // stdbuf keeps the child's stdout line-buffered even though it goes
        // to a pipe.
        let mut cmd = Command::new("stdbuf");
        cmd.arg("-oL")
            .arg(&executable_path)
            .current_dir(&request.dir)
            .stdin(if request.input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| RunnerError::FailedToLaunch {
            executable: executable_path.display().to_string(),
            source: e,
        })?;

        if let Some(input) = &request.input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes()).await?;
                // Dropping the handle closes the pipe and signals EOF.
                drop(stdin);
            }
        }

        let mut timed_out = false;
        match timeout(request.timeout, child.wait_with_output()).await {
            Err(_) => {
                // The child is dropped here; kill_on_drop reaps it.
                tracing::warn!(%run_id, timeout = ?request.timeout, "execution timed out");
                errors.record(ErrorKind::Timeout, TIMEOUT_MSG);
                timed_out = true;
            }
            Ok(output_result) => {
                let output = output_result?;
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                self.emit_stdout(request, &stdout).await?;

                if let Some(signal) = output
                    .status
                    .signal()
                    .and_then(TerminationSignal::from_raw)
                {
                    tracing::debug!(%run_id, ?signal, "process was killed by a signal");
                    if signal == TerminationSignal::SegFault {
                        errors.record(ErrorKind::SegFault, SEG_FAULT_MSG);
                    }
                }
            }
        }

        // A binary that never terminates would only stall the checker too.
        if request.memcheck && !timed_out {
            self.run_memcheck(request, &mut errors).await?;
        }

        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::time::Duration;

    use tempfile::tempdir;

    use super::*;
    use crate::memcheck::{MemcheckFindings, MockMemoryChecker};

    /// Writes an executable shell script into `dir` and returns its name.
    fn write_script(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut permissions = std::fs::metadata(&path).unwrap().permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&path, permissions).unwrap();
    }

    fn quiet_runner() -> BinaryRunner {
        // Tests never want a real valgrind pass; requests opt out of
        // memcheck explicitly or install a mock.
        BinaryRunner::new()
    }

    #[tokio::test]
    async fn missing_executable_short_circuits() {
        let dir = tempdir().unwrap();
        let request = RunRequest::new(dir.path()).with_log_to_files(true);

        let errors = quiet_runner().run(&request).await.unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(ErrorKind::NoExecutable), Some(NO_EXE_MSG));
        // Nothing was executed, so no log file may appear.
        assert!(!dir.path().join(OUTPUT_LOG).exists());
        assert!(!dir.path().join(VALGRIND_LOG).exists());
    }

    #[tokio::test]
    async fn captured_stdout_is_persisted_verbatim() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "a.out", "echo hello");
        let request = RunRequest::new(dir.path())
            .with_memcheck(false)
            .with_log_to_files(true);

        let errors = quiet_runner().run(&request).await.unwrap();

        assert!(errors.is_empty());
        let logged = std::fs::read_to_string(dir.path().join(OUTPUT_LOG)).unwrap();
        assert_eq!(logged, "hello\n");
    }

    #[tokio::test]
    async fn input_is_fed_to_stdin() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "a.out", "read line; echo \"got $line\"");
        let request = RunRequest::new(dir.path())
            .with_memcheck(false)
            .with_input("ping\n")
            .with_log_to_files(true);

        let errors = quiet_runner().run(&request).await.unwrap();

        assert!(errors.is_empty());
        let logged = std::fs::read_to_string(dir.path().join(OUTPUT_LOG)).unwrap();
        assert_eq!(logged, "got ping\n");
    }

    #[tokio::test]
    async fn segfault_signal_is_classified() {
        let dir = tempdir().unwrap();
        // The script kills itself with SIGSEGV, which is how a crashing C
        // program looks to the harness.
        write_script(dir.path(), "a.out", "kill -SEGV $$");
        let request = RunRequest::new(dir.path())
            .with_memcheck(false)
            .with_log_to_files(true);

        let errors = quiet_runner().run(&request).await.unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(ErrorKind::SegFault), Some(SEG_FAULT_MSG));
    }

    #[tokio::test]
    async fn normal_exit_codes_are_not_classified() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "a.out", "exit 3");
        let request = RunRequest::new(dir.path())
            .with_memcheck(false)
            .with_log_to_files(true);

        let errors = quiet_runner().run(&request).await.unwrap();

        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn overlong_run_is_reported_as_timeout() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "a.out", "sleep 10");
        let request = RunRequest::new(dir.path())
            .with_memcheck(false)
            .with_log_to_files(true)
            .with_timeout(Duration::from_millis(200));

        let errors = quiet_runner().run(&request).await.unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(ErrorKind::Timeout), Some(TIMEOUT_MSG));
        // The run never completed, so there is no captured output to log.
        assert!(!dir.path().join(OUTPUT_LOG).exists());
    }

    #[tokio::test]
    async fn checker_findings_are_folded_into_the_report() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "a.out", "exit 0");

        let mut checker = MockMemoryChecker::new();
        checker.expect_analyze().returning(|_| {
            Ok(MemcheckFindings::parse(
                "==1== Invalid read of size 4\n==1== ERROR SUMMARY: 2 errors from 1 contexts\n"
                    .to_string(),
            ))
        });

        let runner = BinaryRunner::with_checker(Arc::new(checker));
        let request = RunRequest::new(dir.path()).with_log_to_files(true);
        let errors = runner.run(&request).await.unwrap();

        assert!(errors.contains(ErrorKind::ValgrindErrors));
        assert!(errors.contains(ErrorKind::ValgrindMemoryLeak));
        assert!(!errors.contains(ErrorKind::SegFault));
    }

    #[tokio::test]
    async fn clean_checker_report_adds_nothing() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "a.out", "exit 0");

        let mut checker = MockMemoryChecker::new();
        checker.expect_analyze().returning(|_| {
            Ok(MemcheckFindings::parse(
                "==1== All heap blocks were freed -- no leaks are possible\n\
                 ==1== ERROR SUMMARY: 0 errors from 0 contexts\n"
                    .to_string(),
            ))
        });

        let runner = BinaryRunner::with_checker(Arc::new(checker));
        let request = RunRequest::new(dir.path()).with_log_to_files(true);
        let errors = runner.run(&request).await.unwrap();

        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn checker_report_is_persisted_to_its_own_log() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "a.out", "exit 0");

        let report_text = "==1== All heap blocks were freed -- no leaks are possible\n";
        let mut checker = MockMemoryChecker::new();
        checker
            .expect_analyze()
            .returning(move |_| Ok(MemcheckFindings::parse(report_text.to_string())));

        let runner = BinaryRunner::with_checker(Arc::new(checker));
        let request = RunRequest::new(dir.path()).with_log_to_files(true);
        runner.run(&request).await.unwrap();

        let logged = std::fs::read_to_string(dir.path().join(VALGRIND_LOG)).unwrap();
        assert_eq!(logged, report_text);
    }

    #[tokio::test]
    async fn missing_checker_tool_is_reported_not_raised() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "a.out", "exit 0");

        let mut checker = MockMemoryChecker::new();
        checker.expect_analyze().returning(|_| {
            Err(MemcheckError::ToolUnavailable {
                tool: "valgrind".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
        });

        let runner = BinaryRunner::with_checker(Arc::new(checker));
        let request = RunRequest::new(dir.path()).with_log_to_files(true);
        let errors = runner.run(&request).await.unwrap();

        assert_eq!(errors.len(), 1);
        assert!(errors.contains(ErrorKind::ToolUnavailable));
        assert!(!dir.path().join(VALGRIND_LOG).exists());
    }

    #[tokio::test]
    async fn hanging_checker_is_reported_as_timeout() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "a.out", "exit 0");

        let mut checker = MockMemoryChecker::new();
        checker
            .expect_analyze()
            .returning(|_| Err(MemcheckError::Timeout(Duration::from_secs(60))));

        let runner = BinaryRunner::with_checker(Arc::new(checker));
        let request = RunRequest::new(dir.path()).with_log_to_files(true);
        let errors = runner.run(&request).await.unwrap();

        assert_eq!(errors.get(ErrorKind::Timeout), Some(MEMCHECK_TIMEOUT_MSG));
    }

    #[tokio::test]
    async fn timed_out_run_skips_the_checker() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "a.out", "sleep 10");

        let mut checker = MockMemoryChecker::new();
        checker.expect_analyze().times(0);

        let runner = BinaryRunner::with_checker(Arc::new(checker));
        let request = RunRequest::new(dir.path())
            .with_log_to_files(true)
            .with_timeout(Duration::from_millis(200));
        let errors = runner.run(&request).await.unwrap();

        assert!(errors.contains(ErrorKind::Timeout));
    }
}
