use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::DEFAULT_MEMCHECK_TIMEOUT_SECS;
use crate::memcheck::parser::MemcheckFindings;
use crate::memcheck::traits::{MemcheckError, MemoryChecker};

/// Invokes `valgrind <executable>` with stdin closed and scrapes the report
/// from its stderr. The invocation is bounded by its own timeout so a
/// hanging analysis cannot stall the harness.
#[derive(Clone, Debug)]
pub struct ValgrindChecker {
    valgrind_path: PathBuf,
    timeout: Duration,
}

impl ValgrindChecker {
    pub fn new() -> Self {
        Self {
            valgrind_path: PathBuf::from("valgrind"),
            timeout: Duration::from_secs(DEFAULT_MEMCHECK_TIMEOUT_SECS),
        }
    }

    pub fn with_valgrind_path(mut self, valgrind_path: impl Into<PathBuf>) -> Self {
        self.valgrind_path = valgrind_path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the tool can be started at all. Used by tests to skip on
    /// machines without valgrind.
    pub async fn available(&self) -> bool {
        Command::new(&self.valgrind_path)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok_and(|status| status.success())
    }
}

impl Default for ValgrindChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryChecker for ValgrindChecker {
    #[tracing::instrument(skip(self))]
    async fn analyze(&self, executable: &Path) -> Result<MemcheckFindings, MemcheckError> {
        let mut cmd = Command::new(&self.valgrind_path);
        cmd.arg(executable)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, cmd.output()).await {
            Err(_) => return Err(MemcheckError::Timeout(self.timeout)),
            Ok(result) => result.map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    MemcheckError::ToolUnavailable {
                        tool: self.valgrind_path.display().to_string(),
                        source: e,
                    }
                } else {
                    MemcheckError::Io(e)
                }
            })?,
        };

        // Valgrind writes its own report to stderr; the program's stdout is
        // not part of the analysis.
        let report = String::from_utf8_lossy(&output.stderr).to_string();
        tracing::debug!(report_len = report.len(), "memcheck finished");
        Ok(MemcheckFindings::parse(report))
    }
}
