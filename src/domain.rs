use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::constants::{DEFAULT_EXECUTABLE, DEFAULT_TIMEOUT_SECS};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    /// Invoke the compiler directly on a single source file.
    CompilerDirect,
    /// Defer to the project's own Makefile.
    Make,
}

#[derive(Clone, Debug)]
pub struct BuildRequest {
    pub dir: PathBuf,
    pub source_filename: String,
    pub mode: BuildMode,
    pub output_name: String,
    pub timeout: Option<Duration>,
}

impl BuildRequest {
    pub fn new(dir: impl AsRef<Path>, source_filename: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().into(),
            source_filename: source_filename.into(),
            mode: BuildMode::CompilerDirect,
            output_name: DEFAULT_EXECUTABLE.to_string(),
            timeout: None,
        }
    }

    pub fn with_make(mut self) -> Self {
        self.mode = BuildMode::Make;
        self
    }

    pub fn with_output_name(mut self, output_name: impl Into<String>) -> Self {
        self.output_name = output_name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn source_path(&self) -> PathBuf {
        self.dir.join(&self.source_filename)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(&self.output_name)
    }
}

/// Outcome of a build. An explicit two-variant enum so that no caller has to
/// remember which way a boolean points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    Succeeded,
    Failed { stderr: String },
}

impl BuildOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, BuildOutcome::Failed { .. })
    }
}

#[derive(Clone, Debug)]
pub struct RunRequest {
    pub dir: PathBuf,
    pub executable_name: String,
    pub timeout: Duration,
    pub input: Option<String>,
    pub memcheck: bool,
    pub log_to_files: bool,
}

impl RunRequest {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().into(),
            executable_name: DEFAULT_EXECUTABLE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            input: None,
            memcheck: true,
            log_to_files: false,
        }
    }

    pub fn with_executable_name(mut self, executable_name: impl Into<String>) -> Self {
        self.executable_name = executable_name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_memcheck(mut self, memcheck: bool) -> Self {
        self.memcheck = memcheck;
        self
    }

    pub fn with_log_to_files(mut self, log_to_files: bool) -> Self {
        self.log_to_files = log_to_files;
        self
    }

    pub fn executable_path(&self) -> PathBuf {
        self.dir.join(&self.executable_name)
    }
}

/// Closed set of detectable failure modes. The serialized names are the
/// stable report keys consumers match on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "no_exe")]
    NoExecutable,
    #[serde(rename = "seg_fault")]
    SegFault,
    #[serde(rename = "valgrind_errors")]
    ValgrindErrors,
    #[serde(rename = "valgrind_memory_leak")]
    ValgrindMemoryLeak,
    #[serde(rename = "timeout")]
    Timeout,
    #[serde(rename = "tool_unavailable")]
    ToolUnavailable,
}

impl ErrorKind {
    pub fn as_key(&self) -> &'static str {
        match self {
            ErrorKind::NoExecutable => "no_exe",
            ErrorKind::SegFault => "seg_fault",
            ErrorKind::ValgrindErrors => "valgrind_errors",
            ErrorKind::ValgrindMemoryLeak => "valgrind_memory_leak",
            ErrorKind::Timeout => "timeout",
            ErrorKind::ToolUnavailable => "tool_unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Accumulated error-kind → message mapping for one run. Empty means no
/// detected problems; multiple kinds can co-occur in one report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorReport(BTreeMap<ErrorKind, String>);

impl ErrorReport {
    pub fn record(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.0.insert(kind, message.into());
    }

    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn get(&self, kind: ErrorKind) -> Option<&str> {
        self.0.get(&kind).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ErrorKind, &String)> {
        self.0.iter()
    }
}

/// Aggregate result of one build-and-run check.
#[derive(Clone, Debug, Serialize)]
pub struct CheckReport {
    pub id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub build: BuildOutcome,
    pub errors: ErrorReport,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        !self.build.is_failure() && self.errors.is_empty()
    }
}
