use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use crate::builder::traits::{BuildError, Builder};
use crate::constants::GCC_ENV;
use crate::domain::{BuildMode, BuildOutcome, BuildRequest};

/// Builds assignments either by invoking gcc directly with strict warning
/// flags or by deferring to the directory's Makefile.
#[derive(Clone, Debug)]
pub struct GccBuilder {
    gcc_path: PathBuf,
}

impl GccBuilder {
    pub fn new() -> Self {
        let gcc_path = std::env::var_os(GCC_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("gcc"));
        Self { gcc_path }
    }

    pub fn with_gcc_path(gcc_path: impl Into<PathBuf>) -> Self {
        Self {
            gcc_path: gcc_path.into(),
        }
    }

    fn tool_name(&self, request: &BuildRequest) -> String {
        match request.mode {
            BuildMode::Make => "make".to_string(),
            BuildMode::CompilerDirect => self.gcc_path.display().to_string(),
        }
    }

    fn command_for(&self, request: &BuildRequest) -> Command {
        match request.mode {
            BuildMode::Make => {
                // The recipe is assumed to be configured elsewhere; only its
                // stderr is interesting.
                let mut cmd = Command::new("make");
                cmd.current_dir(&request.dir)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::piped());
                cmd
            }
            BuildMode::CompilerDirect => {
                let mut cmd = Command::new(&self.gcc_path);
                cmd.arg("-Wall")
                    .arg("-Werror")
                    .arg("-o")
                    .arg(request.output_path())
                    .arg(request.source_path())
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
                cmd
            }
        }
    }
}

impl Default for GccBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Builder for GccBuilder {
    #[tracing::instrument(skip(self))]
    async fn build(&self, request: &BuildRequest) -> Result<BuildOutcome, BuildError> {
        let mut cmd = self.command_for(request);
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                BuildError::ToolUnavailable {
                    tool: self.tool_name(request),
                    source: e,
                }
            } else {
                BuildError::Io(e)
            }
        })?;

        let wait_future = child.wait_with_output();
        let output = match request.timeout {
            Some(limit) => timeout(limit, wait_future)
                .await
                .map_err(|_| BuildError::Timeout(limit))??,
            None => wait_future.await?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            tracing::debug!(status = ?output.status, "build failed");
            return Ok(BuildOutcome::Failed { stderr });
        }

        // A zero exit without an artifact still means the caller has nothing
        // to run.
        if request.mode == BuildMode::CompilerDirect
            && !tokio::fs::try_exists(request.output_path())
                .await
                .unwrap_or(false)
        {
            return Ok(BuildOutcome::Failed {
                stderr: format!(
                    "executable was not created at: {}",
                    request.output_path().display()
                ),
            });
        }

        tracing::debug!(output = %request.output_path().display(), "build succeeded");
        Ok(BuildOutcome::Succeeded)
    }
}
