use std::time::Duration;

use crate::domain::{BuildOutcome, BuildRequest};

/// Hard failures of the build step itself. A program that merely fails to
/// compile is not an error here; that is `BuildOutcome::Failed`.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build tool `{tool}` could not be started: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("build timed out after {0:?}")]
    Timeout(Duration),
    #[error("i/o error during build: {0}")]
    Io(#[from] std::io::Error),
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait Builder: std::fmt::Debug + Send + Sync {
    async fn build(&self, request: &BuildRequest) -> Result<BuildOutcome, BuildError>;
}
