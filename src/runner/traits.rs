use crate::domain::{ErrorReport, RunRequest};

/// Hard failures of the run step itself. Everything the taxonomy can name
/// (missing executable, crashes, timeouts, checker findings) goes into the
/// returned `ErrorReport` instead.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("failed to launch `{executable}`: {source}")]
    FailedToLaunch {
        executable: String,
        #[source]
        source: std::io::Error,
    },
    #[error("i/o error during run: {0}")]
    Io(#[from] std::io::Error),
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait Runner: std::fmt::Debug + Send + Sync {
    async fn run(&self, request: &RunRequest) -> Result<ErrorReport, RunnerError>;
}
