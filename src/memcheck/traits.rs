use std::path::Path;
use std::time::Duration;

use crate::memcheck::parser::MemcheckFindings;

#[derive(Debug, thiserror::Error)]
pub enum MemcheckError {
    #[error("memory checker `{tool}` could not be started: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("memory checker timed out after {0:?}")]
    Timeout(Duration),
    #[error("i/o error during memory check: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs a dynamic-analysis tool against a compiled executable in a fresh
/// invocation and returns its scraped report.
#[mockall::automock]
#[async_trait::async_trait]
pub trait MemoryChecker: std::fmt::Debug + Send + Sync {
    async fn analyze(&self, executable: &Path) -> Result<MemcheckFindings, MemcheckError>;
}
