use std::time::Duration;

use crate::domain::{ErrorReport, RunRequest};
use crate::runner::{Runner, RunnerError};

/// Always resolves to a fixed report after a delay.
#[derive(Clone, Debug)]
pub struct RunnerStub {
    report: ErrorReport,
    delay: Duration,
}

impl RunnerStub {
    pub fn new(report: ErrorReport, delay: Duration) -> Self {
        Self { report, delay }
    }
}

#[async_trait::async_trait]
impl Runner for RunnerStub {
    #[tracing::instrument]
    async fn run(&self, request: &RunRequest) -> Result<ErrorReport, RunnerError> {
        tracing::debug!("Start run: request={:?}", request);
        tokio::time::sleep(self.delay).await;
        tracing::debug!("Run report: {:?}", self.report);

        Ok(self.report.clone())
    }
}
