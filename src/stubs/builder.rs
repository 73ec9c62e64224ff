use std::time::Duration;

use crate::builder::{BuildError, Builder};
use crate::domain::{BuildOutcome, BuildRequest};

/// Always resolves to a fixed outcome after a delay. Useful for wiring up a
/// harness without a toolchain.
#[derive(Clone, Debug)]
pub struct BuilderStub {
    outcome: BuildOutcome,
    delay: Duration,
}

impl BuilderStub {
    pub fn new(outcome: BuildOutcome, delay: Duration) -> Self {
        Self { outcome, delay }
    }
}

#[async_trait::async_trait]
impl Builder for BuilderStub {
    #[tracing::instrument]
    async fn build(&self, request: &BuildRequest) -> Result<BuildOutcome, BuildError> {
        tracing::debug!("Start build: request={:?}", request);
        tokio::time::sleep(self.delay).await;
        tracing::debug!("Build outcome: {:?}", self.outcome);

        Ok(self.outcome.clone())
    }
}
