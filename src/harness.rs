use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::builder::{BuildError, Builder, GccBuilder};
use crate::domain::{BuildRequest, CheckReport, ErrorReport, RunRequest};
use crate::runner::{BinaryRunner, Runner, RunnerError};

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Run(#[from] RunnerError),
}

/// Ties a builder and a runner together: build, then run, then report.
#[derive(Clone, Debug)]
pub struct Harness {
    builder: Arc<dyn Builder>,
    runner: Arc<dyn Runner>,
}

impl Harness {
    pub fn new(builder: Arc<dyn Builder>, runner: Arc<dyn Runner>) -> Self {
        Self { builder, runner }
    }

    /// The production wiring: gcc/make plus a direct binary runner with
    /// valgrind.
    pub fn native() -> Self {
        Self::new(Arc::new(GccBuilder::new()), Arc::new(BinaryRunner::new()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn check(
        &self,
        build: &BuildRequest,
        run: &RunRequest,
    ) -> Result<CheckReport, HarnessError> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let outcome = self.builder.build(build).await?;
        if outcome.is_failure() {
            tracing::info!(%id, "build failed, skipping the run");
            return Ok(CheckReport {
                id,
                created_at,
                build: outcome,
                errors: ErrorReport::default(),
            });
        }

        let errors = self.runner.run(run).await?;
        Ok(CheckReport {
            id,
            created_at,
            build: outcome,
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::builder::MockBuilder;
    use crate::domain::{BuildOutcome, ErrorKind};
    use crate::runner::MockRunner;
    use crate::stubs::{BuilderStub, RunnerStub};

    #[tokio::test]
    async fn failed_build_skips_the_run() {
        let mut builder = MockBuilder::new();
        builder.expect_build().returning(|_| {
            Ok(BuildOutcome::Failed {
                stderr: "error: expected ';'".to_string(),
            })
        });

        let mut runner = MockRunner::new();
        runner.expect_run().times(0);

        let harness = Harness::new(Arc::new(builder), Arc::new(runner));
        let report = harness
            .check(
                &BuildRequest::new("/tmp/lab", "main.c"),
                &RunRequest::new("/tmp/lab"),
            )
            .await
            .unwrap();

        assert!(report.build.is_failure());
        assert!(report.errors.is_empty());
        assert!(!report.passed());
    }

    #[tokio::test]
    async fn successful_build_passes_the_report_through() {
        let mut builder = MockBuilder::new();
        builder
            .expect_build()
            .returning(|_| Ok(BuildOutcome::Succeeded));

        let mut runner = MockRunner::new();
        runner.expect_run().returning(|_| {
            let mut errors = ErrorReport::default();
            errors.record(ErrorKind::SegFault, "Segmentation fault detected!");
            Ok(errors)
        });

        let harness = Harness::new(Arc::new(builder), Arc::new(runner));
        let report = harness
            .check(
                &BuildRequest::new("/tmp/lab", "main.c"),
                &RunRequest::new("/tmp/lab"),
            )
            .await
            .unwrap();

        assert!(!report.build.is_failure());
        assert!(report.errors.contains(ErrorKind::SegFault));
        assert!(!report.passed());
    }

    #[tokio::test]
    async fn clean_check_passes() {
        let harness = Harness::new(
            Arc::new(BuilderStub::new(
                BuildOutcome::Succeeded,
                Duration::from_millis(1),
            )),
            Arc::new(RunnerStub::new(
                ErrorReport::default(),
                Duration::from_millis(1),
            )),
        );

        let report = harness
            .check(
                &BuildRequest::new("/tmp/lab", "main.c"),
                &RunRequest::new("/tmp/lab"),
            )
            .await
            .unwrap();

        assert!(report.passed());
    }
}
