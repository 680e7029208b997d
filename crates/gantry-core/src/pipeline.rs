//! Stage pipeline executor
//!
//! Stages run strictly in declared order against the shared run context. A
//! stage may signal "skip", which is logged and treated as success, while a failure
//! aborts the pipeline; remaining stages never run and nothing committed by
//! earlier stages is rolled back.

use async_trait::async_trait;
use tracing::{error, info};

use crate::context::Context;
use crate::error::{PipelineError, Result};

/// Outcome signal from a stage
#[derive(Debug)]
pub enum StageError {
    /// The stage intentionally did nothing; not a failure
    Skipped(String),
    /// The stage failed; aborts the pipeline
    Failed(anyhow::Error),
}

impl StageError {
    /// Signal an intentional no-op
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skipped(reason.into())
    }

    /// Wrap a failure
    pub fn failed(err: impl Into<anyhow::Error>) -> Self {
        Self::Failed(err.into())
    }
}

/// Result type returned by stages
pub type StageResult = std::result::Result<(), StageError>;

/// One named unit of work in the pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name, used for logging and error context
    fn name(&self) -> &'static str;

    /// Run the stage. `depth` is the current nesting level, used only for
    /// log indentation.
    async fn run(&self, ctx: &mut Context, depth: usize) -> StageResult;
}

/// Terminal status of a stage that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// Ran to completion
    Completed,
    /// Intentionally did nothing
    Skipped(String),
}

/// Per-stage outcomes of a successful pipeline run
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Stage name and terminal status, in execution order
    pub stages: Vec<(String, StageStatus)>,
}

/// Ordered list of stages executed against one run context
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn add(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Run every stage in order.
    ///
    /// Returns the per-stage report on success; the first failure aborts and
    /// carries the failing stage's name.
    pub async fn run(&self, ctx: &mut Context, depth: usize) -> Result<PipelineReport> {
        let pad = "  ".repeat(depth);
        let mut report = PipelineReport::default();

        for stage in &self.stages {
            let name = stage.name();
            info!("{pad}• {name}");

            match stage.run(ctx, depth + 1).await {
                Ok(()) => {
                    report.stages.push((name.to_string(), StageStatus::Completed));
                }
                Err(StageError::Skipped(reason)) => {
                    info!("{pad}  skipped: {reason}");
                    report
                        .stages
                        .push((name.to_string(), StageStatus::Skipped(reason)));
                }
                Err(StageError::Failed(source)) => {
                    error!("{pad}  failed: {source:#}");
                    return Err(PipelineError::StageFailed {
                        stage: name.to_string(),
                        source,
                    }
                    .into());
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::GantryError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct RecordingStage {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        outcome: fn() -> StageResult,
    }

    #[async_trait]
    impl Stage for RecordingStage {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn run(&self, _ctx: &mut Context, _depth: usize) -> StageResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.outcome)()
        }
    }

    fn stage(
        name: &'static str,
        calls: &Arc<AtomicUsize>,
        outcome: fn() -> StageResult,
    ) -> RecordingStage {
        RecordingStage {
            name,
            calls: calls.clone(),
            outcome,
        }
    }

    fn ctx() -> Context {
        Context::new(Config::default())
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));

        let pipeline = Pipeline::new()
            .add(stage("first", &a, || Ok(())))
            .add(stage("second", &b, || Ok(())));

        let report = pipeline.run(&mut ctx(), 0).await.unwrap();
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert_eq!(report.stages.len(), 2);
        assert_eq!(report.stages[0].1, StageStatus::Completed);
    }

    #[tokio::test]
    async fn test_skip_does_not_abort() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));

        let pipeline = Pipeline::new()
            .add(stage("skipper", &a, || Err(StageError::skip("nothing to do"))))
            .add(stage("after", &b, || Ok(())));

        let report = pipeline.run(&mut ctx(), 0).await.unwrap();
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert_eq!(
            report.stages[0].1,
            StageStatus::Skipped("nothing to do".to_string())
        );
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_stages() {
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));

        let pipeline = Pipeline::new()
            .add(stage("boom", &a, || {
                Err(StageError::failed(anyhow::anyhow!("bad")))
            }))
            .add(stage("never", &b, || Ok(())));

        let err = pipeline.run(&mut ctx(), 0).await.unwrap_err();
        assert_eq!(b.load(Ordering::SeqCst), 0);
        match err {
            GantryError::Pipeline(PipelineError::StageFailed { stage, .. }) => {
                assert_eq!(stage, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
