use super::core::{PipelineStage, DEFAULT_CHANNEL_CAPACITY};
use crate::error::{SignerError, SignerResult};
use crate::value::Value;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Pipeline executor that runs every stage concurrently
///
/// Stage `i` reads stream `i` and writes stream `i + 1`; stream `0` is fed
/// from the caller-provided source items and the terminal stream is
/// drained into the run's result. Streams are bounded channels, so the
/// capacity decides how far ahead upstream may run, never whether the run
/// is correct.
///
/// There is no partial-success mode: all stages always run to completion,
/// and the first stage error fails the whole run.
///
/// # Example
/// ```no_run
/// use datasigner::pipeline::stages::CombineResultsStage;
/// use datasigner::pipeline::Pipeline;
/// use datasigner::Value;
///
/// # async fn demo() -> datasigner::SignerResult<()> {
/// let pipeline = Pipeline::builder("combine-only")
///     .add_stage(CombineResultsStage::new())
///     .build();
///
/// let outputs = pipeline
///     .execute(vec![Value::from("b"), Value::from("a")])
///     .await?;
/// assert_eq!(outputs, vec![Value::from("a_b")]);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    name: String,
    stages: Vec<Box<dyn PipelineStage>>,
    channel_capacity: usize,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    /// Get the pipeline name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of stages
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Execute the pipeline over `source`, blocking until every stage has
    /// run to completion, and return the drained terminal stream
    pub async fn execute(self, source: Vec<Value>) -> SignerResult<Vec<Value>> {
        let Pipeline {
            name,
            stages,
            channel_capacity,
        } = self;
        let capacity = channel_capacity.max(1);

        info!(
            pipeline = %name,
            stages = stages.len(),
            items = source.len(),
            "starting pipeline"
        );

        let mut control: JoinSet<SignerResult<()>> = JoinSet::new();
        let (feed_tx, mut rx) = mpsc::channel(capacity);

        // The feeder owns stream 0; the bounded capacity decides how far
        // it may run ahead of the first stage.
        control.spawn(async move {
            for item in source {
                if feed_tx.send(item).await.is_err() {
                    // A stage failed and dropped its receiver; that
                    // stage's control task surfaces the error.
                    break;
                }
            }
            Ok(())
        });

        // One control task per stage. The stage's output closes exactly
        // once: when `run` has returned and its sender is dropped.
        for stage in stages {
            let (tx, next_rx) = mpsc::channel(capacity);
            let input = std::mem::replace(&mut rx, next_rx);
            control.spawn(async move {
                let stage_name = stage.name().to_string();
                debug!(stage = %stage_name, "stage started");
                match stage.run(input, tx).await {
                    Ok(()) => {
                        debug!(stage = %stage_name, "stage finished");
                        Ok(())
                    }
                    // A closed downstream stream means some other stage
                    // stopped receiving first; keep the symptom distinct
                    // so the root cause wins when errors are collected.
                    Err(err @ SignerError::StreamClosed(_)) => Err(err),
                    Err(err) => Err(SignerError::StageFailed {
                        stage: stage_name,
                        message: err.to_string(),
                    }),
                }
            });
        }

        // Drain the terminal stream while the stages run; the loop ends
        // when the last stage's output closes.
        let mut collected = Vec::new();
        while let Some(value) = rx.recv().await {
            collected.push(value);
        }

        // Every control task has to signal completion before the run is
        // considered done. Control tasks join in completion order, so a
        // stage that merely saw its downstream close may join before the
        // stage that actually failed; a closed-stream symptom therefore
        // never shadows a real stage failure.
        let mut first_err: Option<SignerError> = None;
        while let Some(joined) = control.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(err) => Err(SignerError::WorkerJoin(err.to_string())),
            };
            if let Err(err) = outcome {
                let replace = match (&first_err, &err) {
                    (None, _) => true,
                    (Some(SignerError::StreamClosed(_)), SignerError::StreamClosed(_)) => false,
                    (Some(SignerError::StreamClosed(_)), _) => true,
                    _ => false,
                };
                if replace {
                    first_err = Some(err);
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => {
                info!(pipeline = %name, items = collected.len(), "pipeline complete");
                Ok(collected)
            }
        }
    }
}

/// Builder for constructing pipelines
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Box<dyn PipelineStage>>,
    channel_capacity: usize,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Add a stage to the pipeline
    pub fn add_stage<S: PipelineStage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Add a boxed stage to the pipeline
    pub fn add_boxed_stage(mut self, stage: Box<dyn PipelineStage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Override the capacity of the streams connecting the stages
    ///
    /// A capacity of 1 to 4 is sufficient for any workload; values below 1
    /// are clamped up at execution time.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        Pipeline {
            name: self.name,
            stages: self.stages,
            channel_capacity: self.channel_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::core::{emit, StageInput, StageOutput};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // Test stage that appends a tag to every item's text
    struct TagStage {
        tag: &'static str,
    }

    impl TagStage {
        fn new(tag: &'static str) -> Self {
            Self { tag }
        }
    }

    #[async_trait]
    impl PipelineStage for TagStage {
        async fn run(
            self: Box<Self>,
            mut input: StageInput,
            output: StageOutput,
        ) -> SignerResult<()> {
            while let Some(item) = input.recv().await {
                let text = format!("{}{}", item.into_text(), self.tag);
                emit(&output, self.tag, Value::Text(text)).await?;
            }
            Ok(())
        }

        fn name(&self) -> &str {
            self.tag
        }
    }

    // Test stage that fails on the first received item
    struct FailStage;

    #[async_trait]
    impl PipelineStage for FailStage {
        async fn run(
            self: Box<Self>,
            mut input: StageInput,
            _output: StageOutput,
        ) -> SignerResult<()> {
            let _ = input.recv().await;
            Err(SignerError::PrimitiveFailed("boom".to_string()))
        }

        fn name(&self) -> &str {
            "fail"
        }
    }

    #[tokio::test]
    async fn test_empty_pipeline_is_passthrough() {
        let pipeline = Pipeline::builder("empty").build();
        let source = vec![Value::Int(1), Value::Int(2)];
        let out = pipeline.execute(source.clone()).await.unwrap();
        assert_eq!(out, source);
    }

    #[tokio::test]
    async fn test_stages_are_chained_in_order() {
        let pipeline = Pipeline::builder("chain")
            .add_stage(TagStage::new("a"))
            .add_stage(TagStage::new("b"))
            .build();

        let out = pipeline.execute(vec![Value::from("x")]).await.unwrap();
        assert_eq!(out, vec![Value::from("xab")]);
    }

    #[tokio::test]
    async fn test_empty_source_terminates() {
        let pipeline = Pipeline::builder("empty-source")
            .add_stage(TagStage::new("a"))
            .build();

        let out = pipeline.execute(Vec::new()).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_stage_failure_fails_the_run() {
        let pipeline = Pipeline::builder("failing")
            .add_stage(TagStage::new("a"))
            .add_stage(FailStage)
            .add_stage(TagStage::new("b"))
            .build();

        let err = pipeline
            .execute(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
            .await
            .unwrap_err();

        match err {
            SignerError::StageFailed { stage, message } => {
                assert_eq!(stage, "fail");
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_capacity_never_affects_the_result() {
        for capacity in [1, 2, 4] {
            let pipeline = Pipeline::builder("sizing")
                .add_stage(TagStage::new("t"))
                .channel_capacity(capacity)
                .build();

            let source: Vec<Value> = (0..16).map(Value::from).collect();
            let out = pipeline.execute(source).await.unwrap();
            assert_eq!(out.len(), 16);
            assert_eq!(out[0], Value::from("0t"));
            assert_eq!(out[15], Value::from("15t"));
        }
    }

    #[tokio::test]
    async fn test_builder_reports_shape() {
        let pipeline = Pipeline::builder("shape")
            .add_stage(TagStage::new("a"))
            .add_boxed_stage(Box::new(TagStage::new("b")))
            .build();
        assert_eq!(pipeline.name(), "shape");
        assert_eq!(pipeline.stage_count(), 2);
    }

    // Test stage that forwards items and records that end-of-data is
    // observed exactly once and is terminal
    struct ClosureCheckStage {
        name: &'static str,
        closures: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PipelineStage for ClosureCheckStage {
        async fn run(
            self: Box<Self>,
            mut input: StageInput,
            output: StageOutput,
        ) -> SignerResult<()> {
            while let Some(item) = input.recv().await {
                emit(&output, self.name, item).await?;
            }
            // Once closed, the stream must stay closed.
            assert!(input.recv().await.is_none());
            assert!(input.recv().await.is_none());
            self.closures.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    // Test stage that returns without draining its input
    struct EarlyReturnStage;

    #[async_trait]
    impl PipelineStage for EarlyReturnStage {
        async fn run(
            self: Box<Self>,
            _input: StageInput,
            _output: StageOutput,
        ) -> SignerResult<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "early-return"
        }
    }

    #[tokio::test]
    async fn test_streams_close_exactly_once_after_a_full_run() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::builder("closure")
            .add_stage(ClosureCheckStage {
                name: "first",
                closures: Arc::clone(&first),
            })
            .add_stage(ClosureCheckStage {
                name: "second",
                closures: Arc::clone(&second),
            })
            .build();

        let source: Vec<Value> = (0..8).map(Value::from).collect();
        let out = pipeline.execute(source).await.unwrap();

        assert_eq!(out.len(), 8);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_send_after_downstream_return_is_an_error() {
        let pipeline = Pipeline::builder("early-return")
            .add_stage(TagStage::new("a"))
            .add_stage(EarlyReturnStage)
            .build();

        let source: Vec<Value> = (0..8).map(Value::from).collect();
        let err = pipeline.execute(source).await.unwrap_err();

        match err {
            SignerError::StreamClosed(stage) => assert_eq!(stage, "a"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_failing_stage_outranks_upstream_closed_stream() {
        // The upstream stage keeps emitting when FailStage dies, so it
        // hits a closed stream; the run must still report FailStage.
        let pipeline = Pipeline::builder("attribution")
            .add_stage(TagStage::new("up"))
            .add_stage(FailStage)
            .build();

        let source: Vec<Value> = (0..8).map(Value::from).collect();
        let err = pipeline.execute(source).await.unwrap_err();

        match err {
            SignerError::StageFailed { stage, message } => {
                assert_eq!(stage, "fail");
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
