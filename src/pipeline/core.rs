use crate::error::{SignerError, SignerResult};
use crate::value::Value;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Default bound for the streams connecting two stages
///
/// The capacity only limits how far ahead upstream may run; correctness
/// never depends on it.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 2;

/// Receiving end of the stream a stage consumes
pub type StageInput = mpsc::Receiver<Value>;

/// Sending end of the stream a stage produces
///
/// Closure (every sender dropped) is the only end-of-data signal between
/// stages; no stream is ever closed more than once.
pub type StageOutput = mpsc::Sender<Value>;

/// A single stage in a pipeline: consume one stream, produce another
///
/// A stage is constructed once, run exactly once by the executor, and then
/// discarded; `run` consumes the stage. The output stream closes when
/// `run` has returned and every worker's clone of the sender is dropped,
/// so no send can ever follow closure.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use datasigner::error::SignerResult;
/// use datasigner::pipeline::{PipelineStage, StageInput, StageOutput};
/// use datasigner::Value;
///
/// struct UppercaseStage;
///
/// #[async_trait]
/// impl PipelineStage for UppercaseStage {
///     async fn run(
///         self: Box<Self>,
///         mut input: StageInput,
///         output: StageOutput,
///     ) -> SignerResult<()> {
///         while let Some(item) = input.recv().await {
///             let text = item.into_text().to_uppercase();
///             if output.send(Value::Text(text)).await.is_err() {
///                 break;
///             }
///         }
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "uppercase"
///     }
/// }
/// ```
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Consume `input` until it closes and write results to `output`
    ///
    /// Returning an error fails the whole pipeline run; no items are ever
    /// silently dropped on the success path.
    async fn run(self: Box<Self>, input: StageInput, output: StageOutput) -> SignerResult<()>;

    /// Stage name for logging and diagnostics
    fn name(&self) -> &str;
}

/// Send `value` downstream, surfacing a closed stream as a stage error
pub(crate) async fn emit(output: &StageOutput, stage: &str, value: Value) -> SignerResult<()> {
    output
        .send(value)
        .await
        .map_err(|_| SignerError::StreamClosed(stage.to_string()))
}
