use crate::error::SignerResult;
use crate::pipeline::core::{emit, PipelineStage, StageInput, StageOutput};
use crate::value::Value;
use async_trait::async_trait;
use tracing::debug;

const STAGE_NAME: &str = "combine_results";

/// Separator placed between the sorted per-item results
pub const RESULT_SEPARATOR: &str = "_";

/// Terminal stage that normalizes order and joins everything into one
/// result
///
/// Every upstream stage emits in completion order, so the final output's
/// determinism rests entirely on this stage sorting before it joins.
/// Receives until upstream closes, sorts ascending by byte order, joins
/// with [`RESULT_SEPARATOR`] and emits exactly one item, the empty
/// string when no items arrived.
pub struct CombineResultsStage;

impl CombineResultsStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CombineResultsStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineStage for CombineResultsStage {
    async fn run(self: Box<Self>, mut input: StageInput, output: StageOutput) -> SignerResult<()> {
        let mut acc: Vec<String> = Vec::new();
        while let Some(item) = input.recv().await {
            acc.push(item.into_text());
        }

        // The single point where cross-item order is imposed.
        acc.sort_unstable();
        let combined = acc.join(RESULT_SEPARATOR);
        debug!(items = acc.len(), "combined results");
        emit(&output, STAGE_NAME, Value::Text(combined)).await
    }

    fn name(&self) -> &str {
        STAGE_NAME
    }
}
