use crate::error::{SignerError, SignerResult};
use crate::hasher::{Hasher, SerializedHasher};
use crate::pipeline::core::{emit, PipelineStage, StageInput, StageOutput};
use crate::value::Value;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

const STAGE_NAME: &str = "single_hash";

/// Stage that signs each item with the slow primitive and brackets it
/// with two fast checksums
///
/// Per item the result is `fast(raw) + "~" + fast(slow(raw))`, in that
/// fixed order. The slow call goes through a [`SerializedHasher`], so no
/// two in-flight items ever invoke it concurrently; the two fast calls
/// for one item run concurrently with each other.
///
/// One worker is spawned per received item and the stage returns only
/// after every worker has finished. Items are emitted as their work
/// completes, not in input order.
pub struct SingleHashStage {
    slow: SerializedHasher,
    fast: Arc<dyn Hasher>,
}

impl SingleHashStage {
    pub fn new(slow: SerializedHasher, fast: Arc<dyn Hasher>) -> Self {
        Self { slow, fast }
    }
}

#[async_trait]
impl PipelineStage for SingleHashStage {
    async fn run(self: Box<Self>, mut input: StageInput, output: StageOutput) -> SignerResult<()> {
        let mut workers: JoinSet<SignerResult<()>> = JoinSet::new();

        while let Some(item) = input.recv().await {
            let slow = self.slow.clone();
            let fast = Arc::clone(&self.fast);
            let out = output.clone();
            workers.spawn(async move {
                let text = item.into_text();
                let signed = slow.digest(&text).await?;
                let (raw_sum, signed_sum) =
                    tokio::try_join!(fast.digest(&text), fast.digest(&signed))?;
                let combined = format!("{raw_sum}~{signed_sum}");
                debug!(item = %text, result = %combined, "single hash computed");
                emit(&out, STAGE_NAME, Value::Text(combined)).await
            });
        }

        // Wait-for-all: the output may only close after every worker has
        // emitted. A worker error aborts the remaining workers when the
        // set is dropped.
        while let Some(joined) = workers.join_next().await {
            joined.map_err(|e| SignerError::WorkerJoin(e.to_string()))??;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        STAGE_NAME
    }
}
