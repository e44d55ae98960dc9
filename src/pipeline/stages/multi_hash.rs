use crate::error::{SignerError, SignerResult};
use crate::hasher::Hasher;
use crate::pipeline::core::{emit, PipelineStage, StageInput, StageOutput};
use crate::value::Value;
use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

const STAGE_NAME: &str = "multi_hash";

/// Fan-out count used by the production pipeline
pub const DEFAULT_FAN_OUT: usize = 6;

/// Stage that widens each item into a fixed fan-out of fast checksums
///
/// Per item, K fast digests of `"{i}{text}"` for i in `0..K` are launched
/// concurrently and concatenated strictly in index order. Index order is
/// what makes the otherwise-unordered fan-out deterministic per item. The
/// fast primitive is safe under arbitrary concurrency, so no lock is
/// involved.
///
/// One worker per received item, wait-for-all before the stage returns;
/// cross-item emission order is completion order.
pub struct MultiHashStage {
    fast: Arc<dyn Hasher>,
    fan_out: usize,
}

impl MultiHashStage {
    pub fn new(fast: Arc<dyn Hasher>) -> Self {
        Self {
            fast,
            fan_out: DEFAULT_FAN_OUT,
        }
    }

    /// Create a stage with a non-default fan-out count
    pub fn with_fan_out(fast: Arc<dyn Hasher>, fan_out: usize) -> Self {
        Self { fast, fan_out }
    }
}

#[async_trait]
impl PipelineStage for MultiHashStage {
    async fn run(self: Box<Self>, mut input: StageInput, output: StageOutput) -> SignerResult<()> {
        let fan_out = self.fan_out;
        let mut workers: JoinSet<SignerResult<()>> = JoinSet::new();

        while let Some(item) = input.recv().await {
            let fast = Arc::clone(&self.fast);
            let out = output.clone();
            workers.spawn(async move {
                let text = item.into_text();
                // try_join_all keeps results in launch order, so the
                // concatenation is by index no matter which digest
                // finishes first.
                let digests = try_join_all((0..fan_out).map(|i| {
                    let fast = Arc::clone(&fast);
                    let salted = format!("{i}{text}");
                    async move { fast.digest(&salted).await }
                }))
                .await?;
                let combined = digests.concat();
                debug!(item = %text, result = %combined, "multi hash computed");
                emit(&out, STAGE_NAME, Value::Text(combined)).await
            });
        }

        while let Some(joined) = workers.join_next().await {
            joined.map_err(|e| SignerError::WorkerJoin(e.to_string()))??;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        STAGE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct StubHasher;

    #[async_trait]
    impl Hasher for StubHasher {
        async fn digest(&self, input: &str) -> SignerResult<String> {
            Ok(format!("F({})", input))
        }
    }

    /// Hasher whose latency drops as the leading salt digit grows, so the
    /// highest index always finishes first
    struct ReverseDelayHasher;

    #[async_trait]
    impl Hasher for ReverseDelayHasher {
        async fn digest(&self, input: &str) -> SignerResult<String> {
            let lead = input
                .chars()
                .next()
                .and_then(|c| c.to_digit(10))
                .unwrap_or(0) as u64;
            tokio::time::sleep(Duration::from_millis((9 - lead.min(9)) * 5)).await;
            Ok(format!("F({})", input))
        }
    }

    async fn run_stage(stage: MultiHashStage, items: Vec<Value>) -> SignerResult<Vec<String>> {
        let (in_tx, in_rx) = mpsc::channel(2);
        let (out_tx, mut out_rx) = mpsc::channel(2);

        let feeder = tokio::spawn(async move {
            for item in items {
                if in_tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        let runner = tokio::spawn(Box::new(stage).run(in_rx, out_tx));

        let mut got = Vec::new();
        while let Some(v) = out_rx.recv().await {
            got.push(v.into_text());
        }
        feeder.await.unwrap();
        runner.await.unwrap()?;
        Ok(got)
    }

    #[tokio::test]
    async fn test_default_fan_out_concatenates_six_segments() {
        let stage = MultiHashStage::new(Arc::new(StubHasher));
        let got = run_stage(stage, vec![Value::from("x")]).await.unwrap();

        let expected: String = (0..DEFAULT_FAN_OUT).map(|i| format!("F({i}x)")).collect();
        assert_eq!(got, vec![expected]);
    }

    #[tokio::test]
    async fn test_concatenation_is_index_ordered_despite_completion_order() {
        let stage = MultiHashStage::with_fan_out(Arc::new(ReverseDelayHasher), 3);
        let got = run_stage(stage, vec![Value::from("x")]).await.unwrap();

        assert_eq!(got, vec!["F(0x)F(1x)F(2x)".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_input_emits_nothing() {
        let stage = MultiHashStage::new(Arc::new(StubHasher));
        let got = run_stage(stage, Vec::new()).await.unwrap();
        assert!(got.is_empty());
    }
}
