use crate::error::{SignerError, SignerResult};
use crate::hasher::{Hasher, SerializedHasher};
use crate::pipeline::stages::{CombineResultsStage, MultiHashStage, SingleHashStage};
use crate::pipeline::Pipeline;
use crate::value::Value;
use std::sync::Arc;
use tracing::info;

/// Run the full signing pipeline over `items` and return the aggregate
/// signature
///
/// `slow` is invoked at most once at a time across the whole run; `fast`
/// may be invoked with arbitrary concurrency. The result is deterministic
/// for a given multiset of items: the terminal stage sorts before it
/// joins, so permuting the input never changes the signature.
///
/// # Example
/// ```no_run
/// use datasigner::hasher::{Blake3Hasher, Sha256Hasher};
/// use datasigner::pipeline::stages::DEFAULT_FAN_OUT;
/// use datasigner::{sign_items, Value};
/// use std::sync::Arc;
///
/// # async fn demo() -> datasigner::SignerResult<()> {
/// let items: Vec<Value> = (0..10).map(Value::from).collect();
/// let signature = sign_items(
///     items,
///     Arc::new(Sha256Hasher::new()),
///     Arc::new(Blake3Hasher::new()),
///     DEFAULT_FAN_OUT,
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn sign_items(
    items: impl IntoIterator<Item = Value>,
    slow: Arc<dyn Hasher>,
    fast: Arc<dyn Hasher>,
    fan_out: usize,
) -> SignerResult<String> {
    let slow = SerializedHasher::new(slow);
    let pipeline = Pipeline::builder("data-signer")
        .add_stage(SingleHashStage::new(slow, Arc::clone(&fast)))
        .add_stage(MultiHashStage::with_fan_out(fast, fan_out))
        .add_stage(CombineResultsStage::new())
        .build();

    let mut outputs = pipeline.execute(items.into_iter().collect()).await?;
    let signature = match outputs.pop() {
        Some(value) if outputs.is_empty() => value.into_text(),
        _ => return Err(SignerError::MissingOutput),
    };

    info!(signature = %signature, "aggregate signature computed");
    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::{Blake3Hasher, Sha256Hasher};

    #[tokio::test]
    async fn test_production_hashers_are_deterministic() {
        let items: Vec<Value> = (0..3).map(Value::from).collect();

        let first = sign_items(
            items.clone(),
            Arc::new(Sha256Hasher::new()),
            Arc::new(Blake3Hasher::new()),
            6,
        )
        .await
        .unwrap();

        let second = sign_items(
            items,
            Arc::new(Sha256Hasher::new()),
            Arc::new(Blake3Hasher::new()),
            6,
        )
        .await
        .unwrap();

        assert_eq!(first, second);
        // Three items joined by two separators.
        assert_eq!(first.matches('_').count(), 2);
    }
}
