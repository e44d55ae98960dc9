use crate::error::SignerResult;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// A hash primitive: digests a string into a hex-encoded string
///
/// Implementations may fail; a failed digest is fatal to the pipeline run
/// that issued it. There is no retry layer.
#[async_trait]
pub trait Hasher: Send + Sync {
    /// Compute the digest of `input`
    async fn digest(&self, input: &str) -> SignerResult<String>;
}

/// SHA-256 hasher, the slow primitive
///
/// Stands in for an expensive keyed hash that is not safe under unbounded
/// concurrent invocation; when more than one call can be in flight, route
/// every call through a [`SerializedHasher`]. The optional delay models
/// the latency of the real primitive and is useful in demos and tests.
pub struct Sha256Hasher {
    delay: Option<Duration>,
}

impl Sha256Hasher {
    pub fn new() -> Self {
        Self { delay: None }
    }

    /// Create a hasher that sleeps for `delay` before each digest
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hasher for Sha256Hasher {
    async fn digest(&self, input: &str) -> SignerResult<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// BLAKE3 hasher, the fast primitive; safe under arbitrary concurrency
pub struct Blake3Hasher;

impl Blake3Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hasher for Blake3Hasher {
    async fn digest(&self, input: &str) -> SignerResult<String> {
        Ok(blake3::hash(input.as_bytes()).to_hex().to_string())
    }
}

/// Serializing wrapper around a hash primitive
///
/// Guarantees that at most one call to the wrapped hasher is in flight at
/// any time, across every clone of the wrapper. The lock is held only for
/// the duration of the digest itself, never across unrelated work.
///
/// This is the capability handed to stages that use a primitive which is
/// not safe to invoke concurrently.
#[derive(Clone)]
pub struct SerializedHasher {
    inner: Arc<dyn Hasher>,
    lock: Arc<Mutex<()>>,
}

impl SerializedHasher {
    pub fn new(inner: Arc<dyn Hasher>) -> Self {
        Self {
            inner,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Digest `input` through the wrapped primitive, serialized against
    /// every other call that goes through this wrapper or a clone of it
    pub async fn digest(&self, input: &str) -> SignerResult<String> {
        let _guard = self.lock.lock().await;
        self.inner.digest(input).await
    }
}
