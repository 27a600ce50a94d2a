use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

/// Cached data-source queries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Reference lookup by exact (case-insensitive) title
    ExactTitle(String),
    /// Candidate pool for a reference movie id, capped at `limit` rows
    Candidates { reference_id: i64, limit: u32 },
    /// Popular pool used by the shuffle
    PopularPool,
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::ExactTitle(title) => write!(f, "title:{}", title.trim().to_lowercase()),
            CacheKey::Candidates {
                reference_id,
                limit,
            } => write!(f, "candidates:{}:{}", reference_id, limit),
            CacheKey::PopularPool => write!(f, "popular"),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Cache handler for storing and retrieving query results in Redis
///
/// Keys are prefixed with a namespace (the movie table name) so that two
/// deployments reading different tables can share one Redis instance.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    namespace: String,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task to flush pending writes and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a cache and spawns its background writer task
    ///
    /// Writes are queued on a channel so that storing a freshly fetched pool
    /// never delays the response that needed it.
    pub fn new(redis_client: Client, namespace: impl Into<String>) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            namespace: namespace.into(),
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx })
    }

    /// Full Redis key for `key` within this cache's namespace
    pub fn redis_key(&self, key: &CacheKey) -> String {
        format!("movies:{}:{}", self.namespace, key)
    }

    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");
        let mut written: u64 = 0;
        let mut failed: u64 = 0;

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    match Self::write_to_redis(&client, msg).await {
                        Ok(()) => written += 1,
                        Err(e) => {
                            failed += 1;
                            tracing::error!(error = %e, "Failed to write to Redis cache");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    // Drain whatever was queued before the signal
                    write_rx.close();
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            failed += 1;
                            tracing::error!(
                                error = %e,
                                "Failed to flush cache write during shutdown"
                            );
                        } else {
                            written += 1;
                        }
                    }

                    tracing::info!(written, failed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves and deserializes a cached value, `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(self.redis_key(key)).await?;

        match cached {
            Some(json) => {
                tracing::debug!(key = %key, "Cache hit");
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => {
                tracing::debug!(key = %key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Queues a value for storage without waiting for Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: self.redis_key(key),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display_exact_title() {
        let key = CacheKey::ExactTitle("  The MATRIX ".to_string());
        assert_eq!(format!("{}", key), "title:the matrix");
    }

    #[test]
    fn test_cache_key_display_candidates() {
        let key = CacheKey::Candidates {
            reference_id: 27205,
            limit: 200,
        };
        assert_eq!(format!("{}", key), "candidates:27205:200");
    }

    #[test]
    fn test_cache_key_display_popular_pool() {
        assert_eq!(format!("{}", CacheKey::PopularPool), "popular");
    }

    #[tokio::test]
    async fn test_redis_key_is_namespaced() {
        // Client::open only parses the URL, no connection is made
        let client = create_redis_client("redis://localhost:6379").unwrap();
        let (cache, _handle) = Cache::new(client, "movie_dataset");

        assert_eq!(
            cache.redis_key(&CacheKey::Candidates {
                reference_id: 1,
                limit: 200
            }),
            "movies:movie_dataset:candidates:1:200"
        );
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_set_in_background_then_get() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let (cache, handle) = Cache::new(client.clone(), "cache_test");

        let key = CacheKey::Candidates {
            reference_id: -1,
            limit: 2,
        };
        let value = vec!["Alien".to_string(), "Aliens".to_string()];
        cache.set_in_background(&key, &value, 60);

        // Shutdown flushes the queued write
        handle.shutdown().await;
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(cache.redis_key(&key)).await.unwrap();
    }
}
