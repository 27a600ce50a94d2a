/// Read-through caching for an async data-source call.
///
/// Returns the cached value for `$key` when Redis has one. Otherwise awaits
/// `$block`, queues the result for storage with `$ttl` seconds to live, and
/// returns it. A failed cache read is logged and treated as a miss, so an
/// unreachable Redis only costs the speed-up. Errors from `$block` are
/// propagated with `?`, so the macro must be used in a function returning
/// `AppResult`.
///
/// # Arguments
/// * `$cache`: a `Cache` (anything with `get_from_cache` and `set_in_background`).
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live in seconds for a freshly stored value.
/// * `$block`: a future producing `AppResult<T>` on a miss.
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache, CacheKey::PopularPool, 3600, async {
///     self.inner.fetch_popular_pool(filter).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let hit = match $cache.get_from_cache(&$key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(key = %$key, error = %e, "Cache read failed, querying source");
                None
            }
        };

        if let Some(cached) = hit {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
