/// Read-through caching for catalog API calls.
///
/// Returns the cached value for `$key` when present. Otherwise awaits `$block`,
/// hands the result to the background writer with `$ttl` seconds to live, and
/// returns it. A failed cache read is logged and treated as a miss so that a
/// Redis outage slows ingestion down instead of stopping it.
///
/// # Example
/// ```ignore
/// let details: serde_json::Value = cached!(
///     self.cache,
///     CacheKey::MovieDetails(movie_id),
///     DETAILS_CACHE_TTL,
///     async move { self.get_json(&url).await }
/// )?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let cached = match $cache.get_from_cache(&$key).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(error = %e, key = %$key, "Cache read failed, fetching fresh");
                None
            }
        };

        if let Some(cached) = cached {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
