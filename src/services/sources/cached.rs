use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    models::Movie,
    services::sources::{CandidateFilter, MovieSource, PopularPoolFilter},
};

/// Redis read-through cache in front of another `MovieSource`
///
/// Only the queries repeated across searches are cached: reference lookups by
/// exact title, candidate pools per reference movie, and the popular pool.
/// Everything else goes straight to the wrapped source. When Redis cannot be
/// read the wrapped source answers instead.
#[derive(Clone)]
pub struct CachedMovieSource {
    inner: Arc<dyn MovieSource>,
    cache: Cache,
    ttl: u64,
}

impl CachedMovieSource {
    pub fn new(inner: Arc<dyn MovieSource>, cache: Cache, ttl: u64) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait::async_trait]
impl MovieSource for CachedMovieSource {
    async fn find_by_exact_title(&self, title: &str) -> AppResult<Option<Movie>> {
        let key = CacheKey::ExactTitle(title.to_string());
        cached!(self.cache, key, self.ttl, async {
            self.inner.find_by_exact_title(title).await
        })
    }

    async fn find_by_partial_title(&self, title: &str, limit: u32) -> AppResult<Vec<Movie>> {
        self.inner.find_by_partial_title(title, limit).await
    }

    async fn sample_titles(&self, limit: u32) -> AppResult<Vec<String>> {
        self.inner.sample_titles(limit).await
    }

    async fn fetch_candidates(
        &self,
        reference_id: i64,
        filter: &CandidateFilter,
    ) -> AppResult<Vec<Movie>> {
        let key = CacheKey::Candidates {
            reference_id,
            limit: filter.limit,
        };
        cached!(self.cache, key, self.ttl, async {
            self.inner.fetch_candidates(reference_id, filter).await
        })
    }

    async fn fetch_popular_pool(&self, filter: &PopularPoolFilter) -> AppResult<Vec<Movie>> {
        let key = CacheKey::PopularPool;
        cached!(self.cache, key, self.ttl, async {
            self.inner.fetch_popular_pool(filter).await
        })
    }

    async fn count_movies(&self) -> AppResult<i64> {
        self.inner.count_movies().await
    }

    fn table_name(&self) -> String {
        self.inner.table_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::create_redis_client, error::AppError, services::sources::MockMovieSource};

    // Nothing listens on port 1, so every cache read fails to connect
    fn unreachable_cache() -> Cache {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = Cache::new(client, "movie_dataset");
        cache
    }

    fn cached_source(inner: MockMovieSource) -> CachedMovieSource {
        CachedMovieSource::new(Arc::new(inner), unreachable_cache(), 60)
    }

    #[tokio::test]
    async fn test_popular_pool_served_when_redis_is_down() {
        let mut inner = MockMovieSource::new();
        inner
            .expect_fetch_popular_pool()
            .times(1)
            .returning(|_| Ok(vec![Movie::new(949, "Heat")]));

        let source = cached_source(inner);
        let pool = tokio_test::assert_ok!(
            source
                .fetch_popular_pool(&PopularPoolFilter::default())
                .await
        );

        assert_eq!(pool, vec![Movie::new(949, "Heat")]);
    }

    #[tokio::test]
    async fn test_candidates_and_title_served_when_redis_is_down() {
        let mut inner = MockMovieSource::new();
        inner
            .expect_fetch_candidates()
            .withf(|id, filter| *id == 603 && filter.limit == 200)
            .times(1)
            .returning(|_, _| Ok(vec![Movie::new(604, "The Matrix Reloaded")]));
        inner
            .expect_find_by_exact_title()
            .withf(|title| title == "The Matrix")
            .times(1)
            .returning(|_| Ok(Some(Movie::new(603, "The Matrix"))));

        let source = cached_source(inner);

        let candidates = source
            .fetch_candidates(603, &CandidateFilter::default())
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);

        let found = source.find_by_exact_title("The Matrix").await.unwrap();
        assert_eq!(found.map(|m| m.id), Some(603));
    }

    #[tokio::test]
    async fn test_source_errors_still_propagate() {
        let mut inner = MockMovieSource::new();
        inner
            .expect_fetch_popular_pool()
            .returning(|_| Err(AppError::DataSource("upstream down".to_string())));

        let result = cached_source(inner)
            .fetch_popular_pool(&PopularPoolFilter::default())
            .await;

        assert!(matches!(result, Err(AppError::DataSource(_))));
    }

    #[tokio::test]
    async fn test_uncached_calls_pass_through() {
        let mut inner = MockMovieSource::new();
        inner
            .expect_find_by_partial_title()
            .withf(|title, limit| title == "matrix" && *limit == 10)
            .returning(|_, _| Ok(vec![Movie::new(603, "The Matrix")]));
        inner.expect_count_movies().returning(|| Ok(4803));
        inner
            .expect_table_name()
            .returning(|| "movie_dataset".to_string());

        let source = cached_source(inner);

        assert_eq!(source.find_by_partial_title("matrix", 10).await.unwrap().len(), 1);
        assert_eq!(source.count_movies().await.unwrap(), 4803);
        assert_eq!(source.table_name(), "movie_dataset");
    }
}
