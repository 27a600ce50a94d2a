use rand::{seq::SliceRandom, Rng};

use crate::{
    error::{AppError, AppResult},
    models::{Movie, ShuffleResponse},
    services::sources::{MovieSource, PopularPoolFilter},
};

/// Number of movies returned by a shuffle
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Draws up to `sample_size` distinct movies uniformly at random from `pool`
///
/// Runs a full Fisher-Yates shuffle over the pool and keeps the prefix, so
/// every subset of the requested size is equally likely. A pool smaller than
/// the sample size is returned whole, in shuffled order.
pub fn sample_movies<R>(mut pool: Vec<Movie>, sample_size: usize, rng: &mut R) -> Vec<Movie>
where
    R: Rng + ?Sized,
{
    pool.shuffle(rng);
    pool.truncate(sample_size);
    pool
}

/// Fetches the popular pool and returns a random sample of it
pub async fn shuffle_popular(
    source: &dyn MovieSource,
    filter: &PopularPoolFilter,
    sample_size: usize,
) -> AppResult<ShuffleResponse> {
    let pool = source.fetch_popular_pool(filter).await?;

    if pool.is_empty() {
        return Err(AppError::NotFound(
            "No popular movies found in database".to_string(),
        ));
    }

    let pool_size = pool.len();
    let movies = sample_movies(pool, sample_size, &mut rand::thread_rng());

    tracing::info!(pool_size, sampled = movies.len(), "Shuffled popular movies");

    Ok(ShuffleResponse {
        total_found: movies.len(),
        movies,
        message: "Popular movies shuffled successfully".to_string(),
    })
}
