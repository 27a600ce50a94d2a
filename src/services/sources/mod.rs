//! Movie data sources
//!
//! The ranking core never touches storage. Everything it needs arrives through
//! a `MovieSource`, which hides whether rows come from Postgres directly, from
//! the hosted PostgREST endpoint, or from the Redis cache in front of either.

use crate::{error::AppResult, models::Movie};

pub mod cached;
pub mod postgres;
pub mod supabase;

pub use cached::CachedMovieSource;
pub use postgres::PostgresMovieSource;
pub use supabase::SupabaseMovieSource;

pub const DEFAULT_CANDIDATE_POOL_SIZE: u32 = 200;
pub const DEFAULT_CANDIDATE_MIN_RATING: f64 = 5.0;
pub const DEFAULT_CANDIDATE_MIN_VOTES: i64 = 100;

pub const DEFAULT_POPULAR_POOL_SIZE: u32 = 50;
pub const DEFAULT_POPULAR_MIN_RATING: f64 = 7.0;
pub const DEFAULT_POPULAR_MIN_VOTES: i64 = 1000;

/// Partial title matches considered when no exact match exists
pub const PARTIAL_MATCH_LIMIT: u32 = 10;

/// Predicates for the recommendation candidate pool
///
/// Candidates must have genres, a rating, a poster and an overview, clear both
/// quality gates, and come back ordered by popularity descending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateFilter {
    pub min_rating: f64,
    pub min_votes: i64,
    pub limit: u32,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self {
            min_rating: DEFAULT_CANDIDATE_MIN_RATING,
            min_votes: DEFAULT_CANDIDATE_MIN_VOTES,
            limit: DEFAULT_CANDIDATE_POOL_SIZE,
        }
    }
}

/// Predicates for the popular pool the shuffle samples from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopularPoolFilter {
    pub min_rating: f64,
    pub min_votes: i64,
    pub limit: u32,
}

impl Default for PopularPoolFilter {
    fn default() -> Self {
        Self {
            min_rating: DEFAULT_POPULAR_MIN_RATING,
            min_votes: DEFAULT_POPULAR_MIN_VOTES,
            limit: DEFAULT_POPULAR_POOL_SIZE,
        }
    }
}

/// Trait for movie catalog backends
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieSource: Send + Sync {
    /// First movie whose title equals `title`, ignoring case
    async fn find_by_exact_title(&self, title: &str) -> AppResult<Option<Movie>>;

    /// Up to `limit` movies whose title contains `title`, ignoring case
    async fn find_by_partial_title(&self, title: &str, limit: u32) -> AppResult<Vec<Movie>>;

    /// A handful of titles used to suggest searches when nothing matched
    async fn sample_titles(&self, limit: u32) -> AppResult<Vec<String>>;

    /// Recommendation candidates for `reference_id`, popularity descending
    async fn fetch_candidates(
        &self,
        reference_id: i64,
        filter: &CandidateFilter,
    ) -> AppResult<Vec<Movie>>;

    /// Highly rated, well reviewed movies, popularity descending
    async fn fetch_popular_pool(&self, filter: &PopularPoolFilter) -> AppResult<Vec<Movie>>;

    /// Total number of rows in the catalog table
    async fn count_movies(&self) -> AppResult<i64>;

    /// Name of the catalog table this source reads from
    fn table_name(&self) -> String;
}

/// Escapes `%`, `_` and `\` so user input matches literally inside a LIKE pattern
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
