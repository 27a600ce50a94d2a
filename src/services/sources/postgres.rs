use sqlx::PgPool;
use tracing::instrument;

use crate::{
    error::{AppError, AppResult},
    models::Movie,
    services::sources::{escape_like, CandidateFilter, MovieSource, PopularPoolFilter},
};

/// Column list shared by every movie query
///
/// Numeric columns are cast so that whatever numeric type the dataset import
/// chose decodes into the `Movie` field types.
const MOVIE_COLUMNS: &str = "id::int8 AS id, title, genres, keywords, overview, tagline, \
     poster_path, backdrop_path, release_date::text AS release_date, original_title, \
     runtime::text AS runtime, adult::boolean AS adult, \
     vote_average::float8 AS vote_average, vote_count::int8 AS vote_count, \
     popularity::float8 AS popularity";

/// Reads movies straight from a Postgres table
#[derive(Clone)]
pub struct PostgresMovieSource {
    pool: PgPool,
    table: String,
}

impl PostgresMovieSource {
    /// Creates a source over `table`, rejecting names that are not plain identifiers
    pub fn new(pool: PgPool, table: impl Into<String>) -> AppResult<Self> {
        let table = table.into();
        if !is_valid_table_name(&table) {
            return Err(AppError::InvalidInput(format!(
                "Invalid movie table name: {}",
                table
            )));
        }
        Ok(Self { pool, table })
    }

    fn quoted_table(&self) -> String {
        format!("\"{}\"", self.table)
    }
}

/// Table names may only contain ASCII letters, digits, `_` and `-`
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn exact_title_sql(table: &str) -> String {
    format!("SELECT {MOVIE_COLUMNS} FROM {table} WHERE title ILIKE $1 LIMIT 1")
}

fn partial_title_sql(table: &str) -> String {
    format!("SELECT {MOVIE_COLUMNS} FROM {table} WHERE title ILIKE $1 LIMIT $2")
}

fn candidates_sql(table: &str) -> String {
    format!(
        r#"
        SELECT {MOVIE_COLUMNS}
        FROM {table}
        WHERE id <> $1
          AND genres IS NOT NULL
          AND vote_average IS NOT NULL
          AND poster_path IS NOT NULL
          AND overview IS NOT NULL
          AND vote_average::float8 >= $2
          AND vote_count::int8 >= $3
        ORDER BY popularity DESC NULLS LAST
        LIMIT $4
        "#
    )
}

fn popular_pool_sql(table: &str) -> String {
    format!(
        r#"
        SELECT {MOVIE_COLUMNS}
        FROM {table}
        WHERE poster_path IS NOT NULL
          AND overview IS NOT NULL
          AND vote_average::float8 >= $1
          AND vote_count::int8 >= $2
        ORDER BY popularity DESC NULLS LAST
        LIMIT $3
        "#
    )
}

#[async_trait::async_trait]
impl MovieSource for PostgresMovieSource {
    #[instrument(skip(self))]
    async fn find_by_exact_title(&self, title: &str) -> AppResult<Option<Movie>> {
        let sql = exact_title_sql(&self.quoted_table());
        let movie = sqlx::query_as::<_, Movie>(&sql)
            .bind(escape_like(title))
            .fetch_optional(&self.pool)
            .await?;
        Ok(movie)
    }

    #[instrument(skip(self))]
    async fn find_by_partial_title(&self, title: &str, limit: u32) -> AppResult<Vec<Movie>> {
        let sql = partial_title_sql(&self.quoted_table());
        let movies = sqlx::query_as::<_, Movie>(&sql)
            .bind(format!("%{}%", escape_like(title)))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(movies)
    }

    async fn sample_titles(&self, limit: u32) -> AppResult<Vec<String>> {
        let sql = format!("SELECT title FROM {} LIMIT $1", self.quoted_table());
        let titles = sqlx::query_scalar::<_, String>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(titles)
    }

    #[instrument(skip(self))]
    async fn fetch_candidates(
        &self,
        reference_id: i64,
        filter: &CandidateFilter,
    ) -> AppResult<Vec<Movie>> {
        let sql = candidates_sql(&self.quoted_table());
        let movies = sqlx::query_as::<_, Movie>(&sql)
            .bind(reference_id)
            .bind(filter.min_rating)
            .bind(filter.min_votes)
            .bind(i64::from(filter.limit))
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = movies.len(), "Fetched candidate pool");
        Ok(movies)
    }

    #[instrument(skip(self))]
    async fn fetch_popular_pool(&self, filter: &PopularPoolFilter) -> AppResult<Vec<Movie>> {
        let sql = popular_pool_sql(&self.quoted_table());
        let movies = sqlx::query_as::<_, Movie>(&sql)
            .bind(filter.min_rating)
            .bind(filter.min_votes)
            .bind(i64::from(filter.limit))
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(count = movies.len(), "Fetched popular pool");
        Ok(movies)
    }

    async fn count_movies(&self) -> AppResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.quoted_table());
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    fn table_name(&self) -> String {
        self.table.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_table_names() {
        assert!(is_valid_table_name("movie_dataset"));
        assert!(is_valid_table_name("movie-dataset"));
        assert!(is_valid_table_name("Movies2024"));
    }

    #[test]
    fn test_invalid_table_names() {
        assert!(!is_valid_table_name(""));
        assert!(!is_valid_table_name("movies; DROP TABLE users"));
        assert!(!is_valid_table_name("public.movies"));
        assert!(!is_valid_table_name("\"movies\""));
        assert!(!is_valid_table_name(&"m".repeat(64)));
    }

    #[test]
    fn test_candidates_sql_applies_every_gate() {
        let sql = candidates_sql("\"movie_dataset\"");
        assert!(sql.contains("FROM \"movie_dataset\""));
        assert!(sql.contains("id <> $1"));
        for column in ["genres", "vote_average", "poster_path", "overview"] {
            assert!(sql.contains(&format!("{column} IS NOT NULL")), "missing {column} gate");
        }
        assert!(sql.contains("vote_average::float8 >= $2"));
        assert!(sql.contains("vote_count::int8 >= $3"));
        assert!(sql.contains("ORDER BY popularity DESC"));
        assert!(sql.contains("LIMIT $4"));
    }

    #[test]
    fn test_popular_pool_sql_does_not_require_genres() {
        let sql = popular_pool_sql("\"movie_dataset\"");
        assert!(!sql.contains("genres IS NOT NULL"));
        assert!(sql.contains("poster_path IS NOT NULL"));
        assert!(sql.contains("LIMIT $3"));
    }

    #[test]
    fn test_movie_columns_include_display_fields() {
        for column in ["runtime::text AS runtime", "adult::boolean AS adult", "tagline"] {
            assert!(MOVIE_COLUMNS.contains(column), "missing {column}");
        }
    }

    #[test]
    fn test_title_lookups_use_ilike() {
        assert!(exact_title_sql("\"m\"").contains("title ILIKE $1 LIMIT 1"));
        assert!(partial_title_sql("\"m\"").contains("title ILIKE $1 LIMIT $2"));
    }
}
