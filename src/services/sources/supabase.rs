//! Hosted Postgres behind Supabase's PostgREST API
//!
//! Filters are expressed as PostgREST query parameters, e.g.
//! `GET /rest/v1/movie_dataset?vote_average=gte.5&order=popularity.desc&limit=200`.
//! Repeating a column applies every predicate on it.

use reqwest::{header::HeaderMap, Client as HttpClient, Response};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    error::{AppError, AppResult},
    models::Movie,
    services::sources::{
        escape_like, CandidateFilter, MovieSource, PopularPoolFilter, PARTIAL_MATCH_LIMIT,
    },
};

type QueryParams = Vec<(&'static str, String)>;

#[derive(Clone)]
pub struct SupabaseMovieSource {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
    table: String,
}

#[derive(Debug, Deserialize)]
struct TitleRow {
    title: String,
}

impl SupabaseMovieSource {
    pub fn new(base_url: String, api_key: String, table: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
            api_key,
            table,
        }
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            self.table
        )
    }

    async fn send(&self, params: &QueryParams, count_exact: bool) -> AppResult<Response> {
        let mut request = self
            .http_client
            .get(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(params);

        if count_exact {
            request = request.header("Prefer", "count=exact");
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                table = %self.table,
                "Supabase query failed"
            );
            return Err(AppError::DataSource(format!(
                "Supabase returned {}: {}",
                status, body
            )));
        }

        Ok(response)
    }

    async fn get_rows<T: DeserializeOwned>(&self, params: QueryParams) -> AppResult<Vec<T>> {
        let rows = self.send(&params, false).await?.json::<Vec<T>>().await?;
        Ok(rows)
    }
}

/// LIKE pattern for a PostgREST `ilike` filter matching `input` literally
///
/// PostgREST rewrites every `*` to `%` and offers no escape for it, so a `*`
/// in the input becomes the single-character wildcard `_`. Callers needing an
/// exact match must recheck the returned titles.
fn postgrest_like_pattern(input: &str) -> String {
    escape_like(input).replace('*', "_")
}

fn exact_title_params(title: &str) -> QueryParams {
    // A `*` widens the pattern, so fetch a few rows and pick the real match
    let limit = if title.contains('*') {
        PARTIAL_MATCH_LIMIT
    } else {
        1
    };
    vec![
        ("select", "*".to_string()),
        ("title", format!("ilike.{}", postgrest_like_pattern(title))),
        ("limit", limit.to_string()),
    ]
}

fn partial_title_params(title: &str, limit: u32) -> QueryParams {
    vec![
        ("select", "*".to_string()),
        ("title", format!("ilike.*{}*", postgrest_like_pattern(title))),
        ("limit", limit.to_string()),
    ]
}

fn same_title(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn candidate_params(reference_id: i64, filter: &CandidateFilter) -> QueryParams {
    vec![
        ("select", "*".to_string()),
        ("id", format!("neq.{}", reference_id)),
        ("genres", "not.is.null".to_string()),
        ("vote_average", "not.is.null".to_string()),
        ("poster_path", "not.is.null".to_string()),
        ("overview", "not.is.null".to_string()),
        ("vote_average", format!("gte.{}", filter.min_rating)),
        ("vote_count", format!("gte.{}", filter.min_votes)),
        ("order", "popularity.desc".to_string()),
        ("limit", filter.limit.to_string()),
    ]
}

fn popular_pool_params(filter: &PopularPoolFilter) -> QueryParams {
    vec![
        ("select", "*".to_string()),
        ("poster_path", "not.is.null".to_string()),
        ("overview", "not.is.null".to_string()),
        ("vote_average", format!("gte.{}", filter.min_rating)),
        ("vote_count", format!("gte.{}", filter.min_votes)),
        ("order", "popularity.desc".to_string()),
        ("limit", filter.limit.to_string()),
    ]
}

/// Reads the total from a `Content-Range` header such as `0-0/4803` or `*/0`
fn parse_content_range_total(headers: &HeaderMap) -> Option<i64> {
    headers
        .get("content-range")?
        .to_str()
        .ok()?
        .rsplit('/')
        .next()?
        .parse()
        .ok()
}

#[async_trait::async_trait]
impl MovieSource for SupabaseMovieSource {
    async fn find_by_exact_title(&self, title: &str) -> AppResult<Option<Movie>> {
        let movies: Vec<Movie> = self.get_rows(exact_title_params(title)).await?;
        Ok(movies.into_iter().find(|movie| same_title(&movie.title, title)))
    }

    async fn find_by_partial_title(&self, title: &str, limit: u32) -> AppResult<Vec<Movie>> {
        self.get_rows(partial_title_params(title, limit)).await
    }

    async fn sample_titles(&self, limit: u32) -> AppResult<Vec<String>> {
        let rows: Vec<TitleRow> = self
            .get_rows(vec![
                ("select", "title".to_string()),
                ("limit", limit.to_string()),
            ])
            .await?;
        Ok(rows.into_iter().map(|row| row.title).collect())
    }

    async fn fetch_candidates(
        &self,
        reference_id: i64,
        filter: &CandidateFilter,
    ) -> AppResult<Vec<Movie>> {
        let movies: Vec<Movie> = self
            .get_rows(candidate_params(reference_id, filter))
            .await?;
        tracing::debug!(count = movies.len(), "Fetched candidate pool from Supabase");
        Ok(movies)
    }

    async fn fetch_popular_pool(&self, filter: &PopularPoolFilter) -> AppResult<Vec<Movie>> {
        let movies: Vec<Movie> = self.get_rows(popular_pool_params(filter)).await?;
        tracing::debug!(count = movies.len(), "Fetched popular pool from Supabase");
        Ok(movies)
    }

    async fn count_movies(&self) -> AppResult<i64> {
        let params = vec![("select", "id".to_string()), ("limit", "1".to_string())];
        let response = self.send(&params, true).await?;

        parse_content_range_total(response.headers()).ok_or_else(|| {
            AppError::DataSource("Supabase response had no usable Content-Range".to_string())
        })
    }

    fn table_name(&self) -> String {
        self.table.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn value_of<'a>(params: &'a QueryParams, key: &str) -> Vec<&'a str> {
        params
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn test_table_url_trims_trailing_slash() {
        let source = SupabaseMovieSource::new(
            "https://abc.supabase.co/".to_string(),
            "anon".to_string(),
            "movie_dataset".to_string(),
        );
        assert_eq!(
            source.table_url(),
            "https://abc.supabase.co/rest/v1/movie_dataset"
        );
    }

    #[test]
    fn test_candidate_params() {
        let params = candidate_params(27205, &CandidateFilter::default());

        assert_eq!(value_of(&params, "id"), vec!["neq.27205"]);
        assert_eq!(value_of(&params, "genres"), vec!["not.is.null"]);
        assert_eq!(
            value_of(&params, "vote_average"),
            vec!["not.is.null", "gte.5"]
        );
        assert_eq!(value_of(&params, "vote_count"), vec!["gte.100"]);
        assert_eq!(value_of(&params, "order"), vec!["popularity.desc"]);
        assert_eq!(value_of(&params, "limit"), vec!["200"]);
    }

    #[test]
    fn test_popular_pool_params() {
        let params = popular_pool_params(&PopularPoolFilter::default());

        assert!(value_of(&params, "genres").is_empty());
        assert_eq!(value_of(&params, "vote_average"), vec!["gte.7"]);
        assert_eq!(value_of(&params, "vote_count"), vec!["gte.1000"]);
        assert_eq!(value_of(&params, "limit"), vec!["50"]);
    }

    #[test]
    fn test_title_params_escape_wildcards() {
        let exact = exact_title_params("50% Off");
        assert_eq!(value_of(&exact, "title"), vec!["ilike.50\\% Off"]);

        let partial = partial_title_params("matrix", 10);
        assert_eq!(value_of(&partial, "title"), vec!["ilike.*matrix*"]);
        assert_eq!(value_of(&partial, "limit"), vec!["10"]);
    }

    #[test]
    fn test_title_params_neutralize_asterisks() {
        let exact = exact_title_params("M*A*S*H");
        assert_eq!(value_of(&exact, "title"), vec!["ilike.M_A_S_H"]);
        assert_eq!(value_of(&exact, "limit"), vec!["10"]);

        let partial = partial_title_params("M*A", 10);
        assert_eq!(value_of(&partial, "title"), vec!["ilike.*M_A*"]);

        assert!(same_title("M*A*S*H", "m*a*s*h"));
        assert!(!same_title("M*A*S*H", "M-A-S-H"));
    }

    #[test]
    fn test_parse_content_range_total() {
        let mut headers = HeaderMap::new();
        headers.insert("content-range", HeaderValue::from_static("0-0/4803"));
        assert_eq!(parse_content_range_total(&headers), Some(4803));

        headers.insert("content-range", HeaderValue::from_static("*/0"));
        assert_eq!(parse_content_range_total(&headers), Some(0));

        headers.insert("content-range", HeaderValue::from_static("0-0/*"));
        assert_eq!(parse_content_range_total(&headers), None);

        assert_eq!(parse_content_range_total(&HeaderMap::new()), None);
    }
}
