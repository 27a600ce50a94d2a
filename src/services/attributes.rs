use crate::models::Movie;

/// Splits a comma-separated column into trimmed, non-empty tokens
///
/// Order is preserved and no case folding happens here; matching is
/// case-insensitive at comparison time instead.
pub fn split_tokens(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Normalized genre tokens of a movie
pub fn genres_of(movie: &Movie) -> Vec<String> {
    split_tokens(movie.genres.as_deref())
}

/// Normalized keyword tokens of a movie
pub fn keywords_of(movie: &Movie) -> Vec<String> {
    split_tokens(movie.keywords.as_deref())
}

/// The searched movie's attributes, normalized once per ranking call
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceProfile {
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    pub rating: f64,
    pub popularity: f64,
}

impl ReferenceProfile {
    pub fn from_movie(movie: &Movie) -> Self {
        Self {
            genres: genres_of(movie),
            keywords: keywords_of(movie),
            rating: movie.rating(),
            popularity: movie.popularity_score(),
        }
    }
}
