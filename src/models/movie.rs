use serde::{Deserialize, Deserializer, Serialize};

/// A movie record as stored in the catalog table
///
/// Everything except `id` and `title` may be missing in the dataset, so the
/// remaining columns are optional and default to `None` when absent or null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    /// Comma-separated genre names, e.g. "Action, Science Fiction"
    #[serde(default)]
    pub genres: Option<String>,
    /// Comma-separated free-text keywords
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    /// Running time as stored, e.g. "136" or "2h 16m"
    #[serde(default, deserialize_with = "text_or_number")]
    pub runtime: Option<String>,
    #[serde(default)]
    pub adult: Option<bool>,
    /// Average rating on a 0-10 scale
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
    #[serde(default)]
    pub popularity: Option<f64>,
}

impl Movie {
    /// Minimal record with only the required columns set
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            genres: None,
            keywords: None,
            overview: None,
            tagline: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            original_title: None,
            runtime: None,
            adult: None,
            vote_average: None,
            vote_count: None,
            popularity: None,
        }
    }

    /// Title folded for duplicate detection: lowercased and trimmed
    pub fn normalized_title(&self) -> String {
        self.title.trim().to_lowercase()
    }

    /// Rating with absent or non-finite values treated as zero
    pub fn rating(&self) -> f64 {
        finite_or_zero(self.vote_average)
    }

    /// Popularity with absent or non-finite values treated as zero
    pub fn popularity_score(&self) -> f64 {
        finite_or_zero(self.popularity)
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

/// Imports disagree on whether `runtime` is a text or numeric column
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|value| match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_title() {
        let movie = Movie::new(1, "  The Matrix ");
        assert_eq!(movie.normalized_title(), "the matrix");
    }

    #[test]
    fn test_missing_numbers_default_to_zero() {
        let mut movie = Movie::new(1, "Heat");
        assert_eq!(movie.rating(), 0.0);
        assert_eq!(movie.popularity_score(), 0.0);

        movie.vote_average = Some(f64::NAN);
        movie.popularity = Some(f64::INFINITY);
        assert_eq!(movie.rating(), 0.0);
        assert_eq!(movie.popularity_score(), 0.0);
    }

    #[test]
    fn test_deserialize_sparse_row() {
        let movie: Movie = serde_json::from_str(
            r#"{"id": 27205, "title": "Inception", "genres": null, "vote_average": 8.4}"#,
        )
        .unwrap();

        assert_eq!(movie.id, 27205);
        assert_eq!(movie.genres, None);
        assert_eq!(movie.keywords, None);
        assert_eq!(movie.vote_average, Some(8.4));
        assert_eq!(movie.vote_count, None);
        assert_eq!(movie.runtime, None);
        assert_eq!(movie.adult, None);
    }

    #[test]
    fn test_deserialize_runtime_and_adult() {
        let movie: Movie = serde_json::from_str(
            r#"{"id": 603, "title": "The Matrix", "runtime": "136", "adult": false}"#,
        )
        .unwrap();
        assert_eq!(movie.runtime.as_deref(), Some("136"));
        assert_eq!(movie.adult, Some(false));

        let numeric: Movie =
            serde_json::from_str(r#"{"id": 603, "title": "The Matrix", "runtime": 136}"#)
                .unwrap();
        assert_eq!(numeric.runtime.as_deref(), Some("136"));

        let value = serde_json::to_value(&movie).unwrap();
        assert_eq!(value["runtime"], "136");
        assert_eq!(value["adult"], false);
    }
}
