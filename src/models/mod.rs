use serde::Serialize;

pub mod movie;

pub use movie::Movie;

/// A candidate movie annotated with its similarity to the searched movie
///
/// The movie's own columns are flattened into the JSON object, so clients see
/// one record with the score fields appended.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub movie: Movie,
    pub recommendation_score: f64,
    pub genre_matches: usize,
    pub keyword_matches: usize,
    pub rating_difference: f64,
}

/// Item counts after each stage of the ranking pipeline
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineCounts {
    /// Size of the candidate pool handed to the scorer
    pub candidates_found: usize,
    /// Candidates scoring above the relevance floor
    pub filtered_count: usize,
    /// Filtered candidates left after title deduplication
    pub deduped_count: usize,
}

/// The reference attributes the candidates were compared against
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub genres: Vec<String>,
    pub keywords_count: usize,
    pub rating: f64,
    pub popularity: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationDebug {
    #[serde(flatten)]
    pub counts: PipelineCounts,
    pub search_criteria: SearchCriteria,
}

/// Response body for a title search
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub searched_movie: Movie,
    pub recommendations: Vec<ScoredCandidate>,
    pub total_found: usize,
    pub debug: RecommendationDebug,
}

/// Response body for a shuffle of popular movies
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffleResponse {
    pub movies: Vec<Movie>,
    pub total_found: usize,
    pub message: String,
}

/// Diagnostic snapshot of the configured data source
///
/// Only built when both queries succeeded; failures are returned as `AppError`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceReport {
    pub table: String,
    pub total_movies: i64,
    pub sample_titles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scored_candidate_flattens_movie() {
        let mut movie = Movie::new(603, "The Matrix");
        movie.vote_average = Some(8.2);

        let candidate = ScoredCandidate {
            movie,
            recommendation_score: 57.5,
            genre_matches: 2,
            keyword_matches: 1,
            rating_difference: 0.25,
        };

        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["id"], 603);
        assert_eq!(json["title"], "The Matrix");
        assert_eq!(json["vote_average"], 8.2);
        assert_eq!(json["recommendationScore"], 57.5);
        assert_eq!(json["genreMatches"], 2);
        assert_eq!(json["keywordMatches"], 1);
        assert_eq!(json["ratingDifference"], 0.25);
    }

    #[test]
    fn test_debug_block_field_names() {
        let debug = RecommendationDebug {
            counts: PipelineCounts {
                candidates_found: 200,
                filtered_count: 40,
                deduped_count: 38,
            },
            search_criteria: SearchCriteria {
                genres: vec!["Action".to_string()],
                keywords_count: 4,
                rating: 7.9,
                popularity: 81.0,
            },
        };

        let json = serde_json::to_value(&debug).unwrap();
        assert_eq!(json["candidatesFound"], 200);
        assert_eq!(json["filteredCount"], 40);
        assert_eq!(json["dedupedCount"], 38);
        assert_eq!(json["searchCriteria"]["keywordsCount"], 4);
        assert_eq!(json["searchCriteria"]["genres"][0], "Action");
    }
}
