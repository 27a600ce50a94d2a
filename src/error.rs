use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The searched title matched nothing; carries a hint built from sample titles
    #[error("Movie not found: {search_term}")]
    MovieNotFound {
        search_term: String,
        suggestion: String,
    },

    /// A reference movie was found but the candidate query came back empty
    #[error("No candidate movies found for {movie}")]
    NoCandidates { movie: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::MovieNotFound {
                search_term,
                suggestion,
            } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "Movie not found",
                    "suggestion": suggestion,
                    "searchTerm": search_term,
                }),
            ),
            AppError::NoCandidates { movie } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "No candidate movies found",
                    "movie": movie,
                }),
            ),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": self.to_string() }),
                )
            }
            AppError::DataSource(msg) => (StatusCode::BAD_GATEWAY, json!({ "error": msg })),
            AppError::HttpClient(_) => {
                (StatusCode::BAD_GATEWAY, json!({ "error": self.to_string() }))
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_is_bad_request() {
        let response =
            AppError::InvalidInput("Movie title is required".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_movie_not_found_is_not_found() {
        let response = AppError::MovieNotFound {
            search_term: "Inceptoin".to_string(),
            suggestion: "Try searching for: Inception".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_no_candidates_is_not_found() {
        let response = AppError::NoCandidates {
            movie: "Inception".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_data_source_error_is_bad_gateway() {
        let response = AppError::DataSource("PostgREST returned 503".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_is_server_error() {
        let response = AppError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
