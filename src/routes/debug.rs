use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::DataSourceReport,
    routes::AppState,
};

const SAMPLE_TITLE_COUNT: u32 = 5;

/// Handler for `GET /api/debug`
///
/// Reports the configured table, its row count and a few titles. Answers 404
/// in production.
pub async fn report(State(state): State<Arc<AppState>>) -> AppResult<Json<DataSourceReport>> {
    if !state.settings.debug_endpoint {
        return Err(AppError::NotFound("Not found".to_string()));
    }

    let total_movies = state.source.count_movies().await?;
    let sample_titles = state.source.sample_titles(SAMPLE_TITLE_COUNT).await?;

    tracing::debug!(total_movies, table = %state.source.table_name(), "Data source report");

    Ok(Json(DataSourceReport {
        table: state.source.table_name(),
        total_movies,
        sample_titles,
    }))
}
