use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::RecommendationResponse,
    routes::AppState,
    services::recommendations,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    title: Option<String>,
}

/// Handler for `GET /api/recommendations?title=...`
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let title = params
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Movie title is required".to_string()))?;

    tracing::info!(request_id = %request_id, title = %title, "Processing recommendation request");

    let response =
        recommendations::recommend_similar(state.source.as_ref(), &state.settings, &title).await?;

    tracing::info!(
        request_id = %request_id,
        total_found = response.total_found,
        "Recommendations completed"
    );

    Ok(Json(response))
}
