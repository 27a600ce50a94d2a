use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult, middleware::request_id::RequestId, models::ShuffleResponse,
    routes::AppState, services::shuffle::shuffle_popular,
};

/// Handler for `GET /api/shuffle`
pub async fn shuffle(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<ShuffleResponse>> {
    tracing::info!(request_id = %request_id, "Processing shuffle request");

    let response = shuffle_popular(
        state.source.as_ref(),
        &state.settings.popular,
        state.settings.shuffle_sample_size,
    )
    .await?;

    Ok(Json(response))
}
